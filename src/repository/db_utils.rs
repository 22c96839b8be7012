// ==========================================
// 看板补货调度 - 仓储层通用工具
// ==========================================

use rusqlite::types::Type;
use rusqlite::Row;
use std::str::FromStr;

/// 读取文本列并解析为枚举，未知取值转为 FromSqlConversionFailure
pub fn get_parsed<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// 读取 INTEGER 布尔列
pub fn get_bool(row: &Row, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}

/// 新记录ID
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
