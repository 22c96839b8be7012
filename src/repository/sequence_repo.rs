// ==========================================
// 看板补货调度 - 单据序列号仓储
// ==========================================
// 职责: 为作业/采购订单分配可读编号 (如 J000042 / PO000007)
// 约束: 取号与递增在同一事务内完成
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 序列号所属单据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceTable {
    Job,
    PurchaseOrder,
}

impl SequenceTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceTable::Job => "job",
            SequenceTable::PurchaseOrder => "purchaseOrder",
        }
    }

    /// 默认前缀
    pub fn default_prefix(&self) -> &'static str {
        match self {
            SequenceTable::Job => "J",
            SequenceTable::PurchaseOrder => "PO",
        }
    }
}

pub struct SequenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SequenceRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保公司的序列存在（已存在则不变）
    pub fn ensure(
        &self,
        table: SequenceTable,
        company_id: &str,
        prefix: &str,
        size: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO sequence (table_name, company_id, prefix, next, size, step)
             VALUES (?1, ?2, ?3, 1, ?4, 1)",
            params![table.as_str(), company_id, prefix, size],
        )?;
        Ok(())
    }

    /// 取下一个编号
    ///
    /// # 返回
    /// - Ok(Some(id)): 分配成功
    /// - Ok(None): 该公司未配置此序列
    pub fn next(&self, table: SequenceTable, company_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let current: Option<(String, i64, i64, i64)> = tx
            .query_row(
                "SELECT prefix, next, size, step FROM sequence WHERE table_name = ?1 AND company_id = ?2",
                params![table.as_str(), company_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((prefix, next, size, step)) = current else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE sequence SET next = next + ?1 WHERE table_name = ?2 AND company_id = ?3",
            params![step.max(1), table.as_str(), company_id],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(Some(format_sequence(&prefix, next, size)))
    }
}

/// 补零宽度上限, 超出按上限处理
pub const MAX_SEQUENCE_WIDTH: i64 = 32;

/// 前缀 + 定长补零
pub fn format_sequence(prefix: &str, value: i64, size: i64) -> String {
    let width = size.clamp(0, MAX_SEQUENCE_WIDTH) as usize;
    format!("{}{:0width$}", prefix, value, width = width)
}
