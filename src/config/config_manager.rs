// ==========================================
// 看板补货调度 - 配置管理器
// ==========================================
// 职责: 调度参数的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::dispatch_config_trait::{ConfigResult, DispatchConfigReader};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error + Send + Sync>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 全部 global 配置
    pub fn get_all_global(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 读取整数配置；缺失用默认值，格式错误告警后用默认值
    fn get_i64_or_default(&self, key: &str, default: i64) -> ConfigResult<i64> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// DispatchConfigReader Trait 实现
// ==========================================
#[async_trait]
impl DispatchConfigReader for ConfigManager {
    async fn get_default_lead_time_days(&self) -> ConfigResult<i64> {
        self.get_i64_or_default(
            config_keys::DEFAULT_LEAD_TIME_DAYS,
            defaults::DEFAULT_LEAD_TIME_DAYS,
        )
    }

    async fn get_auto_release_max_retries(&self) -> ConfigResult<i64> {
        self.get_i64_or_default(
            config_keys::AUTO_RELEASE_MAX_RETRIES,
            defaults::AUTO_RELEASE_MAX_RETRIES,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 作业交期
    pub const DEFAULT_LEAD_TIME_DAYS: &str = "default_lead_time_days";

    // 自动下达
    pub const AUTO_RELEASE_MAX_RETRIES: &str = "auto_release_max_retries";
}

pub mod defaults {
    pub const DEFAULT_LEAD_TIME_DAYS: i64 = 7;
    pub const AUTO_RELEASE_MAX_RETRIES: i64 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let manager = ConfigManager::from_connection(open_in_memory_connection().unwrap()).unwrap();
        assert_eq!(manager.get_default_lead_time_days().await.unwrap(), 7);
        assert_eq!(manager.get_auto_release_max_retries().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_override_and_malformed() {
        let manager = ConfigManager::from_connection(open_in_memory_connection().unwrap()).unwrap();

        manager
            .set_global_config_value(config_keys::DEFAULT_LEAD_TIME_DAYS, "14")
            .unwrap();
        assert_eq!(manager.get_default_lead_time_days().await.unwrap(), 14);

        manager
            .set_global_config_value(config_keys::AUTO_RELEASE_MAX_RETRIES, "lots")
            .unwrap();
        assert_eq!(manager.get_auto_release_max_retries().await.unwrap(), 3);

        manager
            .set_global_config_value(config_keys::DEFAULT_LEAD_TIME_DAYS, "-2")
            .unwrap();
        assert_eq!(manager.get_default_lead_time_days().await.unwrap(), 7);

        assert_eq!(manager.get_all_global().unwrap().len(), 2);
    }
}
