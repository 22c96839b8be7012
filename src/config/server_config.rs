// ==========================================
// 看板补货调度 - 进程级配置（环境变量）
// ==========================================
// CARBON_KANBAN_PORT       监听端口 (默认 3141)
// CARBON_KANBAN_DB_PATH    SQLite 路径 (默认 用户数据目录)
// CARBON_FUNCTIONS_URL     计划服务地址 (未设置则使用 NoOp)
// CARBON_WORKER_POLL_MS    outbox 轮询间隔 (默认 2000)
// ==========================================

use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PORT: &str = "CARBON_KANBAN_PORT";
pub const ENV_DB_PATH: &str = "CARBON_KANBAN_DB_PATH";
pub const ENV_FUNCTIONS_URL: &str = "CARBON_FUNCTIONS_URL";
pub const ENV_WORKER_POLL_MS: &str = "CARBON_WORKER_POLL_MS";

pub const DEFAULT_PORT: u16 = 3141;
pub const DEFAULT_WORKER_POLL_MS: u64 = 2_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: String,
    pub functions_url: Option<String>,
    pub worker_poll_interval: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 由任意 key 查找函数构建（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match non_empty(ENV_PORT) {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!(env = ENV_PORT, raw_value = %raw, "端口格式错误，使用默认值");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let poll_ms = match non_empty(ENV_WORKER_POLL_MS) {
            Some(raw) => raw.parse::<u64>().ok().filter(|v| *v > 0).unwrap_or_else(|| {
                tracing::warn!(env = ENV_WORKER_POLL_MS, raw_value = %raw, "轮询间隔格式错误，使用默认值");
                DEFAULT_WORKER_POLL_MS
            }),
            None => DEFAULT_WORKER_POLL_MS,
        };

        Self {
            port,
            db_path: non_empty(ENV_DB_PATH).unwrap_or_else(get_default_db_path),
            functions_url: non_empty(ENV_FUNCTIONS_URL).map(|u| u.trim_end_matches('/').to_string()),
            worker_poll_interval: Duration::from_millis(poll_ms),
        }
    }
}

/// 默认数据库路径: 用户数据目录/carbon-kanban/carbon_kanban.db
pub fn get_default_db_path() -> String {
    let mut path = PathBuf::from("./carbon_kanban.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("carbon-kanban");
        // best-effort: 目录创建失败时由打开数据库时报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("carbon_kanban.db");
    }

    path.to_string_lossy().to_string()
}
