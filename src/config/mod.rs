// ==========================================
// 看板补货调度 - 配置层
// ==========================================
// 职责: 进程配置 (环境变量) + 调度参数 (config_kv 表)
// ==========================================

pub mod config_manager;
pub mod dispatch_config_trait;
pub mod server_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use dispatch_config_trait::{ConfigResult, DispatchConfigReader};
pub use server_config::{get_default_db_path, ServerConfig};
