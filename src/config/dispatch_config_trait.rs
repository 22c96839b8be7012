// ==========================================
// 看板补货调度 - 调度配置读取 Trait
// ==========================================
// 职责: 定义调度引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// DispatchConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait DispatchConfigReader: Send + Sync {
    /// 物料未配置提前期时使用的默认提前期（天）
    ///
    /// # 默认值
    /// - 7
    async fn get_default_lead_time_days(&self) -> ConfigResult<i64>;

    /// 自动下达事件的最大重试次数
    ///
    /// # 默认值
    /// - 3
    async fn get_auto_release_max_retries(&self) -> ConfigResult<i64>;
}
