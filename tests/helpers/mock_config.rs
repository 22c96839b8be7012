// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use carbon_kanban::config::{ConfigResult, DispatchConfigReader};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub default_lead_time_days: i64,
    pub auto_release_max_retries: i64,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            default_lead_time_days: 7,
            auto_release_max_retries: 3,
        }
    }

    pub fn with_lead_time(days: i64) -> Self {
        let mut config = Self::default();
        config.default_lead_time_days = days;
        config
    }

    pub fn with_max_retries(max_retries: i64) -> Self {
        let mut config = Self::default();
        config.auto_release_max_retries = max_retries;
        config
    }
}

#[async_trait]
impl DispatchConfigReader for MockConfig {
    async fn get_default_lead_time_days(&self) -> ConfigResult<i64> {
        Ok(self.default_lead_time_days)
    }

    async fn get_auto_release_max_retries(&self) -> ConfigResult<i64> {
        Ok(self.auto_release_max_retries)
    }
}
