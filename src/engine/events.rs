// ==========================================
// 看板补货调度 - 引擎层事件发布
// ==========================================
// 职责: 定义调度副作用事件与发布 trait
// 说明: 自制路径只负责"发布", 计划服务调用由后台 worker 消费 outbox 完成
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::DispatchConfigReader;
use crate::engine::blocking::run_blocking;
use crate::repository::{EventOutboxRepository, NewOutboxEvent};

// ==========================================
// 调度事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchEventType {
    /// 作业已自动下达, 需要重算需求 / MRP / 倒排排程
    JobAutoReleaseRequested,
}

impl DispatchEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchEventType::JobAutoReleaseRequested => "JobAutoReleaseRequested",
        }
    }
}

impl FromStr for DispatchEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JobAutoReleaseRequested" => Ok(DispatchEventType::JobAutoReleaseRequested),
            other => Err(format!("未知事件类型: {}", other)),
        }
    }
}

impl fmt::Display for DispatchEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 调度事件（序列化后即 outbox payload）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub event_type: DispatchEventType,
    /// 作业内部ID
    pub job_id: String,
    /// 作业编号
    pub job_readable_id: String,
    pub company_id: String,
    pub user_id: String,
    pub kanban_id: String,
    pub location_id: String,
    pub requested_at: String,
}

impl DispatchEvent {
    pub fn job_auto_release(
        job_id: impl Into<String>,
        job_readable_id: impl Into<String>,
        company_id: impl Into<String>,
        user_id: impl Into<String>,
        kanban_id: impl Into<String>,
        location_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type: DispatchEventType::JobAutoReleaseRequested,
            job_id: job_id.into(),
            job_readable_id: job_readable_id.into(),
            company_id: company_id.into(),
            user_id: user_id.into(),
            kanban_id: kanban_id.into(),
            location_id: location_id.into(),
            requested_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

#[async_trait]
pub trait DispatchEventPublisher: Send + Sync {
    /// 发布调度事件
    ///
    /// # 返回
    /// - `Ok(event_id)`: 事件 ID（NoOp 返回空字符串）
    /// - `Err`: 发布失败
    async fn publish(&self, event: DispatchEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl DispatchEventPublisher for NoOpEventPublisher {
    async fn publish(&self, event: DispatchEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            job_id = %event.job_id,
            event_type = event.event_type.as_str(),
            "NoOpEventPublisher: 跳过事件发布"
        );
        Ok(String::new())
    }
}

/// 写入 dispatch_event_outbox 的发布者
pub struct OutboxEventPublisher {
    outbox_repo: Arc<EventOutboxRepository>,
    config: Arc<dyn DispatchConfigReader>,
}

impl OutboxEventPublisher {
    pub fn new(outbox_repo: Arc<EventOutboxRepository>, config: Arc<dyn DispatchConfigReader>) -> Self {
        Self { outbox_repo, config }
    }
}

#[async_trait]
impl DispatchEventPublisher for OutboxEventPublisher {
    async fn publish(&self, event: DispatchEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        let max_retries = self.config.get_auto_release_max_retries().await?;
        let entry = NewOutboxEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: event.event_type.as_str().to_string(),
            company_id: event.company_id.clone(),
            job_id: event.job_id.clone(),
            payload: serde_json::to_string(&event)?,
            max_retries,
        };

        let repo = self.outbox_repo.clone();
        let event_id = run_blocking(move || repo.enqueue(&entry)).await?;

        tracing::info!(
            event_id = %event_id,
            job_id = %event.job_id,
            event_type = event.event_type.as_str(),
            "调度事件已写入 outbox"
        );
        Ok(event_id)
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn DispatchEventPublisher>> 的使用
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn DispatchEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn DispatchEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub async fn publish(&self, event: DispatchEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event).await,
            None => {
                tracing::debug!(
                    job_id = %event.job_id,
                    event_type = event.event_type.as_str(),
                    "OptionalEventPublisher: 未配置发布者，跳过事件"
                );
                Ok(String::new())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::db::open_in_memory_connection;
    use crate::repository::OutboxStatus;

    fn sample_event() -> DispatchEvent {
        DispatchEvent::job_auto_release("job-1", "J000001", "C001", "U001", "K001", "L001")
    }

    #[tokio::test]
    async fn test_noop_publisher() {
        let result = NoOpEventPublisher.publish(sample_event()).await;
        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        assert!(publisher.publish(sample_event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_outbox_publisher_persists_payload() {
        let conn = open_in_memory_connection().unwrap();
        let repo = Arc::new(EventOutboxRepository::new(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn).unwrap());
        let publisher = OptionalEventPublisher::with_publisher(Arc::new(OutboxEventPublisher::new(
            repo.clone(),
            config,
        )));

        let event_id = publisher.publish(sample_event()).await.unwrap();
        let stored = repo.find_by_id(&event_id).unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Pending);
        assert_eq!(stored.event_type, "JobAutoReleaseRequested");
        assert_eq!(stored.max_retries, 3);

        let payload: DispatchEvent = serde_json::from_str(&stored.payload).unwrap();
        assert_eq!(payload.job_readable_id, "J000001");
        assert_eq!(payload.kanban_id, "K001");
    }
}
