// ==========================================
// 看板补货调度 - 自动下达 Worker
// ==========================================
// 职责: 消费 dispatch_event_outbox 中的 JobAutoReleaseRequested 事件
// 动作: 并行调用 需求重算 / MRP / 倒排排程
// 重试: 任一动作失败 → retry_count+1 回到 PENDING, 达到 max_retries 置 FAILED
// 未知事件类型: 直接置 CANCELLED, 不调用计划服务
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::engine::blocking::run_blocking;
use crate::engine::events::{DispatchEvent, DispatchEventType};
use crate::engine::planning::{PlanningServices, PlanningTarget};
use crate::repository::{EventOutboxRepository, OutboxEventEntity, OutboxStatus, RepositoryResult};

/// 单个事件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEvent {
    pub event_id: String,
    pub job_id: String,
    pub status: OutboxStatus,
}

pub struct AutoReleaseWorker {
    outbox_repo: Arc<EventOutboxRepository>,
    planning: Arc<dyn PlanningServices>,
}

impl AutoReleaseWorker {
    pub fn new(outbox_repo: Arc<EventOutboxRepository>, planning: Arc<dyn PlanningServices>) -> Self {
        Self {
            outbox_repo,
            planning,
        }
    }

    /// 处理下一个 PENDING 事件
    ///
    /// # 返回
    /// - Ok(Some(ProcessedEvent)): 处理完成（成功或记录失败）
    /// - Ok(None): 队列为空
    pub async fn process_next(&self) -> RepositoryResult<Option<ProcessedEvent>> {
        let repo = self.outbox_repo.clone();
        let Some(event) = run_blocking(move || repo.claim_next()).await? else {
            return Ok(None);
        };

        tracing::debug!(
            event_id = %event.event_id,
            job_id = %event.job_id,
            retry_count = event.retry_count,
            "开始处理自动下达事件"
        );

        if let Err(reason) = event.event_type.parse::<DispatchEventType>() {
            let repo = self.outbox_repo.clone();
            let event_id = event.event_id.clone();
            let cancel_reason = reason.clone();
            run_blocking(move || repo.cancel(&event_id, &cancel_reason)).await?;
            tracing::warn!(event_id = %event.event_id, reason = %reason, "事件类型无法处理，已取消");
            return Ok(Some(ProcessedEvent {
                event_id: event.event_id,
                job_id: event.job_id,
                status: OutboxStatus::Cancelled,
            }));
        }

        let status = match self.execute(&event).await {
            Ok(()) => {
                let repo = self.outbox_repo.clone();
                let event_id = event.event_id.clone();
                run_blocking(move || repo.mark_completed(&event_id)).await?;
                tracing::info!(event_id = %event.event_id, job_id = %event.job_id, "自动下达事件处理完成");
                OutboxStatus::Completed
            }
            Err(message) => {
                let repo = self.outbox_repo.clone();
                let event_id = event.event_id.clone();
                let error_message = message.clone();
                let status = run_blocking(move || repo.record_failure(&event_id, &error_message)).await?;

                if status == OutboxStatus::Failed {
                    tracing::error!(
                        event_id = %event.event_id,
                        job_id = %event.job_id,
                        retry_count = event.retry_count + 1,
                        error = %message,
                        "自动下达事件失败，达到最大重试次数"
                    );
                } else {
                    tracing::warn!(
                        event_id = %event.event_id,
                        job_id = %event.job_id,
                        retry_count = event.retry_count + 1,
                        error = %message,
                        "自动下达事件失败，将重试"
                    );
                }
                status
            }
        };

        Ok(Some(ProcessedEvent {
            event_id: event.event_id,
            job_id: event.job_id,
            status,
        }))
    }

    /// 处理队列直到为空
    pub async fn process_all(&self) -> RepositoryResult<Vec<ProcessedEvent>> {
        let mut processed = Vec::new();
        while let Some(result) = self.process_next().await? {
            processed.push(result);
        }
        Ok(processed)
    }

    /// 后台循环: 每个轮询周期清空一次队列，收到关闭信号后退出
    pub async fn run(self, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let repo = self.outbox_repo.clone();
        match run_blocking(move || repo.requeue_running()).await {
            Ok(0) => {}
            Ok(n) => tracing::warn!(count = n, "遗留 RUNNING 事件已放回队列"),
            Err(e) => tracing::warn!(error = %e, "遗留事件恢复失败"),
        }

        tracing::info!(poll_ms = poll_interval.as_millis() as u64, "自动下达 worker 已启动");

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.drain_until_retry().await;

            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("自动下达 worker 已停止");
    }

    /// 处理队列，遇到需要重试的事件即停止（下一轮轮询再试）
    async fn drain_until_retry(&self) {
        let mut count = 0usize;
        loop {
            match self.process_next().await {
                Ok(Some(processed)) => {
                    count += 1;
                    if processed.status == OutboxStatus::Pending {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "outbox 处理失败");
                    break;
                }
            }
        }
        if count > 0 {
            tracing::debug!(count, "本轮处理事件");
        }
    }

    /// 并行执行三项计划动作；返回合并后的错误信息
    async fn execute(&self, event: &OutboxEventEntity) -> Result<(), String> {
        let payload: DispatchEvent =
            serde_json::from_str(&event.payload).map_err(|e| format!("事件内容解析失败: {}", e))?;

        let target = PlanningTarget {
            job_id: payload.job_id,
            company_id: payload.company_id,
            user_id: payload.user_id,
        };

        let (recalculated, mrp, scheduled) = tokio::join!(
            self.planning.recalculate_requirements(&target),
            self.planning.run_mrp(&target),
            self.planning.schedule_job(&target),
        );

        let errors: Vec<String> = [recalculated, mrp, scheduled]
            .into_iter()
            .filter_map(|r| r.err().map(|e| e.to_string()))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}
