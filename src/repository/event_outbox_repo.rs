// ==========================================
// 看板补货调度 - 调度事件 Outbox 仓储
// ==========================================
// 职责: 持久化调度副作用事件 (如 JobAutoReleaseRequested), 供后台 worker 消费
// 状态机: PENDING -> RUNNING -> COMPLETED
//                           -> PENDING (重试, retry_count+1)
//                           -> FAILED  (retry_count 达到 max_retries)
//         PENDING -> CANCELLED
// ==========================================

use crate::repository::db_utils::get_parsed;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Outbox 事件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Running => "RUNNING",
            OutboxStatus::Completed => "COMPLETED",
            OutboxStatus::Failed => "FAILED",
            OutboxStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OutboxStatus::Pending),
            "RUNNING" => Ok(OutboxStatus::Running),
            "COMPLETED" => Ok(OutboxStatus::Completed),
            "FAILED" => Ok(OutboxStatus::Failed),
            "CANCELLED" => Ok(OutboxStatus::Cancelled),
            other => Err(format!("未知事件状态: {}", other)),
        }
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct OutboxEventEntity {
    pub event_id: String,
    pub event_type: String,
    pub company_id: String,
    pub job_id: String,
    pub payload: String,
    pub status: OutboxStatus,
    pub retry_count: i64,
    pub max_retries: i64,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
}

/// 新事件
#[derive(Debug, Clone)]
pub struct NewOutboxEvent {
    pub event_id: String,
    pub event_type: String,
    pub company_id: String,
    pub job_id: String,
    pub payload: String,
    pub max_retries: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboxCounts {
    pub pending: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
    pub cancelled: i64,
}

const EVENT_COLUMNS: &str = r#"
    event_id, event_type, company_id, job_id, payload, status, retry_count, max_retries,
    created_at, started_at, completed_at, error_message
"#;

pub struct EventOutboxRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EventOutboxRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入事件（PENDING）
    pub fn enqueue(&self, event: &NewOutboxEvent) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO dispatch_event_outbox (
                event_id, event_type, company_id, job_id, payload, status,
                retry_count, max_retries, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
            "#,
            params![
                event.event_id,
                event.event_type,
                event.company_id,
                event.job_id,
                event.payload,
                OutboxStatus::Pending.as_str(),
                event.max_retries.max(0),
                now_timestamp(),
            ],
        )?;
        Ok(event.event_id.clone())
    }

    /// 认领最早的 PENDING 事件并置为 RUNNING
    pub fn claim_next(&self) -> RepositoryResult<Option<OutboxEventEntity>> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let sql = format!(
            r#"
            SELECT {} FROM dispatch_event_outbox
            WHERE status = ?1
            ORDER BY created_at ASC, rowid ASC
            LIMIT 1
            "#,
            EVENT_COLUMNS
        );
        let event = tx
            .query_row(&sql, params![OutboxStatus::Pending.as_str()], map_event_row)
            .optional()?;

        let Some(mut event) = event else {
            return Ok(None);
        };

        let started_at = now_timestamp();
        tx.execute(
            "UPDATE dispatch_event_outbox SET status = ?1, started_at = ?2 WHERE event_id = ?3",
            params![OutboxStatus::Running.as_str(), started_at, event.event_id],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        event.status = OutboxStatus::Running;
        event.started_at = Some(started_at);
        Ok(Some(event))
    }

    pub fn mark_completed(&self, event_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"
            UPDATE dispatch_event_outbox
            SET status = ?1, completed_at = ?2, error_message = NULL
            WHERE event_id = ?3
            "#,
            params![OutboxStatus::Completed.as_str(), now_timestamp(), event_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::not_found("dispatch_event_outbox", event_id));
        }
        Ok(())
    }

    /// 记录一次失败
    ///
    /// retry_count+1 后仍小于 max_retries 则回到 PENDING, 否则 FAILED
    pub fn record_failure(&self, event_id: &str, error_message: &str) -> RepositoryResult<OutboxStatus> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let (retry_count, max_retries): (i64, i64) = tx
            .query_row(
                "SELECT retry_count, max_retries FROM dispatch_event_outbox WHERE event_id = ?1",
                params![event_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("dispatch_event_outbox", event_id))?;

        let retry_count = retry_count + 1;
        let next_status = if retry_count < max_retries {
            OutboxStatus::Pending
        } else {
            OutboxStatus::Failed
        };
        let completed_at = (next_status == OutboxStatus::Failed).then(now_timestamp);

        tx.execute(
            r#"
            UPDATE dispatch_event_outbox
            SET status = ?1, retry_count = ?2, error_message = ?3, completed_at = ?4
            WHERE event_id = ?5
            "#,
            params![next_status.as_str(), retry_count, error_message, completed_at, event_id],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(next_status)
    }

    /// 将遗留的 RUNNING 事件放回 PENDING（进程重启后调用）
    pub fn requeue_running(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE dispatch_event_outbox SET status = ?1, started_at = NULL WHERE status = ?2",
            params![OutboxStatus::Pending.as_str(), OutboxStatus::Running.as_str()],
        )?;
        Ok(rows_affected)
    }

    /// 取消未结束（PENDING / RUNNING）的事件，返回是否取消成功
    pub fn cancel(&self, event_id: &str, reason: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE dispatch_event_outbox SET status = ?1, error_message = ?2
             WHERE event_id = ?3 AND status IN (?4, ?5)",
            params![
                OutboxStatus::Cancelled.as_str(),
                reason,
                event_id,
                OutboxStatus::Pending.as_str(),
                OutboxStatus::Running.as_str()
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn find_by_id(&self, event_id: &str) -> RepositoryResult<Option<OutboxEventEntity>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM dispatch_event_outbox WHERE event_id = ?1",
            EVENT_COLUMNS
        );
        let event = conn
            .query_row(&sql, params![event_id], map_event_row)
            .optional()?;
        Ok(event)
    }

    pub fn list_by_job(&self, job_id: &str) -> RepositoryResult<Vec<OutboxEventEntity>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM dispatch_event_outbox WHERE job_id = ?1 ORDER BY created_at ASC, rowid ASC",
            EVENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params![job_id], map_event_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn counts(&self) -> RepositoryResult<OutboxCounts> {
        let conn = self.get_conn()?;
        let counts = conn.query_row(
            r#"
            SELECT
              COALESCE(SUM(CASE WHEN status = 'PENDING' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN status = 'RUNNING' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN status = 'COMPLETED' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN status = 'FAILED' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN status = 'CANCELLED' THEN 1 ELSE 0 END), 0)
            FROM dispatch_event_outbox
            "#,
            [],
            |row| {
                Ok(OutboxCounts {
                    pending: row.get(0)?,
                    running: row.get(1)?,
                    completed: row.get(2)?,
                    failed: row.get(3)?,
                    cancelled: row.get(4)?,
                })
            },
        )?;
        Ok(counts)
    }
}

fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn map_event_row(row: &Row) -> rusqlite::Result<OutboxEventEntity> {
    Ok(OutboxEventEntity {
        event_id: row.get(0)?,
        event_type: row.get(1)?,
        company_id: row.get(2)?,
        job_id: row.get(3)?,
        payload: row.get(4)?,
        status: get_parsed(row, 5)?,
        retry_count: row.get(6)?,
        max_retries: row.get(7)?,
        created_at: row.get(8)?,
        started_at: row.get(9)?,
        completed_at: row.get(10)?,
        error_message: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;

    fn new_event(id: &str, max_retries: i64) -> NewOutboxEvent {
        NewOutboxEvent {
            event_id: id.to_string(),
            event_type: "JobAutoReleaseRequested".to_string(),
            company_id: "C001".to_string(),
            job_id: "job-1".to_string(),
            payload: "{}".to_string(),
            max_retries,
        }
    }

    #[test]
    fn test_enqueue_and_claim_in_order() {
        let repo = EventOutboxRepository::new(open_in_memory_connection().unwrap());
        repo.enqueue(&new_event("E1", 3)).unwrap();
        repo.enqueue(&new_event("E2", 3)).unwrap();

        let first = repo.claim_next().unwrap().unwrap();
        assert_eq!(first.event_id, "E1");
        assert_eq!(first.status, OutboxStatus::Running);
        assert!(first.started_at.is_some());

        let second = repo.claim_next().unwrap().unwrap();
        assert_eq!(second.event_id, "E2");
        assert!(repo.claim_next().unwrap().is_none());

        repo.mark_completed("E1").unwrap();
        let counts = repo.counts().unwrap();
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.running, 1);
    }

    #[test]
    fn test_retry_until_failed() {
        let repo = EventOutboxRepository::new(open_in_memory_connection().unwrap());
        repo.enqueue(&new_event("E1", 2)).unwrap();

        // 第一次失败 - retry_count: 0 -> 1, 回到 PENDING
        repo.claim_next().unwrap().unwrap();
        assert_eq!(repo.record_failure("E1", "boom").unwrap(), OutboxStatus::Pending);
        let event = repo.find_by_id("E1").unwrap().unwrap();
        assert_eq!(event.retry_count, 1);
        assert_eq!(event.error_message.as_deref(), Some("boom"));

        // 第二次失败 - 达到 max_retries
        repo.claim_next().unwrap().unwrap();
        assert_eq!(repo.record_failure("E1", "boom again").unwrap(), OutboxStatus::Failed);
        let event = repo.find_by_id("E1").unwrap().unwrap();
        assert_eq!(event.status, OutboxStatus::Failed);
        assert_eq!(event.retry_count, 2);
        assert!(repo.claim_next().unwrap().is_none());
    }

    #[test]
    fn test_cancel_skips_finished_events() {
        let repo = EventOutboxRepository::new(open_in_memory_connection().unwrap());
        repo.enqueue(&new_event("E1", 3)).unwrap();
        repo.enqueue(&new_event("E2", 3)).unwrap();
        repo.enqueue(&new_event("E3", 3)).unwrap();

        // E1: RUNNING → CANCELLED
        repo.claim_next().unwrap().unwrap();
        assert!(repo.cancel("E1", "unknown type").unwrap());
        // E2: COMPLETED 不可取消
        repo.claim_next().unwrap().unwrap();
        repo.mark_completed("E2").unwrap();
        assert!(!repo.cancel("E2", "late").unwrap());

        let cancelled = repo.find_by_id("E1").unwrap().unwrap();
        assert_eq!(cancelled.status, OutboxStatus::Cancelled);
        assert_eq!(cancelled.error_message.as_deref(), Some("unknown type"));

        let counts = repo.counts().unwrap();
        assert_eq!(
            counts,
            OutboxCounts {
                pending: 1,
                running: 0,
                completed: 1,
                failed: 0,
                cancelled: 1
            }
        );
    }

    #[test]
    fn test_requeue_running() {
        let repo = EventOutboxRepository::new(open_in_memory_connection().unwrap());
        repo.enqueue(&new_event("E1", 3)).unwrap();
        repo.claim_next().unwrap().unwrap();

        assert_eq!(repo.requeue_running().unwrap(), 1);
        let event = repo.claim_next().unwrap().unwrap();
        assert_eq!(event.event_id, "E1");
        assert_eq!(repo.list_by_job("job-1").unwrap().len(), 1);
    }
}
