// ==========================================
// 看板补货调度 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合调度引擎所需的所有 Repository
// ==========================================

use std::sync::Arc;

use crate::db::SharedConnection;
use crate::repository::{
    EventOutboxRepository, ItemRepository, JobRepository, KanbanRepository,
    PurchaseOrderRepository, SequenceRepository,
};

/// 调度引擎仓储集合
///
/// 所有仓储共享同一个连接；以 Arc 持有，便于移入 spawn_blocking 闭包。
#[derive(Clone)]
pub struct DispatchRepositories {
    pub kanban_repo: Arc<KanbanRepository>,
    pub sequence_repo: Arc<SequenceRepository>,
    pub item_repo: Arc<ItemRepository>,
    pub job_repo: Arc<JobRepository>,
    pub purchase_order_repo: Arc<PurchaseOrderRepository>,
    pub outbox_repo: Arc<EventOutboxRepository>,
}

impl DispatchRepositories {
    pub fn from_connection(conn: SharedConnection) -> Self {
        Self {
            kanban_repo: Arc::new(KanbanRepository::new(conn.clone())),
            sequence_repo: Arc::new(SequenceRepository::new(conn.clone())),
            item_repo: Arc::new(ItemRepository::new(conn.clone())),
            job_repo: Arc::new(JobRepository::new(conn.clone())),
            purchase_order_repo: Arc::new(PurchaseOrderRepository::new(conn.clone())),
            outbox_repo: Arc::new(EventOutboxRepository::new(conn)),
        }
    }
}
