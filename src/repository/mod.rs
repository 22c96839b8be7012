// ==========================================
// 看板补货调度 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化, 所有业务表按 company_id 隔离
// ==========================================

pub mod db_utils;
pub mod error;
pub mod event_outbox_repo;
pub mod item_repo;
pub mod job_repo;
pub mod kanban_repo;
pub mod purchase_order_repo;
pub mod sequence_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use event_outbox_repo::{
    EventOutboxRepository, NewOutboxEvent, OutboxCounts, OutboxEventEntity, OutboxStatus,
};
pub use item_repo::ItemRepository;
pub use job_repo::JobRepository;
pub use kanban_repo::KanbanRepository;
pub use purchase_order_repo::PurchaseOrderRepository;
pub use sequence_repo::{SequenceRepository, SequenceTable};
