// ==========================================
// 看板补货调度 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod item;
pub mod job;
pub mod kanban;
pub mod purchasing;
pub mod types;

// 重导出核心类型
pub use item::{Item, ItemReplenishment, MakeMethod, MethodOperation, PickMethod, SupplierPart};
pub use job::{Job, JobOperation, NewJob};
pub use kanban::Kanban;
pub use purchasing::{
    NewPurchaseOrder, NewPurchaseOrderLine, PurchaseOrder, PurchaseOrderLine,
    PURCHASE_ORDER_TYPE_PURCHASE,
};
pub use types::{
    JobOperationStatus, JobStatus, OperationStartMode, PurchaseOrderStatus, ReplenishmentSystem,
};
