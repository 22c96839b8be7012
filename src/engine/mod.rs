// ==========================================
// 看板补货调度 - 引擎层
// ==========================================
// 职责: 实现调度规则, 不拼 SQL
// 红线: Engine 不拼 SQL, 仓储调用统一经 run_blocking
// ==========================================

pub mod auto_release;
pub mod blocking;
pub mod buy_path;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod locks;
pub mod make_path;
pub mod planning;
pub mod redirect;
pub mod repositories;

// 重导出核心引擎
pub use auto_release::{AutoReleaseWorker, ProcessedEvent};
pub use buy_path::BuyPath;
pub use context::DispatchContext;
pub use dispatcher::KanbanDispatcher;
pub use error::{DispatchError, DispatchResult};
pub use events::{
    DispatchEvent, DispatchEventPublisher, DispatchEventType, NoOpEventPublisher,
    OptionalEventPublisher, OutboxEventPublisher,
};
pub use locks::DispatchLocks;
pub use make_path::MakePath;
pub use planning::{
    NoOpPlanningServices, PlanningError, PlanningServices, PlanningTarget, RemoteFunctionClient,
};
pub use repositories::DispatchRepositories;
