// ==========================================
// 看板补货调度 - 应用层
// ==========================================
// 职责: 组装应用状态, 连接 HTTP 层与引擎层
// ==========================================

pub mod state;

// 重导出
pub use state::{planning_services_for, AppState};
