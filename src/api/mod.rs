// ==========================================
// 看板补货调度 - API层
// ==========================================
// 职责: HTTP 路由 / 身份解析 / 响应封装
// 红线: API 层只调用调度器, 不直接访问仓储
// ==========================================

use std::sync::Arc;

use crate::app::AppState;

pub mod error;
pub mod kanban_api;
pub mod server;
pub mod shell;

/// 路由共享状态
pub type SharedState = Arc<AppState>;

// 重导出
pub use error::{ApiError, ApiResult};
pub use kanban_api::{DispatchResponse, RequestIdentity};
pub use server::{build_router, start_server};
pub use shell::render_shell;
