// ==========================================
// 看板补货调度服务 - 核心库
// ==========================================
// 职责: 扫描看板 → 自制（工单）或采购（采购单行）→ 返回跳转路径
// 技术栈: axum + tokio + Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 调度规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - HTTP 接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{Kanban, ReplenishmentSystem};

pub use engine::{DispatchContext, DispatchError, DispatchResult, KanbanDispatcher};

pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "看板补货调度服务";
