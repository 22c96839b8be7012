// ==========================================
// 看板补货调度 - 应用状态
// ==========================================
// 职责: 组装共享连接 / 仓储 / 配置 / 调度器, 供 HTTP 层与 worker 共用
// ==========================================

use std::sync::Arc;

use crate::config::{ConfigManager, DispatchConfigReader};
use crate::db::{open_in_memory_connection, open_shared_connection, SharedConnection};
use crate::engine::{
    AutoReleaseWorker, DispatchLocks, DispatchRepositories, KanbanDispatcher, NoOpPlanningServices,
    OptionalEventPublisher, OutboxEventPublisher, PlanningServices, RemoteFunctionClient,
};

/// 应用状态
pub struct AppState {
    /// 数据库路径（内存库为 ":memory:"）
    pub db_path: String,

    /// 共享连接
    pub conn: SharedConnection,

    /// 调度仓储集合
    pub repos: DispatchRepositories,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 看板调度器
    pub dispatcher: Arc<KanbanDispatcher>,

    /// 计划服务（outbox worker 使用）
    pub planning: Arc<dyn PlanningServices>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String, planning: Arc<dyn PlanningServices>) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_shared_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::assemble(db_path, conn, planning)
    }

    /// 内存库实例（测试 / 演示）
    pub fn in_memory(planning: Arc<dyn PlanningServices>) -> Result<Self, String> {
        let conn = open_in_memory_connection().map_err(|e| format!("无法打开内存数据库: {}", e))?;
        Self::assemble(":memory:".to_string(), conn, planning)
    }

    fn assemble(
        db_path: String,
        conn: SharedConnection,
        planning: Arc<dyn PlanningServices>,
    ) -> Result<Self, String> {
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("配置管理器初始化失败: {}", e))?,
        );
        match config_manager.get_all_global() {
            Ok(entries) => {
                tracing::info!(count = entries.len(), "已加载全局配置");
                for (key, value) in &entries {
                    tracing::debug!(key = %key, value = %value, "全局配置项");
                }
            }
            Err(e) => tracing::warn!(error = %e, "读取全局配置失败，使用默认值"),
        }
        let config_reader: Arc<dyn DispatchConfigReader> = config_manager.clone();

        let repos = DispatchRepositories::from_connection(conn.clone());
        let publisher = OptionalEventPublisher::with_publisher(Arc::new(OutboxEventPublisher::new(
            repos.outbox_repo.clone(),
            config_reader.clone(),
        )));
        let locks = Arc::new(DispatchLocks::new());

        let dispatcher = Arc::new(KanbanDispatcher::new(
            repos.clone(),
            config_reader,
            publisher,
            locks,
        ));

        tracing::info!("AppState初始化成功");

        Ok(Self {
            db_path,
            conn,
            repos,
            config_manager,
            dispatcher,
            planning,
        })
    }

    /// 创建消费本库 outbox 的 worker
    pub fn auto_release_worker(&self) -> AutoReleaseWorker {
        AutoReleaseWorker::new(self.repos.outbox_repo.clone(), self.planning.clone())
    }
}

/// 按是否配置计划服务地址选择实现
pub fn planning_services_for(functions_url: Option<&str>) -> Arc<dyn PlanningServices> {
    match functions_url {
        Some(url) => {
            tracing::info!(functions_url = url, "使用远程计划服务");
            Arc::new(RemoteFunctionClient::new(url))
        }
        None => {
            tracing::warn!("未配置计划服务地址，自动下达事件仅记录日志");
            Arc::new(NoOpPlanningServices)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone(), Arc::new(NoOpPlanningServices)).unwrap();
        assert_eq!(state.db_path, db_path);

        let conn = state.conn.lock().unwrap();
        let version = crate::db::read_schema_version(&conn).unwrap();
        assert_eq!(version, Some(crate::db::CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_new_with_bad_path() {
        let result = AppState::new(
            "/nonexistent-dir/sub/state.db".to_string(),
            Arc::new(NoOpPlanningServices),
        );
        assert!(result.is_err());
    }
}
