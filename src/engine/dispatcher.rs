// ==========================================
// 看板补货调度 - 调度入口
// ==========================================
// 职责: 加载看板 → 冲突检测 → 按补货方式分派到自制/采购路径
// 约束: 同一看板的调度串行执行 (双击时第二次看到冲突状态)
// ==========================================

use std::sync::Arc;

use crate::config::DispatchConfigReader;
use crate::domain::kanban::Kanban;
use crate::domain::types::ReplenishmentSystem;
use crate::engine::blocking::run_blocking;
use crate::engine::buy_path::BuyPath;
use crate::engine::context::DispatchContext;
use crate::engine::error::{DispatchError, DispatchResult};
use crate::engine::events::OptionalEventPublisher;
use crate::engine::locks::DispatchLocks;
use crate::engine::make_path::MakePath;
use crate::engine::redirect;
use crate::engine::repositories::DispatchRepositories;

pub struct KanbanDispatcher {
    repos: DispatchRepositories,
    locks: Arc<DispatchLocks>,
    make_path: MakePath,
    buy_path: BuyPath,
}

impl KanbanDispatcher {
    pub fn new(
        repos: DispatchRepositories,
        config: Arc<dyn DispatchConfigReader>,
        publisher: OptionalEventPublisher,
        locks: Arc<DispatchLocks>,
    ) -> Self {
        Self {
            make_path: MakePath::new(repos.clone(), config, publisher),
            buy_path: BuyPath::new(repos.clone(), locks.clone()),
            repos,
            locks,
        }
    }

    /// 调度看板补货
    ///
    /// # 返回
    /// - Ok(path): 前端跳转路径
    /// - Err(DispatchError): Display 即前端错误文案
    pub async fn dispatch(&self, kanban_id: &str, ctx: &DispatchContext) -> DispatchResult<String> {
        let _guard = self.locks.acquire(&DispatchLocks::kanban_key(kanban_id)).await;

        let result = self.dispatch_locked(kanban_id, ctx).await;
        match &result {
            Ok(path) => tracing::info!(
                kanban_id,
                company_id = %ctx.company_id,
                user_id = %ctx.user_id,
                redirect = %path,
                "看板调度完成"
            ),
            Err(e) => tracing::warn!(
                kanban_id,
                company_id = %ctx.company_id,
                user_id = %ctx.user_id,
                code = e.code(),
                error = %e,
                "看板调度失败"
            ),
        }
        result
    }

    async fn dispatch_locked(&self, kanban_id: &str, ctx: &DispatchContext) -> DispatchResult<String> {
        let kanban = self.load_active_kanban(kanban_id, ctx).await?;

        if kanban.is_collision() {
            tracing::info!(
                kanban_id,
                job_readable_id = kanban.job_readable_id.as_deref().unwrap_or_default(),
                "看板已关联作业，跳转冲突页"
            );
            return Ok(redirect::kanban_collision(&kanban.id));
        }

        match &kanban.replenishment_system {
            ReplenishmentSystem::Make => self.make_path.run(&kanban, ctx).await,
            ReplenishmentSystem::Buy => self.buy_path.run(&kanban, ctx).await,
            ReplenishmentSystem::Other(value) => Err(DispatchError::UnsupportedSystem(value.clone())),
        }
    }

    async fn load_active_kanban(&self, kanban_id: &str, ctx: &DispatchContext) -> DispatchResult<Kanban> {
        let kanban_repo = self.repos.kanban_repo.clone();
        let (id, company_id) = (kanban_id.to_string(), ctx.company_id.clone());

        match run_blocking(move || kanban_repo.find_for_company(&id, &company_id)).await {
            Ok(kanban) if kanban.active => Ok(kanban),
            Ok(_) => {
                tracing::debug!(kanban_id, "看板已停用");
                Err(DispatchError::KanbanNotActive)
            }
            Err(e) => {
                tracing::debug!(kanban_id, error = %e, "看板读取失败");
                Err(DispatchError::KanbanNotActive)
            }
        }
    }
}
