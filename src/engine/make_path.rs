// ==========================================
// 看板补货调度 - 自制路径 (Make)
// ==========================================
// 流程:
// 1. 并行: 作业序列号 / 补货策略(提前期) / 默认货架 / 物料(单位)
// 2. 创建作业 (Draft, 交期 = 业务日期 + 提前期)
// 3. 并行: 复制工艺模板 / 回写看板关联 (回写失败为致命错误)
// 4. auto_release 且工艺已关联: 置 Ready + 写入自动下达事件 (失败只记日志)
// 5. 计算跳转路径
// 红线: 已创建的作业不回滚
// ==========================================

use std::sync::Arc;

use chrono::{Days, NaiveDate};

use crate::config::config_manager::defaults;
use crate::config::DispatchConfigReader;
use crate::domain::job::{Job, JobOperation, NewJob};
use crate::domain::kanban::Kanban;
use crate::domain::types::{JobStatus, OperationStartMode};
use crate::engine::blocking::run_blocking;
use crate::engine::context::DispatchContext;
use crate::engine::error::{DispatchError, DispatchResult};
use crate::engine::events::{DispatchEvent, OptionalEventPublisher};
use crate::engine::redirect;
use crate::engine::repositories::DispatchRepositories;
use crate::repository::{RepositoryError, SequenceTable};

/// 看板生成作业的交期类型
pub const KANBAN_DEADLINE_TYPE: &str = "Soft Deadline";

pub struct MakePath {
    repos: DispatchRepositories,
    config: Arc<dyn DispatchConfigReader>,
    publisher: OptionalEventPublisher,
}

impl MakePath {
    pub fn new(
        repos: DispatchRepositories,
        config: Arc<dyn DispatchConfigReader>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            repos,
            config,
            publisher,
        }
    }

    pub async fn run(&self, kanban: &Kanban, ctx: &DispatchContext) -> DispatchResult<String> {
        let job = self.create_job(kanban, ctx).await?;

        let method_associated = self.associate_job(kanban, &job).await?;

        if kanban.auto_release && method_associated {
            self.release_job(kanban, &job, ctx).await;
        }

        let first_operation = if kanban.auto_release {
            self.first_active_operation(&job).await
        } else {
            None
        };

        Ok(resolve_redirect(kanban, &job, first_operation.as_ref()))
    }

    async fn create_job(&self, kanban: &Kanban, ctx: &DispatchContext) -> DispatchResult<Job> {
        let (sequence, replenishment, default_shelf, item) = {
            let sequence_repo = self.repos.sequence_repo.clone();
            let item_repo_a = self.repos.item_repo.clone();
            let item_repo_b = self.repos.item_repo.clone();
            let item_repo_c = self.repos.item_repo.clone();
            let company_id = ctx.company_id.clone();
            let (c1, c2, c3) = (company_id.clone(), company_id.clone(), company_id.clone());
            let (i1, i2, i3) = (kanban.item_id.clone(), kanban.item_id.clone(), kanban.item_id.clone());
            let location_id = kanban.location_id.clone();

            tokio::join!(
                run_blocking(move || sequence_repo.next(SequenceTable::Job, &company_id)),
                run_blocking(move || item_repo_a.find_replenishment(&i1, &c1)),
                run_blocking(move || item_repo_b.find_default_shelf(&i2, &location_id, &c2)),
                run_blocking(move || item_repo_c.find_item(&i3, &c3)),
            )
        };

        let job_readable_id = match sequence {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::error!(company_id = %ctx.company_id, "未配置作业序列号");
                return Err(DispatchError::JobCreateFailed);
            }
            Err(e) => {
                tracing::error!(company_id = %ctx.company_id, error = %e, "作业序列号分配失败");
                return Err(DispatchError::JobCreateFailed);
            }
        };

        let lead_time = match lookup_or_none(replenishment, "item_replenishment", &kanban.item_id)
            .and_then(|r| r.lead_time)
        {
            Some(days) => days,
            None => self.default_lead_time_days().await,
        };

        let shelf_id = kanban
            .shelf_id
            .clone()
            .or_else(|| lookup_or_none(default_shelf, "pick_method", &kanban.item_id));
        let unit_of_measure_code = lookup_or_none(item, "item", &kanban.item_id)
            .map(|i| i.unit_of_measure_code);

        let new_job = NewJob {
            job_id: job_readable_id,
            company_id: ctx.company_id.clone(),
            item_id: kanban.item_id.clone(),
            quantity: kanban.quantity,
            location_id: kanban.location_id.clone(),
            shelf_id,
            unit_of_measure_code,
            start_date: ctx.today,
            due_date: due_date(ctx.today, lead_time),
            deadline_type: KANBAN_DEADLINE_TYPE.to_string(),
            created_by: ctx.user_id.clone(),
        };

        let job_repo = self.repos.job_repo.clone();
        match run_blocking(move || job_repo.insert(&new_job)).await {
            Ok(job) => {
                tracing::info!(
                    kanban_id = %kanban.id,
                    job_id = %job.id,
                    job_readable_id = %job.job_id,
                    due_date = %job.due_date,
                    "看板作业已创建"
                );
                Ok(job)
            }
            Err(e) => {
                tracing::error!(kanban_id = %kanban.id, error = %e, "作业创建失败");
                Err(DispatchError::JobCreateFailed)
            }
        }
    }

    /// 复制工艺 + 回写看板；返回工艺是否关联成功
    async fn associate_job(&self, kanban: &Kanban, job: &Job) -> DispatchResult<bool> {
        let job_repo = self.repos.job_repo.clone();
        let kanban_repo = self.repos.kanban_repo.clone();
        let job_for_method = job.clone();
        let (kanban_id, company_id) = (kanban.id.clone(), job.company_id.clone());
        let (job_id, job_readable_id) = (job.id.clone(), job.job_id.clone());

        let (method, link) = tokio::join!(
            run_blocking(move || job_repo.copy_method_from_item(&job_for_method)),
            run_blocking(move || kanban_repo.link_job(&kanban_id, &company_id, &job_id, &job_readable_id)),
        );

        let method_associated = match method {
            Ok(operations) => {
                tracing::debug!(job_id = %job.id, operations, "工艺模板已复制");
                true
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, item_id = %job.item_id, error = %e, "工艺模板关联失败");
                false
            }
        };

        if let Err(e) = link {
            tracing::error!(
                kanban_id = %kanban.id,
                job_id = %job.id,
                error = %e,
                "看板关联作业失败"
            );
            return Err(DispatchError::KanbanLinkFailed);
        }

        Ok(method_associated)
    }

    /// 自动下达: 置 Ready + 写入事件；失败不阻断跳转
    async fn release_job(&self, kanban: &Kanban, job: &Job, ctx: &DispatchContext) {
        let job_repo = self.repos.job_repo.clone();
        let (job_id, company_id, user_id) = (job.id.clone(), job.company_id.clone(), ctx.user_id.clone());
        let event = DispatchEvent::job_auto_release(
            job.id.clone(),
            job.job_id.clone(),
            job.company_id.clone(),
            ctx.user_id.clone(),
            kanban.id.clone(),
            kanban.location_id.clone(),
        );

        let (status, published) = tokio::join!(
            run_blocking(move || job_repo.update_status(&job_id, &company_id, JobStatus::Ready, &user_id)),
            self.publisher.publish(event),
        );

        if let Err(e) = status {
            tracing::warn!(job_id = %job.id, error = %e, "作业置 Ready 失败");
        }
        if let Err(e) = published {
            tracing::warn!(job_id = %job.id, error = %e, "自动下达事件写入失败");
        }
    }

    async fn first_active_operation(&self, job: &Job) -> Option<JobOperation> {
        let job_repo = self.repos.job_repo.clone();
        let (job_id, company_id) = (job.id.clone(), job.company_id.clone());
        match run_blocking(move || job_repo.first_active_operation(&job_id, &company_id)).await {
            Ok(op) => op,
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "首道工序查询失败");
                None
            }
        }
    }

    async fn default_lead_time_days(&self) -> i64 {
        match self.config.get_default_lead_time_days().await {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!(error = %e, "默认提前期读取失败，使用内置默认值");
                defaults::DEFAULT_LEAD_TIME_DAYS
            }
        }
    }
}

/// 查询失败视同未配置
fn lookup_or_none<T>(result: Result<Option<T>, RepositoryError>, entity: &str, item_id: &str) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(entity, item_id, error = %e, "主数据查询失败，按未配置处理");
            None
        }
    }
}

/// 交期 = 开工日 + 提前期（负数按 0 计）
pub fn due_date(start: NaiveDate, lead_time_days: i64) -> NaiveDate {
    let days = lead_time_days.max(0) as u64;
    start.checked_add_days(Days::new(days)).unwrap_or(start)
}

/// 跳转规则
///
/// - 有活动首道工序: auto_start_job ? 开工页(带模式) : 工序页
/// - 否则: 作业详情页
pub fn resolve_redirect(kanban: &Kanban, job: &Job, first_operation: Option<&JobOperation>) -> String {
    match first_operation {
        Some(op) if op.is_active() => {
            if kanban.auto_start_job {
                redirect::start_operation(&op.id, OperationStartMode::for_operation(op))
            } else {
                redirect::job_operation(&op.id)
            }
        }
        _ => redirect::job_details(&job.id),
    }
}
