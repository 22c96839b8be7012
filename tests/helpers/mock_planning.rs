// ==========================================
// 计划服务记录器 - 用于集成测试
// ==========================================
// 记录每次调用 (函数名, 作业ID); 可设定 MRP 前 N 次调用失败
// ==========================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use carbon_kanban::engine::planning::{
    PlanningError, PlanningResult, PlanningServices, PlanningTarget, FUNCTION_MRP,
    FUNCTION_RECALCULATE, FUNCTION_SCHEDULER,
};

#[derive(Debug, Default)]
pub struct RecordingPlanningServices {
    calls: Mutex<Vec<(String, String)>>,
    mrp_failures_left: AtomicUsize,
}

impl RecordingPlanningServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// MRP 前 `times` 次调用返回 503
    pub fn failing_mrp(times: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            mrp_failures_left: AtomicUsize::new(times),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, function: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(f, _)| f == function)
            .map(|(_, job_id)| job_id)
            .collect()
    }

    fn record(&self, function: &str, target: &PlanningTarget) {
        self.calls
            .lock()
            .unwrap()
            .push((function.to_string(), target.job_id.clone()));
    }
}

#[async_trait]
impl PlanningServices for RecordingPlanningServices {
    async fn recalculate_requirements(&self, target: &PlanningTarget) -> PlanningResult<()> {
        self.record(FUNCTION_RECALCULATE, target);
        Ok(())
    }

    async fn run_mrp(&self, target: &PlanningTarget) -> PlanningResult<()> {
        self.record(FUNCTION_MRP, target);
        let failed = self
            .mrp_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(PlanningError::Status {
                function: FUNCTION_MRP.to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn schedule_job(&self, target: &PlanningTarget) -> PlanningResult<()> {
        self.record(FUNCTION_SCHEDULER, target);
        Ok(())
    }
}
