// ==========================================
// 看板补货调度 - 生产作业领域模型
// ==========================================
// 生命周期: 由调度器创建, 之后由生产流程维护, 本路径从不删除
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::{JobOperationStatus, JobStatus};

// ==========================================
// Job - 生产作业
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,                           // 内部ID
    pub job_id: String,                       // 作业编号 (序列号)
    pub company_id: String,
    pub item_id: String,
    pub quantity: f64,
    pub location_id: String,
    pub shelf_id: Option<String>,
    pub unit_of_measure_code: Option<String>,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub deadline_type: String,
    pub status: JobStatus,
    pub created_by: String,
}

/// 新建作业参数
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_id: String,
    pub company_id: String,
    pub item_id: String,
    pub quantity: f64,
    pub location_id: String,
    pub shelf_id: Option<String>,
    pub unit_of_measure_code: Option<String>,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub deadline_type: String,
    pub created_by: String,
}

// ==========================================
// JobOperation - 作业工序
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOperation {
    pub id: String,
    pub job_id: String,              // 关联作业 (内部ID)
    pub operation_order: i32,        // 工序顺序
    pub description: String,
    pub work_center_id: Option<String>,
    pub setup_time: f64,
    pub machine_time: f64,
    pub labor_time: f64,
    pub status: JobOperationStatus,
}

impl JobOperation {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
