// ==========================================
// 看板补货调度 - 跳转路径
// ==========================================
// 调度成功后返回给前端的站内路径
// ==========================================

use crate::domain::job::JobOperation;
use crate::domain::types::OperationStartMode;

pub fn job_details(job_id: &str) -> String {
    format!("/x/job/{}", job_id)
}

pub fn job_operation(operation_id: &str) -> String {
    format!("/x/operation/{}", operation_id)
}

pub fn start_operation(operation_id: &str, mode: OperationStartMode) -> String {
    format!("/x/start/{}?type={}", operation_id, mode.as_str())
}

pub fn purchase_order_details(purchase_order_id: &str) -> String {
    format!("/x/purchase-order/{}", purchase_order_id)
}

pub fn kanban_collision(kanban_id: &str) -> String {
    format!("/x/kanban/{}/collision", kanban_id)
}

impl OperationStartMode {
    /// 开工模式: 有准备工时选 Setup, 否则有机器工时选 Machine, 否则 Labor
    pub fn for_operation(op: &JobOperation) -> Self {
        if op.setup_time > 0.0 {
            OperationStartMode::Setup
        } else if op.machine_time > 0.0 {
            OperationStartMode::Machine
        } else {
            OperationStartMode::Labor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::JobOperationStatus;

    fn op(setup: f64, machine: f64, labor: f64) -> JobOperation {
        JobOperation {
            id: "OP1".to_string(),
            job_id: "job-1".to_string(),
            operation_order: 10,
            description: "Cut".to_string(),
            work_center_id: None,
            setup_time: setup,
            machine_time: machine,
            labor_time: labor,
            status: JobOperationStatus::Todo,
        }
    }

    #[test]
    fn test_paths() {
        assert_eq!(job_details("J1"), "/x/job/J1");
        assert_eq!(job_operation("OP1"), "/x/operation/OP1");
        assert_eq!(
            start_operation("OP1", OperationStartMode::Machine),
            "/x/start/OP1?type=Machine"
        );
        assert_eq!(purchase_order_details("PO1"), "/x/purchase-order/PO1");
        assert_eq!(kanban_collision("K1"), "/x/kanban/K1/collision");
    }

    #[test]
    fn test_start_mode_priority() {
        assert_eq!(OperationStartMode::for_operation(&op(0.5, 2.0, 1.0)), OperationStartMode::Setup);
        assert_eq!(OperationStartMode::for_operation(&op(0.0, 2.0, 1.0)), OperationStartMode::Machine);
        assert_eq!(OperationStartMode::for_operation(&op(0.0, 0.0, 1.0)), OperationStartMode::Labor);
        // 全部为 0 时回退 Labor
        assert_eq!(OperationStartMode::for_operation(&op(0.0, 0.0, 0.0)), OperationStartMode::Labor);
    }
}
