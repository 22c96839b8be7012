// ==========================================
// 看板补货调度 - 看板领域模型
// ==========================================
// 职责: 看板卡片 = 固定数量的自制/采购补货信号
// 红线: Make 看板已关联作业 (job_readable_id 非空) 时不得重复派工
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::ReplenishmentSystem;

// ==========================================
// Kanban - 看板卡片
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kanban {
    pub id: String,                                     // 看板ID
    pub company_id: String,                             // 所属公司
    pub item_id: String,                                // 物料
    pub replenishment_system: ReplenishmentSystem,      // 补货方式
    pub quantity: f64,                                  // 补货数量
    pub location_id: String,                            // 库位（工厂/仓库）
    pub supplier_id: Option<String>,                    // 供应商 (Buy)
    pub shelf_id: Option<String>,                       // 货架
    pub purchase_unit_of_measure_code: Option<String>,  // 采购单位
    pub conversion_factor: Option<f64>,                 // 采购→库存换算系数
    pub auto_release: bool,                             // 自动下达
    pub auto_start_job: bool,                           // 自动开工
    pub job_id: Option<String>,                         // 已关联作业 (内部ID)
    pub job_readable_id: Option<String>,                // 已关联作业 (编号)
    pub active: bool,                                   // 是否启用
}

impl Kanban {
    /// Make 看板且已关联作业 → 冲突状态
    pub fn is_collision(&self) -> bool {
        self.replenishment_system == ReplenishmentSystem::Make
            && self
                .job_readable_id
                .as_deref()
                .map(|id| !id.trim().is_empty())
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_kanban(system: ReplenishmentSystem, job_readable_id: Option<&str>) -> Kanban {
        Kanban {
            id: "K001".to_string(),
            company_id: "C001".to_string(),
            item_id: "I001".to_string(),
            replenishment_system: system,
            quantity: 10.0,
            location_id: "L001".to_string(),
            supplier_id: None,
            shelf_id: None,
            purchase_unit_of_measure_code: None,
            conversion_factor: None,
            auto_release: false,
            auto_start_job: false,
            job_id: None,
            job_readable_id: job_readable_id.map(|s| s.to_string()),
            active: true,
        }
    }

    #[test]
    fn test_collision_only_for_make_with_job() {
        assert!(make_kanban(ReplenishmentSystem::Make, Some("J000001")).is_collision());
        assert!(!make_kanban(ReplenishmentSystem::Make, None).is_collision());
        assert!(!make_kanban(ReplenishmentSystem::Make, Some("  ")).is_collision());
        // Buy 看板不做冲突判定
        assert!(!make_kanban(ReplenishmentSystem::Buy, Some("J000001")).is_collision());
    }
}
