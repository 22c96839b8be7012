// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use carbon_kanban::domain::{Kanban, MethodOperation, ReplenishmentSystem};

pub const COMPANY_ID: &str = "C001";
pub const OTHER_COMPANY_ID: &str = "C002";
pub const USER_ID: &str = "U001";
pub const LOCATION_ID: &str = "L001";
pub const SUPPLIER_ID: &str = "SUP1";

// ==========================================
// Kanban 构建器
// ==========================================

pub struct KanbanBuilder {
    kanban: Kanban,
}

impl KanbanBuilder {
    /// 自制看板（默认 10 件, 不自动下达）
    pub fn make(id: &str, item_id: &str) -> Self {
        Self {
            kanban: Kanban {
                id: id.to_string(),
                company_id: COMPANY_ID.to_string(),
                item_id: item_id.to_string(),
                replenishment_system: ReplenishmentSystem::Make,
                quantity: 10.0,
                location_id: LOCATION_ID.to_string(),
                supplier_id: None,
                shelf_id: None,
                purchase_unit_of_measure_code: None,
                conversion_factor: None,
                auto_release: false,
                auto_start_job: false,
                job_id: None,
                job_readable_id: None,
                active: true,
            },
        }
    }

    /// 采购看板（默认供应商 SUP1）
    pub fn buy(id: &str, item_id: &str) -> Self {
        let mut builder = Self::make(id, item_id);
        builder.kanban.replenishment_system = ReplenishmentSystem::Buy;
        builder.kanban.supplier_id = Some(SUPPLIER_ID.to_string());
        builder
    }

    pub fn system(mut self, system: ReplenishmentSystem) -> Self {
        self.kanban.replenishment_system = system;
        self
    }

    pub fn quantity(mut self, quantity: f64) -> Self {
        self.kanban.quantity = quantity;
        self
    }

    pub fn supplier(mut self, supplier_id: Option<&str>) -> Self {
        self.kanban.supplier_id = supplier_id.map(str::to_string);
        self
    }

    pub fn shelf(mut self, shelf_id: &str) -> Self {
        self.kanban.shelf_id = Some(shelf_id.to_string());
        self
    }

    pub fn purchase_uom(mut self, code: &str) -> Self {
        self.kanban.purchase_unit_of_measure_code = Some(code.to_string());
        self
    }

    pub fn conversion_factor(mut self, factor: f64) -> Self {
        self.kanban.conversion_factor = Some(factor);
        self
    }

    pub fn auto_release(mut self) -> Self {
        self.kanban.auto_release = true;
        self
    }

    /// 自动开工（隐含自动下达）
    pub fn auto_start(mut self) -> Self {
        self.kanban.auto_release = true;
        self.kanban.auto_start_job = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.kanban.active = false;
        self
    }

    pub fn company(mut self, company_id: &str) -> Self {
        self.kanban.company_id = company_id.to_string();
        self
    }

    pub fn build(self) -> Kanban {
        self.kanban
    }
}

// ==========================================
// 工艺工序
// ==========================================

pub fn operation(order: i32, setup: f64, machine: f64, labor: f64) -> MethodOperation {
    MethodOperation {
        operation_order: order,
        description: format!("OP{}", order),
        work_center_id: Some(format!("WC{}", order)),
        setup_time: setup,
        machine_time: machine,
        labor_time: labor,
    }
}
