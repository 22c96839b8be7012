// ==========================================
// 看板补货调度 - 物料主数据
// ==========================================
// 物料 / 补货策略 / 拣货货架 / 供应商物料 / 工艺模板
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub company_id: String,
    pub readable_id: String,
    pub name: String,
    pub item_type: String,               // Part / Material / Tool / Consumable ...
    pub unit_of_measure_code: String,    // 库存单位
    pub unit_cost: Option<f64>,          // 标准成本
}

/// 物料补货策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReplenishment {
    pub item_id: String,
    pub company_id: String,
    pub lead_time: Option<i64>,                          // 提前期（天）
    pub conversion_factor: Option<f64>,                  // 默认采购换算系数
    pub purchasing_unit_of_measure_code: Option<String>, // 默认采购单位
    pub preferred_supplier_id: Option<String>,
}

/// 拣货方式（物料在某库位的默认货架）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickMethod {
    pub item_id: String,
    pub location_id: String,
    pub company_id: String,
    pub default_shelf_id: Option<String>,
}

/// 供应商物料（协议价）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierPart {
    pub item_id: String,
    pub supplier_id: String,
    pub company_id: String,
    pub supplier_part_id: Option<String>,
    pub unit_price: Option<f64>,
    pub supplier_unit_of_measure_code: Option<String>,
}

// ==========================================
// 工艺模板 (Make Method)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeMethod {
    pub id: String,
    pub item_id: String,
    pub company_id: String,
    pub operations: Vec<MethodOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodOperation {
    pub operation_order: i32,
    pub description: String,
    pub work_center_id: Option<String>,
    pub setup_time: f64,
    pub machine_time: f64,
    pub labor_time: f64,
}
