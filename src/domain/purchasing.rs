// ==========================================
// 看板补货调度 - 采购订单领域模型
// ==========================================
// 约束: 同一公司同一供应商最多复用一张未下达 (Planned/Draft) 订单
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::PurchaseOrderStatus;

/// 看板创建的订单类型
pub const PURCHASE_ORDER_TYPE_PURCHASE: &str = "Purchase";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: String,
    pub purchase_order_id: String,       // 订单编号 (序列号)
    pub company_id: String,
    pub supplier_id: String,
    pub status: PurchaseOrderStatus,
    pub purchase_order_type: String,
    pub location_id: Option<String>,
    pub order_date: NaiveDate,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub purchase_order_id: String,
    pub company_id: String,
    pub supplier_id: String,
    pub location_id: Option<String>,
    pub order_date: NaiveDate,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub id: String,
    pub purchase_order_id: String,       // 关联订单 (内部ID)
    pub company_id: String,
    pub purchase_order_line_type: String,
    pub item_id: String,
    pub description: String,
    pub purchase_quantity: f64,
    pub purchase_unit_of_measure_code: Option<String>,
    pub inventory_unit_of_measure_code: Option<String>,
    pub conversion_factor: f64,
    pub supplier_unit_price: f64,
    pub location_id: Option<String>,
    pub shelf_id: Option<String>,
    pub kanban_id: Option<String>,       // 来源看板（追溯重复追加）
    pub created_by: String,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseOrderLine {
    pub purchase_order_id: String,
    pub company_id: String,
    pub purchase_order_line_type: String,
    pub item_id: String,
    pub description: String,
    pub purchase_quantity: f64,
    pub purchase_unit_of_measure_code: Option<String>,
    pub inventory_unit_of_measure_code: Option<String>,
    pub conversion_factor: f64,
    pub supplier_unit_price: f64,
    pub location_id: Option<String>,
    pub shelf_id: Option<String>,
    pub kanban_id: Option<String>,
    pub created_by: String,
}
