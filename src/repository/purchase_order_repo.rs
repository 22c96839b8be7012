// ==========================================
// 看板补货调度 - 采购订单仓储
// ==========================================
// 职责: 查找可复用的未下达订单 / 创建订单 / 追加订单行
// ==========================================

use crate::domain::purchasing::{
    NewPurchaseOrder, NewPurchaseOrderLine, PurchaseOrder, PurchaseOrderLine,
    PURCHASE_ORDER_TYPE_PURCHASE,
};
use crate::domain::types::PurchaseOrderStatus;
use crate::repository::db_utils::{get_parsed, new_id};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = r#"
    id, purchase_order_id, company_id, supplier_id, status, purchase_order_type,
    location_id, order_date, created_by, created_at
"#;

const LINE_COLUMNS: &str = r#"
    id, purchase_order_id, company_id, purchase_order_line_type, item_id, description,
    purchase_quantity, purchase_unit_of_measure_code, inventory_unit_of_measure_code,
    conversion_factor, supplier_unit_price, location_id, shelf_id, kanban_id, created_by
"#;

pub struct PurchaseOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PurchaseOrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查找供应商最早创建的未下达订单 (Planned / Draft)
    pub fn find_open_for_supplier(
        &self,
        company_id: &str,
        supplier_id: &str,
    ) -> RepositoryResult<Option<PurchaseOrder>> {
        let conn = self.get_conn()?;
        let [first, second] = PurchaseOrderStatus::OPEN;
        let sql = format!(
            r#"
            SELECT {} FROM purchase_order
            WHERE company_id = ?1 AND supplier_id = ?2 AND status IN (?3, ?4)
            ORDER BY created_at ASC, rowid ASC
            LIMIT 1
            "#,
            ORDER_COLUMNS
        );
        let order = conn
            .query_row(
                &sql,
                params![company_id, supplier_id, first.as_str(), second.as_str()],
                map_order_row,
            )
            .optional()?;
        Ok(order)
    }

    /// 创建 Draft 状态的采购订单
    pub fn insert(&self, new_order: &NewPurchaseOrder) -> RepositoryResult<PurchaseOrder> {
        let conn = self.get_conn()?;
        let id = new_id();
        conn.execute(
            r#"
            INSERT INTO purchase_order (
                id, purchase_order_id, company_id, supplier_id, status, purchase_order_type,
                location_id, order_date, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                id,
                new_order.purchase_order_id,
                new_order.company_id,
                new_order.supplier_id,
                PurchaseOrderStatus::Draft.as_str(),
                PURCHASE_ORDER_TYPE_PURCHASE,
                new_order.location_id,
                new_order.order_date,
                new_order.created_by,
            ],
        )?;

        let sql = format!("SELECT {} FROM purchase_order WHERE id = ?1", ORDER_COLUMNS);
        let order = conn.query_row(&sql, params![id], map_order_row)?;
        Ok(order)
    }

    /// 追加订单行
    pub fn insert_line(&self, line: &NewPurchaseOrderLine) -> RepositoryResult<PurchaseOrderLine> {
        let conn = self.get_conn()?;
        let id = new_id();
        conn.execute(
            r#"
            INSERT INTO purchase_order_line (
                id, purchase_order_id, company_id, purchase_order_line_type, item_id, description,
                purchase_quantity, purchase_unit_of_measure_code, inventory_unit_of_measure_code,
                conversion_factor, supplier_unit_price, location_id, shelf_id, kanban_id, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                id,
                line.purchase_order_id,
                line.company_id,
                line.purchase_order_line_type,
                line.item_id,
                line.description,
                line.purchase_quantity,
                line.purchase_unit_of_measure_code,
                line.inventory_unit_of_measure_code,
                line.conversion_factor,
                line.supplier_unit_price,
                line.location_id,
                line.shelf_id,
                line.kanban_id,
                line.created_by,
            ],
        )?;

        Ok(PurchaseOrderLine {
            id,
            purchase_order_id: line.purchase_order_id.clone(),
            company_id: line.company_id.clone(),
            purchase_order_line_type: line.purchase_order_line_type.clone(),
            item_id: line.item_id.clone(),
            description: line.description.clone(),
            purchase_quantity: line.purchase_quantity,
            purchase_unit_of_measure_code: line.purchase_unit_of_measure_code.clone(),
            inventory_unit_of_measure_code: line.inventory_unit_of_measure_code.clone(),
            conversion_factor: line.conversion_factor,
            supplier_unit_price: line.supplier_unit_price,
            location_id: line.location_id.clone(),
            shelf_id: line.shelf_id.clone(),
            kanban_id: line.kanban_id.clone(),
            created_by: line.created_by.clone(),
        })
    }

    pub fn find_by_id(&self, id: &str, company_id: &str) -> RepositoryResult<Option<PurchaseOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM purchase_order WHERE id = ?1 AND company_id = ?2",
            ORDER_COLUMNS
        );
        let order = conn
            .query_row(&sql, params![id, company_id], map_order_row)
            .optional()?;
        Ok(order)
    }

    pub fn list_for_supplier(
        &self,
        company_id: &str,
        supplier_id: &str,
    ) -> RepositoryResult<Vec<PurchaseOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM purchase_order
            WHERE company_id = ?1 AND supplier_id = ?2
            ORDER BY created_at ASC, rowid ASC
            "#,
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![company_id, supplier_id], map_order_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    pub fn list_lines(
        &self,
        purchase_order_id: &str,
        company_id: &str,
    ) -> RepositoryResult<Vec<PurchaseOrderLine>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM purchase_order_line
            WHERE purchase_order_id = ?1 AND company_id = ?2
            ORDER BY created_at ASC, rowid ASC
            "#,
            LINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let lines = stmt
            .query_map(params![purchase_order_id, company_id], map_line_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    pub fn update_status(
        &self,
        id: &str,
        company_id: &str,
        status: PurchaseOrderStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE purchase_order SET status = ?1 WHERE id = ?2 AND company_id = ?3",
            params![status.as_str(), id, company_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::not_found("purchase_order", id));
        }
        Ok(())
    }
}

fn map_order_row(row: &Row) -> rusqlite::Result<PurchaseOrder> {
    Ok(PurchaseOrder {
        id: row.get(0)?,
        purchase_order_id: row.get(1)?,
        company_id: row.get(2)?,
        supplier_id: row.get(3)?,
        status: get_parsed(row, 4)?,
        purchase_order_type: row.get(5)?,
        location_id: row.get(6)?,
        order_date: row.get(7)?,
        created_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_line_row(row: &Row) -> rusqlite::Result<PurchaseOrderLine> {
    Ok(PurchaseOrderLine {
        id: row.get(0)?,
        purchase_order_id: row.get(1)?,
        company_id: row.get(2)?,
        purchase_order_line_type: row.get(3)?,
        item_id: row.get(4)?,
        description: row.get(5)?,
        purchase_quantity: row.get(6)?,
        purchase_unit_of_measure_code: row.get(7)?,
        inventory_unit_of_measure_code: row.get(8)?,
        conversion_factor: row.get(9)?,
        supplier_unit_price: row.get(10)?,
        location_id: row.get(11)?,
        shelf_id: row.get(12)?,
        kanban_id: row.get(13)?,
        created_by: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;
    use chrono::NaiveDate;

    fn new_order(readable: &str, supplier: &str) -> NewPurchaseOrder {
        NewPurchaseOrder {
            purchase_order_id: readable.to_string(),
            company_id: "C001".to_string(),
            supplier_id: supplier.to_string(),
            location_id: Some("L001".to_string()),
            order_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            created_by: "U001".to_string(),
        }
    }

    #[test]
    fn test_find_open_prefers_oldest() {
        let repo = PurchaseOrderRepository::new(open_in_memory_connection().unwrap());
        assert!(repo.find_open_for_supplier("C001", "SUP1").unwrap().is_none());

        let first = repo.insert(&new_order("PO000001", "SUP1")).unwrap();
        let second = repo.insert(&new_order("PO000002", "SUP1")).unwrap();
        repo.insert(&new_order("PO000003", "SUP2")).unwrap();
        assert_eq!(first.status, PurchaseOrderStatus::Draft);
        assert_eq!(first.purchase_order_type, PURCHASE_ORDER_TYPE_PURCHASE);

        let open = repo.find_open_for_supplier("C001", "SUP1").unwrap().unwrap();
        assert_eq!(open.id, first.id);

        // 已下达订单不再复用
        repo.update_status(&first.id, "C001", PurchaseOrderStatus::ToReceive).unwrap();
        let open = repo.find_open_for_supplier("C001", "SUP1").unwrap().unwrap();
        assert_eq!(open.id, second.id);

        // Planned 也属于未下达
        repo.update_status(&second.id, "C001", PurchaseOrderStatus::Planned).unwrap();
        assert!(repo.find_open_for_supplier("C001", "SUP1").unwrap().is_some());

        assert!(repo.find_open_for_supplier("C002", "SUP1").unwrap().is_none());
    }

    #[test]
    fn test_insert_line_records_kanban() {
        let repo = PurchaseOrderRepository::new(open_in_memory_connection().unwrap());
        let order = repo.insert(&new_order("PO000001", "SUP1")).unwrap();

        repo.insert_line(&NewPurchaseOrderLine {
            purchase_order_id: order.id.clone(),
            company_id: "C001".to_string(),
            purchase_order_line_type: "Part".to_string(),
            item_id: "I001".to_string(),
            description: "Bracket".to_string(),
            purchase_quantity: 40.0,
            purchase_unit_of_measure_code: Some("BOX".to_string()),
            inventory_unit_of_measure_code: Some("EA".to_string()),
            conversion_factor: 2.0,
            supplier_unit_price: 12.5,
            location_id: Some("L001".to_string()),
            shelf_id: None,
            kanban_id: Some("K001".to_string()),
            created_by: "U001".to_string(),
        })
        .unwrap();

        let lines = repo.list_lines(&order.id, "C001").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kanban_id.as_deref(), Some("K001"));
        assert_eq!(lines[0].conversion_factor, 2.0);
        assert!(repo.list_lines(&order.id, "C002").unwrap().is_empty());
    }
}
