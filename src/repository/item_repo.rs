// ==========================================
// 看板补货调度 - 物料主数据仓储
// ==========================================
// 职责: 物料 / 补货策略 / 默认货架 / 供应商物料 / 工艺模板 的读取与录入
// 说明: 查询不到返回 Ok(None), 由调用方决定是否回退
// ==========================================

use crate::domain::item::{
    Item, ItemReplenishment, MakeMethod, MethodOperation, PickMethod, SupplierPart,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_item(&self, item_id: &str, company_id: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                r#"
                SELECT id, company_id, readable_id, name, item_type, unit_of_measure_code, unit_cost
                FROM item
                WHERE id = ?1 AND company_id = ?2
                "#,
                params![item_id, company_id],
                |row| {
                    Ok(Item {
                        id: row.get(0)?,
                        company_id: row.get(1)?,
                        readable_id: row.get(2)?,
                        name: row.get(3)?,
                        item_type: row.get(4)?,
                        unit_of_measure_code: row.get(5)?,
                        unit_cost: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(item)
    }

    pub fn find_replenishment(
        &self,
        item_id: &str,
        company_id: &str,
    ) -> RepositoryResult<Option<ItemReplenishment>> {
        let conn = self.get_conn()?;
        let replenishment = conn
            .query_row(
                r#"
                SELECT item_id, company_id, lead_time, conversion_factor,
                       purchasing_unit_of_measure_code, preferred_supplier_id
                FROM item_replenishment
                WHERE item_id = ?1 AND company_id = ?2
                "#,
                params![item_id, company_id],
                |row| {
                    Ok(ItemReplenishment {
                        item_id: row.get(0)?,
                        company_id: row.get(1)?,
                        lead_time: row.get(2)?,
                        conversion_factor: row.get(3)?,
                        purchasing_unit_of_measure_code: row.get(4)?,
                        preferred_supplier_id: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(replenishment)
    }

    /// 物料在库位的默认货架
    pub fn find_default_shelf(
        &self,
        item_id: &str,
        location_id: &str,
        company_id: &str,
    ) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let shelf: Option<Option<String>> = conn
            .query_row(
                "SELECT default_shelf_id FROM pick_method WHERE item_id = ?1 AND location_id = ?2 AND company_id = ?3",
                params![item_id, location_id, company_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(shelf.flatten())
    }

    pub fn find_supplier_part(
        &self,
        item_id: &str,
        supplier_id: &str,
        company_id: &str,
    ) -> RepositoryResult<Option<SupplierPart>> {
        let conn = self.get_conn()?;
        let part = conn
            .query_row(
                r#"
                SELECT item_id, supplier_id, company_id, supplier_part_id, unit_price,
                       supplier_unit_of_measure_code
                FROM supplier_part
                WHERE item_id = ?1 AND supplier_id = ?2 AND company_id = ?3
                "#,
                params![item_id, supplier_id, company_id],
                |row| {
                    Ok(SupplierPart {
                        item_id: row.get(0)?,
                        supplier_id: row.get(1)?,
                        company_id: row.get(2)?,
                        supplier_part_id: row.get(3)?,
                        unit_price: row.get(4)?,
                        supplier_unit_of_measure_code: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(part)
    }

    /// 物料的工艺模板（含按顺序排列的工序）
    pub fn find_make_method(
        &self,
        item_id: &str,
        company_id: &str,
    ) -> RepositoryResult<Option<MakeMethod>> {
        let conn = self.get_conn()?;
        let method_id: Option<String> = conn
            .query_row(
                "SELECT id FROM make_method WHERE item_id = ?1 AND company_id = ?2",
                params![item_id, company_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(method_id) = method_id else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT operation_order, description, work_center_id, setup_time, machine_time, labor_time
            FROM method_operation
            WHERE make_method_id = ?1
            ORDER BY operation_order ASC, id ASC
            "#,
        )?;
        let operations = stmt
            .query_map(params![method_id], |row| {
                Ok(MethodOperation {
                    operation_order: row.get(0)?,
                    description: row.get(1)?,
                    work_center_id: row.get(2)?,
                    setup_time: row.get(3)?,
                    machine_time: row.get(4)?,
                    labor_time: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(MakeMethod {
            id: method_id,
            item_id: item_id.to_string(),
            company_id: company_id.to_string(),
            operations,
        }))
    }

    // ==========================================
    // 录入（演示库 / 测试）
    // ==========================================

    pub fn upsert_item(&self, item: &Item) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO item
                (id, company_id, readable_id, name, item_type, unit_of_measure_code, unit_cost)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                item.id,
                item.company_id,
                item.readable_id,
                item.name,
                item.item_type,
                item.unit_of_measure_code,
                item.unit_cost,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_replenishment(&self, replenishment: &ItemReplenishment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO item_replenishment
                (item_id, company_id, lead_time, conversion_factor,
                 purchasing_unit_of_measure_code, preferred_supplier_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                replenishment.item_id,
                replenishment.company_id,
                replenishment.lead_time,
                replenishment.conversion_factor,
                replenishment.purchasing_unit_of_measure_code,
                replenishment.preferred_supplier_id,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_pick_method(&self, pick: &PickMethod) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO pick_method (item_id, location_id, company_id, default_shelf_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![pick.item_id, pick.location_id, pick.company_id, pick.default_shelf_id],
        )?;
        Ok(())
    }

    pub fn upsert_supplier_part(&self, part: &SupplierPart) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO supplier_part
                (item_id, supplier_id, company_id, supplier_part_id, unit_price,
                 supplier_unit_of_measure_code)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                part.item_id,
                part.supplier_id,
                part.company_id,
                part.supplier_part_id,
                part.unit_price,
                part.supplier_unit_of_measure_code,
            ],
        )?;
        Ok(())
    }

    /// 覆盖写入工艺模板（先删旧工序再插入）
    pub fn replace_make_method(&self, method: &MakeMethod) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM make_method WHERE item_id = ?1 AND company_id = ?2",
            params![method.item_id, method.company_id],
        )?;
        tx.execute(
            "INSERT INTO make_method (id, item_id, company_id) VALUES (?1, ?2, ?3)",
            params![method.id, method.item_id, method.company_id],
        )?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO method_operation
                    (make_method_id, operation_order, description, work_center_id,
                     setup_time, machine_time, labor_time)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for op in &method.operations {
                stmt.execute(params![
                    method.id,
                    op.operation_order,
                    op.description,
                    op.work_center_id,
                    op.setup_time,
                    op.machine_time,
                    op.labor_time,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}
