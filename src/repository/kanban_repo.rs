// ==========================================
// 看板补货调度 - 看板仓储
// ==========================================
// 职责: 读取看板卡片、回写关联作业
// 约束: 所有查询带 company_id, 跨公司读取视为不存在
// ==========================================

use crate::domain::kanban::Kanban;
use crate::domain::types::ReplenishmentSystem;
use crate::repository::db_utils::get_bool;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const KANBAN_COLUMNS: &str = r#"
    id,
    company_id,
    item_id,
    replenishment_system,
    quantity,
    location_id,
    supplier_id,
    shelf_id,
    purchase_unit_of_measure_code,
    conversion_factor,
    auto_release,
    auto_start_job,
    job_id,
    job_readable_id,
    active
"#;

pub struct KanbanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl KanbanRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按公司读取看板
    ///
    /// # 返回
    /// - Ok(Kanban): 看板存在且属于该公司
    /// - Err(NotFound): 不存在或属于其他公司
    pub fn find_for_company(&self, kanban_id: &str, company_id: &str) -> RepositoryResult<Kanban> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM kanban WHERE id = ?1 AND company_id = ?2",
            KANBAN_COLUMNS
        );
        conn.query_row(&sql, params![kanban_id, company_id], map_kanban_row)
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("kanban", kanban_id))
    }

    /// 新增或覆盖看板
    pub fn upsert(&self, kanban: &Kanban) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO kanban (
                id, company_id, item_id, replenishment_system, quantity, location_id,
                supplier_id, shelf_id, purchase_unit_of_measure_code, conversion_factor,
                auto_release, auto_start_job, job_id, job_readable_id, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                company_id = excluded.company_id,
                item_id = excluded.item_id,
                replenishment_system = excluded.replenishment_system,
                quantity = excluded.quantity,
                location_id = excluded.location_id,
                supplier_id = excluded.supplier_id,
                shelf_id = excluded.shelf_id,
                purchase_unit_of_measure_code = excluded.purchase_unit_of_measure_code,
                conversion_factor = excluded.conversion_factor,
                auto_release = excluded.auto_release,
                auto_start_job = excluded.auto_start_job,
                job_id = excluded.job_id,
                job_readable_id = excluded.job_readable_id,
                active = excluded.active
            "#,
            params![
                kanban.id,
                kanban.company_id,
                kanban.item_id,
                kanban.replenishment_system.as_str(),
                kanban.quantity,
                kanban.location_id,
                kanban.supplier_id,
                kanban.shelf_id,
                kanban.purchase_unit_of_measure_code,
                kanban.conversion_factor,
                kanban.auto_release as i64,
                kanban.auto_start_job as i64,
                kanban.job_id,
                kanban.job_readable_id,
                kanban.active as i64,
            ],
        )?;
        Ok(())
    }

    /// 回写看板关联作业
    ///
    /// 0 行受影响 (看板已删除/跨公司) 视为 NotFound
    pub fn link_job(
        &self,
        kanban_id: &str,
        company_id: &str,
        job_id: &str,
        job_readable_id: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE kanban SET job_id = ?1, job_readable_id = ?2 WHERE id = ?3 AND company_id = ?4",
            params![job_id, job_readable_id, kanban_id, company_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::not_found("kanban", kanban_id));
        }
        Ok(())
    }
}

fn map_kanban_row(row: &Row) -> rusqlite::Result<Kanban> {
    let system: String = row.get(3)?;
    Ok(Kanban {
        id: row.get(0)?,
        company_id: row.get(1)?,
        item_id: row.get(2)?,
        replenishment_system: ReplenishmentSystem::parse(&system),
        quantity: row.get(4)?,
        location_id: row.get(5)?,
        supplier_id: row.get(6)?,
        shelf_id: row.get(7)?,
        purchase_unit_of_measure_code: row.get(8)?,
        conversion_factor: row.get(9)?,
        auto_release: get_bool(row, 10)?,
        auto_start_job: get_bool(row, 11)?,
        job_id: row.get(12)?,
        job_readable_id: row.get(13)?,
        active: get_bool(row, 14)?,
    })
}
