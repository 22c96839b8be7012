// ==========================================
// 看板补货调度 - 生产作业仓储
// ==========================================
// 职责: 作业创建 / 工艺关联 / 工序查询 / 状态更新
// 红线: 本模块不提供删除, 已创建作业只能改状态
// ==========================================

use crate::domain::job::{Job, JobOperation, NewJob};
use crate::domain::types::{JobOperationStatus, JobStatus};
use crate::repository::db_utils::{get_parsed, new_id};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const JOB_COLUMNS: &str = r#"
    id, job_id, company_id, item_id, quantity, location_id, shelf_id,
    unit_of_measure_code, start_date, due_date, deadline_type, status, created_by
"#;

const OPERATION_COLUMNS: &str = r#"
    id, job_id, operation_order, description, work_center_id,
    setup_time, machine_time, labor_time, status
"#;

pub struct JobRepository {
    conn: Arc<Mutex<Connection>>,
}

impl JobRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建作业（初始状态 Draft）
    pub fn insert(&self, new_job: &NewJob) -> RepositoryResult<Job> {
        let conn = self.get_conn()?;
        let id = new_id();
        conn.execute(
            r#"
            INSERT INTO job (
                id, job_id, company_id, item_id, quantity, location_id, shelf_id,
                unit_of_measure_code, start_date, due_date, deadline_type, status, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                id,
                new_job.job_id,
                new_job.company_id,
                new_job.item_id,
                new_job.quantity,
                new_job.location_id,
                new_job.shelf_id,
                new_job.unit_of_measure_code,
                new_job.start_date,
                new_job.due_date,
                new_job.deadline_type,
                JobStatus::Draft.as_str(),
                new_job.created_by,
            ],
        )?;

        Ok(Job {
            id,
            job_id: new_job.job_id.clone(),
            company_id: new_job.company_id.clone(),
            item_id: new_job.item_id.clone(),
            quantity: new_job.quantity,
            location_id: new_job.location_id.clone(),
            shelf_id: new_job.shelf_id.clone(),
            unit_of_measure_code: new_job.unit_of_measure_code.clone(),
            start_date: new_job.start_date,
            due_date: new_job.due_date,
            deadline_type: new_job.deadline_type.clone(),
            status: JobStatus::Draft,
            created_by: new_job.created_by.clone(),
        })
    }

    /// 将物料工艺模板复制到作业
    ///
    /// # 返回
    /// - Ok(n): 复制的工序数
    /// - Err(NotFound): 物料没有工艺模板
    pub fn copy_method_from_item(&self, job: &Job) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let make_method_id: String = tx
            .query_row(
                "SELECT id FROM make_method WHERE item_id = ?1 AND company_id = ?2",
                params![job.item_id, job.company_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("make_method", &job.item_id))?;

        tx.execute(
            r#"
            INSERT OR REPLACE INTO job_make_method (job_id, item_id, make_method_id, company_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![job.id, job.item_id, make_method_id, job.company_id],
        )?;

        let templates: Vec<(i32, String, Option<String>, f64, f64, f64)> = {
            let mut stmt = tx.prepare(
                r#"
                SELECT operation_order, description, work_center_id, setup_time, machine_time, labor_time
                FROM method_operation
                WHERE make_method_id = ?1
                ORDER BY operation_order ASC, id ASC
                "#,
            )?;
            let rows = stmt.query_map(params![make_method_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO job_operation (
                    id, job_id, company_id, operation_order, description, work_center_id,
                    setup_time, machine_time, labor_time, status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )?;
            for (order, description, work_center_id, setup, machine, labor) in &templates {
                stmt.execute(params![
                    new_id(),
                    job.id,
                    job.company_id,
                    order,
                    description,
                    work_center_id,
                    setup,
                    machine,
                    labor,
                    JobOperationStatus::Todo.as_str(),
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(templates.len())
    }

    /// 工序顺序最小的活动工序
    pub fn first_active_operation(
        &self,
        job_id: &str,
        company_id: &str,
    ) -> RepositoryResult<Option<JobOperation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM job_operation
            WHERE job_id = ?1 AND company_id = ?2 AND status NOT IN (?3, ?4)
            ORDER BY operation_order ASC
            LIMIT 1
            "#,
            OPERATION_COLUMNS
        );
        let op = conn
            .query_row(
                &sql,
                params![
                    job_id,
                    company_id,
                    JobOperationStatus::Done.as_str(),
                    JobOperationStatus::Canceled.as_str(),
                ],
                map_operation_row,
            )
            .optional()?;
        Ok(op)
    }

    pub fn list_operations(&self, job_id: &str, company_id: &str) -> RepositoryResult<Vec<JobOperation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM job_operation WHERE job_id = ?1 AND company_id = ?2 ORDER BY operation_order ASC",
            OPERATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let ops = stmt
            .query_map(params![job_id, company_id], map_operation_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ops)
    }

    pub fn update_operation_status(
        &self,
        operation_id: &str,
        status: JobOperationStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE job_operation SET status = ?1 WHERE id = ?2",
            params![status.as_str(), operation_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::not_found("job_operation", operation_id));
        }
        Ok(())
    }

    /// 更新作业状态
    pub fn update_status(
        &self,
        job_id: &str,
        company_id: &str,
        status: JobStatus,
        updated_by: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"
            UPDATE job SET status = ?1, updated_by = ?2, updated_at = datetime('now')
            WHERE id = ?3 AND company_id = ?4
            "#,
            params![status.as_str(), updated_by, job_id, company_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::not_found("job", job_id));
        }
        Ok(())
    }

    pub fn find_by_id(&self, job_id: &str, company_id: &str) -> RepositoryResult<Option<Job>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM job WHERE id = ?1 AND company_id = ?2", JOB_COLUMNS);
        let job = conn
            .query_row(&sql, params![job_id, company_id], map_job_row)
            .optional()?;
        Ok(job)
    }

    /// 物料的全部作业（按编号）
    pub fn list_by_item(&self, item_id: &str, company_id: &str) -> RepositoryResult<Vec<Job>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM job WHERE item_id = ?1 AND company_id = ?2 ORDER BY job_id ASC",
            JOB_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map(params![item_id, company_id], map_job_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }
}

fn map_job_row(row: &Row) -> rusqlite::Result<Job> {
    Ok(Job {
        id: row.get(0)?,
        job_id: row.get(1)?,
        company_id: row.get(2)?,
        item_id: row.get(3)?,
        quantity: row.get(4)?,
        location_id: row.get(5)?,
        shelf_id: row.get(6)?,
        unit_of_measure_code: row.get(7)?,
        start_date: row.get(8)?,
        due_date: row.get(9)?,
        deadline_type: row.get(10)?,
        status: get_parsed(row, 11)?,
        created_by: row.get(12)?,
    })
}

fn map_operation_row(row: &Row) -> rusqlite::Result<JobOperation> {
    Ok(JobOperation {
        id: row.get(0)?,
        job_id: row.get(1)?,
        operation_order: row.get(2)?,
        description: row.get(3)?,
        work_center_id: row.get(4)?,
        setup_time: row.get(5)?,
        machine_time: row.get(6)?,
        labor_time: row.get(7)?,
        status: get_parsed(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;
    use crate::domain::item::{Item, MakeMethod, MethodOperation};
    use crate::repository::item_repo::ItemRepository;
    use chrono::NaiveDate;

    fn new_job(readable: &str) -> NewJob {
        NewJob {
            job_id: readable.to_string(),
            company_id: "C001".to_string(),
            item_id: "I001".to_string(),
            quantity: 10.0,
            location_id: "L001".to_string(),
            shelf_id: None,
            unit_of_measure_code: Some("EA".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            deadline_type: "Soft Deadline".to_string(),
            created_by: "U001".to_string(),
        }
    }

    fn seed_method(items: &ItemRepository) {
        items
            .upsert_item(&Item {
                id: "I001".to_string(),
                company_id: "C001".to_string(),
                readable_id: "BRKT-01".to_string(),
                name: "Bracket".to_string(),
                item_type: "Part".to_string(),
                unit_of_measure_code: "EA".to_string(),
                unit_cost: None,
            })
            .unwrap();
        items
            .replace_make_method(&MakeMethod {
                id: "MM1".to_string(),
                item_id: "I001".to_string(),
                company_id: "C001".to_string(),
                operations: vec![
                    MethodOperation {
                        operation_order: 10,
                        description: "Cut".to_string(),
                        work_center_id: Some("WC-SAW".to_string()),
                        setup_time: 0.5,
                        machine_time: 2.0,
                        labor_time: 0.0,
                    },
                    MethodOperation {
                        operation_order: 20,
                        description: "Weld".to_string(),
                        work_center_id: None,
                        setup_time: 0.0,
                        machine_time: 0.0,
                        labor_time: 1.5,
                    },
                ],
            })
            .unwrap();
    }

    #[test]
    fn test_insert_and_find() {
        let repo = JobRepository::new(open_in_memory_connection().unwrap());
        let job = repo.insert(&new_job("J000001")).unwrap();
        assert_eq!(job.status, JobStatus::Draft);

        let loaded = repo.find_by_id(&job.id, "C001").unwrap().unwrap();
        assert_eq!(loaded.job_id, "J000001");
        assert_eq!(loaded.due_date, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert!(repo.find_by_id(&job.id, "C002").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_readable_id_rejected() {
        let repo = JobRepository::new(open_in_memory_connection().unwrap());
        repo.insert(&new_job("J000001")).unwrap();
        let result = repo.insert(&new_job("J000001"));
        assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));
    }

    #[test]
    fn test_copy_method_and_first_active_operation() {
        let conn = open_in_memory_connection().unwrap();
        let items = ItemRepository::new(conn.clone());
        let repo = JobRepository::new(conn);
        seed_method(&items);

        let job = repo.insert(&new_job("J000001")).unwrap();
        assert_eq!(repo.copy_method_from_item(&job).unwrap(), 2);

        let first = repo.first_active_operation(&job.id, "C001").unwrap().unwrap();
        assert_eq!(first.description, "Cut");
        assert_eq!(first.status, JobOperationStatus::Todo);
        assert_eq!(first.work_center_id.as_deref(), Some("WC-SAW"));

        // 首道工序完成后, 下一道成为活动工序
        repo.update_operation_status(&first.id, JobOperationStatus::Done).unwrap();
        let next = repo.first_active_operation(&job.id, "C001").unwrap().unwrap();
        assert_eq!(next.description, "Weld");

        repo.update_operation_status(&next.id, JobOperationStatus::Canceled).unwrap();
        assert!(repo.first_active_operation(&job.id, "C001").unwrap().is_none());
    }

    #[test]
    fn test_copy_method_without_template() {
        let repo = JobRepository::new(open_in_memory_connection().unwrap());
        let job = repo.insert(&new_job("J000001")).unwrap();

        let result = repo.copy_method_from_item(&job);
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
        assert!(repo.list_operations(&job.id, "C001").unwrap().is_empty());
    }

    #[test]
    fn test_update_status() {
        let repo = JobRepository::new(open_in_memory_connection().unwrap());
        let job = repo.insert(&new_job("J000001")).unwrap();

        repo.update_status(&job.id, "C001", JobStatus::Ready, "U002").unwrap();
        let loaded = repo.find_by_id(&job.id, "C001").unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Ready);

        let result = repo.update_status(&job.id, "C999", JobStatus::Ready, "U002");
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }
}
