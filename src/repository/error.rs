// ==========================================
// 看板补货调度 - 仓储层错误类型
// ==========================================
// 引擎层只关心 NotFound 与其余失败的区别,
// 其余变体用于日志定位
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("SQL 执行失败: {0}")]
    Sql(String),

    /// 后台任务异常（spawn_blocking 被取消或 panic）
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let msg = msg.unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(msg)
                    }
                    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        RepositoryError::ForeignKeyViolation(msg)
                    }
                    _ => RepositoryError::Sql(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found("row", "?"),
            other => RepositoryError::Sql(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_constraint_codes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY);
             CREATE TABLE child (id TEXT PRIMARY KEY, parent_id TEXT REFERENCES parent(id));
             INSERT INTO parent VALUES ('P1');",
        )
        .unwrap();

        let dup: RepositoryError = conn
            .execute("INSERT INTO parent VALUES ('P1')", [])
            .unwrap_err()
            .into();
        assert!(matches!(dup, RepositoryError::UniqueConstraintViolation(_)));

        let orphan: RepositoryError = conn
            .execute("INSERT INTO child VALUES ('C1', 'missing')", [])
            .unwrap_err()
            .into();
        assert!(matches!(orphan, RepositoryError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_not_found_message() {
        let msg = RepositoryError::not_found("kanban", "K001").to_string();
        assert!(msg.contains("kanban"));
        assert!(msg.contains("K001"));
    }
}
