// ==========================================
// 看板补货调度 - 同步仓储调用桥接
// ==========================================
// rusqlite 为同步 API, 异步路径上的仓储调用统一经 spawn_blocking 执行
// ==========================================

use crate::repository::{RepositoryError, RepositoryResult};

/// 在阻塞线程池中执行仓储调用
pub async fn run_blocking<T, F>(f: F) -> RepositoryResult<T>
where
    F: FnOnce() -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RepositoryError::InternalError(format!("阻塞任务执行失败: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_blocking_passes_result_through() {
        let ok = run_blocking(|| Ok(42)).await.unwrap();
        assert_eq!(ok, 42);

        let err: RepositoryResult<()> =
            run_blocking(|| Err(RepositoryError::not_found("kanban", "K1"))).await;
        assert!(matches!(err, Err(RepositoryError::NotFound { .. })));
    }
}
