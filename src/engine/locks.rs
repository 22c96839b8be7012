// ==========================================
// 看板补货调度 - 按键串行化锁
// ==========================================
// kanban:{id}                  同一看板的并发调度串行执行
// supplier:{company}:{supplier} 同一供应商的"查找或新建订单"串行执行
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct DispatchLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl DispatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kanban_key(kanban_id: &str) -> String {
        format!("kanban:{}", kanban_id)
    }

    pub fn supplier_key(company_id: &str, supplier_id: &str) -> String {
        format!("supplier:{}:{}", company_id, supplier_id)
    }

    /// 获取键对应的锁（guard 释放即解锁）
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let slot = {
            // 中毒时沿用内部数据: 表里只有锁句柄, 没有需要保护的不变量
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            // 清理无人持有的旧锁
            slots.retain(|k, v| k == key || Arc::strong_count(v) > 1);
            slots
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }

    /// 当前登记的键数量
    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(DispatchLocks::new());
        let guard = locks.acquire("kanban:K1").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire("kanban:K1").await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = DispatchLocks::new();
        let _a = locks.acquire(&DispatchLocks::kanban_key("K1")).await;
        let _b = tokio::time::timeout(
            Duration::from_secs(1),
            locks.acquire(&DispatchLocks::supplier_key("C1", "S1")),
        )
        .await
        .unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = DispatchLocks::new();
        drop(locks.acquire("kanban:K1").await);
        drop(locks.acquire("kanban:K2").await);
        // 获取 K3 时会清理 K1 / K2
        let _g = locks.acquire("kanban:K3").await;
        assert_eq!(locks.len(), 1);
    }
}
