// ==========================================
// 现场服务运营调度系统 - 查询结果缓存
// ==========================================
// 职责: 按查询参数键缓存规范化后的工单批次
// 口径: 显式注入的协作者（不是模块级全局状态）；
//       TTL 到期即失效；缓存内部故障一律按 miss 处理，
//       绝不让缓存问题变成查询失败
// ==========================================

use crate::domain::work_order::WorkOrder;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// 默认 TTL（与后端侧响应缓存口径一致）
pub const DEFAULT_TTL: Duration = Duration::from_secs(45);

// ==========================================
// QueryCache - 查询结果缓存
// ==========================================
pub struct QueryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    stored_at: Instant,
    orders: Vec<WorkOrder>,
}

impl QueryCache {
    /// 默认 TTL 的缓存
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// 指定 TTL 的缓存
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 查缓存；过期或锁故障均为 miss
    pub fn get(&self, key: &str) -> Option<Vec<WorkOrder>> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        debug!(key, "查询缓存命中");
        Some(entry.orders.clone())
    }

    /// 写缓存（尽力而为；顺带清掉已过期条目）
    pub fn put(&self, key: &str, orders: Vec<WorkOrder>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(
            key.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                orders,
            },
        );
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
