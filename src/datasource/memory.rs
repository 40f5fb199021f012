// ==========================================
// 现场服务运营调度系统 - 内存工单数据源
// ==========================================
// 职责: 演示/测试用数据源；持有原始记录，
//       可注入延迟与故障
// 说明: 与真实后端一致，记录按原始载荷（别名字段）返回，
//       规范化仍走统一边界
// ==========================================

use crate::datasource::source::{
    RawScheduleResponse, TransportError, WorkOrderQuery, WorkOrderSource,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// ==========================================
// StaticWorkOrderSource - 内存数据源
// ==========================================
pub struct StaticWorkOrderSource {
    records: Vec<Value>,
    delay: Option<Duration>,
    fail: AtomicBool,
}

impl StaticWorkOrderSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            delay: None,
            fail: AtomicBool::new(false),
        }
    }

    /// 注入人工延迟（取消/竞态场景测试用）
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 打开/关闭故障注入（下次 fetch 返回 TransportError）
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkOrderSource for StaticWorkOrderSource {
    async fn fetch_orders(
        &self,
        _query: &WorkOrderQuery,
    ) -> Result<RawScheduleResponse, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Http {
                status: 502,
                message: "bad gateway".to_string(),
                body: "{\"error\":\"upstream indisponível\"}".to_string(),
            });
        }
        // 周期外记录由聚合端防御性丢弃，这里不预过滤
        Ok(RawScheduleResponse::Orders(self.records.clone()))
    }
}
