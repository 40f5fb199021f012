// ==========================================
// 现场服务运营调度系统 - 外部工单数据源接口
// ==========================================
// 职责: 定义后端网关的查询契约（实现在核心之外）
// 口径: 查询参数携带日期区间 + 可选分支 + 筛选器ID或
//       内联定义 JSON；两者都给时内联定义优先
// ==========================================

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

// ==========================================
// TransportError - 传输层错误
// ==========================================
// 携带状态码与原始响应体，便于排障
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("后端请求失败: status={status} {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    #[error("后端不可达: {0}")]
    Unreachable(String),

    #[error("响应解析失败: {0}")]
    MalformedResponse(String),
}

// ==========================================
// WorkOrderQuery - 工单查询参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOrderQuery {
    pub start: NaiveDate,
    pub end: NaiveDate, // 闭区间末日
    pub branch_id: Option<String>,
    /// 保存的筛选器ID（后端自行解析定义）
    pub filter_id: Option<String>,
    /// 内联定义的规范化 JSON（FilterDefinition::to_canonical_json）
    pub filter_json: Option<String>,
}

impl WorkOrderQuery {
    /// 缓存键：参数的规范化拼接（形式稳定）
    pub fn cache_key(&self) -> String {
        format!(
            "os:v1:{}:{}:{}:{}:{}",
            self.start,
            self.end,
            self.branch_id.as_deref().unwrap_or("all"),
            self.filter_id.as_deref().unwrap_or("-"),
            self.filter_json.as_deref().unwrap_or("-"),
        )
    }
}

// ==========================================
// RawScheduleResponse - 后端响应包络
// ==========================================
// 后端有两种返回形态，核心两种都要接：
// - Orders: 平铺工单列表
// - Bucketed: 后端已按日预分桶 {date, items, capacity}
//   （本地仍会重算容量账目，保证口径统一）
#[derive(Debug, Clone)]
pub enum RawScheduleResponse {
    Orders(Vec<Value>),
    Bucketed(Vec<RawAgendaDay>),
}

/// 预分桶响应的单日载荷
#[derive(Debug, Clone)]
pub struct RawAgendaDay {
    pub date: String,
    pub items: Vec<Value>,
}

// ==========================================
// WorkOrderSource - 工单数据源 trait
// ==========================================
// 唯一的悬挂点（网络 IO）；取消语义由调用方（控制器）
// 通过 future 丢弃/中止实现
#[async_trait]
pub trait WorkOrderSource: Send + Sync {
    /// 按查询参数取回候选工单
    async fn fetch_orders(
        &self,
        query: &WorkOrderQuery,
    ) -> Result<RawScheduleResponse, TransportError>;
}
