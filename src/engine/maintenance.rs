// ==========================================
// 现场服务运营调度系统 - 维护工单看板引擎
// ==========================================
// 职责: 维护界面的页签划分 + 窗口/筛选组合过滤
// 口径: done 严格等于状态码 F；AG/RAG/DS/EX 视为已排程；
//       其余码（含未知码）一律归入 open
// ==========================================

use crate::domain::filter::FilterDefinition;
use crate::domain::types::{Category, MaintenanceTab};
use crate::domain::work_order::WorkOrder;
use crate::engine::criteria::CriteriaEvaluator;
use chrono::NaiveDate;
use tracing::instrument;

// ==========================================
// MaintenanceBoard - 维护看板引擎
// ==========================================
pub struct MaintenanceBoard {
    evaluator: CriteriaEvaluator,
}

impl MaintenanceBoard {
    pub fn new() -> Self {
        Self {
            evaluator: CriteriaEvaluator::new(),
        }
    }

    /// 状态码 → 页签
    pub fn tab_for(status_code: &str) -> MaintenanceTab {
        match status_code {
            "F" => MaintenanceTab::Done,
            "AG" | "RAG" | "DS" | "EX" => MaintenanceTab::Scheduled,
            _ => MaintenanceTab::Open,
        }
    }

    /// 看板列表：维护类别 + 页签 + 日期窗口 + 激活筛选
    ///
    /// # 参数
    /// - `window`: 闭区间 (start, end)，由 PeriodResolver 解析
    ///
    /// # 返回
    /// 命中工单按 (date, time, id) 升序
    #[instrument(skip_all, fields(order_count = orders.len(), tab = ?tab))]
    pub fn list(
        &self,
        orders: &[WorkOrder],
        tab: MaintenanceTab,
        window: (NaiveDate, NaiveDate),
        definition: &FilterDefinition,
    ) -> Vec<WorkOrder> {
        let (start, end) = window;
        let mut hits: Vec<WorkOrder> = orders
            .iter()
            .filter(|order| order.category == Category::Maintenance)
            .filter(|order| Self::tab_for(&order.status_code) == tab)
            .filter(|order| order.date >= start && order.date <= end)
            .filter(|order| self.evaluator.matches(definition, order))
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            (a.date, a.time.as_deref(), a.id.as_str()).cmp(&(b.date, b.time.as_deref(), b.id.as_str()))
        });
        hits
    }
}

impl Default for MaintenanceBoard {
    fn default() -> Self {
        Self::new()
    }
}
