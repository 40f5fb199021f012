// ==========================================
// 现场服务运营调度系统 - 驾驶舱汇总引擎
// ==========================================
// 职责: 周期内安装/维护头部指标计数
// 口径: 各指标使用各自的时间字段——
//       "agendadas"/"total_periodo" 按排程日(date)，
//       "finalizadas" 按完结时刻(closed_at)，
//       "abertas_hoje" 按开单时刻(opened_at)，
//       "abertas_total" 为未完结存量，与周期无关
// ==========================================

use crate::domain::schedule::{
    DashboardSummary, InstallationSummary, MaintenanceSummary, PeriodEcho, SchedulePeriod,
};
use crate::domain::types::Category;
use crate::domain::work_order::WorkOrder;
use chrono::NaiveDate;
use tracing::instrument;

// ==========================================
// SummaryEngine - 驾驶舱汇总引擎
// ==========================================
pub struct SummaryEngine;

impl SummaryEngine {
    pub fn new() -> Self {
        Self
    }

    /// 计算头部指标
    ///
    /// # 参数
    /// - `orders`: 候选工单（建议覆盖周期 + 当日完结/开单的记录）
    /// - `period`: 解析后的周期
    /// - `today`: 调用方注入的"今天"
    #[instrument(skip_all, fields(order_count = orders.len(), today = %today))]
    pub fn build(
        &self,
        orders: &[WorkOrder],
        period: SchedulePeriod,
        today: NaiveDate,
    ) -> DashboardSummary {
        let mut installations = InstallationSummary::default();
        let mut maintenances = MaintenanceSummary::default();

        for order in orders {
            let closed_today = order.closed_at.map(|at| at.date()) == Some(today);
            let opened_today = order.opened_at.map(|at| at.date()) == Some(today);

            match order.category {
                Category::Installation => {
                    if order.date == today && !order.is_done() {
                        installations.scheduled_today += 1;
                    }
                    if closed_today {
                        installations.finalized_today += 1;
                    }
                    if period.contains(order.date) {
                        installations.total_period += 1;
                    }
                }
                Category::Maintenance => {
                    if !order.is_done() {
                        maintenances.open_total += 1;
                    }
                    if opened_today {
                        maintenances.opened_today += 1;
                    }
                    if closed_today {
                        maintenances.finalized_today += 1;
                    }
                    if period.contains(order.date) {
                        maintenances.total_period += 1;
                    }
                }
                Category::Other => {}
            }
        }

        DashboardSummary {
            period: PeriodEcho {
                start: period.start,
                end: period.end(),
            },
            installations,
            maintenances,
        }
    }
}

impl Default for SummaryEngine {
    fn default() -> Self {
        Self::new()
    }
}
