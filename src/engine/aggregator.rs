// ==========================================
// 现场服务运营调度系统 - 周agenda聚合引擎
// ==========================================
// 职责: 工单按日历日 × 分支分桶，对照容量上限产出
//       利用账目（DayCapacity）与周agenda视图
// 口径: 桶键集合 = 周期内每一个日历日，与是否有工单无关；
//       周期外工单防御性丢弃（调用方本应已约束查询范围）
// ==========================================

use crate::domain::capacity::{CapacityEntry, CapacityLimits, DayCapacity};
use crate::domain::schedule::{ScheduleDay, SchedulePeriod, ScheduleView};
use crate::domain::types::Weekday;
use crate::domain::work_order::WorkOrder;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::{instrument, warn};

// ==========================================
// ScheduleAggregator - 周agenda聚合引擎
// ==========================================
// 无状态引擎；容量上限是调用时值快照，绝不原地修改
pub struct ScheduleAggregator;

impl ScheduleAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 聚合工单为周agenda视图
    ///
    /// # 参数
    /// - `orders`: 候选工单（通常已按周期/筛选约束取回）
    /// - `period`: 解析后的周期
    /// - `limits`: 容量上限快照
    /// - `branch_filter`: 查询指定的分支；只影响日级主账目取向，
    ///   不从桶里剔除工单（工单归属明细仍完整可见）
    ///
    /// # 保证
    /// - 返回恰好 period.days 个日桶，按日期升序
    /// - 周期内每个输入工单在其归属日桶中恰好出现一次
    /// - 无工单的日子携带零填充容量账目
    #[instrument(skip_all, fields(
        order_count = orders.len(),
        start = %period.start,
        days = period.days
    ))]
    pub fn aggregate(
        &self,
        orders: &[WorkOrder],
        period: SchedulePeriod,
        limits: &CapacityLimits,
        branch_filter: Option<&str>,
    ) -> ScheduleView {
        // 1. 按归属日分组，周期外防御性丢弃
        let mut by_day: BTreeMap<NaiveDate, Vec<WorkOrder>> = BTreeMap::new();
        let mut dropped = 0usize;
        for order in orders {
            if !period.contains(order.date) {
                dropped += 1;
                continue;
            }
            by_day.entry(order.date).or_default().push(order.clone());
        }
        if dropped > 0 {
            warn!(dropped, "丢弃周期外工单");
        }

        // 2. 周期内逐日建桶
        let days = period
            .iter_days()
            .map(|date| {
                let mut day_orders = by_day.remove(&date).unwrap_or_default();
                // 日内按时刻排序（缺时刻的排前面），展示友好，非契约
                day_orders.sort_by(|a, b| {
                    (a.time.as_deref(), a.id.as_str()).cmp(&(b.time.as_deref(), b.id.as_str()))
                });
                let capacity = self.day_capacity(date, &day_orders, limits);
                ScheduleDay {
                    date,
                    orders: day_orders,
                    capacity,
                }
            })
            .collect();

        ScheduleView {
            period,
            branch_filter: branch_filter.map(str::to_string),
            days,
        }
    }

    /// 单日容量账目：逐分支计数 + 合计
    ///
    /// 未配置任何分支时合计为 0/0 → green（无数据即无约束）。
    /// 无分支归属的工单出现在桶里，但不计入任何分支账目。
    fn day_capacity(
        &self,
        date: NaiveDate,
        day_orders: &[WorkOrder],
        limits: &CapacityLimits,
    ) -> DayCapacity {
        let weekday = Weekday::from(date.weekday());
        let per_branch: BTreeMap<String, CapacityEntry> = limits
            .branch_ids()
            .map(|branch_id| {
                let limit = limits.limit_for(branch_id, weekday);
                let count = day_orders
                    .iter()
                    .filter(|order| order.belongs_to_branch(branch_id))
                    .count() as u32;
                (branch_id.to_string(), CapacityEntry::from_counts(limit, count))
            })
            .collect();
        DayCapacity::from_branches(per_branch)
    }
}

impl Default for ScheduleAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capacity::WeekCapacity;
    use crate::domain::types::{CapacityLevel, Category};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 创建测试用工单
    fn create_test_order(id: &str, on: NaiveDate, branch_id: Option<&str>) -> WorkOrder {
        WorkOrder {
            id: id.to_string(),
            scheduled_at: None,
            date: on,
            time: None,
            status_code: "AG".to_string(),
            status_label: "Agendada".to_string(),
            subject_id: "17".to_string(),
            category: Category::Maintenance,
            customer_id: None,
            branch_id: branch_id.map(str::to_string),
            customer_name: None,
            neighborhood: None,
            city: None,
            protocol: None,
            opened_at: None,
            closed_at: None,
        }
    }

    /// 单分支容量配置
    fn single_branch_limits(branch_id: &str, weekday_limit: u32) -> CapacityLimits {
        let mut limits = CapacityLimits::default();
        limits
            .branches
            .insert(branch_id.to_string(), WeekCapacity::weekdays(weekday_limit));
        limits
    }

    #[test]
    fn test_bucket_count_equals_period_days() {
        let aggregator = ScheduleAggregator::new();
        let period = SchedulePeriod::new(date(2024, 3, 4), 7);
        // 完全无工单也要出满 7 桶
        let view = aggregator.aggregate(&[], period, &single_branch_limits("1", 5), None);
        assert_eq!(view.days.len(), 7);
        for (offset, day) in view.days.iter().enumerate() {
            assert_eq!(day.date, date(2024, 3, 4 + offset as u32));
            assert!(day.orders.is_empty());
            assert_eq!(day.capacity.total.count, 0);
        }
    }

    #[test]
    fn test_out_of_period_orders_dropped() {
        let aggregator = ScheduleAggregator::new();
        let period = SchedulePeriod::new(date(2024, 3, 4), 2);
        let orders = vec![
            create_test_order("in", date(2024, 3, 5), Some("1")),
            create_test_order("before", date(2024, 3, 3), Some("1")),
            create_test_order("after", date(2024, 3, 6), Some("1")),
        ];
        let view = aggregator.aggregate(&orders, period, &single_branch_limits("1", 5), None);
        assert_eq!(view.total_orders(), 1);
        assert_eq!(view.days[1].orders[0].id, "in");
    }

    #[test]
    fn test_monday_yellow_band_scenario() {
        // 2024-03-04 是周一；分支1 周一上限 10，当日 8 单
        let aggregator = ScheduleAggregator::new();
        let period = SchedulePeriod::new(date(2024, 3, 4), 7);
        let orders: Vec<WorkOrder> = (0..8)
            .map(|i| create_test_order(&format!("os-{i}"), date(2024, 3, 4), Some("1")))
            .collect();
        let view = aggregator.aggregate(&orders, period, &single_branch_limits("1", 10), None);

        let monday = &view.days[0];
        let entry = monday.capacity.per_branch.get("1").unwrap();
        assert_eq!(entry.limit, 10);
        assert_eq!(entry.count, 8);
        assert_eq!(entry.remaining, 2);
        assert!((entry.fill_ratio - 0.8).abs() < f64::EPSILON);
        assert_eq!(entry.level, CapacityLevel::Yellow);
    }

    #[test]
    fn test_zero_branches_total_green() {
        let aggregator = ScheduleAggregator::new();
        let period = SchedulePeriod::new(date(2024, 3, 4), 1);
        let orders = vec![create_test_order("1", date(2024, 3, 4), None)];
        let view = aggregator.aggregate(&orders, period, &CapacityLimits::default(), None);
        let day = &view.days[0];
        // 工单仍在桶里，但无分支可记账
        assert_eq!(day.orders.len(), 1);
        assert_eq!(day.capacity.total.level, CapacityLevel::Green);
        assert_eq!(day.capacity.total.limit, 0);
    }

    #[test]
    fn test_branchless_orders_visible_but_uncounted() {
        let aggregator = ScheduleAggregator::new();
        let period = SchedulePeriod::new(date(2024, 3, 4), 1);
        let orders = vec![
            create_test_order("com-filial", date(2024, 3, 4), Some("1")),
            create_test_order("sem-filial", date(2024, 3, 4), None),
        ];
        let view = aggregator.aggregate(&orders, period, &single_branch_limits("1", 5), None);
        let day = &view.days[0];
        assert_eq!(day.orders.len(), 2);
        assert_eq!(day.capacity.per_branch.get("1").unwrap().count, 1);
        assert_eq!(day.capacity.total.count, 1);
    }

    #[test]
    fn test_headline_follows_branch_filter() {
        let aggregator = ScheduleAggregator::new();
        let period = SchedulePeriod::new(date(2024, 3, 4), 1);
        let mut limits = single_branch_limits("1", 4);
        limits
            .branches
            .insert("2".to_string(), WeekCapacity::weekdays(10));
        let orders: Vec<WorkOrder> = (0..4)
            .map(|i| create_test_order(&format!("os-{i}"), date(2024, 3, 4), Some("1")))
            .collect();

        let filtered = aggregator.aggregate(&orders, period, &limits, Some("1"));
        let day = &filtered.days[0];
        // 分支1 满载 → 日级主账目 red
        assert_eq!(filtered.headline(day).level, CapacityLevel::Red);

        let unfiltered = aggregator.aggregate(&orders, period, &limits, None);
        let day = &unfiltered.days[0];
        // 合计 4/14 → green
        assert_eq!(unfiltered.headline(day).level, CapacityLevel::Green);
    }

    #[test]
    fn test_orders_sorted_by_time_within_day() {
        let aggregator = ScheduleAggregator::new();
        let period = SchedulePeriod::new(date(2024, 3, 4), 1);
        let mut late = create_test_order("late", date(2024, 3, 4), Some("1"));
        late.time = Some("14:00".to_string());
        let mut early = create_test_order("early", date(2024, 3, 4), Some("1"));
        early.time = Some("08:00".to_string());
        let view = aggregator.aggregate(
            &[late, early],
            period,
            &single_branch_limits("1", 5),
            None,
        );
        let ids: Vec<&str> = view.days[0].orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }
}
