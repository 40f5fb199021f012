// ==========================================
// 现场服务运营调度系统 - 周agenda领域模型
// ==========================================
// 口径: ScheduleView 覆盖解析后周期内的每一个日历日，
//       无工单的日子以零填充容量出现，绝不缺桶
// ==========================================

use crate::domain::capacity::DayCapacity;
use crate::domain::work_order::WorkOrder;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// SchedulePeriod - 解析后的查询周期
// ==========================================
// 日历日粒度闭区间 [start, start + days - 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub start: NaiveDate, // 起始日
    pub days: u32,        // 天数（>= 1）
}

impl SchedulePeriod {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self {
            start,
            days: days.max(1),
        }
    }

    /// 闭区间末日
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(i64::from(self.days) - 1)
    }

    /// 日期是否落在周期内
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    /// 遍历周期内全部日历日（桶键集合）
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..i64::from(self.days)).map(move |offset| self.start + Duration::days(offset))
    }
}

// ==========================================
// ScheduleDay - 单日桶
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub date: NaiveDate, // 桶键
    #[serde(rename = "items")]
    pub orders: Vec<WorkOrder>, // 当日全部命中工单，线上字段名 items
    pub capacity: DayCapacity, // 当日容量账目
}

// ==========================================
// ScheduleView - 周agenda视图
// ==========================================
// 展示层消费的最终产物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub period: SchedulePeriod, // 周期回显
    /// 查询指定的分支；影响日级主账目取向（见 headline）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_filter: Option<String>,
    pub days: Vec<ScheduleDay>, // 按日期升序，每日恰好一桶
}

impl ScheduleView {
    /// 周期内全部命中工单总数
    pub fn total_orders(&self) -> usize {
        self.days.iter().map(|day| day.orders.len()).sum()
    }

    /// 日级主账目：指定了分支按该分支，否则按合计
    pub fn headline<'a>(&self, day: &'a ScheduleDay) -> &'a crate::domain::capacity::CapacityEntry {
        day.capacity.headline(self.branch_filter.as_deref())
    }
}

// ==========================================
// DashboardSummary - 驾驶舱头部指标
// ==========================================
// 线上键名为葡语（与既有前端契约一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodEcho {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// 安装类指标
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationSummary {
    #[serde(rename = "agendadas_hoje")]
    pub scheduled_today: u32, // 今日排程（按排程日）
    #[serde(rename = "finalizadas_hoje")]
    pub finalized_today: u32, // 今日完结（按完结时刻）
    #[serde(rename = "total_periodo")]
    pub total_period: u32, // 周期内总量（按排程日）
}

/// 维护类指标
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceSummary {
    #[serde(rename = "abertas_total")]
    pub open_total: u32, // 当前未完结总量（周期无关）
    #[serde(rename = "abertas_hoje")]
    pub opened_today: u32, // 今日开单（按开单时刻）
    #[serde(rename = "finalizadas_hoje")]
    pub finalized_today: u32, // 今日完结（按完结时刻）
    #[serde(rename = "total_periodo")]
    pub total_period: u32, // 周期内总量（按排程日）
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub period: PeriodEcho,
    #[serde(rename = "instalacoes")]
    pub installations: InstallationSummary,
    #[serde(rename = "manutencoes")]
    pub maintenances: MaintenanceSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_inclusive_end() {
        let period = SchedulePeriod::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 7);
        assert_eq!(period.end(), NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
        assert_eq!(period.iter_days().count(), 7);
        assert!(period.contains(NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()));
    }

    #[test]
    fn test_period_days_floor_is_one() {
        let period = SchedulePeriod::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 0);
        assert_eq!(period.days, 1);
        assert_eq!(period.end(), period.start);
    }

    #[test]
    fn test_period_crosses_month_boundary() {
        // 日历日算术，跨月不漂移
        let period = SchedulePeriod::new(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(), 3);
        let days: Vec<NaiveDate> = period.iter_days().collect();
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()); // 闰年
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_summary_wire_keys() {
        let summary = DashboardSummary {
            period: PeriodEcho {
                start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
            },
            installations: InstallationSummary::default(),
            maintenances: MaintenanceSummary::default(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"instalacoes\""));
        assert!(json.contains("\"agendadas_hoje\""));
        assert!(json.contains("\"abertas_total\""));
    }
}
