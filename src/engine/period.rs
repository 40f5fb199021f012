// ==========================================
// 现场服务运营调度系统 - 周期解析引擎
// ==========================================
// 职责: 把命名周期/显式起止解析为具体日历日闭区间
// 口径: 全部算术在日历日粒度（NaiveDate），不触碰时刻与
//       时区，跨时区/夏令时不产生 off-by-one
// ==========================================

use crate::domain::schedule::SchedulePeriod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// agenda 查询窗口上限（与后端接口口径一致：1..=31 天）
pub const MAX_AGENDA_DAYS: u32 = 31;

/// 日期线上格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// 周期解析错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("无效的起始日期: {raw}")]
    InvalidStartDate { raw: String },
}

// ==========================================
// NamedPeriod - 命名周期
// ==========================================
// 界面上的快捷选项；序列化值即界面参数值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedPeriod {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "14d")]
    Fortnight,
    #[serde(rename = "30d")]
    Month,
}

impl NamedPeriod {
    /// 命名周期对应的天数（today = 1）
    pub fn days(&self) -> u32 {
        match self {
            NamedPeriod::Today => 1,
            NamedPeriod::Week => 7,
            NamedPeriod::Fortnight => 14,
            NamedPeriod::Month => 30,
        }
    }
}

// ==========================================
// PeriodSelection - 周期选择
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeriodSelection {
    /// 命名快捷周期
    Named(NamedPeriod),
    /// 显式起止（start + 天数）
    Explicit { start: NaiveDate, days: u32 },
}

// ==========================================
// PeriodResolver - 周期解析引擎
// ==========================================
// 纯函数引擎："现在"由调用方注入，结果确定
pub struct PeriodResolver;

impl PeriodResolver {
    pub fn new() -> Self {
        Self
    }

    /// 解析周期选择
    ///
    /// # 参数
    /// - `selection`: 命名周期或显式起止
    /// - `current_start`: 界面当前已选起始日（7d/14d/30d 保持不变）
    /// - `today`: 调用方注入的"今天"
    ///
    /// # 口径
    /// - "today" → {today, 1}
    /// - "7d"/"14d"/"30d" → {current_start 不变, N}
    /// - 显式 → 原样通过，days 截到 [1, 31]
    pub fn resolve(
        &self,
        selection: PeriodSelection,
        current_start: NaiveDate,
        today: NaiveDate,
    ) -> SchedulePeriod {
        match selection {
            PeriodSelection::Named(NamedPeriod::Today) => SchedulePeriod::new(today, 1),
            PeriodSelection::Named(named) => SchedulePeriod::new(current_start, named.days()),
            PeriodSelection::Explicit { start, days } => {
                SchedulePeriod::new(start, days.clamp(1, MAX_AGENDA_DAYS))
            }
        }
    }

    /// 解析线上起始日期参数；缺省回退，非法报错（绝不静默替换）
    pub fn parse_start(
        &self,
        raw: Option<&str>,
        default: NaiveDate,
    ) -> Result<NaiveDate, PeriodError> {
        match raw {
            None => Ok(default),
            Some(raw) if raw.trim().is_empty() => Ok(default),
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map_err(|_| PeriodError::InvalidStartDate {
                    raw: raw.to_string(),
                }),
        }
    }

    /// 维护界面的日期窗口：默认 today ± 7 天，起止颠倒时交换
    pub fn resolve_maintenance_window(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> (NaiveDate, NaiveDate) {
        let start = from.unwrap_or(today - chrono::Duration::days(7));
        let end = to.unwrap_or(today + chrono::Duration::days(7));
        if start <= end {
            (start, end)
        } else {
            (end, start)
        }
    }
}

impl Default for PeriodResolver {
    fn default() -> Self {
        Self::new()
    }
}
