// ==========================================
// 现场服务运营调度系统 - 容量领域模型
// ==========================================
// 口径: remaining 原始值不截断（负数=超订，必须可见），
//       百分比仅在展示口径截断到 [0, 100]
// ==========================================

use crate::domain::types::{CapacityLevel, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// WeekCapacity - 单分支一周容量上限
// ==========================================
// 管理界面维护，对聚合器只读
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCapacity {
    #[serde(default)]
    pub mon: u32,
    #[serde(default)]
    pub tue: u32,
    #[serde(default)]
    pub wed: u32,
    #[serde(default)]
    pub thu: u32,
    #[serde(default)]
    pub fri: u32,
    #[serde(default)]
    pub sat: u32,
    #[serde(default)]
    pub sun: u32,
}

impl WeekCapacity {
    /// 全周同值（周一至周五），周末为 0
    pub fn weekdays(limit: u32) -> Self {
        Self {
            mon: limit,
            tue: limit,
            wed: limit,
            thu: limit,
            fri: limit,
            sat: 0,
            sun: 0,
        }
    }

    /// 取指定星期的上限
    pub fn limit_for(&self, weekday: Weekday) -> u32 {
        match weekday {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    /// 改写指定星期的上限
    pub fn set_limit(&mut self, weekday: Weekday, limit: u32) {
        match weekday {
            Weekday::Mon => self.mon = limit,
            Weekday::Tue => self.tue = limit,
            Weekday::Wed => self.wed = limit,
            Weekday::Thu => self.thu = limit,
            Weekday::Fri => self.fri = limit,
            Weekday::Sat => self.sat = limit,
            Weekday::Sun => self.sun = limit,
        }
    }
}

// ==========================================
// CapacityLimits - 分支 × 星期 容量上限
// ==========================================
// 约束: 聚合器视其为调用时值快照，绝不原地修改
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapacityLimits {
    /// 分支ID → 一周上限（BTreeMap 保证遍历顺序稳定）
    pub branches: BTreeMap<String, WeekCapacity>,
}

impl CapacityLimits {
    /// 已配置的分支ID（稳定顺序）
    pub fn branch_ids(&self) -> impl Iterator<Item = &str> {
        self.branches.keys().map(|s| s.as_str())
    }

    /// 取指定分支、指定星期的上限；未配置分支按 0 处理
    pub fn limit_for(&self, branch_id: &str, weekday: Weekday) -> u32 {
        self.branches
            .get(branch_id)
            .map(|week| week.limit_for(weekday))
            .unwrap_or(0)
    }

    /// 是否未配置任何分支
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

// ==========================================
// CapacityEntry - 单桶容量账目
// ==========================================
// {limit, count, remaining, fill_ratio, level}
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub limit: u32, // 配置上限
    pub count: u32, // 实际工单数
    pub remaining: i64, // limit - count，负数表示超订，不截断
    pub fill_ratio: f64, // count / limit；limit == 0 时恒为 0
    pub level: CapacityLevel, // 利用等级
}

impl CapacityEntry {
    /// 由上限与计数推导全部派生字段
    pub fn from_counts(limit: u32, count: u32) -> Self {
        let fill_ratio = if limit == 0 {
            0.0
        } else {
            f64::from(count) / f64::from(limit)
        };
        Self {
            limit,
            count,
            remaining: i64::from(limit) - i64::from(count),
            fill_ratio,
            level: CapacityLevel::from_ratio(fill_ratio),
        }
    }

    /// 空桶（limit = count = 0）
    pub fn empty() -> Self {
        Self::from_counts(0, 0)
    }

    /// 展示用剩余名额（负数按 0 展示）
    pub fn remaining_display(&self) -> u32 {
        self.remaining.max(0) as u32
    }

    /// 展示用填充百分比，截断到 [0, 100]
    pub fn fill_percent(&self) -> u8 {
        ((self.fill_ratio * 100.0).round().clamp(0.0, 100.0)) as u8
    }
}

// ==========================================
// DayCapacity - 单日容量账目（分支明细 + 合计）
// ==========================================
// 口径: total 先汇总 count/limit 再算比率，不是分支比率平均
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCapacity {
    /// 分支ID → 该分支当日账目
    pub per_branch: BTreeMap<String, CapacityEntry>,
    /// 跨分支合计
    pub total: CapacityEntry,
}

impl DayCapacity {
    /// 由分支明细汇总出合计账目
    pub fn from_branches(per_branch: BTreeMap<String, CapacityEntry>) -> Self {
        let limit_sum: u32 = per_branch.values().map(|e| e.limit).sum();
        let count_sum: u32 = per_branch.values().map(|e| e.count).sum();
        Self {
            per_branch,
            total: CapacityEntry::from_counts(limit_sum, count_sum),
        }
    }

    /// 零填充账目（当日无工单、或分支未配置时使用）
    pub fn zero_filled(branch_ids: &[String]) -> Self {
        let per_branch = branch_ids
            .iter()
            .map(|id| (id.clone(), CapacityEntry::empty()))
            .collect();
        Self::from_branches(per_branch)
    }

    /// 日级主账目：指定分支时取该分支，否则取合计
    pub fn headline(&self, branch_filter: Option<&str>) -> &CapacityEntry {
        match branch_filter {
            Some(branch_id) => self.per_branch.get(branch_id).unwrap_or(&self.total),
            None => &self.total,
        }
    }
}
