// ==========================================
// 现场服务运营调度系统 - 应用配置领域模型
// ==========================================
// 职责: 配置结构 + 默认值合并口径
// 约束: 外部传入的配置 payload 一律走 merge_defaults
//       规范化，残缺/非法字段回退默认值而不是报错
// ==========================================

use crate::domain::capacity::{CapacityLimits, WeekCapacity};
use crate::domain::types::{Category, FilterScope, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ==========================================
// DefaultFilters - 各场景默认筛选器
// ==========================================
// 值为保存的筛选器ID；指向已删除筛选器时按"无默认"处理
// （解析发生在 API 层，这里只承载配置值）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultFilters {
    #[serde(default)]
    pub agenda: Option<String>,
    #[serde(rename = "manutencoes", default)]
    pub maintenances: Option<String>,
}

impl DefaultFilters {
    /// 按场景取默认筛选器ID
    pub fn for_scope(&self, scope: FilterScope) -> Option<&str> {
        match scope {
            FilterScope::AgendaWeek => self.agenda.as_deref(),
            FilterScope::Maintenances => self.maintenances.as_deref(),
        }
    }
}

// ==========================================
// SubjectGroups - 主题分组（类别推导表）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGroups {
    #[serde(rename = "instalacao")]
    pub installation: Vec<String>,
    #[serde(rename = "manutencao")]
    pub maintenance: Vec<String>,
    #[serde(rename = "outros")]
    pub other: Vec<String>,
}

impl SubjectGroups {
    /// 主题ID → 类别；两组都未命中归入"其他"
    pub fn category_for(&self, subject_id: &str) -> Category {
        if self.installation.iter().any(|id| id == subject_id) {
            Category::Installation
        } else if self.maintenance.iter().any(|id| id == subject_id) {
            Category::Maintenance
        } else {
            Category::Other
        }
    }
}

// ==========================================
// AppSettings - 应用配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub default_filters: DefaultFilters,
    pub installation_subject_ids: Vec<String>,
    pub maintenance_subject_ids: Vec<String>,
    pub subject_groups: SubjectGroups,
    pub agenda_capacity: CapacityLimits,
    #[serde(rename = "filiais")]
    pub branch_names: BTreeMap<String, String>,
}

impl Default for AppSettings {
    /// 出厂默认：两个分支，工作日容量 5/4，周末 0
    fn default() -> Self {
        let mut agenda_capacity = CapacityLimits::default();
        agenda_capacity
            .branches
            .insert("1".to_string(), WeekCapacity::weekdays(5));
        agenda_capacity
            .branches
            .insert("2".to_string(), WeekCapacity::weekdays(4));

        let mut branch_names = BTreeMap::new();
        branch_names.insert("1".to_string(), "Grande Vitória".to_string());
        branch_names.insert("2".to_string(), "João Neiva".to_string());

        Self {
            default_filters: DefaultFilters::default(),
            installation_subject_ids: vec!["1".to_string(), "15".to_string()],
            maintenance_subject_ids: vec!["17".to_string(), "34".to_string(), "31".to_string()],
            subject_groups: SubjectGroups {
                installation: vec!["1".to_string()],
                maintenance: vec!["17".to_string(), "34".to_string(), "31".to_string()],
                other: vec![],
            },
            agenda_capacity,
            branch_names,
        }
    }
}

impl AppSettings {
    /// 将外部 payload 合并到默认配置上
    ///
    /// 规范化规则：
    /// - 未知键丢弃；类型不符的字段整体回退默认
    /// - 容量值取非负整数，非法值跳过（保留原值）
    /// - 只接受默认配置中已存在的分支与星期键
    /// - 分支名去首尾空白，空白名丢弃
    /// - 主题ID列表逐项字符串化
    pub fn merge_defaults(incoming: &Value) -> Self {
        let mut merged = Self::default();
        let Some(obj) = incoming.as_object() else {
            return merged;
        };

        if let Some(filters) = obj.get("default_filters").and_then(Value::as_object) {
            if let Some(value) = filters.get("agenda") {
                merged.default_filters.agenda = value.as_str().map(str::to_string);
            }
            if let Some(value) = filters.get("manutencoes") {
                merged.default_filters.maintenances = value.as_str().map(str::to_string);
            }
        }

        if let Some(groups) = obj.get("subject_groups").and_then(Value::as_object) {
            if let Some(ids) = groups.get("instalacao").and_then(Value::as_array) {
                merged.subject_groups.installation = stringify_ids(ids);
            }
            if let Some(ids) = groups.get("manutencao").and_then(Value::as_array) {
                merged.subject_groups.maintenance = stringify_ids(ids);
            }
            if let Some(ids) = groups.get("outros").and_then(Value::as_array) {
                merged.subject_groups.other = stringify_ids(ids);
            }
        }

        if let Some(ids) = obj.get("installation_subject_ids").and_then(Value::as_array) {
            merged.installation_subject_ids = stringify_ids(ids);
        }
        if let Some(ids) = obj.get("maintenance_subject_ids").and_then(Value::as_array) {
            merged.maintenance_subject_ids = stringify_ids(ids);
        }

        if let Some(names) = obj.get("filiais").and_then(Value::as_object) {
            let known: Vec<String> = merged.branch_names.keys().cloned().collect();
            for branch_id in known {
                if let Some(name) = names.get(&branch_id).and_then(Value::as_str) {
                    let trimmed = name.trim();
                    if !trimmed.is_empty() {
                        merged.branch_names.insert(branch_id, trimmed.to_string());
                    }
                }
            }
        }

        if let Some(capacity) = obj.get("agenda_capacity").and_then(Value::as_object) {
            let known: Vec<String> = merged.agenda_capacity.branches.keys().cloned().collect();
            for branch_id in known {
                let Some(week) = capacity.get(&branch_id).and_then(Value::as_object) else {
                    continue;
                };
                for weekday in Weekday::ALL {
                    let Some(value) = week.get(weekday.as_str()) else {
                        continue;
                    };
                    if let Some(limit) = coerce_capacity(value) {
                        if let Some(entry) = merged.agenda_capacity.branches.get_mut(&branch_id) {
                            entry.set_limit(weekday, limit);
                        }
                    }
                }
            }
        }

        merged
    }
}

/// 主题ID逐项字符串化（数字/字符串混合的历史 payload 都出现过）
fn stringify_ids(ids: &[Value]) -> Vec<String> {
    ids.iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// 容量值规范化：整数取非负，其他类型视为非法
fn coerce_capacity(value: &Value) -> Option<u32> {
    let raw = value.as_i64()?;
    Some(raw.max(0) as u32)
}
