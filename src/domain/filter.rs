// ==========================================
// 现场服务运营调度系统 - 筛选器领域模型
// ==========================================
// 口径: FilterDefinition 是结构化唯一事实——本地求值与
//       后端查询翻译共用同一对象，禁止旁路的临时过滤逻辑
// 契约: 线上 JSON 键名 category / status_codes / assunto_ids
//       为既有后端兼容契约，不得改名
// ==========================================

use crate::domain::types::{Category, FilterScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// FilterDefinition - 筛选条件
// ==========================================
// 缺省维度 = 开放约束（不限制）；空对象 {} 匹配一切工单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// 类别维度（精确匹配）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// 状态码维度（集合内任一命中即可）
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub status_codes: BTreeSet<String>,

    /// 主题ID维度（集合内任一命中即可）
    #[serde(rename = "assunto_ids", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub subject_ids: BTreeSet<String>,
}

impl FilterDefinition {
    /// 是否为空约束（空约束匹配一切）
    pub fn is_unconstrained(&self) -> bool {
        self.category.is_none() && self.status_codes.is_empty() && self.subject_ids.is_empty()
    }

    /// 规范化 JSON 形式
    ///
    /// 用途：
    /// - 透传给后端查询参数（filter_json）
    /// - 查询缓存键（BTreeSet 保证集合输出有序，形式稳定）
    pub fn to_canonical_json(&self) -> String {
        // 结构体只含可序列化标量/集合，序列化不会失败
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// 从线上 JSON 解析
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

// ==========================================
// SavedFilter - 保存的筛选器
// ==========================================
// 约束: 更新为整体替换（name/scope/definition 一次换掉），
//       id 与 created_at 跨更新保持不变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: String, // 存储层分配（UUID v4）
    pub name: String, // 运营人员取名，非空
    pub scope: FilterScope, // 使用场景
    #[serde(rename = "definition_json")]
    pub definition: FilterDefinition, // 线上字段名 definition_json（兼容契约）
    pub created_at: DateTime<Utc>, // 创建时刻（存储层分配）
}
