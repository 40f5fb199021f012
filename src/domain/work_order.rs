// ==========================================
// 现场服务运营调度系统 - 工单领域模型
// ==========================================
// 口径: 工单(OS)为外部数据源的只读快照，本核心不创建、
//       不修改；单次查询内视为不可变
// ==========================================

use crate::domain::types::Category;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// WorkOrder - 工单快照
// ==========================================
// 字段命名: 内部英文，序列化 rename 保持与后端契约一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    // ===== 标识 =====
    pub id: String, // 工单ID（后端唯一）

    // ===== 排程 =====
    #[serde(default)]
    pub scheduled_at: Option<NaiveDateTime>, // 排程时刻（可缺失）
    pub date: NaiveDate, // 归属日历日（由 scheduled_at 或显式字段导出）
    #[serde(default)]
    pub time: Option<String>, // 展示用时刻（HH:MM，可缺失）

    // ===== 状态与分类 =====
    pub status_code: String, // 状态码 (A/AN/EN/AS/AG/DS/EX/F/RAG/...)
    #[serde(default)]
    pub status_label: String, // 状态展示名（未知码回退为码本身）
    #[serde(rename = "assunto_id")]
    pub subject_id: String, // 主题ID（分类键）
    #[serde(rename = "type")]
    pub category: Category, // 类别（由主题分组导出）

    // ===== 归属 =====
    #[serde(rename = "id_cliente", default)]
    pub customer_id: Option<String>, // 客户ID
    #[serde(rename = "id_filial", default)]
    pub branch_id: Option<String>, // 分支(filial)ID，可缺失

    // ===== 展示属性 =====
    #[serde(default)]
    pub customer_name: Option<String>, // 客户名
    #[serde(rename = "bairro", default)]
    pub neighborhood: Option<String>, // 街区
    #[serde(rename = "cidade", default)]
    pub city: Option<String>, // 城市
    #[serde(rename = "protocolo", default)]
    pub protocol: Option<String>, // 协议号

    // ===== 汇总统计用时间戳 =====
    #[serde(rename = "data_abertura", default)]
    pub opened_at: Option<NaiveDateTime>, // 开单时刻
    #[serde(rename = "data_fechamento", default)]
    pub closed_at: Option<NaiveDateTime>, // 完结时刻
}

impl WorkOrder {
    /// 是否已完结（状态码 F）
    pub fn is_done(&self) -> bool {
        self.status_code == "F"
    }

    /// 是否归属指定分支（工单无分支信息时视为不匹配）
    pub fn belongs_to_branch(&self, branch_id: &str) -> bool {
        self.branch_id.as_deref() == Some(branch_id)
    }
}
