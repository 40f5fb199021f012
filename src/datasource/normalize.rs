// ==========================================
// 现场服务运营调度系统 - 工单载荷规范化
// ==========================================
// 职责: 后端原始载荷 → WorkOrder 快照
// 红线: 葡语/英语字段别名只在这一处处理，聚合/引擎层
//       一律只见规范化后的 WorkOrder
// ==========================================

use crate::domain::settings::SubjectGroups;
use crate::domain::types::{status_label, Category};
use crate::domain::work_order::WorkOrder;
use crate::datasource::source::RawScheduleResponse;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::warn;

// ==========================================
// OrderNormalizer - 工单规范化器
// ==========================================
// 持有主题分组快照（类别推导表），随配置快照一起构造
pub struct OrderNormalizer {
    subject_groups: SubjectGroups,
}

impl OrderNormalizer {
    pub fn new(subject_groups: SubjectGroups) -> Self {
        Self { subject_groups }
    }

    /// 规范化一条原始工单记录
    ///
    /// 返回 None 的情况：缺 id、或推导不出归属日历日。
    /// 这类记录属于数据质量问题，跳过并告警，不让单条脏数据
    /// 拖垮整批查询。
    pub fn normalize_order(&self, raw: &Value) -> Option<WorkOrder> {
        let id = string_field(raw, &["id", "external_id"])?;

        let scheduled_at = datetime_field(raw, &["data_agendada", "data_agenda", "scheduled_at"]);
        let date = date_field(raw, &["data_agendada", "data_agenda", "date"])
            .or_else(|| scheduled_at.map(|at| at.date()));
        let Some(date) = date else {
            warn!(id = %id, "工单缺归属日，跳过");
            return None;
        };

        let time = string_field(raw, &["hora_agendada", "time"])
            .or_else(|| scheduled_at.map(|at| at.format("%H:%M").to_string()));

        let status_code = string_field(raw, &["status", "status_code"]).unwrap_or_default();
        let subject_id = string_field(raw, &["id_assunto", "assunto_id", "subject_id"])
            .unwrap_or_default();

        // 类别: 显式字段优先，其次按主题分组推导
        let category = string_field(raw, &["tipo", "type"])
            .and_then(|raw_type| parse_category(&raw_type))
            .unwrap_or_else(|| self.subject_groups.category_for(&subject_id));

        Some(WorkOrder {
            status_label: status_label(&status_code).to_string(),
            id,
            scheduled_at,
            date,
            time,
            status_code,
            subject_id,
            category,
            customer_id: string_field(raw, &["id_cliente", "customer_id"]),
            branch_id: string_field(raw, &["id_filial", "branch_id"]),
            customer_name: string_field(raw, &["cliente", "customer_name"]),
            neighborhood: string_field(raw, &["bairro", "neighborhood"]),
            city: string_field(raw, &["cidade", "city"]),
            protocol: string_field(raw, &["protocolo", "protocol"]),
            opened_at: datetime_field(raw, &["data_abertura", "opened_at"]),
            closed_at: datetime_field(raw, &["data_fechamento", "closed_at"]),
        })
    }

    /// 规范化整个响应包络
    ///
    /// 预分桶形态：拍平 items，无归属日的条目回退到桶日期。
    /// 容量账目不采信后端预聚合值，由本地聚合引擎统一重算。
    pub fn normalize_response(&self, response: &RawScheduleResponse) -> Vec<WorkOrder> {
        match response {
            RawScheduleResponse::Orders(items) => items
                .iter()
                .filter_map(|raw| self.normalize_order(raw))
                .collect(),
            RawScheduleResponse::Bucketed(days) => days
                .iter()
                .flat_map(|day| {
                    let bucket_date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").ok();
                    day.items.iter().filter_map(move |raw| {
                        self.normalize_order(raw).or_else(|| {
                            // 缺归属日但桶日期可用 → 注入桶日期后重试
                            let bucket_date = bucket_date?;
                            let mut patched = raw.clone();
                            patched.as_object_mut()?.insert(
                                "date".to_string(),
                                Value::String(bucket_date.format("%Y-%m-%d").to_string()),
                            );
                            self.normalize_order(&patched)
                        })
                    })
                })
                .collect(),
        }
    }
}

// ==========================================
// 字段别名读取辅助
// ==========================================

/// 依别名顺序取第一个非空字符串；数字字段字符串化
fn string_field(raw: &Value, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        match raw.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// 依别名顺序解析第一个可用时间戳
fn datetime_field(raw: &Value, aliases: &[&str]) -> Option<NaiveDateTime> {
    string_field(raw, aliases).and_then(|s| parse_datetime(&s))
}

/// 依别名顺序解析第一个可用日历日（时间戳字段取日部分）
fn date_field(raw: &Value, aliases: &[&str]) -> Option<NaiveDate> {
    let s = string_field(raw, aliases)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(&s).map(|at| at.date()))
}

/// 后端出现过空格分隔与 ISO 两种时间戳写法，另兼容纯日期
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_category(raw: &str) -> Option<Category> {
    match raw.to_lowercase().as_str() {
        "instalacao" => Some(Category::Installation),
        "manutencao" => Some(Category::Maintenance),
        "outros" => Some(Category::Other),
        _ => None,
    }
}
