// ==========================================
// 现场服务运营调度系统 - 领域类型定义
// ==========================================
// 口径: 工单状态码/类别取自后端网关字段，序列化格式
//       与既有后端兼容（葡语小写值），不得改动
// ==========================================

use chrono::Weekday as ChronoWeekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单类别 (Category)
// ==========================================
// 序列化格式: 葡语小写（与后端/前端既有契约一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "instalacao")]
    Installation, // 安装
    #[serde(rename = "manutencao")]
    Maintenance, // 维护
    #[serde(rename = "outros")]
    Other, // 其他
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Installation => write!(f, "instalacao"),
            Category::Maintenance => write!(f, "manutencao"),
            Category::Other => write!(f, "outros"),
        }
    }
}

// ==========================================
// 筛选器使用场景 (Filter Scope)
// ==========================================
// 约束: 保存的筛选器只能被同 scope 的界面选中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterScope {
    #[serde(rename = "agenda_week")]
    AgendaWeek, // 周agenda界面
    #[serde(rename = "maintenances")]
    Maintenances, // 维护工单界面
}

impl FilterScope {
    /// 数据库/URL 中使用的稳定标识
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterScope::AgendaWeek => "agenda_week",
            FilterScope::Maintenances => "maintenances",
        }
    }

    /// 从稳定标识解析（未知值返回 None）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "agenda_week" => Some(FilterScope::AgendaWeek),
            "maintenances" => Some(FilterScope::Maintenances),
            _ => None,
        }
    }
}

impl fmt::Display for FilterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 容量利用等级 (Capacity Level)
// ==========================================
// 口径: fill_ratio >= 0.9 → red, >= 0.6 → yellow, 否则 green
//       边界值含在高档（0.9 正好是 red，0.6 正好是 yellow）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityLevel {
    Green,  // 余量充足
    Yellow, // 接近饱和
    Red,    // 饱和/超订
}

/// red 档阈值
pub const LEVEL_RED_THRESHOLD: f64 = 0.9;
/// yellow 档阈值
pub const LEVEL_YELLOW_THRESHOLD: f64 = 0.6;

impl CapacityLevel {
    /// 由利用率推导等级
    pub fn from_ratio(fill_ratio: f64) -> Self {
        if fill_ratio >= LEVEL_RED_THRESHOLD {
            CapacityLevel::Red
        } else if fill_ratio >= LEVEL_YELLOW_THRESHOLD {
            CapacityLevel::Yellow
        } else {
            CapacityLevel::Green
        }
    }
}

impl fmt::Display for CapacityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityLevel::Green => write!(f, "green"),
            CapacityLevel::Yellow => write!(f, "yellow"),
            CapacityLevel::Red => write!(f, "red"),
        }
    }
}

// ==========================================
// 星期 (Weekday)
// ==========================================
// 容量配置按"分支 × 星期"二维展开，键为三字母小写
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// 一周全部枚举值（配置遍历用，顺序固定）
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// 配置键（三字母小写）
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }

    /// 从配置键解析
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mon" => Some(Weekday::Mon),
            "tue" => Some(Weekday::Tue),
            "wed" => Some(Weekday::Wed),
            "thu" => Some(Weekday::Thu),
            "fri" => Some(Weekday::Fri),
            "sat" => Some(Weekday::Sat),
            "sun" => Some(Weekday::Sun),
            _ => None,
        }
    }
}

impl From<ChronoWeekday> for Weekday {
    fn from(value: ChronoWeekday) -> Self {
        match value {
            ChronoWeekday::Mon => Weekday::Mon,
            ChronoWeekday::Tue => Weekday::Tue,
            ChronoWeekday::Wed => Weekday::Wed,
            ChronoWeekday::Thu => Weekday::Thu,
            ChronoWeekday::Fri => Weekday::Fri,
            ChronoWeekday::Sat => Weekday::Sat,
            ChronoWeekday::Sun => Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 维护工单页签 (Maintenance Tab)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceTab {
    Open,      // 打开中（未排程）
    Scheduled, // 已排程/执行中
    Done,      // 已完结
}

// ==========================================
// 工单状态码展示名
// ==========================================
// 状态码来自后端网关，未知码原样透传、展示名回退为码本身
/// 已知状态码 → 展示名（葡语，直接面向运营人员）
pub fn status_label(code: &str) -> &str {
    match code {
        "A" => "Aberta",
        "AN" => "Em análise",
        "EN" => "Encaminhada",
        "AS" => "Assumida",
        "AG" => "Agendada",
        "DS" => "Deslocamento",
        "EX" => "Em execução",
        "F" => "Finalizada",
        "RAG" => "Reagendada",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(CapacityLevel::from_ratio(0.9), CapacityLevel::Red);
        assert_eq!(CapacityLevel::from_ratio(0.6), CapacityLevel::Yellow);
        assert_eq!(CapacityLevel::from_ratio(0.59999), CapacityLevel::Green);
        assert_eq!(CapacityLevel::from_ratio(0.0), CapacityLevel::Green);
        assert_eq!(CapacityLevel::from_ratio(1.5), CapacityLevel::Red);
    }

    #[test]
    fn test_category_wire_format() {
        let json = serde_json::to_string(&Category::Installation).unwrap();
        assert_eq!(json, "\"instalacao\"");
        let back: Category = serde_json::from_str("\"outros\"").unwrap();
        assert_eq!(back, Category::Other);
    }

    #[test]
    fn test_scope_roundtrip() {
        assert_eq!(FilterScope::parse("agenda_week"), Some(FilterScope::AgendaWeek));
        assert_eq!(FilterScope::parse("maintenances"), Some(FilterScope::Maintenances));
        assert_eq!(FilterScope::parse("billing"), None);
    }

    #[test]
    fn test_weekday_keys_roundtrip() {
        for weekday in Weekday::ALL {
            assert_eq!(Weekday::parse(weekday.as_str()), Some(weekday));
        }
        assert_eq!(Weekday::parse("seg"), None);
    }

    #[test]
    fn test_status_label_fallback() {
        assert_eq!(status_label("AG"), "Agendada");
        assert_eq!(status_label("ZZ"), "ZZ");
    }
}
