// ==========================================
// 现场服务运营调度系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、派生口径
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod capacity;
pub mod filter;
pub mod schedule;
pub mod settings;
pub mod types;
pub mod work_order;

// 重导出核心类型
pub use capacity::{CapacityEntry, CapacityLimits, DayCapacity, WeekCapacity};
pub use filter::{FilterDefinition, SavedFilter};
pub use schedule::{
    DashboardSummary, InstallationSummary, MaintenanceSummary, PeriodEcho, ScheduleDay,
    SchedulePeriod, ScheduleView,
};
pub use settings::{AppSettings, DefaultFilters, SubjectGroups};
pub use types::{status_label, CapacityLevel, Category, FilterScope, MaintenanceTab, Weekday};
pub use work_order::WorkOrder;
