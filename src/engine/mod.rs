// ==========================================
// 现场服务运营调度系统 - 引擎层
// ==========================================
// 职责: 实现纯业务规则引擎,不拼 SQL,不做 IO
// 红线: "现在"一律由调用方注入,引擎内不取系统时钟
// ==========================================

pub mod aggregator;
pub mod criteria;
pub mod maintenance;
pub mod period;
pub mod summary;

// 重导出核心引擎
pub use aggregator::ScheduleAggregator;
pub use criteria::CriteriaEvaluator;
pub use maintenance::MaintenanceBoard;
pub use period::{NamedPeriod, PeriodError, PeriodResolver, PeriodSelection, MAX_AGENDA_DAYS};
pub use summary::SummaryEngine;
