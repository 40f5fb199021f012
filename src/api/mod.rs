// ==========================================
// 现场服务运营调度系统 - API 层
// ==========================================
// 职责: 面向展示层的业务接口（筛选器/配置/agenda查询）
// ==========================================

pub mod error;
pub mod filter_api;
pub mod schedule_controller;
pub mod settings_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use filter_api::FilterApi;
pub use schedule_controller::{
    QueryOutcome, QueryParams, QueryState, ScheduleQueryController,
};
pub use settings_api::SettingsApi;
