// ==========================================
// 现场服务运营调度系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 工单周agenda与容量决策核心
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 数据源层 - 外部工单网关
pub mod datasource;

// 配置层 - 应用配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CapacityLevel, Category, FilterScope, MaintenanceTab, Weekday};

// 领域实体
pub use domain::{
    AppSettings, CapacityEntry, CapacityLimits, DashboardSummary, DayCapacity, FilterDefinition,
    SavedFilter, ScheduleDay, SchedulePeriod, ScheduleView, WeekCapacity, WorkOrder,
};

// 引擎
pub use engine::{
    CriteriaEvaluator, MaintenanceBoard, NamedPeriod, PeriodResolver, PeriodSelection,
    ScheduleAggregator, SummaryEngine,
};

// 数据源
pub use datasource::{
    OrderNormalizer, QueryCache, RawScheduleResponse, StaticWorkOrderSource, TransportError,
    WorkOrderQuery, WorkOrderSource,
};

// API
pub use api::{
    ApiError, ApiResult, FilterApi, QueryOutcome, QueryParams, QueryState,
    ScheduleQueryController, SettingsApi,
};

// 仓储
pub use repository::SavedFilterRepository;

// 配置
pub use config::SettingsStore;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "现场服务运营调度系统";
