// ==========================================
// 现场服务运营调度系统 - 外部数据源层
// ==========================================
// 职责: 后端网关契约 + 载荷规范化 + 查询缓存
// 红线: 引擎层只消费规范化后的 WorkOrder，字段别名
//       不得越过这一层
// ==========================================

pub mod cache;
pub mod memory;
pub mod normalize;
pub mod source;

// 重导出核心类型
pub use cache::{QueryCache, DEFAULT_TTL};
pub use memory::StaticWorkOrderSource;
pub use normalize::OrderNormalizer;
pub use source::{RawAgendaDay, RawScheduleResponse, TransportError, WorkOrderQuery, WorkOrderSource};
