// ==========================================
// 现场服务运营调度系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误分类，转换下层错误为用户可读消息
// 口径: ValidationError 在输入点就地拦截、无副作用；
//       NotFound/Transport 上浮给控制器呈现；
//       StaleResultDiscarded 是内部取消信号，不得呈现给用户
// ==========================================

use crate::datasource::source::TransportError;
use crate::engine::period::PeriodError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 输入校验 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ===== 资源 =====
    #[error("资源未找到: {0}")]
    NotFound(String),

    // ===== 外部传输 =====
    #[error(transparent)]
    Transport(#[from] TransportError),

    // ===== 数据访问 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 内部信号 =====
    /// 过期结果已丢弃（取消语义的产物，不是故障）
    #[error("过期结果已丢弃")]
    StaleResultDiscarded,

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} id={id}"))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<PeriodError> for ApiError {
    fn from(err: PeriodError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidInput(format!("JSON 解析失败: {err}"))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
