// ==========================================
// 校务运营管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为业务错误
// 外层接口 (HTTP / 桌面命令) 只依赖 code() 返回的稳定错误码
// ==========================================

use crate::engine::ExpansionError;
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    /// 前置条件不满足 (消息已本地化)
    #[error("前置条件不满足: {0}")]
    PreconditionUnmet(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无权访问: {0}")]
    AccessDenied(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 外部协作方错误
    // ==========================================
    #[error("周报文本生成失败: {0}")]
    NarratorError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::PreconditionUnmet(_) => "PRECONDITION_UNMET",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::AccessDenied(_) => "ACCESS_DENIED",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::NarratorError(_) => "NARRATOR_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "UNKNOWN_ERROR",
        }
    }

    pub fn access_denied(entity: &str, id: &str) -> Self {
        let subject = format!("{}(id={})", entity, id);
        ApiError::AccessDenied(t_with_args("common.access_denied", &[("entity", &subject)]))
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(t_with_args("common.not_found", &[("entity", entity), ("id", id)]))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从课表展开前置条件错误转换 (消息本地化)
// ==========================================
impl From<ExpansionError> for ApiError {
    fn from(err: ExpansionError) -> Self {
        match err {
            ExpansionError::MissingStartDate => {
                ApiError::PreconditionUnmet(t("lesson.missing_start_date"))
            }
            ExpansionError::MissingSchedule => {
                ApiError::PreconditionUnmet(t("lesson.missing_schedule"))
            }
            ExpansionError::HorizonTooFar { max_days } => ApiError::InvalidInput(t_with_args(
                "lesson.horizon_too_far",
                &[("max", &max_days.to_string())],
            )),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
