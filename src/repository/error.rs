// ==========================================
// 校务运营管理系统 - 仓储层错误类型
// ==========================================
// 约束类失败按 SQLite 扩展错误码分类，其余归为 SQL 执行失败
// ==========================================

use thiserror::Error;

/// 仓储层错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== SQLite =====
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("连接锁不可用: {0}")]
    LockError(String),

    #[error("事务执行失败: {0}")]
    DatabaseTransactionError(String),

    #[error("SQL 执行失败: {0}")]
    DatabaseQueryError(String),

    #[error("重复记录: {0}")]
    UniqueConstraintViolation(String),

    #[error("引用的记录不存在: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据 =====
    #[error("校验未通过: {0}")]
    ValidationError(String),

    #[error("字段 {field} 取值无效: {message}")]
    FieldValueError { field: String, message: String },

    #[error("仓储内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, detail) => classify_failure(failure, detail),
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found("row", "?"),
            rusqlite::Error::FromSqlConversionFailure(column, _, cause) => {
                RepositoryError::FieldValueError {
                    field: format!("column#{}", column),
                    message: cause.to_string(),
                }
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

fn classify_failure(failure: rusqlite::ffi::Error, detail: Option<String>) -> RepositoryError {
    use rusqlite::ffi;

    let text = detail.unwrap_or_else(|| failure.to_string());
    match (failure.code, failure.extended_code) {
        (_, ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            RepositoryError::UniqueConstraintViolation(text)
        }
        (_, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => RepositoryError::ForeignKeyViolation(text),
        (ffi::ErrorCode::DatabaseBusy | ffi::ErrorCode::DatabaseLocked, _) => {
            RepositoryError::DatabaseTransactionError(text)
        }
        _ => RepositoryError::DatabaseQueryError(text),
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
