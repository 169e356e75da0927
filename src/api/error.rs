// ==========================================
// 罩套定价系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/引擎错误为调用方可读的错误消息
// 约束: 配置错误必须保留具体缺失项
// ==========================================

use crate::engine::error::{ConfigError, PricingError, VariantFailure};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 定价错误
    // ==========================================
    /// 全局性配置缺失（不针对单个变体）
    #[error("配置错误: {0}")]
    ConfigurationError(ConfigError),

    /// 部分或全部变体定价失败，成功的变体已落库
    #[error("定价失败: model_id={model_id}, marketplace={marketplace}, 失败变体数={}", .failures.len())]
    PricingFailed {
        model_id: i64,
        marketplace: String,
        failures: Vec<VariantFailure>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
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
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}取值无效: {}", field, message))
            }
        }
    }
}

// ==========================================
// 从 PricingError 转换
// ==========================================
impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Config(e) => ApiError::ConfigurationError(e),
            PricingError::Repository(e) => e.into(),
            PricingError::VariantFailures {
                model_id,
                marketplace,
                failures,
                ..
            } => ApiError::PricingFailed {
                model_id,
                marketplace,
                failures,
            },
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
