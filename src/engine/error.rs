// ==========================================
// 罩套定价系统 - 引擎层错误类型
// ==========================================
// ConfigError: 唯一的“配置错误”分类，消息需指明缺失的是哪一项配置
// PricingError: 引擎对外错误 = 配置错误 | 仓储错误 | 变体失败汇总
// 红线: 不做静默默认值，不做兜底成本
// ==========================================

use crate::domain::types::{MaterialRole, VariantKey};
use crate::engine::orchestrator::VariantOutcome;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// ConfigError - 配置错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("model {model_id} not found")]
    ModelNotFound { model_id: i64 },

    #[error("surface area missing or invalid for model {model_id}")]
    InvalidSurfaceArea { model_id: i64 },

    #[error("no active material assigned to role '{role}'")]
    MissingRoleAssignment { role: MaterialRole },

    #[error("material {material_id} referenced by role '{role}' does not exist")]
    MaterialNotFound { role: MaterialRole, material_id: i64 },

    #[error("material '{material}' has no preferred supplier")]
    MissingPreferredSupplier { material: String },

    #[error("material '{material}' has {count} preferred suppliers, exactly one is required")]
    AmbiguousPreferredSupplier { material: String, count: usize },

    #[error("material '{material}' has no linear yard width")]
    MissingLinearYardWidth { material: String },

    #[error("material '{material}' has no weight per square inch")]
    MissingMaterialWeight { material: String },

    #[error("labor settings are not configured")]
    MissingLaborSettings,

    #[error("no marketplace fee rate configured for '{marketplace}'")]
    MissingFeeRate { marketplace: String },

    #[error("no profit setting configured for variant '{variant_key}'")]
    MissingProfitSetting { variant_key: VariantKey },

    #[error("no active shipping profile for marketplace '{marketplace}'")]
    MissingShippingProfile { marketplace: String },

    #[error("shipping default settings are not configured")]
    MissingShippingDefaults,

    #[error("fee rate cannot be 100% or more (got {fee_rate})")]
    FeeRateTooHigh { fee_rate: f64 },

    #[error("fee rate must be a non-negative number (got {fee_rate})")]
    InvalidFeeRate { fee_rate: f64 },

    #[error("no tier covers this weight: {weight_oz:.4} oz on rate card {rate_card_id}")]
    NoTierCoversWeight { rate_card_id: i64, weight_oz: f64 },

    #[error("no pricing zone on the '{marketplace}' shipping profile and no default zone configured")]
    MissingShippingZone { marketplace: String },

    #[error("no shipping rate for zone '{zone}' in tier {tier_id}")]
    MissingZoneRate { tier_id: i64, zone: String },

    #[error("fixed cell shipping requires {missing}")]
    FixedCellNotConfigured { missing: String },
}

// ==========================================
// 变体失败
// ==========================================

/// 单个变体失败原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    Config(ConfigError),
    Storage(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Config(e) => write!(f, "{}", e),
            FailureReason::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl From<PricingError> for FailureReason {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Config(e) => FailureReason::Config(e),
            other => FailureReason::Storage(other.to_string()),
        }
    }
}

/// 带变体键的失败记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub variant_key: VariantKey,
    pub reason: FailureReason,
}

fn summarize(failures: &[VariantFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.variant_key, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

// ==========================================
// PricingError - 引擎错误
// ==========================================
#[derive(Error, Debug)]
pub enum PricingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// 部分变体失败；成功的变体已各自落库
    #[error("pricing failed for model {model_id} on '{marketplace}': {}", summarize(.failures))]
    VariantFailures {
        model_id: i64,
        marketplace: String,
        succeeded: Vec<VariantOutcome>,
        failures: Vec<VariantFailure>,
    },
}

/// Result 类型别名
pub type PricingResult<T> = Result<T, PricingError>;
