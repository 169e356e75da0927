// ==========================================
// 罩套定价系统 - 核心库
// ==========================================
// 职责: 按型号尺寸与当前成本配置推导各平台、各变体零售价，
//       持久化快照并维护可比对的价格审计历史
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 定价规则
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ChangeDirection, FabricGrade, MaterialRole, ShippingMode, VariantKey};

// 领域实体
pub use domain::{
    FieldChange, ModelPricingHistory, ModelPricingSnapshot, PricingBreakdown, PricingDiff,
};

// 引擎
pub use engine::{
    CalculationSummary, ConfigError, PricingEngine, PricingError, RecalcReport, SystemClock,
};

// API
pub use api::{ApiError, ApiResult, PricingApi, SettingsApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "罩套定价系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
