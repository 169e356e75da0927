// ==========================================
// 罩套定价系统 - API 层
// ==========================================
// 职责: 进程内业务 API，供界面或命令行调用
// ==========================================

pub mod error;
pub mod pricing_api;
pub mod settings_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use pricing_api::PricingApi;
pub use settings_api::SettingsApi;
