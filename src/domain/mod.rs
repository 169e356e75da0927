// ==========================================
// 罩套定价系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod material;
pub mod pricing;
pub mod shipping;
pub mod types;

// 重导出核心类型
pub use material::{Material, MaterialRoleAssignment, MaterialSupplierLink, Model};
pub use pricing::{
    FieldChange, LaborSetting, MarketplaceFeeRate, ModelPricingHistory, ModelPricingSnapshot,
    PricingBreakdown, PricingDiff, VariantProfitSetting,
};
pub use shipping::{
    MarketplaceShippingProfile, ShippingDefaultSetting, ShippingRateCard, ShippingRateTier,
    ShippingZoneRate,
};
pub use types::{ChangeDirection, FabricGrade, MaterialRole, ShippingMode, VariantKey};
