// ==========================================
// 罩套定价系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: 仓储借用同一个 Connection，便于引擎在保存点内组合多次读写
// ==========================================

pub mod error;
pub mod material_repo;
pub mod model_repo;
pub mod pricing_settings_repo;
pub mod pricing_snapshot_repo;
pub mod row_utils;
pub mod shipping_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use material_repo::MaterialRepository;
pub use model_repo::ModelRepository;
pub use pricing_settings_repo::PricingSettingsRepository;
pub use pricing_snapshot_repo::PricingSnapshotRepository;
pub use shipping_repo::ShippingRepository;
