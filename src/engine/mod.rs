// ==========================================
// 罩套定价系统 - 定价引擎层
// ==========================================
// 职责: 配置解析 → 变体成本 → 零售价 → 快照/历史 → 差异
// 红线: 缺失配置报具名错误，不做静默默认值
// 约定: SQL 只在 repository 层，引擎通过仓储读写
// ==========================================

pub mod clock;
pub mod config_resolver;
pub mod context;
pub mod diff;
pub mod error;
pub mod orchestrator;
pub mod persister;
pub mod price_deriver;
pub mod shipping_resolver;
pub mod unit_of_work;
pub mod variant_cost;

// 重导出核心类型
pub use clock::{Clock, FixedClock, SystemClock};
pub use config_resolver::{select_active, ConfigResolver, TimeScoped};
pub use context::PricingContext;
pub use diff::{diff_breakdowns, DiffService, TRACKED_FIELDS};
pub use error::{ConfigError, FailureReason, PricingError, PricingResult, VariantFailure};
pub use orchestrator::{
    CalculationSummary, PricingEngine, RecalcFailure, RecalcReport, VariantOutcome,
};
pub use persister::{breakdown_changed, is_snapshot_stale, PersistOutcome, SnapshotPersister};
pub use price_deriver::{charm_price_cents, charm_price_dollars, derive_price, DerivedPrice};
pub use shipping_resolver::{ShippingCostResolver, ShippingQuote};
pub use unit_of_work::{run_in_unit, UnitOfWork};
pub use variant_cost::{compose_variant_cost, resolve_material, round_cents, ResolvedMaterial, VariantCost};
