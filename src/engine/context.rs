// ==========================================
// 罩套定价系统 - 定价上下文
// ==========================================
// 职责: 一次计算调用只加载一次配置（型号、人工、费率、运费设置、
//       运费档案、各角色材料、各变体利润），显式传递给各环节
// 错误分级:
// - 型号/面积/人工/费率/运费全局设置缺失 → 返回 ConfigError（全部变体失败）
// - 角色材料/变体利润缺失 → 记录在上下文中，仅影响用到它的变体
// ==========================================

use crate::config::EngineConfig;
use crate::domain::material::Model;
use crate::domain::shipping::{MarketplaceShippingProfile, ShippingDefaultSetting};
use crate::domain::types::{MaterialRole, VariantKey};
use crate::domain::pricing::LaborSetting;
use crate::engine::config_resolver::ConfigResolver;
use crate::engine::error::{ConfigError, PricingResult};
use crate::engine::variant_cost::{resolve_material, ResolvedMaterial};
use crate::repository::{
    MaterialRepository, ModelRepository, PricingSettingsRepository, RepositoryResult,
    ShippingRepository,
};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::debug;

const MATERIAL_ROLES: [MaterialRole; 3] = [
    MaterialRole::ChoiceFabric,
    MaterialRole::PremiumFabric,
    MaterialRole::Padding,
];

#[derive(Debug, Clone)]
pub struct PricingContext {
    pub model: Model,
    pub marketplace: String,
    pub now: NaiveDateTime,
    pub surface_area_sq_in: f64,
    pub labor: LaborSetting,
    /// 未校验的原始费率，校验在价格推导时进行
    pub fee_rate: f64,
    pub shipping_defaults: ShippingDefaultSetting,
    pub shipping_profile: Option<MarketplaceShippingProfile>,
    pub shipping_profile_required: bool,
    materials: HashMap<MaterialRole, Result<ResolvedMaterial, ConfigError>>,
    profits: HashMap<VariantKey, i64>,
}

impl PricingContext {
    /// 加载定价上下文
    ///
    /// # 返回
    /// - Err(PricingError::Config): 全局性配置缺失
    /// - Err(PricingError::Repository): 数据库错误
    pub fn load(
        conn: &Connection,
        model_id: i64,
        marketplace: &str,
        now: NaiveDateTime,
        config: &EngineConfig,
    ) -> PricingResult<Self> {
        let model = ModelRepository::new(conn)
            .find_by_id(model_id)?
            .ok_or(ConfigError::ModelNotFound { model_id })?;

        let surface_area_sq_in = model
            .valid_surface_area()
            .ok_or(ConfigError::InvalidSurfaceArea { model_id })?;

        let settings = PricingSettingsRepository::new(conn);
        let labor = settings.get_labor()?.ok_or(ConfigError::MissingLaborSettings)?;
        let fee_rate = settings
            .get_fee_rate(marketplace)?
            .ok_or_else(|| ConfigError::MissingFeeRate {
                marketplace: marketplace.to_string(),
            })?
            .fee_rate;

        let shipping_defaults = ShippingRepository::new(conn)
            .get_defaults()?
            .ok_or(ConfigError::MissingShippingDefaults)?;

        let resolver = ConfigResolver::new(conn);
        let shipping_profile = resolver.resolve_shipping_profile(marketplace, now)?;

        let mut materials = HashMap::new();
        for role in MATERIAL_ROLES {
            materials.insert(role, load_role_material(conn, &resolver, role, now)?);
        }

        let mut profits = HashMap::new();
        for variant_key in VariantKey::ALL {
            if let Some(profit) = settings.get_profit(variant_key)? {
                profits.insert(variant_key, profit.profit_cents);
            }
        }

        debug!(
            model_id = model_id,
            marketplace = marketplace,
            surface_area_sq_in = surface_area_sq_in,
            has_profile = shipping_profile.is_some(),
            "定价上下文加载完成"
        );

        Ok(Self {
            model,
            marketplace: marketplace.to_string(),
            now,
            surface_area_sq_in,
            labor,
            fee_rate,
            shipping_defaults,
            shipping_profile,
            shipping_profile_required: config.requires_shipping_profile(marketplace),
            materials,
            profits,
        })
    }

    /// 角色对应的已解析材料
    pub fn material(&self, role: MaterialRole) -> Result<&ResolvedMaterial, ConfigError> {
        match self.materials.get(&role) {
            Some(Ok(material)) => Ok(material),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ConfigError::MissingRoleAssignment { role }),
        }
    }

    /// 变体利润（分）
    pub fn profit_cents(&self, variant_key: VariantKey) -> Result<i64, ConfigError> {
        self.profits
            .get(&variant_key)
            .copied()
            .ok_or(ConfigError::MissingProfitSetting { variant_key })
    }

    pub fn shipping_settings_version(&self) -> i64 {
        self.shipping_defaults.shipping_settings_version
    }
}

/// 解析单个角色：生效分配 → 材料 → 首选供应商
///
/// 配置问题记在内层 Result，数据库错误走外层
fn load_role_material(
    conn: &Connection,
    resolver: &ConfigResolver<'_>,
    role: MaterialRole,
    now: NaiveDateTime,
) -> RepositoryResult<Result<ResolvedMaterial, ConfigError>> {
    let Some(assignment) = resolver.resolve_role_assignment(role, now)? else {
        return Ok(Err(ConfigError::MissingRoleAssignment { role }));
    };

    let repo = MaterialRepository::new(conn);
    let Some(material) = repo.find_by_id(assignment.material_id)? else {
        return Ok(Err(ConfigError::MaterialNotFound {
            role,
            material_id: assignment.material_id,
        }));
    };

    let links = repo.find_supplier_links(material.id)?;
    Ok(resolve_material(role, &material, &links))
}
