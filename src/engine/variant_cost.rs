// ==========================================
// 罩套定价系统 - 变体成本组合
// ==========================================
// 变体固定 4 种，顺序: choice_no_padding, choice_padded,
//                     premium_no_padding, premium_padded
// 材料成本 = round(Σ(单价 / (幅宽 × 36)) × 面积 × 100)
// 重量     = Σ(单位面积重量) × 面积
// 人工     = round(分钟 / 60 × 时薪分)
// 原始成本 = 材料 + 人工 + 运费
// 红线: 缺失配置一律报具名错误，不做兜底成本
// ==========================================

use crate::domain::material::{Material, MaterialSupplierLink};
use crate::domain::types::{MaterialRole, VariantKey};
use crate::engine::context::PricingContext;
use crate::engine::error::{ConfigError, PricingResult};
use crate::engine::shipping_resolver::{ShippingCostResolver, ShippingQuote};
use serde::{Deserialize, Serialize};

/// 一码布的长度（英寸）
const INCHES_PER_YARD: f64 = 36.0;

/// 四舍五入到整数分（远离零方向）
pub fn round_cents(value: f64) -> i64 {
    value.round() as i64
}

// ==========================================
// ResolvedMaterial - 已解析的角色材料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMaterial {
    pub role: MaterialRole,
    pub material_id: i64,
    pub name: String,
    pub supplier_id: i64,
    pub unit_cost_dollars: f64,
    pub linear_yard_width_in: f64,
    pub cost_per_sq_in_dollars: f64,
    pub weight_per_sq_in_oz: f64,
}

/// 由材料及其供应商报价解析出单位面积成本与重量
///
/// 必须恰好有一个首选供应商
pub fn resolve_material(
    role: MaterialRole,
    material: &Material,
    links: &[MaterialSupplierLink],
) -> Result<ResolvedMaterial, ConfigError> {
    let preferred: Vec<&MaterialSupplierLink> = links.iter().filter(|l| l.is_preferred).collect();
    let link = match preferred.as_slice() {
        [] => {
            return Err(ConfigError::MissingPreferredSupplier {
                material: material.name.clone(),
            })
        }
        [one] => *one,
        many => {
            return Err(ConfigError::AmbiguousPreferredSupplier {
                material: material.name.clone(),
                count: many.len(),
            })
        }
    };

    let width = material
        .linear_yard_width_in
        .filter(|w| w.is_finite() && *w > 0.0)
        .ok_or_else(|| ConfigError::MissingLinearYardWidth {
            material: material.name.clone(),
        })?;

    let weight = material
        .weight_per_sq_in_oz
        .filter(|w| w.is_finite() && *w >= 0.0)
        .ok_or_else(|| ConfigError::MissingMaterialWeight {
            material: material.name.clone(),
        })?;

    Ok(ResolvedMaterial {
        role,
        material_id: material.id,
        name: material.name.clone(),
        supplier_id: link.supplier_id,
        unit_cost_dollars: link.unit_cost_dollars,
        linear_yard_width_in: width,
        cost_per_sq_in_dollars: link.unit_cost_dollars / (width * INCHES_PER_YARD),
        weight_per_sq_in_oz: weight,
    })
}

// ==========================================
// VariantCost - 单变体成本明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantCost {
    pub variant_key: VariantKey,
    pub material_cost_cents: i64,
    pub labor_cost_cents: i64,
    pub shipping_cost_cents: i64,
    pub raw_cost_cents: i64,
    pub weight_oz: f64,
    pub material_cost_per_sq_in_cents: f64,
    pub weight_per_sq_in_oz: f64,
    pub labor_minutes: i64,
    pub labor_rate_cents_per_hour: i64,
    pub shipping: ShippingQuote,
}

/// 该变体用到的材料角色（面料在前，衬垫在后）
pub fn roles_for(variant_key: VariantKey) -> Vec<MaterialRole> {
    let mut roles = vec![variant_key.fabric_grade().fabric_role()];
    if variant_key.is_padded() {
        roles.push(MaterialRole::Padding);
    }
    roles
}

/// 组合单个变体的原始成本
pub fn compose_variant_cost(
    ctx: &PricingContext,
    variant_key: VariantKey,
    shipping: &ShippingCostResolver<'_>,
) -> PricingResult<VariantCost> {
    let area = ctx.surface_area_sq_in;

    let mut cost_per_sq_in_dollars = 0.0;
    let mut weight_per_sq_in_oz = 0.0;
    for role in roles_for(variant_key) {
        let material = ctx.material(role)?;
        cost_per_sq_in_dollars += material.cost_per_sq_in_dollars;
        weight_per_sq_in_oz += material.weight_per_sq_in_oz;
    }

    let material_cost_cents = round_cents(cost_per_sq_in_dollars * area * 100.0);
    let weight_oz = weight_per_sq_in_oz * area;

    let labor_minutes = ctx.labor.minutes_for(variant_key.is_padded());
    let labor_cost_cents =
        round_cents(labor_minutes as f64 / 60.0 * ctx.labor.hourly_rate_cents as f64);

    let quote = shipping.resolve(ctx, weight_oz)?;

    Ok(VariantCost {
        variant_key,
        material_cost_cents,
        labor_cost_cents,
        shipping_cost_cents: quote.cost_cents,
        raw_cost_cents: material_cost_cents + labor_cost_cents + quote.cost_cents,
        weight_oz,
        material_cost_per_sq_in_cents: cost_per_sq_in_dollars * 100.0,
        weight_per_sq_in_oz,
        labor_minutes,
        labor_rate_cents_per_hour: ctx.labor.hourly_rate_cents,
        shipping: quote,
    })
}
