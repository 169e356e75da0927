// ==========================================
// 罩套定价系统 - 运费解析
// ==========================================
// 三种模式:
// - fixed_cell: 忽略档案与重量，使用全局假定的运费卡/档位/分区
// - flat:       固定运费；除豁免平台外仍要求存在运费档案
// - calculated: 必须有运费档案；分区 = 档案分区 > 全局默认分区；
//               档位 = 覆盖重量的最小 max_oz（同值取 id 最小）
// 输出: 整数分
// ==========================================

use crate::domain::types::ShippingMode;
use crate::engine::context::PricingContext;
use crate::engine::error::{ConfigError, PricingResult};
use crate::repository::ShippingRepository;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 运费解析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub mode: ShippingMode,
    pub cost_cents: i64,
    pub rate_card_id: Option<i64>,
    pub tier_id: Option<i64>,
    pub zone: Option<String>,
}

pub struct ShippingCostResolver<'c> {
    repo: ShippingRepository<'c>,
}

impl<'c> ShippingCostResolver<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            repo: ShippingRepository::new(conn),
        }
    }

    /// 计算给定重量的运费
    pub fn resolve(&self, ctx: &PricingContext, weight_oz: f64) -> PricingResult<ShippingQuote> {
        let defaults = &ctx.shipping_defaults;

        let quote = match defaults.shipping_mode {
            ShippingMode::FixedCell => self.resolve_fixed_cell(ctx)?,
            ShippingMode::Flat => {
                if ctx.shipping_profile_required && ctx.shipping_profile.is_none() {
                    return Err(missing_profile(ctx).into());
                }
                ShippingQuote {
                    mode: ShippingMode::Flat,
                    cost_cents: defaults.flat_shipping_cents,
                    rate_card_id: None,
                    tier_id: None,
                    zone: None,
                }
            }
            ShippingMode::Calculated => self.resolve_calculated(ctx, weight_oz)?,
        };

        debug!(
            mode = %quote.mode.as_str(),
            weight_oz = weight_oz,
            cost_cents = quote.cost_cents,
            "运费解析完成"
        );
        Ok(quote)
    }

    fn resolve_fixed_cell(&self, ctx: &PricingContext) -> PricingResult<ShippingQuote> {
        let defaults = &ctx.shipping_defaults;

        let rate_card_id = defaults
            .assumed_rate_card_id
            .ok_or_else(|| fixed_cell_missing("an assumed rate card"))?;
        let tier_id = defaults
            .assumed_tier_id
            .ok_or_else(|| fixed_cell_missing("an assumed tier"))?;
        let zone = defaults
            .assumed_zone
            .as_deref()
            .filter(|z| !z.trim().is_empty())
            .ok_or_else(|| fixed_cell_missing("an assumed zone"))?;

        let tier = self
            .repo
            .find_tier(tier_id)?
            .filter(|t| t.rate_card_id == rate_card_id)
            .ok_or_else(|| {
                fixed_cell_missing(&format!(
                    "tier {} to exist on rate card {}",
                    tier_id, rate_card_id
                ))
            })?;

        let rate = self
            .repo
            .find_zone_rate(tier.id, zone)?
            .ok_or_else(|| ConfigError::MissingZoneRate {
                tier_id: tier.id,
                zone: zone.to_string(),
            })?;

        Ok(ShippingQuote {
            mode: ShippingMode::FixedCell,
            cost_cents: rate.rate_cents,
            rate_card_id: Some(rate_card_id),
            tier_id: Some(tier.id),
            zone: Some(rate.zone),
        })
    }

    fn resolve_calculated(&self, ctx: &PricingContext, weight_oz: f64) -> PricingResult<ShippingQuote> {
        let profile = ctx
            .shipping_profile
            .as_ref()
            .ok_or_else(|| missing_profile(ctx))?;

        let zone = profile
            .pricing_zone
            .as_deref()
            .filter(|z| !z.trim().is_empty())
            .or_else(|| {
                ctx.shipping_defaults
                    .default_zone
                    .as_deref()
                    .filter(|z| !z.trim().is_empty())
            })
            .ok_or_else(|| ConfigError::MissingShippingZone {
                marketplace: ctx.marketplace.clone(),
            })?;

        let tier = self
            .repo
            .find_tier_for_weight(profile.rate_card_id, weight_oz)?
            .ok_or(ConfigError::NoTierCoversWeight {
                rate_card_id: profile.rate_card_id,
                weight_oz,
            })?;

        let rate = self
            .repo
            .find_zone_rate(tier.id, zone)?
            .ok_or_else(|| ConfigError::MissingZoneRate {
                tier_id: tier.id,
                zone: zone.to_string(),
            })?;

        Ok(ShippingQuote {
            mode: ShippingMode::Calculated,
            cost_cents: rate.rate_cents,
            rate_card_id: Some(profile.rate_card_id),
            tier_id: Some(tier.id),
            zone: Some(rate.zone),
        })
    }
}

fn missing_profile(ctx: &PricingContext) -> ConfigError {
    ConfigError::MissingShippingProfile {
        marketplace: ctx.marketplace.clone(),
    }
}

fn fixed_cell_missing(what: &str) -> ConfigError {
    ConfigError::FixedCellNotConfigured {
        missing: what.to_string(),
    }
}
