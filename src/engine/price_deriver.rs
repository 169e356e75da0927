// ==========================================
// 罩套定价系统 - 零售价推导
// ==========================================
// 目标价   = (原始成本 + 利润) / (1 - 平台费率)
// 尾数定价 = 整数美元 + 0.95，若低于目标价则再加 1 美元
// 平台费   = round(零售价 × 费率)
// 基础成本 = 零售价 - 利润
// ==========================================

use crate::engine::error::ConfigError;
use crate::engine::variant_cost::round_cents;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedPrice {
    pub retail_price_cents: i64,
    pub marketplace_fee_cents: i64,
    pub base_cost_cents: i64,
    pub profit_cents: i64,
}

/// 校验平台费率: 0 <= rate < 1
pub fn validate_fee_rate(fee_rate: f64) -> Result<f64, ConfigError> {
    if !fee_rate.is_finite() || fee_rate < 0.0 {
        return Err(ConfigError::InvalidFeeRate { fee_rate });
    }
    if fee_rate >= 1.0 {
        return Err(ConfigError::FeeRateTooHigh { fee_rate });
    }
    Ok(fee_rate)
}

/// 以分为单位的尾数定价
pub fn charm_price_cents(target_cents: f64) -> i64 {
    let whole_dollars = (target_cents / 100.0).floor();
    let candidate = whole_dollars * 100.0 + 95.0;
    if candidate >= target_cents {
        round_cents(candidate)
    } else {
        round_cents(candidate + 100.0)
    }
}

/// 以美元为单位的尾数定价
pub fn charm_price_dollars(target_dollars: f64) -> f64 {
    charm_price_cents(target_dollars * 100.0) as f64 / 100.0
}

/// 由原始成本、利润与费率推导零售价
pub fn derive_price(
    raw_cost_cents: i64,
    profit_cents: i64,
    fee_rate: f64,
) -> Result<DerivedPrice, ConfigError> {
    let fee_rate = validate_fee_rate(fee_rate)?;

    let target_cents = (raw_cost_cents + profit_cents) as f64 / (1.0 - fee_rate);
    let retail_price_cents = charm_price_cents(target_cents);

    Ok(DerivedPrice {
        retail_price_cents,
        marketplace_fee_cents: round_cents(retail_price_cents as f64 * fee_rate),
        base_cost_cents: retail_price_cents - profit_cents,
        profit_cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charm_pricing_boundaries() {
        assert_eq!(charm_price_cents(1294.0), 1295);
        assert_eq!(charm_price_cents(1295.0), 1295);
        assert_eq!(charm_price_cents(1296.0), 1395);
        assert_eq!(charm_price_cents(1200.0), 1295);
        assert_eq!(charm_price_dollars(12.94), 12.95);
        assert_eq!(charm_price_dollars(12.96), 13.95);
    }

    #[test]
    fn test_derive_price_reference_case() {
        // 原始成本 = 材料 300 + 人工 992 + 运费 150
        let price = derive_price(1442, 2000, 0.15).unwrap();
        assert_eq!(price.retail_price_cents, 4095);
        assert_eq!(price.marketplace_fee_cents, 614);
        assert_eq!(price.base_cost_cents, 2095);
        assert_eq!(price.profit_cents, 2000);
    }

    #[test]
    fn test_zero_fee_rate() {
        let price = derive_price(1000, 200, 0.0).unwrap();
        assert_eq!(price.retail_price_cents, 1295);
        assert_eq!(price.marketplace_fee_cents, 0);
        assert_eq!(price.base_cost_cents, 1095);
    }

    #[test]
    fn test_fee_rate_validation() {
        let err = derive_price(1000, 200, 1.0).unwrap_err();
        assert!(err.to_string().starts_with("fee rate cannot be 100% or more"));
        assert!(matches!(derive_price(1000, 200, 1.5), Err(ConfigError::FeeRateTooHigh { .. })));
        assert!(matches!(derive_price(1000, 200, -0.1), Err(ConfigError::InvalidFeeRate { .. })));
        assert!(matches!(
            derive_price(1000, 200, f64::NAN),
            Err(ConfigError::InvalidFeeRate { .. })
        ));
    }
}
