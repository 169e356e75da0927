// ==========================================
// 罩套定价系统 - 运费领域模型
// ==========================================
// 运费卡 → 重量档位(max_oz) → 分区费率(cents)
// ==========================================

use crate::domain::types::ShippingMode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ShippingDefaultSetting - 全局运费设置（单行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingDefaultSetting {
    pub shipping_mode: ShippingMode,
    pub flat_shipping_cents: i64,
    pub default_zone: Option<String>, // 运费档案未指定分区时的全局兜底分区
    // ===== fixed_cell 模式专用 =====
    pub assumed_rate_card_id: Option<i64>,
    pub assumed_tier_id: Option<i64>,
    pub assumed_zone: Option<String>,
    /// 运费配置版本号，单调递增；快照记录该值用于判断是否过期
    pub shipping_settings_version: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRateCard {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRateTier {
    pub id: i64,
    pub rate_card_id: i64,
    pub max_oz: f64, // 档位上限(盎司)
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingZoneRate {
    pub id: i64,
    pub tier_id: i64,
    pub zone: String,
    pub rate_cents: i64,
}

// ==========================================
// MarketplaceShippingProfile - 平台运费档案（时间生效）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceShippingProfile {
    pub id: i64,
    pub marketplace: String,
    pub rate_card_id: i64,
    pub pricing_zone: Option<String>,
    pub effective_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
}
