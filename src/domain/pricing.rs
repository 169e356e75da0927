// ==========================================
// 罩套定价系统 - 定价领域模型
// ==========================================
// 当前价格快照 + 只追加的审计历史
// ==========================================

use crate::domain::types::{ChangeDirection, VariantKey};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// 定价配置（平面表）
// ==========================================

/// 人工设置（单行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborSetting {
    pub hourly_rate_cents: i64,
    pub minutes_no_padding: i64,
    pub minutes_with_padding: i64,
}

impl LaborSetting {
    pub fn minutes_for(&self, padded: bool) -> i64 {
        if padded {
            self.minutes_with_padding
        } else {
            self.minutes_no_padding
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceFeeRate {
    pub marketplace: String,
    pub fee_rate: f64, // 0 <= rate < 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantProfitSetting {
    pub variant_key: VariantKey,
    pub profit_cents: i64,
}

// ==========================================
// PricingBreakdown - 单个变体的完整定价拆解
// ==========================================
// 快照与历史共用；后三组字段为 UI 提示用的元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    // ===== 成本与价格 (cents) =====
    pub raw_cost_cents: i64,
    pub base_cost_cents: i64,
    pub retail_price_cents: i64,
    pub marketplace_fee_cents: i64,
    pub profit_cents: i64,
    pub material_cost_cents: i64,
    pub labor_cost_cents: i64,
    pub shipping_cost_cents: i64,
    pub weight_oz: f64,

    // ===== 计算依据 =====
    pub surface_area_sq_in: f64,
    pub material_cost_per_sq_in_cents: f64,
    pub weight_per_sq_in_oz: f64,
    pub labor_minutes: i64,
    pub labor_rate_cents_per_hour: i64,
    pub marketplace_fee_rate: f64,

    // ===== 版本 =====
    pub shipping_settings_version: i64,
}

// ==========================================
// ModelPricingSnapshot - 当前价格快照
// ==========================================
// 唯一键: (model_id, marketplace, variant_key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricingSnapshot {
    pub id: i64,
    pub model_id: i64,
    pub marketplace: String,
    pub variant_key: VariantKey,
    #[serde(flatten)]
    pub breakdown: PricingBreakdown,
    pub calculated_at: NaiveDateTime,
}

// ==========================================
// ModelPricingHistory - 价格审计历史（只追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricingHistory {
    pub id: i64,
    pub model_id: i64,
    pub marketplace: String,
    pub variant_key: VariantKey,
    #[serde(flatten)]
    pub breakdown: PricingBreakdown,
    pub calculated_at: NaiveDateTime,
    pub reason: String,
    pub run_id: Option<String>, // 同一次计算调用写入的历史行共享
}

// ==========================================
// 差异结果
// ==========================================

/// 单字段变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: f64,
    pub new: f64,
    pub delta: f64,
    pub direction: ChangeDirection,
}

/// 最近两次计算之间的差异
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingDiff {
    pub model_id: i64,
    pub marketplace: String,
    pub variant_key: VariantKey,
    pub newer_history_id: i64,
    pub older_history_id: i64,
    pub newer_calculated_at: NaiveDateTime,
    pub older_calculated_at: NaiveDateTime,
    pub changes: Vec<FieldChange>,
}
