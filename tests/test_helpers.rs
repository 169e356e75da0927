// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、固定时钟与标准定价配置
// ==========================================
// 标准配置（面积 200 平方英寸）:
// - 标准面料: 32.4 美元/码, 幅宽 60, 0.02 盎司/平方英寸 → 300 分, 4 盎司
// - 高级面料: 43.2 美元/码, 幅宽 60, 0.025 盎司/平方英寸 → 400 分, 5 盎司
// - 衬垫:     10.8 美元/码, 幅宽 60, 0.01 盎司/平方英寸 → 100 分, 2 盎司
// - 人工: 1700 分/小时, 无衬垫 35 分钟, 有衬垫 50 分钟
// - 运费: calculated, ground 卡, 档位 8 盎司(150) / 16 盎司(250), zone_5
// - 利润: 每变体 2000 分; etsy 费率 0.15
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use cover_pricing::app::AppState;
use cover_pricing::domain::pricing::LaborSetting;
use cover_pricing::domain::shipping::ShippingDefaultSetting;
use cover_pricing::domain::types::{MaterialRole, ShippingMode, VariantKey};
use cover_pricing::engine::clock::{Clock, FixedClock};
use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const MARKETPLACE: &str = "etsy";
pub const ZONE: &str = "zone_5";

/// 测试环境
pub struct TestEnv {
    /// 临时数据库文件（需要保持存活）
    pub temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

/// 标准配置中各实体的 ID
#[derive(Debug, Clone, Copy)]
pub struct SeedIds {
    pub model_id: i64,
    pub supplier_id: i64,
    pub choice_material_id: i64,
    pub premium_material_id: i64,
    pub padding_material_id: i64,
    pub rate_card_id: i64,
    pub tier_8_id: i64,
    pub tier_16_id: i64,
}

pub fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn config_effective_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// 创建临时测试数据库并初始化 AppState（固定时钟）
pub fn create_test_env() -> Result<TestEnv, Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let clock = Arc::new(FixedClock::new(test_now()));
    let state = AppState::with_clock(db_path.clone(), clock.clone() as Arc<dyn Clock>)?;

    Ok(TestEnv {
        temp_file,
        db_path,
        state,
        clock,
    })
}

pub fn calculated_defaults() -> ShippingDefaultSetting {
    ShippingDefaultSetting {
        shipping_mode: ShippingMode::Calculated,
        flat_shipping_cents: 0,
        default_zone: None,
        assumed_rate_card_id: None,
        assumed_tier_id: None,
        assumed_zone: None,
        shipping_settings_version: 0,
    }
}

pub fn standard_labor() -> LaborSetting {
    LaborSetting {
        hourly_rate_cents: 1700,
        minutes_no_padding: 35,
        minutes_with_padding: 50,
    }
}

/// 写入标准定价配置
pub fn seed_standard_config(env: &TestEnv) -> Result<SeedIds, Box<dyn Error>> {
    let api = &env.state.settings_api;
    let effective = Some(config_effective_date());

    let model_id = api.create_model("upright piano", (Some(10.0), Some(5.0), Some(4.0)), Some(200.0))?;

    let supplier_id = api.create_supplier("acme textiles")?;

    let choice_material_id = api.create_material("choice canvas", Some(60.0), Some(0.02))?;
    api.link_supplier(choice_material_id, supplier_id, 32.4, true)?;
    api.assign_material_role(MaterialRole::ChoiceFabric, choice_material_id, effective)?;

    let premium_material_id = api.create_material("premium vinyl", Some(60.0), Some(0.025))?;
    api.link_supplier(premium_material_id, supplier_id, 43.2, true)?;
    api.assign_material_role(MaterialRole::PremiumFabric, premium_material_id, effective)?;

    let padding_material_id = api.create_material("quilted padding", Some(60.0), Some(0.01))?;
    api.link_supplier(padding_material_id, supplier_id, 10.8, true)?;
    api.assign_material_role(MaterialRole::Padding, padding_material_id, effective)?;

    api.save_labor(&standard_labor())?;
    api.set_fee_rate(MARKETPLACE, 0.15)?;
    for variant_key in VariantKey::ALL {
        api.set_variant_profit(variant_key, 2000)?;
    }

    api.save_shipping_defaults(&calculated_defaults())?;
    let rate_card_id = api.create_rate_card("ground")?;
    let tier_8_id = api.add_rate_tier(rate_card_id, 8.0, Some("up to 8 oz"))?;
    let tier_16_id = api.add_rate_tier(rate_card_id, 16.0, Some("up to 1 lb"))?;
    api.set_zone_rate(tier_8_id, ZONE, 150)?;
    api.set_zone_rate(tier_16_id, ZONE, 250)?;
    api.bind_shipping_profile(MARKETPLACE, rate_card_id, Some(ZONE), effective)?;

    Ok(SeedIds {
        model_id,
        supplier_id,
        choice_material_id,
        premium_material_id,
        padding_material_id,
        rate_card_id,
        tier_8_id,
        tier_16_id,
    })
}
