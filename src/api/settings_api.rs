// ==========================================
// 罩套定价系统 - 定价设置 API
// ==========================================
// 职责: 定价相关配置的校验与写入
// - 型号 / 材料 / 供应商报价 / 材料角色
// - 人工 / 平台费率 / 变体利润
// - 运费全局设置 / 运费卡 / 档位 / 分区费率 / 平台运费档案
// 约定: 影响运费结果的写入都会递增 shipping_settings_version，
//       使已有快照可被判定为过期
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::pricing::LaborSetting;
use crate::domain::shipping::ShippingDefaultSetting;
use crate::domain::types::{MaterialRole, VariantKey};
use crate::engine::clock::Clock;
use crate::engine::price_deriver::validate_fee_rate;
use crate::engine::unit_of_work::run_in_unit;
use crate::repository::{
    MaterialRepository, ModelRepository, PricingSettingsRepository, ShippingRepository,
};

// ==========================================
// SettingsApi - 定价设置 API
// ==========================================
pub struct SettingsApi {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

fn require_non_empty<'a>(value: &'a str, what: &str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", what)));
    }
    Ok(trimmed)
}

fn require_positive(value: Option<f64>, what: &str) -> ApiResult<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ApiError::InvalidInput(format!(
            "{}必须为正数: {}",
            what, v
        ))),
        other => Ok(other),
    }
}

fn require_non_negative_cents(value: i64, what: &str) -> ApiResult<i64> {
    if value < 0 {
        return Err(ApiError::InvalidInput(format!("{}不能为负数: {}", what, value)));
    }
    Ok(value)
}

impl SettingsApi {
    pub fn new(conn: Arc<Mutex<Connection>>, clock: Arc<dyn Clock>) -> Self {
        Self { conn, clock }
    }

    fn lock_conn(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))
    }

    // ==========================================
    // 型号
    // ==========================================

    pub fn create_model(
        &self,
        name: &str,
        dimensions: (Option<f64>, Option<f64>, Option<f64>),
        surface_area_sq_in: Option<f64>,
    ) -> ApiResult<i64> {
        let name = require_non_empty(name, "型号名称")?;
        let conn = self.lock_conn()?;
        Ok(ModelRepository::new(&conn).insert(name, dimensions, surface_area_sq_in)?)
    }

    /// 写入外部计算的表面积（允许清空；非正数在定价时报错）
    pub fn set_surface_area(&self, model_id: i64, surface_area_sq_in: Option<f64>) -> ApiResult<()> {
        let conn = self.lock_conn()?;
        let rows = ModelRepository::new(&conn).update_surface_area(model_id, surface_area_sq_in)?;
        if rows == 0 {
            return Err(ApiError::NotFound(format!("Model(id={})不存在", model_id)));
        }
        Ok(())
    }

    // ==========================================
    // 材料 / 供应商
    // ==========================================

    pub fn create_material(
        &self,
        name: &str,
        linear_yard_width_in: Option<f64>,
        weight_per_sq_in_oz: Option<f64>,
    ) -> ApiResult<i64> {
        let name = require_non_empty(name, "材料名称")?;
        let width = require_positive(linear_yard_width_in, "幅宽")?;
        if let Some(w) = weight_per_sq_in_oz {
            if !w.is_finite() || w < 0.0 {
                return Err(ApiError::InvalidInput(format!("单位面积重量不能为负数: {}", w)));
            }
        }

        let conn = self.lock_conn()?;
        Ok(MaterialRepository::new(&conn).insert_material(name, width, weight_per_sq_in_oz)?)
    }

    pub fn create_supplier(&self, name: &str) -> ApiResult<i64> {
        let name = require_non_empty(name, "供应商名称")?;
        let conn = self.lock_conn()?;
        Ok(MaterialRepository::new(&conn).insert_supplier(name)?)
    }

    pub fn link_supplier(
        &self,
        material_id: i64,
        supplier_id: i64,
        unit_cost_dollars: f64,
        is_preferred: bool,
    ) -> ApiResult<i64> {
        if !unit_cost_dollars.is_finite() || unit_cost_dollars < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "供应商单价不能为负数: {}",
                unit_cost_dollars
            )));
        }
        let conn = self.lock_conn()?;
        Ok(MaterialRepository::new(&conn).insert_supplier_link(
            material_id,
            supplier_id,
            unit_cost_dollars,
            is_preferred,
        )?)
    }

    pub fn update_supplier_cost(&self, link_id: i64, unit_cost_dollars: f64) -> ApiResult<()> {
        if !unit_cost_dollars.is_finite() || unit_cost_dollars < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "供应商单价不能为负数: {}",
                unit_cost_dollars
            )));
        }
        let conn = self.lock_conn()?;
        let rows = MaterialRepository::new(&conn).update_unit_cost(link_id, unit_cost_dollars)?;
        if rows == 0 {
            return Err(ApiError::NotFound(format!("MaterialSupplier(id={})不存在", link_id)));
        }
        Ok(())
    }

    /// 分配材料角色；effective_date 缺省为当前时刻
    pub fn assign_material_role(
        &self,
        role: MaterialRole,
        material_id: i64,
        effective_date: Option<NaiveDateTime>,
    ) -> ApiResult<i64> {
        let effective = effective_date.unwrap_or_else(|| self.clock.now());
        let conn = self.lock_conn()?;

        let id = run_in_unit(&conn, |c| -> ApiResult<i64> {
            let repo = MaterialRepository::new(c);
            if repo.find_by_id(material_id)?.is_none() {
                return Err(ApiError::NotFound(format!("Material(id={})不存在", material_id)));
            }
            Ok(repo.assign_role(role, material_id, effective)?)
        })?;

        info!(role = %role.as_str(), material_id, "材料角色已分配");
        Ok(id)
    }

    // ==========================================
    // 人工 / 费率 / 利润
    // ==========================================

    pub fn save_labor(&self, labor: &LaborSetting) -> ApiResult<()> {
        require_non_negative_cents(labor.hourly_rate_cents, "时薪")?;
        require_non_negative_cents(labor.minutes_no_padding, "无衬垫工时")?;
        require_non_negative_cents(labor.minutes_with_padding, "有衬垫工时")?;

        let conn = self.lock_conn()?;
        PricingSettingsRepository::new(&conn).save_labor(labor)?;
        Ok(())
    }

    /// 保存平台费率，要求 0 <= rate < 1
    pub fn set_fee_rate(&self, marketplace: &str, fee_rate: f64) -> ApiResult<()> {
        let marketplace = require_non_empty(marketplace, "平台名称")?;
        let fee_rate = validate_fee_rate(fee_rate).map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        let conn = self.lock_conn()?;
        PricingSettingsRepository::new(&conn).save_fee_rate(marketplace, fee_rate)?;
        Ok(())
    }

    pub fn set_variant_profit(&self, variant_key: VariantKey, profit_cents: i64) -> ApiResult<()> {
        require_non_negative_cents(profit_cents, "利润")?;
        let conn = self.lock_conn()?;
        PricingSettingsRepository::new(&conn).save_profit(variant_key, profit_cents)?;
        Ok(())
    }

    // ==========================================
    // 运费
    // ==========================================

    /// 保存运费全局设置，返回新的版本号
    pub fn save_shipping_defaults(&self, setting: &ShippingDefaultSetting) -> ApiResult<i64> {
        require_non_negative_cents(setting.flat_shipping_cents, "固定运费")?;

        let conn = self.lock_conn()?;
        let version = ShippingRepository::new(&conn).save_defaults(setting)?;
        info!(version, mode = %setting.shipping_mode.as_str(), "运费全局设置已保存");
        Ok(version)
    }

    pub fn create_rate_card(&self, name: &str) -> ApiResult<i64> {
        let name = require_non_empty(name, "运费卡名称")?;
        let conn = self.lock_conn()?;
        Ok(ShippingRepository::new(&conn).insert_rate_card(name)?)
    }

    pub fn add_rate_tier(&self, rate_card_id: i64, max_oz: f64, label: Option<&str>) -> ApiResult<i64> {
        require_positive(Some(max_oz), "档位上限")?;
        let conn = self.lock_conn()?;

        run_in_unit(&conn, |c| -> ApiResult<i64> {
            let repo = ShippingRepository::new(c);
            let id = repo.insert_tier(rate_card_id, max_oz, label)?;
            repo.bump_version()?;
            Ok(id)
        })
    }

    pub fn set_zone_rate(&self, tier_id: i64, zone: &str, rate_cents: i64) -> ApiResult<()> {
        let zone = require_non_empty(zone, "分区")?;
        require_non_negative_cents(rate_cents, "分区运费")?;
        let conn = self.lock_conn()?;

        run_in_unit(&conn, |c| -> ApiResult<()> {
            let repo = ShippingRepository::new(c);
            if repo.find_tier(tier_id)?.is_none() {
                return Err(ApiError::NotFound(format!("ShippingRateTier(id={})不存在", tier_id)));
            }
            repo.upsert_zone_rate(tier_id, zone, rate_cents)?;
            repo.bump_version()?;
            Ok(())
        })
    }

    /// 绑定平台运费档案；effective_date 缺省为当前时刻
    pub fn bind_shipping_profile(
        &self,
        marketplace: &str,
        rate_card_id: i64,
        pricing_zone: Option<&str>,
        effective_date: Option<NaiveDateTime>,
    ) -> ApiResult<i64> {
        let marketplace = require_non_empty(marketplace, "平台名称")?;
        let pricing_zone = pricing_zone.map(str::trim).filter(|z| !z.is_empty());
        let effective = effective_date.unwrap_or_else(|| self.clock.now());
        let conn = self.lock_conn()?;

        let id = run_in_unit(&conn, |c| -> ApiResult<i64> {
            let repo = ShippingRepository::new(c);
            let id = repo.bind_profile(marketplace, rate_card_id, pricing_zone, effective)?;
            repo.bump_version()?;
            Ok(id)
        })?;

        info!(marketplace, rate_card_id, "平台运费档案已绑定");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ShippingMode;
    use crate::engine::clock::FixedClock;
    use chrono::NaiveDate;

    fn setup_api() -> (SettingsApi, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let now = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let api = SettingsApi::new(conn.clone(), Arc::new(FixedClock::new(now)));
        (api, conn)
    }

    fn calculated_defaults() -> ShippingDefaultSetting {
        ShippingDefaultSetting {
            shipping_mode: ShippingMode::Calculated,
            flat_shipping_cents: 0,
            default_zone: Some("zone_5".to_string()),
            assumed_rate_card_id: None,
            assumed_tier_id: None,
            assumed_zone: None,
            shipping_settings_version: 0,
        }
    }

    #[test]
    fn test_fee_rate_validation() {
        let (api, _conn) = setup_api();

        assert!(api.set_fee_rate("etsy", 0.15).is_ok());
        assert!(matches!(api.set_fee_rate("etsy", 1.0), Err(ApiError::InvalidInput(_))));
        assert!(matches!(api.set_fee_rate("etsy", -0.01), Err(ApiError::InvalidInput(_))));
        assert!(matches!(api.set_fee_rate("  ", 0.1), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_shipping_changes_bump_version() {
        let (api, conn) = setup_api();

        assert_eq!(api.save_shipping_defaults(&calculated_defaults()).unwrap(), 1);

        let card = api.create_rate_card("ground").unwrap();
        let tier = api.add_rate_tier(card, 8.0, Some("up to 8 oz")).unwrap();
        api.set_zone_rate(tier, "zone_5", 150).unwrap();
        api.bind_shipping_profile("etsy", card, Some(" "), None).unwrap();

        let guard = conn.lock().unwrap();
        let repo = ShippingRepository::new(&guard);
        assert_eq!(repo.current_version().unwrap(), Some(4));

        // 空白分区按未设置处理
        let profiles = repo.find_profiles("etsy").unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].pricing_zone, None);
    }

    #[test]
    fn test_not_found_targets() {
        let (api, _conn) = setup_api();

        assert!(matches!(api.set_surface_area(99, Some(10.0)), Err(ApiError::NotFound(_))));
        assert!(matches!(api.set_zone_rate(99, "zone_1", 100), Err(ApiError::NotFound(_))));
        assert!(matches!(
            api.assign_material_role(MaterialRole::Padding, 99, None),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_material_input_validation() {
        let (api, _conn) = setup_api();

        assert!(api.create_material("canvas", Some(60.0), Some(0.02)).is_ok());
        assert!(api.create_material("canvas", Some(0.0), Some(0.02)).is_err());
        assert!(api.create_material("canvas", Some(60.0), Some(-1.0)).is_err());
        assert!(api.create_material("", Some(60.0), None).is_err());
    }
}
