// ==========================================
// 罩套定价系统 - 定价 API
// ==========================================
// 职责: 触发定价计算、查询快照/历史/差异、判断快照是否过期
// 约定: 每个请求加载一次引擎配置，并只持有一次连接锁
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::pricing::{ModelPricingHistory, ModelPricingSnapshot, PricingDiff};
use crate::domain::types::VariantKey;
use crate::engine::clock::Clock;
use crate::engine::diff::DiffService;
use crate::engine::error::ConfigError;
use crate::engine::orchestrator::{CalculationSummary, PricingEngine, RecalcReport};
use crate::engine::persister::is_snapshot_stale;
use crate::repository::{
    ModelRepository, PricingSettingsRepository, PricingSnapshotRepository, ShippingRepository,
};

/// 历史查询的默认条数上限
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// ==========================================
// PricingApi - 定价 API
// ==========================================
pub struct PricingApi {
    conn: Arc<Mutex<Connection>>,
    config_manager: Arc<ConfigManager>,
    clock: Arc<dyn Clock>,
}

impl PricingApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        config_manager: Arc<ConfigManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            conn,
            config_manager,
            clock,
        }
    }

    fn lock_conn(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))
    }

    /// 配置管理器可能与本 API 共用同一连接，须在加锁前调用
    fn engine(&self) -> ApiResult<PricingEngine> {
        let config = self.config_manager.load_engine_config()?;
        Ok(PricingEngine::new(config, self.clock.clone()))
    }

    fn validate_marketplace(marketplace: &str) -> ApiResult<&str> {
        let trimmed = marketplace.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidInput("平台名称不能为空".to_string()));
        }
        Ok(trimmed)
    }

    // ==========================================
    // 计算
    // ==========================================

    /// 计算某型号在某平台的 4 个变体价格
    ///
    /// # 返回
    /// - Ok(CalculationSummary): 全部变体成功
    /// - Err(ApiError::PricingFailed): 有变体失败（成功的变体已落库）
    #[instrument(skip(self))]
    pub fn calculate_model_prices(
        &self,
        model_id: i64,
        marketplace: &str,
    ) -> ApiResult<CalculationSummary> {
        let marketplace = Self::validate_marketplace(marketplace)?;
        let engine = self.engine()?;
        let conn = self.lock_conn()?;

        let summary = engine.calculate_model_prices(&conn, model_id, marketplace)?;
        info!(
            model_id,
            marketplace,
            changed = summary.changed_count(),
            "定价计算完成"
        );
        Ok(summary)
    }

    /// 批量重算
    ///
    /// # 参数
    /// - model_ids: 为空时重算全部型号
    /// - marketplaces: 为空时取全部已配置费率的平台
    #[instrument(skip(self, model_ids, marketplaces))]
    pub fn recalculate_models(
        &self,
        model_ids: &[i64],
        marketplaces: &[String],
    ) -> ApiResult<RecalcReport> {
        let engine = self.engine()?;
        let conn = self.lock_conn()?;

        let model_ids = if model_ids.is_empty() {
            ModelRepository::new(&conn).list_ids()?
        } else {
            model_ids.to_vec()
        };
        let marketplaces = if marketplaces.is_empty() {
            PricingSettingsRepository::new(&conn).list_marketplaces()?
        } else {
            marketplaces
                .iter()
                .map(|m| Self::validate_marketplace(m).map(str::to_string))
                .collect::<ApiResult<Vec<_>>>()?
        };

        Ok(engine.recalculate(&conn, &model_ids, &marketplaces))
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_snapshot(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
    ) -> ApiResult<Option<ModelPricingSnapshot>> {
        let conn = self.lock_conn()?;
        let snapshot =
            PricingSnapshotRepository::new(&conn).find_snapshot(model_id, marketplace, variant_key)?;
        Ok(snapshot)
    }

    pub fn list_snapshots(
        &self,
        model_id: i64,
        marketplace: &str,
    ) -> ApiResult<Vec<ModelPricingSnapshot>> {
        let conn = self.lock_conn()?;
        let snapshots =
            PricingSnapshotRepository::new(&conn).find_snapshots_for_model(model_id, marketplace)?;
        Ok(snapshots)
    }

    /// 最近两次计算的差异；历史不足两条时返回 None
    pub fn diff_latest(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
    ) -> ApiResult<Option<PricingDiff>> {
        let epsilon = self.config_manager.load_engine_config()?.float_epsilon;
        let conn = self.lock_conn()?;
        let diff = DiffService::new(&conn, epsilon).diff_latest(model_id, marketplace, variant_key)?;
        Ok(diff)
    }

    /// 审计历史（最新在前）
    pub fn list_history(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
        limit: Option<usize>,
    ) -> ApiResult<Vec<ModelPricingHistory>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }

        let epsilon = self.config_manager.load_engine_config()?.float_epsilon;
        let conn = self.lock_conn()?;
        let rows = DiffService::new(&conn, epsilon).list_history(
            model_id,
            marketplace,
            variant_key,
            limit,
        )?;
        Ok(rows)
    }

    /// 快照是否基于旧的运费配置版本计算
    ///
    /// # 返回
    /// - Ok(None): 快照不存在
    pub fn is_snapshot_stale_now(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
    ) -> ApiResult<Option<bool>> {
        let conn = self.lock_conn()?;
        let Some(snapshot) =
            PricingSnapshotRepository::new(&conn).find_snapshot(model_id, marketplace, variant_key)?
        else {
            return Ok(None);
        };

        let current = ShippingRepository::new(&conn).current_version()?.ok_or_else(|| {
            ApiError::ConfigurationError(ConfigError::MissingShippingDefaults)
        })?;
        Ok(Some(is_snapshot_stale(&snapshot, current)))
    }
}
