// ==========================================
// 罩套定价系统 - 定价编排引擎
// ==========================================
// 流程: 加载上下文(一次) → 对 4 个变体按固定顺序:
//       成本组合 → 价格推导 → 持久化(各自的工作单元)
// 失败隔离:
// - 配置错误只影响所在变体，其余变体照常计算并落库
// - 数据库错误中止整个调用
// 批量重算: 每个 (型号, 平台) 在独立工作单元中执行，失败汇总到报告
// ==========================================

use crate::config::EngineConfig;
use crate::domain::pricing::PricingBreakdown;
use crate::domain::types::VariantKey;
use crate::engine::clock::Clock;
use crate::engine::context::PricingContext;
use crate::engine::error::{FailureReason, PricingError, PricingResult, VariantFailure};
use crate::engine::persister::{PersistOutcome, SnapshotPersister};
use crate::engine::price_deriver::{derive_price, DerivedPrice};
use crate::engine::shipping_resolver::ShippingCostResolver;
use crate::engine::unit_of_work::run_in_unit;
use crate::engine::variant_cost::{compose_variant_cost, VariantCost};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 结果类型
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOutcome {
    pub variant_key: VariantKey,
    pub breakdown: PricingBreakdown,
    pub outcome: PersistOutcome,
}

/// 单次计算调用的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub model_id: i64,
    pub marketplace: String,
    pub run_id: String,
    pub calculated_at: NaiveDateTime,
    pub variants: Vec<VariantOutcome>,
}

impl CalculationSummary {
    pub fn changed_count(&self) -> usize {
        self.variants.iter().filter(|v| v.outcome.wrote_history()).count()
    }
}

/// 批量重算中的一条失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalcFailure {
    pub model_id: i64,
    pub marketplace: String,
    pub variant_key: Option<VariantKey>,
    pub reason: FailureReason,
}

/// 批量重算报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalcReport {
    pub run_id: String,
    pub pairs_total: usize,
    pub pairs_succeeded: usize,
    pub variants_changed: usize,
    pub variants_unchanged: usize,
    pub failures: Vec<RecalcFailure>,
}

impl RecalcReport {
    fn record_variants(&mut self, variants: &[VariantOutcome]) {
        for v in variants {
            if v.outcome.wrote_history() {
                self.variants_changed += 1;
            } else {
                self.variants_unchanged += 1;
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

// ==========================================
// PricingEngine - 定价编排引擎
// ==========================================
pub struct PricingEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl PricingEngine {
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 计算某型号在某平台的全部变体价格（历史原因取配置默认值）
    pub fn calculate_model_prices(
        &self,
        conn: &Connection,
        model_id: i64,
        marketplace: &str,
    ) -> PricingResult<CalculationSummary> {
        let reason = self.config.history_reason.clone();
        self.calculate_with_reason(conn, model_id, marketplace, &reason)
    }

    /// 计算某型号在某平台的全部变体价格
    ///
    /// # 返回
    /// - Ok: 4 个变体全部成功
    /// - Err(VariantFailures): 部分或全部变体失败（成功的变体已落库）
    /// - Err(Repository): 数据库错误
    pub fn calculate_with_reason(
        &self,
        conn: &Connection,
        model_id: i64,
        marketplace: &str,
        reason: &str,
    ) -> PricingResult<CalculationSummary> {
        let run_id = Uuid::new_v4().to_string();
        self.run(conn, model_id, marketplace, reason, &run_id)
    }

    #[instrument(skip(self, conn, reason), fields(run_id = %run_id))]
    fn run(
        &self,
        conn: &Connection,
        model_id: i64,
        marketplace: &str,
        reason: &str,
        run_id: &str,
    ) -> PricingResult<CalculationSummary> {
        let now = self.clock.now();

        let ctx = match PricingContext::load(conn, model_id, marketplace, now, &self.config) {
            Ok(ctx) => ctx,
            Err(PricingError::Config(e)) => {
                warn!(model_id, marketplace, error = %e, "定价配置缺失，全部变体失败");
                return Err(PricingError::VariantFailures {
                    model_id,
                    marketplace: marketplace.to_string(),
                    succeeded: Vec::new(),
                    failures: VariantKey::ALL
                        .iter()
                        .map(|&variant_key| VariantFailure {
                            variant_key,
                            reason: FailureReason::Config(e.clone()),
                        })
                        .collect(),
                });
            }
            Err(other) => return Err(other),
        };

        let shipping = ShippingCostResolver::new(conn);
        let mut variants = Vec::with_capacity(VariantKey::ALL.len());
        let mut failures = Vec::new();

        for variant_key in VariantKey::ALL {
            let breakdown = match self.price_variant(&ctx, variant_key, &shipping) {
                Ok(breakdown) => breakdown,
                Err(PricingError::Config(e)) => {
                    warn!(variant_key = %variant_key, error = %e, "变体定价失败");
                    failures.push(VariantFailure {
                        variant_key,
                        reason: FailureReason::Config(e),
                    });
                    continue;
                }
                Err(other) => return Err(other),
            };

            let outcome = run_in_unit(conn, |c| {
                SnapshotPersister::new(c, self.config.float_epsilon).persist(
                    model_id,
                    marketplace,
                    variant_key,
                    &breakdown,
                    now,
                    reason,
                    Some(run_id),
                )
            })?;

            variants.push(VariantOutcome {
                variant_key,
                breakdown,
                outcome,
            });
        }

        info!(
            model_id,
            marketplace,
            succeeded = variants.len(),
            failed = failures.len(),
            "型号定价完成"
        );

        if !failures.is_empty() {
            return Err(PricingError::VariantFailures {
                model_id,
                marketplace: marketplace.to_string(),
                succeeded: variants,
                failures,
            });
        }

        Ok(CalculationSummary {
            model_id,
            marketplace: marketplace.to_string(),
            run_id: run_id.to_string(),
            calculated_at: now,
            variants,
        })
    }

    /// 成本组合 + 价格推导，得到完整定价拆解
    fn price_variant(
        &self,
        ctx: &PricingContext,
        variant_key: VariantKey,
        shipping: &ShippingCostResolver<'_>,
    ) -> PricingResult<PricingBreakdown> {
        let cost = compose_variant_cost(ctx, variant_key, shipping)?;
        let profit_cents = ctx.profit_cents(variant_key)?;
        let price = derive_price(cost.raw_cost_cents, profit_cents, ctx.fee_rate)?;

        Ok(build_breakdown(ctx, &cost, &price))
    }

    /// 批量重算
    ///
    /// 每个 (型号, 平台) 在独立工作单元内执行；
    /// 数据库错误只回滚该单元并记入报告，不影响其他单元
    #[instrument(skip(self, conn, model_ids, marketplaces), fields(models = model_ids.len(), marketplaces = marketplaces.len()))]
    pub fn recalculate(
        &self,
        conn: &Connection,
        model_ids: &[i64],
        marketplaces: &[String],
    ) -> RecalcReport {
        let run_id = Uuid::new_v4().to_string();
        let reason = self.config.history_reason.clone();
        let mut report = RecalcReport {
            run_id: run_id.clone(),
            ..RecalcReport::default()
        };

        for &model_id in model_ids {
            for marketplace in marketplaces {
                report.pairs_total += 1;

                // 变体级失败不回滚该单元，已成功的变体保留
                let result = run_in_unit(conn, |c| {
                    match self.run(c, model_id, marketplace, &reason, &run_id) {
                        Err(PricingError::Repository(e)) => Err(e),
                        other => Ok(other),
                    }
                });

                match result {
                    Ok(Ok(summary)) => {
                        report.pairs_succeeded += 1;
                        report.record_variants(&summary.variants);
                    }
                    Ok(Err(PricingError::VariantFailures {
                        succeeded, failures, ..
                    })) => {
                        report.record_variants(&succeeded);
                        report.failures.extend(failures.into_iter().map(|f| RecalcFailure {
                            model_id,
                            marketplace: marketplace.clone(),
                            variant_key: Some(f.variant_key),
                            reason: f.reason,
                        }));
                    }
                    Ok(Err(other)) => report.failures.push(RecalcFailure {
                        model_id,
                        marketplace: marketplace.clone(),
                        variant_key: None,
                        reason: other.into(),
                    }),
                    Err(e) => {
                        warn!(model_id, marketplace = %marketplace, error = %e, "重算单元回滚");
                        report.failures.push(RecalcFailure {
                            model_id,
                            marketplace: marketplace.clone(),
                            variant_key: None,
                            reason: FailureReason::Storage(e.to_string()),
                        });
                    }
                }
            }
        }

        info!(
            pairs_total = report.pairs_total,
            pairs_succeeded = report.pairs_succeeded,
            variants_changed = report.variants_changed,
            failures = report.failures.len(),
            "批量重算完成"
        );
        report
    }
}

fn build_breakdown(ctx: &PricingContext, cost: &VariantCost, price: &DerivedPrice) -> PricingBreakdown {
    PricingBreakdown {
        raw_cost_cents: cost.raw_cost_cents,
        base_cost_cents: price.base_cost_cents,
        retail_price_cents: price.retail_price_cents,
        marketplace_fee_cents: price.marketplace_fee_cents,
        profit_cents: price.profit_cents,
        material_cost_cents: cost.material_cost_cents,
        labor_cost_cents: cost.labor_cost_cents,
        shipping_cost_cents: cost.shipping_cost_cents,
        weight_oz: cost.weight_oz,
        surface_area_sq_in: ctx.surface_area_sq_in,
        material_cost_per_sq_in_cents: cost.material_cost_per_sq_in_cents,
        weight_per_sq_in_oz: cost.weight_per_sq_in_oz,
        labor_minutes: cost.labor_minutes,
        labor_rate_cents_per_hour: cost.labor_rate_cents_per_hour,
        marketplace_fee_rate: ctx.fee_rate,
        shipping_settings_version: ctx.shipping_settings_version(),
    }
}
