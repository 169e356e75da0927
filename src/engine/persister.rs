// ==========================================
// 罩套定价系统 - 快照/历史持久化
// ==========================================
// 唯一键: (model_id, marketplace, variant_key)
// - 无快照:   插入快照 + 追加一条历史
// - 有差异:   更新快照(含 calculated_at) + 追加一条历史
// - 无差异:   不写任何数据（calculated_at 保持不变）
// 差异判定: 整数/版本号精确比较，浮点字段使用容差
// ==========================================

use crate::domain::pricing::{ModelPricingSnapshot, PricingBreakdown};
use crate::domain::types::VariantKey;
use crate::repository::error::RepositoryResult;
use crate::repository::PricingSnapshotRepository;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 持久化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistOutcome {
    Created { snapshot_id: i64, history_id: i64 },
    Updated { snapshot_id: i64, history_id: i64 },
    Unchanged { snapshot_id: i64 },
}

impl PersistOutcome {
    pub fn wrote_history(&self) -> bool {
        !matches!(self, PersistOutcome::Unchanged { .. })
    }
}

fn float_differs(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() > epsilon
}

/// 两份定价拆解是否存在持久化层面的差异
pub fn breakdown_changed(old: &PricingBreakdown, new: &PricingBreakdown, epsilon: f64) -> bool {
    let ints_differ = old.raw_cost_cents != new.raw_cost_cents
        || old.base_cost_cents != new.base_cost_cents
        || old.retail_price_cents != new.retail_price_cents
        || old.marketplace_fee_cents != new.marketplace_fee_cents
        || old.profit_cents != new.profit_cents
        || old.material_cost_cents != new.material_cost_cents
        || old.labor_cost_cents != new.labor_cost_cents
        || old.shipping_cost_cents != new.shipping_cost_cents
        || old.labor_minutes != new.labor_minutes
        || old.labor_rate_cents_per_hour != new.labor_rate_cents_per_hour
        || old.shipping_settings_version != new.shipping_settings_version;

    ints_differ
        || float_differs(old.weight_oz, new.weight_oz, epsilon)
        || float_differs(old.surface_area_sq_in, new.surface_area_sq_in, epsilon)
        || float_differs(
            old.material_cost_per_sq_in_cents,
            new.material_cost_per_sq_in_cents,
            epsilon,
        )
        || float_differs(old.weight_per_sq_in_oz, new.weight_per_sq_in_oz, epsilon)
        || float_differs(old.marketplace_fee_rate, new.marketplace_fee_rate, epsilon)
}

/// 快照是否基于过期的运费配置计算
pub fn is_snapshot_stale(snapshot: &ModelPricingSnapshot, current_shipping_version: i64) -> bool {
    snapshot.breakdown.shipping_settings_version != current_shipping_version
}

// ==========================================
// SnapshotPersister
// ==========================================
pub struct SnapshotPersister<'c> {
    repo: PricingSnapshotRepository<'c>,
    epsilon: f64,
}

impl<'c> SnapshotPersister<'c> {
    pub fn new(conn: &'c Connection, epsilon: f64) -> Self {
        Self {
            repo: PricingSnapshotRepository::new(conn),
            epsilon,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn persist(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
        breakdown: &PricingBreakdown,
        now: NaiveDateTime,
        reason: &str,
        run_id: Option<&str>,
    ) -> RepositoryResult<PersistOutcome> {
        let existing = self.repo.find_snapshot(model_id, marketplace, variant_key)?;

        let outcome = match existing {
            None => {
                let snapshot_id =
                    self.repo
                        .insert_snapshot(model_id, marketplace, variant_key, breakdown, now)?;
                let history_id = self.repo.insert_history(
                    model_id, marketplace, variant_key, breakdown, now, reason, run_id,
                )?;
                PersistOutcome::Created {
                    snapshot_id,
                    history_id,
                }
            }
            Some(snapshot) if breakdown_changed(&snapshot.breakdown, breakdown, self.epsilon) => {
                self.repo.update_snapshot(snapshot.id, breakdown, now)?;
                let history_id = self.repo.insert_history(
                    model_id, marketplace, variant_key, breakdown, now, reason, run_id,
                )?;
                PersistOutcome::Updated {
                    snapshot_id: snapshot.id,
                    history_id,
                }
            }
            Some(snapshot) => PersistOutcome::Unchanged {
                snapshot_id: snapshot.id,
            },
        };

        debug!(
            model_id = model_id,
            marketplace = marketplace,
            variant_key = %variant_key,
            outcome = ?outcome,
            "快照持久化完成"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO model (id, name, surface_area_sq_in) VALUES (1, 'piano cover', 200.0)",
            [],
        )
        .unwrap();
        conn
    }

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn breakdown() -> PricingBreakdown {
        PricingBreakdown {
            raw_cost_cents: 1442,
            base_cost_cents: 2095,
            retail_price_cents: 4095,
            marketplace_fee_cents: 614,
            profit_cents: 2000,
            material_cost_cents: 300,
            labor_cost_cents: 992,
            shipping_cost_cents: 150,
            weight_oz: 4.0,
            surface_area_sq_in: 200.0,
            material_cost_per_sq_in_cents: 1.5,
            weight_per_sq_in_oz: 0.02,
            labor_minutes: 35,
            labor_rate_cents_per_hour: 1700,
            marketplace_fee_rate: 0.15,
            shipping_settings_version: 1,
        }
    }

    #[test]
    fn test_breakdown_changed_epsilon() {
        let a = breakdown();
        let mut b = breakdown();
        b.weight_oz += 0.00005;
        assert!(!breakdown_changed(&a, &b, 1e-4));

        b.weight_oz += 0.001;
        assert!(breakdown_changed(&a, &b, 1e-4));

        let mut c = breakdown();
        c.shipping_settings_version = 2;
        assert!(breakdown_changed(&a, &c, 1e-4));
    }

    #[test]
    fn test_persist_create_unchanged_update() {
        let conn = setup_test_db();
        let persister = SnapshotPersister::new(&conn, 1e-4);
        let repo = PricingSnapshotRepository::new(&conn);
        let key = VariantKey::ChoiceNoPadding;

        let first = persister
            .persist(1, "etsy", key, &breakdown(), t0(), "recalculate", Some("run-1"))
            .unwrap();
        assert!(matches!(first, PersistOutcome::Created { .. }));

        let second = persister
            .persist(1, "etsy", key, &breakdown(), t0() + Duration::hours(1), "recalculate", None)
            .unwrap();
        assert!(!second.wrote_history());
        let snapshot = repo.find_snapshot(1, "etsy", key).unwrap().unwrap();
        assert_eq!(snapshot.calculated_at, t0());

        let mut changed = breakdown();
        changed.labor_cost_cents = 1000;
        let third = persister
            .persist(1, "etsy", key, &changed, t0() + Duration::hours(2), "labor", None)
            .unwrap();
        assert!(matches!(third, PersistOutcome::Updated { .. }));

        let snapshot = repo.find_snapshot(1, "etsy", key).unwrap().unwrap();
        assert_eq!(snapshot.breakdown.labor_cost_cents, 1000);
        assert_eq!(snapshot.calculated_at, t0() + Duration::hours(2));
        assert_eq!(repo.count_history(1, "etsy", key).unwrap(), 2);
    }

    #[test]
    fn test_staleness_by_shipping_version() {
        let snapshot = ModelPricingSnapshot {
            id: 1,
            model_id: 1,
            marketplace: "etsy".to_string(),
            variant_key: VariantKey::ChoicePadded,
            breakdown: breakdown(),
            calculated_at: t0(),
        };
        assert!(!is_snapshot_stale(&snapshot, 1));
        assert!(is_snapshot_stale(&snapshot, 2));
    }
}
