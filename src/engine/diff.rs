// ==========================================
// 罩套定价系统 - 价格差异服务（只读）
// ==========================================
// 比较同一 (model, marketplace, variant) 最近两条历史
// 排序: calculated_at DESC, id DESC
// 不足两条 → None
// 只输出发生变化的字段，字段顺序固定
// ==========================================

use crate::domain::pricing::{FieldChange, ModelPricingHistory, PricingBreakdown, PricingDiff};
use crate::domain::types::{ChangeDirection, VariantKey};
use crate::repository::error::RepositoryResult;
use crate::repository::PricingSnapshotRepository;
use rusqlite::Connection;

type FieldReader = fn(&PricingBreakdown) -> f64;

/// 参与比较的字段（固定顺序）
pub const TRACKED_FIELDS: [(&str, FieldReader); 9] = [
    ("raw_cost_cents", |b| b.raw_cost_cents as f64),
    ("base_cost_cents", |b| b.base_cost_cents as f64),
    ("retail_price_cents", |b| b.retail_price_cents as f64),
    ("marketplace_fee_cents", |b| b.marketplace_fee_cents as f64),
    ("profit_cents", |b| b.profit_cents as f64),
    ("material_cost_cents", |b| b.material_cost_cents as f64),
    ("labor_cost_cents", |b| b.labor_cost_cents as f64),
    ("shipping_cost_cents", |b| b.shipping_cost_cents as f64),
    ("weight_oz", |b| b.weight_oz),
];

/// 逐字段比较两份定价拆解
///
/// # 参数
/// - older: 较早的拆解
/// - newer: 较新的拆解
/// - epsilon: 浮点容差（整数字段差值至少为 1，不受影响）
pub fn diff_breakdowns(
    older: &PricingBreakdown,
    newer: &PricingBreakdown,
    epsilon: f64,
) -> Vec<FieldChange> {
    TRACKED_FIELDS
        .iter()
        .filter_map(|(field, read)| {
            let old = read(older);
            let new = read(newer);
            let delta = new - old;
            if delta.abs() <= epsilon {
                return None;
            }
            Some(FieldChange {
                field: field.to_string(),
                old,
                new,
                delta,
                direction: if delta > 0.0 {
                    ChangeDirection::Increase
                } else {
                    ChangeDirection::Decrease
                },
            })
        })
        .collect()
}

// ==========================================
// DiffService
// ==========================================
pub struct DiffService<'c> {
    repo: PricingSnapshotRepository<'c>,
    epsilon: f64,
}

impl<'c> DiffService<'c> {
    pub fn new(conn: &'c Connection, epsilon: f64) -> Self {
        Self {
            repo: PricingSnapshotRepository::new(conn),
            epsilon,
        }
    }

    /// 最近两次计算之间的差异
    pub fn diff_latest(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
    ) -> RepositoryResult<Option<PricingDiff>> {
        let rows = self.repo.find_recent_history(model_id, marketplace, variant_key, 2)?;
        let [newer, older] = rows.as_slice() else {
            return Ok(None);
        };

        Ok(Some(PricingDiff {
            model_id,
            marketplace: marketplace.to_string(),
            variant_key,
            newer_history_id: newer.id,
            older_history_id: older.id,
            newer_calculated_at: newer.calculated_at,
            older_calculated_at: older.calculated_at,
            changes: diff_breakdowns(&older.breakdown, &newer.breakdown, self.epsilon),
        }))
    }

    /// 审计历史（最新在前）
    pub fn list_history(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
        limit: usize,
    ) -> RepositoryResult<Vec<ModelPricingHistory>> {
        self.repo.find_recent_history(model_id, marketplace, variant_key, limit)
    }
}
