// ==========================================
// 罩套定价系统 - 价格快照/审计历史数据仓储
// ==========================================
// 表: model_pricing_snapshot (当前态, 唯一键 model+marketplace+variant)
//     model_pricing_history (只追加)
// 红线: 历史表只 INSERT，不 UPDATE / DELETE
// ==========================================

use crate::domain::pricing::{ModelPricingHistory, ModelPricingSnapshot, PricingBreakdown};
use crate::domain::types::VariantKey;
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::{format_datetime, parse_datetime, parse_enum};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

/// 定价拆解列（快照与历史共用，顺序与 map_breakdown 对齐）
const BREAKDOWN_COLUMNS: &str = "raw_cost_cents, base_cost_cents, retail_price_cents, \
    marketplace_fee_cents, profit_cents, material_cost_cents, labor_cost_cents, \
    shipping_cost_cents, weight_oz, surface_area_sq_in, material_cost_per_sq_in_cents, \
    weight_per_sq_in_oz, labor_minutes, labor_rate_cents_per_hour, marketplace_fee_rate, \
    shipping_settings_version";

const BREAKDOWN_COLUMN_COUNT: usize = 16;

/// 从 offset 开始读取 16 列定价拆解
fn map_breakdown(row: &Row<'_>, offset: usize) -> rusqlite::Result<PricingBreakdown> {
    Ok(PricingBreakdown {
        raw_cost_cents: row.get(offset)?,
        base_cost_cents: row.get(offset + 1)?,
        retail_price_cents: row.get(offset + 2)?,
        marketplace_fee_cents: row.get(offset + 3)?,
        profit_cents: row.get(offset + 4)?,
        material_cost_cents: row.get(offset + 5)?,
        labor_cost_cents: row.get(offset + 6)?,
        shipping_cost_cents: row.get(offset + 7)?,
        weight_oz: row.get(offset + 8)?,
        surface_area_sq_in: row.get(offset + 9)?,
        material_cost_per_sq_in_cents: row.get(offset + 10)?,
        weight_per_sq_in_oz: row.get(offset + 11)?,
        labor_minutes: row.get(offset + 12)?,
        labor_rate_cents_per_hour: row.get(offset + 13)?,
        marketplace_fee_rate: row.get(offset + 14)?,
        shipping_settings_version: row.get(offset + 15)?,
    })
}

fn breakdown_params(b: &PricingBreakdown) -> Vec<&dyn ToSql> {
    vec![
        &b.raw_cost_cents,
        &b.base_cost_cents,
        &b.retail_price_cents,
        &b.marketplace_fee_cents,
        &b.profit_cents,
        &b.material_cost_cents,
        &b.labor_cost_cents,
        &b.shipping_cost_cents,
        &b.weight_oz,
        &b.surface_area_sq_in,
        &b.material_cost_per_sq_in_cents,
        &b.weight_per_sq_in_oz,
        &b.labor_minutes,
        &b.labor_rate_cents_per_hour,
        &b.marketplace_fee_rate,
        &b.shipping_settings_version,
    ]
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_snapshot(row: &Row<'_>) -> rusqlite::Result<ModelPricingSnapshot> {
    let calc_idx = 4 + BREAKDOWN_COLUMN_COUNT;
    Ok(ModelPricingSnapshot {
        id: row.get(0)?,
        model_id: row.get(1)?,
        marketplace: row.get(2)?,
        variant_key: parse_enum(3, &row.get::<_, String>(3)?)?,
        breakdown: map_breakdown(row, 4)?,
        calculated_at: parse_datetime(calc_idx, &row.get::<_, String>(calc_idx)?)?,
    })
}

fn map_history(row: &Row<'_>) -> rusqlite::Result<ModelPricingHistory> {
    let calc_idx = 4 + BREAKDOWN_COLUMN_COUNT;
    Ok(ModelPricingHistory {
        id: row.get(0)?,
        model_id: row.get(1)?,
        marketplace: row.get(2)?,
        variant_key: parse_enum(3, &row.get::<_, String>(3)?)?,
        breakdown: map_breakdown(row, 4)?,
        calculated_at: parse_datetime(calc_idx, &row.get::<_, String>(calc_idx)?)?,
        reason: row.get(calc_idx + 1)?,
        run_id: row.get(calc_idx + 2)?,
    })
}

// ==========================================
// PricingSnapshotRepository - 价格快照/历史仓储
// ==========================================
pub struct PricingSnapshotRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PricingSnapshotRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ==========================================
    // 快照
    // ==========================================

    pub fn find_snapshot(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
    ) -> RepositoryResult<Option<ModelPricingSnapshot>> {
        let sql = format!(
            r#"
            SELECT id, model_id, marketplace, variant_key, {}, calculated_at
            FROM model_pricing_snapshot
            WHERE model_id = ?1 AND marketplace = ?2 AND variant_key = ?3
            "#,
            BREAKDOWN_COLUMNS
        );

        let snapshot = self
            .conn
            .query_row(
                &sql,
                params![model_id, marketplace, variant_key.as_str()],
                map_snapshot,
            )
            .optional()?;
        Ok(snapshot)
    }

    /// 某型号在某平台的全部变体快照
    pub fn find_snapshots_for_model(
        &self,
        model_id: i64,
        marketplace: &str,
    ) -> RepositoryResult<Vec<ModelPricingSnapshot>> {
        let sql = format!(
            r#"
            SELECT id, model_id, marketplace, variant_key, {}, calculated_at
            FROM model_pricing_snapshot
            WHERE model_id = ?1 AND marketplace = ?2
            ORDER BY variant_key
            "#,
            BREAKDOWN_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![model_id, marketplace], map_snapshot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn insert_snapshot(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
        breakdown: &PricingBreakdown,
        calculated_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let variant = variant_key.as_str();
        let ts = format_datetime(&calculated_at);

        let mut values: Vec<&dyn ToSql> = vec![&model_id, &marketplace, &variant];
        values.extend(breakdown_params(breakdown));
        values.push(&ts);

        let sql = format!(
            "INSERT INTO model_pricing_snapshot (model_id, marketplace, variant_key, {}, calculated_at) VALUES ({})",
            BREAKDOWN_COLUMNS,
            placeholders(values.len())
        );
        self.conn.execute(&sql, values.as_slice())?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_snapshot(
        &self,
        snapshot_id: i64,
        breakdown: &PricingBreakdown,
        calculated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let ts = format_datetime(&calculated_at);

        let assignments = BREAKDOWN_COLUMNS
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let mut values = breakdown_params(breakdown);
        values.push(&ts);
        values.push(&snapshot_id);

        let sql = format!(
            "UPDATE model_pricing_snapshot SET {}, calculated_at = ?{} WHERE id = ?{}",
            assignments,
            BREAKDOWN_COLUMN_COUNT + 1,
            BREAKDOWN_COLUMN_COUNT + 2
        );
        let rows = self.conn.execute(&sql, values.as_slice())?;
        Ok(rows)
    }

    // ==========================================
    // 审计历史
    // ==========================================

    #[allow(clippy::too_many_arguments)]
    pub fn insert_history(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
        breakdown: &PricingBreakdown,
        calculated_at: NaiveDateTime,
        reason: &str,
        run_id: Option<&str>,
    ) -> RepositoryResult<i64> {
        let variant = variant_key.as_str();
        let ts = format_datetime(&calculated_at);

        let mut values: Vec<&dyn ToSql> = vec![&model_id, &marketplace, &variant];
        values.extend(breakdown_params(breakdown));
        values.push(&ts);
        values.push(&reason);
        values.push(&run_id);

        let sql = format!(
            "INSERT INTO model_pricing_history (model_id, marketplace, variant_key, {}, calculated_at, reason, run_id) VALUES ({})",
            BREAKDOWN_COLUMNS,
            placeholders(values.len())
        );
        self.conn.execute(&sql, values.as_slice())?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 最近的历史行（calculated_at 倒序，同时间按 id 倒序）
    pub fn find_recent_history(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
        limit: usize,
    ) -> RepositoryResult<Vec<ModelPricingHistory>> {
        let sql = format!(
            r#"
            SELECT id, model_id, marketplace, variant_key, {}, calculated_at, reason, run_id
            FROM model_pricing_history
            WHERE model_id = ?1 AND marketplace = ?2 AND variant_key = ?3
            ORDER BY calculated_at DESC, id DESC
            LIMIT ?4
            "#,
            BREAKDOWN_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![model_id, marketplace, variant_key.as_str(), limit as i64],
                map_history,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_history(
        &self,
        model_id: i64,
        marketplace: &str,
        variant_key: VariantKey,
    ) -> RepositoryResult<i64> {
        let count = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM model_pricing_history
            WHERE model_id = ?1 AND marketplace = ?2 AND variant_key = ?3
            "#,
            params![model_id, marketplace, variant_key.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
