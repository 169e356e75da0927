// ==========================================
// 罩套定价系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表（定价配置表 + 快照/审计表）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（微秒精度，字符串比较与时间顺序一致）
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 配置表由设置子系统维护，本引擎只读；
/// model_pricing_snapshot / model_pricing_history 由引擎写入。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS model (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            width_in REAL,
            depth_in REAL,
            height_in REAL,
            surface_area_sq_in REAL
        );

        CREATE TABLE IF NOT EXISTS material (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            linear_yard_width_in REAL,
            weight_per_sq_in_oz REAL
        );

        CREATE TABLE IF NOT EXISTS supplier (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS material_supplier (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            material_id INTEGER NOT NULL REFERENCES material(id) ON DELETE CASCADE,
            supplier_id INTEGER NOT NULL REFERENCES supplier(id) ON DELETE CASCADE,
            unit_cost_dollars REAL NOT NULL,
            is_preferred INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS material_role_assignment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            role TEXT NOT NULL,
            material_id INTEGER NOT NULL REFERENCES material(id),
            effective_date TEXT NOT NULL,
            end_date TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_role_assignment_role
            ON material_role_assignment(role, effective_date);

        CREATE TABLE IF NOT EXISTS shipping_rate_card (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shipping_rate_tier (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rate_card_id INTEGER NOT NULL REFERENCES shipping_rate_card(id) ON DELETE CASCADE,
            max_oz REAL NOT NULL,
            label TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_rate_tier_card
            ON shipping_rate_tier(rate_card_id, max_oz);

        CREATE TABLE IF NOT EXISTS shipping_zone_rate (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tier_id INTEGER NOT NULL REFERENCES shipping_rate_tier(id) ON DELETE CASCADE,
            zone TEXT NOT NULL,
            rate_cents INTEGER NOT NULL,
            UNIQUE(tier_id, zone)
        );

        CREATE TABLE IF NOT EXISTS shipping_default_setting (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            shipping_mode TEXT NOT NULL,
            flat_shipping_cents INTEGER NOT NULL DEFAULT 0,
            default_zone TEXT,
            assumed_rate_card_id INTEGER REFERENCES shipping_rate_card(id),
            assumed_tier_id INTEGER REFERENCES shipping_rate_tier(id),
            assumed_zone TEXT,
            shipping_settings_version INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS marketplace_shipping_profile (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            marketplace TEXT NOT NULL,
            rate_card_id INTEGER NOT NULL REFERENCES shipping_rate_card(id),
            pricing_zone TEXT,
            effective_date TEXT NOT NULL,
            end_date TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_shipping_profile_marketplace
            ON marketplace_shipping_profile(marketplace, effective_date);

        CREATE TABLE IF NOT EXISTS labor_setting (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            hourly_rate_cents INTEGER NOT NULL,
            minutes_no_padding INTEGER NOT NULL,
            minutes_with_padding INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS marketplace_fee_rate (
            marketplace TEXT PRIMARY KEY,
            fee_rate REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS variant_profit_setting (
            variant_key TEXT PRIMARY KEY,
            profit_cents INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS model_pricing_snapshot (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_id INTEGER NOT NULL REFERENCES model(id) ON DELETE CASCADE,
            marketplace TEXT NOT NULL,
            variant_key TEXT NOT NULL,
            raw_cost_cents INTEGER NOT NULL,
            base_cost_cents INTEGER NOT NULL,
            retail_price_cents INTEGER NOT NULL,
            marketplace_fee_cents INTEGER NOT NULL,
            profit_cents INTEGER NOT NULL,
            material_cost_cents INTEGER NOT NULL,
            labor_cost_cents INTEGER NOT NULL,
            shipping_cost_cents INTEGER NOT NULL,
            weight_oz REAL NOT NULL,
            surface_area_sq_in REAL NOT NULL,
            material_cost_per_sq_in_cents REAL NOT NULL,
            weight_per_sq_in_oz REAL NOT NULL,
            labor_minutes INTEGER NOT NULL,
            labor_rate_cents_per_hour INTEGER NOT NULL,
            marketplace_fee_rate REAL NOT NULL,
            shipping_settings_version INTEGER NOT NULL,
            calculated_at TEXT NOT NULL,
            UNIQUE(model_id, marketplace, variant_key)
        );

        CREATE TABLE IF NOT EXISTS model_pricing_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_id INTEGER NOT NULL REFERENCES model(id) ON DELETE CASCADE,
            marketplace TEXT NOT NULL,
            variant_key TEXT NOT NULL,
            raw_cost_cents INTEGER NOT NULL,
            base_cost_cents INTEGER NOT NULL,
            retail_price_cents INTEGER NOT NULL,
            marketplace_fee_cents INTEGER NOT NULL,
            profit_cents INTEGER NOT NULL,
            material_cost_cents INTEGER NOT NULL,
            labor_cost_cents INTEGER NOT NULL,
            shipping_cost_cents INTEGER NOT NULL,
            weight_oz REAL NOT NULL,
            surface_area_sq_in REAL NOT NULL,
            material_cost_per_sq_in_cents REAL NOT NULL,
            weight_per_sq_in_oz REAL NOT NULL,
            labor_minutes INTEGER NOT NULL,
            labor_rate_cents_per_hour INTEGER NOT NULL,
            marketplace_fee_rate REAL NOT NULL,
            shipping_settings_version INTEGER NOT NULL,
            calculated_at TEXT NOT NULL,
            reason TEXT NOT NULL,
            run_id TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_pricing_history_key
            ON model_pricing_history(model_id, marketplace, variant_key, calculated_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
