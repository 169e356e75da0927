// ==========================================
// 罩套定价系统 - 运费配置数据仓储
// ==========================================
// 表: shipping_default_setting / shipping_rate_card / shipping_rate_tier
//     shipping_zone_rate / marketplace_shipping_profile
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::shipping::{
    MarketplaceShippingProfile, ShippingDefaultSetting, ShippingRateTier, ShippingZoneRate,
};
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::{
    format_datetime, parse_datetime, parse_enum, parse_optional_datetime,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

// ==========================================
// ShippingRepository - 运费配置仓储
// ==========================================
pub struct ShippingRepository<'c> {
    conn: &'c Connection,
}

fn map_tier(row: &Row<'_>) -> rusqlite::Result<ShippingRateTier> {
    Ok(ShippingRateTier {
        id: row.get(0)?,
        rate_card_id: row.get(1)?,
        max_oz: row.get(2)?,
        label: row.get(3)?,
    })
}

impl<'c> ShippingRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ==========================================
    // 全局运费设置
    // ==========================================

    pub fn get_defaults(&self) -> RepositoryResult<Option<ShippingDefaultSetting>> {
        let setting = self
            .conn
            .query_row(
                r#"
                SELECT shipping_mode, flat_shipping_cents, default_zone,
                       assumed_rate_card_id, assumed_tier_id, assumed_zone,
                       shipping_settings_version
                FROM shipping_default_setting
                WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(ShippingDefaultSetting {
                        shipping_mode: parse_enum(0, &row.get::<_, String>(0)?)?,
                        flat_shipping_cents: row.get(1)?,
                        default_zone: row.get(2)?,
                        assumed_rate_card_id: row.get(3)?,
                        assumed_tier_id: row.get(4)?,
                        assumed_zone: row.get(5)?,
                        shipping_settings_version: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(setting)
    }

    /// 当前运费配置版本（未配置时为 None）
    pub fn current_version(&self) -> RepositoryResult<Option<i64>> {
        let version = self
            .conn
            .query_row(
                "SELECT shipping_settings_version FROM shipping_default_setting WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    /// 保存全局运费设置
    ///
    /// 忽略入参中的 shipping_settings_version：
    /// 首次写入为 1，之后每次保存 +1。返回保存后的版本号。
    pub fn save_defaults(&self, setting: &ShippingDefaultSetting) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO shipping_default_setting (
                id, shipping_mode, flat_shipping_cents, default_zone,
                assumed_rate_card_id, assumed_tier_id, assumed_zone,
                shipping_settings_version
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, 1)
            ON CONFLICT(id) DO UPDATE SET
                shipping_mode = excluded.shipping_mode,
                flat_shipping_cents = excluded.flat_shipping_cents,
                default_zone = excluded.default_zone,
                assumed_rate_card_id = excluded.assumed_rate_card_id,
                assumed_tier_id = excluded.assumed_tier_id,
                assumed_zone = excluded.assumed_zone,
                shipping_settings_version = shipping_settings_version + 1
            "#,
            params![
                setting.shipping_mode.as_str(),
                setting.flat_shipping_cents,
                setting.default_zone,
                setting.assumed_rate_card_id,
                setting.assumed_tier_id,
                setting.assumed_zone,
            ],
        )?;

        self.conn
            .query_row(
                "SELECT shipping_settings_version FROM shipping_default_setting WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// 运费卡/档位/档案变更后递增版本号（未配置全局设置时不做任何事）
    pub fn bump_version(&self) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE shipping_default_setting SET shipping_settings_version = shipping_settings_version + 1 WHERE id = 1",
            [],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 运费卡 / 档位 / 分区费率
    // ==========================================

    pub fn insert_rate_card(&self, name: &str) -> RepositoryResult<i64> {
        self.conn
            .execute("INSERT INTO shipping_rate_card (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_tier(
        &self,
        rate_card_id: i64,
        max_oz: f64,
        label: Option<&str>,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO shipping_rate_tier (rate_card_id, max_oz, label) VALUES (?1, ?2, ?3)",
            params![rate_card_id, max_oz, label],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 写入分区费率（同档位同分区覆盖）
    pub fn upsert_zone_rate(&self, tier_id: i64, zone: &str, rate_cents: i64) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO shipping_zone_rate (tier_id, zone, rate_cents)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(tier_id, zone) DO UPDATE SET rate_cents = excluded.rate_cents
            "#,
            params![tier_id, zone, rate_cents],
        )?;
        Ok(())
    }

    pub fn find_tier(&self, tier_id: i64) -> RepositoryResult<Option<ShippingRateTier>> {
        let tier = self
            .conn
            .query_row(
                "SELECT id, rate_card_id, max_oz, label FROM shipping_rate_tier WHERE id = ?1",
                params![tier_id],
                map_tier,
            )
            .optional()?;
        Ok(tier)
    }

    /// 查找覆盖该重量的最小档位
    ///
    /// 排序 (max_oz ASC, id ASC) 保证同上限档位的选择确定
    pub fn find_tier_for_weight(
        &self,
        rate_card_id: i64,
        weight_oz: f64,
    ) -> RepositoryResult<Option<ShippingRateTier>> {
        let tier = self
            .conn
            .query_row(
                r#"
                SELECT id, rate_card_id, max_oz, label
                FROM shipping_rate_tier
                WHERE rate_card_id = ?1 AND max_oz >= ?2
                ORDER BY max_oz ASC, id ASC
                LIMIT 1
                "#,
                params![rate_card_id, weight_oz],
                map_tier,
            )
            .optional()?;
        Ok(tier)
    }

    pub fn find_zone_rate(&self, tier_id: i64, zone: &str) -> RepositoryResult<Option<ShippingZoneRate>> {
        let rate = self
            .conn
            .query_row(
                r#"
                SELECT id, tier_id, zone, rate_cents
                FROM shipping_zone_rate
                WHERE tier_id = ?1 AND zone = ?2
                "#,
                params![tier_id, zone],
                |row| {
                    Ok(ShippingZoneRate {
                        id: row.get(0)?,
                        tier_id: row.get(1)?,
                        zone: row.get(2)?,
                        rate_cents: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(rate)
    }

    // ==========================================
    // 平台运费档案（时间生效）
    // ==========================================

    pub fn find_profiles(&self, marketplace: &str) -> RepositoryResult<Vec<MarketplaceShippingProfile>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, marketplace, rate_card_id, pricing_zone, effective_date, end_date
            FROM marketplace_shipping_profile
            WHERE marketplace = ?1
            ORDER BY effective_date DESC, id DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![marketplace], |row| {
                Ok(MarketplaceShippingProfile {
                    id: row.get(0)?,
                    marketplace: row.get(1)?,
                    rate_card_id: row.get(2)?,
                    pricing_zone: row.get(3)?,
                    effective_date: parse_datetime(4, &row.get::<_, String>(4)?)?,
                    end_date: parse_optional_datetime(5, row.get(5)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// 绑定平台运费档案，结束该平台当前未结束的档案
    pub fn bind_profile(
        &self,
        marketplace: &str,
        rate_card_id: i64,
        pricing_zone: Option<&str>,
        effective_date: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let effective = format_datetime(&effective_date);

        self.conn.execute(
            r#"
            UPDATE marketplace_shipping_profile
            SET end_date = ?1
            WHERE marketplace = ?2 AND end_date IS NULL
            "#,
            params![effective, marketplace],
        )?;

        self.conn.execute(
            r#"
            INSERT INTO marketplace_shipping_profile (
                marketplace, rate_card_id, pricing_zone, effective_date, end_date
            ) VALUES (?1, ?2, ?3, ?4, NULL)
            "#,
            params![marketplace, rate_card_id, pricing_zone, effective],
        )?;

        Ok(self.conn.last_insert_rowid())
    }
}
