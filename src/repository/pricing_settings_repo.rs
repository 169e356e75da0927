// ==========================================
// 罩套定价系统 - 定价设置数据仓储
// ==========================================
// 表: labor_setting / marketplace_fee_rate / variant_profit_setting
// ==========================================

use crate::domain::pricing::{LaborSetting, MarketplaceFeeRate, VariantProfitSetting};
use crate::domain::types::VariantKey;
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::parse_enum;
use rusqlite::{params, Connection, OptionalExtension};

// ==========================================
// PricingSettingsRepository - 定价设置仓储
// ==========================================
pub struct PricingSettingsRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PricingSettingsRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ===== 人工设置 =====

    pub fn get_labor(&self) -> RepositoryResult<Option<LaborSetting>> {
        let labor = self
            .conn
            .query_row(
                r#"
                SELECT hourly_rate_cents, minutes_no_padding, minutes_with_padding
                FROM labor_setting
                WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(LaborSetting {
                        hourly_rate_cents: row.get(0)?,
                        minutes_no_padding: row.get(1)?,
                        minutes_with_padding: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(labor)
    }

    pub fn save_labor(&self, labor: &LaborSetting) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO labor_setting (id, hourly_rate_cents, minutes_no_padding, minutes_with_padding)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                hourly_rate_cents = excluded.hourly_rate_cents,
                minutes_no_padding = excluded.minutes_no_padding,
                minutes_with_padding = excluded.minutes_with_padding
            "#,
            params![
                labor.hourly_rate_cents,
                labor.minutes_no_padding,
                labor.minutes_with_padding
            ],
        )?;
        Ok(())
    }

    // ===== 平台费率 =====

    pub fn get_fee_rate(&self, marketplace: &str) -> RepositoryResult<Option<MarketplaceFeeRate>> {
        let rate = self
            .conn
            .query_row(
                "SELECT marketplace, fee_rate FROM marketplace_fee_rate WHERE marketplace = ?1",
                params![marketplace],
                |row| {
                    Ok(MarketplaceFeeRate {
                        marketplace: row.get(0)?,
                        fee_rate: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(rate)
    }

    pub fn save_fee_rate(&self, marketplace: &str, fee_rate: f64) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO marketplace_fee_rate (marketplace, fee_rate)
            VALUES (?1, ?2)
            ON CONFLICT(marketplace) DO UPDATE SET fee_rate = excluded.fee_rate
            "#,
            params![marketplace, fee_rate],
        )?;
        Ok(())
    }

    /// 已配置费率的平台（批量重算的默认平台范围）
    pub fn list_marketplaces(&self) -> RepositoryResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT marketplace FROM marketplace_fee_rate ORDER BY marketplace")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    // ===== 变体利润 =====

    pub fn get_profit(&self, variant_key: VariantKey) -> RepositoryResult<Option<VariantProfitSetting>> {
        let profit = self
            .conn
            .query_row(
                "SELECT variant_key, profit_cents FROM variant_profit_setting WHERE variant_key = ?1",
                params![variant_key.as_str()],
                |row| {
                    Ok(VariantProfitSetting {
                        variant_key: parse_enum(0, &row.get::<_, String>(0)?)?,
                        profit_cents: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(profit)
    }

    pub fn save_profit(&self, variant_key: VariantKey, profit_cents: i64) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO variant_profit_setting (variant_key, profit_cents)
            VALUES (?1, ?2)
            ON CONFLICT(variant_key) DO UPDATE SET profit_cents = excluded.profit_cents
            "#,
            params![variant_key.as_str(), profit_cents],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_upserts() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = PricingSettingsRepository::new(&conn);

        assert!(repo.get_labor().unwrap().is_none());
        let labor = LaborSetting {
            hourly_rate_cents: 1700,
            minutes_no_padding: 35,
            minutes_with_padding: 50,
        };
        repo.save_labor(&labor).unwrap();
        repo.save_labor(&LaborSetting { hourly_rate_cents: 1800, ..labor.clone() }).unwrap();
        assert_eq!(repo.get_labor().unwrap().unwrap().hourly_rate_cents, 1800);

        repo.save_fee_rate("etsy", 0.1).unwrap();
        repo.save_fee_rate("amazon", 0.15).unwrap();
        repo.save_fee_rate("etsy", 0.12).unwrap();
        assert_eq!(repo.get_fee_rate("etsy").unwrap().unwrap().fee_rate, 0.12);
        assert_eq!(repo.list_marketplaces().unwrap(), vec!["amazon", "etsy"]);
        assert!(repo.get_fee_rate("ebay").unwrap().is_none());

        repo.save_profit(VariantKey::PremiumPadded, 2500).unwrap();
        let profit = repo.get_profit(VariantKey::PremiumPadded).unwrap().unwrap();
        assert_eq!(profit.profit_cents, 2500);
        assert!(repo.get_profit(VariantKey::ChoicePadded).unwrap().is_none());
    }
}
