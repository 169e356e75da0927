// ==========================================
// 罩套定价系统 - 行映射工具
// ==========================================
// 职责: 时间戳/枚举列的统一编解码，解析失败转为 rusqlite 转换错误
// ==========================================

use crate::db::DATETIME_FORMAT;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use std::str::FromStr;

/// 时间戳 → 存储字符串
pub fn format_datetime(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// 存储字符串 → 时间戳
///
/// 兼容不带小数秒的 "%Y-%m-%d %H:%M:%S"（手工录入的配置行）
pub fn parse_datetime(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn parse_optional_datetime(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.map(|s| parse_datetime(idx, &s)).transpose()
}

/// 文本列 → 领域枚举（FromStr::Err 为 String）
pub fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|msg| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::VariantKey;
    use chrono::NaiveDate;

    #[test]
    fn test_datetime_round_trip_and_legacy_format() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_micro_opt(8, 30, 0, 125)
            .unwrap();
        assert_eq!(parse_datetime(0, &format_datetime(&ts)).unwrap(), ts);

        let legacy = parse_datetime(0, "2025-03-01 08:30:00").unwrap();
        assert_eq!(legacy, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(8, 30, 0).unwrap());

        assert!(parse_datetime(0, "yesterday").is_err());
    }

    #[test]
    fn test_parse_enum() {
        let key: VariantKey = parse_enum(2, "premium_padded").unwrap();
        assert_eq!(key, VariantKey::PremiumPadded);
        assert!(parse_enum::<VariantKey>(2, "gold").is_err());
    }
}
