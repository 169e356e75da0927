// ==========================================
// 罩套定价系统 - 配置管理器
// ==========================================
// 职责: 引擎可调参数的加载与覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    /// 浮点字段变更判定容差
    pub const FLOAT_EPSILON: &str = "pricing/float_epsilon";
    /// 不强制要求运费档案的平台（JSON 数组）
    pub const SHIPPING_PROFILE_OPTIONAL_MARKETPLACES: &str =
        "pricing/shipping_profile_optional_marketplaces";
    /// 写入历史时的默认原因
    pub const HISTORY_REASON: &str = "pricing/history_reason";
}

pub const DEFAULT_FLOAT_EPSILON: f64 = 1e-4;
pub const DEFAULT_HISTORY_REASON: &str = "recalculate";

// ==========================================
// EngineConfig - 定价引擎配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub float_epsilon: f64,
    /// reverb 通过外部模板占位符处理运费，因此默认不要求运费档案
    pub shipping_profile_optional_marketplaces: Vec<String>,
    pub history_reason: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            float_epsilon: DEFAULT_FLOAT_EPSILON,
            shipping_profile_optional_marketplaces: vec!["reverb".to_string()],
            history_reason: DEFAULT_HISTORY_REASON.to_string(),
        }
    }
}

impl EngineConfig {
    /// 该平台是否必须配置运费档案
    pub fn requires_shipping_profile(&self, marketplace: &str) -> bool {
        !self
            .shipping_profile_optional_marketplaces
            .iter()
            .any(|m| m.eq_ignore_ascii_case(marketplace.trim()))
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 加载引擎配置快照（缺失的键使用默认值）
    pub fn load_engine_config(&self) -> RepositoryResult<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(raw) = self.get_global_config_value(config_keys::FLOAT_EPSILON)? {
            let epsilon: f64 = raw.trim().parse().map_err(|_| RepositoryError::FieldValueError {
                field: config_keys::FLOAT_EPSILON.to_string(),
                message: format!("无法解析为浮点数: {}", raw),
            })?;
            if !epsilon.is_finite() || epsilon < 0.0 {
                return Err(RepositoryError::FieldValueError {
                    field: config_keys::FLOAT_EPSILON.to_string(),
                    message: format!("容差必须为非负有限数: {}", raw),
                });
            }
            config.float_epsilon = epsilon;
        }

        if let Some(raw) =
            self.get_global_config_value(config_keys::SHIPPING_PROFILE_OPTIONAL_MARKETPLACES)?
        {
            config.shipping_profile_optional_marketplaces =
                serde_json::from_str(&raw).map_err(|e| RepositoryError::FieldValueError {
                    field: config_keys::SHIPPING_PROFILE_OPTIONAL_MARKETPLACES.to_string(),
                    message: e.to_string(),
                })?;
        }

        if let Some(raw) = self.get_global_config_value(config_keys::HISTORY_REASON)? {
            if !raw.trim().is_empty() {
                config.history_reason = raw.trim().to_string();
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let manager = setup_manager();
        let config = manager.load_engine_config().unwrap();

        assert_eq!(config, EngineConfig::default());
        assert!(!config.requires_shipping_profile("reverb"));
        assert!(!config.requires_shipping_profile(" Reverb "));
        assert!(config.requires_shipping_profile("etsy"));
    }

    #[test]
    fn test_overrides_from_config_kv() {
        let manager = setup_manager();
        manager.set_global_config_value(config_keys::FLOAT_EPSILON, "0.001").unwrap();
        manager
            .set_global_config_value(
                config_keys::SHIPPING_PROFILE_OPTIONAL_MARKETPLACES,
                r#"["reverb", "wholesale"]"#,
            )
            .unwrap();
        manager.set_global_config_value(config_keys::HISTORY_REASON, "nightly").unwrap();

        let config = manager.load_engine_config().unwrap();
        assert_eq!(config.float_epsilon, 0.001);
        assert!(!config.requires_shipping_profile("wholesale"));
        assert_eq!(config.history_reason, "nightly");
    }

    #[test]
    fn test_invalid_epsilon_is_rejected() {
        let manager = setup_manager();
        manager.set_global_config_value(config_keys::FLOAT_EPSILON, "tiny").unwrap();
        assert!(matches!(
            manager.load_engine_config(),
            Err(RepositoryError::FieldValueError { .. })
        ));

        manager.set_global_config_value(config_keys::FLOAT_EPSILON, "-1").unwrap();
        assert!(manager.load_engine_config().is_err());
    }
}
