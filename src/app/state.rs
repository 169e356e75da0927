// ==========================================
// 罩套定价系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{PricingApi, SettingsApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::clock::{Clock, SystemClock};

/// 应用状态
///
/// 所有 API 共用一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 定价API
    pub pricing_api: Arc<PricingApi>,

    /// 定价设置API
    pub settings_api: Arc<SettingsApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例（系统时钟）
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_clock(db_path, Arc::new(SystemClock))
    }

    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - clock: 计算时刻来源
    ///
    /// # 说明
    /// 打开连接后会执行幂等建表
    pub fn with_clock(db_path: String, clock: Arc<dyn Clock>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let pricing_api = Arc::new(PricingApi::new(
            conn.clone(),
            config_manager.clone(),
            clock.clone(),
        ));
        let settings_api = Arc::new(SettingsApi::new(conn, clock));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            pricing_api,
            settings_api,
            config_manager,
        })
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 COVER_PRICING_DB（非空时）
/// - 开发环境: 用户数据目录/cover-pricing-dev/pricing.db
/// - 生产环境: 用户数据目录/cover-pricing/pricing.db
/// - 无法获取用户数据目录时: ./pricing.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("COVER_PRICING_DB") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./pricing.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("cover-pricing-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("cover-pricing");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("pricing.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_initializes_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);

        let config = state.config_manager.load_engine_config().unwrap();
        assert!(!config.requires_shipping_profile("reverb"));
    }
}
