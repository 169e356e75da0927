// ==========================================
// 罩套定价系统 - 配置层
// ==========================================
// 职责: 引擎可调参数管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, EngineConfig};
