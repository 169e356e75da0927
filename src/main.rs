// ==========================================
// 罩套定价系统 - 命令行入口
// ==========================================
// 打开（或创建）数据库，对全部型号 × 全部已配置费率的平台执行一次重算，
// 并以 JSON 输出重算报告
// ==========================================

use anyhow::{Context, Result};
use cover_pricing::app::{get_default_db_path, AppState};
use cover_pricing::logging;

fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", cover_pricing::APP_NAME, cover_pricing::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let report = state
        .pricing_api
        .recalculate_models(&[], &[])
        .context("批量重算失败")?;

    if report.has_failures() {
        tracing::warn!(failures = report.failures.len(), "部分型号定价失败");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("重算报告序列化失败")?
    );
    Ok(())
}
