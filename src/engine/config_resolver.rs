// ==========================================
// 罩套定价系统 - 时间生效配置解析
// ==========================================
// 职责: 在带 effective_date / end_date 的配置行中选出“当前生效行”
// 规则: effective_date <= now 且 (end_date 为空 或 end_date > now)
// 冲突: 多行同时生效（违反不变量）时取 effective_date 最新者，再取 id 最大者
// 红线: 未找到不是错误，由调用方转换为具名配置错误
// ==========================================

use crate::domain::material::MaterialRoleAssignment;
use crate::domain::shipping::MarketplaceShippingProfile;
use crate::domain::types::MaterialRole;
use crate::repository::error::RepositoryResult;
use crate::repository::{MaterialRepository, ShippingRepository};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::warn;

/// 带生效时间窗口的配置行
pub trait TimeScoped {
    fn row_id(&self) -> i64;
    fn effective_date(&self) -> NaiveDateTime;
    fn end_date(&self) -> Option<NaiveDateTime>;

    fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.effective_date() <= now && self.end_date().map_or(true, |end| end > now)
    }
}

impl TimeScoped for MaterialRoleAssignment {
    fn row_id(&self) -> i64 {
        self.id
    }
    fn effective_date(&self) -> NaiveDateTime {
        self.effective_date
    }
    fn end_date(&self) -> Option<NaiveDateTime> {
        self.end_date
    }
}

impl TimeScoped for MarketplaceShippingProfile {
    fn row_id(&self) -> i64 {
        self.id
    }
    fn effective_date(&self) -> NaiveDateTime {
        self.effective_date
    }
    fn end_date(&self) -> Option<NaiveDateTime> {
        self.end_date
    }
}

/// 选出 now 时刻生效的行
///
/// # 参数
/// - rows: 同一作用域（角色/平台）下的全部行，顺序不限
/// - scope: 仅用于日志
/// - now: 判定时刻
///
/// # 返回
/// - Some(row): 生效行
/// - None: 无生效行
pub fn select_active<T: TimeScoped + Clone>(
    rows: &[T],
    scope: &str,
    now: NaiveDateTime,
) -> Option<T> {
    let active: Vec<&T> = rows.iter().filter(|r| r.is_active_at(now)).collect();

    if active.len() > 1 {
        warn!(
            scope = scope,
            count = active.len(),
            "同一作用域存在多条生效配置，按最新生效日期选取"
        );
    }

    active
        .into_iter()
        .max_by(|a, b| {
            a.effective_date()
                .cmp(&b.effective_date())
                .then(a.row_id().cmp(&b.row_id()))
        })
        .cloned()
}

// ==========================================
// ConfigResolver - 配置解析器
// ==========================================
pub struct ConfigResolver<'c> {
    conn: &'c Connection,
}

impl<'c> ConfigResolver<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 解析角色当前生效的材料分配
    pub fn resolve_role_assignment(
        &self,
        role: MaterialRole,
        now: NaiveDateTime,
    ) -> RepositoryResult<Option<MaterialRoleAssignment>> {
        let rows = MaterialRepository::new(self.conn).find_role_assignments(role)?;
        Ok(select_active(&rows, role.as_str(), now))
    }

    /// 解析平台当前生效的运费档案
    pub fn resolve_shipping_profile(
        &self,
        marketplace: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Option<MarketplaceShippingProfile>> {
        let rows = ShippingRepository::new(self.conn).find_profiles(marketplace)?;
        Ok(select_active(&rows, marketplace, now))
    }
}
