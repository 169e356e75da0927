// ==========================================
// 罩套定价系统 - 材料数据仓储
// ==========================================
// 表: material / supplier / material_supplier / material_role_assignment
// 红线: Repository 不含业务逻辑（生效行的选择在引擎层）
// ==========================================

use crate::domain::material::{Material, MaterialRoleAssignment, MaterialSupplierLink};
use crate::domain::types::MaterialRole;
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::{
    format_datetime, parse_datetime, parse_enum, parse_optional_datetime,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

// ==========================================
// MaterialRepository - 材料仓储
// ==========================================
pub struct MaterialRepository<'c> {
    conn: &'c Connection,
}

impl<'c> MaterialRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, material_id: i64) -> RepositoryResult<Option<Material>> {
        let material = self
            .conn
            .query_row(
                r#"
                SELECT id, name, linear_yard_width_in, weight_per_sq_in_oz
                FROM material
                WHERE id = ?1
                "#,
                params![material_id],
                |row| {
                    Ok(Material {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        linear_yard_width_in: row.get(2)?,
                        weight_per_sq_in_oz: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(material)
    }

    /// 查询材料的全部供应商报价
    pub fn find_supplier_links(&self, material_id: i64) -> RepositoryResult<Vec<MaterialSupplierLink>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, material_id, supplier_id, unit_cost_dollars, is_preferred
            FROM material_supplier
            WHERE material_id = ?1
            ORDER BY id
            "#,
        )?;

        let links = stmt
            .query_map(params![material_id], |row| {
                Ok(MaterialSupplierLink {
                    id: row.get(0)?,
                    material_id: row.get(1)?,
                    supplier_id: row.get(2)?,
                    unit_cost_dollars: row.get(3)?,
                    is_preferred: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// 查询某角色的全部分配记录（含已失效行）
    pub fn find_role_assignments(
        &self,
        role: MaterialRole,
    ) -> RepositoryResult<Vec<MaterialRoleAssignment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, role, material_id, effective_date, end_date
            FROM material_role_assignment
            WHERE role = ?1
            ORDER BY effective_date DESC, id DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![role.as_str()], |row| {
                Ok(MaterialRoleAssignment {
                    id: row.get(0)?,
                    role: parse_enum(1, &row.get::<_, String>(1)?)?,
                    material_id: row.get(2)?,
                    effective_date: parse_datetime(3, &row.get::<_, String>(3)?)?,
                    end_date: parse_optional_datetime(4, row.get(4)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ==========================================
    // 写入操作（设置子系统）
    // ==========================================

    pub fn insert_material(
        &self,
        name: &str,
        linear_yard_width_in: Option<f64>,
        weight_per_sq_in_oz: Option<f64>,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO material (name, linear_yard_width_in, weight_per_sq_in_oz)
            VALUES (?1, ?2, ?3)
            "#,
            params![name, linear_yard_width_in, weight_per_sq_in_oz],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_supplier(&self, name: &str) -> RepositoryResult<i64> {
        self.conn
            .execute("INSERT INTO supplier (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_supplier_link(
        &self,
        material_id: i64,
        supplier_id: i64,
        unit_cost_dollars: f64,
        is_preferred: bool,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO material_supplier (material_id, supplier_id, unit_cost_dollars, is_preferred)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![material_id, supplier_id, unit_cost_dollars, is_preferred as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 更新供应商单价
    pub fn update_unit_cost(&self, link_id: i64, unit_cost_dollars: f64) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE material_supplier SET unit_cost_dollars = ?1 WHERE id = ?2",
            params![unit_cost_dollars, link_id],
        )?;
        Ok(rows)
    }

    /// 分配材料角色
    ///
    /// 先将该角色所有未结束的行在 effective_date 处结束，再插入新行，
    /// 保证同一角色只有一行 end_date 为空。
    pub fn assign_role(
        &self,
        role: MaterialRole,
        material_id: i64,
        effective_date: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let effective = format_datetime(&effective_date);

        self.conn.execute(
            r#"
            UPDATE material_role_assignment
            SET end_date = ?1
            WHERE role = ?2 AND end_date IS NULL
            "#,
            params![effective, role.as_str()],
        )?;

        self.conn.execute(
            r#"
            INSERT INTO material_role_assignment (role, material_id, effective_date, end_date)
            VALUES (?1, ?2, ?3, NULL)
            "#,
            params![role.as_str(), material_id, effective],
        )?;

        Ok(self.conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_assign_role_closes_previous_open_row() {
        let conn = setup_test_db();
        let repo = MaterialRepository::new(&conn);

        let vinyl = repo.insert_material("vinyl", Some(54.0), Some(0.01)).unwrap();
        let canvas = repo.insert_material("canvas", Some(60.0), Some(0.02)).unwrap();

        repo.assign_role(MaterialRole::ChoiceFabric, vinyl, at(1)).unwrap();
        repo.assign_role(MaterialRole::ChoiceFabric, canvas, at(10)).unwrap();

        let rows = repo.find_role_assignments(MaterialRole::ChoiceFabric).unwrap();
        assert_eq!(rows.len(), 2);

        // 按 effective_date 倒序
        assert_eq!(rows[0].material_id, canvas);
        assert_eq!(rows[0].end_date, None);
        assert_eq!(rows[1].material_id, vinyl);
        assert_eq!(rows[1].end_date, Some(at(10)));

        // 其他角色不受影响
        assert!(repo.find_role_assignments(MaterialRole::Padding).unwrap().is_empty());
    }

    #[test]
    fn test_supplier_links() {
        let conn = setup_test_db();
        let repo = MaterialRepository::new(&conn);

        let foam = repo.insert_material("foam", Some(60.0), None).unwrap();
        let acme = repo.insert_supplier("acme").unwrap();
        let other = repo.insert_supplier("other").unwrap();
        repo.insert_supplier_link(foam, acme, 12.5, true).unwrap();
        let link = repo.insert_supplier_link(foam, other, 11.0, false).unwrap();
        repo.update_unit_cost(link, 10.0).unwrap();

        let links = repo.find_supplier_links(foam).unwrap();
        assert_eq!(links.len(), 2);
        assert!(links[0].is_preferred);
        assert_eq!(links[1].unit_cost_dollars, 10.0);

        let material = repo.find_by_id(foam).unwrap().unwrap();
        assert_eq!(material.weight_per_sq_in_oz, None);
        assert!(repo.find_by_id(999).unwrap().is_none());
    }
}
