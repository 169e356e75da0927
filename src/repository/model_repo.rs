// ==========================================
// 罩套定价系统 - 产品型号数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::material::Model;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension};

// ==========================================
// ModelRepository - 产品型号仓储
// ==========================================
pub struct ModelRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ModelRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 按ID查询产品型号
    pub fn find_by_id(&self, model_id: i64) -> RepositoryResult<Option<Model>> {
        let model = self
            .conn
            .query_row(
                r#"
                SELECT id, name, width_in, depth_in, height_in, surface_area_sq_in
                FROM model
                WHERE id = ?1
                "#,
                params![model_id],
                |row| {
                    Ok(Model {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        width_in: row.get(2)?,
                        depth_in: row.get(3)?,
                        height_in: row.get(4)?,
                        surface_area_sq_in: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(model)
    }

    /// 插入产品型号，返回新ID
    pub fn insert(
        &self,
        name: &str,
        dimensions: (Option<f64>, Option<f64>, Option<f64>),
        surface_area_sq_in: Option<f64>,
    ) -> RepositoryResult<i64> {
        let (width, depth, height) = dimensions;
        self.conn.execute(
            r#"
            INSERT INTO model (name, width_in, depth_in, height_in, surface_area_sq_in)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![name, width, depth, height, surface_area_sq_in],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 更新表面积（由外部尺寸计算流程写入）
    pub fn update_surface_area(
        &self,
        model_id: i64,
        surface_area_sq_in: Option<f64>,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE model SET surface_area_sq_in = ?1 WHERE id = ?2",
            params![surface_area_sq_in, model_id],
        )?;
        Ok(rows)
    }

    /// 全部型号ID（批量重算使用）
    pub fn list_ids(&self) -> RepositoryResult<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM model ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }
}
