// ==========================================
// 罩套定价系统 - 工作单元
// ==========================================
// 基于 SQL SAVEPOINT 实现，可嵌套在调用方已开启的事务内
// - commit:   RELEASE（无外层事务时即提交）
// - rollback: ROLLBACK TO + RELEASE
// - 未显式结束时在 Drop 中回滚
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

static SAVEPOINT_SEQ: AtomicU64 = AtomicU64::new(1);

pub struct UnitOfWork<'c> {
    conn: &'c Connection,
    name: String,
    finished: bool,
}

impl<'c> UnitOfWork<'c> {
    /// 开启工作单元
    pub fn begin(conn: &'c Connection) -> RepositoryResult<Self> {
        let name = format!("uow_{}", SAVEPOINT_SEQ.fetch_add(1, Ordering::Relaxed));
        conn.execute_batch(&format!("SAVEPOINT {}", name))
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(Self {
            conn,
            name,
            finished: false,
        })
    }

    pub fn conn(&self) -> &'c Connection {
        self.conn
    }

    pub fn commit(mut self) -> RepositoryResult<()> {
        self.finished = true;
        self.conn
            .execute_batch(&format!("RELEASE {}", self.name))
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    pub fn rollback(mut self) -> RepositoryResult<()> {
        self.finished = true;
        self.rollback_inner()
    }

    fn rollback_inner(&self) -> RepositoryResult<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0}", self.name))
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.rollback_inner() {
                warn!(savepoint = %self.name, error = %e, "工作单元回滚失败");
            }
        }
    }
}

/// 在工作单元中执行闭包：Ok 则提交，Err 则回滚
pub fn run_in_unit<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<RepositoryError>,
{
    let unit = UnitOfWork::begin(conn)?;
    match f(unit.conn()) {
        Ok(value) => {
            unit.commit()?;
            Ok(value)
        }
        Err(e) => {
            unit.rollback()?;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL)").unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn test_commit_and_rollback() {
        let conn = setup();

        run_in_unit::<_, RepositoryError, _>(&conn, |c| {
            c.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&conn), 1);

        let result = run_in_unit::<(), RepositoryError, _>(&conn, |c| {
            c.execute("INSERT INTO t (v) VALUES (2)", [])?;
            Err(RepositoryError::DatabaseQueryError("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let conn = setup();
        {
            let unit = UnitOfWork::begin(&conn).unwrap();
            unit.conn().execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
        }
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_nested_units_inside_outer_transaction() {
        let conn = setup();
        conn.execute_batch("BEGIN").unwrap();

        let outer = UnitOfWork::begin(&conn).unwrap();
        run_in_unit::<_, RepositoryError, _>(outer.conn(), |c| {
            c.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Ok(())
        })
        .unwrap();
        let _ = run_in_unit::<(), RepositoryError, _>(outer.conn(), |c| {
            c.execute("INSERT INTO t (v) VALUES (2)", [])?;
            Err(RepositoryError::DatabaseQueryError("boom".to_string()))
        });
        outer.commit().unwrap();
        assert_eq!(count(&conn), 1);

        // 外层事务回滚后全部撤销
        conn.execute_batch("ROLLBACK").unwrap();
        assert_eq!(count(&conn), 0);
    }
}
