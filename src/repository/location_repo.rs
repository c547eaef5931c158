// ==========================================
// 校务运营管理系统 - 校区仓储
// ==========================================
// 约束: 一个负责人至多负责一个校区 (manager_id UNIQUE)
// ==========================================

use crate::domain::Location;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_ts, get_ts};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "location_id, name, address, manager_id, created_at";

pub struct LocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LocationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, location: &Location) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO school_locations (location_id, name, address, manager_id, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &location.location_id,
                &location.name,
                &location.address,
                &location.manager_id,
                format_ts(&location.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, location_id: &str) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        let location = conn
            .query_row(
                &format!("SELECT {} FROM school_locations WHERE location_id = ?", SELECT_COLUMNS),
                params![location_id],
                map_row,
            )
            .optional()?;
        Ok(location)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Location>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM school_locations ORDER BY name",
            SELECT_COLUMNS
        ))?;
        let locations = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    /// 指定 / 清除校区负责人
    ///
    /// 负责人原先负责的其他校区会被解除，保证一人一校区
    pub fn assign_manager(&self, location_id: &str, manager_id: Option<&str>) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if let Some(manager_id) = manager_id {
            tx.execute(
                "UPDATE school_locations SET manager_id = NULL WHERE manager_id = ? AND location_id <> ?",
                params![manager_id, location_id],
            )?;
        }

        let affected = tx.execute(
            "UPDATE school_locations SET manager_id = ? WHERE location_id = ?",
            params![manager_id, location_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Location", location_id));
        }

        tx.commit()?;
        Ok(())
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Location> {
    Ok(Location {
        location_id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        manager_id: row.get(3)?,
        created_at: get_ts(row, 4)?,
    })
}
