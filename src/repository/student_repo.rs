// ==========================================
// 校务运营管理系统 - 学生仓储
// ==========================================

use crate::domain::{Student, StudentStatus};
use crate::engine::SqlFilter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_ts, get_ts};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "s.student_id, s.first_name, s.last_name, s.status, s.created_at";

pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, student: &Student) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO students (student_id, first_name, last_name, status, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &student.student_id,
                &student.first_name,
                &student.last_name,
                student.status.as_str(),
                format_ts(&student.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, student_id: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let student = conn
            .query_row(
                &format!("SELECT {} FROM students s WHERE s.student_id = ?", SELECT_COLUMNS),
                params![student_id],
                map_row,
            )
            .optional()?;
        Ok(student)
    }

    /// 按权限范围列出学生 (`filter` 以 `s` 为 students 表别名)
    pub fn list(&self, filter: &SqlFilter) -> RepositoryResult<Vec<Student>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM students s WHERE {} ORDER BY s.last_name, s.first_name",
            SELECT_COLUMNS, filter.clause
        ))?;
        let students = stmt
            .query_map(params_from_iter(filter.params.iter()), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Student> {
    Ok(Student {
        student_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        status: StudentStatus::parse(&row.get::<_, String>(3)?),
        created_at: get_ts(row, 4)?,
    })
}
