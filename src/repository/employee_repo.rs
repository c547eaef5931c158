// ==========================================
// 校务运营管理系统 - 员工仓储
// ==========================================
// 职责: 员工档案读写 + 装配操作主体 (Actor)
// 校区负责人的 location_id 来自 school_locations.manager_id 反向引用
// ==========================================

use crate::domain::{Actor, Employee, Role};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_ts, get_ts};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "employee_id, first_name, last_name, role, is_active, created_at";

// ==========================================
// EmployeeRepository - 员工仓储
// ==========================================
pub struct EmployeeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmployeeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, employee: &Employee) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO employees (
                employee_id, first_name, last_name, role, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &employee.employee_id,
                &employee.first_name,
                &employee.last_name,
                employee.role.as_str(),
                employee.is_active,
                format_ts(&employee.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, employee_id: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let employee = conn
            .query_row(
                &format!("SELECT {} FROM employees WHERE employee_id = ?", SELECT_COLUMNS),
                params![employee_id],
                map_row,
            )
            .optional()?;
        Ok(employee)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM employees ORDER BY last_name, first_name",
            SELECT_COLUMNS
        ))?;
        let employees = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }

    /// 装配操作主体
    ///
    /// # 返回
    /// - `Ok(Actor)`: 在职员工
    /// - `Err(NotFound)`: 员工不存在或已停用
    pub fn load_actor(&self, employee_id: &str) -> RepositoryResult<Actor> {
        let employee = self
            .find_by_id(employee_id)?
            .filter(|e| e.is_active)
            .ok_or_else(|| RepositoryError::not_found("Employee", employee_id))?;

        let location_id = if employee.role == Role::Manager {
            let conn = self.get_conn()?;
            conn.query_row(
                "SELECT location_id FROM school_locations WHERE manager_id = ?",
                params![employee_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
        } else {
            None
        };

        Ok(Actor {
            employee_id: employee.employee_id,
            role: employee.role,
            location_id,
        })
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        employee_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        role: Role::parse(&row.get::<_, String>(3)?),
        is_active: row.get(4)?,
        created_at: get_ts(row, 5)?,
    })
}
