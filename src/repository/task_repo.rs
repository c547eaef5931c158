// ==========================================
// 校务运营管理系统 - 任务仓储
// ==========================================

use crate::domain::{TaskStatus, WorkItem};
use crate::engine::SqlFilter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_ts, get_ts};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "t.task_id, t.report_id, t.title, t.description, t.status, t.assigned_to, t.created_at";

pub struct TaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaskRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, task: &WorkItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO tasks (task_id, report_id, title, description, status, assigned_to, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &task.task_id,
                &task.report_id,
                &task.title,
                &task.description,
                task.status.as_str(),
                &task.assigned_to,
                format_ts(&task.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, task_id: &str) -> RepositoryResult<Option<WorkItem>> {
        let conn = self.get_conn()?;
        let task = conn
            .query_row(
                &format!("SELECT {} FROM tasks t WHERE t.task_id = ?", SELECT_COLUMNS),
                params![task_id],
                map_row,
            )
            .optional()?;
        Ok(task)
    }

    /// 按权限范围列出任务 (created_at 降序)
    ///
    /// `filter` 以 `t` 为 tasks 表别名
    pub fn list(&self, filter: &SqlFilter) -> RepositoryResult<Vec<WorkItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks t WHERE {} ORDER BY t.created_at DESC",
            SELECT_COLUMNS, filter.clause
        ))?;
        let tasks = stmt
            .query_map(params_from_iter(filter.params.iter()), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// 更新可变字段 (标题、描述、状态、负责人、挂靠日报)
    pub fn update(&self, task: &WorkItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"UPDATE tasks
               SET report_id = ?, title = ?, description = ?, status = ?, assigned_to = ?
               WHERE task_id = ?"#,
            params![
                &task.report_id,
                &task.title,
                &task.description,
                task.status.as_str(),
                &task.assigned_to,
                &task.task_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("WorkItem", &task.task_id));
        }
        Ok(())
    }

    pub fn delete(&self, task_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM tasks WHERE task_id = ?", params![task_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("WorkItem", task_id));
        }
        Ok(())
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkItem> {
    Ok(WorkItem {
        task_id: row.get(0)?,
        report_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::parse(&row.get::<_, String>(4)?),
        assigned_to: row.get(5)?,
        created_at: get_ts(row, 6)?,
    })
}
