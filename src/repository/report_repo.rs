// ==========================================
// 校务运营管理系统 - 日报仓储
// ==========================================
// 红线: 删除日报只解除任务挂靠，不删除任务
// ==========================================

use crate::domain::{ReportStatus, ReportSubmission};
use crate::engine::SqlFilter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_date, format_ts, get_date, get_ts};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "r.report_id, r.employee_id, r.report_date, r.created_at, r.status, r.day_comment";

// ==========================================
// ReportRepository - 日报仓储
// ==========================================
pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, report: &ReportSubmission) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO daily_reports (report_id, employee_id, report_date, created_at, status, day_comment)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &report.report_id,
                &report.employee_id,
                format_date(&report.report_date),
                format_ts(&report.created_at),
                report.status.as_str(),
                &report.day_comment,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, report_id: &str) -> RepositoryResult<Option<ReportSubmission>> {
        let conn = self.get_conn()?;
        let report = conn
            .query_row(
                &format!("SELECT {} FROM daily_reports r WHERE r.report_id = ?", SELECT_COLUMNS),
                params![report_id],
                map_row,
            )
            .optional()?;
        Ok(report)
    }

    /// 按权限范围列出日报 (业务日期降序)
    ///
    /// `filter` 以 `r` 为 daily_reports 表别名
    pub fn list(&self, filter: &SqlFilter) -> RepositoryResult<Vec<ReportSubmission>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM daily_reports r WHERE {} ORDER BY r.report_date DESC, r.created_at DESC",
            SELECT_COLUMNS, filter.clause
        ))?;
        let reports = stmt
            .query_map(params_from_iter(filter.params.iter()), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// 同一作者的全部日报 (锚点候选)
    pub fn list_by_author(&self, employee_id: &str) -> RepositoryResult<Vec<ReportSubmission>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM daily_reports r WHERE r.employee_id = ? ORDER BY r.created_at",
            SELECT_COLUMNS
        ))?;
        let reports = stmt
            .query_map(params![employee_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    pub fn update_status(&self, report_id: &str, status: ReportStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE daily_reports SET status = ? WHERE report_id = ?",
            params![status.as_str(), report_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ReportSubmission", report_id));
        }
        Ok(())
    }

    pub fn update_comment(&self, report_id: &str, day_comment: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE daily_reports SET day_comment = ? WHERE report_id = ?",
            params![day_comment, report_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ReportSubmission", report_id));
        }
        Ok(())
    }

    /// 删除日报，挂靠任务的 report_id 置空
    ///
    /// # 返回
    /// - 被解除挂靠的任务数
    pub fn delete(&self, report_id: &str) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let detached = tx.execute(
            "UPDATE tasks SET report_id = NULL WHERE report_id = ?",
            params![report_id],
        )?;
        let affected = tx.execute("DELETE FROM daily_reports WHERE report_id = ?", params![report_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ReportSubmission", report_id));
        }

        tx.commit()?;
        Ok(detached)
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ReportSubmission> {
    Ok(ReportSubmission {
        report_id: row.get(0)?,
        employee_id: row.get(1)?,
        report_date: get_date(row, 2)?,
        created_at: get_ts(row, 3)?,
        status: ReportStatus::parse(&row.get::<_, String>(4)?),
        day_comment: row.get(5)?,
    })
}
