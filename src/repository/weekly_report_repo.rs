// ==========================================
// 校务运营管理系统 - 学生周报仓储
// ==========================================

use crate::domain::WeeklyReport;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_date, format_ts, get_date, get_ts};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"weekly_report_id, student_id, created_by, period_start, period_end,
    attendance_count, absent_count, late_count, homework_completed, homework_total,
    narrative, is_approved, created_at"#;

pub struct WeeklyReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WeeklyReportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, report: &WeeklyReport) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO weekly_reports ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                SELECT_COLUMNS
            ),
            params![
                &report.weekly_report_id,
                &report.student_id,
                &report.created_by,
                format_date(&report.period_start),
                format_date(&report.period_end),
                report.attendance_count,
                report.absent_count,
                report.late_count,
                report.homework_completed,
                report.homework_total,
                &report.narrative,
                report.is_approved,
                format_ts(&report.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, weekly_report_id: &str) -> RepositoryResult<Option<WeeklyReport>> {
        let conn = self.get_conn()?;
        let report = conn
            .query_row(
                &format!("SELECT {} FROM weekly_reports WHERE weekly_report_id = ?", SELECT_COLUMNS),
                params![weekly_report_id],
                map_row,
            )
            .optional()?;
        Ok(report)
    }

    /// 学生的周报 (最近一期在前)
    pub fn list_for_student(&self, student_id: &str) -> RepositoryResult<Vec<WeeklyReport>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM weekly_reports WHERE student_id = ? ORDER BY period_start DESC, created_at DESC",
            SELECT_COLUMNS
        ))?;
        let reports = stmt
            .query_map(params![student_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    pub fn set_approved(&self, weekly_report_id: &str, approved: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE weekly_reports SET is_approved = ? WHERE weekly_report_id = ?",
            params![approved, weekly_report_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("WeeklyReport", weekly_report_id));
        }
        Ok(())
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WeeklyReport> {
    Ok(WeeklyReport {
        weekly_report_id: row.get(0)?,
        student_id: row.get(1)?,
        created_by: row.get(2)?,
        period_start: get_date(row, 3)?,
        period_end: get_date(row, 4)?,
        attendance_count: row.get(5)?,
        absent_count: row.get(6)?,
        late_count: row.get(7)?,
        homework_completed: row.get(8)?,
        homework_total: row.get(9)?,
        narrative: row.get(10)?,
        is_approved: row.get(11)?,
        created_at: get_ts(row, 12)?,
    })
}
