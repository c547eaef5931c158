// ==========================================
// 校务运营管理系统 - 日报 / 任务 / 周报
// ==========================================
// ReportSubmission: 员工日报，draft → completed (可重新打开)
// WorkItem: 任务，可选挂在某个日报下；日报删除不级联删除任务
// WeeklyReport: 发给家长的学生周报 (文本由外部生成服务提供)
// ==========================================

use crate::domain::types::{ReportStatus, TaskStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ReportSubmission - 日报
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSubmission {
    pub report_id: String,
    pub employee_id: String,        // 作者
    pub report_date: NaiveDate,     // 业务日期
    pub created_at: NaiveDateTime,  // 创建时间 (结转锚点依据)
    pub status: ReportStatus,
    pub day_comment: Option<String>,
}

impl ReportSubmission {
    pub fn is_completed(&self) -> bool {
        self.status == ReportStatus::Completed
    }
}

// ==========================================
// WorkItem - 任务
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub task_id: String,
    pub report_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Option<String>,
    pub created_at: NaiveDateTime,
}

impl WorkItem {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

// ==========================================
// WeeklyReport - 学生周报
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub weekly_report_id: String,
    pub student_id: String,
    pub created_by: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub attendance_count: i32,
    pub absent_count: i32,
    pub late_count: i32,
    pub homework_completed: i32,
    pub homework_total: i32,
    pub narrative: String,
    pub is_approved: bool,
    pub created_at: NaiveDateTime,
}
