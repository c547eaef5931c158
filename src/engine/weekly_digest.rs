// ==========================================
// 校务运营管理系统 - 学生周报统计
// ==========================================
// 职责: 汇总学生某时间段的出勤与作业数据，交给文本生成端口
// 口径:
//   attendance_count = present + late + trial
//   absent_count     = absent
//   late_count       = late
//   homework_total   = 有作业评分的记录数
//   homework_completed = 作业评分不是 "未完成" 标记的记录数
// 已取消课次的出勤不计入 (由仓储层过滤)
// ==========================================

use crate::domain::{AttendanceStatus, LessonAttendance, Student};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// 作业未完成标记
const HOMEWORK_NOT_DONE_MARKS: &[&str] = &["0", "-", "нет", "not_done", "未完成"];

/// 带课次日期的出勤记录
#[derive(Debug, Clone)]
pub struct DatedAttendance {
    pub lesson_date: NaiveDate,
    pub attendance: LessonAttendance,
}

/// 周期出勤统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceDigest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub attendance_count: i32,
    pub absent_count: i32,
    pub late_count: i32,
    pub homework_completed: i32,
    pub homework_total: i32,
}

impl AttendanceDigest {
    pub fn empty(period_start: NaiveDate, period_end: NaiveDate) -> Self {
        Self {
            period_start,
            period_end,
            attendance_count: 0,
            absent_count: 0,
            late_count: 0,
            homework_completed: 0,
            homework_total: 0,
        }
    }

    /// 汇总区间 [period_start, period_end] 内的出勤记录
    pub fn aggregate(
        period_start: NaiveDate,
        period_end: NaiveDate,
        records: &[DatedAttendance],
    ) -> Self {
        let mut digest = AttendanceDigest::empty(period_start, period_end);

        for record in records
            .iter()
            .filter(|r| r.lesson_date >= period_start && r.lesson_date <= period_end)
        {
            match record.attendance.status {
                AttendanceStatus::Present | AttendanceStatus::Trial => digest.attendance_count += 1,
                AttendanceStatus::Late => {
                    digest.attendance_count += 1;
                    digest.late_count += 1;
                }
                AttendanceStatus::Absent => digest.absent_count += 1,
            }

            if let Some(grade) = record
                .attendance
                .homework_grade
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
            {
                digest.homework_total += 1;
                if !is_not_done(grade) {
                    digest.homework_completed += 1;
                }
            }
        }

        digest
    }
}

fn is_not_done(grade: &str) -> bool {
    let lowered = grade.to_lowercase();
    HOMEWORK_NOT_DONE_MARKS.iter().any(|mark| *mark == lowered)
}

// ==========================================
// 文本生成端口
// ==========================================

/// ReportNarrator - 周报文本生成 (外部 AI 服务)
#[async_trait]
pub trait ReportNarrator: Send + Sync {
    async fn narrate(
        &self,
        student: &Student,
        digest: &AttendanceDigest,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 模板文本生成器
///
/// 未接入外部服务时的默认实现
#[derive(Debug, Clone, Default)]
pub struct TemplateNarrator;

#[async_trait]
impl ReportNarrator for TemplateNarrator {
    async fn narrate(
        &self,
        student: &Student,
        digest: &AttendanceDigest,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(format!(
            "{} {} ({} - {}): attended {}, absent {}, late {}, homework {}/{}",
            student.first_name,
            student.last_name,
            digest.period_start,
            digest.period_end,
            digest.attendance_count,
            digest.absent_count,
            digest.late_count,
            digest.homework_completed,
            digest.homework_total,
        ))
    }
}
