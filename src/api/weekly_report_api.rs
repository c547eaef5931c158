// ==========================================
// 校务运营管理系统 - 家长周报 API
// ==========================================
// 流程: 权限校验 → 汇总区间出勤 → 外部文本生成 (异步) → 落库
// 文本生成失败时不落库
// ==========================================

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::future::join_all;

use crate::api::access::{require_recognized, visible_student};
use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::{Actor, Role, Student, WeeklyReport};
use crate::engine::{AttendanceDigest, ReportNarrator, ScopeResolver};
use crate::i18n::t_with_args;
use crate::repository::row_codec::now_ts;
use crate::repository::{
    GroupRepository, LessonRepository, StudentRepository, WeeklyReportRepository,
};

pub struct WeeklyReportApi {
    student_repo: Arc<StudentRepository>,
    group_repo: Arc<GroupRepository>,
    lesson_repo: Arc<LessonRepository>,
    weekly_report_repo: Arc<WeeklyReportRepository>,
    config_manager: Arc<ConfigManager>,
    scope_resolver: Arc<ScopeResolver>,
    narrator: Arc<dyn ReportNarrator>,
}

impl WeeklyReportApi {
    pub fn new(
        student_repo: Arc<StudentRepository>,
        group_repo: Arc<GroupRepository>,
        lesson_repo: Arc<LessonRepository>,
        weekly_report_repo: Arc<WeeklyReportRepository>,
        config_manager: Arc<ConfigManager>,
        scope_resolver: Arc<ScopeResolver>,
        narrator: Arc<dyn ReportNarrator>,
    ) -> Self {
        Self {
            student_repo,
            group_repo,
            lesson_repo,
            weekly_report_repo,
            config_manager,
            scope_resolver,
            narrator,
        }
    }

    /// 生成单个学生的周报
    ///
    /// # 参数
    /// - `period_end`: 为空时按配置的周期天数推算 (含首尾)
    ///
    /// # 返回
    /// - Err(InvalidInput): 结束日期早于开始日期，或推算出的结束日期超出日期范围
    /// - Err(NarratorError): 文本生成失败
    pub async fn generate_weekly_report(
        &self,
        actor: &Actor,
        student_id: &str,
        period_start: NaiveDate,
        period_end: Option<NaiveDate>,
    ) -> ApiResult<WeeklyReport> {
        require_recognized(actor)?;
        let period_end = self.resolve_period_end(period_start, period_end)?;
        let student = self.visible_student(actor, student_id)?;

        let records = self
            .lesson_repo
            .attendance_for_student(student_id, period_start, period_end)?;
        let digest = AttendanceDigest::aggregate(period_start, period_end, &records);

        let narrative = self.narrator.narrate(&student, &digest).await.map_err(|e| {
            tracing::warn!(student_id, error = %e, "weekly report narration failed");
            ApiError::NarratorError(t_with_args(
                "weekly.narrator_failed",
                &[("reason", &e.to_string())],
            ))
        })?;

        let report = WeeklyReport {
            weekly_report_id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            created_by: actor.employee_id.clone(),
            period_start,
            period_end,
            attendance_count: digest.attendance_count,
            absent_count: digest.absent_count,
            late_count: digest.late_count,
            homework_completed: digest.homework_completed,
            homework_total: digest.homework_total,
            narrative,
            is_approved: false,
            created_at: now_ts(),
        };
        self.weekly_report_repo.insert(&report)?;

        tracing::info!(
            weekly_report_id = %report.weekly_report_id,
            student_id,
            %period_start,
            %period_end,
            "weekly report generated"
        );
        Ok(report)
    }

    /// 批量生成周报；各学生的文本生成并发进行，单个失败不影响其他学生
    pub async fn generate_batch(
        &self,
        actor: &Actor,
        student_ids: &[String],
        period_start: NaiveDate,
        period_end: Option<NaiveDate>,
    ) -> Vec<(String, ApiResult<WeeklyReport>)> {
        let results = join_all(student_ids.iter().map(|student_id| {
            self.generate_weekly_report(actor, student_id, period_start, period_end)
        }))
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(total = student_ids.len(), failed, "weekly report batch finished");

        student_ids.iter().cloned().zip(results).collect()
    }

    pub fn list_for_student(&self, actor: &Actor, student_id: &str) -> ApiResult<Vec<WeeklyReport>> {
        self.visible_student(actor, student_id)?;
        Ok(self.weekly_report_repo.list_for_student(student_id)?)
    }

    /// 审核 / 撤销审核 (管理员或校区负责人)
    pub fn set_approved(&self, actor: &Actor, weekly_report_id: &str, approved: bool) -> ApiResult<()> {
        if !matches!(actor.role, Role::Admin | Role::Manager) {
            return Err(ApiError::access_denied("WeeklyReport", weekly_report_id));
        }
        let report = self
            .weekly_report_repo
            .find_by_id(weekly_report_id)?
            .ok_or_else(|| ApiError::not_found("WeeklyReport", weekly_report_id))?;
        self.visible_student(actor, &report.student_id)?;

        self.weekly_report_repo.set_approved(weekly_report_id, approved)?;
        Ok(())
    }

    fn resolve_period_end(
        &self,
        period_start: NaiveDate,
        period_end: Option<NaiveDate>,
    ) -> ApiResult<NaiveDate> {
        let period_end = match period_end {
            Some(end) => end,
            None => {
                let days = self
                    .config_manager
                    .get_weekly_period_days()
                    .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;
                Duration::try_days(days - 1)
                    .and_then(|span| period_start.checked_add_signed(span))
                    .ok_or_else(|| {
                        ApiError::InvalidInput(t_with_args(
                            "weekly.period_out_of_range",
                            &[("start", &period_start.to_string())],
                        ))
                    })?
            }
        };
        if period_end < period_start {
            return Err(ApiError::InvalidInput(t_with_args(
                "weekly.invalid_period",
                &[
                    ("start", &period_start.to_string()),
                    ("end", &period_end.to_string()),
                ],
            )));
        }
        Ok(period_end)
    }

    fn visible_student(&self, actor: &Actor, student_id: &str) -> ApiResult<Student> {
        visible_student(
            &self.scope_resolver,
            &self.student_repo,
            &self.group_repo,
            actor,
            student_id,
        )
    }
}
