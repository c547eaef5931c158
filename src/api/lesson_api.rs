// ==========================================
// 校务运营管理系统 - 课次 API
// ==========================================
// 职责: 课表展开、手工补录、取消/恢复、出勤记录
// 并发: 展开的 "读已有日期 → 规划 → 插入" 在仓储层串行化事务内完成
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::access::{require_recognized, visible_group, visible_lesson};
use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::{
    Actor, AttendanceStatus, LessonAttendance, LessonOccurrence, WorkType,
};
use crate::engine::{HorizonRequest, LessonExpander, ScopeResolver};
use crate::i18n::t_with_args;
use crate::perf::PerfGuard;
use crate::repository::{GroupRepository, LessonRepository, StudentRepository};

/// 课表展开请求；end_date 优先于 months，都未指定时使用默认展开天数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateLessonsRequest {
    pub end_date: Option<NaiveDate>,
    pub months: Option<u32>,
}

/// 手工补录课次请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonRequest {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub topic: Option<String>,
    #[serde(default)]
    pub work_type: WorkType,
}

/// 出勤记录请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordAttendanceRequest {
    pub student_id: String,
    pub status: AttendanceStatus,
    pub late_minutes: Option<i32>,
    pub lesson_grade: Option<String>,
    pub homework_grade: Option<String>,
}

// ==========================================
// LessonApi - 课次 API
// ==========================================
pub struct LessonApi {
    group_repo: Arc<GroupRepository>,
    lesson_repo: Arc<LessonRepository>,
    student_repo: Arc<StudentRepository>,
    config_manager: Arc<ConfigManager>,
    scope_resolver: Arc<ScopeResolver>,
}

impl LessonApi {
    pub fn new(
        group_repo: Arc<GroupRepository>,
        lesson_repo: Arc<LessonRepository>,
        student_repo: Arc<StudentRepository>,
        config_manager: Arc<ConfigManager>,
        scope_resolver: Arc<ScopeResolver>,
    ) -> Self {
        Self {
            group_repo,
            lesson_repo,
            student_repo,
            config_manager,
            scope_resolver,
        }
    }

    // ==========================================
    // 课表展开
    // ==========================================

    /// 将班级周课表展开为具体课次
    ///
    /// # 返回
    /// - Ok(Vec<LessonOccurrence>): 本次新建的课次 (日期升序，同日按规则顺序)
    /// - Err(PreconditionUnmet): 班级无开课日期或无课表规则，不产生任何写入
    /// - Err(AccessDenied / NotFound): 班级不可见 / 不存在 (先于参数校验)
    /// - Err(InvalidInput): months 超过上限，或区间超过单次展开天数上限
    pub fn generate_lessons(
        &self,
        actor: &Actor,
        group_id: &str,
        request: GenerateLessonsRequest,
    ) -> ApiResult<Vec<LessonOccurrence>> {
        let _perf = PerfGuard::new("generate_lessons");

        require_recognized(actor)?;
        let (_, group) = visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;

        let max_months = self
            .config_manager
            .get_max_generation_months()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;
        if let Some(months) = request.months {
            if months > max_months {
                return Err(ApiError::InvalidInput(t_with_args(
                    "lesson.invalid_months",
                    &[("max", &max_months.to_string())],
                )));
            }
        }

        let slots = self.group_repo.list_slots(group_id)?;
        let config = self
            .config_manager
            .get_expansion_config()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;
        let expander = LessonExpander::new(config);
        let anchor = expander.check_preconditions(&group, &slots)?;

        let horizon = HorizonRequest {
            end_date: request.end_date,
            months: request.months,
        };
        // 区间越界在进入写事务前拒绝
        expander.resolve_horizon(anchor, &horizon)?;

        let mut planning_error = None;
        let created = self.lesson_repo.generate_in_transaction(group_id, |existing| {
            match expander.expand(&group, &slots, existing, &horizon) {
                Ok(plan) => plan.lessons,
                Err(e) => {
                    planning_error = Some(e);
                    Vec::new()
                }
            }
        })?;
        if let Some(e) = planning_error {
            return Err(e.into());
        }

        tracing::info!(
            group_id,
            actor = %actor.employee_id,
            created = created.len(),
            "lessons generated"
        );
        Ok(created)
    }

    // ==========================================
    // 课次
    // ==========================================

    pub fn create_lesson(
        &self,
        actor: &Actor,
        group_id: &str,
        request: CreateLessonRequest,
    ) -> ApiResult<LessonOccurrence> {
        require_recognized(actor)?;
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;

        if let Some(duration) = request.duration_minutes {
            if duration <= 0 {
                return Err(ApiError::InvalidInput(format!("课时长必须为正数: {}", duration)));
            }
        }

        let lesson = LessonOccurrence {
            lesson_id: uuid::Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            date: request.date,
            time: request.time,
            duration_minutes: request.duration_minutes,
            topic: request.topic,
            is_cancelled: false,
            work_type: request.work_type,
        };
        self.lesson_repo.insert(&lesson)?;
        Ok(lesson)
    }

    pub fn get_lesson(&self, actor: &Actor, lesson_id: &str) -> ApiResult<LessonOccurrence> {
        let (lesson, _) = visible_lesson(
            &self.scope_resolver,
            &self.group_repo,
            &self.lesson_repo,
            actor,
            lesson_id,
        )?;
        Ok(lesson)
    }

    /// 列出课次 (日期降序)
    pub fn list_lessons(&self, actor: &Actor, group_id: Option<&str>) -> ApiResult<Vec<LessonOccurrence>> {
        let scope = self.scope_resolver.resolve(actor);
        Ok(self.lesson_repo.list(&scope.group_filter("g"), group_id)?)
    }

    pub fn cancel_lesson(&self, actor: &Actor, lesson_id: &str) -> ApiResult<()> {
        self.set_cancelled(actor, lesson_id, true)
    }

    pub fn restore_lesson(&self, actor: &Actor, lesson_id: &str) -> ApiResult<()> {
        self.set_cancelled(actor, lesson_id, false)
    }

    fn set_cancelled(&self, actor: &Actor, lesson_id: &str, cancelled: bool) -> ApiResult<()> {
        require_recognized(actor)?;
        visible_lesson(
            &self.scope_resolver,
            &self.group_repo,
            &self.lesson_repo,
            actor,
            lesson_id,
        )?;
        self.lesson_repo.set_cancelled(lesson_id, cancelled)?;
        tracing::info!(lesson_id, cancelled, actor = %actor.employee_id, "lesson cancellation changed");
        Ok(())
    }

    // ==========================================
    // 出勤
    // ==========================================

    pub fn record_attendance(
        &self,
        actor: &Actor,
        lesson_id: &str,
        request: RecordAttendanceRequest,
    ) -> ApiResult<LessonAttendance> {
        require_recognized(actor)?;
        let (lesson, _) = visible_lesson(
            &self.scope_resolver,
            &self.group_repo,
            &self.lesson_repo,
            actor,
            lesson_id,
        )?;
        if lesson.is_cancelled {
            return Err(ApiError::BusinessRuleViolation(format!(
                "课次已取消，不能记录出勤: lesson_id={}",
                lesson_id
            )));
        }
        if self.student_repo.find_by_id(&request.student_id)?.is_none() {
            return Err(ApiError::not_found("Student", &request.student_id));
        }
        if let Some(late) = request.late_minutes {
            if late < 0 {
                return Err(ApiError::InvalidInput(format!("迟到分钟数不能为负: {}", late)));
            }
        }

        let mut attendance = LessonAttendance {
            attendance_id: uuid::Uuid::new_v4().to_string(),
            lesson_id: lesson_id.to_string(),
            student_id: request.student_id,
            status: request.status,
            late_minutes: request.late_minutes,
            lesson_grade: request.lesson_grade,
            homework_grade: request.homework_grade,
        };
        attendance.attendance_id = self.lesson_repo.upsert_attendance(&attendance)?;
        Ok(attendance)
    }

    pub fn list_attendance(&self, actor: &Actor, lesson_id: &str) -> ApiResult<Vec<LessonAttendance>> {
        visible_lesson(
            &self.scope_resolver,
            &self.group_repo,
            &self.lesson_repo,
            actor,
            lesson_id,
        )?;
        Ok(self.lesson_repo.list_attendance(lesson_id)?)
    }
}
