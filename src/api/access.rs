// ==========================================
// 校务运营管理系统 - 单条读取的权限校验
// ==========================================
// 规则: 先按主键加载，不存在 → NotFound；存在但不在权限范围 → AccessDenied
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Actor, Group, LessonOccurrence, ReportSubmission, Role, Student, WorkItem};
use crate::engine::{AccessScope, ScopeResolver};
use crate::repository::{
    GroupRepository, LessonRepository, ReportRepository, StudentRepository, TaskRepository,
};

/// 角色未识别的主体不允许任何写操作
pub(crate) fn require_recognized(actor: &Actor) -> ApiResult<()> {
    if actor.role == Role::Unrecognized {
        return Err(ApiError::AccessDenied(format!(
            "未识别的角色: employee_id={}",
            actor.employee_id
        )));
    }
    Ok(())
}

pub(crate) fn require_admin(actor: &Actor) -> ApiResult<()> {
    if actor.role != Role::Admin {
        return Err(ApiError::AccessDenied(format!(
            "需要管理员权限: employee_id={}",
            actor.employee_id
        )));
    }
    Ok(())
}

pub(crate) fn visible_group(
    resolver: &ScopeResolver,
    group_repo: &GroupRepository,
    actor: &Actor,
    group_id: &str,
) -> ApiResult<(AccessScope, Group)> {
    let scope = resolver.resolve(actor);
    let group = group_repo
        .find_by_id(group_id)?
        .ok_or_else(|| ApiError::not_found("Group", group_id))?;
    if !scope.matches_group(&group) {
        return Err(ApiError::access_denied("Group", group_id));
    }
    Ok((scope, group))
}

/// 课次的可见性跟随所属班级
pub(crate) fn visible_lesson(
    resolver: &ScopeResolver,
    group_repo: &GroupRepository,
    lesson_repo: &LessonRepository,
    actor: &Actor,
    lesson_id: &str,
) -> ApiResult<(LessonOccurrence, Group)> {
    let lesson = lesson_repo
        .find_by_id(lesson_id)?
        .ok_or_else(|| ApiError::not_found("Lesson", lesson_id))?;
    let group = group_repo
        .find_by_id(&lesson.group_id)?
        .ok_or_else(|| ApiError::not_found("Group", &lesson.group_id))?;
    if !resolver.resolve(actor).matches_group(&group) {
        return Err(ApiError::access_denied("Lesson", lesson_id));
    }
    Ok((lesson, group))
}

/// 学生的可见性按其有效入班的班级判断
pub(crate) fn visible_student(
    resolver: &ScopeResolver,
    student_repo: &StudentRepository,
    group_repo: &GroupRepository,
    actor: &Actor,
    student_id: &str,
) -> ApiResult<Student> {
    let student = student_repo
        .find_by_id(student_id)?
        .ok_or_else(|| ApiError::not_found("Student", student_id))?;
    let active_groups = group_repo.active_groups_for_student(student_id)?;
    if !resolver.resolve(actor).matches_student(&active_groups) {
        return Err(ApiError::access_denied("Student", student_id));
    }
    Ok(student)
}

pub(crate) fn visible_report(
    resolver: &ScopeResolver,
    report_repo: &ReportRepository,
    actor: &Actor,
    report_id: &str,
) -> ApiResult<(AccessScope, ReportSubmission)> {
    let scope = resolver.resolve(actor);
    let report = report_repo
        .find_by_id(report_id)?
        .ok_or_else(|| ApiError::not_found("ReportSubmission", report_id))?;
    if !scope.matches_report(&report) {
        return Err(ApiError::access_denied("ReportSubmission", report_id));
    }
    Ok((scope, report))
}

pub(crate) fn visible_task(
    resolver: &ScopeResolver,
    task_repo: &TaskRepository,
    actor: &Actor,
    task_id: &str,
) -> ApiResult<WorkItem> {
    let task = task_repo
        .find_by_id(task_id)?
        .ok_or_else(|| ApiError::not_found("WorkItem", task_id))?;
    if !resolver.resolve(actor).matches_task(&task) {
        return Err(ApiError::access_denied("WorkItem", task_id));
    }
    Ok(task)
}
