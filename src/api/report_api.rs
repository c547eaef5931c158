// ==========================================
// 校务运营管理系统 - 日报与任务 API
// ==========================================
// 职责: 日报生命周期 (草稿 ⇄ 已完成)、任务维护、任务结转视图
// 事件: 任务的新建/更新/删除都发布到 tasks 主题，发布失败只记日志
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::access::{require_recognized, visible_report, visible_task};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Actor, ReportStatus, ReportSubmission, Role, TaskStatus, WorkItem};
use crate::engine::{
    apply_action, select_anchor, CarryoverResult, LifecycleAction, OptionalEventPublisher,
    ScopeResolver, TaskCarryoverFilter, TaskEvent, TASKS_TOPIC,
};
use crate::perf::PerfGuard;
use crate::repository::row_codec::now_ts;
use crate::repository::{ReportRepository, TaskRepository};

/// 新建日报请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportRequest {
    pub report_date: NaiveDate,
    pub day_comment: Option<String>,
}

/// 新建任务请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub report_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
}

// ==========================================
// ReportApi - 日报与任务 API
// ==========================================
pub struct ReportApi {
    report_repo: Arc<ReportRepository>,
    task_repo: Arc<TaskRepository>,
    scope_resolver: Arc<ScopeResolver>,
    carryover: TaskCarryoverFilter,
    event_publisher: OptionalEventPublisher,
}

impl ReportApi {
    pub fn new(
        report_repo: Arc<ReportRepository>,
        task_repo: Arc<TaskRepository>,
        scope_resolver: Arc<ScopeResolver>,
        event_publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            report_repo,
            task_repo,
            scope_resolver,
            carryover: TaskCarryoverFilter::new(),
            event_publisher,
        }
    }

    // ==========================================
    // 日报
    // ==========================================

    /// 新建日报 (作者为当前主体，初始为草稿)
    pub fn create_report(&self, actor: &Actor, request: CreateReportRequest) -> ApiResult<ReportSubmission> {
        require_recognized(actor)?;

        let report = ReportSubmission {
            report_id: uuid::Uuid::new_v4().to_string(),
            employee_id: actor.employee_id.clone(),
            report_date: request.report_date,
            created_at: now_ts(),
            status: ReportStatus::Draft,
            day_comment: request.day_comment,
        };
        self.report_repo.insert(&report)?;

        tracing::info!(report_id = %report.report_id, author = %report.employee_id, "report created");
        Ok(report)
    }

    pub fn get_report(&self, actor: &Actor, report_id: &str) -> ApiResult<ReportSubmission> {
        let (_, report) = visible_report(&self.scope_resolver, &self.report_repo, actor, report_id)?;
        Ok(report)
    }

    /// 列出可见日报 (业务日期降序)
    pub fn list_reports(&self, actor: &Actor) -> ApiResult<Vec<ReportSubmission>> {
        let scope = self.scope_resolver.resolve(actor);
        Ok(self.report_repo.list(&scope.report_filter("r"))?)
    }

    pub fn complete_report(&self, actor: &Actor, report_id: &str) -> ApiResult<ReportSubmission> {
        self.transition(actor, report_id, LifecycleAction::Complete)
    }

    pub fn reopen_report(&self, actor: &Actor, report_id: &str) -> ApiResult<ReportSubmission> {
        self.transition(actor, report_id, LifecycleAction::Reopen)
    }

    /// 日报状态迁移；目标状态与当前一致时不写库
    fn transition(
        &self,
        actor: &Actor,
        report_id: &str,
        action: LifecycleAction,
    ) -> ApiResult<ReportSubmission> {
        let mut report = self.owned_report(actor, report_id)?;

        match apply_action(report.status, action) {
            Some(next) => {
                self.report_repo.update_status(report_id, next)?;
                tracing::info!(
                    report_id,
                    from = %report.status,
                    to = %next,
                    actor = %actor.employee_id,
                    "report status changed"
                );
                report.status = next;
            }
            None => {
                tracing::debug!(report_id, status = %report.status, "report status unchanged");
            }
        }
        Ok(report)
    }

    pub fn update_comment(&self, actor: &Actor, report_id: &str, day_comment: Option<&str>) -> ApiResult<()> {
        self.owned_report(actor, report_id)?;
        self.report_repo.update_comment(report_id, day_comment)?;
        Ok(())
    }

    /// 删除日报，挂靠的任务保留 (report_id 置空)
    ///
    /// # 返回
    /// - 被解除挂靠的任务数
    pub fn delete_report(&self, actor: &Actor, report_id: &str) -> ApiResult<usize> {
        self.owned_report(actor, report_id)?;
        let detached = self.report_repo.delete(report_id)?;
        tracing::info!(report_id, detached, actor = %actor.employee_id, "report deleted");
        Ok(detached)
    }

    /// 日报写操作: 作者本人或管理员
    fn owned_report(&self, actor: &Actor, report_id: &str) -> ApiResult<ReportSubmission> {
        require_recognized(actor)?;
        let (_, report) = visible_report(&self.scope_resolver, &self.report_repo, actor, report_id)?;
        if actor.role != Role::Admin && report.employee_id != actor.employee_id {
            return Err(ApiError::access_denied("ReportSubmission", report_id));
        }
        Ok(report)
    }

    // ==========================================
    // 任务结转视图
    // ==========================================

    /// 某份日报视角下可见的任务
    ///
    /// 锚点为同一作者更早创建、且当前为已完成的最近一份日报；
    /// 锚点之前已完成的任务不再出现
    pub fn visible_tasks(&self, actor: &Actor, report_id: &str) -> ApiResult<Vec<WorkItem>> {
        Ok(self.carryover_for(actor, report_id)?.visible)
    }

    /// 同 visible_tasks，附带锚点与被隐藏的任务数
    pub fn carryover_for(&self, actor: &Actor, report_id: &str) -> ApiResult<CarryoverResult> {
        let _perf = PerfGuard::new("visible_tasks");

        let (scope, report) = visible_report(&self.scope_resolver, &self.report_repo, actor, report_id)?;
        let tasks = self.task_repo.list(&scope.task_filter("t"))?;
        let history = self.report_repo.list_by_author(&report.employee_id)?;
        let anchor = select_anchor(&history, &report);

        Ok(self.carryover.filter(tasks, anchor))
    }

    // ==========================================
    // 任务
    // ==========================================

    pub fn create_task(&self, actor: &Actor, request: CreateTaskRequest) -> ApiResult<WorkItem> {
        require_recognized(actor)?;
        if request.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("任务标题不能为空".to_string()));
        }
        if let Some(report_id) = request.report_id.as_deref() {
            visible_report(&self.scope_resolver, &self.report_repo, actor, report_id)?;
        }

        let task = WorkItem {
            task_id: uuid::Uuid::new_v4().to_string(),
            report_id: request.report_id,
            title: request.title.trim().to_string(),
            description: request.description,
            status: TaskStatus::New,
            assigned_to: request.assigned_to,
            created_at: now_ts(),
        };
        self.task_repo.insert(&task)?;

        self.publish(TaskEvent::created(task.clone()));
        Ok(task)
    }

    pub fn get_task(&self, actor: &Actor, task_id: &str) -> ApiResult<WorkItem> {
        visible_task(&self.scope_resolver, &self.task_repo, actor, task_id)
    }

    /// 列出可见任务 (created_at 降序，不做结转过滤)
    pub fn list_tasks(&self, actor: &Actor) -> ApiResult<Vec<WorkItem>> {
        let scope = self.scope_resolver.resolve(actor);
        Ok(self.task_repo.list(&scope.task_filter("t"))?)
    }

    pub fn update_task_status(&self, actor: &Actor, task_id: &str, status: TaskStatus) -> ApiResult<WorkItem> {
        self.modify_task(actor, task_id, |task| task.status = status)
    }

    /// 指定 / 清除任务负责人
    pub fn assign_task(&self, actor: &Actor, task_id: &str, assigned_to: Option<String>) -> ApiResult<WorkItem> {
        self.modify_task(actor, task_id, |task| task.assigned_to = assigned_to)
    }

    fn modify_task<F>(&self, actor: &Actor, task_id: &str, change: F) -> ApiResult<WorkItem>
    where
        F: FnOnce(&mut WorkItem),
    {
        require_recognized(actor)?;
        let mut task = visible_task(&self.scope_resolver, &self.task_repo, actor, task_id)?;
        change(&mut task);
        self.task_repo.update(&task)?;

        self.publish(TaskEvent::updated(task.clone()));
        Ok(task)
    }

    pub fn delete_task(&self, actor: &Actor, task_id: &str) -> ApiResult<()> {
        require_recognized(actor)?;
        visible_task(&self.scope_resolver, &self.task_repo, actor, task_id)?;
        self.task_repo.delete(task_id)?;

        self.publish(TaskEvent::deleted(task_id));
        Ok(())
    }

    fn publish(&self, event: TaskEvent) {
        let action = event.action;
        let task_id = event.task_id.clone();
        match self.event_publisher.publish(TASKS_TOPIC, event) {
            Ok(receivers) => {
                tracing::debug!(task_id = %task_id, action = action.as_str(), receivers, "task event published")
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, action = action.as_str(), error = %e, "task event publish failed")
            }
        }
    }
}
