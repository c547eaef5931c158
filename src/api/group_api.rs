// ==========================================
// 校务运营管理系统 - 班级 API
// ==========================================
// 职责: 班级、周课表规则、学生入班管理
// 权限: 读取经权限范围过滤；写操作要求班级在主体的可见范围内
//       新建班级: 管理员任意校区，校区负责人仅本校区
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::access::{require_recognized, visible_group};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::{
    parse_weekday_name, Actor, Group, GroupMembership, RecurringSlot, Role,
    DEFAULT_SLOT_DURATION_MINUTES,
};
use crate::engine::ScopeResolver;
use crate::repository::row_codec::now_ts;
use crate::repository::{GroupRepository, StudentRepository};

/// 新建班级请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub teacher_id: String,
    pub location_id: Option<String>,
    pub start_date: Option<NaiveDate>,
}

/// 新增周课表规则请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSlotRequest {
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub duration_minutes: Option<i32>,
}

// ==========================================
// GroupApi - 班级 API
// ==========================================
pub struct GroupApi {
    group_repo: Arc<GroupRepository>,
    student_repo: Arc<StudentRepository>,
    scope_resolver: Arc<ScopeResolver>,
}

impl GroupApi {
    pub fn new(
        group_repo: Arc<GroupRepository>,
        student_repo: Arc<StudentRepository>,
        scope_resolver: Arc<ScopeResolver>,
    ) -> Self {
        Self {
            group_repo,
            student_repo,
            scope_resolver,
        }
    }

    // ==========================================
    // 班级
    // ==========================================

    pub fn create_group(&self, actor: &Actor, request: CreateGroupRequest) -> ApiResult<Group> {
        if request.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("班级名称不能为空".to_string()));
        }
        if request.teacher_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("任课教师不能为空".to_string()));
        }

        match actor.role {
            Role::Admin => {}
            Role::Manager => {
                let own = actor.location_id.as_deref();
                if own.is_none() || request.location_id.as_deref() != own {
                    return Err(ApiError::AccessDenied(
                        "校区负责人只能在本校区新建班级".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ApiError::AccessDenied(format!(
                    "无权新建班级: employee_id={}",
                    actor.employee_id
                )))
            }
        }

        let group = Group {
            group_id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            teacher_id: request.teacher_id,
            location_id: request.location_id,
            start_date: request.start_date,
            created_at: now_ts(),
        };
        self.group_repo.insert(&group)?;

        tracing::info!(group_id = %group.group_id, actor = %actor.employee_id, "group created");
        Ok(group)
    }

    pub fn get_group(&self, actor: &Actor, group_id: &str) -> ApiResult<Group> {
        let (_, group) = visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;
        Ok(group)
    }

    pub fn list_groups(&self, actor: &Actor) -> ApiResult<Vec<Group>> {
        let scope = self.scope_resolver.resolve(actor);
        Ok(self.group_repo.list(&scope.group_filter("g"))?)
    }

    /// 设置 / 清除开课日期
    pub fn set_start_date(
        &self,
        actor: &Actor,
        group_id: &str,
        start_date: Option<NaiveDate>,
    ) -> ApiResult<()> {
        require_recognized(actor)?;
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;
        self.group_repo.set_start_date(group_id, start_date)?;
        Ok(())
    }

    /// 删除班级 (教师不可删除)
    pub fn delete_group(&self, actor: &Actor, group_id: &str) -> ApiResult<()> {
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;
        if !matches!(actor.role, Role::Admin | Role::Manager) {
            return Err(ApiError::access_denied("Group", group_id));
        }
        self.group_repo.delete(group_id)?;
        tracing::info!(group_id, actor = %actor.employee_id, "group deleted");
        Ok(())
    }

    // ==========================================
    // 周课表规则
    // ==========================================

    /// 新增周课表规则
    ///
    /// 星期名称无法识别时仍然保存，展开时跳过
    pub fn add_slot(&self, actor: &Actor, group_id: &str, request: AddSlotRequest) -> ApiResult<RecurringSlot> {
        require_recognized(actor)?;
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;

        let day_of_week = request.day_of_week.trim().to_string();
        if day_of_week.is_empty() {
            return Err(ApiError::InvalidInput("星期不能为空".to_string()));
        }
        let duration_minutes = request.duration_minutes.unwrap_or(DEFAULT_SLOT_DURATION_MINUTES);
        if duration_minutes <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "课时长必须为正数: {}",
                duration_minutes
            )));
        }
        if parse_weekday_name(&day_of_week).is_none() {
            tracing::warn!(group_id, day_of_week = %day_of_week, "slot saved with unrecognized weekday name");
        }

        let slot = RecurringSlot {
            slot_id: uuid::Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            day_of_week,
            start_time: request.start_time,
            duration_minutes,
        };
        self.group_repo.add_slot(&slot)?;
        Ok(slot)
    }

    pub fn list_slots(&self, actor: &Actor, group_id: &str) -> ApiResult<Vec<RecurringSlot>> {
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;
        Ok(self.group_repo.list_slots(group_id)?)
    }

    /// 删除周课表规则 (已生成的课次不受影响)
    pub fn delete_slot(&self, actor: &Actor, slot_id: &str) -> ApiResult<()> {
        require_recognized(actor)?;
        let group_id = self
            .group_repo
            .find_slot_group(slot_id)?
            .ok_or_else(|| ApiError::not_found("RecurringSlot", slot_id))?;
        visible_group(&self.scope_resolver, &self.group_repo, actor, &group_id)?;
        self.group_repo.delete_slot(slot_id)?;
        Ok(())
    }

    // ==========================================
    // 学生入班
    // ==========================================

    pub fn add_student(&self, actor: &Actor, group_id: &str, student_id: &str) -> ApiResult<GroupMembership> {
        require_recognized(actor)?;
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;

        if self.student_repo.find_by_id(student_id)?.is_none() {
            return Err(ApiError::not_found("Student", student_id));
        }
        let already_active = self
            .group_repo
            .list_memberships(group_id)?
            .iter()
            .any(|m| m.student_id == student_id && m.is_active());
        if already_active {
            return Err(ApiError::BusinessRuleViolation(format!(
                "学生已在班级中: student_id={}, group_id={}",
                student_id, group_id
            )));
        }

        let membership = GroupMembership {
            membership_id: uuid::Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            student_id: student_id.to_string(),
            is_archived: false,
            joined_at: now_ts(),
        };
        self.group_repo.add_membership(&membership)?;
        Ok(membership)
    }

    /// 归档学生的入班记录 (学生离班)
    pub fn archive_student(&self, actor: &Actor, group_id: &str, student_id: &str) -> ApiResult<()> {
        require_recognized(actor)?;
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;
        if self.group_repo.archive_membership(group_id, student_id)? == 0 {
            return Err(ApiError::NotFound(format!(
                "有效入班记录不存在: student_id={}, group_id={}",
                student_id, group_id
            )));
        }
        Ok(())
    }

    pub fn list_members(&self, actor: &Actor, group_id: &str) -> ApiResult<Vec<GroupMembership>> {
        visible_group(&self.scope_resolver, &self.group_repo, actor, group_id)?;
        Ok(self.group_repo.list_memberships(group_id)?)
    }
}
