// ==========================================
// 校务运营管理系统 - 权限范围解析器
// ==========================================
// 输入: 已认证的 Actor (角色 + 可选校区)
// 输出: AccessScope，对每类实体给出一个过滤谓词
// 规则 (按优先级):
//   1) 管理员 → 不限范围
//   2) 教师 → 只看自己任教班级及其下属实体
//   3) 校区负责人 → 只看本校区班级；无校区时什么都看不到
//      学生额外可见"没有任何在读班级"的学生
//   4) 日报/任务: 校区负责人只看自己写的日报、分配给自己的任务
//   5) 未识别角色 → 什么都看不到
// 红线: 只读、不报错；"无校区"是显式三态，不是魔法 ID
// ==========================================

use crate::domain::{Actor, Group, ReportSubmission, Role, WorkItem};
use serde::{Deserialize, Serialize};

/// 范围归属键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKey {
    /// 班级 teacher_id = 该员工
    Teacher(String),
    /// 班级 location_id = 该校区
    Location(String),
    /// 日报作者 / 任务负责人 = 该员工
    Manager(String),
}

/// 三态范围谓词
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopePredicate {
    Unscoped,
    ScopedTo(ScopeKey),
    ScopedToNothing,
}

/// 参数化 SQL 片段，直接拼进仓储层 WHERE 子句
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<String>,
}

impl SqlFilter {
    fn always() -> Self {
        Self {
            clause: "1 = 1".to_string(),
            params: Vec::new(),
        }
    }

    fn never() -> Self {
        Self {
            clause: "1 = 0".to_string(),
            params: Vec::new(),
        }
    }

    fn eq(column: String, value: &str) -> Self {
        Self {
            clause: format!("{} = ?", column),
            params: vec![value.to_string()],
        }
    }
}

// ==========================================
// AccessScope - 单个 Actor 的完整可见范围
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessScope {
    /// 班级 / 课次 / 出勤
    pub groups: ScopePredicate,
    /// 学生是否额外包含"无在读班级"的学生
    pub include_unassigned_students: bool,
    /// 日报 / 任务
    pub work: ScopePredicate,
}

impl AccessScope {
    pub fn unscoped() -> Self {
        Self {
            groups: ScopePredicate::Unscoped,
            include_unassigned_students: true,
            work: ScopePredicate::Unscoped,
        }
    }

    pub fn nothing() -> Self {
        Self {
            groups: ScopePredicate::ScopedToNothing,
            include_unassigned_students: false,
            work: ScopePredicate::ScopedToNothing,
        }
    }

    // ===== 内存谓词 =====

    pub fn matches_group(&self, group: &Group) -> bool {
        match &self.groups {
            ScopePredicate::Unscoped => true,
            ScopePredicate::ScopedToNothing => false,
            ScopePredicate::ScopedTo(ScopeKey::Teacher(id)) => group.teacher_id == *id,
            ScopePredicate::ScopedTo(ScopeKey::Location(id)) => {
                group.location_id.as_deref() == Some(id.as_str())
            }
            ScopePredicate::ScopedTo(ScopeKey::Manager(_)) => false,
        }
    }

    /// 学生可见性
    ///
    /// # 参数
    /// - `active_groups`: 学生当前在读 (未归档) 的班级
    pub fn matches_student(&self, active_groups: &[Group]) -> bool {
        if self.groups == ScopePredicate::Unscoped {
            return true;
        }
        if active_groups.is_empty() {
            return self.include_unassigned_students;
        }
        active_groups.iter().any(|g| self.matches_group(g))
    }

    pub fn matches_report(&self, report: &ReportSubmission) -> bool {
        match &self.work {
            ScopePredicate::Unscoped => true,
            ScopePredicate::ScopedToNothing => false,
            ScopePredicate::ScopedTo(ScopeKey::Manager(id)) => report.employee_id == *id,
            ScopePredicate::ScopedTo(_) => false,
        }
    }

    pub fn matches_task(&self, task: &WorkItem) -> bool {
        match &self.work {
            ScopePredicate::Unscoped => true,
            ScopePredicate::ScopedToNothing => false,
            ScopePredicate::ScopedTo(ScopeKey::Manager(id)) => {
                task.assigned_to.as_deref() == Some(id.as_str())
            }
            ScopePredicate::ScopedTo(_) => false,
        }
    }

    // ===== SQL 谓词 =====

    /// 班级过滤 (`group_alias` 为 groups 表别名)
    pub fn group_filter(&self, group_alias: &str) -> SqlFilter {
        match &self.groups {
            ScopePredicate::Unscoped => SqlFilter::always(),
            ScopePredicate::ScopedToNothing => SqlFilter::never(),
            ScopePredicate::ScopedTo(ScopeKey::Teacher(id)) => {
                SqlFilter::eq(format!("{}.teacher_id", group_alias), id)
            }
            ScopePredicate::ScopedTo(ScopeKey::Location(id)) => {
                SqlFilter::eq(format!("{}.location_id", group_alias), id)
            }
            ScopePredicate::ScopedTo(ScopeKey::Manager(_)) => SqlFilter::never(),
        }
    }

    /// 学生过滤 (`student_alias` 为 students 表别名)
    ///
    /// 在读班级命中范围，或 (允许时) 没有任何在读班级
    pub fn student_filter(&self, student_alias: &str) -> SqlFilter {
        if self.groups == ScopePredicate::Unscoped {
            return SqlFilter::always();
        }

        let inner = self.group_filter("sg");
        let mut clause = format!(
            "EXISTS (SELECT 1 FROM group_students sm JOIN groups sg ON sg.group_id = sm.group_id \
             WHERE sm.student_id = {alias}.student_id AND sm.is_archived = 0 AND {inner})",
            alias = student_alias,
            inner = inner.clause
        );
        if self.include_unassigned_students {
            clause = format!(
                "({} OR NOT EXISTS (SELECT 1 FROM group_students um \
                 WHERE um.student_id = {}.student_id AND um.is_archived = 0))",
                clause, student_alias
            );
        }

        SqlFilter {
            clause,
            params: inner.params,
        }
    }

    /// 日报过滤 (`report_alias` 为 daily_reports 表别名)
    pub fn report_filter(&self, report_alias: &str) -> SqlFilter {
        match &self.work {
            ScopePredicate::Unscoped => SqlFilter::always(),
            ScopePredicate::ScopedTo(ScopeKey::Manager(id)) => {
                SqlFilter::eq(format!("{}.employee_id", report_alias), id)
            }
            _ => SqlFilter::never(),
        }
    }

    /// 任务过滤 (`task_alias` 为 tasks 表别名)
    pub fn task_filter(&self, task_alias: &str) -> SqlFilter {
        match &self.work {
            ScopePredicate::Unscoped => SqlFilter::always(),
            ScopePredicate::ScopedTo(ScopeKey::Manager(id)) => {
                SqlFilter::eq(format!("{}.assigned_to", task_alias), id)
            }
            _ => SqlFilter::never(),
        }
    }
}

// ==========================================
// ScopeResolver - 范围解析器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScopeResolver;

impl ScopeResolver {
    pub fn new() -> Self {
        Self
    }

    /// 解析 Actor 的可见范围
    pub fn resolve(&self, actor: &Actor) -> AccessScope {
        let scope = match actor.role {
            Role::Admin => AccessScope::unscoped(),
            Role::Teacher => AccessScope {
                groups: ScopePredicate::ScopedTo(ScopeKey::Teacher(actor.employee_id.clone())),
                include_unassigned_students: false,
                work: ScopePredicate::Unscoped,
            },
            Role::Manager => {
                let groups = match actor.location_id.as_deref().map(str::trim) {
                    Some(id) if !id.is_empty() => {
                        ScopePredicate::ScopedTo(ScopeKey::Location(id.to_string()))
                    }
                    _ => ScopePredicate::ScopedToNothing,
                };
                AccessScope {
                    groups,
                    include_unassigned_students: true,
                    work: ScopePredicate::ScopedTo(ScopeKey::Manager(actor.employee_id.clone())),
                }
            }
            Role::Unrecognized => AccessScope::nothing(),
        };

        tracing::debug!(
            employee_id = %actor.employee_id,
            role = %actor.role,
            groups = ?scope.groups,
            work = ?scope.work,
            "scope resolved"
        );
        scope
    }
}
