// ==========================================
// 校务运营管理系统 - 员工与认证主体
// ==========================================
// Employee: 员工档案 (employees 表)
// Actor: 已认证的操作主体 = 角色 + 可选的所属校区
// 校区负责人的校区来自 school_locations.manager_id 反向引用
// ==========================================

use crate::domain::types::Role;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

/// 已认证的操作主体
///
/// 由认证层提供，每次调用都携带；权限范围只由 role + location_id 决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub employee_id: String,
    pub role: Role,
    /// 仅对校区负责人有意义
    pub location_id: Option<String>,
}

impl Actor {
    pub fn admin(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            role: Role::Admin,
            location_id: None,
        }
    }

    pub fn teacher(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            role: Role::Teacher,
            location_id: None,
        }
    }

    pub fn manager(employee_id: impl Into<String>, location_id: Option<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            role: Role::Manager,
            location_id,
        }
    }
}
