// ==========================================
// 校务运营管理系统 - 校区 API
// ==========================================
// 权限: 新建校区、指定负责人仅限管理员
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::access::require_admin;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Actor, Location, Role};
use crate::repository::row_codec::now_ts;
use crate::repository::{EmployeeRepository, LocationRepository};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub address: Option<String>,
}

pub struct LocationApi {
    location_repo: Arc<LocationRepository>,
    employee_repo: Arc<EmployeeRepository>,
}

impl LocationApi {
    pub fn new(location_repo: Arc<LocationRepository>, employee_repo: Arc<EmployeeRepository>) -> Self {
        Self {
            location_repo,
            employee_repo,
        }
    }

    pub fn create_location(&self, actor: &Actor, request: CreateLocationRequest) -> ApiResult<Location> {
        require_admin(actor)?;
        if request.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("校区名称不能为空".to_string()));
        }

        let location = Location {
            location_id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            address: request.address,
            manager_id: None,
            created_at: now_ts(),
        };
        self.location_repo.insert(&location)?;
        Ok(location)
    }

    pub fn list_locations(&self) -> ApiResult<Vec<Location>> {
        Ok(self.location_repo.list_all()?)
    }

    /// 指定 / 清除校区负责人
    ///
    /// 负责人必须是在职的 manager 角色员工；其原负责校区会被解除
    pub fn assign_manager(
        &self,
        actor: &Actor,
        location_id: &str,
        manager_id: Option<&str>,
    ) -> ApiResult<()> {
        require_admin(actor)?;

        if let Some(manager_id) = manager_id {
            let employee = self
                .employee_repo
                .find_by_id(manager_id)?
                .filter(|e| e.is_active)
                .ok_or_else(|| ApiError::not_found("Employee", manager_id))?;
            if employee.role != Role::Manager {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "员工不是校区负责人角色: employee_id={}, role={}",
                    manager_id, employee.role
                )));
            }
        }

        self.location_repo.assign_manager(location_id, manager_id)?;
        tracing::info!(location_id, manager_id = ?manager_id, "location manager assigned");
        Ok(())
    }
}
