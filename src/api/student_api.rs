// ==========================================
// 校务运营管理系统 - 学生 API
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::access::{require_recognized, visible_student};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Actor, Student, StudentStatus};
use crate::engine::ScopeResolver;
use crate::repository::row_codec::now_ts;
use crate::repository::{GroupRepository, StudentRepository};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    pub first_name: String,
    pub last_name: String,
}

pub struct StudentApi {
    student_repo: Arc<StudentRepository>,
    group_repo: Arc<GroupRepository>,
    scope_resolver: Arc<ScopeResolver>,
}

impl StudentApi {
    pub fn new(
        student_repo: Arc<StudentRepository>,
        group_repo: Arc<GroupRepository>,
        scope_resolver: Arc<ScopeResolver>,
    ) -> Self {
        Self {
            student_repo,
            group_repo,
            scope_resolver,
        }
    }

    pub fn create_student(&self, actor: &Actor, request: CreateStudentRequest) -> ApiResult<Student> {
        require_recognized(actor)?;
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("学生姓名不能为空".to_string()));
        }

        let student = Student {
            student_id: uuid::Uuid::new_v4().to_string(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            status: StudentStatus::Active,
            created_at: now_ts(),
        };
        self.student_repo.insert(&student)?;
        Ok(student)
    }

    pub fn get_student(&self, actor: &Actor, student_id: &str) -> ApiResult<Student> {
        visible_student(
            &self.scope_resolver,
            &self.student_repo,
            &self.group_repo,
            actor,
            student_id,
        )
    }

    /// 列出可见学生 (按姓氏排序)
    pub fn list_students(&self, actor: &Actor) -> ApiResult<Vec<Student>> {
        let scope = self.scope_resolver.resolve(actor);
        Ok(self.student_repo.list(&scope.student_filter("s"))?)
    }
}
