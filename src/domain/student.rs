// ==========================================
// 校务运营管理系统 - 学生
// ==========================================

use crate::domain::types::StudentStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub status: StudentStatus,
    pub created_at: NaiveDateTime,
}
