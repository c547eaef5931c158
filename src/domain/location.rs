// ==========================================
// 校务运营管理系统 - 校区
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 校区：拥有若干班级，至多一个负责人
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub location_id: String,
    pub name: String,
    pub address: Option<String>,
    pub manager_id: Option<String>,
    pub created_at: NaiveDateTime,
}
