// ==========================================
// 校务运营管理系统 - 班级领域模型
// ==========================================
// Group 拥有 RecurringSlot / LessonOccurrence / GroupMembership (级联删除)
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::types::parse_weekday_name;

/// 默认课时长 (分钟)
pub const DEFAULT_SLOT_DURATION_MINUTES: i32 = 90;

// ==========================================
// Group - 班级
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub group_id: String,
    pub name: String,
    pub teacher_id: String,          // 任课教师 (权限归属)
    pub location_id: Option<String>, // 所属校区
    pub start_date: Option<NaiveDate>, // 开课日期 (排课锚点)，为空时不能展开课表
    pub created_at: NaiveDateTime,
}

// ==========================================
// RecurringSlot - 周课表规则
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSlot {
    pub slot_id: String,
    pub group_id: String,
    pub day_of_week: String, // 原始星期名称 (可能无法识别)
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
}

impl RecurringSlot {
    /// 解析星期；名称无法识别时返回 None
    pub fn weekday(&self) -> Option<Weekday> {
        parse_weekday_name(&self.day_of_week)
    }
}

// ==========================================
// GroupMembership - 学生入班记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub membership_id: String,
    pub group_id: String,
    pub student_id: String,
    pub is_archived: bool,
    pub joined_at: NaiveDateTime,
}

impl GroupMembership {
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }
}
