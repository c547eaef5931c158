// ==========================================
// 校务运营管理系统 - 课次领域模型
// ==========================================
// LessonOccurrence: 周课表展开得到 (或人工补录) 的具体课次
// 约束: 同一班级同一日期预期至多一节课 (同批次内多条同星期规则除外)
// 课次从不被自动删除
// ==========================================

use crate::domain::types::{AttendanceStatus, WorkType};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonOccurrence {
    pub lesson_id: String,
    pub group_id: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub topic: Option<String>,
    pub is_cancelled: bool,
    pub work_type: WorkType,
}

impl LessonOccurrence {
    /// 创建一节未取消的普通课
    pub fn scheduled(
        group_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
    ) -> Self {
        Self {
            lesson_id: uuid::Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            date,
            time: Some(time),
            duration_minutes: Some(duration_minutes),
            topic: None,
            is_cancelled: false,
            work_type: WorkType::None,
        }
    }
}

/// 课次出勤记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonAttendance {
    pub attendance_id: String,
    pub lesson_id: String,
    pub student_id: String,
    pub status: AttendanceStatus,
    pub late_minutes: Option<i32>,
    pub lesson_grade: Option<String>,
    pub homework_grade: Option<String>,
}
