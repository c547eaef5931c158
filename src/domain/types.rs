// ==========================================
// 校务运营管理系统 - 领域类型定义
// ==========================================
// 角色 / 星期 / 日报状态 / 任务状态 / 课次类型
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 员工角色 (Role)
// ==========================================
// 数据库中出现未知取值时解析为 Unrecognized，权限上按"什么都看不到"处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,        // 管理员
    Teacher,      // 教师
    Manager,      // 校区负责人
    Unrecognized, // 未识别角色
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Manager => "manager",
            Role::Unrecognized => "unrecognized",
        }
    }

    pub fn parse(s: &str) -> Role {
        match s.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "teacher" => Role::Teacher,
            "manager" => Role::Manager,
            _ => Role::Unrecognized,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 星期名称解析
// ==========================================
// 课表使用俄文星期名 (Понедельник … Воскресенье)，英文名作为别名
const WEEKDAY_NAMES: [(&str, &str, Weekday); 7] = [
    ("понедельник", "monday", Weekday::Mon),
    ("вторник", "tuesday", Weekday::Tue),
    ("среда", "wednesday", Weekday::Wed),
    ("четверг", "thursday", Weekday::Thu),
    ("пятница", "friday", Weekday::Fri),
    ("суббота", "saturday", Weekday::Sat),
    ("воскресенье", "sunday", Weekday::Sun),
];

/// 解析课表中的星期名称，无法识别时返回 None
pub fn parse_weekday_name(name: &str) -> Option<Weekday> {
    let normalized = name.trim().to_lowercase();
    WEEKDAY_NAMES
        .iter()
        .find(|(ru, en, _)| *ru == normalized || *en == normalized)
        .map(|(_, _, weekday)| *weekday)
}

/// 星期对应的标准 (俄文) 名称
pub fn weekday_display_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Понедельник",
        Weekday::Tue => "Вторник",
        Weekday::Wed => "Среда",
        Weekday::Thu => "Четверг",
        Weekday::Fri => "Пятница",
        Weekday::Sat => "Суббота",
        Weekday::Sun => "Воскресенье",
    }
}

// ==========================================
// 日报状态 (Report Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Draft,     // 草稿
    Completed, // 已完成
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> ReportStatus {
        match s.trim().to_lowercase().as_str() {
            "completed" => ReportStatus::Completed,
            _ => ReportStatus::Draft,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 任务状态 (Task Status)
// ==========================================
// 四个状态之间可任意切换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Urgent,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Urgent => "urgent",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> TaskStatus {
        match s.trim().to_lowercase().as_str() {
            "in_progress" => TaskStatus::InProgress,
            "urgent" => TaskStatus::Urgent,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::New,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 课次类型 (Work Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    #[default]
    None,    // 普通课
    Control, // 小测
    Test,    // 考试
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::None => "none",
            WorkType::Control => "control",
            WorkType::Test => "test",
        }
    }

    pub fn parse(s: &str) -> WorkType {
        match s.trim().to_lowercase().as_str() {
            "control" => WorkType::Control,
            "test" => WorkType::Test,
            _ => WorkType::None,
        }
    }
}

// ==========================================
// 出勤状态 (Attendance Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present, // 出勤
    Absent,  // 缺勤
    Late,    // 迟到
    Trial,   // 试听
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Trial => "trial",
        }
    }

    pub fn parse(s: &str) -> Option<AttendanceStatus> {
        match s.trim().to_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            "trial" => Some(AttendanceStatus::Trial),
            _ => None,
        }
    }
}

// ==========================================
// 学生状态 (Student Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    Inactive,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> StudentStatus {
        match s.trim().to_lowercase().as_str() {
            "inactive" => StudentStatus::Inactive,
            _ => StudentStatus::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekday_name_russian_and_english() {
        assert_eq!(parse_weekday_name("Вторник"), Some(Weekday::Tue));
        assert_eq!(parse_weekday_name("  четверг "), Some(Weekday::Thu));
        assert_eq!(parse_weekday_name("Sunday"), Some(Weekday::Sun));
        assert_eq!(parse_weekday_name("Вторникк"), None);
        assert_eq!(parse_weekday_name(""), None);
    }

    #[test]
    fn test_weekday_display_roundtrip() {
        for (_, _, weekday) in WEEKDAY_NAMES.iter() {
            assert_eq!(parse_weekday_name(weekday_display_name(*weekday)), Some(*weekday));
        }
    }

    #[test]
    fn test_role_parse_unknown() {
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse("manager"), Role::Manager);
        assert_eq!(Role::parse("accountant"), Role::Unrecognized);
    }

    #[test]
    fn test_task_status_db_strings() {
        assert_eq!(TaskStatus::parse("in_progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::parse("garbage"), TaskStatus::New);
    }
}
