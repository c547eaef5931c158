// ==========================================
// 校务运营管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod actor;
pub mod group;
pub mod lesson;
pub mod location;
pub mod report;
pub mod student;
pub mod types;

// 重导出核心类型
pub use actor::{Actor, Employee};
pub use group::{Group, GroupMembership, RecurringSlot, DEFAULT_SLOT_DURATION_MINUTES};
pub use lesson::{LessonAttendance, LessonOccurrence};
pub use location::Location;
pub use report::{ReportSubmission, WeeklyReport, WorkItem};
pub use student::Student;
pub use types::{
    parse_weekday_name, weekday_display_name, AttendanceStatus, ReportStatus, Role,
    StudentStatus, TaskStatus, WorkType,
};
