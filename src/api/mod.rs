// ==========================================
// 校务运营管理系统 - API 层
// ==========================================
// 职责: 对外业务接口；每个操作先解析主体的可见范围再访问仓储
// ==========================================

pub mod access;
pub mod error;
pub mod group_api;
pub mod lesson_api;
pub mod location_api;
pub mod report_api;
pub mod student_api;
pub mod weekly_report_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use group_api::{AddSlotRequest, CreateGroupRequest, GroupApi};
pub use lesson_api::{CreateLessonRequest, GenerateLessonsRequest, LessonApi, RecordAttendanceRequest};
pub use location_api::{CreateLocationRequest, LocationApi};
pub use report_api::{CreateReportRequest, CreateTaskRequest, ReportApi};
pub use student_api::{CreateStudentRequest, StudentApi};
pub use weekly_report_api::WeeklyReportApi;
