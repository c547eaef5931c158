// ==========================================
// 校务运营管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化；列表查询接收权限范围生成的 SqlFilter
// ==========================================

pub mod employee_repo;
pub mod error;
pub mod group_repo;
pub mod lesson_repo;
pub mod location_repo;
pub mod report_repo;
pub mod row_codec;
pub mod student_repo;
pub mod task_repo;
pub mod weekly_report_repo;

// 重导出核心仓储
pub use employee_repo::EmployeeRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use group_repo::GroupRepository;
pub use lesson_repo::LessonRepository;
pub use location_repo::LocationRepository;
pub use report_repo::ReportRepository;
pub use student_repo::StudentRepository;
pub use task_repo::TaskRepository;
pub use weekly_report_repo::WeeklyReportRepository;
