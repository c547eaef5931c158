// ==========================================
// 校务运营管理系统 - 核心库
// ==========================================
// 范围: 课表展开、按角色的数据可见范围、日报/任务结转、家长周报
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AttendanceStatus, ReportStatus, Role, StudentStatus, TaskStatus, WorkType};

// 领域实体
pub use domain::{
    Actor, Employee, Group, GroupMembership, LessonAttendance, LessonOccurrence, Location,
    RecurringSlot, ReportSubmission, Student, WeeklyReport, WorkItem,
};

// 引擎
pub use engine::{AccessScope, LessonExpander, ScopeResolver, TaskCarryoverFilter};

// API
pub use api::{ApiError, ApiResult, GroupApi, LessonApi, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "校务运营管理系统";
