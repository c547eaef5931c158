// ==========================================
// 校务运营管理系统 - 引擎层
// ==========================================
// 职责: 实现业务规则 (课表展开、权限范围、日报生命周期、任务结转、周报统计)
// 红线: Engine 不持有连接；SQL 片段只由 scope_resolver 以参数化形式产出
// ==========================================

pub mod events;
pub mod lesson_expander;
pub mod report_lifecycle;
pub mod scope_resolver;
pub mod task_carryover;
pub mod weekly_digest;

// 重导出核心引擎
pub use events::{
    InMemoryTaskEventHub, NoOpEventPublisher, OptionalEventPublisher, TaskEvent, TaskEventAction,
    TaskEventPublisher, TASKS_TOPIC,
};
pub use lesson_expander::{
    ExpansionConfig, ExpansionError, ExpansionPlan, HorizonRequest, LessonExpander,
};
pub use report_lifecycle::{apply_action, select_anchor, LifecycleAction};
pub use scope_resolver::{AccessScope, ScopeKey, ScopePredicate, ScopeResolver, SqlFilter};
pub use task_carryover::{CarryoverResult, TaskCarryoverFilter};
pub use weekly_digest::{AttendanceDigest, DatedAttendance, ReportNarrator, TemplateNarrator};
