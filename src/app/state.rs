// ==========================================
// 校务运营管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和 API 实例
// 所有仓储共享同一个 Arc<Mutex<Connection>>
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{GroupApi, LessonApi, LocationApi, ReportApi, StudentApi, WeeklyReportApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{
    InMemoryTaskEventHub, OptionalEventPublisher, ReportNarrator, ScopeResolver, TemplateNarrator,
};
use crate::repository::{
    EmployeeRepository, GroupRepository, LessonRepository, LocationRepository, ReportRepository,
    StudentRepository, TaskRepository, WeeklyReportRepository,
};

/// 应用状态
///
/// 包含所有 API 实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub location_api: Arc<LocationApi>,
    pub group_api: Arc<GroupApi>,
    pub student_api: Arc<StudentApi>,
    pub lesson_api: Arc<LessonApi>,
    pub report_api: Arc<ReportApi>,
    pub weekly_report_api: Arc<WeeklyReportApi>,

    /// 员工仓储 (外层用它把登录身份解析为 Actor)
    pub employee_repo: Arc<EmployeeRepository>,

    pub config_manager: Arc<ConfigManager>,

    /// 任务事件中心 (订阅 tasks 主题)
    pub event_hub: Arc<InMemoryTaskEventHub>,
}

impl AppState {
    /// 创建新的 AppState 实例 (周报文本使用模板生成)
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_narrator(db_path, Arc::new(TemplateNarrator))
    }

    /// 创建 AppState 并注入周报文本生成器
    pub fn with_narrator(db_path: String, narrator: Arc<dyn ReportNarrator>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let employee_repo = Arc::new(EmployeeRepository::new(conn.clone()));
        let location_repo = Arc::new(LocationRepository::new(conn.clone()));
        let group_repo = Arc::new(GroupRepository::new(conn.clone()));
        let student_repo = Arc::new(StudentRepository::new(conn.clone()));
        let lesson_repo = Arc::new(LessonRepository::new(conn.clone()));
        let report_repo = Arc::new(ReportRepository::new(conn.clone()));
        let task_repo = Arc::new(TaskRepository::new(conn.clone()));
        let weekly_report_repo = Arc::new(WeeklyReportRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let scope_resolver = Arc::new(ScopeResolver::new());
        let event_hub = Arc::new(InMemoryTaskEventHub::new());
        let event_publisher = OptionalEventPublisher::with_publisher(event_hub.clone());

        // ==========================================
        // 初始化API层
        // ==========================================
        let location_api = Arc::new(LocationApi::new(location_repo, employee_repo.clone()));
        let group_api = Arc::new(GroupApi::new(
            group_repo.clone(),
            student_repo.clone(),
            scope_resolver.clone(),
        ));
        let student_api = Arc::new(StudentApi::new(
            student_repo.clone(),
            group_repo.clone(),
            scope_resolver.clone(),
        ));
        let lesson_api = Arc::new(LessonApi::new(
            group_repo.clone(),
            lesson_repo.clone(),
            student_repo.clone(),
            config_manager.clone(),
            scope_resolver.clone(),
        ));
        let report_api = Arc::new(ReportApi::new(
            report_repo,
            task_repo,
            scope_resolver.clone(),
            event_publisher,
        ));
        let weekly_report_api = Arc::new(WeeklyReportApi::new(
            student_repo,
            group_repo,
            lesson_repo,
            weekly_report_repo,
            config_manager.clone(),
            scope_resolver,
            narrator,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            location_api,
            group_api,
            student_api,
            lesson_api,
            report_api,
            weekly_report_api,
            employee_repo,
            config_manager,
            event_hub,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - `SCHOOL_OPS_DB_PATH` 非空时直接使用
/// - 否则: 用户数据目录/school-ops/school_ops.db
/// - 取不到用户数据目录时: ./school_ops.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("SCHOOL_OPS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./school_ops.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("school-ops");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("无法创建数据目录 {}: {}", dir.display(), e);
        } else {
            path = dir.join("school_ops.db");
        }
    }

    path.to_string_lossy().to_string()
}
