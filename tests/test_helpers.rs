// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、AppState 组装、按固定时间戳写入测试数据
// ==========================================

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use school_ops::app::AppState;
use school_ops::db::{init_schema, open_sqlite_connection};
use school_ops::domain::{
    Employee, Group, GroupMembership, Location, RecurringSlot, ReportStatus, ReportSubmission,
    Role, Student, StudentStatus, TaskStatus, WorkItem,
};
use school_ops::repository::{
    EmployeeRepository, GroupRepository, LocationRepository, ReportRepository, StudentRepository,
    TaskRepository,
};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> (NamedTempFile, String) {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path).unwrap();
    init_schema(&conn).unwrap();

    (temp_file, db_path)
}

/// 测试环境: AppState + 一条独立连接用于直接写入夹具数据
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
    pub conn: Arc<Mutex<Connection>>,
}

pub fn setup_env() -> TestEnv {
    let (temp_file, db_path) = create_test_db();
    let state = AppState::new(db_path.clone()).unwrap();
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));

    TestEnv {
        _temp_file: temp_file,
        db_path,
        state,
        conn,
    }
}

// ==========================================
// 时间辅助
// ==========================================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// "2026-03-01 09:00" 形式
pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

// ==========================================
// 夹具写入
// ==========================================

impl TestEnv {
    pub fn add_employee(&self, employee_id: &str, role: Role) {
        EmployeeRepository::new(self.conn.clone())
            .insert(&Employee {
                employee_id: employee_id.to_string(),
                first_name: employee_id.to_string(),
                last_name: "Test".to_string(),
                role,
                is_active: true,
                created_at: ts("2026-01-01 08:00"),
            })
            .unwrap();
    }

    pub fn add_location(&self, location_id: &str, manager_id: Option<&str>) {
        let repo = LocationRepository::new(self.conn.clone());
        repo.insert(&Location {
            location_id: location_id.to_string(),
            name: format!("Location {}", location_id),
            address: None,
            manager_id: None,
            created_at: ts("2026-01-01 08:00"),
        })
        .unwrap();
        if manager_id.is_some() {
            repo.assign_manager(location_id, manager_id).unwrap();
        }
    }

    pub fn add_group(
        &self,
        group_id: &str,
        teacher_id: &str,
        location_id: Option<&str>,
        start_date: Option<NaiveDate>,
    ) {
        GroupRepository::new(self.conn.clone())
            .insert(&Group {
                group_id: group_id.to_string(),
                name: format!("Group {}", group_id),
                teacher_id: teacher_id.to_string(),
                location_id: location_id.map(str::to_string),
                start_date,
                created_at: ts("2026-01-01 08:00"),
            })
            .unwrap();
    }

    pub fn add_slot(&self, group_id: &str, slot_id: &str, day_of_week: &str, start: NaiveTime, minutes: i32) {
        GroupRepository::new(self.conn.clone())
            .add_slot(&RecurringSlot {
                slot_id: slot_id.to_string(),
                group_id: group_id.to_string(),
                day_of_week: day_of_week.to_string(),
                start_time: start,
                duration_minutes: minutes,
            })
            .unwrap();
    }

    pub fn add_student(&self, student_id: &str, last_name: &str) {
        StudentRepository::new(self.conn.clone())
            .insert(&Student {
                student_id: student_id.to_string(),
                first_name: student_id.to_string(),
                last_name: last_name.to_string(),
                status: StudentStatus::Active,
                created_at: ts("2026-01-01 08:00"),
            })
            .unwrap();
    }

    pub fn enroll(&self, group_id: &str, student_id: &str, archived: bool) {
        GroupRepository::new(self.conn.clone())
            .add_membership(&GroupMembership {
                membership_id: format!("{}-{}", group_id, student_id),
                group_id: group_id.to_string(),
                student_id: student_id.to_string(),
                is_archived: archived,
                joined_at: ts("2026-01-02 08:00"),
            })
            .unwrap();
    }

    pub fn add_report(&self, report_id: &str, author: &str, created_at: &str, status: ReportStatus) {
        let created_at = ts(created_at);
        ReportRepository::new(self.conn.clone())
            .insert(&ReportSubmission {
                report_id: report_id.to_string(),
                employee_id: author.to_string(),
                report_date: created_at.date(),
                created_at,
                status,
                day_comment: None,
            })
            .unwrap();
    }

    pub fn add_task(&self, task_id: &str, created_at: &str, status: TaskStatus, assigned_to: Option<&str>) {
        TaskRepository::new(self.conn.clone())
            .insert(&WorkItem {
                task_id: task_id.to_string(),
                report_id: None,
                title: format!("Task {}", task_id),
                description: None,
                status,
                assigned_to: assigned_to.map(str::to_string),
                created_at: ts(created_at),
            })
            .unwrap();
    }
}
