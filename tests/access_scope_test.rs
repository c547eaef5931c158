// ==========================================
// 权限范围集成测试
// ==========================================
// 职责: 验证各角色在班级/学生/课次/日报/任务上的可见范围与写权限
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod access_scope_test {
    use school_ops::api::{ApiError, CreateGroupRequest, CreateLessonRequest};
    use school_ops::domain::{Actor, ReportStatus, Role, TaskStatus, WorkType};

    use crate::test_helpers::{date, setup_env, TestEnv};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    /// 夹具:
    /// - 校区 L1 (负责人 M1)，L2 (无负责人)；M2 为无校区的负责人
    /// - 班级 GA (T1, L1)，GB (T2, L2)，GC (T2, L1)
    /// - 学生 S1 在 GA，S2 在 GB，S3 无班级，S4 仅有已归档的 GA 记录
    /// - 日报 R-M1 (M1)，R-T1 (T1)；任务 K1→M1，K2→T1，K3 无负责人
    fn scope_env() -> TestEnv {
        let env = setup_env();
        env.add_employee("A1", Role::Admin);
        env.add_employee("T1", Role::Teacher);
        env.add_employee("T2", Role::Teacher);
        env.add_employee("M1", Role::Manager);
        env.add_employee("M2", Role::Manager);

        env.add_location("L1", Some("M1"));
        env.add_location("L2", None);

        env.add_group("GA", "T1", Some("L1"), Some(date(2026, 3, 2)));
        env.add_group("GB", "T2", Some("L2"), None);
        env.add_group("GC", "T2", Some("L1"), None);

        env.add_student("S1", "Alpha");
        env.add_student("S2", "Bravo");
        env.add_student("S3", "Charlie");
        env.add_student("S4", "Delta");
        env.enroll("GA", "S1", false);
        env.enroll("GB", "S2", false);
        env.enroll("GA", "S4", true);

        env.add_report("R-M1", "M1", "2026-03-02 18:00", ReportStatus::Draft);
        env.add_report("R-T1", "T1", "2026-03-02 19:00", ReportStatus::Draft);

        env.add_task("K1", "2026-03-02 09:00", TaskStatus::New, Some("M1"));
        env.add_task("K2", "2026-03-02 10:00", TaskStatus::New, Some("T1"));
        env.add_task("K3", "2026-03-02 11:00", TaskStatus::New, None);
        env
    }

    fn group_ids(env: &TestEnv, actor: &Actor) -> Vec<String> {
        let mut ids: Vec<String> = env
            .state
            .group_api
            .list_groups(actor)
            .unwrap()
            .into_iter()
            .map(|g| g.group_id)
            .collect();
        ids.sort();
        ids
    }

    fn student_ids(env: &TestEnv, actor: &Actor) -> Vec<String> {
        env.state
            .student_api
            .list_students(actor)
            .unwrap()
            .into_iter()
            .map(|s| s.student_id)
            .collect()
    }

    fn report_ids(env: &TestEnv, actor: &Actor) -> Vec<String> {
        let mut ids: Vec<String> = env
            .state
            .report_api
            .list_reports(actor)
            .unwrap()
            .into_iter()
            .map(|r| r.report_id)
            .collect();
        ids.sort();
        ids
    }

    fn task_ids(env: &TestEnv, actor: &Actor) -> Vec<String> {
        env.state
            .report_api
            .list_tasks(actor)
            .unwrap()
            .into_iter()
            .map(|t| t.task_id)
            .collect()
    }

    fn unrecognized() -> Actor {
        Actor {
            employee_id: "X1".to_string(),
            role: Role::Unrecognized,
            location_id: None,
        }
    }

    // ==========================================
    // 角色解析
    // ==========================================

    #[test]
    fn test_load_actor_resolves_manager_location() {
        let env = scope_env();
        let repo = &env.state.employee_repo;

        assert_eq!(repo.load_actor("M1").unwrap(), Actor::manager("M1", Some("L1".to_string())));
        assert_eq!(repo.load_actor("M2").unwrap(), Actor::manager("M2", None));
        assert_eq!(repo.load_actor("T1").unwrap(), Actor::teacher("T1"));
        assert!(repo.load_actor("NOBODY").is_err());
    }

    // ==========================================
    // 列表可见范围
    // ==========================================

    #[test]
    fn test_admin_sees_everything() {
        let env = scope_env();
        let admin = Actor::admin("A1");

        assert_eq!(group_ids(&env, &admin), vec!["GA", "GB", "GC"]);
        assert_eq!(student_ids(&env, &admin), vec!["S1", "S2", "S3", "S4"]);
        assert_eq!(report_ids(&env, &admin), vec!["R-M1", "R-T1"]);
        assert_eq!(task_ids(&env, &admin), vec!["K3", "K2", "K1"]);
    }

    #[test]
    fn test_teacher_sees_only_own_groups_and_their_students() {
        let env = scope_env();
        let teacher = Actor::teacher("T1");

        assert_eq!(group_ids(&env, &teacher), vec!["GA"]);
        assert_eq!(student_ids(&env, &teacher), vec!["S1"]);
        // 日报与任务对教师不做范围限制
        assert_eq!(report_ids(&env, &teacher), vec!["R-M1", "R-T1"]);
        assert_eq!(task_ids(&env, &teacher).len(), 3);
    }

    #[test]
    fn test_manager_sees_location_groups_and_unassigned_students() {
        let env = scope_env();
        let manager = env.state.employee_repo.load_actor("M1").unwrap();

        assert_eq!(group_ids(&env, &manager), vec!["GA", "GC"]);
        assert_eq!(student_ids(&env, &manager), vec!["S1", "S3", "S4"]);
        assert_eq!(report_ids(&env, &manager), vec!["R-M1"]);
        assert_eq!(task_ids(&env, &manager), vec!["K1"]);
    }

    #[test]
    fn test_manager_without_location_sees_only_unassigned_students() {
        let env = scope_env();
        let manager = env.state.employee_repo.load_actor("M2").unwrap();

        assert!(group_ids(&env, &manager).is_empty());
        assert_eq!(student_ids(&env, &manager), vec!["S3", "S4"]);
        assert!(report_ids(&env, &manager).is_empty());
        assert!(task_ids(&env, &manager).is_empty());
    }

    #[test]
    fn test_unrecognized_role_sees_nothing() {
        let env = scope_env();
        let actor = unrecognized();

        assert!(group_ids(&env, &actor).is_empty());
        assert!(student_ids(&env, &actor).is_empty());
        assert!(report_ids(&env, &actor).is_empty());
        assert!(task_ids(&env, &actor).is_empty());
    }

    #[test]
    fn test_lessons_follow_group_scope() {
        let env = scope_env();
        let admin = Actor::admin("A1");
        for group_id in ["GA", "GB"] {
            env.state
                .lesson_api
                .create_lesson(
                    &admin,
                    group_id,
                    CreateLessonRequest {
                        date: date(2026, 3, 10),
                        time: None,
                        duration_minutes: Some(60),
                        topic: None,
                        work_type: WorkType::None,
                    },
                )
                .unwrap();
        }

        let teacher_lessons = env.state.lesson_api.list_lessons(&Actor::teacher("T1"), None).unwrap();
        assert_eq!(teacher_lessons.len(), 1);
        assert_eq!(teacher_lessons[0].group_id, "GA");

        let foreign = env
            .state
            .lesson_api
            .list_lessons(&Actor::teacher("T1"), Some("GB"))
            .unwrap();
        assert!(foreign.is_empty());

        assert_eq!(env.state.lesson_api.list_lessons(&admin, None).unwrap().len(), 2);
    }

    // ==========================================
    // 单条读取
    // ==========================================

    #[test]
    fn test_single_reads_distinguish_missing_from_denied() {
        let env = scope_env();
        let teacher = Actor::teacher("T1");

        assert!(env.state.group_api.get_group(&teacher, "GA").is_ok());
        let err = env.state.group_api.get_group(&teacher, "GB").unwrap_err();
        assert_eq!(err.code(), "ACCESS_DENIED");
        let err = env.state.group_api.get_group(&teacher, "GZ").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        assert!(env.state.student_api.get_student(&teacher, "S1").is_ok());
        assert!(matches!(
            env.state.student_api.get_student(&teacher, "S2"),
            Err(ApiError::AccessDenied(_))
        ));
        assert!(matches!(
            env.state.student_api.get_student(&teacher, "S9"),
            Err(ApiError::NotFound(_))
        ));

        let manager = Actor::manager("M1", Some("L1".to_string()));
        assert!(env.state.report_api.get_report(&manager, "R-M1").is_ok());
        assert!(matches!(
            env.state.report_api.get_report(&manager, "R-T1"),
            Err(ApiError::AccessDenied(_))
        ));
        assert!(matches!(
            env.state.report_api.get_task(&manager, "K2"),
            Err(ApiError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_student_visibility_is_shared_by_weekly_reports() {
        let env = scope_env();
        let teacher = Actor::teacher("T1");

        for student_id in ["S1", "S2", "S9"] {
            let direct = env.state.student_api.get_student(&teacher, student_id).map(|_| ());
            let weekly = env
                .state
                .weekly_report_api
                .list_for_student(&teacher, student_id)
                .map(|_| ());
            assert_eq!(
                direct.map_err(|e| e.code()),
                weekly.map_err(|e| e.code()),
                "student {}",
                student_id
            );
        }
    }

    // ==========================================
    // 写权限
    // ==========================================

    #[test]
    fn test_manager_creates_groups_only_at_own_location() {
        let env = scope_env();
        let manager = Actor::manager("M1", Some("L1".to_string()));

        let request = |location: &str| CreateGroupRequest {
            name: "New group".to_string(),
            teacher_id: "T1".to_string(),
            location_id: Some(location.to_string()),
            start_date: None,
        };

        assert!(env.state.group_api.create_group(&manager, request("L1")).is_ok());
        assert!(matches!(
            env.state.group_api.create_group(&manager, request("L2")),
            Err(ApiError::AccessDenied(_))
        ));
        assert!(matches!(
            env.state.group_api.create_group(&Actor::teacher("T1"), request("L1")),
            Err(ApiError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_unrecognized_role_cannot_write() {
        let env = scope_env();
        let err = env
            .state
            .report_api
            .create_report(
                &unrecognized(),
                school_ops::api::CreateReportRequest {
                    report_date: date(2026, 3, 2),
                    day_comment: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));
    }

    #[test]
    fn test_teacher_cannot_delete_groups() {
        let env = scope_env();
        assert!(matches!(
            env.state.group_api.delete_group(&Actor::teacher("T1"), "GA"),
            Err(ApiError::AccessDenied(_))
        ));
        assert!(env.state.group_api.delete_group(&Actor::admin("A1"), "GA").is_ok());
        assert!(matches!(
            env.state.group_api.get_group(&Actor::admin("A1"), "GA"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_reassigning_manager_moves_location_scope() {
        let env = scope_env();
        let admin = Actor::admin("A1");

        env.state.location_api.assign_manager(&admin, "L2", Some("M1")).unwrap();

        let manager = env.state.employee_repo.load_actor("M1").unwrap();
        assert_eq!(manager.location_id.as_deref(), Some("L2"));
        assert_eq!(group_ids(&env, &manager), vec!["GB"]);

        let locations = env.state.location_api.list_locations().unwrap();
        let l1 = locations.iter().find(|l| l.location_id == "L1").unwrap();
        assert_eq!(l1.manager_id, None);

        assert!(matches!(
            env.state.location_api.assign_manager(&admin, "L1", Some("T1")),
            Err(ApiError::BusinessRuleViolation(_))
        ));
        assert!(matches!(
            env.state.location_api.assign_manager(&Actor::teacher("T1"), "L1", Some("M2")),
            Err(ApiError::AccessDenied(_))
        ));
    }
}
