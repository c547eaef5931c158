// ==========================================
// 日报生命周期与任务结转集成测试
// ==========================================
// 职责: 验证锚点选择、结转过滤、重新打开后的回退、任务事件发布
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod task_carryover_test {
    use school_ops::api::{ApiError, CreateReportRequest, CreateTaskRequest};
    use school_ops::domain::{Actor, ReportStatus, Role, TaskStatus};
    use school_ops::engine::{TaskEventAction, TASKS_TOPIC};
    use school_ops::repository::TaskRepository;

    use crate::test_helpers::{date, setup_env, TestEnv};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    /// T1 的三份日报与三个任务:
    /// - S1 (t1, 已完成)，S2 (t2, 已完成)，S3 (t3, 草稿)
    /// - W1 (早于 t1, 已完成)，W2 (t1 与 t2 之间, 已完成)，W3 (早于 t1, 进行中)
    fn carryover_env() -> TestEnv {
        let env = setup_env();
        env.add_employee("A1", Role::Admin);
        env.add_employee("T1", Role::Teacher);
        env.add_employee("T2", Role::Teacher);

        env.add_report("S1", "T1", "2026-03-02 18:00", ReportStatus::Completed);
        env.add_report("S2", "T1", "2026-03-03 18:00", ReportStatus::Completed);
        env.add_report("S3", "T1", "2026-03-04 18:00", ReportStatus::Draft);

        env.add_task("W1", "2026-03-01 09:00", TaskStatus::Completed, None);
        env.add_task("W2", "2026-03-03 09:00", TaskStatus::Completed, None);
        env.add_task("W3", "2026-03-01 10:00", TaskStatus::InProgress, None);
        env
    }

    fn visible(env: &TestEnv, actor: &Actor, report_id: &str) -> Vec<String> {
        env.state
            .report_api
            .visible_tasks(actor, report_id)
            .unwrap()
            .into_iter()
            .map(|t| t.task_id)
            .collect()
    }

    // ==========================================
    // 结转过滤
    // ==========================================

    #[test]
    fn test_carryover_scenario() {
        let env = carryover_env();
        let teacher = Actor::teacher("T1");

        // S2 的锚点为 S1
        assert_eq!(visible(&env, &teacher, "S2"), vec!["W2", "W3"]);
        // S3 的锚点为 S2
        assert_eq!(visible(&env, &teacher, "S3"), vec!["W3"]);
        // S1 没有更早的日报
        assert_eq!(visible(&env, &teacher, "S1"), vec!["W2", "W3", "W1"]);
    }

    #[test]
    fn test_carryover_result_reports_anchor() {
        let env = carryover_env();
        let result = env
            .state
            .report_api
            .carryover_for(&Actor::teacher("T1"), "S3")
            .unwrap();

        assert_eq!(result.anchor_report_id.as_deref(), Some("S2"));
        assert_eq!(result.suppressed_count, 2);
    }

    #[test]
    fn test_reopening_anchor_falls_back_to_older_one() {
        let env = carryover_env();
        let teacher = Actor::teacher("T1");

        let reopened = env.state.report_api.reopen_report(&teacher, "S2").unwrap();
        assert_eq!(reopened.status, ReportStatus::Draft);

        // S3 的锚点回退到 S1，W2 重新出现
        assert_eq!(visible(&env, &teacher, "S3"), vec!["W2", "W3"]);

        env.state.report_api.complete_report(&teacher, "S2").unwrap();
        assert_eq!(visible(&env, &teacher, "S3"), vec!["W3"]);
    }

    #[test]
    fn test_other_authors_reports_are_never_anchors() {
        let env = carryover_env();
        env.add_report("OTHER", "T2", "2026-03-04 08:00", ReportStatus::Completed);

        let result = env
            .state
            .report_api
            .carryover_for(&Actor::teacher("T1"), "S3")
            .unwrap();
        assert_eq!(result.anchor_report_id.as_deref(), Some("S2"));
    }

    #[test]
    fn test_manager_only_sees_assigned_tasks_in_carryover() {
        let env = carryover_env();
        env.add_employee("M1", Role::Manager);
        env.add_report("MR", "M1", "2026-03-05 18:00", ReportStatus::Draft);
        env.add_task("MW", "2026-03-05 09:00", TaskStatus::New, Some("M1"));

        let manager = Actor::manager("M1", None);
        assert_eq!(visible(&env, &manager, "MR"), vec!["MW"]);

        assert!(matches!(
            env.state.report_api.visible_tasks(&manager, "S3"),
            Err(ApiError::AccessDenied(_))
        ));
        assert!(matches!(
            env.state.report_api.visible_tasks(&manager, "NOPE"),
            Err(ApiError::NotFound(_))
        ));
    }

    // ==========================================
    // 日报生命周期
    // ==========================================

    #[test]
    fn test_repeated_transition_is_noop() {
        let env = carryover_env();
        let teacher = Actor::teacher("T1");

        let report = env.state.report_api.complete_report(&teacher, "S1").unwrap();
        assert_eq!(report.status, ReportStatus::Completed);

        let report = env.state.report_api.reopen_report(&teacher, "S3").unwrap();
        assert_eq!(report.status, ReportStatus::Draft);
    }

    #[test]
    fn test_only_author_or_admin_changes_report() {
        let env = carryover_env();

        assert!(matches!(
            env.state.report_api.complete_report(&Actor::teacher("T2"), "S3"),
            Err(ApiError::AccessDenied(_))
        ));
        let report = env
            .state
            .report_api
            .complete_report(&Actor::admin("A1"), "S3")
            .unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
    }

    #[test]
    fn test_new_report_starts_as_draft_owned_by_actor() {
        let env = carryover_env();
        let report = env
            .state
            .report_api
            .create_report(
                &Actor::teacher("T2"),
                CreateReportRequest {
                    report_date: date(2026, 3, 5),
                    day_comment: Some("ok".to_string()),
                },
            )
            .unwrap();

        assert_eq!(report.employee_id, "T2");
        assert_eq!(report.status, ReportStatus::Draft);

        // 新日报的锚点是 T2 自己更早的已完成日报 (无)
        let result = env
            .state
            .report_api
            .carryover_for(&Actor::teacher("T2"), &report.report_id)
            .unwrap();
        assert_eq!(result.anchor_report_id, None);
        assert_eq!(result.visible.len(), 3);
    }

    #[test]
    fn test_deleting_report_detaches_tasks() {
        let env = carryover_env();
        let teacher = Actor::teacher("T1");
        let task = env
            .state
            .report_api
            .create_task(
                &teacher,
                CreateTaskRequest {
                    report_id: Some("S3".to_string()),
                    title: "Call parents".to_string(),
                    description: None,
                    assigned_to: None,
                },
            )
            .unwrap();

        let detached = env.state.report_api.delete_report(&teacher, "S3").unwrap();
        assert_eq!(detached, 1);

        let stored = TaskRepository::new(env.conn.clone())
            .find_by_id(&task.task_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.report_id, None);
        assert!(matches!(
            env.state.report_api.get_report(&teacher, "S3"),
            Err(ApiError::NotFound(_))
        ));
    }

    // ==========================================
    // 任务事件
    // ==========================================

    #[test]
    fn test_task_mutations_publish_events() {
        let env = carryover_env();
        let teacher = Actor::teacher("T1");
        let mut receiver = env.state.event_hub.subscribe(TASKS_TOPIC).unwrap();

        let task = env
            .state
            .report_api
            .create_task(
                &teacher,
                CreateTaskRequest {
                    report_id: None,
                    title: "Prepare test".to_string(),
                    description: None,
                    assigned_to: Some("T2".to_string()),
                },
            )
            .unwrap();
        env.state
            .report_api
            .update_task_status(&teacher, &task.task_id, TaskStatus::Urgent)
            .unwrap();
        env.state.report_api.delete_task(&teacher, &task.task_id).unwrap();

        let created = receiver.try_recv().unwrap();
        assert_eq!(created.action, TaskEventAction::Create);
        assert_eq!(created.task.as_ref().map(|t| t.title.as_str()), Some("Prepare test"));

        let updated = receiver.try_recv().unwrap();
        assert_eq!(updated.action, TaskEventAction::Update);
        assert_eq!(updated.task.map(|t| t.status), Some(TaskStatus::Urgent));

        let deleted = receiver.try_recv().unwrap();
        assert_eq!(deleted.action, TaskEventAction::Delete);
        assert_eq!(deleted.task_id, task.task_id);
        assert!(deleted.task.is_none());

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_task_mutations_succeed_without_subscribers() {
        let env = carryover_env();
        let teacher = Actor::teacher("T1");

        let task = env
            .state
            .report_api
            .assign_task(&teacher, "W3", Some("T2".to_string()))
            .unwrap();
        assert_eq!(task.assigned_to.as_deref(), Some("T2"));
        assert_eq!(env.state.event_hub.subscriber_count(TASKS_TOPIC), 0);
    }

    #[test]
    fn test_completing_task_hides_it_after_next_anchor() {
        let env = carryover_env();
        let teacher = Actor::teacher("T1");

        env.state
            .report_api
            .update_task_status(&teacher, "W3", TaskStatus::Completed)
            .unwrap();

        // W3 早于锚点 S2 且已完成
        assert!(visible(&env, &teacher, "S3").is_empty());
    }
}
