// ==========================================
// 课表展开集成测试
// ==========================================
// 职责: 验证展开区间、幂等、同日多规则、前置条件与并发展开
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod lesson_generation_test {
    use std::collections::HashMap;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use school_ops::api::{ApiError, GenerateLessonsRequest};
    use school_ops::app::AppState;
    use school_ops::config::config_keys;
    use school_ops::domain::{Actor, Role};
    use school_ops::repository::LessonRepository;

    use crate::test_helpers::{date, setup_env, time, TestEnv};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    /// 周二 16:00/60、周四 18:00/90，开课日期 2026-03-02 (周一)
    fn tue_thu_env() -> TestEnv {
        let env = setup_env();
        env.add_employee("T1", Role::Teacher);
        env.add_group("G1", "T1", None, Some(date(2026, 3, 2)));
        env.add_slot("G1", "S-TUE", "Вторник", time(16, 0), 60);
        env.add_slot("G1", "S-THU", "Thursday", time(18, 0), 90);
        env
    }

    fn months(n: u32) -> GenerateLessonsRequest {
        GenerateLessonsRequest {
            end_date: None,
            months: Some(n),
        }
    }

    fn stored_count(env: &TestEnv, group_id: &str) -> usize {
        LessonRepository::new(env.conn.clone())
            .list_for_group(group_id)
            .unwrap()
            .len()
    }

    // ==========================================
    // 展开区间
    // ==========================================

    #[test]
    fn test_one_month_of_tuesdays_and_thursdays() {
        let env = tue_thu_env();
        let admin = Actor::admin("A1");

        let created = env.state.lesson_api.generate_lessons(&admin, "G1", months(1)).unwrap();

        let dates: Vec<_> = created.iter().map(|l| l.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2026, 3, 3),
                date(2026, 3, 5),
                date(2026, 3, 10),
                date(2026, 3, 12),
                date(2026, 3, 17),
                date(2026, 3, 19),
                date(2026, 3, 24),
                date(2026, 3, 26),
                date(2026, 3, 31),
            ]
        );

        for lesson in &created {
            assert!(lesson.date >= date(2026, 3, 2) && lesson.date <= date(2026, 4, 1));
            assert!(!lesson.is_cancelled);
            if lesson.date == date(2026, 3, 3) || lesson.date == date(2026, 3, 31) {
                assert_eq!(lesson.time, Some(time(16, 0)));
                assert_eq!(lesson.duration_minutes, Some(60));
            }
            if lesson.date == date(2026, 3, 5) {
                assert_eq!(lesson.time, Some(time(18, 0)));
                assert_eq!(lesson.duration_minutes, Some(90));
            }
        }
        assert_eq!(stored_count(&env, "G1"), 9);
    }

    #[test]
    fn test_end_date_takes_priority_over_months() {
        let env = tue_thu_env();
        let admin = Actor::admin("A1");

        let created = env
            .state
            .lesson_api
            .generate_lessons(
                &admin,
                "G1",
                GenerateLessonsRequest {
                    end_date: Some(date(2026, 3, 10)),
                    months: Some(6),
                },
            )
            .unwrap();

        let dates: Vec<_> = created.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![date(2026, 3, 3), date(2026, 3, 5), date(2026, 3, 10)]);
    }

    #[test]
    fn test_default_horizon_is_ninety_days() {
        let env = tue_thu_env();
        let admin = Actor::admin("A1");

        let created = env
            .state
            .lesson_api
            .generate_lessons(&admin, "G1", GenerateLessonsRequest::default())
            .unwrap();

        let last = created.iter().map(|l| l.date).max().unwrap();
        assert!(last <= date(2026, 5, 31));
        assert_eq!(last, date(2026, 5, 28));
    }

    // ==========================================
    // 幂等与同日多规则
    // ==========================================

    #[test]
    fn test_second_run_with_same_horizon_creates_nothing() {
        let env = tue_thu_env();
        let admin = Actor::admin("A1");

        let first = env.state.lesson_api.generate_lessons(&admin, "G1", months(1)).unwrap();
        let second = env.state.lesson_api.generate_lessons(&admin, "G1", months(1)).unwrap();

        assert_eq!(first.len(), 9);
        assert!(second.is_empty());
        assert_eq!(stored_count(&env, "G1"), 9);
    }

    #[test]
    fn test_cancelled_lesson_dates_are_not_regenerated() {
        let env = tue_thu_env();
        let admin = Actor::admin("A1");

        let first = env.state.lesson_api.generate_lessons(&admin, "G1", months(1)).unwrap();
        env.state.lesson_api.cancel_lesson(&admin, &first[0].lesson_id).unwrap();

        let second = env.state.lesson_api.generate_lessons(&admin, "G1", months(1)).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_two_slots_on_same_weekday_both_materialize() {
        let env = setup_env();
        env.add_employee("T1", Role::Teacher);
        env.add_group("G2", "T1", None, Some(date(2026, 3, 2)));
        env.add_slot("G2", "S-MORNING", "Среда", time(10, 0), 45);
        env.add_slot("G2", "S-EVENING", "Wednesday", time(19, 0), 45);

        let created = env
            .state
            .lesson_api
            .generate_lessons(
                &Actor::admin("A1"),
                "G2",
                GenerateLessonsRequest {
                    end_date: Some(date(2026, 3, 11)),
                    months: None,
                },
            )
            .unwrap();

        // 两个周三，每个周三两节
        assert_eq!(created.len(), 4);
        let mut per_day: HashMap<_, Vec<_>> = HashMap::new();
        for lesson in &created {
            per_day.entry(lesson.date).or_default().push(lesson.time);
        }
        assert_eq!(per_day[&date(2026, 3, 4)], vec![Some(time(10, 0)), Some(time(19, 0))]);
        assert_eq!(per_day[&date(2026, 3, 11)], vec![Some(time(10, 0)), Some(time(19, 0))]);
    }

    #[test]
    fn test_unrecognized_weekday_slot_is_skipped() {
        let env = tue_thu_env();
        env.add_slot("G1", "S-BAD", "Funday", time(12, 0), 30);

        let created = env
            .state
            .lesson_api
            .generate_lessons(&Actor::admin("A1"), "G1", months(1))
            .unwrap();

        assert_eq!(created.len(), 9);
        assert!(created.iter().all(|l| l.time != Some(time(12, 0))));
    }

    // ==========================================
    // 前置条件与权限
    // ==========================================

    #[test]
    fn test_missing_start_date_is_precondition_error() {
        let env = setup_env();
        env.add_employee("T1", Role::Teacher);
        env.add_group("G3", "T1", None, None);
        env.add_slot("G3", "S1", "Monday", time(9, 0), 60);

        let err = env
            .state
            .lesson_api
            .generate_lessons(&Actor::admin("A1"), "G3", months(1))
            .unwrap_err();

        assert!(matches!(err, ApiError::PreconditionUnmet(_)));
        assert_eq!(err.code(), "PRECONDITION_UNMET");
        assert_eq!(stored_count(&env, "G3"), 0);
    }

    #[test]
    fn test_missing_schedule_is_precondition_error() {
        let env = setup_env();
        env.add_employee("T1", Role::Teacher);
        env.add_group("G4", "T1", None, Some(date(2026, 3, 2)));

        let err = env
            .state
            .lesson_api
            .generate_lessons(&Actor::admin("A1"), "G4", months(1))
            .unwrap_err();

        assert!(matches!(err, ApiError::PreconditionUnmet(_)));
        assert_eq!(stored_count(&env, "G4"), 0);
    }

    #[test]
    fn test_months_above_configured_max_is_rejected() {
        let env = tue_thu_env();
        env.state
            .config_manager
            .set_global_config_value(config_keys::LESSON_MAX_GENERATION_MONTHS, "3")
            .unwrap();

        let err = env
            .state
            .lesson_api
            .generate_lessons(&Actor::admin("A1"), "G1", months(4))
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(stored_count(&env, "G1"), 0);
    }

    #[test]
    fn test_days_per_month_is_configurable() {
        let env = tue_thu_env();
        env.state
            .config_manager
            .set_global_config_value(config_keys::LESSON_DAYS_PER_MONTH, "7")
            .unwrap();

        let created = env
            .state
            .lesson_api
            .generate_lessons(&Actor::admin("A1"), "G1", months(1))
            .unwrap();

        let dates: Vec<_> = created.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![date(2026, 3, 3), date(2026, 3, 5)]);
    }

    #[test]
    fn test_oversized_default_horizon_config_falls_back() {
        let env = tue_thu_env();
        env.state
            .config_manager
            .set_global_config_value(config_keys::LESSON_DEFAULT_HORIZON_DAYS, "200000000000")
            .unwrap();

        let created = env
            .state
            .lesson_api
            .generate_lessons(&Actor::admin("A1"), "G1", GenerateLessonsRequest::default())
            .unwrap();
        assert_eq!(created.last().map(|l| l.date), Some(date(2026, 5, 28)));

        // 连接仍然可用
        let listed = env
            .state
            .lesson_api
            .list_lessons(&Actor::admin("A1"), Some("G1"))
            .unwrap();
        assert_eq!(listed.len(), created.len());
    }

    #[test]
    fn test_end_date_beyond_generation_limit_is_rejected() {
        let env = tue_thu_env();
        let admin = Actor::admin("A1");

        let err = env
            .state
            .lesson_api
            .generate_lessons(
                &admin,
                "G1",
                GenerateLessonsRequest {
                    end_date: Some(date(9999, 12, 31)),
                    months: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(stored_count(&env, "G1"), 0);

        // 上限 3 个月 × 30 天 = 90 天
        env.state
            .config_manager
            .set_global_config_value(config_keys::LESSON_MAX_GENERATION_MONTHS, "3")
            .unwrap();
        let until = |end| GenerateLessonsRequest {
            end_date: Some(end),
            months: None,
        };
        assert!(matches!(
            env.state.lesson_api.generate_lessons(&admin, "G1", until(date(2026, 6, 30))),
            Err(ApiError::InvalidInput(_))
        ));
        let created = env
            .state
            .lesson_api
            .generate_lessons(&admin, "G1", until(date(2026, 5, 31)))
            .unwrap();
        assert_eq!(created.last().map(|l| l.date), Some(date(2026, 5, 28)));
    }

    #[test]
    fn test_access_is_checked_before_request_validation() {
        let env = tue_thu_env();
        env.add_employee("T2", Role::Teacher);

        let err = env
            .state
            .lesson_api
            .generate_lessons(&Actor::teacher("T2"), "G1", months(10_000))
            .unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));

        let err = env
            .state
            .lesson_api
            .generate_lessons(&Actor::admin("A1"), "NO-SUCH-GROUP", months(10_000))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_teacher_cannot_generate_for_foreign_group() {
        let env = tue_thu_env();
        env.add_employee("T2", Role::Teacher);

        let err = env
            .state
            .lesson_api
            .generate_lessons(&Actor::teacher("T2"), "G1", months(1))
            .unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));

        let err = env
            .state
            .lesson_api
            .generate_lessons(&Actor::teacher("T1"), "NO-SUCH-GROUP", months(1))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // 自己的班级可以展开
        let created = env
            .state
            .lesson_api
            .generate_lessons(&Actor::teacher("T1"), "G1", months(1))
            .unwrap();
        assert_eq!(created.len(), 9);
    }

    // ==========================================
    // 并发展开
    // ==========================================

    #[test]
    fn test_concurrent_generation_does_not_duplicate() {
        let env = tue_thu_env();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let db_path = env.db_path.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    // 每个线程独立的 AppState (独立连接)
                    let state = AppState::new(db_path).unwrap();
                    barrier.wait();
                    state
                        .lesson_api
                        .generate_lessons(&Actor::admin("A1"), "G1", months(1))
                        .unwrap()
                        .len()
                })
            })
            .collect();

        let created: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(created.iter().sum::<usize>(), 9);
        assert!(created.contains(&9));
        assert!(created.contains(&0));
        assert_eq!(stored_count(&env, "G1"), 9);
    }
}
