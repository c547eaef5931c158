// ==========================================
// 校务运营管理系统 - 课次仓储
// ==========================================
// 职责: 课次 / 出勤读写
// 并发: 课表展开在 BEGIN IMMEDIATE 事务内完成 "读已有日期 → 规划 → 批量插入"，
//       同一数据库文件上的并发展开 (同进程或跨进程) 被串行化
// 红线: 课次从不被自动删除；lessons 上没有 (group_id, date) 唯一约束
// ==========================================

use crate::domain::{AttendanceStatus, LessonAttendance, LessonOccurrence, WorkType};
use crate::engine::{DatedAttendance, SqlFilter};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    format_date, format_time, format_ts, get_date, get_opt_time, now_ts,
};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const LESSON_COLUMNS: &str =
    "l.lesson_id, l.group_id, l.date, l.time, l.duration_minutes, l.topic, l.is_cancelled, l.work_type";

const INSERT_LESSON_SQL: &str = r#"INSERT INTO lessons (
    lesson_id, group_id, date, time, duration_minutes, topic, is_cancelled, work_type, created_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#;

// ==========================================
// LessonRepository - 课次仓储
// ==========================================
pub struct LessonRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LessonRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 班级已有课次的日期集合 (含已取消课次)
    pub fn existing_dates(&self, group_id: &str) -> RepositoryResult<HashSet<NaiveDate>> {
        let conn = self.get_conn()?;
        load_existing_dates(&conn, group_id)
    }

    /// 在串行化事务内展开课表
    ///
    /// # 参数
    /// - `group_id`: 班级ID
    /// - `planner`: 根据事务内读取的已有日期快照产出待插入课次
    ///
    /// # 返回
    /// - `Ok(Vec<LessonOccurrence>)`: 本次插入的课次 (planner 输出顺序)
    /// - `Err`: 任何一条插入失败则整批回滚
    pub fn generate_in_transaction<F>(
        &self,
        group_id: &str,
        planner: F,
    ) -> RepositoryResult<Vec<LessonOccurrence>>
    where
        F: FnOnce(&HashSet<NaiveDate>) -> Vec<LessonOccurrence>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let existing = load_existing_dates(&tx, group_id)?;
        let lessons = planner(&existing);

        if !lessons.is_empty() {
            let created_at = format_ts(&now_ts());
            for lesson in &lessons {
                insert_lesson(&tx, lesson, &created_at)?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::debug!(group_id, inserted = lessons.len(), "lesson batch committed");
        Ok(lessons)
    }

    /// 手工补录单节课
    pub fn insert(&self, lesson: &LessonOccurrence) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_lesson(&conn, lesson, &format_ts(&now_ts()))?;
        Ok(())
    }

    pub fn find_by_id(&self, lesson_id: &str) -> RepositoryResult<Option<LessonOccurrence>> {
        let conn = self.get_conn()?;
        let lesson = conn
            .query_row(
                &format!("SELECT {} FROM lessons l WHERE l.lesson_id = ?", LESSON_COLUMNS),
                params![lesson_id],
                map_lesson_row,
            )
            .optional()?;
        Ok(lesson)
    }

    /// 按权限范围列出课次 (日期降序)
    ///
    /// # 参数
    /// - `filter`: 以 `g` 为 groups 表别名的过滤片段
    /// - `group_id`: 可选，只看某个班级
    pub fn list(&self, filter: &SqlFilter, group_id: Option<&str>) -> RepositoryResult<Vec<LessonOccurrence>> {
        let conn = self.get_conn()?;

        let mut sql = format!(
            "SELECT {} FROM lessons l JOIN groups g ON g.group_id = l.group_id WHERE {}",
            LESSON_COLUMNS, filter.clause
        );
        let mut values = filter.params.clone();
        if let Some(group_id) = group_id {
            sql.push_str(" AND l.group_id = ?");
            values.push(group_id.to_string());
        }
        sql.push_str(" ORDER BY l.date DESC, l.time DESC");

        let mut stmt = conn.prepare(&sql)?;
        let lessons = stmt
            .query_map(params_from_iter(values.iter()), map_lesson_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lessons)
    }

    /// 班级全部课次 (日期升序)
    pub fn list_for_group(&self, group_id: &str) -> RepositoryResult<Vec<LessonOccurrence>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM lessons l WHERE l.group_id = ? ORDER BY l.date, l.time, l.created_at",
            LESSON_COLUMNS
        ))?;
        let lessons = stmt
            .query_map(params![group_id], map_lesson_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lessons)
    }

    pub fn set_cancelled(&self, lesson_id: &str, cancelled: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE lessons SET is_cancelled = ? WHERE lesson_id = ?",
            params![cancelled, lesson_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Lesson", lesson_id));
        }
        Ok(())
    }

    // ===== 出勤 =====

    /// 记录出勤；同一课次同一学生重复记录时覆盖
    ///
    /// # 返回
    /// - 实际保存的 attendance_id (覆盖时为已有记录的ID)
    pub fn upsert_attendance(&self, attendance: &LessonAttendance) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let attendance_id = conn.query_row(
            r#"INSERT INTO lesson_attendance (
                attendance_id, lesson_id, student_id, status, late_minutes, lesson_grade, homework_grade
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(lesson_id, student_id) DO UPDATE SET
                status = excluded.status,
                late_minutes = excluded.late_minutes,
                lesson_grade = excluded.lesson_grade,
                homework_grade = excluded.homework_grade
            RETURNING attendance_id"#,
            params![
                &attendance.attendance_id,
                &attendance.lesson_id,
                &attendance.student_id,
                attendance.status.as_str(),
                attendance.late_minutes,
                &attendance.lesson_grade,
                &attendance.homework_grade,
            ],
            |row| row.get::<_, String>(0),
        )?;
        Ok(attendance_id)
    }

    pub fn list_attendance(&self, lesson_id: &str) -> RepositoryResult<Vec<LessonAttendance>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT a.attendance_id, a.lesson_id, a.student_id, a.status,
                      a.late_minutes, a.lesson_grade, a.homework_grade
               FROM lesson_attendance a
               WHERE a.lesson_id = ?
               ORDER BY a.student_id"#,
        )?;
        let records = stmt
            .query_map(params![lesson_id], |row| map_attendance_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 学生在区间内 (含两端) 未取消课次的出勤记录
    pub fn attendance_for_student(
        &self,
        student_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> RepositoryResult<Vec<DatedAttendance>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT l.date, a.attendance_id, a.lesson_id, a.student_id, a.status,
                      a.late_minutes, a.lesson_grade, a.homework_grade
               FROM lesson_attendance a
               JOIN lessons l ON l.lesson_id = a.lesson_id
               WHERE a.student_id = ? AND l.is_cancelled = 0
                 AND l.date >= ? AND l.date <= ?
               ORDER BY l.date"#,
        )?;
        let records = stmt
            .query_map(
                params![student_id, format_date(&period_start), format_date(&period_end)],
                |row| {
                    Ok(DatedAttendance {
                        lesson_date: get_date(row, 0)?,
                        attendance: map_attendance_row(row, 1)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn load_existing_dates(conn: &Connection, group_id: &str) -> RepositoryResult<HashSet<NaiveDate>> {
    let mut stmt = conn.prepare("SELECT DISTINCT date FROM lessons WHERE group_id = ?")?;
    let dates = stmt
        .query_map(params![group_id], |row| get_date(row, 0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(dates)
}

fn insert_lesson(conn: &Connection, lesson: &LessonOccurrence, created_at: &str) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(INSERT_LESSON_SQL)?;
    stmt.execute(params![
        &lesson.lesson_id,
        &lesson.group_id,
        format_date(&lesson.date),
        lesson.time.as_ref().map(format_time),
        lesson.duration_minutes,
        &lesson.topic,
        lesson.is_cancelled,
        lesson.work_type.as_str(),
        created_at,
    ])
}

fn map_lesson_row(row: &rusqlite::Row) -> rusqlite::Result<LessonOccurrence> {
    Ok(LessonOccurrence {
        lesson_id: row.get(0)?,
        group_id: row.get(1)?,
        date: get_date(row, 2)?,
        time: get_opt_time(row, 3)?,
        duration_minutes: row.get(4)?,
        topic: row.get(5)?,
        is_cancelled: row.get(6)?,
        work_type: WorkType::parse(&row.get::<_, String>(7)?),
    })
}

fn map_attendance_row(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<LessonAttendance> {
    let raw_status: String = row.get(offset + 3)?;
    let status = AttendanceStatus::parse(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 3,
            Type::Text,
            format!("unknown attendance status: {}", raw_status).into(),
        )
    })?;

    Ok(LessonAttendance {
        attendance_id: row.get(offset)?,
        lesson_id: row.get(offset + 1)?,
        student_id: row.get(offset + 2)?,
        status,
        late_minutes: row.get(offset + 4)?,
        lesson_grade: row.get(offset + 5)?,
        homework_grade: row.get(offset + 6)?,
    })
}
