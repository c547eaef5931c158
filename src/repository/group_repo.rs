// ==========================================
// 校务运营管理系统 - 班级仓储
// ==========================================
// 职责: 班级 / 周课表规则 / 学生入班记录
// 红线: Repository 不含业务逻辑；列表查询必须带权限过滤片段
// ==========================================

use crate::domain::{Group, GroupMembership, RecurringSlot};
use crate::engine::SqlFilter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    format_date, format_time, format_ts, get_opt_date, get_time, get_ts,
};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const GROUP_COLUMNS: &str = "g.group_id, g.name, g.teacher_id, g.location_id, g.start_date, g.created_at";

// ==========================================
// GroupRepository - 班级仓储
// ==========================================
pub struct GroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GroupRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 班级 =====

    pub fn insert(&self, group: &Group) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO groups (group_id, name, teacher_id, location_id, start_date, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &group.group_id,
                &group.name,
                &group.teacher_id,
                &group.location_id,
                group.start_date.as_ref().map(format_date),
                format_ts(&group.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, group_id: &str) -> RepositoryResult<Option<Group>> {
        let conn = self.get_conn()?;
        let group = conn
            .query_row(
                &format!("SELECT {} FROM groups g WHERE g.group_id = ?", GROUP_COLUMNS),
                params![group_id],
                map_group_row,
            )
            .optional()?;
        Ok(group)
    }

    /// 按权限范围列出班级
    ///
    /// # 参数
    /// - `filter`: 以 `g` 为 groups 表别名的过滤片段
    pub fn list(&self, filter: &SqlFilter) -> RepositoryResult<Vec<Group>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM groups g WHERE {} ORDER BY g.name",
            GROUP_COLUMNS, filter.clause
        ))?;
        let groups = stmt
            .query_map(params_from_iter(filter.params.iter()), map_group_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    pub fn set_start_date(&self, group_id: &str, start_date: Option<NaiveDate>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE groups SET start_date = ? WHERE group_id = ?",
            params![start_date.as_ref().map(format_date), group_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Group", group_id));
        }
        Ok(())
    }

    /// 删除班级 (课表规则、课次、入班记录级联删除)
    pub fn delete(&self, group_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM groups WHERE group_id = ?", params![group_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Group", group_id));
        }
        Ok(())
    }

    // ===== 周课表规则 =====

    /// 追加课表规则，顺序号取当前最大值 + 1
    pub fn add_slot(&self, slot: &RecurringSlot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO group_slots (slot_id, group_id, position, day_of_week, start_time, duration_minutes)
               VALUES (?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM group_slots WHERE group_id = ?), ?, ?, ?)"#,
            params![
                &slot.slot_id,
                &slot.group_id,
                &slot.group_id,
                &slot.day_of_week,
                format_time(&slot.start_time),
                slot.duration_minutes,
            ],
        )?;
        Ok(())
    }

    /// 按录入顺序列出课表规则
    pub fn list_slots(&self, group_id: &str) -> RepositoryResult<Vec<RecurringSlot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT slot_id, group_id, day_of_week, start_time, duration_minutes
               FROM group_slots
               WHERE group_id = ?
               ORDER BY position"#,
        )?;
        let slots = stmt
            .query_map(params![group_id], |row| {
                Ok(RecurringSlot {
                    slot_id: row.get(0)?,
                    group_id: row.get(1)?,
                    day_of_week: row.get(2)?,
                    start_time: get_time(row, 3)?,
                    duration_minutes: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slots)
    }

    pub fn find_slot_group(&self, slot_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let group_id = conn
            .query_row(
                "SELECT group_id FROM group_slots WHERE slot_id = ?",
                params![slot_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(group_id)
    }

    pub fn delete_slot(&self, slot_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM group_slots WHERE slot_id = ?", params![slot_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("RecurringSlot", slot_id));
        }
        Ok(())
    }

    // ===== 入班记录 =====

    pub fn add_membership(&self, membership: &GroupMembership) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO group_students (membership_id, group_id, student_id, is_archived, joined_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &membership.membership_id,
                &membership.group_id,
                &membership.student_id,
                membership.is_archived,
                format_ts(&membership.joined_at),
            ],
        )?;
        Ok(())
    }

    /// 归档学生在班级内的有效入班记录
    ///
    /// # 返回
    /// - 被归档的记录数
    pub fn archive_membership(&self, group_id: &str, student_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE group_students SET is_archived = 1 WHERE group_id = ? AND student_id = ? AND is_archived = 0",
            params![group_id, student_id],
        )?;
        Ok(affected)
    }

    pub fn list_memberships(&self, group_id: &str) -> RepositoryResult<Vec<GroupMembership>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT membership_id, group_id, student_id, is_archived, joined_at
               FROM group_students
               WHERE group_id = ?
               ORDER BY joined_at"#,
        )?;
        let memberships = stmt
            .query_map(params![group_id], |row| {
                Ok(GroupMembership {
                    membership_id: row.get(0)?,
                    group_id: row.get(1)?,
                    student_id: row.get(2)?,
                    is_archived: row.get(3)?,
                    joined_at: get_ts(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(memberships)
    }

    /// 学生当前有效入班的班级
    pub fn active_groups_for_student(&self, student_id: &str) -> RepositoryResult<Vec<Group>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM groups g
               JOIN group_students m ON m.group_id = g.group_id
               WHERE m.student_id = ? AND m.is_archived = 0
               ORDER BY g.name"#,
            GROUP_COLUMNS
        ))?;
        let groups = stmt
            .query_map(params![student_id], map_group_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }
}

fn map_group_row(row: &rusqlite::Row) -> rusqlite::Result<Group> {
    Ok(Group {
        group_id: row.get(0)?,
        name: row.get(1)?,
        teacher_id: row.get(2)?,
        location_id: row.get(3)?,
        start_date: get_opt_date(row, 4)?,
        created_at: get_ts(row, 5)?,
    })
}
