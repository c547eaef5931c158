// ==========================================
// 校务运营管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)，当前只使用 global scope
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::lesson_expander::{DEFAULT_DAYS_PER_MONTH, DEFAULT_HORIZON_DAYS};
use crate::engine::ExpansionConfig;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

/// 单次展开允许的最大月数
pub const DEFAULT_MAX_GENERATION_MONTHS: u32 = 120;

/// 学生周报默认统计天数
pub const DEFAULT_WEEKLY_PERIOD_DAYS: i64 = 7;

// 各配置项允许的上限，超出时告警并回退到默认值
const MAX_DAYS_PER_MONTH: i64 = 31;
const MAX_DEFAULT_HORIZON_DAYS: i64 = 3_660;
const MAX_GENERATION_MONTHS_LIMIT: u32 = 240;
const MAX_WEEKLY_PERIOD_DAYS: i64 = 366;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 独立打开一条连接
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用应用的共享连接 (会再次应用统一 PRAGMA)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        let manager = Self { conn };
        crate::db::configure_sqlite_connection(&*manager.lock()?)?;
        Ok(manager)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Box<dyn Error>> {
        self.conn
            .lock()
            .map_err(|e| format!("配置连接锁获取失败: {}", e).into())
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let value = self
            .lock()?
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ? AND key = ?",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        upsert(&conn, key, value)?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 读取 (0, max] 区间内的数值配置
    ///
    /// 缺失时取默认值；无法解析或越界时告警并取默认值
    fn get_bounded_or_default<T>(&self, key: &str, default: T, max: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + PartialOrd + Default + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(parsed) if parsed > T::default() && parsed <= max => Ok(parsed),
            _ => {
                tracing::warn!(config_key = key, raw_value = %raw, fallback = %default, "配置值无效，使用默认值");
                Ok(default)
            }
        }
    }

    /// global 配置快照 (JSON 对象，键有序)
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?")?;
        let entries = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(serde_json::to_string(&entries)?)
    }

    /// 用快照覆盖 global 配置 (单个事务)
    ///
    /// # 返回
    /// - Ok(usize): 写入的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let entries: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        for (key, value) in &entries {
            upsert(&tx, key, value)?;
        }
        tx.commit()?;

        tracing::info!(restored = entries.len(), "配置已从快照恢复");
        Ok(entries.len())
    }

    // ===== 课表展开配置 =====

    /// 课表展开参数 (月换算天数、默认展开天数、单次展开上限)
    pub fn get_expansion_config(&self) -> Result<ExpansionConfig, Box<dyn Error>> {
        let days_per_month = self.get_bounded_or_default(
            config_keys::LESSON_DAYS_PER_MONTH,
            DEFAULT_DAYS_PER_MONTH,
            MAX_DAYS_PER_MONTH,
        )?;
        let default_horizon_days = self.get_bounded_or_default(
            config_keys::LESSON_DEFAULT_HORIZON_DAYS,
            DEFAULT_HORIZON_DAYS,
            MAX_DEFAULT_HORIZON_DAYS,
        )?;
        let max_months = self.get_max_generation_months()?;

        Ok(ExpansionConfig {
            days_per_month,
            default_horizon_days,
            max_horizon_days: days_per_month * i64::from(max_months),
        })
    }

    pub fn get_max_generation_months(&self) -> Result<u32, Box<dyn Error>> {
        self.get_bounded_or_default(
            config_keys::LESSON_MAX_GENERATION_MONTHS,
            DEFAULT_MAX_GENERATION_MONTHS,
            MAX_GENERATION_MONTHS_LIMIT,
        )
    }

    // ===== 周报配置 =====

    pub fn get_weekly_period_days(&self) -> Result<i64, Box<dyn Error>> {
        self.get_bounded_or_default(
            config_keys::WEEKLY_PERIOD_DAYS,
            DEFAULT_WEEKLY_PERIOD_DAYS,
            MAX_WEEKLY_PERIOD_DAYS,
        )
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        params![GLOBAL_SCOPE, key, value],
    )
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 课表展开
    pub const LESSON_DAYS_PER_MONTH: &str = "lesson_days_per_month";
    pub const LESSON_DEFAULT_HORIZON_DAYS: &str = "lesson_default_horizon_days";
    pub const LESSON_MAX_GENERATION_MONTHS: &str = "lesson_max_generation_months";

    // 周报
    pub const WEEKLY_PERIOD_DAYS: &str = "weekly_period_days";
}
