// ==========================================
// 校务运营管理系统 - 性能统计
// ==========================================
// PerfGuard 按 API 操作统计耗时、SQL 语句数、慢 SQL 数
// 计数来自共享连接上安装的 SQLite profile 回调 (每条语句执行完成触发一次)，按线程累计
// 不同时安装 trace 回调: sqlite3_profile 会重置 legacy trace 掩码
// 环境变量:
//   SCHOOL_OPS_PERF_SQL=1|0     开关 (debug 构建默认开)
//   SCHOOL_OPS_SLOW_SQL_MS=50   慢 SQL 阈值 (毫秒)
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

const SLOW_SQL_LOG_LEN: usize = 400;

static SQL_TRACING_ON: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);

/// 当前线程的 SQL 计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SqlTally {
    statements: u64,
    slow: u64,
}

thread_local! {
    static OPEN_GUARDS: Cell<u32> = const { Cell::new(0) };
    static TALLY: Cell<SqlTally> = const { Cell::new(SqlTally { statements: 0, slow: 0 }) };
}

fn tally() -> SqlTally {
    TALLY.with(Cell::get)
}

fn bump(f: impl FnOnce(&mut SqlTally)) {
    // 只在 PerfGuard 存活期间计数
    if OPEN_GUARDS.with(Cell::get) == 0 {
        return;
    }
    TALLY.with(|cell| {
        let mut t = cell.get();
        f(&mut t);
        cell.set(t);
    });
}

/// SQL 统计设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSettings {
    pub enabled: bool,
    pub slow_sql_ms: u64,
}

impl PerfSettings {
    pub fn from_env() -> Self {
        let enabled = std::env::var("SCHOOL_OPS_PERF_SQL")
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(cfg!(debug_assertions));
        let slow_sql_ms = std::env::var("SCHOOL_OPS_SLOW_SQL_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });

        Self { enabled, slow_sql_ms }
    }
}

/// 在连接上安装 SQL 计数与慢查询日志 (设置取自环境变量)
pub fn install_sqlite_tracing(conn: &mut Connection) {
    install_with(conn, PerfSettings::from_env());
}

pub fn install_with(conn: &mut Connection, settings: PerfSettings) {
    SQL_TRACING_ON.store(settings.enabled, Ordering::Relaxed);
    SLOW_SQL_MS.store(settings.slow_sql_ms, Ordering::Relaxed);

    conn.trace(None);
    if settings.enabled {
        conn.profile(Some(on_statement_done));
    } else {
        conn.profile(None);
    }
    tracing::debug!(enabled = settings.enabled, slow_sql_ms = settings.slow_sql_ms, "sql tracing configured");
}

fn on_statement_done(sql: &str, duration: Duration) {
    if !SQL_TRACING_ON.load(Ordering::Relaxed) {
        return;
    }
    bump(|t| t.statements += 1);

    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    let elapsed_ms = duration.as_millis() as u64;
    if threshold == 0 || elapsed_ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        elapsed_ms,
        sql = %one_line(sql, SLOW_SQL_LOG_LEN),
        "slow sql"
    );
    bump(|t| t.slow += 1);
}

/// 压成单行并截断 (按字符)
fn one_line(sql: &str, max_chars: usize) -> String {
    let flat: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

/// 操作级性能统计；drop 时输出 elapsed_ms / sql_count / slow_sql_count
///
/// ```ignore
/// let _perf = school_ops::perf::PerfGuard::new("generate_lessons");
/// ```
pub struct PerfGuard {
    op: &'static str,
    started: Instant,
    baseline: SqlTally,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        OPEN_GUARDS.with(|n| n.set(n.get() + 1));
        Self {
            op,
            started: Instant::now(),
            baseline: tally(),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let now = tally();
        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            sql_count = now.statements - self.baseline.statements,
            slow_sql_count = now.slow - self.baseline.slow,
            "done"
        );
        OPEN_GUARDS.with(|n| n.set(n.get().saturating_sub(1)));
    }
}
