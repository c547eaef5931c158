// ==========================================
// 校务运营管理系统 - 日志初始化
// ==========================================
// tracing + tracing-subscriber
// RUST_LOG 控制级别 (默认 info)，SCHOOL_OPS_LOG_FORMAT 控制输出格式
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人读格式 (带行号)
    Pretty,
    /// JSON 行，便于日志采集
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> LogFormat {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    fn from_env() -> LogFormat {
        std::env::var("SCHOOL_OPS_LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or(LogFormat::Pretty)
    }
}

/// 初始化全局日志
///
/// ```no_run
/// school_ops::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match LogFormat::from_env() {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_line_number(true)
            .try_init(),
    };
    if let Err(e) = installed {
        eprintln!("logging already initialized: {}", e);
    }
}

/// 测试用日志 (输出到测试捕获，可重复调用)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("school_ops=debug"))
        .with_test_writer()
        .try_init();
}
