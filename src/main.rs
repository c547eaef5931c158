// ==========================================
// 校务运营管理系统 - 主入口
// ==========================================
// 初始化日志、打开数据库并完成组装
// ==========================================

use school_ops::app::{get_default_db_path, AppState};

fn main() {
    school_ops::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", school_ops::APP_NAME);
    tracing::info!("系统版本: {}", school_ops::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    match AppState::new(db_path) {
        Ok(state) => {
            tracing::info!(
                db_path = state.get_db_path(),
                task_subscribers = state.event_hub.subscriber_count(school_ops::engine::TASKS_TOPIC),
                "AppState初始化成功"
            );
        }
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    }
}
