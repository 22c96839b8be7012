// ==========================================
// 看板补货调度服务 - 主入口
// ==========================================
// 环境变量见 config::server_config
// ==========================================

use carbon_kanban::api::start_server;
use carbon_kanban::config::ServerConfig;
use carbon_kanban::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", carbon_kanban::APP_NAME);
    tracing::info!("系统版本: {}", carbon_kanban::VERSION);
    tracing::info!("==================================================");

    let config = ServerConfig::from_env();
    tracing::info!(
        port = config.port,
        db_path = %config.db_path,
        functions_url = ?config.functions_url,
        poll_ms = config.worker_poll_interval.as_millis() as u64,
        "服务配置已加载"
    );

    start_server(config).await
}
