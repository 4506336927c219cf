use configuration::{load_config, DEFAULT_CONFIG_FILE};
use core_types::Auditor;
use database::DbRepository;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use web_server::AppState;

// This main function is the entry point when running `cargo run -p web-server`.
// It serves the API from PostgreSQL with the settings in `academia.toml`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config(Path::new(DEFAULT_CONFIG_FILE))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let pool = database::connect(
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    if config.database.run_migrations {
        database::run_migrations(&pool).await?;
    }

    let store = DbRepository::new(pool, Auditor::new(config.audit.actor.clone()));
    let state = AppState::new(Arc::new(store), config.pagination.clone());
    let addr: SocketAddr = config.server.address().parse()?;
    web_server::run_server(addr, state).await
}
