use docsmith_backend_lib::{
    config::Settings, router, storage::FlatFileUserStore, AppState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration, trying alternate locations like the
    // container image layout
    let settings = Settings::load()
        .or_else(|_| Settings::load_from("config/default.toml"))
        .or_else(|_| Settings::load_from("./config/default.toml"))?;

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    let users = FlatFileUserStore::new(&settings.data_dir)?;

    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(users, settings).await?);
    let app = router::create_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "docsmith backend listening");

    axum::serve(listener, app).await?;

    Ok(())
}
