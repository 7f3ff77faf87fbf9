use std::sync::Arc;

use tracing::info;
use tunerelay::{
    common::{
        AnyResult,
        banner::{BannerInfo, print_banner},
        logger,
    },
    configs::Config,
    server::AppState,
    transport,
};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    logger::init(&config.logging);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config)?);

    print_banner(&BannerInfo::new(
        address.clone(),
        state.resolver.strategy_names(),
    ));

    let app = transport::http_server::router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("tunerelay listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
