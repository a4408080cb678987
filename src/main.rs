use std::net::SocketAddr;

use anyhow::Result;

use speed_server::app;
use speed_server::domain::Rules;
use speed_server::game::Lobby;
use speed_server::shared::{SERVER_ADDRESS, SERVER_PORT};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let rules = Rules::from_env();
    let lobby_tx = Lobby::start(rules);
    let app = app::create_routes(lobby_tx);

    let addr: SocketAddr = std::env::var("BIND_ADDRESS")
        .unwrap_or_else(|_| format!("{SERVER_ADDRESS}:{SERVER_PORT}"))
        .parse()?;

    tracing::info!(%addr, king_ace_wrap = rules.king_ace_wrap, "starting speed server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("received shutdown signal");
}
