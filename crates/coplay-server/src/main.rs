//! coplay server binary.
//!
//! - WebSocket endpoint: /v1/ws (login first, then kind-tagged envelopes)
//! - Ops endpoints: /healthz, /metrics
//! - Operator console on stdin (`say`, `users`, `kick`, `speed`, `save`, `stop`)
//!
//! Usage: `coplay-server [config.yaml]` (defaults to `coplay.yaml`).

use std::net::SocketAddr;

use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use coplay_core::error::{CoplayError, Result};
use coplay_server::{app_state::AppState, config, console, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "coplay-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "coplay.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| CoplayError::Config(format!("server.listen must be a socket address: {e}")))?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tokio::spawn(console::run(state.clone(), BufReader::new(tokio::io::stdin())));

    tracing::info!(%listen, config = %path, "coplay-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| CoplayError::Transport(format!("bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = state.shutdown_requested() => {}
                _ = tokio::signal::ctrl_c() => {
                    let _ = console::execute(&state.realtime(), console::ConsoleCommand::Stop).await;
                }
            }
            tracing::info!("shutting down");
        })
        .await
        .map_err(|e| CoplayError::Transport(format!("server failed: {e}")))
}
