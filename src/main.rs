//! Headless game host (default binary).
//!
//! Runs one game loop on tokio timers and, unless disabled, the TCP adapter in
//! front of it. All configuration comes from `TETRICUS_*` environment variables;
//! log output is filtered by `RUST_LOG`.

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tetricus::adapter::{run_server, ServerConfig};
use tetricus::engine::{spawn, GameHandle, LoopConfig};
use tetricus::types::GameAction;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("tetricus=info".parse()?))
        .init();

    let loop_config = LoopConfig::from_env();
    info!(
        seed = loop_config.seed,
        clear_gate = ?loop_config.clear_gate,
        "starting game loop"
    );

    let server_config = if ServerConfig::is_disabled() {
        info!("adapter disabled via TETRICUS_ADAPTER_DISABLED");
        None
    } else {
        Some(ServerConfig {
            clear_gate: loop_config.clear_gate.into(),
            ..ServerConfig::from_env()
        })
    };

    let (handle, mut game) = spawn(loop_config);
    let server = serve(server_config, handle.clone());
    tokio::pin!(server);

    let state = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            info!("interrupted, quitting");
            // The loop may already be gone; the join below reports that.
            let _ = handle.apply(GameAction::Quit).await;
            game.await?
        }
        res = &mut server => {
            let _ = handle.apply(GameAction::Quit).await;
            let _ = game.await;
            if let Err(e) = &res {
                error!(error = %e, "adapter stopped");
            }
            return res.context("adapter server stopped");
        }
        state = &mut game => state?,
    };

    info!(
        score = state.score(),
        level = state.level(),
        lines = state.sum_of_clear_lines(),
        episodes = state.episode_id(),
        "game finished"
    );
    Ok(())
}

async fn serve(config: Option<ServerConfig>, handle: GameHandle) -> Result<()> {
    match config {
        Some(config) => run_server(config, handle, None).await,
        None => std::future::pending().await,
    }
}
