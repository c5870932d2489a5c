// src/main.rs

mod cli;
mod form;
mod logging;
mod render;
mod routes;
mod server;

use std::sync::Arc;

use anyhow::Context;
use courier_core::AppBuilder;
use courier_core::impls::{HttpInvoker, Script, ScriptedInvoker};
use courier_core::ports::ActionInvoker;
use tracing::{info, warn};

use crate::routes::AppState;

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("courier error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let invoker: Arc<dyn ActionInvoker> = match args.invoker_config()? {
        Some(config) => {
            info!(endpoint = %config.endpoint_template, "using HTTP endpoint");
            Arc::new(HttpInvoker::new(config).context("failed to set up HTTP invoker")?)
        }
        None => {
            warn!("dry run: no requests leave this process");
            Arc::new(ScriptedInvoker::new(Script::Succeed))
        }
    };

    let manager = Arc::new(AppBuilder::new().invoker(invoker).build()?);
    let state = Arc::new(AppState::new(manager.clone()));

    server::serve(&args.server_config(), state, shutdown_signal()).await?;

    let lingering = manager.shutdown(args.shutdown_grace()).await;
    info!(lingering, "courier stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    }
}
