//! HTTP serving boundary (feature `http`).
//!
//! A small Axum server around one `InferencePipeline` and one `ModelHandle`:
//! uploads are decoded and featurized on the blocking pool, scored by the
//! shared model, and returned as a label plus percentage breakdown.

mod routes;

pub use routes::{build_router, run_http_server, HttpServerError, ServingState};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::inference::{InferencePipeline, ModelHandle};

/// Build state from configuration, load the model eagerly, and serve until Ctrl-C
pub fn serve_blocking(config: &AppConfig, model: ModelHandle) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .serving
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.serving.bind_addr))?;

    let pipeline = InferencePipeline::new(config).context("building inference pipeline")?;
    if let Err(err) = model.load() {
        log::warn!("[HTTP] Model not loaded at startup: {}", err);
    }

    let state = ServingState::new(
        Arc::new(pipeline),
        Arc::new(model),
        config.serving.admin_token.clone(),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let preview = config.serving.admin_token.chars().take(4).collect::<String>();
    log::info!(
        "[HTTP] Serving genre classification on {} (admin token prefix {}***)",
        addr,
        preview
    );
    runtime.block_on(run_http_server(state, addr))
}
