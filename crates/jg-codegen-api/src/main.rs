//! JOI code generation API server.
//!
//! Loads the device vocabulary, grammar and embedding index, then serves
//! `POST /generate_joi_code` over HTTP.
//!
//! `jg-codegen-api build-index <out.json> [config]` writes the embedding
//! index instead of serving.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use jg_codegen_api::config::ApiConfig;
use jg_codegen_api::routes;
use jg_codegen_api::state::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jg-codegen-api starting");

    let mut args = std::env::args().skip(1).peekable();
    let build_index = args.next_if(|a| a == "build-index").is_some();
    let out = if build_index {
        Some(args.next().context("usage: jg-codegen-api build-index <out.json> [config]")?)
    } else {
        None
    };

    // Config path: next argument, then JOI_CONFIG, else built-in defaults.
    let path = args.next().or_else(|| std::env::var("JOI_CONFIG").ok());
    let config = ApiConfig::load(path.as_deref())?;

    if let Some(out) = out {
        state::build_index(&config, &out).await?;
        return Ok(());
    }

    let state = AppState::from_config(&config).await?;
    tracing::info!(
        classes = state.pipeline.vocabulary().len(),
        "resources loaded"
    );

    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
