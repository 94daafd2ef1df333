mod config;
mod error;
mod handlers;
mod middleware;
mod probe;
mod response;
mod staging;
mod status;

use crate::config::Config;
use crate::handlers::{Quoter, QUOTES_ROUTE};
use crate::probe::CommandProbe;
use anyhow::anyhow;
use anyhow::Context;
use axum::{routing::post, Extension, Router};
use envconfig::Envconfig;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::init_from_env().context("Failed to load config")?;

    let staging_folder = config.staging_folder();
    if !staging_folder.exists() {
        return Err(anyhow!(
            "Provided staging folder {staging_folder:?} doesn't exist",
        ));
    }

    let settings = config.probe_settings();
    info!(
        tool = %settings.tool,
        timeout = ?settings.timeout,
        max_output_bytes = ?settings.max_output_bytes,
        max_concurrent = ?settings.max_concurrent,
        "Configured volume probe"
    );

    let quoter = Quoter::new(
        Arc::new(CommandProbe::new(settings)),
        staging_folder,
        config.max_upload_bytes(),
    );

    info!("Listening on {}", config.listen_address);

    axum::Server::bind(
        &config
            .listen_address
            .parse()
            .context("Invalid listen address")?,
    )
    .serve(app(quoter).into_make_service())
    .await?;

    Ok(())
}

fn app(quoter: Quoter) -> Router {
    Router::new()
        .route(QUOTES_ROUTE, post(handlers::create_quote))
        .fallback(axum::handler::Handler::into_service(error::not_found))
        .layer(Extension(quoter))
        .layer(axum::middleware::from_fn(middleware::method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(error::handle_panic))
}
