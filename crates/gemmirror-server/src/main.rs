use std::sync::Arc;

use clap::Parser;
use cli::Args;
use gemmirror_core::config::Config;
use logging::setup_logging;
use miette::IntoDiagnostic;
use state::AppState;
use tracing::info;

mod cli;
mod handlers;
mod logging;
mod routes;
mod state;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = Args::parse();
    setup_logging(&args);

    let mut config = Config::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(follower) = args.follower_database {
        config.follower_database_path = Some(follower);
    }
    if let Some(upstream) = args.upstream {
        config.upstream_url = upstream;
    }

    gemmirror_fetch::http_client::configure_http_client(|client| {
        client.user_agent = Some(format!("gemmirror/{}", env!("CARGO_PKG_VERSION")));
    });

    let state = Arc::new(AppState::from_config(&config)?);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .into_diagnostic()?;
    info!(
        addr = config.bind_addr,
        upstream = config.upstream_url,
        "gemmirror listening"
    );

    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
