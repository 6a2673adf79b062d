//! arbourne-web - Arbourne Audio site backend
//!
//! Serves the marketing-site API: visitor event ingestion, admin analytics
//! read views, and the community recommendation board.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use arbourne_common::config::{self, DEFAULT_BIND};
use arbourne_common::db::init::init_database;
use arbourne_web::clients::UpstreamMetadata;
use arbourne_web::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "arbourne-web", version, about = "Arbourne Audio site backend")]
struct Cli {
    /// Data folder holding the database (overrides ARBOURNE_DATA_FOLDER)
    #[arg(long)]
    data_folder: Option<String>,

    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting arbourne-web v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let data_folder =
        config::resolve_data_folder(cli.data_folder.as_deref(), "ARBOURNE_DATA_FOLDER");
    let db_path = config::database_path(&data_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let metadata = Arc::new(UpstreamMetadata::new());
    let state = AppState::new(pool, metadata);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    info!("arbourne-web listening on http://{}", cli.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
