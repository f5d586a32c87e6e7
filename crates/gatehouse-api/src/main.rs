//! HTTP front end for the Gatehouse access-decision engine.
//!
//! Templates arrive as JSON arrays produced by the capture client's
//! extraction step; this binary never decodes images.

use anyhow::Context;
use clap::Parser;
use gatehouse_core::{
    AccessLogger, DecisionEngine, EngineConfig, InMemoryAccessLog, InMemoryTemplateStore,
    TemplateStore,
};
use gatehouse_storage::{ensure_schema, PostgresAccessLogger, PostgresTemplateStore};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod routes;

/// Serve access decisions over HTTP.
#[derive(Parser, Debug)]
#[command(name = "gatehouse-api", about = "Biometric access-decision service")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Postgres connection string; falls back to DATABASE_URL, then to in-memory stores
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum pool connections when using Postgres
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = EngineConfig::from_env().context("invalid engine configuration")?;
    tracing::info!(
        tolerance = config.tolerance,
        encoding_dimension = config.encoding_dimension,
        time_restricted_logging = ?config.time_restricted_logging,
        "engine configured"
    );

    let (templates, logger) = build_stores(&args).await?;
    let engine = DecisionEngine::with_system_clock(templates, logger, config)?;
    let app = routes::app(engine);

    tracing::info!("listening on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn build_stores(
    args: &Args,
) -> anyhow::Result<(Arc<dyn TemplateStore>, Arc<dyn AccessLogger>)> {
    let database_url = args
        .database_url
        .clone()
        .or_else(|| env::var("DATABASE_URL").ok());

    match database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .connect(&url)
                .await
                .context("failed to connect to Postgres")?;
            ensure_schema(&pool).await?;
            tracing::info!("using Postgres stores");
            Ok((
                Arc::new(PostgresTemplateStore::new(pool.clone())),
                Arc::new(PostgresAccessLogger::new(pool)),
            ))
        }
        None => {
            tracing::warn!("no database configured; enrollments and access events are kept in memory");
            Ok((
                Arc::new(InMemoryTemplateStore::new()),
                Arc::new(InMemoryAccessLog::new()),
            ))
        }
    }
}
