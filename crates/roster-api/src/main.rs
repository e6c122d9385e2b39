//! CLI entry point for the roster-api GraphQL service.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use roster_core::{Character, User};
use roster_graph::{GraphClient, NodeStore};

use roster_api::config::load_config;
use roster_api::repository::{GraphRepository, InMemoryRepository};
use roster_api::schema::{build_schema, AppState};

#[derive(Parser)]
#[command(name = "roster-api")]
#[command(about = "GraphQL service for Roster users and characters")]
struct Cli {
    /// Config file prefix (default: roster).
    #[arg(short, long, default_value = "roster")]
    config: String,

    /// Listen port, overriding the configured one.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let graph = GraphClient::connect(&config.neo4j.graph_config()).await?;
    graph.verify_connectivity().await?;
    tracing::info!(uri = %config.neo4j.uri, "Neo4j connectivity verified");

    let state = AppState {
        users: Arc::new(GraphRepository::<User>::new(NodeStore::from(graph))),
        characters: Arc::new(InMemoryRepository::<Character>::new()),
        request_timeout: config.server.request_timeout(),
    };
    let schema = build_schema(state);

    let port = cli.port.unwrap_or(config.server.port);
    roster_api::server::serve(schema, port, config.server.playground).await?;

    Ok(())
}
