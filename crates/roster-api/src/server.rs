//! HTTP transport for the GraphQL schema.

use std::net::SocketAddr;

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::schema::RosterSchema;

const GRAPHQL_PATH: &str = "/query";

/// Routes: GraphQL at `/query` (GET and POST), the playground at `/` when enabled.
pub fn build_router(schema: RosterSchema, playground: bool) -> Router {
    let mut router =
        Router::new().route(GRAPHQL_PATH, get(graphql_handler).post(graphql_handler));
    if playground {
        router = router.route("/", get(graphql_playground));
    }
    router.with_state(schema)
}

/// Serve until Ctrl-C or SIGTERM, then drain in-flight requests.
pub async fn serve(schema: RosterSchema, port: u16, playground: bool) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, playground, "roster-api listening");

    axum::serve(listener, build_router(schema, playground).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn graphql_handler(
    State(schema): State<RosterSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphql_playground() -> impl IntoResponse {
    playground_page()
}

fn playground_page() -> Html<String> {
    Html(playground_source(GraphQLPlaygroundConfig::new(GRAPHQL_PATH)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(?err, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(?err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playground_points_at_graphql_endpoint() {
        let Html(page) = playground_page();
        assert!(page.contains(GRAPHQL_PATH));
    }
}
