use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use async_graphql::dynamic::Schema;
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "oas-gateway", version)]
/// Serve an OpenAPI-described REST API as a GraphQL endpoint.
struct Args {
    /// Path to the OpenAPI 3 JSON document
    #[arg(long, default_value = "oas/1/spec.json")]
    path: PathBuf,
    /// Address the GraphQL server listens on
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen_address: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let data = std::fs::read_to_string(&args.path)
        .with_context(|| format!("could not read {}", args.path.display()))?;
    let document: openapiv3::OpenAPI =
        serde_json::from_str(&data).context("could not parse the OpenAPI document")?;

    let schema = oas_translator::translate(&document, reqwest::Client::new())?;

    let app = Router::new()
        .route("/", get(playground).post(graphql_handler))
        .with_state(schema);

    let listener = tokio::net::TcpListener::bind(args.listen_address).await?;
    tracing::info!("Server is listening on {}", args.listen_address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn graphql_handler(State(schema): State<Schema>, request: GraphQLRequest) -> GraphQLResponse {
    schema.execute(request.into_inner()).await.into()
}

async fn playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/")))
}
