mod api;
mod auth;
mod config;
mod db;
mod error;
mod images;
mod load_data;
mod models;
mod raw_sql;
mod schema;
mod store;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware;
use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, OtelConfig};
use crate::store::PgStore;

/// Everything a handler can reach.
pub struct App {
    pub store: PgStore,
    pub config: Config,
}

/// Application state shared across all handlers
pub type AppState = Arc<App>;

#[derive(Parser)]
#[command(name = "foodgram-server")]
#[command(about = "Foodgram recipe API server", long_about = None)]
struct Cli {
    /// Print the OpenAPI document and exit
    #[arg(long)]
    openapi: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (the default)
    Serve,
    /// Print the OpenAPI document as JSON
    Openapi,
    /// Import ingredients and tags from CSV files
    LoadData {
        /// `name,measurement_unit` rows, no header
        #[arg(long, default_value = "data/ingredients.csv")]
        ingredients: PathBuf,
        /// `name,slug` rows, no header
        #[arg(long, default_value = "data/tags.csv")]
        tags: PathBuf,
    },
}

fn print_openapi() -> Result<()> {
    let spec = api::openapi()
        .to_pretty_json()
        .context("failed to serialize OpenAPI document")?;
    println!("{spec}");
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let track_queries = state.config.track_db_query_count;
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let mut app = Router::new()
        .merge(api::router())
        .merge(swagger_ui)
        .with_state(state);

    if track_queries {
        app = app.layer(middleware::from_fn(
            telemetry::db_query_count_header_middleware,
        ));
    }

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                // Image bytes are fetched constantly; keep them out of the logs.
                if matched_path == "/api/images/{id}" {
                    tracing::trace_span!("http_request")
                } else {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                }
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                    if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                        return;
                    }
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request completed"
                        );
                    }
                },
            )
            .on_failure(
                |error: tower_http::classify::ServerErrorsFailureClass,
                 latency: std::time::Duration,
                 _span: &Span| {
                    tracing::error!(
                        error = %error,
                        latency_ms = %latency.as_millis(),
                        "request failed"
                    );
                },
            ),
    )
    // Outermost, so the counter covers the whole request.
    .layer(middleware::from_fn(telemetry::query_counting_middleware))
}

async fn serve(config: Config) -> Result<()> {
    let pool = db::create_pool(&config.database_url)?;
    let bind_addr = config.bind_addr;
    let state: AppState = Arc::new(App {
        store: PgStore::new(pool),
        config,
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);
    tracing::info!(
        "OpenAPI spec available at http://{}/api-docs/openapi.json",
        local_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
        .context("server error")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        _ if cli.openapi => return print_openapi(),
        Some(command) => command,
        None => Commands::Serve,
    };
    if let Commands::Openapi = command {
        return print_openapi();
    }

    let telemetry = telemetry::init(&OtelConfig::from_env())?;
    let config = Config::from_env()?;

    let result = match command {
        Commands::LoadData { ingredients, tags } => db::create_pool(&config.database_url)
            .and_then(|pool| load_data::run(&PgStore::new(pool), &ingredients, &tags)),
        Commands::Serve | Commands::Openapi => serve(config).await,
    };

    telemetry.shutdown();
    result
}
