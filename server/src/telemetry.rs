//! Logging, OpenTelemetry export and per-request database query counting.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context as _;
use axum::{body::Body, http::HeaderValue, http::Request, middleware::Next, response::Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{span::Id, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::Context, registry::LookupSpan, EnvFilter, Layer};

use crate::config::OtelConfig;

pub const QUERY_COUNT_HEADER: &str = "X-DB-Query-Count";

tokio::task_local! {
    /// Queries issued by the current request. Follows the task across await
    /// points and worker threads.
    static DB_QUERY_COUNTER: Arc<AtomicU32>;
}

pub fn get_query_count() -> Option<u32> {
    DB_QUERY_COUNTER
        .try_with(|counter| counter.load(Ordering::Relaxed))
        .ok()
}

/// Counts `db.query` spans (opened by `PgStore::run`) against the request
/// that issued them.
pub struct DbQueryCountingLayer;

impl<S> Layer<S> for DbQueryCountingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if span.name() == "db.query" {
            let _ = DB_QUERY_COUNTER.try_with(|counter| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
    }
}

/// Must wrap the TraceLayer so the counter exists for the whole request.
pub async fn query_counting_middleware(request: Request<Body>, next: Next) -> Response {
    let counter = Arc::new(AtomicU32::new(0));
    DB_QUERY_COUNTER.scope(counter, next.run(request)).await
}

/// Only installed when `TRACK_DB_QUERY_COUNT=1`.
pub async fn db_query_count_header_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    if let Some(count) = get_query_count() {
        response
            .headers_mut()
            .insert(QUERY_COUNT_HEADER, HeaderValue::from(count));
    }
    response
}

/// Exporter handles kept alive for the lifetime of the process.
pub struct Telemetry {
    providers: Option<(SdkTracerProvider, SdkLoggerProvider)>,
}

impl Telemetry {
    /// Flush anything still buffered for the collector.
    pub fn shutdown(self) {
        let Some((traces, logs)) = self.providers else {
            return;
        };
        if let Err(e) = traces.shutdown() {
            eprintln!("failed to shut down trace exporter: {e}");
        }
        if let Err(e) = logs.shutdown() {
            eprintln!("failed to shut down log exporter: {e}");
        }
    }
}

fn collector_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .is_some_and(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
}

fn otel_providers(
    endpoint: &str,
    service_name: &str,
) -> anyhow::Result<(SdkTracerProvider, SdkLoggerProvider)> {
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to create OTLP trace exporter")?;
    let traces = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .with_resource(resource.clone())
        .build();

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to create OTLP log exporter")?;
    let logs = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    Ok((traces, logs))
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus OTLP export of traces and
/// logs when the configured collector answers.
pub fn init(config: &OtelConfig) -> anyhow::Result<Telemetry> {
    // `db.query` spans are info level; they must stay enabled to be counted.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    let endpoint = config
        .endpoint
        .as_deref()
        .filter(|endpoint| collector_reachable(endpoint));

    let Some(endpoint) = endpoint else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(DbQueryCountingLayer)
            .try_init()
            .context("failed to install tracing subscriber")?;

        match config.endpoint.as_deref() {
            Some(endpoint) => tracing::info!(
                "OpenTelemetry endpoint {} not reachable, using console logging only",
                endpoint
            ),
            None => {
                tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only")
            }
        }
        return Ok(Telemetry { providers: None });
    };

    let (traces, logs) = otel_providers(endpoint, &config.service_name)?;
    let tracer = traces.tracer(config.service_name.clone());
    opentelemetry::global::set_tracer_provider(traces.clone());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(DbQueryCountingLayer)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(OpenTelemetryTracingBridge::new(&logs))
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::info!(
        "OpenTelemetry enabled, exporting traces and logs to {} as {}",
        endpoint,
        config.service_name
    );

    Ok(Telemetry {
        providers: Some((traces, logs)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    #[tokio::test]
    async fn test_counts_db_query_spans_in_scope() {
        let subscriber = Registry::default().with(DbQueryCountingLayer);
        let _guard = tracing::subscriber::set_default(subscriber);

        let counter = Arc::new(AtomicU32::new(0));
        let seen = DB_QUERY_COUNTER
            .scope(counter.clone(), async {
                let _a = tracing::info_span!("db.query", op = "one").entered();
                let _b = tracing::info_span!("db.query", op = "two").entered();
                let _other = tracing::info_span!("http_request").entered();
                get_query_count()
            })
            .await;

        assert_eq!(seen, Some(2));
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_no_count_outside_a_request() {
        assert_eq!(get_query_count(), None);
    }

    #[test]
    fn test_unreachable_collector() {
        assert!(!collector_reachable("not a host:::"));
    }
}
