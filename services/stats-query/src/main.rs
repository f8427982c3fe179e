use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::AllowOrigin;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use dotenvy::dotenv;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use stats_query::{AppState, Config};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::parse();
    let default_directive = if config.dev_mode("verbose") {
        "stats_query=trace,tower_http=debug"
    } else {
        "stats_query=debug,tower_http=debug"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stats query plane");

    let metrics_port = config.metrics_port;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let prometheus_handle = setup_metrics_recorder()?;
    info!("Metrics exporter listening on port {}", metrics_port);

    let state = AppState::new(config.clone());
    let app = build_router(state, prometheus_handle, &config.cors_origins);

    info!("stats-query listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState, prometheus_handle: PrometheusHandle, cors_origins: &str) -> Router {
    let allow_origin = if cors_origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    stats_query::routes::router()
        .route("/metrics", get(move || async move { prometheus_handle.render() }))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::GATEWAY_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors)
        .with_state(state)
}

fn setup_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();

    let builder = builder.set_buckets_for_metric(
        Matcher::Full("backend_request_duration_seconds".to_string()),
        &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
    )?;

    let handle = builder.install_recorder()?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds_with_default_config() {
        let config = Config::parse_from(["stats-query", "--backend-url", "http://backend"]);
        let state = AppState::new(config.clone());
        let handle = PrometheusBuilder::new().install_recorder().unwrap();
        let _app = build_router(state, handle, &config.cors_origins);
    }
}
