//! Route handlers: the query endpoint, a forwarding stub, and health.

use axum::extract::{RawQuery, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::auth::{ContextOrgKey, ResolvedOrgKey};
use crate::errors::{ApiError, Envelope};
use crate::query::{decode, QueryResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1.0/stats/query", get(query))
        .route("/v1.0/stats/forward", post(forward))
        .route("/health", get(health))
}

#[instrument(skip(state))]
async fn query(
    State(state): State<AppState>,
    ResolvedOrgKey(_): ResolvedOrgKey,
    ContextOrgKey(org_key): ContextOrgKey,
    RawQuery(raw): RawQuery,
) -> Result<Json<Envelope<QueryResult>>, ApiError> {
    let pairs: Vec<(String, String)> = raw
        .as_deref()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    let query = decode::decode_query(&pairs)?;
    let result = state.query_service.handle(org_key.as_str(), query).await?;
    Ok(Json(Envelope::ok(result)))
}

/// `/v1.0/stats/forward` is reserved by the external interface but its
/// request-forwarding semantics are out of scope here.
async fn forward() -> ApiError {
    ApiError::new(
        crate::errors::ErrorCode::Misc,
        axum::http::StatusCode::NOT_IMPLEMENTED,
        "forwarding is not implemented",
    )
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
