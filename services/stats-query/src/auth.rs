//! The `OrgKey` request extractor: every request is scoped to a tenant by
//! a single `X-Turbine-API-Key` header, resolved here and handed to the
//! handler as an opaque [`stats_core::OrgKey`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use stats_core::OrgKey;

use crate::errors::ApiError;
use crate::state::AppState;

const ORG_KEY_HEADER: &str = "x-turbine-api-key";
/// Org key assigned to every request when the `noauth` dev mode is set.
const NOAUTH_ORG_KEY: &str = "dev-noauth";

/// Resolved by the (stubbed) admission layer from the request header; on
/// success, also deposits the `OrgKey` into the request's extensions so
/// [`ContextOrgKey`] can pull it back out downstream.
#[derive(Debug)]
pub struct ResolvedOrgKey(pub OrgKey);

impl FromRequestParts<AppState> for ResolvedOrgKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let org_key = if state.config.dev_mode("noauth") {
            OrgKey::new(NOAUTH_ORG_KEY)
        } else {
            let mut values = parts.headers.get_all(ORG_KEY_HEADER).iter();
            let first = values
                .next()
                .ok_or_else(|| ApiError::unauthorized("missing X-Turbine-API-Key header"))?;
            if values.next().is_some() {
                return Err(ApiError::unauthorized("duplicate X-Turbine-API-Key header"));
            }
            let raw = first
                .to_str()
                .map_err(|_| ApiError::unauthorized("X-Turbine-API-Key header is not valid UTF-8"))?;
            if raw.is_empty() {
                return Err(ApiError::unauthorized("empty X-Turbine-API-Key header"));
            }
            OrgKey::new(raw)
        };

        parts.extensions.insert(org_key.clone());
        Ok(ResolvedOrgKey(org_key))
    }
}

/// `AsHandler()`'s own context pull: reads the `OrgKey` that [`ResolvedOrgKey`]
/// deposited into request context. This only fails when a route reaches the
/// handler without running the admission extractor first — a routing
/// misconfiguration, not something a caller's request can trigger — and is
/// reported distinctly from the 403 that a bad or missing header produces.
#[derive(Debug)]
pub struct ContextOrgKey(pub OrgKey);

impl<S> FromRequestParts<S> for ContextOrgKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OrgKey>()
            .cloned()
            .map(ContextOrgKey)
            .ok_or_else(|| {
                ApiError::new(
                    crate::errors::ErrorCode::Misc,
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "authorization config error",
                )
            })
    }
}
