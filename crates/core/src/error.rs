// Copyright 2025 Stats Query Plane Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the stats query plane.
//!
//! The taxonomy is deliberately small: every failure the query plane can
//! produce belongs to one of six kinds, each with a fixed HTTP status class
//! and a stable wire code (see `stats_query::errors` for the HTTP-facing
//! mapping).

use std::fmt;

/// Result type alias using the query plane's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure category, independent of the stable wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request failed validation before any backend dispatch happened.
    InputValidation,
    /// Caller could not be scoped to an organization.
    AuthFailure,
    /// A backend HTTP call failed at the transport level (timeout, connect
    /// error, retries exhausted).
    TransportFailure,
    /// A backend response could not be decoded into the canonical shape.
    DecodingFailure,
    /// A backend response carried a >= 400 HTTP status.
    BackendStatus,
    /// Anything else: misconfiguration, missing request context, etc.
    Internal,
}

/// Query plane error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `Query` or one of its `QueryTimeSeries` failed validation.
    #[error("invalid query: {0}")]
    InvalidObject(String),

    /// The caller did not present exactly one organization-identifying
    /// header.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A backend HTTP call failed at the transport level after exhausting
    /// its retry budget.
    #[error("backend transport error: {0}")]
    Transport(String),

    /// A backend response returned a status code >= 400.
    #[error("backend returned status {status}: {body}")]
    BackendStatus {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Truncated response body, for diagnostics.
        body: String,
    },

    /// A backend response body could not be decoded into the canonical
    /// point-list shape.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Anything else: misconfiguration, unreachable states, etc.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify this error into its broad [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidObject(_) => ErrorKind::InputValidation,
            Error::Unauthorized(_) => ErrorKind::AuthFailure,
            Error::Transport(_) => ErrorKind::TransportFailure,
            Error::BackendStatus { .. } => ErrorKind::BackendStatus,
            Error::Decoding(_) => ErrorKind::DecodingFailure,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Build an [`Error::InvalidObject`] identifying the offending series by
    /// its diagnostic identifier (name or index), per the validation
    /// diagnostic contract. Callers compute `ident` themselves — this crate
    /// has no access to the series type that owns the name-or-index rule.
    pub fn invalid_series(ident: &str, reason: impl fmt::Display) -> Self {
        Error::InvalidObject(format!("{ident}: {reason}"))
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidObject(format!("invalid query argument: {err}"))
    }
}
