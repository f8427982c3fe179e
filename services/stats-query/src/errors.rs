//! HTTP-facing error envelope.
//!
//! Wraps the query plane's [`stats_core::Error`] into the stable wire
//! shape every response uses: `{"error": null|{code,status,message},
//! "payload": ...|null}`. The mapping from error kind to wire code follows
//! the taxonomy and the concrete handler algorithm together: where the
//! taxonomy table offers either of two codes for a kind, the handler
//! algorithm's worked example picks one, and that is what is implemented
//! here (see DESIGN.md).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stats_core::Error;

/// Stable wire error codes, per the external interface contract. Not every
/// code is produced by a code path in this service; `UnknownNoBody`,
/// `AuthMethodDenied`, and `UnknownUnclassified` are declared for protocol
/// completeness even though nothing currently emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownNoBody,
    UnknownTransport,
    UnknownDecoding,
    UnknownUnauthorized,
    AuthMethodDenied,
    InvalidObject,
    Misc,
    UnknownUnclassified,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnknownNoBody => "UnknownNoBody",
            ErrorCode::UnknownTransport => "UnknownTransport",
            ErrorCode::UnknownDecoding => "UnknownDecoding",
            ErrorCode::UnknownUnauthorized => "UnknownUnauthorized",
            ErrorCode::AuthMethodDenied => "AuthMethodDenied",
            ErrorCode::InvalidObject => "InvalidObject",
            ErrorCode::Misc => "Misc",
            ErrorCode::UnknownUnclassified => "UnknownUnclassified",
        }
    }
}

/// HTTP-facing error: a resolved wire code, status, and message.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
        }
    }

    /// Missing or duplicate org-scoping header: the one error this crate's
    /// own (stubbed) admission layer produces directly.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownUnauthorized, StatusCode::FORBIDDEN, message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidObject(msg) => Self::new(ErrorCode::InvalidObject, StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => Self::unauthorized(msg),
            Error::Transport(msg) => Self::new(ErrorCode::Misc, StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::BackendStatus { status, body } => Self::new(
                ErrorCode::Misc,
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("backend returned status {status}: {body}"),
            ),
            Error::Decoding(msg) => {
                Self::new(ErrorCode::UnknownTransport, StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            Error::Internal(msg) => Self::new(ErrorCode::Misc, StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    status: u16,
    message: String,
}

/// The uniform `{error, payload}` envelope used by every HTTP response.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    error: Option<ErrorBody>,
    payload: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            error: None,
            payload: Some(payload),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            error: Some(ErrorBody {
                code: self.code.as_str(),
                status: self.status.as_u16(),
                message: self.message,
            }),
            payload: None,
        };
        (self.status, Json(body)).into_response()
    }
}
