// Copyright 2025 Stats Query Plane Contributors
// SPDX-License-Identifier: Apache-2.0

//! The per-tenant scoping key threaded through the query plane.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque per-tenant identifier, resolved by the (out-of-scope) admission
/// layer and carried through the request context from there on.
///
/// `OrgKey` is injected into metric names (as the leading path segment) and
/// into tag filters; it never drives control flow beyond that, so it is
/// kept as an opaque newtype rather than a parsed/validated structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgKey(String);

impl OrgKey {
    /// Wrap a raw scoping value as an `OrgKey`.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrgKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrgKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
