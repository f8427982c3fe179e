// Copyright 2025 Stats Query Plane Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared error taxonomy and tenant-scoping types for the stats query plane.
//!
//! This crate holds the pieces that are common to the HTTP-facing service
//! and any future collaborator that needs to reason about the same error
//! kinds or the same per-tenant scoping key, without depending on axum,
//! reqwest, or any other transport-level crate.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod org;

pub use error::{Error, ErrorKind, Result};
pub use org::OrgKey;
