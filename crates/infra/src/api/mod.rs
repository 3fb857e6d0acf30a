//! Authenticated API client
//!
//! This module provides the HTTP-based client for the Campfire API. It
//! handles endpoint description, bearer authentication with single-flight
//! token refresh, response envelope decoding, and direct storage uploads.
//!
//! # Architecture
//!
//! - Uses [`crate::http::HttpClient`] (no direct reqwest)
//! - Refresh coordination and credential storage come from
//!   `campfire-common`; this module supplies the network half
//! - Requests short-circuit on the connectivity gate before any I/O

pub mod auth;
pub mod client;
pub mod connectivity;
pub mod endpoint;

pub use auth::AuthApi;
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use connectivity::{ConnectivityGate, ConnectivityMonitor};
pub use endpoint::{Endpoint, ParamEncoding};
