//! # Campfire Infrastructure
//!
//! HTTP transport and the authenticated API client.
//!
//! This crate contains:
//! - A thin HTTP client wrapper over `reqwest`
//! - Declarative endpoint descriptors
//! - The network reachability gate
//! - The refresh-endpoint client
//! - The request executor that ties it all together
//!
//! ## Architecture
//! - Implements the transport traits defined in `campfire-common`
//! - Contains all "impure" code (network I/O)

pub mod api;
pub mod http;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiClientConfig, AuthApi, ConnectivityGate, ConnectivityMonitor,
    Endpoint, ParamEncoding,
};
pub use http::{HttpClient, HttpClientBuilder};
