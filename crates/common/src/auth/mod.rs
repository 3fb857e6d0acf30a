//! Bearer-token authentication infrastructure
//!
//! Everything the request executor needs to stay authenticated: the token
//! pair model, a store abstraction over credential storage, and the
//! single-flight refresh coordinator that recovers from access-token
//! expiry without duplicating refresh calls.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ RefreshCoordinator │  Single-flight refresh state machine
//! └─────────┬──────────┘
//!           │
//!           ├──► RefreshTransport  (refresh endpoint call, injected)
//!           ├──► TokenStore        (credential storage, injected)
//!           └──► LogoutEvent       (broadcast on terminal auth failure)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: The [`TokenPair`] model
//! - **[`store`]**: [`TokenStore`] trait and [`InMemoryTokenStore`]
//! - **[`refresh`]**: [`RefreshCoordinator`] and its collaborator traits

pub mod refresh;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use refresh::{LogoutEvent, RefreshCoordinator, RefreshOutcome, RefreshTransport};
pub use store::{InMemoryTokenStore, TokenStore};
pub use types::TokenPair;
