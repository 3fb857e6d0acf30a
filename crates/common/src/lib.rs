//! # Campfire Common
//!
//! Shared authentication subsystem for the Campfire API client.
//!
//! This crate contains:
//! - The access/refresh token pair model
//! - The credential store abstraction and its in-memory implementation
//! - The single-flight refresh coordinator and logout broadcast
//!
//! ## Architecture
//! - Depends only on `campfire-domain` and external crates
//! - Contains no HTTP code; the refresh network call is injected behind
//!   the [`auth::RefreshTransport`] trait

pub mod auth;

// Re-export commonly used items
pub use auth::{
    InMemoryTokenStore, LogoutEvent, RefreshCoordinator, RefreshOutcome, RefreshTransport,
    TokenPair, TokenStore,
};
