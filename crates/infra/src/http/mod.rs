//! HTTP transport wrapper
//!
//! Keeps `reqwest` behind one seam so the rest of the crate deals in
//! classified [`campfire_domain::ApiError`] values instead of raw
//! transport errors.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
