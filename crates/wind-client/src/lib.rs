//! HTTP client for the wind API.
//!
//! Implements [`overlay_cache::OverlaySource`] by calling `/wind` and
//! `/wind-recommendations` concurrently and merging the two bodies into one
//! [`overlay_common::WindOverlay`].

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod response;

pub use client::WindClient;
pub use config::WindClientConfig;
pub use error::WindClientError;
pub use response::{RecommendationsResponse, WindFieldResponse};
