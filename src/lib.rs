//! Snipcart Relay
//!
//! Receives Snipcart webhooks, forwards orders to ShipStation and
//! reconciles recent orders between the two.
//!
//! ## Features
//! - Webhook validation and dispatch by event name
//! - Allow-list sanitizing of untrusted payloads before model population
//! - Shipping rates for Snipcart checkouts
//! - Order recovery sweep with re-feed and admin notification
//! - Webhook audit log

pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod infrastructure;

use thiserror::Error;

use crate::domain::events::ValidationError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid webhook: {0}")]
    Validation(#[from] ValidationError),

    #[error("Order {0} not found in fulfillment system")]
    UpstreamMissing(String),

    #[error("Order submission failed: {0}")]
    Submission(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Audit log unavailable: {0}")]
    AuditLog(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
