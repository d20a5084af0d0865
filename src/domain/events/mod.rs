//! Webhook events posted by Snipcart

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEventName {
    #[serde(rename = "order.completed")] OrderCompleted,
    #[serde(rename = "order.status.changed")] OrderStatusChanged,
    #[serde(rename = "order.paymentStatus.changed")] OrderPaymentStatusChanged,
    #[serde(rename = "order.trackingNumber.changed")] OrderTrackingNumberChanged,
    #[serde(rename = "order.refund.created")] OrderRefundCreated,
    #[serde(rename = "order.notification.created")] OrderNotificationCreated,
    #[serde(rename = "subscription.created")] SubscriptionCreated,
    #[serde(rename = "subscription.cancelled")] SubscriptionCancelled,
    #[serde(rename = "subscription.paused")] SubscriptionPaused,
    #[serde(rename = "subscription.resumed")] SubscriptionResumed,
    #[serde(rename = "subscription.invoice.created")] SubscriptionInvoiceCreated,
    #[serde(rename = "shippingrates.fetch")] ShippingRatesFetch,
    #[serde(rename = "taxes.calculate")] TaxesCalculate,
    #[serde(rename = "customauth:customer_updated")] CustomerUpdated,
}

impl WebhookEventName {
    pub const ALL: [WebhookEventName; 14] = [
        Self::OrderCompleted, Self::OrderStatusChanged, Self::OrderPaymentStatusChanged,
        Self::OrderTrackingNumberChanged, Self::OrderRefundCreated, Self::OrderNotificationCreated,
        Self::SubscriptionCreated, Self::SubscriptionCancelled, Self::SubscriptionPaused,
        Self::SubscriptionResumed, Self::SubscriptionInvoiceCreated, Self::ShippingRatesFetch,
        Self::TaxesCalculate, Self::CustomerUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCompleted => "order.completed",
            Self::OrderStatusChanged => "order.status.changed",
            Self::OrderPaymentStatusChanged => "order.paymentStatus.changed",
            Self::OrderTrackingNumberChanged => "order.trackingNumber.changed",
            Self::OrderRefundCreated => "order.refund.created",
            Self::OrderNotificationCreated => "order.notification.created",
            Self::SubscriptionCreated => "subscription.created",
            Self::SubscriptionCancelled => "subscription.cancelled",
            Self::SubscriptionPaused => "subscription.paused",
            Self::SubscriptionResumed => "subscription.resumed",
            Self::SubscriptionInvoiceCreated => "subscription.invoice.created",
            Self::ShippingRatesFetch => "shippingrates.fetch",
            Self::TaxesCalculate => "taxes.calculate",
            Self::CustomerUpdated => "customauth:customer_updated",
        }
    }

    /// Exact, case-sensitive match against the known event names.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

impl fmt::Display for WebhookEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookMode { Test, Live }

impl WebhookMode {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Test => "Test", Self::Live => "Live" }
    }
    pub fn parse(mode: &str) -> Option<Self> {
        match mode { "Test" => Some(Self::Test), "Live" => Some(Self::Live), _ => None }
    }
}

/// Reasons a webhook request is rejected with `400 Bad Request`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid token.")]
    InvalidToken,
    #[error("Invalid event.")]
    InvalidEvent,
    #[error("Request missing mode.")]
    MissingMode,
    #[error("Invalid mode.")]
    InvalidMode,
    #[error("Request missing content.")]
    MissingContent,
    #[error("Invalid content.")]
    InvalidContent,
}

/// A validated webhook envelope. `content` is still raw JSON; handlers
/// populate the model their event expects.
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookEvent {
    pub name: WebhookEventName,
    pub mode: WebhookMode,
    pub created_on: Option<DateTime<Utc>>,
    pub content: Value,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

impl WebhookEvent {
    /// Validates the envelope of a decoded request body.
    pub fn from_body(body: &Value) -> Result<Self, ValidationError> {
        let name = body
            .get("eventName")
            .and_then(Value::as_str)
            .and_then(WebhookEventName::parse)
            .ok_or(ValidationError::InvalidEvent)?;

        let mode = match body.get("mode") {
            None | Some(Value::Null) => return Err(ValidationError::MissingMode),
            Some(mode) => mode.as_str().and_then(WebhookMode::parse).ok_or(ValidationError::InvalidMode)?,
        };

        let content = body.get("content").cloned().unwrap_or(Value::Null);
        if is_empty_content(&content) {
            return Err(ValidationError::MissingContent);
        }

        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            name,
            mode,
            created_on: body
                .get("createdOn")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc)),
            content,
            from: text("from"),
            to: text("to"),
            tracking_number: text("trackingNumber"),
            tracking_url: text("trackingUrl"),
        })
    }
}

/// Content counts as missing when it is null or an empty/zero scalar or
/// collection.
fn is_empty_content(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
