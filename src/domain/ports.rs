use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::aggregates::{CreatedOrder, Order, Package, ShipStationOrder, ShippingRate};
use super::events::WebhookEvent;
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderQuery {
    pub limit: u32,
    pub offset: u32,
    /// Serve from the client's response cache when fresh.
    pub cache: bool,
}

impl Default for OrderQuery {
    fn default() -> Self { Self { limit: 20, offset: 0, cache: true } }
}

/// Checkout provider (Snipcart).
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Most recent orders first.
    async fn get_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;
    async fn validate_request_token(&self, token: &str) -> Result<bool>;
}

/// Fulfillment provider (ShipStation).
#[async_trait]
pub trait FulfillmentProvider: Send + Sync {
    async fn get_order_by_invoice(&self, invoice_number: &str) -> Result<Option<ShipStationOrder>>;
    async fn create_order(&self, order: &Order) -> Result<CreatedOrder>;
    async fn get_rates(&self, order: &Order, package: &Package) -> Result<Vec<ShippingRate>>;
}

/// Templates the notifier knows how to render.
#[derive(Clone, Debug, PartialEq)]
pub enum EmailTemplate {
    /// Orders missing from fulfillment and the re-feed result per invoice.
    Recovery { orders: Vec<Order>, reattempt: BTreeMap<String, bool> },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipients: &[String], subject: &str, template: &EmailTemplate) -> Result<()>;
}

/// Audit record of a received webhook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLog {
    pub id: Uuid,
    pub site_id: i64,
    pub event_name: String,
    pub mode: String,
    pub body: Value,
    pub date_created: DateTime<Utc>,
}

impl WebhookLog {
    pub fn new(site_id: i64, event: &WebhookEvent, body: Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            site_id,
            event_name: event.name.as_str().to_string(),
            mode: event.mode.as_str().to_string(),
            body,
            date_created: Utc::now(),
        }
    }
}

#[async_trait]
pub trait WebhookLogStore: Send + Sync {
    async fn record(&self, log: &WebhookLog) -> Result<()>;
}

pub type CheckoutProviderRef = Arc<dyn CheckoutProvider>;
pub type FulfillmentProviderRef = Arc<dyn FulfillmentProvider>;
pub type NotifierRef = Arc<dyn Notifier>;
pub type WebhookLogStoreRef = Arc<dyn WebhookLogStore>;
