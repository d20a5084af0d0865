#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use snipcart_relay::application::{DispatcherSettings, WebhookDispatcher};
use snipcart_relay::domain::aggregates::shipping::PackageDefaults;
use snipcart_relay::domain::aggregates::{CreatedOrder, Order, Package, ShipStationOrder, ShippingRate, TEST_ORDER_ID};
use snipcart_relay::domain::ports::{
    CheckoutProvider, EmailTemplate, FulfillmentProvider, Notifier, OrderQuery, WebhookLogStore,
};
use snipcart_relay::domain::sanitizer::safe_populate;
use snipcart_relay::infrastructure::InMemoryWebhookLogStore;
use snipcart_relay::{RelayError, Result};

/// Snipcart order JSON with both nested and flat address keys, the way
/// Snipcart sends it.
pub fn generate_order(invoice: &str, created: DateTime<Utc>) -> Value {
    json!({
        "invoiceNumber": invoice,
        "token": format!("token-{invoice}"),
        "creationDate": created.to_rfc3339(),
        "modificationDate": created.to_rfc3339(),
        "status": "InProgress",
        "paymentStatus": "Paid",
        "email": "tobias@actorpull.biz",
        "billingAddressName": "Tobias Fünke",
        "billingAddressAddress1": "1234 Balboa Towers Circle",
        "billingAddressCity": "Los Angeles",
        "billingAddressProvince": "CA",
        "billingAddressPostalCode": "92706",
        "billingAddressCountry": "US",
        "billingAddress": {
            "fullName": "Tobias Fünke",
            "name": "Tobias Fünke",
            "address1": "1234 Balboa Towers Circle",
            "address2": "Apt 1234",
            "city": "Los Angeles",
            "province": "CA",
            "postalCode": "92706",
            "country": "US",
            "phone": "555-555-5555"
        },
        "shippingAddressName": "Tobias Fünke",
        "shippingAddressSameAsBilling": true,
        "creditCardLast4Digits": null,
        "shippingMethod": "UPS Ground",
        "shippingFees": 5,
        "taxableTotal": 0,
        "taxesTotal": 0,
        "itemsTotal": 2,
        "totalWeight": 300,
        "grandTotal": 45.5,
        "finalGrandTotal": 45.5,
        "ipAddress": "0.0.0.0",
        "userAgent": "test",
        "items": [
            {
                "uniqueId": "a1", "id": "BLUE-PAINT", "name": "Blue Paint", "price": 20.5,
                "quantity": 1, "weight": 200, "totalWeight": 200, "shippable": true, "taxable": true,
                "customFields": [{"name": "Finish", "type": "dropdown", "value": "Matte", "options": "Matte|Gloss"}]
            },
            {
                "uniqueId": "a2", "id": "GIFT-CARD", "name": "Gift Card", "price": 25,
                "quantity": 1, "weight": 100, "totalWeight": 100, "shippable": false, "taxable": false
            }
        ]
    })
}

pub fn order(invoice: &str, created: DateTime<Utc>) -> Order {
    safe_populate(generate_order(invoice, created)).unwrap()
}

pub fn webhook(event: &str, mode: &str, content: Value) -> Value {
    json!({"eventName": event, "mode": mode, "createdOn": Utc::now().to_rfc3339(), "content": content})
}

#[derive(Default)]
pub struct FakeCheckout {
    pub orders: Vec<Order>,
    pub valid_tokens: Vec<String>,
    pub queries: Mutex<Vec<OrderQuery>>,
}

impl FakeCheckout {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self { orders, ..Self::default() }
    }
}

#[async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn get_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        self.queries.lock().unwrap().push(query);
        Ok(self.orders.iter().take(query.limit as usize).cloned().collect())
    }

    async fn validate_request_token(&self, token: &str) -> Result<bool> {
        Ok(self.valid_tokens.iter().any(|t| t == token))
    }
}

pub struct FakeFulfillment {
    pub known: HashSet<String>,
    pub lookup_errors: HashSet<String>,
    pub response: CreatedOrder,
    pub rates: Vec<ShippingRate>,
    pub created: Mutex<Vec<String>>,
    pub packages: Mutex<Vec<Package>>,
}

impl Default for FakeFulfillment {
    fn default() -> Self {
        Self {
            known: HashSet::new(),
            lookup_errors: HashSet::new(),
            response: CreatedOrder { order_id: Some(1234), errors: vec![] },
            rates: vec![ShippingRate {
                cost: Decimal::new(1250, 2),
                description: "USPS Priority Mail".to_string(),
                guaranteed_days_to_delivery: None,
                user_defined_id: Some("usps_priority_mail".to_string()),
            }],
            created: Mutex::new(vec![]),
            packages: Mutex::new(vec![]),
        }
    }
}

impl FakeFulfillment {
    pub fn knowing(invoices: &[&str]) -> Self {
        Self { known: invoices.iter().map(|i| i.to_string()).collect(), ..Self::default() }
    }

    pub fn test_mode(mut self) -> Self {
        self.response = CreatedOrder { order_id: Some(TEST_ORDER_ID), errors: vec![] };
        self
    }

    pub fn rejecting(mut self, error: &str) -> Self {
        self.response = CreatedOrder { order_id: None, errors: vec![error.to_string()] };
        self
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl FulfillmentProvider for FakeFulfillment {
    async fn get_order_by_invoice(&self, invoice_number: &str) -> Result<Option<ShipStationOrder>> {
        if self.lookup_errors.contains(invoice_number) {
            return Err(RelayError::UpstreamMissing(invoice_number.to_string()));
        }
        if !self.known.contains(invoice_number) {
            return Ok(None);
        }
        Ok(Some(
            safe_populate(json!({"orderId": 1, "orderNumber": invoice_number, "orderStatus": "awaiting_shipment"}))
                .unwrap(),
        ))
    }

    async fn create_order(&self, order: &Order) -> Result<CreatedOrder> {
        self.created.lock().unwrap().push(order.invoice_number().to_string());
        Ok(self.response.clone())
    }

    async fn get_rates(&self, _order: &Order, package: &Package) -> Result<Vec<ShippingRate>> {
        self.packages.lock().unwrap().push(package.clone());
        Ok(self.rates.clone())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<(Vec<String>, String, EmailTemplate)>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<(Vec<String>, String, EmailTemplate)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipients: &[String], subject: &str, template: &EmailTemplate) -> Result<()> {
        self.sent.lock().unwrap().push((recipients.to_vec(), subject.to_string(), template.clone()));
        if self.fail {
            return Err(RelayError::Notification("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

/// Audit log store that always fails.
pub struct BrokenLogStore;

#[async_trait]
impl WebhookLogStore for BrokenLogStore {
    async fn record(&self, _log: &snipcart_relay::domain::ports::WebhookLog) -> Result<()> {
        Err(RelayError::Config("log table missing".to_string()))
    }
}

pub fn dispatcher_settings() -> DispatcherSettings {
    DispatcherSettings {
        site_id: 1,
        validate_requests: false,
        log_requests: true,
        package: PackageDefaults::default(),
    }
}

pub struct Harness {
    pub checkout: Arc<FakeCheckout>,
    pub fulfillment: Arc<FakeFulfillment>,
    pub log_store: Arc<InMemoryWebhookLogStore>,
    pub dispatcher: Arc<WebhookDispatcher>,
}

pub fn harness(checkout: FakeCheckout, fulfillment: FakeFulfillment, settings: DispatcherSettings) -> Harness {
    let checkout = Arc::new(checkout);
    let fulfillment = Arc::new(fulfillment);
    let log_store = Arc::new(InMemoryWebhookLogStore::new());
    let dispatcher = Arc::new(WebhookDispatcher::new(
        checkout.clone(),
        fulfillment.clone(),
        log_store.clone(),
        settings,
    ));
    Harness { checkout, fulfillment, log_store, dispatcher }
}
