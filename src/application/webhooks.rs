//! Webhook dispatch
//!
//! Validates the envelope of a Snipcart webhook, records it in the audit log
//! and hands the sanitized content to the handler for its event.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::domain::aggregates::shipping::PackageDefaults;
use crate::domain::aggregates::{Customer, Notification, Order, Package, Refund, Subscription};
use crate::domain::events::{ValidationError, WebhookEvent, WebhookEventName};
use crate::domain::ports::{CheckoutProviderRef, FulfillmentProviderRef, WebhookLog, WebhookLogStoreRef};
use crate::domain::sanitizer::{safe_populate, Schema};

#[derive(Clone, Debug)]
pub struct DispatcherSettings {
    pub site_id: i64,
    /// Confirm each request token with Snipcart before accepting it.
    pub validate_requests: bool,
    pub log_requests: bool,
    pub package: PackageDefaults,
}

pub struct WebhookDispatcher {
    checkout: CheckoutProviderRef,
    fulfillment: FulfillmentProviderRef,
    log_store: WebhookLogStoreRef,
    settings: DispatcherSettings,
}

impl WebhookDispatcher {
    pub fn new(
        checkout: CheckoutProviderRef,
        fulfillment: FulfillmentProviderRef,
        log_store: WebhookLogStoreRef,
        settings: DispatcherSettings,
    ) -> Self {
        Self { checkout, fulfillment, log_store, settings }
    }

    /// Handles a raw webhook body and returns the JSON payload to answer with.
    pub async fn handle(&self, body: &[u8], token: Option<&str>) -> Result<Value, ValidationError> {
        if self.settings.validate_requests {
            self.check_token(token).await?;
        }

        // an unreadable body has no event name and is rejected as such
        let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let event = WebhookEvent::from_body(&payload)?;

        info!(event = %event.name, mode = event.mode.as_str(), "Received Snipcart webhook");

        if self.settings.log_requests {
            let log = WebhookLog::new(self.settings.site_id, &event, payload);
            if let Err(e) = self.log_store.record(&log).await {
                warn!("Failed to record webhook {}: {}", event.name, e);
            }
        }

        self.dispatch(&event).await
    }

    async fn check_token(&self, token: Option<&str>) -> Result<(), ValidationError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(ValidationError::InvalidToken)?;
        match self.checkout.validate_request_token(token).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ValidationError::InvalidToken),
            Err(e) => {
                warn!("Could not validate Snipcart request token: {}", e);
                Err(ValidationError::InvalidToken)
            }
        }
    }

    async fn dispatch(&self, event: &WebhookEvent) -> Result<Value, ValidationError> {
        use WebhookEventName::*;

        match event.name {
            OrderCompleted => self.order_completed(event).await,
            OrderStatusChanged | OrderPaymentStatusChanged | OrderTrackingNumberChanged => {
                self.order_changed(event)
            }
            ShippingRatesFetch => self.shipping_rates(event).await,
            SubscriptionCreated
            | SubscriptionCancelled
            | SubscriptionPaused
            | SubscriptionResumed
            | SubscriptionInvoiceCreated => {
                let subscription: Subscription = populate(event)?;
                info!(
                    event = %event.name,
                    subscription = subscription.id.as_deref().unwrap_or("-"),
                    "Subscription webhook handled"
                );
                Ok(success())
            }
            TaxesCalculate => {
                let order: Order = populate(event)?;
                info!("Tax calculation requested for {}", order.invoice_number());
                Ok(json!({ "taxes": [] }))
            }
            CustomerUpdated => {
                let customer: Customer = populate(event)?;
                info!("Customer {} updated", customer.email.as_deref().unwrap_or("-"));
                Ok(success())
            }
            OrderRefundCreated => {
                let refund: Refund = populate(event)?;
                info!(
                    order = refund.order_token.as_deref().unwrap_or("-"),
                    amount = ?refund.amount,
                    "Refund created"
                );
                Ok(success())
            }
            OrderNotificationCreated => {
                let notification: Notification = populate(event)?;
                info!(
                    order = notification.order_token.as_deref().unwrap_or("-"),
                    kind = notification.notification_type.as_deref().unwrap_or("-"),
                    "Order notification created"
                );
                Ok(success())
            }
        }
    }

    /// Forwards shippable orders to fulfillment. Submission failures are
    /// reported in the body; the recovery sweep picks those orders up later.
    async fn order_completed(&self, event: &WebhookEvent) -> Result<Value, ValidationError> {
        let order: Order = populate(event)?;

        if !order.has_shippable_items() {
            info!("Order {} has nothing to ship", order.invoice_number());
            return Ok(json!({ "success": true, "fulfillment": null }));
        }

        let fulfillment = match self.fulfillment.create_order(&order).await {
            Ok(created) => {
                if created.succeeded() {
                    info!("Order {} sent to ShipStation as {:?}", order.invoice_number(), created.order_id);
                } else {
                    error!("ShipStation rejected order {}: {}", order.invoice_number(), created.errors.join(", "));
                }
                json!({ "orderId": created.order_id, "errors": created.errors })
            }
            Err(e) => {
                error!("Failed to send order {} to ShipStation: {}", order.invoice_number(), e);
                json!({ "orderId": null, "errors": [e.to_string()] })
            }
        };

        Ok(json!({ "success": true, "fulfillment": fulfillment }))
    }

    fn order_changed(&self, event: &WebhookEvent) -> Result<Value, ValidationError> {
        let order: Order = populate(event)?;
        match event.name {
            WebhookEventName::OrderTrackingNumberChanged => info!(
                "Order {} tracking number is now {}",
                order.invoice_number(),
                event.tracking_number.as_deref().unwrap_or("-")
            ),
            _ => info!(
                "Order {} {} changed from {} to {}",
                order.invoice_number(),
                event.name,
                event.from.as_deref().unwrap_or("-"),
                event.to.as_deref().unwrap_or("-")
            ),
        }
        Ok(success())
    }

    async fn shipping_rates(&self, event: &WebhookEvent) -> Result<Value, ValidationError> {
        let order: Order = populate(event)?;
        let package = Package::for_order(&order, &self.settings.package);

        let rates = match &package {
            Some(package) => self.fulfillment.get_rates(&order, package).await.unwrap_or_else(|e| {
                warn!("Rate lookup failed for {}: {}", order.invoice_number(), e);
                vec![]
            }),
            None => vec![],
        };

        Ok(json!({ "rates": rates, "package": package }))
    }
}

fn success() -> Value {
    json!({ "success": true })
}

fn populate<T: Schema + DeserializeOwned>(event: &WebhookEvent) -> Result<T, ValidationError> {
    safe_populate(event.content.clone()).map_err(|e| {
        warn!("{} content could not be read: {}", event.name, e);
        ValidationError::InvalidContent
    })
}
