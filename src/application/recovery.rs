//! Order recovery sweep
//!
//! Checks that the most recent Snipcart orders made it into ShipStation,
//! re-feeds recent misses and emails the admins a summary.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::domain::aggregates::Order;
use crate::domain::ports::{CheckoutProviderRef, EmailTemplate, FulfillmentProviderRef, NotifierRef, OrderQuery};
use crate::Result;

pub const RECOVERY_SUBJECT: &str = "Recovered Snipcart Orders";
/// One week.
pub const MAX_REFEED_WINDOW_MINUTES: i64 = 10_080;
pub const MAX_ORDER_LIMIT: u32 = 50;

/// Result of looking up one Snipcart order in ShipStation.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderCheck {
    pub invoice_number: String,
    pub found: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefeedOutcome {
    Succeeded,
    /// Accepted by ShipStation running in test mode.
    Test,
    Failed(Vec<String>),
}

impl RefeedOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationStatus {
    NotNeeded,
    Sent,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecoveryReport {
    pub checks: Vec<OrderCheck>,
    pub refeeds: Vec<(String, RefeedOutcome)>,
    /// Missing orders outside the re-feed window.
    pub skipped: Vec<String>,
    pub notification: NotificationStatus,
    pub elapsed: Duration,
}

impl RecoveryReport {
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.found).count()
    }

    /// Invoice number to whether its re-feed went through.
    pub fn reattempt(&self) -> BTreeMap<String, bool> {
        self.refeeds.iter().map(|(invoice, outcome)| (invoice.clone(), outcome.succeeded())).collect()
    }
}

pub struct OrderRecovery {
    checkout: CheckoutProviderRef,
    fulfillment: FulfillmentProviderRef,
    notifier: NotifierRef,
    recipients: Vec<String>,
    /// Minutes after creation during which a missing order is re-fed.
    window_minutes: i64,
    limit: u32,
}

impl OrderRecovery {
    pub fn new(
        checkout: CheckoutProviderRef,
        fulfillment: FulfillmentProviderRef,
        notifier: NotifierRef,
        recipients: Vec<String>,
        window_minutes: i64,
        limit: u32,
    ) -> Self {
        // out of range values would overflow the window arithmetic
        let window_minutes = window_minutes.clamp(1, MAX_REFEED_WINDOW_MINUTES);
        let limit = limit.clamp(1, MAX_ORDER_LIMIT);
        Self { checkout, fulfillment, notifier, recipients, window_minutes, limit }
    }

    pub async fn run(&self, force_feed: bool) -> Result<RecoveryReport> {
        self.run_at(force_feed, Utc::now()).await
    }

    /// Runs the sweep as of `now`. Only the order listing can fail it.
    pub async fn run_at(&self, force_feed: bool, now: DateTime<Utc>) -> Result<RecoveryReport> {
        let started = Instant::now();
        info!("Checking last {} orders", self.limit);

        let orders = self
            .checkout
            .get_orders(OrderQuery { limit: self.limit, offset: 0, cache: false })
            .await?;

        let mut checks = Vec::with_capacity(orders.len());
        let mut failed: Vec<Order> = Vec::new();
        for order in orders {
            let invoice = order.invoice_number().to_string();
            let found = match self.fulfillment.get_order_by_invoice(&invoice).await {
                Ok(found) => found.is_some(),
                Err(e) => {
                    warn!("ShipStation lookup for {} failed: {}", invoice, e);
                    false
                }
            };
            info!(invoice = %invoice, found, "Checked order");
            checks.push(OrderCheck { invoice_number: invoice, found });
            if !found {
                failed.push(order);
            }
        }

        let mut refeeds = Vec::new();
        let mut skipped = Vec::new();
        for order in &failed {
            let invoice = order.invoice_number().to_string();
            if !force_feed && !order.created_within(self.window_minutes, now) {
                info!("Order {} is outside the {} minute re-feed window", invoice, self.window_minutes);
                skipped.push(invoice);
                continue;
            }
            let outcome = self.refeed(order).await;
            refeeds.push((invoice, outcome));
        }

        let notification = if failed.is_empty() {
            NotificationStatus::NotNeeded
        } else {
            let reattempt = refeeds.iter().map(|(invoice, outcome)| (invoice.clone(), outcome.succeeded())).collect();
            self.notify(failed, reattempt).await
        };

        let report = RecoveryReport { checks, refeeds, skipped, notification, elapsed: started.elapsed() };
        info!(
            checked = report.checks.len(),
            missing = report.failed_count(),
            "Order check finished in {:.2?}",
            report.elapsed
        );
        Ok(report)
    }

    async fn refeed(&self, order: &Order) -> RefeedOutcome {
        let invoice = order.invoice_number();
        info!("Re-sending order {} to ShipStation", invoice);

        match self.fulfillment.create_order(order).await {
            Ok(created) if created.is_test() => RefeedOutcome::Test,
            Ok(created) if created.succeeded() => RefeedOutcome::Succeeded,
            Ok(created) => {
                let errors = if created.errors.is_empty() {
                    vec!["ShipStation returned no order id".to_string()]
                } else {
                    created.errors
                };
                error!("ShipStation re-feed failed for {}: {}", invoice, errors.join(", "));
                RefeedOutcome::Failed(errors)
            }
            Err(e) => {
                error!("ShipStation re-feed failed for {}: {}", invoice, e);
                RefeedOutcome::Failed(vec![e.to_string()])
            }
        }
    }

    async fn notify(&self, orders: Vec<Order>, reattempt: BTreeMap<String, bool>) -> NotificationStatus {
        let template = EmailTemplate::Recovery { orders, reattempt };
        match self.notifier.send(&self.recipients, RECOVERY_SUBJECT, &template).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                error!("Recovery notification failed: {}", e);
                NotificationStatus::Failed(e.to_string())
            }
        }
    }
}
