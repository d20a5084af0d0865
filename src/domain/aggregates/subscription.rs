//! Subscription Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::aggregates::Customer;
use crate::domain::sanitizer::{strip_field, Schema};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Subscription {
    pub id: Option<String>,
    pub user: Option<Customer>,
    pub initial_order_token: Option<String>,
    pub first_invoice_received_on: Option<DateTime<Utc>>,
    pub schedule: Option<Schedule>,
    pub item_id: Option<String>,
    pub name: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    pub cancelled_on: Option<DateTime<Utc>>,
    pub paused_on: Option<DateTime<Utc>>,
    pub resumed_on: Option<DateTime<Utc>>,
    pub amount: Option<Decimal>,
    pub quantity: Option<u32>,
    pub user_defined_id: Option<String>,
    pub total_spent: Option<Decimal>,
    pub status: Option<String>,
    pub gateway_id: Option<String>,
    pub metadata: Option<Value>,
    pub cart_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Schedule {
    pub interval: Option<String>,
    pub interval_count: Option<u32>,
    pub trial_period_in_days: Option<u32>,
    pub starts_on: Option<DateTime<Utc>>,
}

impl Schema for Subscription {
    const FIELDS: &'static [&'static str] = &[
        "id", "user", "initialOrderToken", "firstInvoiceReceivedOn", "schedule", "itemId",
        "name", "creationDate", "modificationDate", "cancelledOn", "pausedOn", "resumedOn",
        "amount", "quantity", "userDefinedId", "totalSpent", "status", "gatewayId",
        "metadata", "cartId",
    ];

    fn prepare(map: &mut Map<String, Value>) {
        strip_field::<Customer>(map, "user");
        strip_field::<Schedule>(map, "schedule");
    }
}

impl Schema for Schedule {
    const FIELDS: &'static [&'static str] = &["interval", "intervalCount", "trialPeriodInDays", "startsOn"];
}
