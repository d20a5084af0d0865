//! Refund issued against an order

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sanitizer::Schema;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Refund {
    pub id: Option<String>,
    pub order_token: Option<String>,
    pub amount: Option<Decimal>,
    pub comment: Option<String>,
    pub notified_customer_by_email: Option<bool>,
    pub currency: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
}

impl Schema for Refund {
    const FIELDS: &'static [&'static str] = &[
        "id", "orderToken", "amount", "comment", "notifiedCustomerByEmail", "currency",
        "creationDate", "modificationDate",
    ];
}
