//! Notification attached to an order (comment, tracking info, invoice...)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::sanitizer::Schema;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Notification {
    pub id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub notification_type: Option<String>,
    pub delivery_type: Option<String>,
    pub sent_by_email: Option<bool>,
    pub sent_by_email_on: Option<DateTime<Utc>>,
    pub order_token: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub message: Option<String>,
    pub resource_url: Option<String>,
}

impl Schema for Notification {
    const FIELDS: &'static [&'static str] = &[
        "id", "creationDate", "notificationType", "deliveryType", "sentByEmail",
        "sentByEmailOn", "orderToken", "subject", "body", "message", "resourceUrl",
    ];
}
