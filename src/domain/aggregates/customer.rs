//! Customer Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::aggregates::address::{fold_flat_address, Address, FLAT_ADDRESS_FIELDS};
use crate::domain::sanitizer::Schema;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Customer {
    pub id: Option<String>,
    pub email: Option<String>,
    pub mode: Option<String>,
    pub status: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub session_token: Option<String>,
    pub gravatar_url: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
}

impl Schema for Customer {
    const FIELDS: &'static [&'static str] = &[
        "id", "email", "mode", "status", "creationDate", "sessionToken", "gravatarUrl",
        "billingAddress", "shippingAddress",
    ];
    const VIRTUAL_FIELDS: &'static [&'static str] = FLAT_ADDRESS_FIELDS;

    fn prepare(map: &mut Map<String, Value>) {
        fold_flat_address(map, "billing");
        fold_flat_address(map, "shipping");
    }
}
