//! Postal address shared by orders, customers and subscriptions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::sanitizer::{strip_unknown, Schema};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Address {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub vat_number: Option<String>,
}

impl Schema for Address {
    const FIELDS: &'static [&'static str] = &[
        "fullName", "firstName", "name", "company", "address1", "address2", "city",
        "province", "postalCode", "country", "phone", "vatNumber",
    ];
}

impl Address {
    pub fn display_name(&self) -> Option<&str> {
        self.full_name.as_deref().or(self.name.as_deref()).or(self.first_name.as_deref())
    }
}

/// Flat address keys Snipcart sends next to the nested address objects.
pub const FLAT_ADDRESS_FIELDS: &[&str] = &[
    "billingAddressName", "billingAddressFirstName", "billingAddressCompanyName",
    "billingAddressAddress1", "billingAddressAddress2", "billingAddressCity",
    "billingAddressProvince", "billingAddressPostalCode", "billingAddressCountry",
    "billingAddressPhone",
    "shippingAddressName", "shippingAddressFirstName", "shippingAddressCompanyName",
    "shippingAddressAddress1", "shippingAddressAddress2", "shippingAddressCity",
    "shippingAddressProvince", "shippingAddressPostalCode", "shippingAddressCountry",
    "shippingAddressPhone",
];

// (flat suffix, nested key)
const FLAT_TO_NESTED: &[(&str, &str)] = &[
    ("Name", "name"), ("FirstName", "firstName"), ("CompanyName", "company"),
    ("Address1", "address1"), ("Address2", "address2"), ("City", "city"),
    ("Province", "province"), ("PostalCode", "postalCode"), ("Country", "country"),
    ("Phone", "phone"),
];

/// Moves `{prefix}AddressXxx` keys into the nested `{prefix}Address` object.
///
/// The nested object wins when both are present; the flat keys are always
/// removed. The nested object is sanitized afterwards.
pub fn fold_flat_address(map: &mut Map<String, Value>, prefix: &str) {
    let nested_key = format!("{prefix}Address");
    let mut folded = Map::new();
    for (suffix, target) in FLAT_TO_NESTED {
        if let Some(value) = map.remove(&format!("{prefix}Address{suffix}")) {
            if !value.is_null() {
                folded.insert((*target).to_string(), value);
            }
        }
    }

    if !map.contains_key(&nested_key) && !folded.is_empty() {
        if let Some(name) = folded.get("name").cloned() {
            folded.entry("fullName").or_insert(name);
        }
        map.insert(nested_key.clone(), Value::Object(folded));
    }

    if let Some(value) = map.get_mut(&nested_key) {
        strip_unknown::<Address>(value);
    }
}
