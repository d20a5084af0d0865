//! Order Aggregate
//!
//! Mirrors Snipcart's order JSON. Orders are received, never mutated, and
//! only re-submitted downstream.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::aggregates::address::{fold_flat_address, Address, FLAT_ADDRESS_FIELDS};
use crate::domain::sanitizer::{strip_each, Schema};
use crate::domain::value_objects::InvoiceNumber;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Order {
    #[serde(default)] pub token: Option<String>,
    pub invoice_number: InvoiceNumber,
    #[serde(default)] pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)] pub modification_date: Option<DateTime<Utc>>,
    #[serde(default)] pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)] pub status: Option<OrderStatus>,
    #[serde(default)] pub payment_status: Option<PaymentStatus>,
    #[serde(default)] pub payment_method: Option<String>,
    #[serde(default)] pub email: Option<String>,
    #[serde(default)] pub currency: Option<String>,
    #[serde(default)] pub billing_address: Option<Address>,
    #[serde(default)] pub shipping_address: Option<Address>,
    #[serde(default)] pub shipping_address_same_as_billing: Option<bool>,
    #[serde(default)] pub credit_card_last4_digits: Option<String>,
    #[serde(default)] pub shipping_method: Option<String>,
    #[serde(default)] pub shipping_fees: Option<Decimal>,
    #[serde(default)] pub taxable_total: Option<Decimal>,
    #[serde(default)] pub taxes_total: Option<Decimal>,
    #[serde(default)] pub items_total: Option<Decimal>,
    #[serde(default)] pub total_weight: Option<f64>,
    #[serde(default)] pub grand_total: Option<Decimal>,
    #[serde(default)] pub final_grand_total: Option<Decimal>,
    #[serde(default)] pub ip_address: Option<String>,
    #[serde(default)] pub user_agent: Option<String>,
    #[serde(default)] pub notes: Option<String>,
    #[serde(default)] pub items: Vec<Item>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Item {
    pub token: Option<String>,
    pub id: Option<String>,
    pub unique_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub quantity: u32,
    pub weight: Option<f64>,
    pub total_weight: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub shippable: bool,
    pub taxable: bool,
    pub custom_fields: Vec<CustomField>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomField {
    pub name: Option<String>,
    pub display_value: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub operation: Option<Value>,
    pub options: Option<String>,
    pub options_array: Vec<String>,
    pub required: Option<bool>,
    pub value: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    InProgress,
    Processed,
    Disputed,
    Shipped,
    Delivered,
    Pending,
    Cancelled,
    Dispatched,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Deferred,
    PaidDeferred,
    ChargedBack,
    Refunded,
    Paidmanually,
    Authorized,
    Cancelled,
    #[serde(other)]
    Other,
}

impl Schema for Order {
    const FIELDS: &'static [&'static str] = &[
        "token", "invoiceNumber", "creationDate", "modificationDate", "completionDate",
        "status", "paymentStatus", "paymentMethod", "email", "currency", "billingAddress",
        "shippingAddress", "shippingAddressSameAsBilling", "creditCardLast4Digits",
        "shippingMethod", "shippingFees", "taxableTotal", "taxesTotal", "itemsTotal",
        "totalWeight", "grandTotal", "finalGrandTotal", "ipAddress", "userAgent", "notes",
        "items",
    ];
    const VIRTUAL_FIELDS: &'static [&'static str] = FLAT_ADDRESS_FIELDS;

    fn prepare(map: &mut Map<String, Value>) {
        fold_flat_address(map, "billing");
        fold_flat_address(map, "shipping");
        strip_each::<Item>(map, "items");
    }
}

impl Schema for Item {
    const FIELDS: &'static [&'static str] = &[
        "token", "id", "uniqueId", "name", "description", "url", "image", "price",
        "unitPrice", "totalPrice", "quantity", "weight", "totalWeight", "width", "height",
        "length", "shippable", "taxable", "customFields",
    ];

    fn prepare(map: &mut Map<String, Value>) {
        strip_each::<CustomField>(map, "customFields");
    }
}

impl Schema for CustomField {
    const FIELDS: &'static [&'static str] = &[
        "name", "displayValue", "type", "operation", "options", "optionsArray", "required",
        "value",
    ];
}

impl Order {
    pub fn invoice_number(&self) -> &InvoiceNumber { &self.invoice_number }
    pub fn items(&self) -> &[Item] { &self.items }
    pub fn shippable_items(&self) -> impl Iterator<Item = &Item> { self.items.iter().filter(|i| i.shippable) }
    pub fn has_shippable_items(&self) -> bool { self.shippable_items().next().is_some() }

    /// Weight in grams of everything that ships.
    pub fn shippable_weight(&self) -> f64 { self.shippable_items().map(Item::line_weight).sum() }

    /// Where the order ships: the shipping address unless it is marked the
    /// same as billing or carries no street or postal code.
    pub fn ship_to_address(&self) -> Option<&Address> {
        if self.shipping_address_same_as_billing == Some(true) {
            return self.billing_address.as_ref().or(self.shipping_address.as_ref());
        }
        self.shipping_address
            .as_ref()
            .filter(|a| a.address1.is_some() || a.postal_code.is_some())
            .or(self.billing_address.as_ref())
    }

    /// True when the order was created within the last `minutes` before `now`.
    /// Orders without a creation date never are.
    pub fn created_within(&self, minutes: i64, now: DateTime<Utc>) -> bool {
        self.creation_date.is_some_and(|created| created >= now - Duration::minutes(minutes))
    }
}

impl Item {
    pub fn sku(&self) -> Option<&str> { self.id.as_deref() }
    pub fn line_weight(&self) -> f64 {
        self.total_weight.unwrap_or_else(|| self.weight.unwrap_or(0.0) * f64::from(self.quantity))
    }
    pub fn line_total(&self) -> Decimal {
        self.total_price.unwrap_or_else(|| self.unit_price.or(self.price).unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity))
    }
}

impl CustomField {
    /// Value as text, whatever JSON type Snipcart used for it.
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
