//! ShipStation order models and their construction from Snipcart orders

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::aggregates::{Address, Item, Order, ShippingRate};
use crate::domain::sanitizer::{strip_each, strip_field, Schema};
use crate::domain::value_objects::Weight;

/// Order id ShipStation "returns" when orders are created in test mode.
pub const TEST_ORDER_ID: i64 = 99_999_999;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ShipStationOrder {
    pub order_id: Option<i64>,
    pub order_number: String,
    pub order_key: Option<String>,
    pub order_date: Option<NaiveDateTime>,
    pub order_status: String,
    pub customer_email: Option<String>,
    pub bill_to: ShipStationAddress,
    pub ship_to: ShipStationAddress,
    pub items: Vec<ShipStationOrderItem>,
    pub amount_paid: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub shipping_amount: Option<Decimal>,
    pub customer_notes: Option<String>,
    pub requested_shipping_service: Option<String>,
    pub weight: Option<Weight>,
    pub advanced_options: Option<AdvancedOptions>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ShipStationAddress {
    pub name: Option<String>,
    pub company: Option<String>,
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub street3: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub residential: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct AdvancedOptions {
    pub store_id: Option<i64>,
    pub source: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ShipStationOrderItem {
    pub order_item_id: Option<i64>,
    pub line_item_key: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub shipping_amount: Option<Decimal>,
    pub warehouse_location: Option<String>,
    pub product_id: Option<i64>,
    pub fulfillment_sku: Option<String>,
    pub adjustment: Option<bool>,
    pub upc: Option<String>,
    pub create_date: Option<String>,
    pub modify_date: Option<String>,
    pub weight: Option<Weight>,
    pub options: Vec<ItemOption>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemOption {
    pub name: String,
    pub value: String,
}

/// Rate quote returned by `shipments/getrates`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ShipStationRate {
    pub service_name: String,
    pub service_code: String,
    pub shipment_cost: Decimal,
    pub other_cost: Decimal,
}

/// Outcome of submitting an order to ShipStation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: Option<i64>,
    pub errors: Vec<String>,
}

impl Schema for ShipStationOrder {
    const FIELDS: &'static [&'static str] = &[
        "orderId", "orderNumber", "orderKey", "orderDate", "orderStatus", "customerEmail",
        "billTo", "shipTo", "items", "amountPaid", "taxAmount", "shippingAmount",
        "customerNotes", "requestedShippingService", "weight", "advancedOptions",
    ];

    fn prepare(map: &mut Map<String, Value>) {
        strip_field::<ShipStationAddress>(map, "billTo");
        strip_field::<ShipStationAddress>(map, "shipTo");
        strip_field::<AdvancedOptions>(map, "advancedOptions");
        strip_each::<ShipStationOrderItem>(map, "items");
    }
}

impl Schema for ShipStationAddress {
    const FIELDS: &'static [&'static str] = &[
        "name", "company", "street1", "street2", "street3", "city", "state", "postalCode",
        "country", "phone", "residential",
    ];
}

impl Schema for AdvancedOptions {
    const FIELDS: &'static [&'static str] = &["storeId", "source"];
}

impl Schema for ShipStationOrderItem {
    const FIELDS: &'static [&'static str] = &[
        "orderItemId", "lineItemKey", "sku", "name", "imageUrl", "quantity", "unitPrice",
        "taxAmount", "shippingAmount", "warehouseLocation", "productId", "fulfillmentSku",
        "adjustment", "upc", "createDate", "modifyDate",
    ];
    const VIRTUAL_FIELDS: &'static [&'static str] = &["weight", "options"];

    fn prepare(map: &mut Map<String, Value>) {
        // bare numbers are grams
        if let Some(grams) = map.get("weight").and_then(Value::as_f64) {
            map.insert("weight".to_string(), json!({"value": grams, "units": "grams"}));
        }
        strip_each::<ItemOption>(map, "options");
    }
}

impl Schema for ItemOption {
    const FIELDS: &'static [&'static str] = &["name", "value"];
}

impl Schema for ShipStationRate {
    const FIELDS: &'static [&'static str] = &["serviceName", "serviceCode", "shipmentCost", "otherCost"];
}

impl ShipStationOrder {
    /// Builds the order ShipStation should fulfil for a Snipcart order.
    /// Only shippable items are included.
    pub fn from_snipcart(order: &Order, store_id: Option<i64>) -> Self {
        let bill_to = order.billing_address.as_ref().map(ShipStationAddress::from).unwrap_or_default();
        let ship_to = order.ship_to_address().map(ShipStationAddress::from).unwrap_or_else(|| bill_to.clone());

        Self {
            order_id: None,
            order_number: order.invoice_number().to_string(),
            order_key: order.token.clone(),
            order_date: order.creation_date.map(|d| d.naive_utc()),
            order_status: "awaiting_shipment".to_string(),
            customer_email: order.email.clone(),
            bill_to,
            ship_to,
            items: order.shippable_items().map(ShipStationOrderItem::from_snipcart_item).collect(),
            amount_paid: order.final_grand_total.or(order.grand_total),
            tax_amount: order.taxes_total,
            shipping_amount: order.shipping_fees,
            customer_notes: order.notes.clone(),
            requested_shipping_service: order.shipping_method.clone(),
            weight: Some(Weight::grams(order.shippable_weight())),
            advanced_options: store_id.map(|id| AdvancedOptions { store_id: Some(id), source: Some("Snipcart".to_string()) }),
        }
    }
}

impl From<&Address> for ShipStationAddress {
    fn from(address: &Address) -> Self {
        Self {
            name: address.display_name().map(str::to_string),
            company: address.company.clone(),
            street1: address.address1.clone(),
            street2: address.address2.clone(),
            street3: None,
            city: address.city.clone(),
            state: address.province.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone: address.phone.clone(),
            residential: None,
        }
    }
}

impl ShipStationOrderItem {
    pub fn from_snipcart_item(item: &Item) -> Self {
        Self {
            line_item_key: item.id.clone(),
            sku: item.sku().map(str::to_string),
            name: item.name.clone().unwrap_or_default(),
            image_url: item.image.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.or(item.price),
            weight: Some(Weight::grams(item.weight.unwrap_or(0.0))),
            options: item
                .custom_fields
                .iter()
                .filter_map(|field| Some(ItemOption { name: field.name.clone()?, value: field.value_text().unwrap_or_default() }))
                .collect(),
            ..Self::default()
        }
    }
}

impl From<ShipStationRate> for ShippingRate {
    fn from(rate: ShipStationRate) -> Self {
        Self {
            cost: rate.shipment_cost + rate.other_cost,
            description: rate.service_name,
            guaranteed_days_to_delivery: None,
            user_defined_id: Some(rate.service_code),
        }
    }
}

impl CreatedOrder {
    pub fn succeeded(&self) -> bool { self.order_id.is_some() && self.errors.is_empty() }
    pub fn is_test(&self) -> bool { self.succeeded() && self.order_id == Some(TEST_ORDER_ID) }
}
