//! Shipping rates returned to Snipcart and the package they are quoted for

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Order;
use crate::domain::value_objects::Weight;

/// Box dimensions (cm) and packing weight (g) used when quoting rates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackageDefaults {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub packing_weight: f64,
}

impl Default for PackageDefaults {
    fn default() -> Self {
        Self { length: 10.0, width: 10.0, height: 10.0, packing_weight: 0.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: Weight,
}

impl Package {
    /// Package holding the order's shippable items, or `None` when nothing ships.
    pub fn for_order(order: &Order, defaults: &PackageDefaults) -> Option<Self> {
        if !order.has_shippable_items() {
            return None;
        }
        Some(Self {
            name: "default".to_string(),
            length: defaults.length,
            width: defaults.width,
            height: defaults.height,
            weight: Weight::grams(order.shippable_weight() + defaults.packing_weight),
        })
    }
}

/// A rate in the shape Snipcart's `shippingrates.fetch` response expects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub cost: Decimal,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guaranteed_days_to_delivery: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_defined_id: Option<String>,
}
