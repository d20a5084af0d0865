//! ShipStation REST API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ShipStationSettings;
use crate::domain::aggregates::{
    CreatedOrder, Order, Package, ShipStationOrder, ShipStationRate, ShippingRate, TEST_ORDER_ID,
};
use crate::domain::sanitizer::safe_populate;
use crate::domain::ports::FulfillmentProvider;
use crate::domain::value_objects::Weight;
use crate::Result;

#[derive(Debug, Deserialize)]
struct OrderList {
    #[serde(default)]
    orders: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedReply {
    #[serde(default, deserialize_with = "lenient_id")]
    order_id: Option<i64>,
}

fn lenient_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_i64())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateRequest<'a> {
    carrier_code: &'a str,
    from_postal_code: &'a str,
    to_country: Option<&'a str>,
    to_state: Option<&'a str>,
    to_postal_code: Option<&'a str>,
    to_city: Option<&'a str>,
    weight: Weight,
    dimensions: Dimensions,
    confirmation: &'a str,
    residential: bool,
}

#[derive(Debug, Serialize)]
struct Dimensions {
    units: &'static str,
    length: f64,
    width: f64,
    height: f64,
}

pub struct ShipStationClient {
    http: Client,
    settings: ShipStationSettings,
}

impl std::fmt::Debug for ShipStationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipStationClient")
            .field("api_url", &self.settings.api_url)
            .field("test_mode", &self.settings.test_mode)
            .finish()
    }
}

impl ShipStationClient {
    pub fn new(settings: &ShipStationSettings) -> Self {
        Self { http: Client::new(), settings: settings.clone() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path)).basic_auth(&self.settings.api_key, Some(&self.settings.api_secret))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path)).basic_auth(&self.settings.api_key, Some(&self.settings.api_secret))
    }
}

#[async_trait]
impl FulfillmentProvider for ShipStationClient {
    async fn get_order_by_invoice(&self, invoice_number: &str) -> Result<Option<ShipStationOrder>> {
        let list: OrderList = self
            .get("orders")
            .query(&[("orderNumber", invoice_number)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // orderNumber is a prefix search upstream, so match exactly here
        for raw in list.orders {
            let order: ShipStationOrder = match safe_populate(raw) {
                Ok(order) => order,
                Err(e) => {
                    warn!("Skipping ShipStation order that could not be read: {}", e);
                    continue;
                }
            };
            if order.order_number == invoice_number {
                return Ok(Some(order));
            }
        }
        Ok(None)
    }

    async fn create_order(&self, order: &Order) -> Result<CreatedOrder> {
        let payload = ShipStationOrder::from_snipcart(order, self.settings.store_id);

        if self.settings.test_mode {
            info!("ShipStation test mode: not sending order {}", payload.order_number);
            return Ok(CreatedOrder { order_id: Some(TEST_ORDER_ID), errors: vec![] });
        }

        let response = self.post("orders/createorder").json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("ShipStation rejected order {}: {} {}", payload.order_number, status, body);
            return Ok(CreatedOrder { order_id: None, errors: vec![format!("{status}: {body}")] });
        }

        // the order exists upstream now; only its id matters
        let reply: CreatedReply = match response.json().await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("ShipStation accepted order {} but its reply could not be read: {}", payload.order_number, e);
                CreatedReply::default()
            }
        };
        Ok(CreatedOrder { order_id: reply.order_id, errors: vec![] })
    }

    async fn get_rates(&self, order: &Order, package: &Package) -> Result<Vec<ShippingRate>> {
        let Some(carrier_code) = self.settings.carrier_code.as_deref() else {
            warn!("No ShipStation carrier configured; returning no rates");
            return Ok(vec![]);
        };

        let to = order.ship_to_address();
        let request = RateRequest {
            carrier_code,
            from_postal_code: &self.settings.ship_from_zip,
            to_country: to.and_then(|a| a.country.as_deref()),
            to_state: to.and_then(|a| a.province.as_deref()),
            to_postal_code: to.and_then(|a| a.postal_code.as_deref()),
            to_city: to.and_then(|a| a.city.as_deref()),
            weight: package.weight,
            dimensions: Dimensions {
                units: "centimeters",
                length: package.length,
                width: package.width,
                height: package.height,
            },
            confirmation: "none",
            residential: false,
        };

        let raw: Vec<Value> = self
            .post("shipments/getrates")
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut rates = Vec::with_capacity(raw.len());
        for rate in raw {
            match safe_populate::<ShipStationRate>(rate) {
                Ok(rate) => rates.push(ShippingRate::from(rate)),
                Err(e) => warn!("Skipping ShipStation rate that could not be read: {}", e),
            }
        }
        Ok(rates)
    }
}
