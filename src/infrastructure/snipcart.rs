//! Snipcart REST API client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SnipcartSettings;
use crate::domain::aggregates::Order;
use crate::domain::ports::{CheckoutProvider, OrderQuery};
use crate::domain::sanitizer::safe_populate;
use crate::Result;

#[derive(Debug, Deserialize)]
struct OrdersPage {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Clone)]
struct CachedOrders {
    fetched_at: Instant,
    orders: Vec<Order>,
}

/// Request tokens are GUIDs; anything else never reaches the URL path.
fn is_token_shaped(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Snipcart API client with a small in-process cache for order listings.
pub struct SnipcartClient {
    http: Client,
    base_url: String,
    secret_key: String,
    cache_ttl: Duration,
    cache: DashMap<(u32, u32), CachedOrders>,
}

impl std::fmt::Debug for SnipcartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnipcartClient")
            .field("base_url", &self.base_url)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl SnipcartClient {
    pub fn new(settings: &SnipcartSettings) -> Self {
        Self {
            http: Client::new(),
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone(),
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            cache: DashMap::new(),
        }
    }

    fn cached(&self, key: (u32, u32)) -> Option<Vec<Order>> {
        let entry = self.cache.get(&key)?;
        (entry.fetched_at.elapsed() < self.cache_ttl).then(|| entry.orders.clone())
    }

    async fn fetch_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let page: OrdersPage = self
            .http
            .get(format!("{}/orders", self.base_url))
            .basic_auth(&self.secret_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("limit", query.limit), ("offset", query.offset)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut orders = Vec::with_capacity(page.items.len());
        for item in page.items {
            match safe_populate::<Order>(item) {
                Ok(order) => orders.push(order),
                Err(e) => warn!("Skipping Snipcart order that could not be read: {}", e),
            }
        }
        Ok(orders)
    }
}

#[async_trait]
impl CheckoutProvider for SnipcartClient {
    async fn get_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let key = (query.limit, query.offset);
        if query.cache {
            if let Some(orders) = self.cached(key) {
                debug!(limit = query.limit, offset = query.offset, "serving Snipcart orders from cache");
                return Ok(orders);
            }
        }

        let orders = self.fetch_orders(query).await?;
        self.cache.insert(key, CachedOrders { fetched_at: Instant::now(), orders: orders.clone() });
        Ok(orders)
    }

    async fn validate_request_token(&self, token: &str) -> Result<bool> {
        if !is_token_shaped(token) {
            warn!("Rejecting malformed Snipcart request token");
            return Ok(false);
        }

        let response = self
            .http
            .get(format!("{}/requestvalidation/{}", self.base_url, token))
            .basic_auth(&self.secret_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            status => {
                warn!("Unexpected Snipcart request validation status {}", status);
                Ok(false)
            }
        }
    }
}
