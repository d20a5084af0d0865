//! Webhook audit log stores

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::ports::{WebhookLog, WebhookLogStore};
use crate::{RelayError, Result};

/// Writes to the `snipcart_webhook_log` table.
#[derive(Clone, Debug)]
pub struct PgWebhookLogStore {
    db: PgPool,
}

impl PgWebhookLogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WebhookLogStore for PgWebhookLogStore {
    async fn record(&self, log: &WebhookLog) -> Result<()> {
        sqlx::query("INSERT INTO snipcart_webhook_log (id, site_id, event_name, mode, body, date_created) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(log.id)
            .bind(log.site_id)
            .bind(&log.event_name)
            .bind(&log.mode)
            .bind(&log.body)
            .bind(log.date_created)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Most recent entries kept by [`InMemoryWebhookLogStore::new`].
pub const DEFAULT_IN_MEMORY_CAPACITY: usize = 1_000;

/// Keeps the latest entries in memory; used when no database is configured.
/// The oldest entry is dropped once `capacity` is reached.
#[derive(Debug)]
pub struct InMemoryWebhookLogStore {
    capacity: usize,
    entries: Mutex<VecDeque<WebhookLog>>,
}

impl Default for InMemoryWebhookLogStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_IN_MEMORY_CAPACITY)
    }
}

impl InMemoryWebhookLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> Vec<WebhookLog> {
        self.entries.lock().map(|entries| entries.iter().cloned().collect()).unwrap_or_default()
    }
}

#[async_trait]
impl WebhookLogStore for InMemoryWebhookLogStore {
    async fn record(&self, log: &WebhookLog) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| RelayError::AuditLog(e.to_string()))?;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(log.clone());
        Ok(())
    }
}
