//! Adapters for the domain ports

pub mod email;
pub mod shipstation;
pub mod snipcart;
pub mod webhook_log;

pub use email::SmtpNotifier;
pub use shipstation::ShipStationClient;
pub use snipcart::SnipcartClient;
pub use webhook_log::{InMemoryWebhookLogStore, PgWebhookLogStore};
