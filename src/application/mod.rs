//! Use cases built on the domain ports

pub mod recovery;
pub mod webhooks;

pub use recovery::{NotificationStatus, OrderCheck, OrderRecovery, RecoveryReport, RefeedOutcome};
pub use webhooks::{DispatcherSettings, WebhookDispatcher};
