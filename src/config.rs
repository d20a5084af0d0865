//! Settings loaded from the environment (and `.env`).

use serde::{Deserialize, Serialize};
use std::env;
use validator::Validate;

use crate::domain::aggregates::shipping::PackageDefaults;
use crate::{RelayError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    pub port: u16,
    pub site_id: i64,
    pub database_url: Option<String>,
    #[validate]
    pub snipcart: SnipcartSettings,
    #[validate]
    pub shipstation: ShipStationSettings,
    #[validate]
    pub email: EmailSettings,
    pub validate_webhooks: bool,
    pub log_webhook_requests: bool,
    #[validate(custom = "validate_recipients")]
    pub notification_emails: Vec<String>,
    /// Minutes after creation during which a missing order is re-fed.
    #[validate(range(min = 1, max = 10080))]
    pub refeed_attempt_window: i64,
    #[validate(range(min = 1, max = 50))]
    pub recovery_order_limit: u32,
    pub package: PackageDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SnipcartSettings {
    pub secret_key: String,
    #[validate(url)]
    pub api_url: String,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShipStationSettings {
    pub api_key: String,
    pub api_secret: String,
    #[validate(url)]
    pub api_url: String,
    pub store_id: Option<i64>,
    pub carrier_code: Option<String>,
    pub ship_from_zip: String,
    pub test_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    #[serde(skip_serializing)]
    pub smtp_password: String,
    #[validate(email)]
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Settings {
            port: parsed("PORT", 8083),
            site_id: parsed("SITE_ID", 1),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            snipcart: SnipcartSettings {
                secret_key: env::var("SNIPCART_SECRET_KEY").unwrap_or_default(),
                api_url: env::var("SNIPCART_API_URL").unwrap_or_else(|_| "https://app.snipcart.com/api".to_string()),
                cache_ttl_secs: parsed("SNIPCART_CACHE_TTL_SECS", 300),
            },
            shipstation: ShipStationSettings {
                api_key: env::var("SHIPSTATION_API_KEY").unwrap_or_default(),
                api_secret: env::var("SHIPSTATION_API_SECRET").unwrap_or_default(),
                api_url: env::var("SHIPSTATION_API_URL").unwrap_or_else(|_| "https://ssapi.shipstation.com".to_string()),
                store_id: env::var("SHIPSTATION_STORE_ID").ok().and_then(|v| v.parse().ok()),
                carrier_code: env::var("SHIPSTATION_CARRIER_CODE").ok().filter(|v| !v.is_empty()),
                ship_from_zip: env::var("SHIPSTATION_SHIP_FROM_ZIP").unwrap_or_default(),
                test_mode: parsed("SHIPSTATION_TEST_MODE", false),
            },
            email: EmailSettings {
                smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                smtp_port: parsed("SMTP_PORT", 587),
                smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
                smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| "noreply@localhost.localdomain".to_string()),
                from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Snipcart Relay".to_string()),
                enabled: parsed("SMTP_ENABLED", false),
            },
            validate_webhooks: parsed("VALIDATE_WEBHOOKS", true),
            log_webhook_requests: parsed("LOG_WEBHOOK_REQUESTS", true),
            notification_emails: split_list(&env::var("NOTIFICATION_EMAILS").unwrap_or_default()),
            refeed_attempt_window: parsed("REFEED_ATTEMPT_WINDOW", 15),
            recovery_order_limit: parsed("RECOVERY_ORDER_LIMIT", 3),
            package: PackageDefaults {
                length: parsed("PACKAGE_LENGTH", 10.0),
                width: parsed("PACKAGE_WIDTH", 10.0),
                height: parsed("PACKAGE_HEIGHT", 10.0),
                packing_weight: parsed("PACKAGE_PACKING_WEIGHT", 0.0),
            },
        };

        settings.validate().map_err(|e| RelayError::Config(e.to_string()))?;
        Ok(settings)
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn validate_recipients(recipients: &Vec<String>) -> std::result::Result<(), validator::ValidationError> {
    if recipients.iter().all(|r| validator::validate_email(r.as_str())) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("email"))
    }
}
