//! Snipcart Relay - webhook receiver and order recovery for Snipcart + ShipStation

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snipcart_relay::application::{
    DispatcherSettings, NotificationStatus, OrderRecovery, RecoveryReport, RefeedOutcome, WebhookDispatcher,
};
use snipcart_relay::config::Settings;
use snipcart_relay::domain::ports::{CheckoutProviderRef, FulfillmentProviderRef, NotifierRef, WebhookLogStoreRef};
use snipcart_relay::http::{app, AppState};
use snipcart_relay::infrastructure::{
    InMemoryWebhookLogStore, PgWebhookLogStore, ShipStationClient, SmtpNotifier, SnipcartClient,
};

const RULE: &str = "-------------------------------------";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Serve the webhook endpoint
    Serve,
    /// Check that recent Snipcart orders exist in ShipStation
    CheckOrders {
        /// Re-send missing orders regardless of their age
        #[arg(long = "force-feed", visible_alias = "forceFeed")]
        force_feed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let checkout: CheckoutProviderRef = Arc::new(SnipcartClient::new(&settings.snipcart));
    let fulfillment: FulfillmentProviderRef = Arc::new(ShipStationClient::new(&settings.shipstation));

    match cli.command {
        Command::Serve => serve(settings, checkout, fulfillment).await,
        Command::CheckOrders { force_feed } => check_orders(settings, checkout, fulfillment, force_feed).await,
    }
}

async fn serve(settings: Settings, checkout: CheckoutProviderRef, fulfillment: FulfillmentProviderRef) -> Result<()> {
    let log_store: WebhookLogStoreRef = match &settings.database_url {
        Some(url) => Arc::new(PgWebhookLogStore::new(PgPoolOptions::new().max_connections(10).connect(url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set; webhook audit log kept in memory");
            Arc::new(InMemoryWebhookLogStore::new())
        }
    };

    let dispatcher = WebhookDispatcher::new(
        checkout,
        fulfillment,
        log_store,
        DispatcherSettings {
            site_id: settings.site_id,
            validate_requests: settings.validate_webhooks,
            log_requests: settings.log_webhook_requests,
            package: settings.package.clone(),
        },
    );
    let app = app(AppState { dispatcher: Arc::new(dispatcher) });

    tracing::info!("🚀 Snipcart Relay listening on 0.0.0.0:{}", settings.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?, app).await?;
    Ok(())
}

async fn check_orders(
    settings: Settings,
    checkout: CheckoutProviderRef,
    fulfillment: FulfillmentProviderRef,
    force_feed: bool,
) -> Result<()> {
    let notifier: NotifierRef = Arc::new(SmtpNotifier::new(&settings.email));
    let recovery = OrderRecovery::new(
        checkout,
        fulfillment,
        notifier,
        settings.notification_emails.clone(),
        settings.refeed_attempt_window,
        settings.recovery_order_limit,
    );

    println!("{RULE}");
    println!("Checking last {} orders...", settings.recovery_order_limit);
    println!("{RULE}");

    let report = recovery.run(force_feed).await?;
    print_report(&report);

    if let NotificationStatus::Failed(_) = report.notification {
        eprintln!("Notifications failed.");
    }
    Ok(())
}

fn print_report(report: &RecoveryReport) {
    for check in &report.checks {
        let mark = if check.found { "✓" } else { "✗" };
        println!("Snipcart {} … ShipStation [{}]", check.invoice_number, mark);
    }

    for (invoice, outcome) in &report.refeeds {
        println!("{RULE}");
        let status = match outcome {
            RefeedOutcome::Succeeded => "✓".to_string(),
            RefeedOutcome::Test => "✓ (test)".to_string(),
            RefeedOutcome::Failed(errors) => format!("✗ {}", errors.join(", ")),
        };
        println!("Re-sending order {} to ShipStation … {}", invoice, status);
    }

    for invoice in &report.skipped {
        println!("Order {} is too old to re-send automatically", invoice);
    }

    println!("{RULE}");
    println!("Finished in {:.3} seconds.", report.elapsed.as_secs_f64());
    println!();
}
