#![recursion_limit = "256"]

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::{dispatcher_settings, generate_order, harness, webhook, BrokenLogStore, FakeCheckout, FakeFulfillment};
use snipcart_relay::application::WebhookDispatcher;
use snipcart_relay::domain::events::WebhookEventName;
use snipcart_relay::http::{app, AppState};

fn router(dispatcher: Arc<WebhookDispatcher>) -> Router {
    app(AppState { dispatcher })
}

async fn post(app: Router, body: Value, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhooks/snipcart")
        .header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("X-Snipcart-RequestToken", token);
    }
    let response = app.oneshot(request.body(Body::from(body.to_string())).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn rejection(reason: &str) -> Value {
    json!({"success": false, "errors": {"reason": reason}})
}

#[tokio::test]
async fn test_health() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let response = router(h.dispatcher)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "healthy", "service": "snipcart-relay"}));
}

#[tokio::test]
async fn test_invalid_event() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let (status, body) = post(router(h.dispatcher), webhook("foo", "Test", generate_order("SNIP-1", Utc::now())), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, rejection("Invalid event."));
    assert!(h.log_store.entries().is_empty());
}

#[tokio::test]
async fn test_unreadable_body_is_an_invalid_event() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let response = router(h.dispatcher)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/snipcart")
                .body(Body::from("eventName=order.completed"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), rejection("Invalid event."));
}

#[tokio::test]
async fn test_modes() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let order = generate_order("SNIP-1", Utc::now());

    for mode in ["Test", "Live"] {
        let (status, _) = post(router(h.dispatcher.clone()), webhook("order.completed", mode, order.clone()), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post(router(h.dispatcher.clone()), webhook("order.completed", "Special", order.clone()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, rejection("Invalid mode."));

    for mode in ["test", ""] {
        let (status, body) = post(router(h.dispatcher.clone()), webhook("order.completed", mode, order.clone()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, rejection("Invalid mode."));
    }
}

#[tokio::test]
async fn test_missing_mode() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let payload = json!({
        "eventName": "order.completed",
        "createdOn": Utc::now().to_rfc3339(),
        "content": generate_order("SNIP-1", Utc::now())
    });
    let (status, body) = post(router(h.dispatcher), payload, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, rejection("Request missing mode."));
}

#[tokio::test]
async fn test_empty_content() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    for content in [json!(null), json!(""), json!("0"), json!([]), json!({}), json!(false), json!(0)] {
        let (status, body) = post(router(h.dispatcher.clone()), webhook("order.completed", "Test", content), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, rejection("Request missing content."));
    }

    let payload = json!({"eventName": "order.completed", "mode": "Test"});
    let (status, body) = post(router(h.dispatcher), payload, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, rejection("Request missing content."));
}

#[tokio::test]
async fn test_content_that_cannot_populate_an_order() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let (status, body) = post(router(h.dispatcher), webhook("order.completed", "Test", json!({"email": "x@y.z"})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, rejection("Invalid content."));
}

#[tokio::test]
async fn test_unknown_keys_are_ignored() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let mut order = generate_order("SNIP-1", Utc::now());
    order["newSnipcartField"] = json!({"anything": true});
    order["items"][0]["futureItemField"] = json!(42);
    order["items"][0]["customFields"][0]["futureCustomField"] = json!("x");
    order["billingAddress"]["geo"] = json!({"lat": 1.0});

    let (status, body) = post(router(h.dispatcher), webhook("order.completed", "Test", order), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn test_order_completed_forwards_shippable_orders() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let (status, body) = post(
        router(h.dispatcher.clone()),
        webhook("order.completed", "Live", generate_order("SNIP-7", Utc::now())),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "fulfillment": {"orderId": 1234, "errors": []}}));
    assert_eq!(h.fulfillment.created(), vec!["SNIP-7".to_string()]);

    let mut digital = generate_order("SNIP-8", Utc::now());
    digital["items"][0]["shippable"] = json!(false);
    let (status, body) = post(router(h.dispatcher), webhook("order.completed", "Live", digital), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "fulfillment": null}));
    assert_eq!(h.fulfillment.created().len(), 1);
}

#[tokio::test]
async fn test_rejected_fulfillment_still_answers_ok() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default().rejecting("400: bad address"), dispatcher_settings());
    let (status, body) = post(
        router(h.dispatcher),
        webhook("order.completed", "Live", generate_order("SNIP-9", Utc::now())),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fulfillment"], json!({"orderId": null, "errors": ["400: bad address"]}));
}

#[tokio::test]
async fn test_shipping_rates_response_shape() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let (status, body) = post(
        router(h.dispatcher.clone()),
        webhook("shippingrates.fetch", "Test", generate_order("SNIP-1", Utc::now())),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rates"][0]["cost"], json!(12.5));
    assert_eq!(body["rates"][0]["description"], json!("USPS Priority Mail"));
    assert_eq!(body["package"]["weight"], json!({"value": 200.0, "units": "grams"}));
    assert_eq!(h.fulfillment.packages.lock().unwrap().len(), 1);

    let mut digital = generate_order("SNIP-2", Utc::now());
    digital["items"][0]["shippable"] = json!(false);
    let (status, body) = post(router(h.dispatcher), webhook("shippingrates.fetch", "Test", digital), None).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(body["rates"], json!([]));
    assert_eq!(body["package"], Value::Null);
}

#[tokio::test]
async fn test_every_event_is_accepted() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let order = generate_order("SNIP-1", Utc::now());
    let subscription = json!({
        "id": "sub-1",
        "name": "Paint of the month",
        "amount": 20,
        "status": "Active",
        "user": {"id": "cus-1", "email": "tobias@actorpull.biz", "billingAddressName": "Tobias Fünke", "unknown": 1},
        "schedule": {"interval": "Month", "intervalCount": 1, "startsOn": "2019-01-01T00:00:00Z"}
    });
    let customer = json!({"id": "cus-1", "email": "tobias@actorpull.biz", "status": "Confirmed", "sessionToken": "abc"});
    let refund = json!({"id": "ref-1", "orderToken": "token-SNIP-1", "amount": 10.5, "comment": "dented"});
    let notification = json!({"id": "not-1", "orderToken": "token-SNIP-1", "notificationType": "Comment", "message": "Thanks!"});

    for event in WebhookEventName::ALL {
        let content = match event {
            WebhookEventName::SubscriptionCreated
            | WebhookEventName::SubscriptionCancelled
            | WebhookEventName::SubscriptionPaused
            | WebhookEventName::SubscriptionResumed
            | WebhookEventName::SubscriptionInvoiceCreated => subscription.clone(),
            WebhookEventName::CustomerUpdated => customer.clone(),
            WebhookEventName::OrderRefundCreated => refund.clone(),
            WebhookEventName::OrderNotificationCreated => notification.clone(),
            _ => order.clone(),
        };
        let (status, body) = post(router(h.dispatcher.clone()), webhook(event.as_str(), "Test", content), None).await;
        assert_eq!(status, StatusCode::OK, "{event} was rejected: {body}");
    }

    assert_eq!(h.log_store.entries().len(), WebhookEventName::ALL.len());
}

#[tokio::test]
async fn test_taxes_calculate() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let (status, body) = post(
        router(h.dispatcher),
        webhook("taxes.calculate", "Test", generate_order("SNIP-1", Utc::now())),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"taxes": []}));
}

#[tokio::test]
async fn test_audit_log_records_accepted_webhooks() {
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), dispatcher_settings());
    let payload = webhook("order.status.changed", "Live", generate_order("SNIP-3", Utc::now()));
    let (status, _) = post(router(h.dispatcher), payload.clone(), None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = h.log_store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_name, "order.status.changed");
    assert_eq!(entries[0].mode, "Live");
    assert_eq!(entries[0].site_id, 1);
    assert_eq!(entries[0].body, payload);
}

#[tokio::test]
async fn test_audit_log_can_be_disabled() {
    let settings = snipcart_relay::application::DispatcherSettings { log_requests: false, ..dispatcher_settings() };
    let h = harness(FakeCheckout::default(), FakeFulfillment::default(), settings);
    let (status, _) = post(router(h.dispatcher), webhook("taxes.calculate", "Test", generate_order("SNIP-1", Utc::now())), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.log_store.entries().is_empty());
}

#[tokio::test]
async fn test_failing_audit_log_does_not_reject() {
    let dispatcher = Arc::new(WebhookDispatcher::new(
        Arc::new(FakeCheckout::default()),
        Arc::new(FakeFulfillment::default()),
        Arc::new(BrokenLogStore),
        dispatcher_settings(),
    ));
    let (status, _) = post(router(dispatcher), webhook("taxes.calculate", "Test", generate_order("SNIP-1", Utc::now())), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_token_validation() {
    let checkout = FakeCheckout { valid_tokens: vec!["good-token".to_string()], ..FakeCheckout::default() };
    let settings = snipcart_relay::application::DispatcherSettings { validate_requests: true, ..dispatcher_settings() };
    let h = harness(checkout, FakeFulfillment::default(), settings);
    let payload = webhook("taxes.calculate", "Test", generate_order("SNIP-1", Utc::now()));

    let (status, body) = post(router(h.dispatcher.clone()), payload.clone(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, rejection("Invalid token."));

    let (status, body) = post(router(h.dispatcher.clone()), payload.clone(), Some("forged")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, rejection("Invalid token."));

    let (status, _) = post(router(h.dispatcher), payload, Some("good-token")).await;
    assert_eq!(status, StatusCode::OK);
}
