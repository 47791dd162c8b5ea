use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use subtrack::config::StripeConfig;
use subtrack::relay::{self, AppState};
use subtrack::stripe::webhook::compute_signature;
use subtrack::{StripeClient, SupabaseClient};

const STRIPE_SECRET: &str = "whsec_relay";
const SUPABASE_SECRET: &str = "db-hook-secret";

// Nothing listens on port 9, so any test that reached the network would fail fast.
fn state() -> AppState {
    let stripe = StripeClient::new(&StripeConfig {
        secret_key: "sk_test_relay".into(),
        webhook_secret: Some(STRIPE_SECRET.into()),
        api_base: "http://127.0.0.1:9".into(),
    });
    let supabase = SupabaseClient::with_credentials("http://127.0.0.1:9", "anon");
    AppState::new(
        stripe,
        supabase,
        "http://localhost:5173/",
        Some(SUPABASE_SECRET.into()),
    )
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(relay::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn ping_and_health() {
    let app = app!(state());

    let req = test::TestRequest::get().uri("/ping").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"ok": true}));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, web::Bytes::from_static(b"OK"));
}

#[actix_web::test]
async fn checkout_requires_plan_price_and_user() {
    let app = app!(state());
    for payload in [
        json!({"price": 10.75, "userId": "u-1"}),
        json!({"planName": "Monthly", "price": 0, "userId": "u-1"}),
        json!({"planName": "Monthly", "price": 10.75, "userId": ""}),
    ] {
        let req = test::TestRequest::post()
            .uri("/create-checkout-session")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing plan info or userId");
    }
}

#[actix_web::test]
async fn malformed_json_gets_json_error() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/create-checkout-session")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn session_lookups_need_an_id() {
    let app = app!(state());

    let req = test::TestRequest::get()
        .uri("/retrieve-checkout-session")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing session_id in query");

    let req = test::TestRequest::post().uri("/billing/confirm").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/retrieve-checkout-session?session_id=..%2Fcustomers")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn stripe_webhook_checks_signature() {
    let app = app!(state());
    let payload = r#"{"id":"evt_2","type":"invoice.paid","data":{"object":{}}}"#;

    let req = test::TestRequest::post()
        .uri("/webhooks/stripe")
        .set_payload(payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/webhooks/stripe")
        .insert_header(("Stripe-Signature", "t=1,v1=deadbeef"))
        .set_payload(payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let now = chrono::Utc::now().timestamp();
    let signature = format!(
        "t={},v1={}",
        now,
        compute_signature(payload.as_bytes(), STRIPE_SECRET, &now.to_string())
    );
    let req = test::TestRequest::post()
        .uri("/webhooks/stripe")
        .insert_header(("Stripe-Signature", signature))
        .set_payload(payload)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"received": true}));
}

#[actix_web::test]
async fn supabase_webhook_feeds_the_inbox() {
    let state = state();
    let app = app!(state);
    let payload = json!({
        "type": "INSERT",
        "table": "notifications",
        "schema": "public",
        "record": {"id": 11, "user_id": "u-1", "message": "Card expiring", "created_at": "2026-10-14T09:00:00Z"},
        "old_record": null
    });

    let req = test::TestRequest::post()
        .uri("/webhooks/supabase")
        .insert_header(("x-webhook-secret", "wrong"))
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.notifications.unread_count("u-1").await, 0);

    let req = test::TestRequest::post()
        .uri("/webhooks/supabase")
        .insert_header(("x-webhook-secret", SUPABASE_SECRET))
        .set_json(&payload)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["outcome"], "stored");
    assert_eq!(body["notification"]["id"], "stored-11");

    let inbox = state.notifications.list("u-1").await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].message, "Card expiring");
}

#[actix_web::test]
async fn api_requires_a_bearer_token() {
    let app = app!(state());
    for uri in ["/api/me", "/api/dashboard", "/api/notifications", "/api/plans"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unauthorized");
    }
}
