use subtrack::config::StripeConfig;
use subtrack::stripe::webhook::compute_signature;
use subtrack::stripe::{NewCheckoutSession, StripeError};
use subtrack::StripeClient;

const SECRET: &str = "whsec_integration";

fn client(webhook_secret: Option<&str>) -> StripeClient {
    StripeClient::new(&StripeConfig {
        secret_key: "sk_test_123".into(),
        webhook_secret: webhook_secret.map(str::to_string),
        api_base: "https://api.stripe.com".into(),
    })
}

#[tokio::test]
async fn test_client_from_config() {
    let client = client(Some(SECRET));
    assert!(client.api_key.starts_with("sk_"));
    assert_eq!(client.webhook_secret.as_deref(), Some(SECRET));
}

#[test]
fn test_verify_webhook_decodes_completed_session() {
    let payload = br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_test_1","payment_status":"paid","metadata":{"userId":"u-1","planName":"Yearly"}}}}"#;
    let now = 1_792_000_000;
    let header = format!(
        "t={},v1={}",
        now,
        compute_signature(payload, SECRET, &now.to_string())
    );

    let event = client(Some(SECRET))
        .verify_webhook(payload, &header, now + 30)
        .unwrap();
    assert_eq!(event.event_type, "checkout.session.completed");
    assert_eq!(event.data.object["metadata"]["userId"], "u-1");
}

#[test]
fn test_verify_webhook_without_secret_fails() {
    let err = client(None).verify_webhook(b"{}", "t=1,v1=00", 1).unwrap_err();
    assert!(matches!(err, StripeError::Signature(_)));
}

#[test]
fn test_checkout_params_for_catalogue_plan() {
    let plan = subtrack::plans::find_plan("monthly").unwrap();
    let session = NewCheckoutSession::for_plan(
        plan.name,
        subtrack::plans::total(plan.price),
        "u-1",
        "https://subtrack.example.com",
    );
    assert_eq!(session.unit_amount, 1075);
    assert!(session
        .to_params()
        .contains(&("metadata[planName]".to_string(), "Monthly".to_string())));
}
