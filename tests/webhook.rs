use axum::http::{HeaderName, HeaderValue, StatusCode};
use chrono::Utc;
use hmac::{Hmac, Mac};
use questbook::schemas::billing::CreatePaymentRequest;
use serde_json::{Value, json};
use sha2::Sha256;

mod common;

use common::{TestEnv, WEBHOOK_SECRET};

const SIGNATURE: HeaderName = HeaderName::from_static("stripe-signature");

fn signature_header(
	secret: &str,
	payload: &str,
	timestamp: i64,
) -> HeaderValue {
	let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
	mac.update(format!("{timestamp}.{payload}").as_bytes());

	let header = format!("t={timestamp},v1={:x}", mac.finalize().into_bytes());

	HeaderValue::from_str(&header).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn creating_a_payment_requires_a_verified_email() {
	let env = TestEnv::new().await;

	let response = env
		.app
		.post("/api/billing/create-payment")
		.json(&CreatePaymentRequest {
			reservation_id: 1,
			email:          "ghost@example.com".to_string(),
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
	assert!(env.gateway.created_sessions().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_rejects_a_missing_signature() {
	let env = TestEnv::new().await;

	let response = env
		.app
		.post("/api/billing/webhooks/stripe")
		.text(r#"{"type":"checkout.session.completed"}"#)
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_rejects_a_forged_signature() {
	let env = TestEnv::new().await;

	let payload = r#"{"type":"checkout.session.completed"}"#;
	let header =
		signature_header("whsec_wrong", payload, Utc::now().timestamp());

	let response = env
		.app
		.post("/api/billing/webhooks/stripe")
		.add_header(SIGNATURE, header)
		.text(payload)
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_rejects_a_stale_timestamp() {
	let env = TestEnv::new().await;

	let payload = r#"{"type":"checkout.session.completed"}"#;
	let header = signature_header(
		WEBHOOK_SECRET,
		payload,
		Utc::now().timestamp() - 400,
	);

	let response = env
		.app
		.post("/api/billing/webhooks/stripe")
		.add_header(SIGNATURE, header)
		.text(payload)
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_rejects_malformed_payloads() {
	let env = TestEnv::new().await;

	let payload = "not json at all";
	let header =
		signature_header(WEBHOOK_SECRET, payload, Utc::now().timestamp());

	let response = env
		.app
		.post("/api/billing/webhooks/stripe")
		.add_header(SIGNATURE, header)
		.text(payload)
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_acknowledges_unknown_event_types() {
	let env = TestEnv::new().await;

	let payload = json!({
		"type": "invoice.created",
		"data": { "object": { "id": "in_123" } },
	})
	.to_string();
	let header =
		signature_header(WEBHOOK_SECRET, &payload, Utc::now().timestamp());

	let response = env
		.app
		.post("/api/billing/webhooks/stripe")
		.add_header(SIGNATURE, header)
		.text(payload)
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<Value>();
	assert_eq!(body["received"], true);
}
