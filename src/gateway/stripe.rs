use std::future::Future;
use std::pin::Pin;

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;

use super::{
	CheckoutRequest,
	CheckoutSession,
	GatewayError,
	PaymentGateway,
	SessionStatus,
};
use crate::GatewayConfig;
use crate::error::WebhookError;

/// How far a webhook signature timestamp may drift before the event is
/// rejected as a replay
pub const SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Stripe hosted-checkout client
pub struct StripeGateway {
	client:     Client,
	api_base:   String,
	secret_key: String,
}

impl StripeGateway {
	#[must_use]
	pub fn new(config: &GatewayConfig) -> Self {
		Self {
			client:     Client::new(),
			api_base:   config.api_base.clone(),
			secret_key: config.secret_key().to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
struct StripeSession {
	id:             String,
	url:            Option<String>,
	payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
	error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
	message: Option<String>,
}

/// Turn a non-2xx provider response into a [`GatewayError`]
async fn rejection(response: reqwest::Response) -> GatewayError {
	let status = response.status();
	let body = response.text().await.unwrap_or_default();

	let message = serde_json::from_str::<StripeErrorBody>(&body)
		.ok()
		.and_then(|body| body.error.message)
		.unwrap_or(body);

	GatewayError::Api(format!("{status}: {message}"))
}

impl PaymentGateway for StripeGateway {
	fn create_checkout_session(
		&self,
		request: CheckoutRequest,
	) -> Pin<Box<dyn Future<Output = Result<CheckoutSession, GatewayError>> + Send>>
	{
		let client = self.client.clone();
		let endpoint = format!("{}/checkout/sessions", self.api_base);
		let secret_key = self.secret_key.clone();

		Box::pin(async move {
			let params = [
				("payment_method_types[0]", "card".to_string()),
				(
					"line_items[0][price_data][currency]",
					request.currency.to_lowercase(),
				),
				(
					"line_items[0][price_data][unit_amount]",
					request.amount_cents.to_string(),
				),
				(
					"line_items[0][price_data][product_data][name]",
					request.description,
				),
				("line_items[0][quantity]", "1".to_string()),
				("customer_email", request.customer_email),
				("mode", "payment".to_string()),
				("metadata[payment_id]", request.payment_id.to_string()),
				(
					"payment_intent_data[metadata][payment_id]",
					request.payment_id.to_string(),
				),
				("success_url", request.success_url),
				("cancel_url", request.cancel_url),
			];

			let response = client
				.post(endpoint)
				.basic_auth(&secret_key, None::<&str>)
				.form(&params)
				.send()
				.await?;

			if !response.status().is_success() {
				return Err(rejection(response).await);
			}

			let session: StripeSession = response.json().await?;

			let Some(url) = session.url else {
				return Err(GatewayError::MalformedResponse(format!(
					"session {} has no checkout url",
					session.id
				)));
			};

			Ok(CheckoutSession { reference: session.id, url })
		})
	}

	fn retrieve_session(
		&self,
		reference: &str,
	) -> Pin<Box<dyn Future<Output = Result<SessionStatus, GatewayError>> + Send>>
	{
		let client = self.client.clone();
		let endpoint =
			format!("{}/checkout/sessions/{reference}", self.api_base);
		let secret_key = self.secret_key.clone();

		Box::pin(async move {
			let response = client
				.get(endpoint)
				.basic_auth(&secret_key, None::<&str>)
				.send()
				.await?;

			if !response.status().is_success() {
				return Err(rejection(response).await);
			}

			let session: StripeSession = response.json().await?;
			let paid = session.payment_status.as_deref() == Some("paid");

			Ok(SessionStatus { paid })
		})
	}

	fn name(&self) -> &'static str { "stripe" }
}

/// Check a webhook payload against its signature header
///
/// The header carries a unix timestamp and one or more HMAC-SHA256
/// signatures over `"{timestamp}.{payload}"`. Events older than
/// [`SIGNATURE_TOLERANCE_SECONDS`] are rejected even when correctly signed.
///
/// # Errors
pub fn verify_signature(
	secret: &str,
	payload: &str,
	header: &str,
	now: i64,
) -> Result<(), WebhookError> {
	let mut timestamp = None;
	let mut signatures = Vec::new();

	for part in header.split(',') {
		match part.trim().split_once('=') {
			Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
			Some(("v1", value)) => signatures.push(value),
			_ => {},
		}
	}

	let Some(timestamp) = timestamp else {
		return Err(WebhookError::MissingSignature);
	};

	if signatures.is_empty() {
		return Err(WebhookError::MissingSignature);
	}

	if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECONDS {
		return Err(WebhookError::StaleTimestamp);
	}

	let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
		.map_err(|_| WebhookError::BadSignature)?;
	mac.update(format!("{timestamp}.{payload}").as_bytes());

	let verified = signatures.iter().any(|candidate| {
		decode_hex(candidate)
			.is_some_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
	});

	if verified { Ok(()) } else { Err(WebhookError::BadSignature) }
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
	if value.len() % 2 != 0 || value.is_empty() {
		return None;
	}

	value
		.as_bytes()
		.chunks(2)
		.map(|pair| {
			let pair = std::str::from_utf8(pair).ok()?;
			u8::from_str_radix(pair, 16).ok()
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use hmac::{Hmac, Mac};
	use sha2::Sha256;

	use super::{SIGNATURE_TOLERANCE_SECONDS, verify_signature};
	use crate::error::WebhookError;

	const SECRET: &str = "whsec_test_secret";
	const PAYLOAD: &str = r#"{"type":"checkout.session.completed"}"#;

	fn sign(secret: &str, payload: &str, timestamp: i64) -> String {
		let mut mac =
			Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
		mac.update(format!("{timestamp}.{payload}").as_bytes());

		format!("{:x}", mac.finalize().into_bytes())
	}

	#[test]
	fn accepts_a_fresh_correctly_signed_payload() {
		let header = format!("t=1700000000,v1={}", sign(SECRET, PAYLOAD, 1_700_000_000));

		assert!(
			verify_signature(SECRET, PAYLOAD, &header, 1_700_000_000).is_ok()
		);
	}

	#[test]
	fn accepts_any_matching_signature_among_several() {
		let header = format!(
			"t=1700000000,v1={},v1={}",
			"0f".repeat(32),
			sign(SECRET, PAYLOAD, 1_700_000_000),
		);

		assert!(
			verify_signature(SECRET, PAYLOAD, &header, 1_700_000_100).is_ok()
		);
	}

	#[test]
	fn rejects_a_wrong_secret() {
		let header =
			format!("t=1700000000,v1={}", sign("other", PAYLOAD, 1_700_000_000));

		assert!(matches!(
			verify_signature(SECRET, PAYLOAD, &header, 1_700_000_000),
			Err(WebhookError::BadSignature)
		));
	}

	#[test]
	fn rejects_a_tampered_payload() {
		let header = format!("t=1700000000,v1={}", sign(SECRET, PAYLOAD, 1_700_000_000));

		assert!(matches!(
			verify_signature(SECRET, "{}", &header, 1_700_000_000),
			Err(WebhookError::BadSignature)
		));
	}

	#[test]
	fn rejects_a_stale_timestamp() {
		let header = format!("t=1700000000,v1={}", sign(SECRET, PAYLOAD, 1_700_000_000));
		let now = 1_700_000_000 + SIGNATURE_TOLERANCE_SECONDS + 1;

		assert!(matches!(
			verify_signature(SECRET, PAYLOAD, &header, now),
			Err(WebhookError::StaleTimestamp)
		));
	}

	#[test]
	fn rejects_a_header_without_signatures() {
		assert!(matches!(
			verify_signature(SECRET, PAYLOAD, "t=1700000000", 1_700_000_000),
			Err(WebhookError::MissingSignature)
		));

		assert!(matches!(
			verify_signature(SECRET, PAYLOAD, "v1=abcdef", 1_700_000_000),
			Err(WebhookError::MissingSignature)
		));
	}

	#[test]
	fn rejects_garbage_hex() {
		let header = "t=1700000000,v1=zzzz";

		assert!(matches!(
			verify_signature(SECRET, PAYLOAD, header, 1_700_000_000),
			Err(WebhookError::BadSignature)
		));
	}
}
