use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator_derive::Validate;

use crate::models::{ContactInfo, PaymentStatus};

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
pub struct CreatePaymentRequest {
	pub reservation_id: i32,
	#[validate(email(message = "invalid email", code = "email"))]
	pub email:          String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreatePaymentResponse {
	pub payment_url:    String,
	pub invoice_id:     String,
	pub payment_id:     i32,
	pub reservation_id: i32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PaymentSuccessQuery {
	pub session_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PaymentSuccessResponse {
	pub success:        bool,
	pub status:         PaymentStatus,
	pub reservation_id: Option<i32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContactResponse {
	pub success: bool,
	pub data:    ContactInfo,
}

/// The slice of a provider event the webhook handler acts on
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
	#[serde(rename = "type")]
	pub kind: String,
	pub data: WebhookEventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEventData {
	pub object: WebhookObject,
}

/// A checkout session or a payment intent, depending on the event type
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookObject {
	pub id:       String,
	#[serde(default)]
	pub metadata: HashMap<String, String>,
}

impl WebhookObject {
	/// The internal payment id embedded in the object metadata, if any
	#[must_use]
	pub fn payment_id(&self) -> Option<i32> {
		self.metadata.get("payment_id")?.parse().ok()
	}
}
