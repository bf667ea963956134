//! Hosted-checkout gateway abstraction
//!
//! The live implementation talks to Stripe, tests swap in [`StubGateway`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod stripe;

pub use stripe::{
	SIGNATURE_TOLERANCE_SECONDS,
	StripeGateway,
	verify_signature,
};

#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("gateway request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("gateway rejected the request: {0}")]
	Api(String),
	#[error("gateway returned a malformed response: {0}")]
	MalformedResponse(String),
}

/// Everything the gateway needs to open a hosted checkout session
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CheckoutRequest {
	pub amount_cents:   i32,
	pub currency:       String,
	pub customer_email: String,
	/// Human-readable line item shown on the checkout page
	pub description:    String,
	/// Embedded in the session metadata so webhook events can be traced
	/// back to the payment row even if the session id is lost
	pub payment_id:     i32,
	pub success_url:    String,
	pub cancel_url:     String,
}

/// A freshly opened checkout session
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CheckoutSession {
	/// The provider's session id, stored as the payment reference
	pub reference: String,
	/// Where to send the customer to pay
	pub url:       String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct SessionStatus {
	pub paid: bool,
}

/// A hosted-checkout payment provider
pub trait PaymentGateway: Send + Sync {
	/// Open a checkout session for one payment attempt
	fn create_checkout_session(
		&self,
		request: CheckoutRequest,
	) -> Pin<Box<dyn Future<Output = Result<CheckoutSession, GatewayError>> + Send>>;

	/// Look up whether a session has been paid
	fn retrieve_session(
		&self,
		reference: &str,
	) -> Pin<Box<dyn Future<Output = Result<SessionStatus, GatewayError>> + Send>>;

	/// The name recorded on payments settled through this gateway
	fn name(&self) -> &'static str;
}

/// In-memory gateway which remembers every session it opened
#[derive(Debug, Default)]
pub struct StubGateway {
	sessions: Mutex<Vec<CheckoutRequest>>,
	paid:     Mutex<bool>,
}

impl StubGateway {
	#[must_use]
	pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

	/// Make every subsequent [`retrieve_session`] report the session as
	/// paid
	///
	/// [`retrieve_session`]: PaymentGateway::retrieve_session
	pub fn mark_paid(&self) { *self.paid.lock() = true; }

	#[must_use]
	pub fn created_sessions(&self) -> Vec<CheckoutRequest> {
		self.sessions.lock().clone()
	}
}

impl PaymentGateway for StubGateway {
	fn create_checkout_session(
		&self,
		request: CheckoutRequest,
	) -> Pin<Box<dyn Future<Output = Result<CheckoutSession, GatewayError>> + Send>>
	{
		let reference = format!("cs_test_{}", Uuid::new_v4().simple());
		let url = format!("https://checkout.stub.invalid/pay/{reference}");

		self.sessions.lock().push(request);

		Box::pin(async move { Ok(CheckoutSession { reference, url }) })
	}

	fn retrieve_session(
		&self,
		_reference: &str,
	) -> Pin<Box<dyn Future<Output = Result<SessionStatus, GatewayError>> + Send>>
	{
		let paid = *self.paid.lock();

		Box::pin(async move { Ok(SessionStatus { paid }) })
	}

	fn name(&self) -> &'static str { "stub" }
}
