use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use deadpool_diesel::postgres::{Manager, Pool};
use lettre::Address;

use crate::gateway::{PaymentGateway, StripeGateway, StubGateway};
use crate::mailer::StubMailbox;
use crate::otp::OtpStore;

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

fn get_env_var(var: &str) -> String {
	std::env::var(var).unwrap_or_else(|_| panic!("{var} must be set"))
}

#[derive(Clone, Debug)]
pub struct Config {
	pub database_url: String,
	pub redis_url:    String,
	pub frontend_url: String,

	/// Timezone the business operates in, "today" and "now" for
	/// booking rules are evaluated against this zone
	pub timezone: Tz,

	pub email_address:       Address,
	pub email_smtp_server:   String,
	pub email_smtp_password: String,
	pub email_queue_size:    usize,
}

impl Config {
	/// Create a new [`Config`] from environment variables
	///
	/// # Panics
	/// Panics if an environment variable is missing or unparsable
	#[must_use]
	pub fn from_env() -> Self {
		let database_url = get_env_var("DATABASE_URL");
		let redis_url = get_env_var("REDIS_URL");
		let frontend_url = get_env_var("FRONTEND_URL");

		let timezone = get_env_var("TIMEZONE").parse::<Tz>().unwrap();

		let email_address =
			get_env_var("EMAIL_ADDRESS").parse::<Address>().unwrap();
		let email_smtp_server = get_env_var("EMAIL_SMTP_SERVER");
		let email_smtp_password = get_env_var("EMAIL_SMTP_PASSWORD");
		let email_queue_size =
			get_env_var("EMAIL_QUEUE_SIZE").parse::<usize>().unwrap();

		Self {
			database_url,
			redis_url,
			frontend_url,
			timezone,
			email_address,
			email_smtp_server,
			email_smtp_password,
			email_queue_size,
		}
	}

	/// The current wall-clock moment in the business timezone
	///
	/// Past-date checks and the today filter run against this clock, not
	/// against UTC.
	#[must_use]
	pub fn now_local(&self) -> NaiveDateTime {
		Utc::now().with_timezone(&self.timezone).naive_local()
	}

	/// Create a database pool for the given config
	///
	/// # Panics
	/// Panics if creating the pool fails
	#[must_use]
	pub fn create_database_pool(&self) -> Pool {
		let manager = Manager::new(
			self.database_url.to_string(),
			deadpool_diesel::Runtime::Tokio1,
		);

		Pool::builder(manager).build().unwrap()
	}

	/// Create the ephemeral store backing the email verification flow
	///
	/// A `REDIS_URL` of `memory` selects the in-process store
	///
	/// # Panics
	/// Panics if connecting to redis fails
	pub async fn create_otp_store(&self) -> OtpStore {
		if self.redis_url == "memory" {
			return OtpStore::memory();
		}

		let client = redis::Client::open(self.redis_url.as_str()).unwrap();
		let connection =
			client.get_multiplexed_async_connection().await.unwrap();

		OtpStore::redis(connection)
	}

	/// Create a stub mailbox if one is needed
	#[must_use]
	pub fn create_stub_mailbox(&self) -> Option<Arc<StubMailbox>> {
		if self.email_smtp_server == "stub" {
			Some(Arc::new(StubMailbox::default()))
		} else {
			None
		}
	}
}

/// Payment provider credentials and endpoints
///
/// Kept separate from [`Config`] so the gateway and the webhook handler can
/// be constructed from an explicit object instead of reading process state
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	pub live_mode:       bool,
	pub test_secret_key: String,
	pub live_secret_key: String,
	pub webhook_secret:  String,
	pub api_base:        String,
}

impl GatewayConfig {
	/// Create a new [`GatewayConfig`] from environment variables
	///
	/// # Panics
	/// Panics if an environment variable is missing
	#[must_use]
	pub fn from_env() -> Self {
		let live_mode = get_env_var("STRIPE_LIVE_MODE") == "true";
		let test_secret_key = get_env_var("STRIPE_TEST_SECRET_KEY");
		let live_secret_key = get_env_var("STRIPE_LIVE_SECRET_KEY");
		let webhook_secret = get_env_var("STRIPE_WEBHOOK_SECRET");

		let api_base = std::env::var("STRIPE_API_BASE")
			.unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string());

		Self {
			live_mode,
			test_secret_key,
			live_secret_key,
			webhook_secret,
			api_base,
		}
	}

	/// The secret key matching the configured mode
	#[must_use]
	pub fn secret_key(&self) -> &str {
		if self.live_mode { &self.live_secret_key } else { &self.test_secret_key }
	}

	/// Create the payment gateway for the given config
	///
	/// A secret key of `stub` selects the in-process gateway
	#[must_use]
	pub fn create_gateway(&self) -> Arc<dyn PaymentGateway> {
		if self.secret_key() == "stub" {
			StubGateway::new()
		} else {
			Arc::new(StripeGateway::new(self))
		}
	}
}
