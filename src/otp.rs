//! Email verification codes and the short-lived store backing them

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::{Rng, rng};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::error::{InternalServerError, OtpError};
use crate::{Error, RedisConn};

/// How long a code (and a completed verification) stays valid
pub const OTP_TTL_SECONDS: i64 = 600;

/// Generate a fresh 6-digit verification code
#[must_use]
pub fn generate_code() -> String {
	rng().random_range(100_000..=999_999).to_string()
}

/// Contact data captured alongside a pending or verified code
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OtpEntry {
	pub code:       String,
	pub first_name: String,
	pub last_name:  String,
	pub verified:   bool,
}

/// Short-lived keyed store for verification codes
///
/// Entries are keyed by email and evicted after [`OTP_TTL_SECONDS`]. Backed
/// by redis; a `REDIS_URL` of `memory` selects the in-process map instead
#[derive(Clone)]
pub enum OtpStore {
	Redis(RedisConn),
	Memory(Arc<Mutex<HashMap<String, (OtpEntry, Instant)>>>),
}

impl OtpStore {
	#[must_use]
	pub fn memory() -> Self { Self::Memory(Arc::new(Mutex::new(HashMap::new()))) }

	#[must_use]
	pub fn redis(connection: RedisConn) -> Self { Self::Redis(connection) }

	fn key(email: &str) -> String { format!("otp:{email}") }

	/// Store an entry for this email, replacing any previous one and
	/// restarting the TTL
	#[instrument(skip(self, entry))]
	pub async fn put(&self, email: &str, entry: &OtpEntry) -> Result<(), Error> {
		match self {
			Self::Redis(connection) => {
				let mut conn = connection.clone();

				let data = serde_json::to_string(entry)
					.map_err(InternalServerError::SerdeJsonError)?;

				let key = Self::key(email);

				let _: bool = conn.set(&key, &data).await?;
				let _: bool = conn.expire(&key, OTP_TTL_SECONDS).await?;
			},
			Self::Memory(map) => {
				let deadline = Instant::now()
					+ Duration::from_secs(OTP_TTL_SECONDS.unsigned_abs());

				map.lock().insert(email.to_owned(), (entry.clone(), deadline));
			},
		}

		debug!("stored verification entry for {email}");

		Ok(())
	}

	/// Get the entry for this email if it has not expired
	#[instrument(skip(self))]
	pub async fn get(&self, email: &str) -> Result<Option<OtpEntry>, Error> {
		match self {
			Self::Redis(connection) => {
				let mut conn = connection.clone();

				let data: Option<String> = conn.get(Self::key(email)).await?;

				let Some(data) = data.as_ref() else {
					return Ok(None);
				};

				let entry: OtpEntry = serde_json::from_str(data)
					.map_err(InternalServerError::SerdeJsonError)?;

				Ok(Some(entry))
			},
			Self::Memory(map) => {
				let mut map = map.lock();

				match map.get(email) {
					Some((entry, deadline)) if *deadline > Instant::now() => {
						Ok(Some(entry.clone()))
					},
					Some(_) => {
						map.remove(email);

						Ok(None)
					},
					None => Ok(None),
				}
			},
		}
	}

	/// Get the entry for this email, failing unless it has been verified
	pub async fn get_verified(&self, email: &str) -> Result<OtpEntry, Error> {
		match self.get(email).await? {
			Some(entry) if entry.verified => Ok(entry),
			_ => Err(OtpError::VerificationRequired.into()),
		}
	}

	/// Remove the entry for this email
	#[instrument(skip(self))]
	pub async fn delete(&self, email: &str) -> Result<(), Error> {
		match self {
			Self::Redis(connection) => {
				let mut conn = connection.clone();

				let _: i32 = conn.del(Self::key(email)).await?;
			},
			Self::Memory(map) => {
				map.lock().remove(email);
			},
		}

		Ok(())
	}
}
