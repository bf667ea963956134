//! Library-wide error types and [`From`] impls

use std::collections::HashMap;
use std::sync::LazyLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDateTime;
use diesel::result::DatabaseErrorKind;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::gateway::GatewayError;

/// Top level application error, can be converted into a [`Response`]
#[derive(Debug, Error)]
pub enum Error {
	/// Duplicate resource created
	#[error("{0}")]
	Duplicate(String),
	/// Request/operation forbidden
	#[error("forbidden")]
	Forbidden,
	/// An error that should never happen
	#[error("{0}")]
	Infallible(String),
	/// Opaque internal server error
	#[error("internal server error")]
	InternalServerError,
	/// Resource not found
	#[error("not found - {0}")]
	NotFound(String),
	/// Any error related to the email verification flow
	#[error(transparent)]
	OtpError(#[from] OtpError),
	/// Any error related to creating a booking
	#[error(transparent)]
	BookingError(#[from] BookingError),
	/// Any error related to creating or settling a payment
	#[error(transparent)]
	BillingError(#[from] BillingError),
	/// Session creation at the payment provider failed
	#[error("payment gateway error")]
	GatewayError(#[from] GatewayError),
	/// A webhook delivery could not be authenticated or parsed
	#[error(transparent)]
	WebhookError(#[from] WebhookError),
	/// Resource could not be validated
	#[error("{0}")]
	ValidationError(String),
}

impl Error {
	/// Return a unique identifying code for this error
	///
	/// When modifying this function the error code should only ever increase,
	/// an error code should never be reused once its assigned to avoid
	/// unexpectedly breaking the frontend
	fn code(&self) -> i32 {
		match self {
			Self::Duplicate(_) => 1,
			Self::Forbidden => 2,
			Self::Infallible(_) => 3,
			Self::InternalServerError => 4,
			Self::NotFound(_) => 5,
			Self::ValidationError(_) => 6,
			Self::OtpError(e) => {
				match e {
					OtpError::Expired => 7,
					OtpError::Invalid => 8,
					OtpError::VerificationRequired => 9,
				}
			},
			Self::BookingError(e) => {
				match e {
					BookingError::PastDate => 10,
					BookingError::NotReleasedYet(_) => 11,
					BookingError::TooManyPlayers(_) => 12,
					BookingError::SlotFull(_) => 13,
					BookingError::SlotTaken => 14,
				}
			},
			Self::BillingError(e) => {
				match e {
					BillingError::NotPayable(_) => 15,
				}
			},
			Self::GatewayError(_) => 16,
			Self::WebhookError(e) => {
				match e {
					WebhookError::MissingSignature => 17,
					WebhookError::BadSignature => 18,
					WebhookError::StaleTimestamp => 19,
					WebhookError::MalformedPayload => 20,
				}
			},
		}
	}

	/// Return additional information about the error
	fn info(&self) -> Option<String> {
		match self {
			Self::Duplicate(m) | Self::NotFound(m) | Self::ValidationError(m) => {
				Some(m.to_owned())
			},
			Self::BookingError(e) => {
				match e {
					BookingError::NotReleasedYet(from) => {
						Some(serde_json::json!({"from": from}).to_string())
					},
					BookingError::TooManyPlayers(max) => {
						Some(serde_json::json!({"max": max}).to_string())
					},
					BookingError::SlotFull(left) => {
						Some(serde_json::json!({"available": left}).to_string())
					},
					_ => None,
				}
			},
			Self::BillingError(BillingError::NotPayable(status)) => {
				Some(serde_json::json!({"status": status}).to_string())
			},
			_ => None,
		}
	}
}

/// Convert an error into a [`Response`]
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		error!("{self:?}");

		let message = self.to_string();

		let data = serde_json::json!({
			"message": message,
			"code": self.code(),
			"info": self.info(),
		});

		let status = match self {
			Self::Duplicate(_)
			| Self::BookingError(
				BookingError::SlotFull(_) | BookingError::SlotTaken,
			)
			| Self::BillingError(BillingError::NotPayable(_)) => {
				StatusCode::CONFLICT
			},
			Self::InternalServerError | Self::Infallible(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			},
			Self::Forbidden | Self::OtpError(OtpError::VerificationRequired) => {
				StatusCode::FORBIDDEN
			},
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
			Self::OtpError(_)
			| Self::BookingError(_)
			| Self::WebhookError(_)
			| Self::ValidationError(_) => StatusCode::BAD_REQUEST,
		};

		(status, axum::Json(data)).into_response()
	}
}

/// Any error related to the email verification flow
#[derive(Debug, Error)]
pub enum OtpError {
	#[error("OTP expired or not found")]
	Expired,
	#[error("invalid OTP")]
	Invalid,
	#[error("email verification required")]
	VerificationRequired,
}

/// Any error related to creating a booking
#[derive(Debug, Error)]
pub enum BookingError {
	/// The requested date lies before the local business date
	#[error("cannot book for past dates")]
	PastDate,
	/// The game is still in pre-reservation and opens later
	#[error("this game is not available yet")]
	NotReleasedYet(NaiveDateTime),
	/// The party size exceeds the game's player limit
	#[error("too many players for this game")]
	TooManyPlayers(i32),
	/// The remaining slot capacity cannot fit the party
	#[error("this time slot is full")]
	SlotFull(i32),
	/// Another booking claimed the exact slot first
	#[error("slot no longer available")]
	SlotTaken,
}

/// Any error related to creating or settling a payment
#[derive(Debug, Error)]
pub enum BillingError {
	/// The reservation is not in a payable state
	#[error("reservation can no longer be paid")]
	NotPayable(String),
}

/// A webhook delivery could not be authenticated or parsed
#[derive(Debug, Error)]
pub enum WebhookError {
	#[error("missing signature header")]
	MissingSignature,
	#[error("signature verification failed")]
	BadSignature,
	#[error("signature timestamp outside tolerance")]
	StaleTimestamp,
	#[error("malformed event payload")]
	MalformedPayload,
}

/// A list of possible internal errors
///
/// API end users should never see these details
#[derive(Debug, Error)]
pub enum InternalServerError {
	/// Unknown database constraint violation
	#[error("constraint error -- {0:?}")]
	ConstraintError(String),
	/// Error executing some database operation
	#[error("database error -- {0:?}")]
	DatabaseError(diesel::result::Error),
	/// Error interacting with a database connection
	#[error("database interaction error -- {0:?}")]
	DatabaseInteractionError(deadpool_diesel::InteractError),
	/// Error handling some form of I/O
	#[error("I/O error -- {0:?}")]
	IOError(std::io::Error),
	/// Malformed email
	#[error("invalid email -- {0:?}")]
	InvalidEmail(lettre::address::AddressError),
	/// Mailer stopped unexpectedly
	#[error("mailer stopped -- {0:?}")]
	MailerStopped(mpsc::error::SendError<lettre::Message>),
	/// Generic mailer error
	#[error("mail error -- {0:?}")]
	MailError(lettre::error::Error),
	/// Error rendering a mail template
	#[error("template error -- {0:?}")]
	TemplateError(askama::Error),
	/// Error acquiring database pool connection
	#[error("database pool error -- {0:?}")]
	PoolError(deadpool_diesel::PoolError),
	/// Error executing some redis operation
	#[error("redis error -- {0:?}")]
	RedisError(redis::RedisError),
	/// Error related to `serde_json`
	#[error("serde_json error -- {0:?}")]
	SerdeJsonError(serde_json::Error),
}

// Map internal server errors to application errors
impl From<InternalServerError> for Error {
	fn from(value: InternalServerError) -> Self {
		error!("internal server error -- {value}");

		Self::InternalServerError
	}
}

/// Map validation errors to application errors
impl From<validator::ValidationErrors> for Error {
	fn from(err: validator::ValidationErrors) -> Self {
		let errs = err.field_errors();
		let repr = errs
			.values()
			.map(|v| {
				v.iter()
					.map(ToString::to_string)
					.collect::<Vec<String>>()
					.join("\n")
			})
			.collect::<Vec<String>>()
			.join("\n");

		Self::ValidationError(repr)
	}
}

/// Map database interaction errors to application errors
impl From<deadpool_diesel::InteractError> for Error {
	fn from(value: deadpool_diesel::InteractError) -> Self {
		InternalServerError::DatabaseInteractionError(value).into()
	}
}

/// Map of constraint names to column names.
static CONSTRAINT_TO_COLUMN: LazyLock<HashMap<&str, &str>> =
	LazyLock::new(|| {
		HashMap::from([
			("app_user_email_key", "email"),
			("invoice_invoice_id_key", "invoice_id"),
			("reservation_reference_number_key", "reference_number"),
		])
	});

/// Map database result errors to application errors.
impl From<diesel::result::Error> for Error {
	fn from(err: diesel::result::Error) -> Self {
		match &err {
			// No rows returned by query that expected at least one
			diesel::result::Error::NotFound => {
				Self::NotFound("no context provided".to_string())
			},
			// Unique constraint violation
			diesel::result::Error::DatabaseError(
				DatabaseErrorKind::UniqueViolation,
				info,
			) => {
				let constraint_name = info.constraint_name().unwrap();

				// Two bookings raced for the same slot, the loser ends up here
				if constraint_name == "reservation_game_id_date_time_key" {
					return BookingError::SlotTaken.into();
				}

				match CONSTRAINT_TO_COLUMN.get(constraint_name) {
					Some(field) => {
						Self::Duplicate(format!("{field} is already in use"))
					},
					None => InternalServerError::DatabaseError(err).into(),
				}
			},
			// Foreign key constraint violation
			diesel::result::Error::DatabaseError(
				DatabaseErrorKind::ForeignKeyViolation,
				info,
			) => Error::ValidationError(info.message().to_string()),
			_ => InternalServerError::DatabaseError(err).into(),
		}
	}
}

impl From<deadpool_diesel::PoolError> for Error {
	fn from(value: deadpool_diesel::PoolError) -> Self {
		InternalServerError::PoolError(value).into()
	}
}

impl From<lettre::address::AddressError> for Error {
	fn from(err: lettre::address::AddressError) -> Self {
		InternalServerError::InvalidEmail(err).into()
	}
}

impl From<mpsc::error::SendError<lettre::Message>> for Error {
	fn from(err: mpsc::error::SendError<lettre::Message>) -> Self {
		InternalServerError::MailerStopped(err).into()
	}
}

impl From<lettre::error::Error> for Error {
	fn from(err: lettre::error::Error) -> Self {
		InternalServerError::MailError(err).into()
	}
}

impl From<askama::Error> for Error {
	fn from(err: askama::Error) -> Self {
		InternalServerError::TemplateError(err).into()
	}
}

impl From<redis::RedisError> for Error {
	fn from(err: redis::RedisError) -> Self {
		InternalServerError::RedisError(err).into()
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		InternalServerError::SerdeJsonError(err).into()
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		InternalServerError::IOError(err).into()
	}
}
