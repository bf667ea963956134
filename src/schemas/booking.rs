use serde::{Deserialize, Serialize};
use validator_derive::Validate;

use crate::models::{Game, Language, Reservation, ReservationStatus};

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
pub struct SendOtpRequest {
	#[validate(email(message = "invalid email", code = "email"))]
	pub email:      String,
	#[validate(length(
		min = 1,
		max = 64,
		message = "first name must be between 1 and 64 characters long",
		code = "first-name-length"
	))]
	pub first_name: String,
	#[validate(length(
		min = 1,
		max = 64,
		message = "last name must be between 1 and 64 characters long",
		code = "last-name-length"
	))]
	pub last_name:  String,
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
pub struct VerifyOtpRequest {
	#[validate(email(message = "invalid email", code = "email"))]
	pub email: String,
	#[validate(length(
		equal = 6,
		message = "verification codes are 6 digits",
		code = "otp-length"
	))]
	pub otp:   String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SendOtpResponse {
	pub message:    String,
	pub email:      String,
	pub expires_in: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VerifyOtpResponse {
	pub message:    String,
	pub email:      String,
	pub first_name: String,
	pub last_name:  String,
	pub verified:   bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
pub struct CreateBookingRequest {
	pub game:                 i32,
	pub date:                 String,
	pub time:                 String,
	#[validate(range(
		min = 1,
		message = "at least one player is required",
		code = "players-min"
	))]
	pub players:              i32,
	pub special_requirements: Option<String>,
	#[validate(email(message = "invalid email", code = "email"))]
	pub email:                String,
	#[validate(length(
		min = 1,
		max = 64,
		message = "first name must be between 1 and 64 characters long",
		code = "first-name-length"
	))]
	pub first_name:           String,
	#[validate(length(
		min = 1,
		max = 64,
		message = "last name must be between 1 and 64 characters long",
		code = "last-name-length"
	))]
	pub last_name:            String,
	pub phone:                Option<String>,
	pub lang:                 Option<String>,
}

/// The booked reservation as shown to the customer
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReservationResponse {
	pub id:                i32,
	pub reference_number:  String,
	pub game:              String,
	pub date:              String,
	pub time:              String,
	pub players:           i32,
	pub total_price_cents: i32,
	pub email:             String,
}

impl ReservationResponse {
	#[must_use]
	pub fn from_reservation(
		reservation: &Reservation,
		game: &Game,
		language: Language,
	) -> Self {
		Self {
			id:                reservation.id,
			reference_number:  reservation.reference_number.clone(),
			game:              game.title.resolve(language).to_string(),
			date:              reservation.date.format("%Y-%m-%d").to_string(),
			time:              reservation.time.format("%H:%M").to_string(),
			players:           reservation.players,
			total_price_cents: reservation.total_cents,
			email:             reservation.email.clone(),
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateBookingResponse {
	pub success:     bool,
	pub message:     String,
	pub reservation: ReservationResponse,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReservationsQuery {
	pub email: String,
	pub lang:  Option<String>,
}

/// One entry of a customer's reservation history
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReservationListEntry {
	pub status:      ReservationStatus,
	#[serde(flatten)]
	pub reservation: ReservationResponse,
}
