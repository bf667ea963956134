use askama::Template;

use crate::Error;
use crate::mailer::{Mailer, customer_mailbox};
use crate::models::Reservation;
use crate::otp::OTP_TTL_SECONDS;

#[derive(Clone, Debug, Template)]
#[template(path = "otp_code.html")]
struct OtpCodeTemplate {
	first_name: String,
	code:       String,
	expires_in: i64,
}

#[derive(Clone, Debug, Template)]
#[template(path = "booking_confirmation.html")]
struct BookingConfirmationTemplate {
	first_name:       String,
	game_title:       String,
	reference_number: String,
	date:             String,
	time:             String,
	players:          i32,
	total:            String,
}

fn format_cents(cents: i32) -> String {
	format!("{}.{:02} EUR", cents / 100, cents % 100)
}

impl Mailer {
	/// Send out an email verification code
	#[instrument(skip(self, code))]
	pub(crate) async fn send_otp_code(
		&self,
		email: &str,
		first_name: &str,
		code: &str,
	) -> Result<(), Error> {
		let body = OtpCodeTemplate {
			first_name: first_name.to_string(),
			code:       code.to_string(),
			expires_in: OTP_TTL_SECONDS / 60,
		};

		let mail = self.try_build_message(
			customer_mailbox(email, Some(first_name))?,
			"Your verification code",
			&body.render()?,
		)?;

		self.send(mail).await?;

		info!("sent verification code email");

		Ok(())
	}

	/// Send out a booking confirmation email
	#[instrument(skip(self, reservation, game_title))]
	pub(crate) async fn send_booking_confirmation(
		&self,
		reservation: &Reservation,
		game_title: &str,
		first_name: &str,
	) -> Result<(), Error> {
		let body = BookingConfirmationTemplate {
			first_name:       first_name.to_string(),
			game_title:       game_title.to_string(),
			reference_number: reservation.reference_number.clone(),
			date:             reservation.date.format("%Y-%m-%d").to_string(),
			time:             reservation.time.format("%H:%M").to_string(),
			players:          reservation.players,
			total:            format_cents(reservation.total_cents),
		};

		let mail = self.try_build_message(
			customer_mailbox(&reservation.email, Some(first_name))?,
			"Your booking at Questbook",
			&body.render()?,
		)?;

		self.send(mail).await?;

		info!(
			"sent booking confirmation email for {}",
			reservation.reference_number
		);

		Ok(())
	}
}
