//! Controllers for the email verification flow and booking creation

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use validator::Validate;

use crate::error::{BookingError, Error, OtpError};
use crate::mailer::Mailer;
use crate::models::{
	Game,
	Language,
	NewReservation,
	NewUser,
	Reservation,
	User,
};
use crate::otp::{OTP_TTL_SECONDS, OtpEntry, OtpStore, generate_code};
use crate::schemas::booking::{
	CreateBookingRequest,
	CreateBookingResponse,
	ReservationListEntry,
	ReservationResponse,
	ReservationsQuery,
	SendOtpRequest,
	SendOtpResponse,
	VerifyOtpRequest,
	VerifyOtpResponse,
};
use crate::slots::{SlotCapacity, not_yet_available};
use crate::{Config, DbPool};

use super::game::occupied_capacities;

/// Send a verification code to a booking contact
#[instrument(skip(otp_store, mailer, request))]
pub(crate) async fn send_otp(
	State(otp_store): State<OtpStore>,
	State(mailer): State<Mailer>,
	Json(request): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let code = generate_code();

	let entry = OtpEntry {
		code:       code.clone(),
		first_name: request.first_name.clone(),
		last_name:  request.last_name,
		verified:   false,
	};

	otp_store.put(&request.email, &entry).await?;

	mailer.send_otp_code(&request.email, &request.first_name, &code).await?;

	info!("sent verification code to {}", request.email);

	let response = SendOtpResponse {
		message:    "verification code sent".to_string(),
		email:      request.email,
		expires_in: OTP_TTL_SECONDS,
	};

	Ok((StatusCode::OK, Json(response)))
}

/// Check a verification code and mark the email as verified
#[instrument(skip(otp_store, request))]
pub(crate) async fn verify_otp(
	State(otp_store): State<OtpStore>,
	Json(request): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let Some(entry) = otp_store.get(&request.email).await? else {
		return Err(OtpError::Expired.into());
	};

	if entry.code != request.otp {
		return Err(OtpError::Invalid.into());
	}

	// The verified flag rides on the same entry, with a fresh TTL
	let entry = OtpEntry { verified: true, ..entry };
	otp_store.put(&request.email, &entry).await?;

	info!("verified booking contact {}", request.email);

	let response = VerifyOtpResponse {
		message:    "email verified".to_string(),
		email:      request.email,
		first_name: entry.first_name,
		last_name:  entry.last_name,
		verified:   true,
	};

	Ok((StatusCode::OK, Json(response)))
}

/// Create a pending reservation for a verified contact
#[instrument(skip(pool, config, otp_store, mailer, request))]
pub(crate) async fn create_booking(
	State(pool): State<DbPool>,
	State(config): State<Config>,
	State(otp_store): State<OtpStore>,
	State(mailer): State<Mailer>,
	Json(request): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	otp_store.get_verified(&request.email).await?;

	let conn = pool.get().await?;

	let game = Game::get_active(request.game, &conn).await?;

	let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
		.map_err(|_| {
			Error::ValidationError("invalid date, expected YYYY-MM-DD".to_string())
		})?;
	let time =
		NaiveTime::parse_from_str(&request.time, "%H:%M").map_err(|_| {
			Error::ValidationError("invalid time, expected HH:MM".to_string())
		})?;

	let now = config.now_local();

	check_booking_date(date, now.date())?;
	check_release_window(game.available_from, date)?;
	check_player_count(request.players, game.max_players)?;

	let capacities =
		occupied_capacities(&game, date, vec![time], &conn).await?;
	check_slot_capacity(&capacities, request.players)?;

	let user = User::find_or_create(
		NewUser {
			email:      request.email.clone(),
			first_name: Some(request.first_name.clone()),
			last_name:  Some(request.last_name.clone()),
		},
		&conn,
	)
	.await?;

	let reference_number =
		Reservation::generate_reference_number(now.date(), &conn).await?;

	let language = Language::from_query(request.lang.as_deref());

	let reservation = NewReservation {
		user_id: Some(user.id),
		game_id: game.id,
		date,
		time,
		players: request.players,
		total_cents: game.total_price_cents(request.players),
		reference_number,
		email: request.email.clone(),
		phone: request.phone,
		special_requirements: request.special_requirements,
		language,
	}
	.insert(&conn)
	.await?;

	if let Err(e) = mailer
		.send_booking_confirmation(
			&reservation,
			game.title_in(language),
			&request.first_name,
		)
		.await
	{
		warn!(
			"could not send confirmation for {}: {e:?}",
			reservation.reference_number
		);
	}

	// A verification is good for exactly one booking
	if let Err(e) = otp_store.delete(&request.email).await {
		warn!("could not consume verification for {}: {e:?}", request.email);
	}

	info!(
		"created reservation {} for game {}",
		reservation.reference_number, game.id
	);

	let response = CreateBookingResponse {
		success:     true,
		message:     "booking created".to_string(),
		reservation: ReservationResponse::from_reservation(
			&reservation,
			&game,
			language,
		),
	};

	Ok((StatusCode::CREATED, Json(response)))
}

/// List the reservations made under a verified email, newest first
#[instrument(skip(pool, otp_store))]
pub(crate) async fn get_reservations(
	State(pool): State<DbPool>,
	State(otp_store): State<OtpStore>,
	Query(query): Query<ReservationsQuery>,
) -> Result<impl IntoResponse, Error> {
	otp_store.get_verified(&query.email).await?;

	let conn = pool.get().await?;

	let language = Language::from_query(query.lang.as_deref());
	let reservations = Reservation::for_email(query.email, &conn).await?;

	let response: Vec<ReservationListEntry> = reservations
		.iter()
		.map(|(reservation, game)| {
			ReservationListEntry {
				status:      reservation.status,
				reservation: ReservationResponse::from_reservation(
					reservation,
					game,
					language,
				),
			}
		})
		.collect();

	Ok((StatusCode::OK, Json(response)))
}

fn check_booking_date(date: NaiveDate, today: NaiveDate) -> Result<(), Error> {
	if date < today {
		return Err(BookingError::PastDate.into());
	}

	Ok(())
}

fn check_release_window(
	available_from: Option<NaiveDateTime>,
	date: NaiveDate,
) -> Result<(), Error> {
	if let Some(from) = not_yet_available(available_from, date) {
		return Err(BookingError::NotReleasedYet(from).into());
	}

	Ok(())
}

fn check_player_count(players: i32, max_players: i32) -> Result<(), Error> {
	if players > max_players {
		return Err(BookingError::TooManyPlayers(max_players).into());
	}

	Ok(())
}

fn check_slot_capacity(
	capacities: &[SlotCapacity],
	players: i32,
) -> Result<(), Error> {
	let available = capacities.first().map_or(0, |slot| slot.available_capacity);

	if players > available {
		return Err(BookingError::SlotFull(available).into());
	}

	Ok(())
}
