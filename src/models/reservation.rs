use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};

use super::{Game, Language};
use crate::schema::reservation;
use crate::{DbConn, Error};

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::ReservationStatus"]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
	#[default]
	Pending,
	Confirmed,
	Cancelled,
	Completed,
}

impl ReservationStatus {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Confirmed => "confirmed",
			Self::Cancelled => "cancelled",
			Self::Completed => "completed",
		}
	}
}

/// A single booked slot for a game
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = reservation)]
#[diesel(check_for_backend(Pg))]
pub struct Reservation {
	pub id:                   i32,
	pub user_id:              Option<i32>,
	pub game_id:              i32,
	pub date:                 NaiveDate,
	pub time:                 NaiveTime,
	pub players:              i32,
	pub total_cents:          i32,
	pub status:               ReservationStatus,
	pub reference_number:     String,
	pub email:                String,
	pub phone:                Option<String>,
	pub special_requirements: Option<String>,
	pub language:             Language,
	pub created_at:           NaiveDateTime,
	pub updated_at:           NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = reservation)]
pub struct NewReservation {
	pub user_id:              Option<i32>,
	pub game_id:              i32,
	pub date:                 NaiveDate,
	pub time:                 NaiveTime,
	pub players:              i32,
	pub total_cents:          i32,
	pub reference_number:     String,
	pub email:                String,
	pub phone:                Option<String>,
	pub special_requirements: Option<String>,
	pub language:             Language,
}

impl NewReservation {
	/// Insert this [`NewReservation`] into the database
	///
	/// Two bookings racing for the same slot are decided by the unique index
	/// on (game, date, time), the loser gets a conflict error.
	///
	/// # Errors
	pub(crate) async fn insert(self, conn: &DbConn) -> Result<Reservation, Error> {
		let reservation = conn
			.interact(|conn| {
				use self::reservation::dsl::*;

				diesel::insert_into(reservation)
					.values(self)
					.returning(Reservation::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(reservation)
	}
}

impl Reservation {
	/// Get a [`Reservation`] given its id
	///
	/// # Errors
	pub(crate) async fn get_by_id(
		query_id: i32,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let reservation = conn
			.interact(move |conn| {
				use self::reservation::dsl::*;

				reservation.find(query_id).first(conn).optional()
			})
			.await??;

		reservation
			.ok_or_else(|| Error::NotFound("reservation not found".to_string()))
	}

	/// Get all [`Reservation`]s made under a given email with their games,
	/// newest first
	///
	/// # Errors
	pub(crate) async fn for_email(
		query_email: String,
		conn: &DbConn,
	) -> Result<Vec<(Self, Game)>, Error> {
		let reservations = conn
			.interact(|conn| {
				use self::reservation::dsl::*;

				reservation
					.inner_join(crate::schema::game::table)
					.filter(email.eq(query_email))
					.order(created_at.desc())
					.select((Self::as_select(), Game::as_select()))
					.load(conn)
			})
			.await??;

		Ok(reservations)
	}

	/// Get the (start time, players) pairs of every live reservation for a
	/// game on a given date
	///
	/// Cancelled and completed reservations no longer hold capacity.
	///
	/// # Errors
	pub(crate) async fn occupancy_for_date(
		query_game_id: i32,
		query_date: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<(NaiveTime, i32)>, Error> {
		let occupancy = conn
			.interact(move |conn| {
				use self::reservation::dsl::*;

				reservation
					.filter(game_id.eq(query_game_id))
					.filter(date.eq(query_date))
					.filter(status.eq_any(vec![
						ReservationStatus::Pending,
						ReservationStatus::Confirmed,
					]))
					.select((time, players))
					.load(conn)
			})
			.await??;

		Ok(occupancy)
	}

	/// Transition a pending [`Reservation`] to confirmed
	///
	/// Reservations in any other state are left untouched.
	///
	/// # Errors
	pub(crate) async fn confirm(
		query_id: i32,
		conn: &DbConn,
	) -> Result<(), Error> {
		conn.interact(move |conn| {
			use self::reservation::dsl::*;

			diesel::update(
				reservation
					.filter(id.eq(query_id))
					.filter(status.eq(ReservationStatus::Pending)),
			)
			.set(status.eq(ReservationStatus::Confirmed))
			.execute(conn)
		})
		.await??;

		Ok(())
	}

	/// Generate a reference number no existing reservation uses
	///
	/// # Errors
	pub(crate) async fn generate_reference_number(
		today: NaiveDate,
		conn: &DbConn,
	) -> Result<String, Error> {
		loop {
			let number = rng().random_range(100_000..=999_999);
			let candidate = format!("R{}-{number}", today.format("%y%m%d"));

			let taken = conn
				.interact({
					let candidate = candidate.clone();

					move |conn| {
						use self::reservation::dsl::*;

						diesel::select(diesel::dsl::exists(
							reservation
								.filter(reference_number.eq(candidate)),
						))
						.get_result::<bool>(conn)
					}
				})
				.await??;

			if !taken {
				return Ok(candidate);
			}
		}
	}
}
