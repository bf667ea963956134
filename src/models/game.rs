use chrono::{NaiveDateTime, NaiveTime};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use super::{Language, LocalizedText};
use crate::schema::game;
use crate::{DbConn, Error};

#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[ExistingTypePath = "crate::schema::sql_types::GameCategory"]
#[serde(rename_all = "snake_case")]
pub enum GameCategory {
	Escape,
	Adventure,
	Puzzle,
	Horror,
	Team,
}

impl GameCategory {
	pub const ALL: [Self; 5] =
		[Self::Escape, Self::Adventure, Self::Puzzle, Self::Horror, Self::Team];

	#[must_use]
	pub fn code(self) -> &'static str {
		match self {
			Self::Escape => "escape",
			Self::Adventure => "adventure",
			Self::Puzzle => "puzzle",
			Self::Horror => "horror",
			Self::Team => "team",
		}
	}

	#[must_use]
	pub fn label(self) -> &'static str {
		match self {
			Self::Escape => "Escape",
			Self::Adventure => "Adventure",
			Self::Puzzle => "Puzzle",
			Self::Horror => "Horror",
			Self::Team => "Team",
		}
	}
}

#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[ExistingTypePath = "crate::schema::sql_types::GameDifficulty"]
#[serde(rename_all = "snake_case")]
pub enum GameDifficulty {
	Easy,
	Medium,
	Hard,
}

impl GameDifficulty {
	pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

	#[must_use]
	pub fn code(self) -> &'static str {
		match self {
			Self::Easy => "easy",
			Self::Medium => "medium",
			Self::Hard => "hard",
		}
	}

	#[must_use]
	pub fn label(self) -> &'static str {
		match self {
			Self::Easy => "Easy",
			Self::Medium => "Medium",
			Self::Hard => "Hard",
		}
	}
}

#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[ExistingTypePath = "crate::schema::sql_types::GameStatus"]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
	AvailableNow,
	PreReservation,
}

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::TranslationStatus"]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
	#[default]
	Pending,
	Processing,
	Completed,
	Failed,
}

/// A single bookable game room
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = game)]
#[diesel(check_for_backend(Pg))]
pub struct Game {
	pub id:                  i32,
	pub title:               LocalizedText,
	pub description:         LocalizedText,
	pub category:            GameCategory,
	pub difficulty:          GameDifficulty,
	pub status:              GameStatus,
	pub translation_status:  TranslationStatus,
	pub price_cents:         i32,
	pub max_players:         i32,
	pub duration_minutes:    i32,
	pub working_hours_start: NaiveTime,
	pub working_hours_end:   NaiveTime,
	pub available_from:      Option<NaiveDateTime>,
	pub is_featured:         bool,
	pub is_active:           bool,
	pub created_at:          NaiveDateTime,
	pub updated_at:          NaiveDateTime,
}

impl Game {
	/// Find an active [`Game`] given its id
	///
	/// # Errors
	pub(crate) async fn find_active(
		query_id: i32,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let game = conn
			.interact(move |conn| {
				use self::game::dsl::*;

				game.find(query_id)
					.filter(is_active.eq(true))
					.first(conn)
					.optional()
			})
			.await??;

		Ok(game)
	}

	/// Get an active [`Game`] given its id
	///
	/// # Errors
	pub(crate) async fn get_active(
		query_id: i32,
		conn: &DbConn,
	) -> Result<Self, Error> {
		Self::find_active(query_id, conn)
			.await?
			.ok_or_else(|| Error::NotFound("game not found".to_string()))
	}

	/// Get a [`Game`] given its id, active or not
	///
	/// Reservations on a deactivated game still need their game for billing.
	///
	/// # Errors
	pub(crate) async fn get_by_id(
		query_id: i32,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let game = conn
			.interact(move |conn| {
				use self::game::dsl::*;

				game.find(query_id).first(conn).optional()
			})
			.await??;

		game.ok_or_else(|| Error::NotFound("game not found".to_string()))
	}

	/// Get all active [`Game`]s, featured ones first
	///
	/// # Errors
	pub(crate) async fn get_all_active(
		filter_category: Option<GameCategory>,
		conn: &DbConn,
	) -> Result<Vec<Self>, Error> {
		let games = conn
			.interact(move |conn| {
				use self::game::dsl::*;

				let mut query = game.filter(is_active.eq(true)).into_boxed();

				if let Some(filter_category) = filter_category {
					query = query.filter(category.eq(filter_category));
				}

				query
					.order((is_featured.desc(), category.asc(), id.asc()))
					.load(conn)
			})
			.await??;

		Ok(games)
	}

	/// Get all active featured [`Game`]s
	///
	/// # Errors
	pub(crate) async fn get_featured(conn: &DbConn) -> Result<Vec<Self>, Error> {
		let games = conn
			.interact(|conn| {
				use self::game::dsl::*;

				game.filter(is_active.eq(true))
					.filter(is_featured.eq(true))
					.order(id.asc())
					.load(conn)
			})
			.await??;

		Ok(games)
	}

	/// The price of a booking for a party of the given size
	///
	/// Team games carry a flat price, every other category is priced per
	/// player.
	#[must_use]
	pub fn total_price_cents(&self, players: i32) -> i32 {
		match self.category {
			GameCategory::Team => self.price_cents,
			_ => self.price_cents * players,
		}
	}

	#[must_use]
	pub fn title_in(&self, language: Language) -> &str {
		self.title.resolve(language)
	}
}
