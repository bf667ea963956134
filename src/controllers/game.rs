//! Controllers for [`Game`]s and their bookable time slots

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, NaiveTime};

use crate::error::Error;
use crate::models::{Game, Language, Reservation};
use crate::schemas::availability::{
	AvailabilityErrorResponse,
	AvailabilityQuery,
	AvailableTimesResponse,
	TimeSlotResponse,
};
use crate::schemas::game::{
	ChoiceResponse,
	GameResponse,
	GamesQuery,
	LanguageQuery,
};
use crate::slots::{
	SlotCapacity,
	filter_past_slots,
	generate_time_slots,
	not_yet_available,
	slot_capacities,
};
use crate::{Config, DbConn, DbPool};

/// Get all active games, featured ones first
#[instrument(skip(pool))]
pub(crate) async fn get_games(
	State(pool): State<DbPool>,
	Query(query): Query<GamesQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let language = Language::from_query(query.lang.as_deref());
	let games = Game::get_all_active(query.category, &conn).await?;

	let response: Vec<GameResponse> =
		games.iter().map(|g| GameResponse::from_game(g, language)).collect();

	Ok((StatusCode::OK, Json(response)))
}

/// Get all active featured games
#[instrument(skip(pool))]
pub(crate) async fn get_featured_games(
	State(pool): State<DbPool>,
	Query(query): Query<LanguageQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let language = Language::from_query(query.lang.as_deref());
	let games = Game::get_featured(&conn).await?;

	let response: Vec<GameResponse> =
		games.iter().map(|g| GameResponse::from_game(g, language)).collect();

	Ok((StatusCode::OK, Json(response)))
}

/// Get a single active game
#[instrument(skip(pool))]
pub(crate) async fn get_game(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
	Query(query): Query<LanguageQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let language = Language::from_query(query.lang.as_deref());
	let game = Game::get_active(id, &conn).await?;

	Ok((StatusCode::OK, Json(GameResponse::from_game(&game, language))))
}

/// List the game categories a client can filter on
pub(crate) async fn get_game_categories() -> Json<Vec<ChoiceResponse>> {
	Json(ChoiceResponse::categories())
}

/// List the difficulty levels games are rated with
pub(crate) async fn get_game_difficulties() -> Json<Vec<ChoiceResponse>> {
	Json(ChoiceResponse::difficulties())
}

/// Get the slot capacity table for a game on a date
///
/// Failures reply with this endpoint's own `{error, time_slots: []}` envelope
/// instead of the shared error format, clients key on `time_slots` always
/// being present.
#[instrument(skip(pool, config))]
pub(crate) async fn get_available_times(
	State(pool): State<DbPool>,
	State(config): State<Config>,
	Query(query): Query<AvailabilityQuery>,
) -> Result<Response, Error> {
	let conn = pool.get().await?;

	// The game is looked up before the date is parsed so that an unknown
	// game reports as such even alongside a garbage date
	let Some(game) = Game::find_active(query.game_id, &conn).await? else {
		return Ok(unavailable("Game not found"));
	};

	let Ok(date) = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") else {
		return Ok(unavailable("Invalid date format. Use YYYY-MM-DD"));
	};

	let now = config.now_local();

	if date < now.date() {
		return Ok(unavailable("Cannot book for past dates"));
	}

	if let Some(from) = not_yet_available(game.available_from, date) {
		return Ok(unavailable(format!(
			"Game available from {}",
			from.format("%Y-%m-%d %H:%M")
		)));
	}

	let mut slots = generate_time_slots(
		game.working_hours_start,
		game.working_hours_end,
		game.duration_minutes,
	);

	if date == now.date() {
		slots = filter_past_slots(slots, now.time());
	}

	let capacities = occupied_capacities(&game, date, slots, &conn).await?;

	let language = Language::from_query(query.lang.as_deref());

	let response = AvailableTimesResponse {
		game_title:  game.title_in(language).to_string(),
		date:        query.date,
		time_slots:  capacities.into_iter().map(TimeSlotResponse::from).collect(),
		duration:    game.duration_minutes,
		max_players: game.max_players,
	};

	Ok((StatusCode::OK, Json(response)).into_response())
}

fn unavailable(message: impl Into<String>) -> Response {
	(
		StatusCode::BAD_REQUEST,
		Json(AvailabilityErrorResponse::new(message)),
	)
		.into_response()
}

/// Compute the occupancy table for a set of candidate slots
///
/// Reservations on the following date are only consulted when the working
/// hours cross midnight, a late slot can then collide with an early
/// reservation of the next day.
pub(crate) async fn occupied_capacities(
	game: &Game,
	date: NaiveDate,
	slots: Vec<NaiveTime>,
	conn: &DbConn,
) -> Result<Vec<SlotCapacity>, Error> {
	let same_day = Reservation::occupancy_for_date(game.id, date, conn).await?;

	let next_day = if game.working_hours_end == NaiveTime::MIN
		&& let Some(next_date) = date.succ_opt()
	{
		Reservation::occupancy_for_date(game.id, next_date, conn).await?
	} else {
		vec![]
	};

	Ok(slot_capacities(
		&slots,
		game.duration_minutes,
		game.max_players,
		&same_day,
		&next_day,
	))
}
