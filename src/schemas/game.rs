use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{
	Game,
	GameCategory,
	GameDifficulty,
	GameStatus,
	Language,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GamesQuery {
	pub lang:     Option<String>,
	pub category: Option<GameCategory>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LanguageQuery {
	pub lang: Option<String>,
}

/// A game with its localized texts resolved to plain strings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GameResponse {
	pub id:                  i32,
	pub title:               String,
	pub description:         String,
	pub category:            GameCategory,
	pub difficulty:          GameDifficulty,
	pub status:              GameStatus,
	pub price_cents:         i32,
	pub max_players:         i32,
	pub duration_minutes:    i32,
	pub working_hours_start: String,
	pub working_hours_end:   String,
	pub available_from:      Option<NaiveDateTime>,
	pub is_featured:         bool,
}

impl GameResponse {
	#[must_use]
	pub fn from_game(game: &Game, language: Language) -> Self {
		Self {
			id:                  game.id,
			title:               game.title.resolve(language).to_string(),
			description:         game.description.resolve(language).to_string(),
			category:            game.category,
			difficulty:          game.difficulty,
			status:              game.status,
			price_cents:         game.price_cents,
			max_players:         game.max_players,
			duration_minutes:    game.duration_minutes,
			working_hours_start: game
				.working_hours_start
				.format("%H:%M")
				.to_string(),
			working_hours_end:   game
				.working_hours_end
				.format("%H:%M")
				.to_string(),
			available_from:      game.available_from,
			is_featured:         game.is_featured,
		}
	}
}

/// One entry of the category/difficulty listings
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ChoiceResponse {
	pub value: &'static str,
	pub label: &'static str,
}

impl ChoiceResponse {
	#[must_use]
	pub fn categories() -> Vec<Self> {
		GameCategory::ALL
			.iter()
			.map(|c| Self { value: c.code(), label: c.label() })
			.collect()
	}

	#[must_use]
	pub fn difficulties() -> Vec<Self> {
		GameDifficulty::ALL
			.iter()
			.map(|d| Self { value: d.code(), label: d.label() })
			.collect()
	}
}
