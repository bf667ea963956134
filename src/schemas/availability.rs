use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::slots::SlotCapacity;

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AvailabilityQuery {
	#[serde_as(as = "DisplayFromStr")]
	pub game_id: i32,
	pub date:    String,
	pub lang:    Option<String>,
}

/// One bookable slot with its remaining capacity
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TimeSlotResponse {
	pub time:               String,
	pub used_capacity:      i32,
	pub available_capacity: i32,
	pub max_capacity:       i32,
	pub available:          bool,
}

impl From<SlotCapacity> for TimeSlotResponse {
	fn from(slot: SlotCapacity) -> Self {
		Self {
			time:               slot.time.format("%H:%M").to_string(),
			used_capacity:      slot.used_capacity,
			available_capacity: slot.available_capacity,
			max_capacity:       slot.max_capacity,
			available:          slot.available,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AvailableTimesResponse {
	pub game_title:  String,
	pub date:        String,
	pub time_slots:  Vec<TimeSlotResponse>,
	pub duration:    i32,
	pub max_players: i32,
}

/// The error envelope this endpoint has always used
///
/// Clients rely on `time_slots` being present and empty on failures, so
/// these errors do not go through the shared error response.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AvailabilityErrorResponse {
	pub error:      String,
	pub time_slots: Vec<TimeSlotResponse>,
}

impl AvailabilityErrorResponse {
	#[must_use]
	pub fn new(message: impl Into<String>) -> Self {
		Self { error: message.into(), time_slots: Vec::new() }
	}
}
