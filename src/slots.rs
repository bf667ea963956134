//! Time slot generation and per-slot capacity accounting

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// One candidate slot with its occupancy numbers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotCapacity {
	pub time:               NaiveTime,
	pub used_capacity:      i32,
	pub available_capacity: i32,
	pub max_capacity:       i32,
	pub available:          bool,
}

/// Generate the bookable round-hour start times for a working-hours window
///
/// An end time of 00:00 means midnight of the following day. The first
/// candidate is the start time rounded up to the next full hour; a candidate
/// is kept only if a game started there still finishes within the window.
#[must_use]
pub fn generate_time_slots(
	start: NaiveTime,
	end: NaiveTime,
	duration_minutes: i32,
) -> Vec<NaiveTime> {
	// Slots are date-independent, any anchor day works
	let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();

	let end_dt = if end == NaiveTime::MIN {
		base.succ_opt().unwrap().and_time(NaiveTime::MIN)
	} else {
		base.and_time(end)
	};

	let duration = TimeDelta::minutes(i64::from(duration_minutes));

	let mut current_hour = i64::from(start.hour());
	if start.minute() > 0 {
		current_hour += 1;
	}

	let mut slots = vec![];

	loop {
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let display_hour = (current_hour % 24) as u32;
		let slot_time = NaiveTime::from_hms_opt(display_hour, 0, 0).unwrap();

		// The candidate lands on the next day once the hour counter wraps
		let slot_dt = if current_hour >= 24 {
			base.succ_opt().unwrap().and_time(slot_time)
		} else {
			base.and_time(slot_time)
		};

		if slot_dt >= end_dt {
			break;
		}

		if slot_dt + duration <= end_dt {
			slots.push(slot_time);
		}

		current_hour += 1;
	}

	slots
}

/// Drop slots whose hour already started in the business timezone
///
/// Only applied when the requested date is the current local date. The
/// current hour itself survives only if no minutes have passed yet.
#[must_use]
pub fn filter_past_slots(
	slots: Vec<NaiveTime>,
	now_local: NaiveTime,
) -> Vec<NaiveTime> {
	let mut threshold = i64::from(now_local.hour());
	if now_local.minute() > 0 {
		threshold += 1;
	}

	slots.into_iter().filter(|slot| i64::from(slot.hour()) >= threshold).collect()
}

/// Return the release moment blocking a date, if any
///
/// Pre-reservation games compare the release moment against midnight of the
/// requested date, a date only opens up once the release moment has passed
#[must_use]
pub fn not_yet_available(
	available_from: Option<NaiveDateTime>,
	date: NaiveDate,
) -> Option<NaiveDateTime> {
	available_from.filter(|from| date.and_time(NaiveTime::MIN) < *from)
}

/// Compute the occupancy table for a list of candidate slots
///
/// A slot occupies `[slot, slot + duration)`; a reservation occupies the same
/// sized window anchored at its own start time, with next-day reservations
/// shifted a full day forward. Any strict overlap counts the reservation's
/// players against the slot.
#[must_use]
pub fn slot_capacities(
	slots: &[NaiveTime],
	duration_minutes: i32,
	max_players: i32,
	same_day: &[(NaiveTime, i32)],
	next_day: &[(NaiveTime, i32)],
) -> Vec<SlotCapacity> {
	let duration = i64::from(duration_minutes);

	let mut windows = Vec::with_capacity(same_day.len() + next_day.len());

	for (start, players) in same_day {
		let start = minutes_from_midnight(*start);
		windows.push((start, start + duration, *players));
	}

	for (start, players) in next_day {
		let start = minutes_from_midnight(*start) + MINUTES_PER_DAY;
		windows.push((start, start + duration, *players));
	}

	slots
		.iter()
		.map(|&slot| {
			let slot_start = minutes_from_midnight(slot);
			let slot_end = slot_start + duration;

			let used_capacity: i32 = windows
				.iter()
				.filter(|(r_start, r_end, _)| {
					slot_start < *r_end && slot_end > *r_start
				})
				.map(|(_, _, players)| players)
				.sum();

			let available_capacity = (max_players - used_capacity).max(0);

			SlotCapacity {
				time: slot,
				used_capacity,
				available_capacity,
				max_capacity: max_players,
				available: available_capacity > 0,
			}
		})
		.collect()
}

fn minutes_from_midnight(time: NaiveTime) -> i64 {
	i64::from(time.hour()) * 60 + i64::from(time.minute())
}

#[cfg(test)]
mod tests {
	use chrono::{NaiveDate, NaiveTime};

	use super::{
		filter_past_slots,
		generate_time_slots,
		not_yet_available,
		slot_capacities,
	};

	fn t(hour: u32, minute: u32) -> NaiveTime {
		NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
	}

	#[test]
	fn slots_start_at_the_next_round_hour() {
		let slots = generate_time_slots(t(9, 30), t(22, 0), 60);

		assert_eq!(slots.first(), Some(&t(10, 0)));
		assert_eq!(slots.last(), Some(&t(21, 0)));
	}

	#[test]
	fn every_slot_fits_before_closing() {
		let slots = generate_time_slots(t(10, 0), t(22, 0), 90);

		// 21:00 would finish at 22:30
		assert_eq!(slots.last(), Some(&t(20, 0)));
		assert_eq!(slots.len(), 11);
	}

	#[test]
	fn a_midnight_close_means_the_next_day() {
		let slots = generate_time_slots(t(10, 0), t(0, 0), 90);

		assert_eq!(slots.first(), Some(&t(10, 0)));
		assert_eq!(slots.last(), Some(&t(22, 0)));
		assert_eq!(slots.len(), 13);
	}

	#[test]
	fn a_window_too_small_for_the_game_yields_nothing() {
		let slots = generate_time_slots(t(10, 30), t(11, 30), 90);

		assert!(slots.is_empty());
	}

	#[test]
	fn the_today_filter_drops_started_hours() {
		let slots = vec![t(10, 0), t(11, 0), t(12, 0), t(13, 0)];

		// Minutes past the hour push the threshold to the next hour
		let filtered = filter_past_slots(slots.clone(), t(11, 5));
		assert_eq!(filtered, vec![t(12, 0), t(13, 0)]);

		let filtered = filter_past_slots(slots, t(11, 0));
		assert_eq!(filtered, vec![t(11, 0), t(12, 0), t(13, 0)]);
	}

	#[test]
	fn release_moments_block_dates_before_them() {
		let from =
			NaiveDate::from_ymd_opt(2026, 9, 15).unwrap().and_time(t(12, 0));

		let date = |day| NaiveDate::from_ymd_opt(2026, 9, day).unwrap();

		assert_eq!(not_yet_available(Some(from), date(14)), Some(from));
		// Midnight of the release date itself still lies before the moment
		assert_eq!(not_yet_available(Some(from), date(15)), Some(from));
		assert_eq!(not_yet_available(Some(from), date(16)), None);
		assert_eq!(not_yet_available(None, date(14)), None);
	}

	#[test]
	fn overlapping_reservations_consume_capacity() {
		let slots = generate_time_slots(t(10, 0), t(0, 0), 90);
		let same_day = vec![(t(14, 0), 4)];

		let capacities = slot_capacities(&slots, 90, 6, &same_day, &[]);

		let by_time = |time: NaiveTime| {
			capacities.iter().find(|slot| slot.time == time).copied().unwrap()
		};

		let slot = by_time(t(14, 0));
		assert_eq!(slot.used_capacity, 4);
		assert_eq!(slot.available_capacity, 2);
		assert!(slot.available);

		// 15:00-16:30 still overlaps 14:00-15:30
		let slot = by_time(t(15, 0));
		assert_eq!(slot.used_capacity, 4);
		assert_eq!(slot.available_capacity, 2);

		// 13:00-14:30 overlaps from the other side
		let slot = by_time(t(13, 0));
		assert_eq!(slot.used_capacity, 4);

		let slot = by_time(t(16, 0));
		assert_eq!(slot.used_capacity, 0);
		assert_eq!(slot.available_capacity, 6);
	}

	#[test]
	fn adjacent_windows_do_not_overlap() {
		let slots = vec![t(18, 0)];
		let same_day = vec![(t(17, 0), 6), (t(19, 0), 6)];

		let capacities = slot_capacities(&slots, 60, 6, &same_day, &[]);

		assert_eq!(capacities[0].used_capacity, 0);
		assert_eq!(capacities[0].available_capacity, 6);
	}

	#[test]
	fn oversubscribed_slots_clamp_to_zero() {
		let slots = vec![t(18, 0)];
		let same_day = vec![(t(18, 0), 4), (t(18, 0), 3)];

		let capacities = slot_capacities(&slots, 60, 6, &same_day, &[]);

		assert_eq!(capacities[0].used_capacity, 7);
		assert_eq!(capacities[0].available_capacity, 0);
		assert!(!capacities[0].available);
	}

	#[test]
	fn next_day_reservations_are_shifted_a_full_day() {
		let slots = vec![t(23, 0)];
		let bookings = vec![(t(0, 30), 3)];

		// A slot window reaching past midnight collides with an early
		// next-day booking
		let capacities = slot_capacities(&slots, 120, 6, &[], &bookings);
		assert_eq!(capacities[0].used_capacity, 3);

		// The same booking on the same day is long over by 23:00
		let capacities = slot_capacities(&slots, 120, 6, &bookings, &[]);
		assert_eq!(capacities[0].used_capacity, 0);
	}
}
