use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use diesel::pg::Pg;
use diesel::prelude::*;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::invoice;
use crate::{DbConn, Error};

/// A billing record owning one or more payment attempts
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = invoice)]
#[diesel(check_for_backend(Pg))]
pub struct Invoice {
	pub id:             Uuid,
	pub invoice_id:     String,
	pub user_id:        Option<i32>,
	pub reservation_id: Option<i32>,
	pub currency:       String,
	pub total_cents:    i32,
	pub payment_method: Option<String>,
	pub callback_url:   Option<String>,
	pub cancel_url:     Option<String>,
	pub invoice_date:   NaiveDate,
	pub created_at:     NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = invoice)]
pub struct NewInvoice {
	pub id:             Uuid,
	pub invoice_id:     String,
	pub user_id:        Option<i32>,
	pub reservation_id: Option<i32>,
	pub currency:       String,
	pub total_cents:    i32,
	pub callback_url:   Option<String>,
	pub cancel_url:     Option<String>,
	pub invoice_date:   NaiveDate,
}

impl NewInvoice {
	/// Insert this [`NewInvoice`] into the database
	///
	/// # Errors
	pub(crate) async fn insert(self, conn: &DbConn) -> Result<Invoice, Error> {
		let invoice = conn
			.interact(|conn| {
				use self::invoice::dsl::*;

				diesel::insert_into(invoice)
					.values(self)
					.returning(Invoice::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(invoice)
	}
}

impl Invoice {
	/// Get an [`Invoice`] given its id
	///
	/// # Errors
	pub(crate) async fn get_by_id(
		query_id: Uuid,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let invoice = conn
			.interact(move |conn| {
				use self::invoice::dsl::*;

				invoice.find(query_id).get_result(conn)
			})
			.await??;

		Ok(invoice)
	}

	/// Get the [`Invoice`] attached to a reservation, if any
	///
	/// # Errors
	pub(crate) async fn find_for_reservation(
		query_reservation_id: i32,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let invoice = conn
			.interact(move |conn| {
				use self::invoice::dsl::*;

				invoice
					.filter(reservation_id.eq(query_reservation_id))
					.first(conn)
					.optional()
			})
			.await??;

		Ok(invoice)
	}

	/// Record which gateway an [`Invoice`] is being settled through
	///
	/// # Errors
	pub(crate) async fn set_payment_method(
		query_id: Uuid,
		method: String,
		conn: &DbConn,
	) -> Result<(), Error> {
		conn.interact(move |conn| {
			use self::invoice::dsl::*;

			diesel::update(invoice.find(query_id))
				.set(payment_method.eq(method))
				.execute(conn)
		})
		.await??;

		Ok(())
	}

	/// Generate a unique human-readable invoice number
	///
	/// The number is built from the month, the two-digit year, the count of
	/// invoices issued this month and a random suffix. A collision bumps the
	/// whole number by one until a free one is found, keeping the printed
	/// width intact.
	///
	/// # Errors
	pub(crate) async fn generate_invoice_id(
		today: NaiveDate,
		conn: &DbConn,
	) -> Result<String, Error> {
		let month_start = today.with_day(1).unwrap_or(today);
		let next_month = month_start + Months::new(1);

		let issued_this_month: i64 = conn
			.interact(move |conn| {
				use self::invoice::dsl::*;

				invoice
					.filter(invoice_date.ge(month_start))
					.filter(invoice_date.lt(next_month))
					.count()
					.get_result(conn)
			})
			.await??;

		let mut candidate = format!(
			"{:02}{:02}{:05}00{}",
			today.month(),
			today.year() % 100,
			issued_this_month + 1,
			rng().random_range(100_000..=999_999),
		);

		loop {
			let taken = conn
				.interact({
					let candidate = candidate.clone();

					move |conn| {
						use self::invoice::dsl::*;

						diesel::select(diesel::dsl::exists(
							invoice.filter(invoice_id.eq(candidate)),
						))
						.get_result::<bool>(conn)
					}
				})
				.await??;

			if !taken {
				return Ok(candidate);
			}

			candidate = bump_invoice_id(&candidate);
		}
	}
}

/// Increment an all-digit invoice number without losing leading zeroes
fn bump_invoice_id(current: &str) -> String {
	let width = current.len();
	let next = current.parse::<u64>().unwrap_or_default() + 1;

	format!("{next:0width$}")
}

#[cfg(test)]
mod tests {
	use super::bump_invoice_id;

	#[test]
	fn bumping_keeps_the_printed_width() {
		assert_eq!(bump_invoice_id("05250000100123456"), "05250000100123457");
		assert_eq!(bump_invoice_id("00099"), "00100");
	}

	#[test]
	fn bumping_carries_over_trailing_nines() {
		assert_eq!(bump_invoice_id("1225000010099999"), "1225000010100000");
	}
}
