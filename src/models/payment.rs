use chrono::{NaiveDate, NaiveDateTime};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::payment;
use crate::{DbConn, Error};

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::PaymentStatus"]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
	#[default]
	Pending,
	Receivable,
	Failed,
	Timeout,
	Completed,
	Cancelled,
	Refunded,
	Reversed,
}

impl PaymentStatus {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Receivable => "receivable",
			Self::Failed => "failed",
			Self::Timeout => "timeout",
			Self::Completed => "completed",
			Self::Cancelled => "cancelled",
			Self::Refunded => "refunded",
			Self::Reversed => "reversed",
		}
	}
}

/// A single attempt at settling an invoice
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = payment)]
#[diesel(check_for_backend(Pg))]
pub struct Payment {
	pub id:           i32,
	pub invoice_id:   Uuid,
	pub amount_cents: i32,
	pub currency:     String,
	pub gateway:      String,
	pub reference:    Option<String>,
	pub url:          Option<String>,
	pub status:       PaymentStatus,
	pub details:      Option<serde_json::Value>,
	pub paid_date:    Option<NaiveDate>,
	pub created_at:   NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = payment)]
pub struct NewPayment {
	pub invoice_id:   Uuid,
	pub amount_cents: i32,
	pub currency:     String,
	pub gateway:      String,
}

impl NewPayment {
	/// Insert this [`NewPayment`] into the database
	///
	/// # Errors
	pub(crate) async fn insert(self, conn: &DbConn) -> Result<Payment, Error> {
		let payment = conn
			.interact(|conn| {
				use self::payment::dsl::*;

				diesel::insert_into(payment)
					.values(self)
					.returning(Payment::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(payment)
	}
}

impl Payment {
	/// Get a [`Payment`] given the session reference handed out by the
	/// gateway
	///
	/// # Errors
	pub(crate) async fn get_by_reference(
		session_reference: String,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let payment = conn
			.interact(|conn| {
				use self::payment::dsl::*;

				payment
					.filter(reference.eq(session_reference))
					.first(conn)
					.optional()
			})
			.await??;

		Ok(payment)
	}

	/// Find the [`Payment`] a provider event refers to
	///
	/// The payment id embedded in the event metadata wins over the session
	/// reference, a session recreated for a retried payment keeps pointing at
	/// the right row through its metadata.
	///
	/// # Errors
	pub(crate) async fn find_for_event(
		metadata_id: Option<i32>,
		session_reference: String,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let payment = conn
			.interact(move |conn| {
				use self::payment::dsl::*;

				if let Some(metadata_id) = metadata_id {
					let found: Option<Payment> =
						payment.find(metadata_id).first(conn).optional()?;

					if found.is_some() {
						return Ok(found);
					}
				}

				payment
					.filter(reference.eq(session_reference))
					.first(conn)
					.optional()
			})
			.await??;

		Ok(payment)
	}

	/// Store the checkout session a [`Payment`] is being settled through
	///
	/// # Errors
	pub(crate) async fn set_checkout(
		query_id: i32,
		session_reference: String,
		checkout_url: String,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let payment = conn
			.interact(move |conn| {
				use self::payment::dsl::*;

				diesel::update(payment.find(query_id))
					.set((
						reference.eq(session_reference),
						url.eq(checkout_url),
					))
					.returning(Payment::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(payment)
	}

	/// Transition a [`Payment`] to completed
	///
	/// Returns [`None`] if the payment was already completed, replayed
	/// provider events make no further changes.
	///
	/// # Errors
	pub(crate) async fn complete(
		query_id: i32,
		settled_on: NaiveDate,
		event_details: serde_json::Value,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let payment = conn
			.interact(move |conn| {
				use self::payment::dsl::*;

				diesel::update(
					payment
						.filter(id.eq(query_id))
						.filter(status.ne(PaymentStatus::Completed)),
				)
				.set((
					status.eq(PaymentStatus::Completed),
					paid_date.eq(Some(settled_on)),
					details.eq(Some(event_details)),
				))
				.returning(Payment::as_returning())
				.get_result(conn)
				.optional()
			})
			.await??;

		Ok(payment)
	}

	/// Transition a pending [`Payment`] to timeout after its checkout
	/// session expired
	///
	/// # Errors
	pub(crate) async fn mark_timeout(
		query_id: i32,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let payment = conn
			.interact(move |conn| {
				use self::payment::dsl::*;

				diesel::update(
					payment
						.filter(id.eq(query_id))
						.filter(status.eq(PaymentStatus::Pending)),
				)
				.set(status.eq(PaymentStatus::Timeout))
				.returning(Payment::as_returning())
				.get_result(conn)
				.optional()
			})
			.await??;

		Ok(payment)
	}

	/// Transition a pending [`Payment`] to failed
	///
	/// # Errors
	pub(crate) async fn mark_failed(
		query_id: i32,
		event_details: Option<serde_json::Value>,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let payment = conn
			.interact(move |conn| {
				use self::payment::dsl::*;

				diesel::update(
					payment
						.filter(id.eq(query_id))
						.filter(status.eq(PaymentStatus::Pending)),
				)
				.set((
					status.eq(PaymentStatus::Failed),
					details.eq(event_details),
				))
				.returning(Payment::as_returning())
				.get_result(conn)
				.optional()
			})
			.await??;

		Ok(payment)
	}

	/// The status of the most recent [`Payment`] on an invoice
	///
	/// # Errors
	pub(crate) async fn latest_status_for_invoice(
		query_invoice_id: Uuid,
		conn: &DbConn,
	) -> Result<Option<PaymentStatus>, Error> {
		let latest = conn
			.interact(move |conn| {
				use self::payment::dsl::*;

				payment
					.filter(invoice_id.eq(query_invoice_id))
					.order((created_at.desc(), id.desc()))
					.select(status)
					.first(conn)
					.optional()
			})
			.await??;

		Ok(latest)
	}
}
