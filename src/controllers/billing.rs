//! Controllers for invoices, payment attempts and the provider webhook

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::{BillingError, Error, WebhookError};
use crate::gateway::{CheckoutRequest, PaymentGateway, verify_signature};
use crate::models::{
	Game,
	Invoice,
	NewInvoice,
	NewPayment,
	Payment,
	PaymentStatus,
	Reservation,
	ReservationStatus,
};
use crate::otp::OtpStore;
use crate::schemas::billing::{
	CreatePaymentRequest,
	CreatePaymentResponse,
	PaymentSuccessQuery,
	PaymentSuccessResponse,
	WebhookEvent,
};
use crate::{Config, DbConn, DbPool, GatewayConfig};

const CURRENCY: &str = "EUR";

/// Open a hosted-checkout session for a pending reservation
///
/// The reservation's invoice is reused across attempts, every attempt gets
/// its own payment row.
#[instrument(skip(pool, config, otp_store, gateway, request))]
pub(crate) async fn create_payment(
	State(pool): State<DbPool>,
	State(config): State<Config>,
	State(otp_store): State<OtpStore>,
	State(gateway): State<Arc<dyn PaymentGateway>>,
	Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	otp_store.get_verified(&request.email).await?;

	let conn = pool.get().await?;

	let reservation =
		Reservation::get_by_id(request.reservation_id, &conn).await?;

	if reservation.email != request.email {
		return Err(Error::Forbidden);
	}

	if reservation.status != ReservationStatus::Pending {
		return Err(BillingError::NotPayable(
			reservation.status.as_str().to_string(),
		)
		.into());
	}

	let game = Game::get_by_id(reservation.game_id, &conn).await?;

	let invoice =
		match Invoice::find_for_reservation(reservation.id, &conn).await? {
			Some(invoice) => invoice,
			None => {
				let today = config.now_local().date();
				let invoice_id =
					Invoice::generate_invoice_id(today, &conn).await?;

				NewInvoice {
					id: Uuid::new_v4(),
					invoice_id,
					user_id: reservation.user_id,
					reservation_id: Some(reservation.id),
					currency: CURRENCY.to_string(),
					total_cents: reservation.total_cents,
					callback_url: Some(success_url(&config.frontend_url)),
					cancel_url: Some(cancel_url(&config.frontend_url)),
					invoice_date: today,
				}
				.insert(&conn)
				.await?
			},
		};

	// A settled invoice with a still-pending reservation means the confirm
	// step is lagging behind, not that more money is owed
	if Payment::latest_status_for_invoice(invoice.id, &conn).await?
		== Some(PaymentStatus::Completed)
	{
		return Err(BillingError::NotPayable(
			PaymentStatus::Completed.as_str().to_string(),
		)
		.into());
	}

	let payment = NewPayment {
		invoice_id:   invoice.id,
		amount_cents: invoice.total_cents,
		currency:     invoice.currency.clone(),
		gateway:      gateway.name().to_string(),
	}
	.insert(&conn)
	.await?;

	let checkout = CheckoutRequest {
		amount_cents:   payment.amount_cents,
		currency:       payment.currency.clone(),
		customer_email: request.email,
		description:    checkout_description(&game, &reservation),
		payment_id:     payment.id,
		success_url:    invoice
			.callback_url
			.clone()
			.unwrap_or_else(|| success_url(&config.frontend_url)),
		cancel_url:     invoice
			.cancel_url
			.clone()
			.unwrap_or_else(|| cancel_url(&config.frontend_url)),
	};

	let session = match gateway.create_checkout_session(checkout).await {
		Ok(session) => session,
		Err(e) => {
			// The abandoned attempt must not linger as pending
			Payment::mark_failed(payment.id, None, &conn).await?;

			return Err(e.into());
		},
	};

	let payment_url = session.url.clone();

	Payment::set_checkout(payment.id, session.reference, session.url, &conn)
		.await?;

	Invoice::set_payment_method(invoice.id, gateway.name().to_string(), &conn)
		.await?;

	info!(
		"opened checkout session for payment {} on invoice {}",
		payment.id, invoice.invoice_id
	);

	let response = CreatePaymentResponse {
		payment_url,
		invoice_id: invoice.invoice_id,
		payment_id: payment.id,
		reservation_id: reservation.id,
	};

	Ok((StatusCode::OK, Json(response)))
}

/// Reconcile a payment when the customer lands on the success page
///
/// The webhook normally settles first, this endpoint covers deliveries that
/// are delayed or lost. Both paths apply the same transition, whichever runs
/// first wins and the other becomes a no-op.
#[instrument(skip(pool, config, gateway))]
pub(crate) async fn payment_success(
	State(pool): State<DbPool>,
	State(config): State<Config>,
	State(gateway): State<Arc<dyn PaymentGateway>>,
	Query(query): Query<PaymentSuccessQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let payment = Payment::get_by_reference(query.session_id.clone(), &conn)
		.await?
		.ok_or_else(|| Error::NotFound("payment not found".to_string()))?;

	let invoice = Invoice::get_by_id(payment.invoice_id, &conn).await?;

	if payment.status == PaymentStatus::Completed {
		return Ok(success_response(payment.status, invoice.reservation_id));
	}

	let session = gateway.retrieve_session(&query.session_id).await?;

	if !session.paid {
		return Ok(success_response(payment.status, invoice.reservation_id));
	}

	let details = serde_json::json!({
		"source": "payment-success",
		"session_id": query.session_id,
	});

	let status = settle_payment(
		&payment,
		invoice.reservation_id,
		details,
		config.now_local().date(),
		&conn,
	)
	.await?;

	Ok(success_response(status, invoice.reservation_id))
}

/// Receive a provider event, authenticate it and apply its transition
///
/// Nothing is read from the database before the signature checks out. Events
/// that cannot be matched to a payment are acknowledged anyway, the provider
/// would otherwise retry them forever.
#[instrument(skip(pool, config, gateway_config, headers, body))]
pub(crate) async fn stripe_webhook(
	State(pool): State<DbPool>,
	State(config): State<Config>,
	State(gateway_config): State<GatewayConfig>,
	headers: HeaderMap,
	body: String,
) -> Result<impl IntoResponse, Error> {
	let signature = headers
		.get("stripe-signature")
		.and_then(|value| value.to_str().ok())
		.ok_or(WebhookError::MissingSignature)?;

	verify_signature(
		&gateway_config.webhook_secret,
		&body,
		signature,
		Utc::now().timestamp(),
	)?;

	let event: WebhookEvent =
		serde_json::from_str(&body).map_err(|_| WebhookError::MalformedPayload)?;

	match event.kind.as_str() {
		"checkout.session.completed" => {
			let conn = pool.get().await?;
			settle_completed_session(&event, config.now_local().date(), &conn)
				.await?;
		},
		"checkout.session.expired" => {
			let conn = pool.get().await?;
			expire_session(&event, &conn).await?;
		},
		"payment_intent.payment_failed" => {
			let conn = pool.get().await?;
			fail_payment(&event, &conn).await?;
		},
		other => info!("ignoring webhook event type {other}"),
	}

	Ok((StatusCode::OK, Json(serde_json::json!({ "received": true }))))
}

/// Settle the payment a completed checkout session refers to
async fn settle_completed_session(
	event: &WebhookEvent,
	settled_on: NaiveDate,
	conn: &DbConn,
) -> Result<(), Error> {
	let object = &event.data.object;

	let Some(payment) =
		Payment::find_for_event(object.payment_id(), object.id.clone(), conn)
			.await?
	else {
		warn!("completed session {} matches no payment", object.id);
		return Ok(());
	};

	let invoice = Invoice::get_by_id(payment.invoice_id, conn).await?;

	let details = serde_json::json!({
		"source": "webhook",
		"type": event.kind,
		"session_id": object.id,
	});

	settle_payment(&payment, invoice.reservation_id, details, settled_on, conn)
		.await?;

	Ok(())
}

/// Time out the payment of an expired checkout session
async fn expire_session(
	event: &WebhookEvent,
	conn: &DbConn,
) -> Result<(), Error> {
	let object = &event.data.object;

	let Some(payment) =
		Payment::find_for_event(object.payment_id(), object.id.clone(), conn)
			.await?
	else {
		warn!("expired session {} matches no payment", object.id);
		return Ok(());
	};

	if Payment::mark_timeout(payment.id, conn).await?.is_some() {
		info!("payment {} timed out with its checkout session", payment.id);
	}

	Ok(())
}

/// Fail the payment a failed payment intent refers to
///
/// Intents never carry the checkout session id, the payment id planted in
/// the intent metadata is the only usable join key.
async fn fail_payment(event: &WebhookEvent, conn: &DbConn) -> Result<(), Error> {
	let object = &event.data.object;

	let Some(payment) =
		Payment::find_for_event(object.payment_id(), object.id.clone(), conn)
			.await?
	else {
		warn!("failed intent {} matches no payment", object.id);
		return Ok(());
	};

	let details = serde_json::json!({
		"source": "webhook",
		"type": event.kind,
		"intent_id": object.id,
	});

	if Payment::mark_failed(payment.id, Some(details), conn).await?.is_some() {
		info!("payment {} failed at the provider", payment.id);
	}

	Ok(())
}

/// Apply the completed transition to a payment and confirm its reservation
///
/// The status filter inside [`Payment::complete`] makes the first settle
/// win, replays and the success-page race come back as no-ops.
async fn settle_payment(
	payment: &Payment,
	reservation_id: Option<i32>,
	details: serde_json::Value,
	settled_on: NaiveDate,
	conn: &DbConn,
) -> Result<PaymentStatus, Error> {
	let Some(completed) =
		Payment::complete(payment.id, settled_on, details, conn).await?
	else {
		info!("payment {} already settled", payment.id);

		return Ok(PaymentStatus::Completed);
	};

	if let Some(reservation_id) = reservation_id {
		Reservation::confirm(reservation_id, conn).await?;
	}

	info!("settled payment {} on invoice {}", completed.id, completed.invoice_id);

	Ok(completed.status)
}

fn success_response(
	status: PaymentStatus,
	reservation_id: Option<i32>,
) -> (StatusCode, Json<PaymentSuccessResponse>) {
	let response = PaymentSuccessResponse {
		success: status == PaymentStatus::Completed,
		status,
		reservation_id,
	};

	(StatusCode::OK, Json(response))
}

fn checkout_description(game: &Game, reservation: &Reservation) -> String {
	format!(
		"{} - {} at {}",
		game.title_in(reservation.language),
		reservation.date.format("%Y-%m-%d"),
		reservation.time.format("%H:%M"),
	)
}

/// Where the provider sends the customer after paying; the provider itself
/// substitutes the session id placeholder
fn success_url(frontend_url: &str) -> String {
	format!("{frontend_url}/payment-success?session_id={{CHECKOUT_SESSION_ID}}")
}

fn cancel_url(frontend_url: &str) -> String {
	format!("{frontend_url}/payment-cancelled")
}
