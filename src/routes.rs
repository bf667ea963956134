use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::controllers::billing::{
	create_payment,
	payment_success,
	stripe_webhook,
};
use crate::controllers::booking::{
	create_booking,
	get_reservations,
	send_otp,
	verify_otp,
};
use crate::controllers::contact::get_contact_info;
use crate::controllers::game::{
	get_available_times,
	get_featured_games,
	get_game,
	get_game_categories,
	get_game_difficulties,
	get_games,
};
use crate::controllers::healthcheck;

/// Get the app router
pub fn get_app_router(state: AppState) -> Router {
	let api_routes = Router::new()
		.nest("/games", game_routes())
		.nest("/reservations", reservation_routes())
		.nest("/billing", billing_routes())
		.nest("/contacts", contact_routes());

	Router::new()
		.route("/healthcheck", get(healthcheck))
		.nest("/api", api_routes)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(10)))
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}

/// Game catalog, availability and booking routes
fn game_routes() -> Router<AppState> {
	Router::new()
		.route("/", get(get_games))
		.route("/featured", get(get_featured_games))
		.route("/categories", get(get_game_categories))
		.route("/difficulties", get(get_game_difficulties))
		.route("/available-times", get(get_available_times))
		.route("/send-otp", post(send_otp))
		.route("/verify-otp", post(verify_otp))
		.route("/create", post(create_booking))
		.route("/{id}", get(get_game))
}

/// Reservation listing routes
fn reservation_routes() -> Router<AppState> {
	Router::new().route("/", get(get_reservations))
}

/// Invoice, payment and webhook routes
fn billing_routes() -> Router<AppState> {
	Router::new()
		.route("/create-payment", post(create_payment))
		.route("/payment-success", get(payment_success))
		.route("/webhooks/stripe", post(stripe_webhook))
}

/// Contact card routes
fn contact_routes() -> Router<AppState> {
	Router::new().route("/", get(get_contact_info))
}
