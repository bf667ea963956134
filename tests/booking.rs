use axum::http::StatusCode;
use questbook::schemas::booking::{CreateBookingRequest, SendOtpRequest};

mod common;

use common::TestEnv;

fn booking_request(email: &str) -> CreateBookingRequest {
	CreateBookingRequest {
		game:                 1,
		date:                 "2030-06-01".to_string(),
		time:                 "18:00".to_string(),
		players:              4,
		special_requirements: None,
		email:                email.to_string(),
		first_name:           "Alice".to_string(),
		last_name:            "Smith".to_string(),
		phone:                None,
		lang:                 None,
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn booking_requires_a_verified_email() {
	let env = TestEnv::new().await;

	let response = env
		.expect_no_mail(async || {
			env.app
				.post("/api/games/create")
				.json(&booking_request("ghost@example.com"))
				.await
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn an_unverified_code_is_not_enough_to_book() {
	let env = TestEnv::new().await;

	env.expect_mail(async || {
		env.app
			.post("/api/games/send-otp")
			.json(&SendOtpRequest {
				email:      "alice@example.com".to_string(),
				first_name: "Alice".to_string(),
				last_name:  "Smith".to_string(),
			})
			.await
	})
	.await;

	let response = env
		.app
		.post("/api/games/create")
		.json(&booking_request("alice@example.com"))
		.await;

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn booking_validates_the_party_size() {
	let env = TestEnv::new().await;

	let mut request = booking_request("alice@example.com");
	request.players = 0;

	let response = env.app.post("/api/games/create").json(&request).await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

	let body = response.text();
	assert!(body.contains("at least one player is required"));
}

#[tokio::test(flavor = "multi_thread")]
async fn booking_validates_the_contact_email() {
	let env = TestEnv::new().await;

	let response = env
		.app
		.post("/api/games/create")
		.json(&booking_request("not-an-email"))
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

	let body = response.text();
	assert!(body.contains("invalid email"));
}

#[tokio::test(flavor = "multi_thread")]
async fn listing_reservations_requires_a_verified_email() {
	let env = TestEnv::new().await;

	let response = env
		.app
		.get("/api/reservations")
		.add_query_param("email", "ghost@example.com")
		.await;

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
