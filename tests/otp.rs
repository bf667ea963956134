use axum::http::StatusCode;
use questbook::otp::OTP_TTL_SECONDS;
use questbook::schemas::booking::{
	SendOtpRequest,
	SendOtpResponse,
	VerifyOtpRequest,
	VerifyOtpResponse,
};

mod common;

use common::TestEnv;

fn send_request(email: &str) -> SendOtpRequest {
	SendOtpRequest {
		email:      email.to_string(),
		first_name: "Alice".to_string(),
		last_name:  "Smith".to_string(),
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn send_otp_stores_and_mails_a_code() {
	let env = TestEnv::new().await;

	let response = env
		.expect_mail_to(&["alice@example.com"], async || {
			env.app
				.post("/api/games/send-otp")
				.json(&send_request("alice@example.com"))
				.await
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<SendOtpResponse>();
	assert_eq!(body.email, "alice@example.com");
	assert_eq!(body.expires_in, OTP_TTL_SECONDS);

	let entry =
		env.otp_store.get("alice@example.com").await.unwrap().unwrap();
	assert_eq!(entry.code.len(), 6);
	assert_eq!(entry.first_name, "Alice");
	assert!(!entry.verified);
}

#[tokio::test(flavor = "multi_thread")]
async fn send_otp_rejects_an_invalid_email() {
	let env = TestEnv::new().await;

	let response = env
		.expect_no_mail(async || {
			env.app
				.post("/api/games/send-otp")
				.json(&send_request("not-an-email"))
				.await
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_otp_flags_the_email() {
	let env = TestEnv::new().await;

	env.expect_mail(async || {
		env.app
			.post("/api/games/send-otp")
			.json(&send_request("bob@example.com"))
			.await
	})
	.await;

	let code =
		env.otp_store.get("bob@example.com").await.unwrap().unwrap().code;

	let response = env
		.app
		.post("/api/games/verify-otp")
		.json(&VerifyOtpRequest {
			email: "bob@example.com".to_string(),
			otp:   code,
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<VerifyOtpResponse>();
	assert!(body.verified);
	assert_eq!(body.first_name, "Alice");
	assert_eq!(body.last_name, "Smith");

	let entry = env.otp_store.get("bob@example.com").await.unwrap().unwrap();
	assert!(entry.verified);
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_otp_rejects_a_wrong_code() {
	let env = TestEnv::new().await;

	env.expect_mail(async || {
		env.app
			.post("/api/games/send-otp")
			.json(&send_request("carol@example.com"))
			.await
	})
	.await;

	// Codes start at 100000, six zeroes can never match
	let response = env
		.app
		.post("/api/games/verify-otp")
		.json(&VerifyOtpRequest {
			email: "carol@example.com".to_string(),
			otp:   "000000".to_string(),
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

	let entry = env.otp_store.get("carol@example.com").await.unwrap().unwrap();
	assert!(!entry.verified);
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_otp_rejects_an_unknown_email() {
	let env = TestEnv::new().await;

	let response = env
		.app
		.post("/api/games/verify-otp")
		.json(&VerifyOtpRequest {
			email: "nobody@example.com".to_string(),
			otp:   "123456".to_string(),
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_otp_validates_the_code_length() {
	let env = TestEnv::new().await;

	let response = env
		.app
		.post("/api/games/verify-otp")
		.json(&VerifyOtpRequest {
			email: "bob@example.com".to_string(),
			otp:   "123".to_string(),
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

	let body = response.text();
	assert!(body.contains("verification codes are 6 digits"));
}

#[tokio::test(flavor = "multi_thread")]
async fn resending_invalidates_the_previous_verification() {
	let env = TestEnv::new().await;

	env.expect_mail(async || {
		env.app
			.post("/api/games/send-otp")
			.json(&send_request("dave@example.com"))
			.await
	})
	.await;

	let code =
		env.otp_store.get("dave@example.com").await.unwrap().unwrap().code;

	let response = env
		.app
		.post("/api/games/verify-otp")
		.json(&VerifyOtpRequest {
			email: "dave@example.com".to_string(),
			otp:   code,
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	// A second send replaces the whole entry, verified flag included
	env.expect_mail(async || {
		env.app
			.post("/api/games/send-otp")
			.json(&send_request("dave@example.com"))
			.await
	})
	.await;

	let entry = env.otp_store.get("dave@example.com").await.unwrap().unwrap();
	assert!(!entry.verified);
}
