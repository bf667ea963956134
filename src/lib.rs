//! # Questbook backend library

#[macro_use]
extern crate tracing;

use std::sync::Arc;

use axum::extract::FromRef;
use deadpool_diesel::postgres::{Object, Pool};
use redis::aio::MultiplexedConnection;

use crate::gateway::PaymentGateway;
use crate::mailer::Mailer;
use crate::otp::OtpStore;

mod config;

pub mod controllers;
pub mod error;
pub mod gateway;
pub mod mailer;
pub mod models;
pub mod otp;
pub mod routes;
pub mod schema;
pub mod schemas;
pub mod slots;

pub use config::*;
pub use error::Error;

/// An entire database pool
pub type DbPool = Pool;

/// A single database connection
pub type DbConn = Object;

/// A redis cache connection
pub type RedisConn = MultiplexedConnection;

/// Common state of the app
#[derive(Clone)]
pub struct AppState {
	pub config:         Config,
	pub gateway_config: GatewayConfig,
	pub database_pool:  DbPool,
	pub otp_store:      OtpStore,
	pub mailer:         Mailer,
	pub gateway:        Arc<dyn PaymentGateway>,
}

impl FromRef<AppState> for Config {
	fn from_ref(input: &AppState) -> Self { input.config.clone() }
}

impl FromRef<AppState> for GatewayConfig {
	fn from_ref(input: &AppState) -> Self { input.gateway_config.clone() }
}

impl FromRef<AppState> for DbPool {
	fn from_ref(input: &AppState) -> Self { input.database_pool.clone() }
}

impl FromRef<AppState> for OtpStore {
	fn from_ref(input: &AppState) -> Self { input.otp_store.clone() }
}

impl FromRef<AppState> for Mailer {
	fn from_ref(input: &AppState) -> Self { input.mailer.clone() }
}

impl FromRef<AppState> for Arc<dyn PaymentGateway> {
	fn from_ref(input: &AppState) -> Self { input.gateway.clone() }
}
