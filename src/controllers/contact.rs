//! Controller for the business contact card

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::DbPool;
use crate::error::Error;
use crate::models::ContactInfo;
use crate::schemas::billing::ContactResponse;

/// Get the published contact information
#[instrument(skip(pool))]
pub(crate) async fn get_contact_info(
	State(pool): State<DbPool>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let info = ContactInfo::get(&conn).await?.ok_or_else(|| {
		Error::NotFound("contact info not published".to_string())
	})?;

	Ok((StatusCode::OK, Json(ContactResponse { success: true, data: info })))
}
