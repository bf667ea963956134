use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::contact_info;
use crate::{DbConn, Error};

/// How customers can reach the business
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = contact_info)]
#[diesel(check_for_backend(Pg))]
pub struct ContactInfo {
	#[serde(skip)]
	pub id:              i32,
	pub email:           String,
	pub address:         String,
	pub facebook_page:   Option<String>,
	pub instagram_page:  Option<String>,
	pub whatsapp_number: Option<String>,
}

impl ContactInfo {
	/// Get the current [`ContactInfo`], if any has been published
	///
	/// # Errors
	pub(crate) async fn get(conn: &DbConn) -> Result<Option<Self>, Error> {
		let info = conn
			.interact(|conn| {
				use self::contact_info::dsl::*;

				contact_info.order(id.asc()).first(conn).optional()
			})
			.await??;

		Ok(info)
	}
}
