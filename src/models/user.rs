use chrono::NaiveDateTime;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::app_user;
use crate::{DbConn, Error};

/// A customer account, keyed by email address
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = app_user)]
#[diesel(check_for_backend(Pg))]
pub struct User {
	pub id:          i32,
	pub email:       String,
	pub first_name:  Option<String>,
	pub last_name:   Option<String>,
	pub is_active:   bool,
	pub date_joined: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = app_user)]
pub struct NewUser {
	pub email:      String,
	pub first_name: Option<String>,
	pub last_name:  Option<String>,
}

impl User {
	/// Get the [`User`] with the given email, creating one if none exists
	///
	/// An existing user only gets blank name fields filled in, names already
	/// on record are never overwritten.
	///
	/// # Errors
	pub(crate) async fn find_or_create(
		new_user: NewUser,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let user = conn
			.interact(move |conn| {
				use self::app_user::dsl::*;

				diesel::insert_into(app_user)
					.values(&new_user)
					.on_conflict(email)
					.do_nothing()
					.execute(conn)?;

				let user: User =
					app_user.filter(email.eq(&new_user.email)).first(conn)?;

				let fill_first = user
					.first_name
					.as_deref()
					.is_none_or(str::is_empty)
					&& new_user.first_name.as_deref().is_some_and(|n| !n.is_empty());
				let fill_last = user.last_name.as_deref().is_none_or(str::is_empty)
					&& new_user.last_name.as_deref().is_some_and(|n| !n.is_empty());

				if !fill_first && !fill_last {
					return Ok(user);
				}

				let filled_first = if fill_first {
					new_user.first_name.clone()
				} else {
					user.first_name.clone()
				};
				let filled_last = if fill_last {
					new_user.last_name.clone()
				} else {
					user.last_name.clone()
				};

				diesel::update(app_user.find(user.id))
					.set((first_name.eq(filled_first), last_name.eq(filled_last)))
					.returning(User::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(user)
	}
}
