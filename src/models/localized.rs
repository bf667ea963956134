use std::collections::BTreeMap;

use diesel::backend::Backend;
use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{Output, ToSql};
use diesel::sql_types::Jsonb;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

/// The languages the storefront is offered in
#[derive(
	Clone,
	Copy,
	DbEnum,
	Debug,
	Default,
	Deserialize,
	Eq,
	Hash,
	Ord,
	PartialEq,
	PartialOrd,
	Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::Language"]
#[serde(rename_all = "lowercase")]
pub enum Language {
	#[default]
	En,
	Es,
	Uk,
	Ru,
}

impl Language {
	/// Parse a language code from a query string
	///
	/// Unknown or missing codes fall back to English
	#[must_use]
	pub fn from_query(code: Option<&str>) -> Self {
		match code {
			Some("es") => Self::Es,
			Some("uk") => Self::Uk,
			Some("ru") => Self::Ru,
			_ => Self::En,
		}
	}

	#[must_use]
	pub fn code(self) -> &'static str {
		match self {
			Self::En => "en",
			Self::Es => "es",
			Self::Uk => "uk",
			Self::Ru => "ru",
		}
	}
}

/// Text in one or more languages, stored as a jsonb object keyed by
/// language code
#[derive(
	AsExpression, Clone, Debug, Default, Deserialize, FromSqlRow, PartialEq, Serialize,
)]
#[diesel(sql_type = Jsonb)]
pub struct LocalizedText(pub BTreeMap<Language, String>);

impl LocalizedText {
	/// Resolve this text for a requested language
	///
	/// Falls back to English, then to the first populated entry. Only an
	/// entirely empty map resolves to an empty string.
	#[must_use]
	pub fn resolve(&self, language: Language) -> &str {
		if let Some(text) = self.0.get(&language) {
			return text;
		}

		if let Some(text) = self.0.get(&Language::En) {
			return text;
		}

		self.0.values().next().map_or("", String::as_str)
	}
}

impl<DB> FromSql<Jsonb, DB> for LocalizedText
where
	DB: Backend,
	serde_json::Value: FromSql<Jsonb, DB>,
{
	fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
		let value = <serde_json::Value as FromSql<Jsonb, DB>>::from_sql(bytes)?;
		Ok(serde_json::from_value(value)?)
	}
}

impl ToSql<Jsonb, Pg> for LocalizedText {
	fn to_sql<'b>(
		&'b self,
		out: &mut Output<'b, '_, Pg>,
	) -> diesel::serialize::Result {
		let value = serde_json::to_value(self)?;
		<serde_json::Value as ToSql<Jsonb, Pg>>::to_sql(
			&value,
			&mut out.reborrow(),
		)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use super::{Language, LocalizedText};

	fn text(entries: &[(Language, &str)]) -> LocalizedText {
		LocalizedText(
			entries
				.iter()
				.map(|(language, value)| (*language, (*value).to_string()))
				.collect::<BTreeMap<_, _>>(),
		)
	}

	#[test]
	fn resolving_prefers_the_requested_language() {
		let text = text(&[(Language::En, "Prison Break"), (Language::Es, "Fuga")]);

		assert_eq!(text.resolve(Language::Es), "Fuga");
	}

	#[test]
	fn resolving_falls_back_to_english_then_any() {
		let text = text(&[(Language::En, "Prison Break")]);
		assert_eq!(text.resolve(Language::Uk), "Prison Break");

		let text = self::text(&[(Language::Ru, "Побег")]);
		assert_eq!(text.resolve(Language::Es), "Побег");
	}

	#[test]
	fn an_empty_map_resolves_to_an_empty_string() {
		assert_eq!(LocalizedText::default().resolve(Language::En), "");
	}

	#[test]
	fn unknown_query_codes_fall_back_to_english() {
		assert_eq!(Language::from_query(Some("de")), Language::En);
		assert_eq!(Language::from_query(None), Language::En);
		assert_eq!(Language::from_query(Some("uk")), Language::Uk);
	}
}
