//! Localized messages shown by the controller.
//!
//! The `locale` option is either a locale name resolved against the built-in
//! catalog, or a custom object carrying the messages directly:
//!
//! ```json
//! { "messages": { "removeConfirmation": "Supprimer cette section ?" } }
//! ```
//!
//! The nested form `{ "multiField": { "messages": { ... } } }` is accepted
//! too.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Locale name that resolves to the English messages.
pub const DEFAULT_LOCALE: &str = "default";

/// The `locale` option as written by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocaleSetting {
	/// A locale name such as `"default"`, `"fr"` or `"pt_BR"`.
	Named(String),
	/// Messages supplied inline.
	Custom(CustomLocale),
}

impl Default for LocaleSetting {
	fn default() -> Self {
		Self::Named(DEFAULT_LOCALE.to_string())
	}
}

/// Inline message overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomLocale {
	/// `{ "multiField": { "messages": { ... } } }`
	Namespaced {
		#[serde(rename = "multiField")]
		multi_field: MessageTable,
	},
	/// `{ "messages": { ... } }`
	Flat(MessageTable),
}

/// A `messages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTable {
	pub messages: Messages,
}

/// Messages used by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
	/// Prompt shown before a section is removed.
	pub remove_confirmation: String,
}

impl Default for Messages {
	fn default() -> Self {
		Self::new("Are you sure you want to remove this section?")
	}
}

impl Messages {
	/// Creates a message set from the removal prompt.
	pub fn new(remove_confirmation: impl Into<String>) -> Self {
		Self {
			remove_confirmation: remove_confirmation.into(),
		}
	}

	/// Looks up the built-in messages for a locale name.
	///
	/// Matching uses the primary language subtag, so `fr_CA` and `fr-BE`
	/// both resolve to French.
	pub fn builtin(locale: &str) -> Option<Self> {
		if locale == DEFAULT_LOCALE {
			return Some(Self::default());
		}
		let lang = locale.split(['-', '_']).next().unwrap_or(locale);

		let prompt = match lang.to_ascii_lowercase().as_str() {
			"en" => "Are you sure you want to remove this section?",
			"fr" => "Voulez-vous vraiment supprimer cette section ?",
			"de" => "Möchten Sie diesen Abschnitt wirklich entfernen?",
			"es" => "¿Seguro que desea eliminar esta sección?",
			"it" => "Sei sicuro di voler rimuovere questa sezione?",
			"nl" => "Weet u zeker dat u deze sectie wilt verwijderen?",
			"pt" => "Tem certeza de que deseja remover esta seção?",
			"ja" => "このセクションを削除してもよろしいですか？",
			_ => return None,
		};
		Some(Self::new(prompt))
	}
}

impl From<&str> for LocaleSetting {
	fn from(name: &str) -> Self {
		Self::Named(name.to_string())
	}
}

impl From<Messages> for LocaleSetting {
	fn from(messages: Messages) -> Self {
		Self::Custom(CustomLocale::Flat(MessageTable { messages }))
	}
}

impl LocaleSetting {
	/// Resolves the setting to the messages the controller will show.
	pub fn resolve(&self) -> Result<Messages, ConfigError> {
		match self {
			Self::Named(name) => {
				Messages::builtin(name).ok_or_else(|| ConfigError::UnknownLocale(name.clone()))
			}
			Self::Custom(CustomLocale::Namespaced { multi_field }) => {
				Ok(multi_field.messages.clone())
			}
			Self::Custom(CustomLocale::Flat(table)) => Ok(table.messages.clone()),
		}
	}
}
