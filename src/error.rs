//! Error types for multifield controllers.
//!
//! Only initialisation can fail. Once a controller is bound, add and remove
//! requests that cannot be honoured are silent no-ops and widget problems are
//! logged, so none of these errors escape the click handler.

use crate::widgets::WidgetKind;

/// Errors raised by a [`DomBackend`](crate::dom::DomBackend).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
	#[error("Invalid selector `{selector}`: {reason}")]
	InvalidSelector { selector: String, reason: String },

	#[error("DOM unavailable: {0}")]
	Unavailable(String),
}

impl DomError {
	pub(crate) fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
		Self::InvalidSelector {
			selector: selector.to_string(),
			reason: reason.into(),
		}
	}
}

/// Errors found while merging and validating configuration.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Missing required option `{0}`")]
	MissingOption(&'static str),

	#[error("Option `{0}` must not be empty")]
	EmptyOption(&'static str),

	#[error("Option `{option}` is not a usable selector: {source}")]
	InvalidSelector {
		option: &'static str,
		#[source]
		source: DomError,
	},

	#[error("Invalid data-mfield-options attribute: {0}")]
	InvalidElementOptions(String),

	#[error("Invalid configuration: {0}")]
	Invalid(#[from] serde_json::Error),

	#[error("Unknown locale `{0}`")]
	UnknownLocale(String),
}

/// Errors reported by widget adapters.
///
/// These are logged by the controller and never abort an add.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
	#[error("Invalid {kind} options: {source}")]
	InvalidOptions {
		kind: WidgetKind,
		#[source]
		source: serde_json::Error,
	},

	#[error("No adapter registered for {0}")]
	MissingAdapter(WidgetKind),

	#[error("{kind} initialization failed: {message}")]
	Initialization { kind: WidgetKind, message: String },
}

/// Errors returned when a controller cannot be initialised.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum MultiFieldError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("Container has no sections matching `{selector}`")]
	NoSections { selector: String },
}
