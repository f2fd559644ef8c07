//! Third-party widget adapters.
//!
//! Cloned sections may contain fields enhanced by third-party widgets: a
//! date-time picker on `input[data-plugin=datetimepicker]` and a searchable
//! select on `select[data-plugin=select2]`. The copied markup still carries
//! the original's widget state, so the controller re-initialises each widget
//! through a [`WidgetAdapter`] registered for its [`WidgetKind`].
//!
//! Widget options are read from the field's `data-options` attribute as JSON
//! into typed option structs. Keys the structs do not know are kept in
//! `extra` and handed to the adapter untouched.
//!
//! ```
//! use reinhardt_multifield::dom::{MemoryDom, NodeId};
//! use reinhardt_multifield::error::WidgetError;
//! use reinhardt_multifield::widgets::{WidgetKind, WidgetOptions, WidgetRegistry};
//!
//! let mut widgets = WidgetRegistry::<MemoryDom>::new();
//! widgets.register(
//!     WidgetKind::DateTimePicker,
//!     |_dom: &MemoryDom, _input: &NodeId, _options: &WidgetOptions| -> Result<(), WidgetError> {
//!         // hand the options to the picker's initializer here
//!         Ok(())
//!     },
//! );
//! assert!(widgets.get(WidgetKind::DateTimePicker).is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dom::DomBackend;
use crate::error::WidgetError;

/// Attribute naming the widget a field is enhanced with.
pub const MARKER_ATTRIBUTE: &str = "data-plugin";

/// Attribute holding the widget's serialized options.
pub const OPTIONS_ATTRIBUTE: &str = "data-options";

/// Widgets re-initialised on cloned sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
	DateTimePicker,
	Select2,
}

impl WidgetKind {
	/// Value of [`MARKER_ATTRIBUTE`] identifying the widget.
	pub fn marker(self) -> &'static str {
		match self {
			Self::DateTimePicker => "datetimepicker",
			Self::Select2 => "select2",
		}
	}

	/// Selector for the fields carrying the widget.
	pub fn selector(self) -> &'static str {
		match self {
			Self::DateTimePicker => "input[data-plugin=datetimepicker]",
			Self::Select2 => "select[data-plugin=select2]",
		}
	}
}

impl fmt::Display for WidgetKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.marker())
	}
}

/// Date-time picker options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimePickerOptions {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub format: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lang: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub datepicker: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timepicker: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_date: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_date: Option<String>,
	/// Minutes between time choices.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub step: Option<u32>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// One choice of a searchable select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
	pub id: String,
	pub text: String,
}

impl SelectOption {
	pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			text: text.into(),
		}
	}
}

/// Searchable select options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Select2Options {
	/// Choices collected from the cloned `<select>`.
	#[serde(default)]
	pub data: Vec<SelectOption>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub width: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub placeholder: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub allow_clear: Option<bool>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Options handed to a [`WidgetAdapter`].
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetOptions {
	DateTimePicker(DateTimePickerOptions),
	Select2(Select2Options),
}

impl WidgetOptions {
	pub fn kind(&self) -> WidgetKind {
		match self {
			Self::DateTimePicker(_) => WidgetKind::DateTimePicker,
			Self::Select2(_) => WidgetKind::Select2,
		}
	}

	/// Parses a `data-options` attribute for `kind`. A missing or blank
	/// attribute yields the default options.
	pub fn from_attribute(kind: WidgetKind, raw: Option<&str>) -> Result<Self, WidgetError> {
		let raw = raw.map(str::trim).filter(|raw| !raw.is_empty());
		let invalid = |source| WidgetError::InvalidOptions { kind, source };
		Ok(match kind {
			WidgetKind::DateTimePicker => Self::DateTimePicker(match raw {
				Some(raw) => serde_json::from_str(raw).map_err(invalid)?,
				None => DateTimePickerOptions::default(),
			}),
			WidgetKind::Select2 => Self::Select2(match raw {
				Some(raw) => serde_json::from_str(raw).map_err(invalid)?,
				None => Select2Options::default(),
			}),
		})
	}
}

/// Initialises a third-party widget on an element.
pub trait WidgetAdapter<D: DomBackend> {
	fn initialize(&self, dom: &D, element: &D::Node, options: &WidgetOptions)
	-> Result<(), WidgetError>;
}

impl<D, F> WidgetAdapter<D> for F
where
	D: DomBackend,
	F: Fn(&D, &D::Node, &WidgetOptions) -> Result<(), WidgetError>,
{
	fn initialize(
		&self,
		dom: &D,
		element: &D::Node,
		options: &WidgetOptions,
	) -> Result<(), WidgetError> {
		self(dom, element, options)
	}
}

/// Adapters by widget kind.
pub struct WidgetRegistry<D: DomBackend> {
	adapters: HashMap<WidgetKind, Rc<dyn WidgetAdapter<D>>>,
}

impl<D: DomBackend> WidgetRegistry<D> {
	pub fn new() -> Self {
		Self {
			adapters: HashMap::new(),
		}
	}

	/// Registers `adapter` for `kind`, replacing any previous one.
	pub fn register(&mut self, kind: WidgetKind, adapter: impl WidgetAdapter<D> + 'static) {
		self.adapters.insert(kind, Rc::new(adapter));
	}

	pub fn get(&self, kind: WidgetKind) -> Option<Rc<dyn WidgetAdapter<D>>> {
		self.adapters.get(&kind).cloned()
	}

	/// Runs the adapter registered for the options' kind.
	pub fn initialize(
		&self,
		dom: &D,
		element: &D::Node,
		options: &WidgetOptions,
	) -> Result<(), WidgetError> {
		let kind = options.kind();
		let adapter = self.get(kind).ok_or(WidgetError::MissingAdapter(kind))?;
		adapter.initialize(dom, element, options)
	}
}

impl<D: DomBackend> Default for WidgetRegistry<D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: DomBackend> Clone for WidgetRegistry<D> {
	fn clone(&self) -> Self {
		Self {
			adapters: self.adapters.clone(),
		}
	}
}

impl<D: DomBackend> fmt::Debug for WidgetRegistry<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WidgetRegistry")
			.field("kinds", &self.adapters.keys().collect::<Vec<_>>())
			.finish()
	}
}
