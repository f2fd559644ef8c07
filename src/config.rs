//! Controller configuration
//!
//! Options come from three layers, merged in priority order (element
//! attribute > caller options > defaults):
//!
//! | Source | Priority | Origin |
//! |---|---|---|
//! | [`DefaultsSource`] | 0 | `max: 0`, `locale: "default"` |
//! | [`OptionsSource`] | 50 | [`MultiFieldOptions`] passed by the caller |
//! | [`ElementSource`] | 100 | `data-mfield-options` JSON on the container |
//!
//! The merge is shallow: a higher layer replaces a key's whole value.
//!
//! ```
//! use reinhardt_multifield::config::{LayeredConfig, MultiFieldOptions};
//! use reinhardt_multifield::dom::MemoryDom;
//!
//! let options = MultiFieldOptions::new()
//!     .with_section(".group")
//!     .with_btn_add("#add")
//!     .with_btn_remove(".remove")
//!     .with_max(5);
//! let config = LayeredConfig::for_options(options)
//!     .resolve(&MemoryDom::new())
//!     .unwrap();
//! assert_eq!(config.max, 5);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dom::DomBackend;
use crate::error::ConfigError;
use crate::i18n::{DEFAULT_LOCALE, LocaleSetting, Messages};

/// Container attribute holding per-element options.
pub const ELEMENT_OPTIONS_ATTRIBUTE: &str = "data-mfield-options";

/// Options as supplied by the caller. Every field is optional; missing
/// ones fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFieldOptions {
	/// Selector of the sections, matched against the container's children.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub section: Option<String>,
	/// Maximum number of sections, `0` for no limit.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<u32>,
	/// Selector of the add control.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub btn_add: Option<String>,
	/// Selector of the remove controls inside each section.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub btn_remove: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub locale: Option<LocaleSetting>,
}

impl MultiFieldOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_section(mut self, selector: impl Into<String>) -> Self {
		self.section = Some(selector.into());
		self
	}

	pub fn with_max(mut self, max: u32) -> Self {
		self.max = Some(max);
		self
	}

	pub fn with_btn_add(mut self, selector: impl Into<String>) -> Self {
		self.btn_add = Some(selector.into());
		self
	}

	pub fn with_btn_remove(mut self, selector: impl Into<String>) -> Self {
		self.btn_remove = Some(selector.into());
		self
	}

	/// Sets the locale by name or with custom [`Messages`].
	pub fn with_locale(mut self, locale: impl Into<LocaleSetting>) -> Self {
		self.locale = Some(locale.into());
		self
	}
}

/// A layer of configuration.
pub trait ConfigSource {
	/// Loads this layer's keys.
	fn load(&self) -> Result<IndexMap<String, Value>, ConfigError>;

	/// Higher priorities override lower ones.
	fn priority(&self) -> u8;

	fn description(&self) -> String;
}

/// Built-in defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn load(&self) -> Result<IndexMap<String, Value>, ConfigError> {
		let mut values = IndexMap::new();
		values.insert("max".to_string(), Value::from(0));
		values.insert("locale".to_string(), Value::from(DEFAULT_LOCALE));
		Ok(values)
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"defaults".to_string()
	}
}

/// Caller-supplied options.
#[derive(Debug, Clone, Default)]
pub struct OptionsSource {
	options: MultiFieldOptions,
}

impl OptionsSource {
	pub fn new(options: MultiFieldOptions) -> Self {
		Self { options }
	}
}

impl ConfigSource for OptionsSource {
	fn load(&self) -> Result<IndexMap<String, Value>, ConfigError> {
		match serde_json::to_value(&self.options)? {
			Value::Object(map) => Ok(map.into_iter().collect()),
			_ => Ok(IndexMap::new()),
		}
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		"caller options".to_string()
	}
}

/// Options declared on the container through `data-mfield-options`.
#[derive(Debug, Clone, Default)]
pub struct ElementSource {
	raw: Option<String>,
}

impl ElementSource {
	/// Source over a raw attribute value.
	pub fn new(raw: Option<String>) -> Self {
		Self { raw }
	}

	/// Reads the attribute from `container`.
	pub fn from_element<D: DomBackend>(dom: &D, container: &D::Node) -> Self {
		Self::new(dom.attribute(container, ELEMENT_OPTIONS_ATTRIBUTE))
	}
}

impl ConfigSource for ElementSource {
	fn load(&self) -> Result<IndexMap<String, Value>, ConfigError> {
		let Some(raw) = self.raw.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) else {
			return Ok(IndexMap::new());
		};
		let value: Value = serde_json::from_str(raw)
			.map_err(|err| ConfigError::InvalidElementOptions(err.to_string()))?;
		match value {
			Value::Object(map) => Ok(map.into_iter().collect()),
			other => Err(ConfigError::InvalidElementOptions(format!(
				"expected a JSON object, found `{other}`"
			))),
		}
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		format!("{ELEMENT_OPTIONS_ATTRIBUTE} attribute")
	}
}

/// Resolved and validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFieldConfig {
	pub section: String,
	/// `0` means unlimited.
	pub max: u32,
	pub btn_add: String,
	pub btn_remove: String,
	/// Messages for the resolved locale.
	pub messages: Messages,
}

impl MultiFieldConfig {
	/// Whether a section can be added when `count` sections exist.
	pub fn allows(&self, count: usize) -> bool {
		self.max == 0 || count < self.max as usize
	}
}

/// Ordered stack of [`ConfigSource`]s.
#[derive(Default)]
pub struct LayeredConfig {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl std::fmt::Debug for LayeredConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list()
			.entries(self.sources.iter().map(|source| source.description()))
			.finish()
	}
}

impl LayeredConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Defaults overridden by `options`.
	pub fn for_options(options: MultiFieldOptions) -> Self {
		Self::new()
			.with_source(DefaultsSource)
			.with_source(OptionsSource::new(options))
	}

	/// Defaults, then `options`, then the container's own attribute.
	pub fn for_element<D: DomBackend>(
		dom: &D,
		container: &D::Node,
		options: MultiFieldOptions,
	) -> Self {
		Self::for_options(options).with_source(ElementSource::from_element(dom, container))
	}

	pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merges every source. Sources with equal priority apply in the order
	/// they were added.
	pub fn merge(&self) -> Result<IndexMap<String, Value>, ConfigError> {
		let mut ordered: Vec<&dyn ConfigSource> =
			self.sources.iter().map(|source| source.as_ref()).collect();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = IndexMap::new();
		for source in ordered {
			let values = source.load()?;
			tracing::trace!(source = %source.description(), keys = values.len(), "merging configuration layer");
			merged.extend(values);
		}
		Ok(merged)
	}

	/// Merges, then validates against `dom`.
	pub fn resolve<D: DomBackend>(&self, dom: &D) -> Result<MultiFieldConfig, ConfigError> {
		let merged = self.merge()?;
		let options: MultiFieldOptions =
			serde_json::from_value(Value::Object(merged.into_iter().collect()))?;

		let section = required_selector(dom, "section", options.section)?;
		let btn_add = required_selector(dom, "btnAdd", options.btn_add)?;
		let btn_remove = required_selector(dom, "btnRemove", options.btn_remove)?;
		let messages = options.locale.unwrap_or_default().resolve()?;

		Ok(MultiFieldConfig {
			section,
			max: options.max.unwrap_or(0),
			btn_add,
			btn_remove,
			messages,
		})
	}
}

fn required_selector<D: DomBackend>(
	dom: &D,
	option: &'static str,
	value: Option<String>,
) -> Result<String, ConfigError> {
	let value = value.ok_or(ConfigError::MissingOption(option))?;
	let value = value.trim();
	if value.is_empty() {
		return Err(ConfigError::EmptyOption(option));
	}
	dom.validate_selector(value)
		.map_err(|source| ConfigError::InvalidSelector { option, source })?;
	Ok(value.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::MemoryDom;
	use rstest::rstest;
	use serde_json::json;

	fn options() -> MultiFieldOptions {
		MultiFieldOptions::new()
			.with_section(".group")
			.with_btn_add("#add")
			.with_btn_remove(".remove")
	}

	#[rstest]
	fn test_source_priority() {
		assert_eq!(DefaultsSource.priority(), 0);
		assert_eq!(OptionsSource::default().priority(), 50);
		assert_eq!(ElementSource::default().priority(), 100);
	}

	#[rstest]
	fn test_defaults_apply() {
		let config = LayeredConfig::for_options(options())
			.resolve(&MemoryDom::new())
			.unwrap();
		assert_eq!(config.max, 0);
		assert_eq!(config.messages, Messages::default());
		assert_eq!(config.section, ".group");
	}

	#[rstest]
	fn test_options_source_only_emits_set_keys() {
		let values = OptionsSource::new(MultiFieldOptions::new().with_max(2))
			.load()
			.unwrap();
		assert_eq!(values.len(), 1);
		assert_eq!(values.get("max"), Some(&json!(2)));
	}

	#[rstest]
	fn test_element_attribute_wins() {
		let config = LayeredConfig::for_options(options().with_max(3))
			.with_source(ElementSource::new(Some(
				r#"{"max": 1, "section": ".row"}"#.to_string(),
			)))
			.resolve(&MemoryDom::new())
			.unwrap();
		assert_eq!(config.max, 1);
		assert_eq!(config.section, ".row");
		assert_eq!(config.btn_add, "#add");
	}

	#[rstest]
	fn test_sources_merge_by_priority_not_insertion_order() {
		let merged = LayeredConfig::new()
			.with_source(ElementSource::new(Some(r#"{"max": 9}"#.to_string())))
			.with_source(OptionsSource::new(MultiFieldOptions::new().with_max(4)))
			.with_source(DefaultsSource)
			.merge()
			.unwrap();
		assert_eq!(merged.get("max"), Some(&json!(9)));
		assert_eq!(merged.get("locale"), Some(&json!("default")));
	}

	#[rstest]
	fn test_locale_is_replaced_whole() {
		let config = LayeredConfig::for_options(
			options().with_locale(Messages::new("Caller prompt?")),
		)
		.with_source(ElementSource::new(Some(r#"{"locale": "de"}"#.to_string())))
		.resolve(&MemoryDom::new())
		.unwrap();
		assert!(config.messages.remove_confirmation.starts_with("Möchten"));
	}

	#[rstest]
	#[case(MultiFieldOptions::new().with_btn_add("#a").with_btn_remove(".r"), "section")]
	#[case(MultiFieldOptions::new().with_section(".g").with_btn_remove(".r"), "btnAdd")]
	#[case(MultiFieldOptions::new().with_section(".g").with_btn_add("#a"), "btnRemove")]
	fn test_missing_required_option(#[case] options: MultiFieldOptions, #[case] name: &str) {
		let err = LayeredConfig::for_options(options)
			.resolve(&MemoryDom::new())
			.unwrap_err();
		assert!(matches!(err, ConfigError::MissingOption(option) if option == name));
	}

	#[rstest]
	fn test_empty_and_invalid_selectors() {
		let dom = MemoryDom::new();
		let err = LayeredConfig::for_options(options().with_section("  "))
			.resolve(&dom)
			.unwrap_err();
		assert!(matches!(err, ConfigError::EmptyOption("section")));

		let err = LayeredConfig::for_options(options().with_btn_remove(".remove["))
			.resolve(&dom)
			.unwrap_err();
		assert!(matches!(
			err,
			ConfigError::InvalidSelector {
				option: "btnRemove",
				..
			}
		));
	}

	#[rstest]
	#[case("{not json")]
	#[case("[1, 2]")]
	#[case("\"section\"")]
	fn test_element_options_must_be_json_object(#[case] raw: &str) {
		let err = ElementSource::new(Some(raw.to_string())).load().unwrap_err();
		assert!(matches!(err, ConfigError::InvalidElementOptions(_)));
	}

	#[rstest]
	fn test_negative_max_is_rejected() {
		let err = LayeredConfig::for_options(options())
			.with_source(ElementSource::new(Some(r#"{"max": -1}"#.to_string())))
			.resolve(&MemoryDom::new())
			.unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)));
	}

	#[rstest]
	fn test_unknown_locale_fails_resolution() {
		let err = LayeredConfig::for_options(options().with_locale("xx"))
			.resolve(&MemoryDom::new())
			.unwrap_err();
		assert!(matches!(err, ConfigError::UnknownLocale(_)));
	}

	#[rstest]
	#[case(0, 100, true)]
	#[case(3, 2, true)]
	#[case(3, 3, false)]
	fn test_allows(#[case] max: u32, #[case] count: usize, #[case] expected: bool) {
		let config = MultiFieldConfig {
			section: ".g".into(),
			max,
			btn_add: "#a".into(),
			btn_remove: ".r".into(),
			messages: Messages::default(),
		};
		assert_eq!(config.allows(count), expected);
	}
}
