//! Preparation of cloned sections.
//!
//! A new section starts as a deep copy of the last one. Before it is
//! inserted, [`SectionCloner`] turns the copy into a blank section:
//!
//! 1. `style` and `id` are blanked, so the copy is visible and ids stay
//!    unique;
//! 2. text, date and hidden inputs and textareas are emptied;
//! 3. date-time pickers and searchable selects are re-initialised through
//!    the [`WidgetRegistry`];
//! 4. field names of `.increment` fields and radios get their first index
//!    bumped ([`increment_first_index`]);
//! 5. radios are unchecked;
//! 6. `img.reset-image-src` images lose their `src`.
//!
//! Other field kinds (checkboxes, number inputs, selects) keep the copied
//! state.

use crate::dom::DomBackend;
use crate::naming::increment_first_index;
use crate::widgets::{OPTIONS_ATTRIBUTE, SelectOption, WidgetKind, WidgetOptions, WidgetRegistry};

/// Fields whose value is cleared.
pub const CLEARED_FIELDS: &str =
	"input[type=text], input[type=date], input[type=hidden], textarea";

/// Fields whose `name` is renumbered.
pub const RENUMBERED_FIELDS: &str =
	"input.increment, textarea.increment, select.increment, input[type=radio]";

pub const RADIOS: &str = "input[type=radio]";

/// Images whose `src` is cleared.
pub const RESET_IMAGES: &str = "img.reset-image-src";

/// Class of the element a searchable select renders next to its `<select>`.
pub const RENDERED_SELECT_CLASS: &str = "select2";

/// Clones sections and prepares the copies.
#[derive(Debug)]
pub struct SectionCloner<'a, D: DomBackend> {
	dom: &'a D,
	widgets: &'a WidgetRegistry<D>,
}

impl<'a, D: DomBackend> SectionCloner<'a, D> {
	pub fn new(dom: &'a D, widgets: &'a WidgetRegistry<D>) -> Self {
		Self { dom, widgets }
	}

	/// Deep-clones `section` and prepares the detached copy.
	///
	/// Returns `None` when the backend cannot clone the section.
	pub fn clone_section(&self, section: &D::Node) -> Option<D::Node> {
		let Some(copy) = self.dom.deep_clone(section) else {
			tracing::warn!(?section, "backend refused to clone section");
			return None;
		};
		self.prepare(&copy);
		Some(copy)
	}

	/// Applies every preparation step to `copy`.
	pub fn prepare(&self, copy: &D::Node) {
		self.reset_identity(copy);
		self.clear_values(copy);
		self.init_datetimepickers(copy);
		self.init_select2(copy);
		self.renumber(copy);
		self.uncheck_radios(copy);
		self.reset_images(copy);
	}

	fn reset_identity(&self, copy: &D::Node) {
		self.dom.set_attribute(copy, "style", "");
		self.dom.set_attribute(copy, "id", "");
	}

	fn clear_values(&self, copy: &D::Node) {
		for field in self.dom.query_all(copy, CLEARED_FIELDS) {
			self.dom.set_value(&field, "");
		}
	}

	fn options_for(&self, kind: WidgetKind, element: &D::Node) -> Option<WidgetOptions> {
		let raw = self.dom.attribute(element, OPTIONS_ATTRIBUTE);
		match WidgetOptions::from_attribute(kind, raw.as_deref()) {
			Ok(options) => Some(options),
			Err(err) => {
				tracing::warn!(widget = %kind, error = %err, "skipping widget with invalid options");
				None
			}
		}
	}

	fn initialize(&self, element: &D::Node, options: &WidgetOptions) -> bool {
		match self.widgets.initialize(self.dom, element, options) {
			Ok(()) => true,
			Err(err) => {
				tracing::warn!(widget = %options.kind(), error = %err, "widget initialization skipped");
				false
			}
		}
	}

	fn init_datetimepickers(&self, copy: &D::Node) {
		let kind = WidgetKind::DateTimePicker;
		for input in self.dom.query_all(copy, kind.selector()) {
			if let Some(options) = self.options_for(kind, &input) {
				self.initialize(&input, &options);
			}
		}
	}

	/// Re-renders searchable selects. The copy carries the original's
	/// rendered widget as a sibling of each `<select>`; it is removed once
	/// the new one exists, and its width is carried over.
	///
	/// Choices are rebuilt from the `<option>` elements: the value becomes
	/// the id and the option's text the label, so labels shown by the new
	/// widget match the original. Options without text are labelled with
	/// their value.
	fn init_select2(&self, copy: &D::Node) {
		let kind = WidgetKind::Select2;
		for select in self.dom.query_all(copy, kind.selector()) {
			let Some(WidgetOptions::Select2(mut options)) = self.options_for(kind, &select) else {
				continue;
			};
			options.data = self.collect_choices(&select);

			let width = self
				.dom
				.next_element_sibling(&select)
				.and_then(|rendered| self.dom.style_property(&rendered, "width"));
			let stale: Vec<D::Node> = self
				.dom
				.following_siblings(&select)
				.into_iter()
				.filter(|sibling| self.has_class(sibling, RENDERED_SELECT_CLASS))
				.collect();

			if !self.initialize(&select, &WidgetOptions::Select2(options)) {
				continue;
			}
			for rendered in &stale {
				self.dom.detach(rendered);
			}
			if let Some(width) = width
				&& let Some(rendered) = self.dom.next_element_sibling(&select)
			{
				self.dom.set_style_property(&rendered, "width", Some(&width));
			}
		}
	}

	fn collect_choices(&self, select: &D::Node) -> Vec<SelectOption> {
		self.dom
			.query_all(select, "option")
			.iter()
			.map(|option| {
				let text = self.dom.text_content(option);
				let id = self
					.dom
					.attribute(option, "value")
					.unwrap_or_else(|| text.clone());
				let text = if text.trim().is_empty() { id.clone() } else { text };
				SelectOption::new(id, text)
			})
			.collect()
	}

	fn has_class(&self, node: &D::Node, class: &str) -> bool {
		self.dom
			.attribute(node, "class")
			.is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
	}

	fn renumber(&self, copy: &D::Node) {
		for field in self.dom.query_all(copy, RENUMBERED_FIELDS) {
			let Some(name) = self.dom.attribute(&field, "name") else {
				continue;
			};
			if let Some(renamed) = increment_first_index(&name) {
				self.dom.set_attribute(&field, "name", &renamed);
			}
		}
	}

	fn uncheck_radios(&self, copy: &D::Node) {
		for radio in self.dom.query_all(copy, RADIOS) {
			self.dom.set_checked(&radio, false);
		}
	}

	fn reset_images(&self, copy: &D::Node) {
		for image in self.dom.query_all(copy, RESET_IMAGES) {
			self.dom.set_attribute(&image, "src", "");
		}
	}
}
