//! The multifield controller.
//!
//! A [`MultiField`] manages the sections of one container element. It binds
//! a single delegated click listener on the container:
//!
//! - a click on (or inside) an element matching `btnAdd` appends a section
//!   cloned from the last one;
//! - a click on (or inside) an element matching `btnRemove` asks for
//!   confirmation, then slides the enclosing section up and detaches it.
//!
//! Remove controls are hidden while fewer than two sections exist. Sections
//! that are still sliding up do not count.
//!
//! ```
//! use reinhardt_multifield::config::MultiFieldOptions;
//! use reinhardt_multifield::controller::MultiField;
//! use reinhardt_multifield::dom::MemoryDom;
//!
//! let dom = MemoryDom::new();
//! let add = dom.element("a").id("add").build();
//! let container = dom
//!     .element("div")
//!     .child(
//!         dom.element("div")
//!             .class("group")
//!             .child(dom.element("input").attr("type", "text").attr("name", "item_1").build())
//!             .child(dom.element("button").class("remove").build())
//!             .build(),
//!     )
//!     .child(add)
//!     .build();
//!
//! let controller = MultiField::builder(dom.clone(), container)
//!     .options(
//!         MultiFieldOptions::new()
//!             .with_section(".group")
//!             .with_btn_add("#add")
//!             .with_btn_remove(".remove"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(dom.click(&add));
//! assert_eq!(controller.sections_count(), 2);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::animation::Animator;
use crate::config::{LayeredConfig, MultiFieldConfig, MultiFieldOptions};
use crate::confirm::{Confirm, ConfirmResponder};
use crate::dom::{ClickEvent, ClickHandler, DomBackend};
use crate::error::MultiFieldError;
use crate::section::SectionCloner;
use crate::widgets::{WidgetAdapter, WidgetKind, WidgetRegistry};

struct Inner<D: DomBackend> {
	dom: D,
	container: D::Node,
	config: MultiFieldConfig,
	confirm: Box<dyn Confirm>,
	animator: Box<dyn Animator<D>>,
	widgets: WidgetRegistry<D>,
	// Sections whose slide-up has started but not completed.
	removing: RefCell<Vec<D::Node>>,
	// Unbinds the click listener when the last handle goes away.
	_listener: D::Listener,
}

/// Controller for one container's sections.
///
/// Cloning yields another handle to the same controller. The click
/// listener stays bound while at least one handle is alive; call
/// [`forget`](Self::forget) to keep it bound for the page's lifetime.
pub struct MultiField<D: DomBackend> {
	inner: Rc<Inner<D>>,
}

impl<D: DomBackend> Clone for MultiField<D> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<D: DomBackend> fmt::Debug for MultiField<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MultiField")
			.field("container", &self.inner.container)
			.field("config", &self.inner.config)
			.field("widgets", &self.inner.widgets)
			.finish_non_exhaustive()
	}
}

/// Builder for [`MultiField`].
pub struct MultiFieldBuilder<D: DomBackend> {
	dom: D,
	container: D::Node,
	options: MultiFieldOptions,
	confirm: Option<Box<dyn Confirm>>,
	animator: Option<Box<dyn Animator<D>>>,
	widgets: WidgetRegistry<D>,
}

impl<D: DomBackend> MultiFieldBuilder<D> {
	/// Caller options, overridden by the container's `data-mfield-options`.
	pub fn options(mut self, options: MultiFieldOptions) -> Self {
		self.options = options;
		self
	}

	/// Confirmation prompt used before removals.
	pub fn confirm(mut self, confirm: impl Confirm + 'static) -> Self {
		self.confirm = Some(Box::new(confirm));
		self
	}

	/// Section transitions. Defaults to the backend's
	/// [`DomBackend::default_animator`].
	pub fn animator(mut self, animator: impl Animator<D> + 'static) -> Self {
		self.animator = Some(Box::new(animator));
		self
	}

	/// Registers the adapter for one widget kind.
	pub fn widget(mut self, kind: WidgetKind, adapter: impl WidgetAdapter<D> + 'static) -> Self {
		self.widgets.register(kind, adapter);
		self
	}

	/// Replaces every widget adapter.
	pub fn widgets(mut self, widgets: WidgetRegistry<D>) -> Self {
		self.widgets = widgets;
		self
	}

	/// Resolves the configuration, prepares the container and binds the
	/// click listener.
	///
	/// # Errors
	///
	/// Returns [`MultiFieldError::Config`] when the merged options are
	/// incomplete or invalid, and [`MultiFieldError::NoSections`] when the
	/// container has no section to clone from.
	pub fn build(self) -> Result<MultiField<D>, MultiFieldError> {
		let Self {
			dom,
			container,
			options,
			confirm,
			animator,
			widgets,
		} = self;

		let config = LayeredConfig::for_element(&dom, &container, options).resolve(&dom)?;
		let count = dom.children_matching(&container, &config.section).len();
		if count == 0 {
			return Err(MultiFieldError::NoSections {
				selector: config.section,
			});
		}
		if count < 2 {
			set_remove_controls_visible(&dom, &container, &config, false);
		}

		let confirm = confirm.unwrap_or_else(default_confirm);
		let animator = animator.unwrap_or_else(D::default_animator);

		let inner = Rc::new_cyclic(|weak: &Weak<Inner<D>>| {
			let weak = weak.clone();
			let handler: ClickHandler<D::Node> = Rc::new(move |event: &ClickEvent<D::Node>| {
				if let Some(inner) = weak.upgrade() {
					MultiField { inner }.handle_click(event);
				}
			});
			let listener = dom.on_click(&container, handler);
			Inner {
				dom,
				container,
				config,
				confirm,
				animator,
				widgets,
				removing: RefCell::new(Vec::new()),
				_listener: listener,
			}
		});

		tracing::debug!(
			sections = count,
			max = inner.config.max,
			section = %inner.config.section,
			"multifield bound"
		);
		Ok(MultiField { inner })
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn default_confirm() -> Box<dyn Confirm> {
	Box::new(crate::confirm::StaticConfirm::accept())
}

#[cfg(target_arch = "wasm32")]
fn default_confirm() -> Box<dyn Confirm> {
	Box::new(crate::confirm::WindowConfirm)
}

fn set_remove_controls_visible<D: DomBackend>(
	dom: &D,
	container: &D::Node,
	config: &MultiFieldConfig,
	visible: bool,
) {
	for control in dom.query_all(container, &config.btn_remove) {
		dom.set_visible(&control, visible);
	}
}

impl<D: DomBackend> MultiField<D> {
	/// Starts configuring a controller for `container`.
	pub fn builder(dom: D, container: D::Node) -> MultiFieldBuilder<D> {
		MultiFieldBuilder {
			dom,
			container,
			options: MultiFieldOptions::default(),
			confirm: None,
			animator: None,
			widgets: WidgetRegistry::new(),
		}
	}

	pub fn container(&self) -> &D::Node {
		&self.inner.container
	}

	/// The resolved configuration.
	pub fn config(&self) -> &MultiFieldConfig {
		&self.inner.config
	}

	/// Current sections, read from the container's children.
	pub fn sections(&self) -> Vec<D::Node> {
		self.inner
			.dom
			.children_matching(&self.inner.container, &self.inner.config.section)
	}

	/// Number of direct children of the container matching `section`.
	pub fn sections_count(&self) -> usize {
		self.sections().len()
	}

	/// Appends a copy of the last section.
	///
	/// Returns the new section, or `None` when the maximum is reached or
	/// there is no section left to copy.
	pub fn add_section(&self) -> Option<D::Node> {
		let Inner {
			dom,
			config,
			animator,
			widgets,
			..
		} = &*self.inner;

		let sections = self.sections();
		if !config.allows(sections.len()) {
			tracing::debug!(count = sections.len(), max = config.max, "section limit reached");
			return None;
		}
		let Some(last) = sections.last() else {
			tracing::warn!("no section left to copy");
			return None;
		};

		let copy = SectionCloner::new(dom, widgets).clone_section(last)?;
		dom.insert_after(last, &copy);
		animator.fade_in(dom, &copy);
		self.refresh_remove_controls();

		tracing::debug!(count = sections.len() + 1, "section added");
		Some(copy)
	}

	/// Asks for confirmation, then removes `section`.
	///
	/// Does nothing if `section` is not one of this controller's sections,
	/// or is already being removed. Remove controls are hidden before the
	/// slide-up starts when fewer than two sections would remain; the
	/// section is detached once the slide-up completes.
	pub fn remove_section(&self, section: &D::Node) {
		if !self.is_section(section) {
			tracing::warn!(?section, "ignoring removal of an element that is not a section");
			return;
		}
		if self.is_removing(section) {
			tracing::debug!(?section, "section is already being removed");
			return;
		}

		let weak = Rc::downgrade(&self.inner);
		let section = section.clone();
		let responder = ConfirmResponder::new(move |accepted| {
			if !accepted {
				tracing::debug!("section removal declined");
				return;
			}
			if let Some(inner) = weak.upgrade() {
				MultiField { inner }.finish_removal(section);
			}
		});
		self.inner
			.confirm
			.request(&self.inner.config.messages.remove_confirmation, responder);
	}

	fn finish_removal(&self, section: D::Node) {
		let Inner { dom, animator, .. } = &*self.inner;

		// The answer may arrive after the section already went away
		if !self.is_section(&section) || self.is_removing(&section) {
			tracing::debug!(?section, "section gone before removal was confirmed");
			return;
		}
		self.inner.removing.borrow_mut().push(section.clone());
		self.refresh_remove_controls();

		let weak = Rc::downgrade(&self.inner);
		let detach_dom = dom.clone();
		let detached = section.clone();
		animator.slide_up(
			dom,
			&section,
			Box::new(move || {
				detach_dom.detach(&detached);
				if let Some(inner) = weak.upgrade() {
					inner.removing.borrow_mut().retain(|node| node != &detached);
					MultiField { inner }.refresh_remove_controls();
				}
			}),
		);
		tracing::debug!(remaining = self.remaining_count(), "section removal started");
	}

	fn is_removing(&self, section: &D::Node) -> bool {
		self.inner.removing.borrow().contains(section)
	}

	/// Sections that are not on their way out.
	fn remaining_count(&self) -> usize {
		let removing = self.inner.removing.borrow();
		self.sections()
			.iter()
			.filter(|section| !removing.contains(section))
			.count()
	}

	/// Shows remove controls iff at least two sections remain.
	fn refresh_remove_controls(&self) {
		let Inner {
			dom,
			container,
			config,
			..
		} = &*self.inner;
		set_remove_controls_visible(dom, container, config, self.remaining_count() >= 2);
	}

	fn is_section(&self, node: &D::Node) -> bool {
		let dom = &self.inner.dom;
		dom.parent(node).as_ref() == Some(&self.inner.container)
			&& dom.matches(node, &self.inner.config.section)
	}

	/// The section of this container that holds `node`.
	fn enclosing_section(&self, node: &D::Node) -> Option<D::Node> {
		let mut current = Some(node.clone());
		while let Some(candidate) = current {
			if candidate == self.inner.container {
				return None;
			}
			if self.is_section(&candidate) {
				return Some(candidate);
			}
			current = self.inner.dom.parent(&candidate);
		}
		None
	}

	fn handle_click(&self, event: &ClickEvent<D::Node>) {
		let Inner {
			dom,
			container,
			config,
			..
		} = &*self.inner;
		let target = event.target();

		if dom.closest_within(target, &config.btn_add, container).is_some() {
			event.prevent_default();
			self.add_section();
		}

		if dom.closest_within(target, &config.btn_remove, container).is_some() {
			event.prevent_default();
			match self.enclosing_section(target) {
				Some(section) => self.remove_section(&section),
				None => tracing::warn!("remove control is not inside a section"),
			}
		}
	}

	/// Keeps the controller and its listener alive for the rest of the
	/// page's lifetime.
	pub fn forget(self) {
		std::mem::forget(self.inner);
	}
}

/// Binds a controller to every container.
///
/// Each container merges `options` with its own `data-mfield-options` and
/// uses the default collaborators: `window.confirm` and CSS transitions in
/// the browser, an always-accepting prompt and instant transitions
/// elsewhere.
///
/// # Errors
///
/// Stops at the first container that fails to initialise.
pub fn multifield<D, I>(
	dom: &D,
	containers: I,
	options: &MultiFieldOptions,
) -> Result<Vec<MultiField<D>>, MultiFieldError>
where
	D: DomBackend,
	I: IntoIterator<Item = D::Node>,
{
	containers
		.into_iter()
		.map(|container| {
			MultiField::builder(dom.clone(), container)
				.options(options.clone())
				.build()
		})
		.collect()
}
