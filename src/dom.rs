//! DOM abstraction layer
//!
//! The controller never touches a concrete DOM. Everything it needs is
//! expressed by [`DomBackend`]:
//!
//! - [`MemoryDom`]: arena-backed document with its own selector engine. Used
//!   for server-side rendering and tests, available on every target.
//! - `WebDom` (`wasm32` only): thin wrapper over `web-sys` and the live page.
//!
//! Selectors are plain CSS selector strings on both backends. The in-memory
//! engine supports the subset documented in [`selector`].

pub mod builder;
pub mod memory;
pub mod selector;
pub mod style;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::animation::{Animator, InstantAnimator};
use crate::error::DomError;

pub use builder::ElementBuilder;
pub use memory::{MemoryDom, MemoryListener, NodeId};
#[cfg(target_arch = "wasm32")]
pub use web::{WebDom, WebListener};

/// A click delivered to a delegated listener.
#[derive(Debug)]
pub struct ClickEvent<N> {
	target: N,
	default_prevented: Cell<bool>,
}

impl<N> ClickEvent<N> {
	/// Creates an event for the element that was clicked.
	pub fn new(target: N) -> Self {
		Self {
			target,
			default_prevented: Cell::new(false),
		}
	}

	/// The element the click originated from.
	pub fn target(&self) -> &N {
		&self.target
	}

	/// Suppresses the browser default (following a link, submitting a form).
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	/// Whether a listener called [`prevent_default`](Self::prevent_default).
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}
}

/// Delegated click handler.
pub type ClickHandler<N> = Rc<dyn Fn(&ClickEvent<N>)>;

/// Inline style property used to hide elements.
const DISPLAY: &str = "display";

/// DOM primitives used by the multifield controller.
///
/// Node handles are cheap to clone and compare by identity. Query methods
/// return elements only, in document order.
pub trait DomBackend: Clone + 'static {
	/// Handle to an element.
	type Node: Clone + PartialEq + fmt::Debug + 'static;

	/// RAII guard for a click listener. Dropping it unbinds the listener.
	type Listener: 'static;

	/// Checks that `selector` can be used with this backend.
	fn validate_selector(&self, selector: &str) -> Result<(), DomError>;

	/// Descendants of `root` matching `selector`. Invalid selectors match
	/// nothing.
	fn query_all(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

	/// Whether `node` matches `selector`.
	fn matches(&self, node: &Self::Node, selector: &str) -> bool;

	/// Element children of `node`.
	fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

	/// Parent element of `node`, `None` for detached or root nodes.
	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

	fn remove_attribute(&self, node: &Self::Node, name: &str);

	/// Current value of a form control.
	fn value(&self, node: &Self::Node) -> String;

	fn set_value(&self, node: &Self::Node, value: &str);

	fn set_checked(&self, node: &Self::Node, checked: bool);

	fn text_content(&self, node: &Self::Node) -> String;

	/// Value of a style property, `None` when unset.
	fn style_property(&self, node: &Self::Node, property: &str) -> Option<String>;

	/// Sets a style property, or removes it when `value` is `None`.
	fn set_style_property(&self, node: &Self::Node, property: &str, value: Option<&str>);

	/// Detached deep copy of `node` and its subtree. `None` if the backend
	/// refused to clone.
	fn deep_clone(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts `node` as the next sibling of `reference`.
	fn insert_after(&self, reference: &Self::Node, node: &Self::Node);

	/// Removes `node` from its parent.
	fn detach(&self, node: &Self::Node);

	/// Binds `handler` to clicks on `root` and anything inside it.
	fn on_click(&self, root: &Self::Node, handler: ClickHandler<Self::Node>) -> Self::Listener;

	/// Animator used by controllers that were not given one.
	fn default_animator() -> Box<dyn Animator<Self>> {
		Box::new(InstantAnimator)
	}

	/// Direct children of `node` matching `selector`.
	fn children_matching(&self, node: &Self::Node, selector: &str) -> Vec<Self::Node> {
		self.children(node)
			.into_iter()
			.filter(|child| self.matches(child, selector))
			.collect()
	}

	/// Nearest inclusive ancestor of `node` matching `selector`, stopping
	/// before `boundary`.
	fn closest_within(
		&self,
		node: &Self::Node,
		selector: &str,
		boundary: &Self::Node,
	) -> Option<Self::Node> {
		let mut current = Some(node.clone());
		while let Some(candidate) = current {
			if &candidate == boundary {
				return None;
			}
			if self.matches(&candidate, selector) {
				return Some(candidate);
			}
			current = self.parent(&candidate);
		}
		None
	}

	/// Element siblings of `node` that come after it.
	fn following_siblings(&self, node: &Self::Node) -> Vec<Self::Node> {
		let Some(parent) = self.parent(node) else {
			return Vec::new();
		};
		self.children(&parent)
			.into_iter()
			.skip_while(|sibling| sibling != node)
			.skip(1)
			.collect()
	}

	fn next_element_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		self.following_siblings(node).into_iter().next()
	}

	/// Shows or hides `node` through its inline `display` property.
	fn set_visible(&self, node: &Self::Node, visible: bool) {
		if visible {
			self.set_style_property(node, DISPLAY, None);
		} else {
			self.set_style_property(node, DISPLAY, Some("none"));
		}
	}

	/// Whether `node` is not hidden by an inline `display: none`.
	fn is_visible(&self, node: &Self::Node) -> bool {
		self.style_property(node, DISPLAY).as_deref() != Some("none")
	}
}
