//! Element builder for the in-memory document
//!
//! Fluent construction of [`MemoryDom`] trees, used to render multifield
//! markup on the server and to set up documents in tests.
//!
//! ## Example
//!
//! ```
//! use reinhardt_multifield::dom::MemoryDom;
//!
//! let dom = MemoryDom::new();
//! let section = dom
//!     .element("div")
//!     .class("group")
//!     .child(dom.element("input").attr("type", "text").attr("name", "item_1_name").build())
//!     .child(dom.element("button").class("btn-remove").text("Remove").build())
//!     .build();
//!
//! assert_eq!(
//!     dom.outer_html(&section),
//!     "<div class=\"group\"><input type=\"text\" name=\"item_1_name\"><button class=\"btn-remove\">Remove</button></div>"
//! );
//! ```

use super::DomBackend;
use super::memory::{MemoryDom, NodeId};

/// Fluent builder for a [`MemoryDom`] element.
#[derive(Debug)]
pub struct ElementBuilder<'a> {
	dom: &'a MemoryDom,
	node: NodeId,
}

impl MemoryDom {
	/// Starts building a detached element.
	pub fn element(&self, tag: &str) -> ElementBuilder<'_> {
		ElementBuilder {
			dom: self,
			node: self.create_element(tag),
		}
	}
}

impl ElementBuilder<'_> {
	/// Sets the class attribute.
	///
	/// Multiple calls overwrite the previous value. Use space-separated
	/// values for multiple classes.
	pub fn class(self, class: &str) -> Self {
		self.attr("class", class)
	}

	pub fn id(self, id: &str) -> Self {
		self.attr("id", id)
	}

	pub fn style(self, style: &str) -> Self {
		self.attr("style", style)
	}

	/// Sets a custom attribute.
	pub fn attr(self, name: &str, value: &str) -> Self {
		self.dom.set_attribute(&self.node, name, value);
		self
	}

	/// Sets the form value.
	///
	/// For a `select`, add its options first.
	pub fn value(self, value: &str) -> Self {
		self.dom.set_value(&self.node, value);
		self
	}

	pub fn checked(self, checked: bool) -> Self {
		self.dom.set_checked(&self.node, checked);
		self
	}

	/// Replaces the children with a text node.
	pub fn text(self, text: &str) -> Self {
		self.dom.set_text(&self.node, text);
		self
	}

	/// Appends a child element.
	pub fn child(self, child: NodeId) -> Self {
		self.dom.append_child(&self.node, &child);
		self
	}

	/// Appends several child elements in order.
	pub fn children(self, children: impl IntoIterator<Item = NodeId>) -> Self {
		for child in children {
			self.dom.append_child(&self.node, &child);
		}
		self
	}

	/// Finishes the element.
	pub fn build(self) -> NodeId {
		self.node
	}
}
