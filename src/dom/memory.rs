//! In-memory DOM
//!
//! An arena-backed element tree implementing [`DomBackend`]. It is used for
//! server-side rendering of multifield markup and for driving controllers in
//! tests without a browser.
//!
//! ## Model
//!
//! ```text
//! MemoryDom ──Rc<RefCell>──► Arena
//!                             ├── nodes: Vec<NodeData>   (NodeId = index)
//!                             └── listeners: Vec<ListenerEntry>
//! ```
//!
//! Nodes are never freed; detaching only unlinks them from their parent.
//! Form state is kept in attributes: an input's value is its `value`
//! attribute, a radio is checked when it has a `checked` attribute, a
//! textarea's value is its text and a select's value is the value of its
//! `selected` option (or first option).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::selector::{MatchElement, SelectorList};
use super::style::StyleDeclarations;
use super::{ClickEvent, ClickHandler, DomBackend};
use crate::error::DomError;

/// Elements serialised without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

/// Handle to a node of a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
enum NodeKind {
	Element {
		tag: String,
		attributes: IndexMap<String, String>,
	},
	Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

struct ListenerEntry {
	id: u64,
	node: NodeId,
	handler: ClickHandler<NodeId>,
}

#[derive(Default)]
struct Arena {
	nodes: Vec<NodeData>,
	listeners: Vec<ListenerEntry>,
	next_listener: u64,
}

/// Arena-backed document. Cloning yields another handle to the same tree.
#[derive(Clone, Default)]
pub struct MemoryDom {
	inner: Rc<RefCell<Arena>>,
}

/// Click listener guard returned by [`MemoryDom::on_click`].
#[derive(Debug)]
pub struct MemoryListener {
	arena: Weak<RefCell<Arena>>,
	id: u64,
}

impl Drop for MemoryListener {
	fn drop(&mut self) {
		if let Some(arena) = self.arena.upgrade()
			&& let Ok(mut arena) = arena.try_borrow_mut()
		{
			arena.listeners.retain(|entry| entry.id != self.id);
		}
	}
}

#[derive(Clone, Copy)]
struct ElementRef<'a> {
	arena: &'a Arena,
	id: NodeId,
}

impl MatchElement for ElementRef<'_> {
	fn tag_name(&self) -> &str {
		match &self.arena.node(self.id).kind {
			NodeKind::Element { tag, .. } => tag,
			NodeKind::Text(_) => "",
		}
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.arena.attribute(self.id, name)
	}

	fn parent_element(&self) -> Option<Self> {
		self.arena.node(self.id).parent.map(|id| ElementRef {
			arena: self.arena,
			id,
		})
	}
}

impl Arena {
	fn node(&self, id: NodeId) -> &NodeData {
		&self.nodes[id.0 as usize]
	}

	fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
		&mut self.nodes[id.0 as usize]
	}

	fn push(&mut self, kind: NodeKind) -> NodeId {
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(NodeData {
			kind,
			parent: None,
			children: Vec::new(),
		});
		id
	}

	fn is_element(&self, id: NodeId) -> bool {
		matches!(self.node(id).kind, NodeKind::Element { .. })
	}

	fn tag(&self, id: NodeId) -> Option<&str> {
		match &self.node(id).kind {
			NodeKind::Element { tag, .. } => Some(tag),
			NodeKind::Text(_) => None,
		}
	}

	fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		match &self.node(id).kind {
			NodeKind::Element { attributes, .. } => attributes
				.get(&name.to_ascii_lowercase())
				.map(String::as_str),
			NodeKind::Text(_) => None,
		}
	}

	fn attributes_mut(&mut self, id: NodeId) -> Option<&mut IndexMap<String, String>> {
		match &mut self.node_mut(id).kind {
			NodeKind::Element { attributes, .. } => Some(attributes),
			NodeKind::Text(_) => None,
		}
	}

	fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
		if let Some(attributes) = self.attributes_mut(id) {
			attributes.insert(name.to_ascii_lowercase(), value.to_string());
		}
	}

	fn remove_attribute(&mut self, id: NodeId, name: &str) {
		if let Some(attributes) = self.attributes_mut(id) {
			attributes.shift_remove(&name.to_ascii_lowercase());
		}
	}

	fn element_children(&self, id: NodeId) -> Vec<NodeId> {
		self.node(id)
			.children
			.iter()
			.copied()
			.filter(|child| self.is_element(*child))
			.collect()
	}

	/// Descendants of `root` in document order, `root` excluded.
	fn descendants(&self, root: NodeId) -> Vec<NodeId> {
		let mut found = Vec::new();
		let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
		while let Some(id) = stack.pop() {
			found.push(id);
			stack.extend(self.node(id).children.iter().rev().copied());
		}
		found
	}

	fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
		self.is_element(id) && selector.matches(&ElementRef { arena: self, id })
	}

	fn unlink(&mut self, id: NodeId) {
		if let Some(parent) = self.node_mut(id).parent.take() {
			self.node_mut(parent).children.retain(|child| *child != id);
		}
	}

	fn text_content(&self, id: NodeId) -> String {
		match &self.node(id).kind {
			NodeKind::Text(text) => text.clone(),
			NodeKind::Element { .. } => self
				.descendants(id)
				.into_iter()
				.filter_map(|node| match &self.node(node).kind {
					NodeKind::Text(text) => Some(text.as_str()),
					NodeKind::Element { .. } => None,
				})
				.collect(),
		}
	}

	fn replace_text(&mut self, id: NodeId, text: &str) {
		for child in std::mem::take(&mut self.node_mut(id).children) {
			self.node_mut(child).parent = None;
		}
		if !text.is_empty() {
			let text_node = self.push(NodeKind::Text(text.to_string()));
			self.node_mut(text_node).parent = Some(id);
			self.node_mut(id).children.push(text_node);
		}
	}

	fn options(&self, select: NodeId) -> Vec<NodeId> {
		self.descendants(select)
			.into_iter()
			.filter(|id| self.tag(*id) == Some("option"))
			.collect()
	}

	fn option_value(&self, option: NodeId) -> String {
		self.attribute(option, "value")
			.map(str::to_string)
			.unwrap_or_else(|| self.text_content(option))
	}

	fn clone_subtree(&mut self, source: NodeId) -> NodeId {
		let kind = self.node(source).kind.clone();
		let copy = self.push(kind);
		for child in self.node(source).children.clone() {
			let child_copy = self.clone_subtree(child);
			self.node_mut(child_copy).parent = Some(copy);
			self.node_mut(copy).children.push(child_copy);
		}
		copy
	}

	fn write_html(&self, id: NodeId, out: &mut String) {
		match &self.node(id).kind {
			NodeKind::Text(text) => out.push_str(&html_escape(text)),
			NodeKind::Element { tag, attributes } => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in attributes {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(&html_escape(value));
					out.push('"');
				}
				out.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) {
					return;
				}
				for child in &self.node(id).children {
					self.write_html(*child, out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
		}
	}
}

/// Escapes HTML special characters.
fn html_escape(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

impl MemoryDom {
	/// Creates an empty document.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element.
	pub fn create_element(&self, tag: &str) -> NodeId {
		self.inner.borrow_mut().push(NodeKind::Element {
			tag: tag.to_ascii_lowercase(),
			attributes: IndexMap::new(),
		})
	}

	/// Creates a detached text node.
	pub fn create_text(&self, text: &str) -> NodeId {
		self.inner
			.borrow_mut()
			.push(NodeKind::Text(text.to_string()))
	}

	/// Appends `child` to `parent`, moving it if it is already attached.
	pub fn append_child(&self, parent: &NodeId, child: &NodeId) {
		let mut arena = self.inner.borrow_mut();
		arena.unlink(*child);
		arena.node_mut(*child).parent = Some(*parent);
		arena.node_mut(*parent).children.push(*child);
	}

	/// Replaces the children of `node` with a single text node.
	pub fn set_text(&self, node: &NodeId, text: &str) {
		self.inner.borrow_mut().replace_text(*node, text);
	}

	/// Lower-case tag name, `None` for text nodes.
	pub fn tag_name(&self, node: &NodeId) -> Option<String> {
		self.inner.borrow().tag(*node).map(str::to_string)
	}

	/// Whether `node` has `ancestor` somewhere above it.
	pub fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
		let arena = self.inner.borrow();
		let mut current = arena.node(*node).parent;
		while let Some(id) = current {
			if id == *ancestor {
				return true;
			}
			current = arena.node(id).parent;
		}
		false
	}

	/// Serialises `node` and its subtree.
	pub fn outer_html(&self, node: &NodeId) -> String {
		let mut out = String::new();
		self.inner.borrow().write_html(*node, &mut out);
		out
	}

	/// Simulates a click on `target`.
	///
	/// The event bubbles from `target` up through its ancestors, invoking
	/// listeners bound on each of them. The propagation path is fixed before
	/// the first listener runs. Returns whether a listener prevented the
	/// default action.
	pub fn click(&self, target: &NodeId) -> bool {
		let event = ClickEvent::new(*target);
		let path = {
			let arena = self.inner.borrow();
			let mut path = vec![*target];
			let mut current = arena.node(*target).parent;
			while let Some(id) = current {
				path.push(id);
				current = arena.node(id).parent;
			}
			path
		};

		for node in path {
			let handlers: Vec<ClickHandler<NodeId>> = self
				.inner
				.borrow()
				.listeners
				.iter()
				.filter(|entry| entry.node == node)
				.map(|entry| Rc::clone(&entry.handler))
				.collect();
			for handler in handlers {
				handler(&event);
			}
		}
		event.default_prevented()
	}

	/// Number of click listeners currently bound.
	pub fn listener_count(&self) -> usize {
		self.inner.borrow().listeners.len()
	}
}

impl fmt::Debug for MemoryDom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let arena = self.inner.borrow();
		f.debug_struct("MemoryDom")
			.field("nodes", &arena.nodes.len())
			.field("listeners", &arena.listeners.len())
			.finish()
	}
}

impl DomBackend for MemoryDom {
	type Node = NodeId;
	type Listener = MemoryListener;

	fn validate_selector(&self, selector: &str) -> Result<(), DomError> {
		SelectorList::parse(selector).map(|_| ())
	}

	fn query_all(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
		let Ok(selector) = SelectorList::parse(selector) else {
			return Vec::new();
		};
		let arena = self.inner.borrow();
		arena
			.descendants(*root)
			.into_iter()
			.filter(|id| arena.matches(*id, &selector))
			.collect()
	}

	fn matches(&self, node: &NodeId, selector: &str) -> bool {
		SelectorList::parse(selector)
			.is_ok_and(|selector| self.inner.borrow().matches(*node, &selector))
	}

	fn children(&self, node: &NodeId) -> Vec<NodeId> {
		self.inner.borrow().element_children(*node)
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.inner.borrow().node(*node).parent
	}

	fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		self.inner
			.borrow()
			.attribute(*node, name)
			.map(str::to_string)
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
		self.inner.borrow_mut().set_attribute(*node, name, value);
	}

	fn remove_attribute(&self, node: &NodeId, name: &str) {
		self.inner.borrow_mut().remove_attribute(*node, name);
	}

	fn value(&self, node: &NodeId) -> String {
		let arena = self.inner.borrow();
		let tag = arena.tag(*node).map(str::to_string);
		match tag.as_deref() {
			Some("textarea") => arena.text_content(*node),
			Some("select") => {
				let options = arena.options(*node);
				options
					.iter()
					.find(|option| arena.attribute(**option, "selected").is_some())
					.or_else(|| options.first())
					.map(|option| arena.option_value(*option))
					.unwrap_or_default()
			}
			_ => arena
				.attribute(*node, "value")
				.map(str::to_string)
				.unwrap_or_default(),
		}
	}

	fn set_value(&self, node: &NodeId, value: &str) {
		let mut arena = self.inner.borrow_mut();
		let tag = arena.tag(*node).map(str::to_string);
		match tag.as_deref() {
			Some("textarea") => arena.replace_text(*node, value),
			Some("select") => {
				for option in arena.options(*node) {
					if arena.option_value(option) == value {
						arena.set_attribute(option, "selected", "");
					} else {
						arena.remove_attribute(option, "selected");
					}
				}
			}
			_ => arena.set_attribute(*node, "value", value),
		}
	}

	fn set_checked(&self, node: &NodeId, checked: bool) {
		let mut arena = self.inner.borrow_mut();
		if checked {
			arena.set_attribute(*node, "checked", "");
		} else {
			arena.remove_attribute(*node, "checked");
		}
	}

	fn text_content(&self, node: &NodeId) -> String {
		self.inner.borrow().text_content(*node)
	}

	fn style_property(&self, node: &NodeId, property: &str) -> Option<String> {
		let arena = self.inner.borrow();
		let style = StyleDeclarations::parse(arena.attribute(*node, "style")?);
		style.get(property).map(str::to_string)
	}

	fn set_style_property(&self, node: &NodeId, property: &str, value: Option<&str>) {
		let mut arena = self.inner.borrow_mut();
		let current = arena.attribute(*node, "style").map(str::to_string);
		let mut style = StyleDeclarations::parse(current.as_deref().unwrap_or_default());
		match value {
			Some(value) => style.set(property, value),
			None => style.remove(property),
		}
		if current.is_some() || !style.is_empty() {
			arena.set_attribute(*node, "style", &style.to_string());
		}
	}

	fn deep_clone(&self, node: &NodeId) -> Option<NodeId> {
		Some(self.inner.borrow_mut().clone_subtree(*node))
	}

	fn insert_after(&self, reference: &NodeId, node: &NodeId) {
		let mut arena = self.inner.borrow_mut();
		let Some(parent) = arena.node(*reference).parent else {
			return;
		};
		arena.unlink(*node);
		let siblings = &mut arena.node_mut(parent).children;
		let position = siblings
			.iter()
			.position(|sibling| sibling == reference)
			.map_or(siblings.len(), |index| index + 1);
		siblings.insert(position, *node);
		arena.node_mut(*node).parent = Some(parent);
	}

	fn detach(&self, node: &NodeId) {
		self.inner.borrow_mut().unlink(*node);
	}

	fn on_click(&self, root: &NodeId, handler: ClickHandler<NodeId>) -> MemoryListener {
		let mut arena = self.inner.borrow_mut();
		let id = arena.next_listener;
		arena.next_listener += 1;
		arena.listeners.push(ListenerEntry {
			id,
			node: *root,
			handler,
		});
		MemoryListener {
			arena: Rc::downgrade(&self.inner),
			id,
		}
	}
}
