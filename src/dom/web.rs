//! Browser DOM backend
//!
//! [`DomBackend`] over the live page through `web-sys`. Only compiled for
//! `wasm32`; selectors are evaluated by the browser.

use std::fmt;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
	Element, Event, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
};

use super::{ClickEvent, ClickHandler, DomBackend};
use crate::animation::{Animator, TransitionAnimator};
use crate::error::DomError;

/// Backend over `window.document`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebDom;

/// Click listener guard. Dropping it removes the listener from the element.
pub struct WebListener {
	element: Element,
	closure: Closure<dyn FnMut(Event)>,
}

impl Drop for WebListener {
	fn drop(&mut self) {
		let _ = self
			.element
			.remove_event_listener_with_callback("click", self.closure.as_ref().unchecked_ref());
	}
}

impl fmt::Debug for WebListener {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebListener")
			.field("element", &self.element.tag_name())
			.finish()
	}
}

impl WebDom {
	pub fn new() -> Self {
		Self
	}

	fn document() -> Result<web_sys::Document, DomError> {
		web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| DomError::Unavailable("no window.document".to_string()))
	}

	/// Elements of the whole document matching `selector`.
	pub fn select(&self, selector: &str) -> Result<Vec<Element>, DomError> {
		let list = Self::document()?
			.query_selector_all(selector)
			.map_err(|err| DomError::invalid_selector(selector, format!("{err:?}")))?;
		Ok(node_list_elements(&list))
	}
}

fn node_list_elements(list: &web_sys::NodeList) -> Vec<Element> {
	(0..list.length())
		.filter_map(|index| list.item(index))
		.filter_map(|node| node.dyn_into::<Element>().ok())
		.collect()
}

/// Element a click originated from. Text node targets resolve to their
/// parent element.
fn event_element(event: &Event) -> Option<Element> {
	let target = event.target()?;
	match target.dyn_into::<Element>() {
		Ok(element) => Some(element),
		Err(target) => target
			.dyn_into::<web_sys::Node>()
			.ok()
			.and_then(|node| node.parent_element()),
	}
}

impl DomBackend for WebDom {
	type Node = Element;
	type Listener = WebListener;

	fn validate_selector(&self, selector: &str) -> Result<(), DomError> {
		Self::document()?
			.create_document_fragment()
			.query_selector(selector)
			.map(|_| ())
			.map_err(|err| DomError::invalid_selector(selector, format!("{err:?}")))
	}

	fn query_all(&self, root: &Element, selector: &str) -> Vec<Element> {
		root.query_selector_all(selector)
			.map(|list| node_list_elements(&list))
			.unwrap_or_default()
	}

	fn matches(&self, node: &Element, selector: &str) -> bool {
		node.matches(selector).unwrap_or(false)
	}

	fn children(&self, node: &Element) -> Vec<Element> {
		let collection = node.children();
		(0..collection.length())
			.filter_map(|index| collection.item(index))
			.collect()
	}

	fn parent(&self, node: &Element) -> Option<Element> {
		node.parent_element()
	}

	fn attribute(&self, node: &Element, name: &str) -> Option<String> {
		node.get_attribute(name)
	}

	fn set_attribute(&self, node: &Element, name: &str, value: &str) {
		let _ = node.set_attribute(name, value);
	}

	fn remove_attribute(&self, node: &Element, name: &str) {
		let _ = node.remove_attribute(name);
	}

	fn value(&self, node: &Element) -> String {
		if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
			input.value()
		} else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
			textarea.value()
		} else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
			select.value()
		} else {
			node.get_attribute("value").unwrap_or_default()
		}
	}

	fn set_value(&self, node: &Element, value: &str) {
		if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
			input.set_value(value);
		} else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
			textarea.set_value(value);
		} else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
			select.set_value(value);
		} else {
			let _ = node.set_attribute("value", value);
		}
	}

	fn set_checked(&self, node: &Element, checked: bool) {
		if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
			input.set_checked(checked);
		}
		if checked {
			let _ = node.set_attribute("checked", "");
		} else {
			let _ = node.remove_attribute("checked");
		}
	}

	fn text_content(&self, node: &Element) -> String {
		node.text_content().unwrap_or_default()
	}

	fn style_property(&self, node: &Element, property: &str) -> Option<String> {
		let inline = node
			.dyn_ref::<HtmlElement>()
			.and_then(|element| element.style().get_property_value(property).ok())
			.filter(|value| !value.is_empty());
		inline.or_else(|| {
			web_sys::window()?
				.get_computed_style(node)
				.ok()
				.flatten()?
				.get_property_value(property)
				.ok()
				.filter(|value| !value.is_empty())
		})
	}

	fn set_style_property(&self, node: &Element, property: &str, value: Option<&str>) {
		let Some(element) = node.dyn_ref::<HtmlElement>() else {
			return;
		};
		let style = element.style();
		let _ = match value {
			Some(value) => style.set_property(property, value),
			None => style.remove_property(property).map(|_| ()),
		};
	}

	fn deep_clone(&self, node: &Element) -> Option<Element> {
		node.clone_node_with_deep(true)
			.ok()?
			.dyn_into::<Element>()
			.ok()
	}

	fn insert_after(&self, reference: &Element, node: &Element) {
		let _ = reference.after_with_node_1(node);
	}

	fn detach(&self, node: &Element) {
		node.remove();
	}

	fn on_click(&self, root: &Element, handler: ClickHandler<Element>) -> WebListener {
		let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
			let Some(target) = event_element(&event) else {
				return;
			};
			let click = ClickEvent::new(target);
			handler(&click);
			if click.default_prevented() {
				event.prevent_default();
			}
		});
		let _ = root.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
		WebListener {
			element: root.clone(),
			closure,
		}
	}

	fn default_animator() -> Box<dyn Animator<Self>> {
		Box::new(TransitionAnimator::default())
	}
}
