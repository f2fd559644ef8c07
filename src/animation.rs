//! Section transitions.
//!
//! New sections fade in; removed sections slide up and are detached once the
//! slide-up completes. The controller only relies on the completion callback
//! being called eventually. It never waits for a fade-in.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::dom::DomBackend;

/// Called when a slide-up has finished.
pub type Completion = Box<dyn FnOnce()>;

/// Plays section transitions.
pub trait Animator<D: DomBackend> {
	/// Makes a freshly inserted section visible.
	fn fade_in(&self, dom: &D, node: &D::Node);

	/// Hides a section, then calls `on_complete`.
	fn slide_up(&self, dom: &D, node: &D::Node, on_complete: Completion);
}

/// Shows and hides immediately; completions run synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantAnimator;

impl<D: DomBackend> Animator<D> for InstantAnimator {
	fn fade_in(&self, dom: &D, node: &D::Node) {
		dom.set_visible(node, true);
	}

	fn slide_up(&self, dom: &D, node: &D::Node, on_complete: Completion) {
		dom.set_visible(node, false);
		on_complete();
	}
}

/// Queues slide-up completions until the host finishes them.
///
/// Useful when frames are driven by the host, and for observing the window
/// between a confirmed removal and the detach.
#[derive(Clone, Default)]
pub struct DeferredAnimator {
	pending: Rc<RefCell<VecDeque<Completion>>>,
}

impl DeferredAnimator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of slide-ups still running.
	pub fn pending(&self) -> usize {
		self.pending.borrow().len()
	}

	/// Completes the oldest pending slide-up. Returns `false` if none was
	/// pending.
	pub fn finish_next(&self) -> bool {
		let next = self.pending.borrow_mut().pop_front();
		match next {
			Some(complete) => {
				complete();
				true
			}
			None => false,
		}
	}

	/// Completes every pending slide-up, including ones queued while
	/// finishing.
	pub fn finish_all(&self) {
		while self.finish_next() {}
	}
}

impl fmt::Debug for DeferredAnimator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeferredAnimator")
			.field("pending", &self.pending())
			.finish()
	}
}

impl<D: DomBackend> Animator<D> for DeferredAnimator {
	fn fade_in(&self, dom: &D, node: &D::Node) {
		dom.set_visible(node, true);
	}

	fn slide_up(&self, _dom: &D, _node: &D::Node, on_complete: Completion) {
		self.pending.borrow_mut().push_back(on_complete);
	}
}

#[cfg(target_arch = "wasm32")]
pub use transition::TransitionAnimator;

#[cfg(target_arch = "wasm32")]
mod transition {
	use wasm_bindgen::JsCast;
	use wasm_bindgen::closure::Closure;
	use web_sys::{Element, HtmlElement};

	use super::{Animator, Completion};
	use crate::dom::{DomBackend, WebDom};

	/// Duration of a "fast" transition.
	const FAST_MS: i32 = 200;

	/// CSS transition based animations for the browser backend.
	#[derive(Debug, Clone, Copy)]
	pub struct TransitionAnimator {
		duration_ms: i32,
	}

	impl Default for TransitionAnimator {
		fn default() -> Self {
			Self {
				duration_ms: FAST_MS,
			}
		}
	}

	impl TransitionAnimator {
		pub fn new(duration_ms: i32) -> Self {
			Self { duration_ms }
		}
	}

	fn after(delay_ms: i32, callback: impl FnOnce() + 'static) {
		let Some(window) = web_sys::window() else {
			callback();
			return;
		};
		let callback = Closure::once_into_js(callback);
		if window
			.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms)
			.is_err()
		{
			tracing::warn!("setTimeout failed, transition end will not fire");
		}
	}

	impl Animator<WebDom> for TransitionAnimator {
		fn fade_in(&self, dom: &WebDom, node: &Element) {
			let transition = format!("opacity {}ms", self.duration_ms);
			dom.set_style_property(node, "opacity", Some("0"));
			dom.set_visible(node, true);
			dom.set_style_property(node, "transition", Some(&transition));

			let dom = *dom;
			let node = node.clone();
			let duration = self.duration_ms;
			after(0, move || {
				dom.set_style_property(&node, "opacity", Some("1"));
				after(duration, move || {
					dom.set_style_property(&node, "transition", None);
					dom.set_style_property(&node, "opacity", None);
				});
			});
		}

		fn slide_up(&self, dom: &WebDom, node: &Element, on_complete: Completion) {
			let height = node
				.dyn_ref::<HtmlElement>()
				.map(|element| element.offset_height())
				.unwrap_or(0);
			let transition = format!(
				"height {ms}ms, padding {ms}ms, margin {ms}ms",
				ms = self.duration_ms
			);
			dom.set_style_property(node, "overflow", Some("hidden"));
			dom.set_style_property(node, "height", Some(&format!("{height}px")));
			dom.set_style_property(node, "transition", Some(&transition));

			let dom = *dom;
			let node = node.clone();
			let duration = self.duration_ms;
			after(0, move || {
				for property in ["height", "padding-top", "padding-bottom", "margin-top", "margin-bottom"] {
					dom.set_style_property(&node, property, Some("0"));
				}
				after(duration, move || {
					dom.set_visible(&node, false);
					on_complete();
				});
			});
		}
	}
}
