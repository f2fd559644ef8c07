//! Removal confirmation.
//!
//! The controller asks a [`Confirm`] implementation before removing a
//! section. The answer is delivered through a [`ConfirmResponder`], so a
//! prompt may answer immediately (`window.confirm`, a closure) or later from
//! a custom dialog.
//!
//! ```
//! use reinhardt_multifield::confirm::{Confirm, ConfirmResponder};
//!
//! // Any `Fn(&str) -> bool` is a synchronous prompt.
//! let prompt = |message: &str| message.ends_with('?');
//! prompt.request("Remove?", ConfirmResponder::new(|accepted| assert!(accepted)));
//! ```

use std::fmt;

/// One-shot answer channel for a confirmation request.
pub struct ConfirmResponder {
	respond: Box<dyn FnOnce(bool)>,
}

impl ConfirmResponder {
	pub fn new(respond: impl FnOnce(bool) + 'static) -> Self {
		Self {
			respond: Box::new(respond),
		}
	}

	pub fn respond(self, accepted: bool) {
		(self.respond)(accepted);
	}

	pub fn accept(self) {
		self.respond(true);
	}

	pub fn decline(self) {
		self.respond(false);
	}
}

impl fmt::Debug for ConfirmResponder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConfirmResponder")
			.field("respond", &"<function>")
			.finish()
	}
}

/// Asks the user whether to go ahead with a removal.
pub trait Confirm {
	/// Shows `message` and answers through `responder`, now or later.
	/// Dropping the responder without answering counts as a decline.
	fn request(&self, message: &str, responder: ConfirmResponder);
}

impl<F> Confirm for F
where
	F: Fn(&str) -> bool,
{
	fn request(&self, message: &str, responder: ConfirmResponder) {
		responder.respond(self(message));
	}
}

/// Answers every request the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticConfirm {
	accept: bool,
}

impl StaticConfirm {
	pub fn accept() -> Self {
		Self { accept: true }
	}

	pub fn decline() -> Self {
		Self { accept: false }
	}
}

impl Confirm for StaticConfirm {
	fn request(&self, _message: &str, responder: ConfirmResponder) {
		responder.respond(self.accept);
	}
}

/// Browser `window.confirm` prompt.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowConfirm;

#[cfg(target_arch = "wasm32")]
impl Confirm for WindowConfirm {
	fn request(&self, message: &str, responder: ConfirmResponder) {
		let accepted = web_sys::window()
			.and_then(|window| window.confirm_with_message(message).ok())
			.unwrap_or(false);
		responder.respond(accepted);
	}
}
