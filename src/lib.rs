//! Reinhardt Multifield - Repeatable Form Sections
//!
//! Manages repeatable groups of form fields ("sections") inside a container
//! element. Users add a section, cloned from the last one with its fields
//! cleared and renumbered, or remove one after confirming. The number of
//! sections can be capped.
//!
//! ## Features
//!
//! - **Section cloning**: values cleared, `name` indices bumped, radios
//!   unchecked, images reset
//! - **Widget re-initialisation**: date-time pickers and searchable selects
//!   through typed [`widgets::WidgetAdapter`]s, no script evaluation
//! - **Layered configuration**: defaults < caller options <
//!   `data-mfield-options` on the container
//! - **Localized confirmation**: built-in catalog or custom messages
//! - **Backend-agnostic**: runs on the live page (`wasm32`) or on the
//!   in-memory [`dom::MemoryDom`] for server-side rendering and tests
//!
//! ## Architecture
//!
//! - [`controller`]: [`MultiField`], its builder and the [`multifield`]
//!   entry point
//! - [`section`]: preparation of cloned sections
//! - [`naming`]: field name renumbering
//! - [`config`]: options, layered sources and validation
//! - [`i18n`]: localized messages
//! - [`dom`]: DOM abstraction layer and backends
//! - [`confirm`], [`animation`], [`widgets`]: injected collaborators
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```
//! use reinhardt_multifield::{MultiFieldOptions, multifield};
//! use reinhardt_multifield::dom::{DomBackend, MemoryDom};
//!
//! let dom = MemoryDom::new();
//! let container = dom
//!     .element("div")
//!     .attr("data-mfield-options", r#"{"max": 3}"#)
//!     .child(
//!         dom.element("fieldset")
//!             .class("item")
//!             .child(dom.element("input").attr("type", "text").class("increment").attr("name", "items[1][name]").build())
//!             .child(dom.element("a").class("btn-remove").text("Remove").build())
//!             .build(),
//!     )
//!     .child(dom.element("a").class("btn-add").text("Add").build())
//!     .build();
//!
//! let options = MultiFieldOptions::new()
//!     .with_section(".item")
//!     .with_btn_add(".btn-add")
//!     .with_btn_remove(".btn-remove");
//! let controllers = multifield(&dom, [container], &options).unwrap();
//! let controller = &controllers[0];
//!
//! let added = controller.add_section().unwrap();
//! let input = dom.query_all(&added, "input")[0];
//! assert_eq!(dom.attribute(&input, "name").as_deref(), Some("items[2][name]"));
//!
//! controller.add_section();
//! assert!(controller.add_section().is_none());
//! assert_eq!(controller.sections_count(), 3);
//! ```

pub mod animation;
pub mod config;
pub mod confirm;
pub mod controller;
pub mod dom;
pub mod error;
pub mod i18n;
pub mod naming;
pub mod section;
pub mod widgets;

pub use config::{MultiFieldConfig, MultiFieldOptions};
pub use controller::{MultiField, MultiFieldBuilder, multifield};
pub use error::{ConfigError, DomError, MultiFieldError, WidgetError};
pub use i18n::{LocaleSetting, Messages};
pub use widgets::{WidgetKind, WidgetOptions, WidgetRegistry};
