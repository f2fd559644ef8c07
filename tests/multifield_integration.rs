//! Multifield Integration Tests
//!
//! Drives controllers over the in-memory DOM through real clicks.
//!
//! Test Categories:
//! - Category 1: Initialisation
//! - Category 2: Adding sections
//! - Category 3: Removing sections
//! - Category 4: Collaborators (deferred confirm, deferred animation, widgets)
//! - Category 5: Configuration

use std::cell::RefCell;
use std::rc::Rc;

use reinhardt_multifield::animation::DeferredAnimator;
use reinhardt_multifield::confirm::{Confirm, ConfirmResponder, StaticConfirm};
use reinhardt_multifield::dom::{DomBackend, MemoryDom, NodeId};
use reinhardt_multifield::error::{ConfigError, MultiFieldError, WidgetError};
use reinhardt_multifield::widgets::{WidgetKind, WidgetOptions};
use reinhardt_multifield::{Messages, MultiField, MultiFieldOptions};
use rstest::{fixture, rstest};

/// A container with `count` sections followed by an add link.
struct Form {
	dom: MemoryDom,
	container: NodeId,
	add: NodeId,
}

impl Form {
	fn new(count: usize) -> Self {
		let dom = MemoryDom::new();
		let container = dom.element("div").id("items").build();
		for index in 1..=count {
			let section = section(&dom, index);
			dom.append_child(&container, &section);
		}
		let add = dom
			.element("a")
			.attr("href", "#")
			.class("btn-add")
			.child(dom.element("span").text("Add").build())
			.build();
		dom.append_child(&container, &add);
		Self {
			dom,
			container,
			add,
		}
	}

	fn sections(&self) -> Vec<NodeId> {
		self.dom.children_matching(&self.container, ".group")
	}

	fn remove_controls(&self) -> Vec<NodeId> {
		self.dom.query_all(&self.container, ".btn-remove")
	}

	fn remove_controls_visible(&self) -> bool {
		let controls = self.remove_controls();
		assert!(!controls.is_empty());
		let visible: Vec<bool> = controls
			.iter()
			.map(|control| self.dom.is_visible(control))
			.collect();
		assert!(
			visible.iter().all(|v| *v == visible[0]),
			"remove controls disagree: {visible:?}"
		);
		visible[0]
	}

	fn field(&self, section: &NodeId, selector: &str) -> NodeId {
		self.dom.query_all(section, selector)[0]
	}

	fn name(&self, node: &NodeId) -> String {
		self.dom.attribute(node, "name").unwrap_or_default()
	}

	fn click_remove(&self, section: &NodeId) -> bool {
		let control = self.field(section, ".btn-remove");
		// Click the icon inside the control, as a user would
		let icon = self.dom.children(&control)[0];
		self.dom.click(&icon)
	}
}

fn section(dom: &MemoryDom, index: usize) -> NodeId {
	dom.element("div")
		.class("group")
		.id(&format!("group-{index}"))
		.child(
			dom.element("input")
				.attr("type", "text")
				.class("increment")
				.attr("name", &format!("item_{index}_name"))
				.value(&format!("Item {index}"))
				.build(),
		)
		.child(
			dom.element("input")
				.attr("type", "text")
				.class("increment")
				.attr("name", &format!("item_{index}_qty5"))
				.value("5")
				.build(),
		)
		.child(
			dom.element("input")
				.attr("type", "radio")
				.attr("name", &format!("size_{index}"))
				.attr("value", "large")
				.checked(true)
				.build(),
		)
		.child(
			dom.element("textarea")
				.attr("name", &format!("notes_{index}"))
				.text("handle with care")
				.build(),
		)
		.child(
			dom.element("button")
				.class("btn-remove")
				.child(dom.element("i").class("icon-trash").build())
				.build(),
		)
		.build()
}

fn options() -> MultiFieldOptions {
	MultiFieldOptions::new()
		.with_section(".group")
		.with_btn_add(".btn-add")
		.with_btn_remove(".btn-remove")
}

fn bind(form: &Form, options: MultiFieldOptions) -> MultiField<MemoryDom> {
	MultiField::builder(form.dom.clone(), form.container)
		.options(options)
		.confirm(StaticConfirm::accept())
		.build()
		.unwrap()
}

#[fixture]
fn one_section() -> Form {
	Form::new(1)
}

// ============================================================================
// Category 1: Initialisation
// ============================================================================

#[rstest]
#[case(1, false)]
#[case(2, true)]
#[case(3, true)]
#[case(5, true)]
fn test_remove_controls_visible_iff_two_or_more(#[case] count: usize, #[case] visible: bool) {
	let form = Form::new(count);
	let controller = bind(&form, options());

	assert_eq!(controller.sections_count(), count);
	assert_eq!(form.remove_controls_visible(), visible);
}

#[rstest]
fn test_container_without_sections_is_rejected() {
	let form = Form::new(0);
	let err = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.build()
		.unwrap_err();

	assert!(matches!(err, MultiFieldError::NoSections { selector } if selector == ".group"));
	assert_eq!(form.dom.listener_count(), 0);
}

#[rstest]
fn test_sections_count_ignores_nested_matches(one_section: Form) {
	let form = one_section;
	let nested = form.dom.element("div").class("group").build();
	let first = form.sections()[0];
	form.dom.append_child(&first, &nested);

	let controller = bind(&form, options());
	assert_eq!(controller.sections_count(), 1);
}

// ============================================================================
// Category 2: Adding sections
// ============================================================================

#[rstest]
fn test_add_click_appends_renumbered_section(one_section: Form) {
	let form = one_section;
	let controller = bind(&form, options());

	// The click lands on the span inside the add link
	let label = form.dom.children(&form.add)[0];
	assert!(form.dom.click(&label));

	let sections = form.sections();
	assert_eq!(sections.len(), 2);
	assert_eq!(controller.sections_count(), 2);

	let added = sections[1];
	assert_eq!(form.name(&form.field(&added, "input[name^=item]")), "item_2_name");
	let names: Vec<String> = form
		.dom
		.query_all(&added, "input.increment")
		.iter()
		.map(|field| form.name(field))
		.collect();
	assert_eq!(names, vec!["item_2_name", "item_2_qty5"]);
	assert!(form.remove_controls_visible());
}

#[rstest]
fn test_added_section_is_inserted_after_last_section(one_section: Form) {
	let form = one_section;
	let controller = bind(&form, options());

	let added = controller.add_section().unwrap();
	let children = form.dom.children(&form.container);
	assert_eq!(children, vec![form.sections()[0], added, form.add]);
}

#[rstest]
fn test_clone_clears_values_but_keeps_original(one_section: Form) {
	let form = one_section;
	let controller = bind(&form, options());
	let original = form.sections()[0];

	let added = controller.add_section().unwrap();

	let name = form.field(&added, "input[type=text]");
	let notes = form.field(&added, "textarea");
	assert_eq!(form.dom.value(&name), "");
	assert_eq!(form.dom.value(&notes), "");
	assert_eq!(form.dom.attribute(&added, "id").as_deref(), Some(""));

	let original_name = form.field(&original, "input[type=text]");
	assert_eq!(form.dom.value(&original_name), "Item 1");
	assert_eq!(form.dom.value(&form.field(&original, "textarea")), "handle with care");
	assert_eq!(form.dom.attribute(&original, "id").as_deref(), Some("group-1"));
}

#[rstest]
fn test_clone_unchecks_and_renumbers_radio(one_section: Form) {
	let form = one_section;
	let controller = bind(&form, options());

	let added = controller.add_section().unwrap();
	let radio = form.field(&added, "input[type=radio]");

	assert!(form.dom.attribute(&radio, "checked").is_none());
	assert_eq!(form.name(&radio), "size_2");

	let original_radio = form.field(&form.sections()[0], "input[type=radio]");
	assert!(form.dom.attribute(&original_radio, "checked").is_some());
}

#[rstest]
fn test_fields_without_increment_class_keep_names(one_section: Form) {
	let form = one_section;
	let controller = bind(&form, options());

	let added = controller.add_section().unwrap();
	assert_eq!(form.name(&form.field(&added, "textarea")), "notes_1");
}

#[rstest]
fn test_clone_copies_the_last_section() {
	let form = Form::new(3);
	let controller = bind(&form, options());

	let added = controller.add_section().unwrap();
	assert_eq!(form.name(&form.field(&added, "input.increment")), "item_4_name");
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn test_add_is_noop_at_max(#[case] max: u32) {
	let form = Form::new(max as usize);
	let controller = bind(&form, options().with_max(max));
	let before = form.dom.outer_html(&form.container);

	assert!(controller.add_section().is_none());
	assert!(form.dom.click(&form.add));

	assert_eq!(controller.sections_count(), max as usize);
	assert_eq!(form.dom.outer_html(&form.container), before);
}

#[rstest]
fn test_max_allows_adding_up_to_limit(one_section: Form) {
	let form = one_section;
	let controller = bind(&form, options().with_max(3));

	for _ in 0..5 {
		form.dom.click(&form.add);
	}
	assert_eq!(controller.sections_count(), 3);
}

#[rstest]
fn test_unlimited_when_max_is_zero(one_section: Form) {
	let form = one_section;
	let controller = bind(&form, options().with_max(0));

	for expected in 2..=10 {
		controller.add_section().unwrap();
		assert_eq!(controller.sections_count(), expected);
	}
	let last = *form.sections().last().unwrap();
	assert_eq!(form.name(&form.field(&last, "input.increment")), "item_10_name");
}

// ============================================================================
// Category 3: Removing sections
// ============================================================================

#[rstest]
fn test_confirmed_remove_of_two_leaves_one_and_hides_controls() {
	let form = Form::new(2);
	let _controller = bind(&form, options());
	let second = form.sections()[1];

	assert!(form.click_remove(&second));

	assert_eq!(form.sections().len(), 1);
	assert_eq!(form.dom.parent(&second), None);
	assert!(!form.remove_controls_visible());
}

#[rstest]
fn test_declined_remove_changes_nothing() {
	let form = Form::new(2);
	let _controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.confirm(StaticConfirm::decline())
		.build()
		.unwrap();

	assert!(form.click_remove(&form.sections()[0]));

	assert_eq!(form.sections().len(), 2);
	assert!(form.remove_controls_visible());
}

#[rstest]
fn test_remove_of_three_keeps_controls_visible() {
	let form = Form::new(3);
	let controller = bind(&form, options());
	let middle = form.sections()[1];

	controller.remove_section(&middle);

	assert_eq!(controller.sections_count(), 2);
	assert!(!form.sections().contains(&middle));
	assert!(form.remove_controls_visible());
}

#[rstest]
fn test_confirmation_shows_localized_message() {
	let form = Form::new(2);
	let seen = Rc::new(RefCell::new(Vec::new()));
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options().with_locale("fr"))
		.confirm({
			let seen = Rc::clone(&seen);
			move |message: &str| {
				seen.borrow_mut().push(message.to_string());
				false
			}
		})
		.build()
		.unwrap();

	controller.remove_section(&form.sections()[0]);
	assert_eq!(
		*seen.borrow(),
		vec!["Voulez-vous vraiment supprimer cette section ?".to_string()]
	);
}

#[rstest]
fn test_add_after_remove_shows_controls_again() {
	let form = Form::new(2);
	let controller = bind(&form, options());

	controller.remove_section(&form.sections()[1]);
	assert!(!form.remove_controls_visible());

	form.dom.click(&form.add);
	assert_eq!(controller.sections_count(), 2);
	assert!(form.remove_controls_visible());
}

// ============================================================================
// Category 4: Collaborators
// ============================================================================

/// Prompt that parks responders until the test answers them.
#[derive(Clone, Default)]
struct PendingConfirm {
	pending: Rc<RefCell<Vec<ConfirmResponder>>>,
}

impl PendingConfirm {
	fn answer_all(&self, accepted: bool) {
		let pending: Vec<ConfirmResponder> = self.pending.borrow_mut().drain(..).collect();
		for responder in pending {
			responder.respond(accepted);
		}
	}
}

impl Confirm for PendingConfirm {
	fn request(&self, _message: &str, responder: ConfirmResponder) {
		self.pending.borrow_mut().push(responder);
	}
}

#[rstest]
fn test_deferred_confirmation_and_animation() {
	let form = Form::new(3);
	let confirm = PendingConfirm::default();
	let animator = DeferredAnimator::new();
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.confirm(confirm.clone())
		.animator(animator.clone())
		.build()
		.unwrap();
	let first = form.sections()[0];

	controller.remove_section(&first);
	assert_eq!(controller.sections_count(), 3);

	confirm.answer_all(true);
	// Sliding up, not yet detached
	assert_eq!(animator.pending(), 1);
	assert_eq!(controller.sections_count(), 3);

	animator.finish_all();
	assert_eq!(controller.sections_count(), 2);
	assert_eq!(form.dom.parent(&first), None);
}

#[rstest]
fn test_late_confirmation_for_removed_section_is_ignored() {
	let form = Form::new(3);
	let confirm = PendingConfirm::default();
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.confirm(confirm.clone())
		.build()
		.unwrap();
	let first = form.sections()[0];

	controller.remove_section(&first);
	controller.remove_section(&first);
	confirm.answer_all(true);

	assert_eq!(controller.sections_count(), 2);
	assert!(form.remove_controls_visible());
}

#[rstest]
fn test_confirmation_after_controller_dropped_does_nothing() {
	let form = Form::new(2);
	let confirm = PendingConfirm::default();
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.confirm(confirm.clone())
		.build()
		.unwrap();

	controller.remove_section(&form.sections()[0]);
	drop(controller);
	confirm.answer_all(true);

	assert_eq!(form.sections().len(), 2);
}

#[rstest]
fn test_pending_slide_up_still_counts(one_section: Form) {
	let form = one_section;
	let animator = DeferredAnimator::new();
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options().with_max(2))
		.confirm(StaticConfirm::accept())
		.animator(animator.clone())
		.build()
		.unwrap();

	let added = controller.add_section().unwrap();
	controller.remove_section(&added);
	assert!(controller.add_section().is_none());

	animator.finish_all();
	assert!(controller.add_section().is_some());
}

#[rstest]
fn test_overlapping_removals_hide_controls_of_last_section() {
	let form = Form::new(3);
	let animator = DeferredAnimator::new();
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.confirm(StaticConfirm::accept())
		.animator(animator.clone())
		.build()
		.unwrap();
	let sections = form.sections();

	assert!(form.click_remove(&sections[0]));
	assert!(form.remove_controls_visible());
	assert!(form.click_remove(&sections[1]));
	// Both still sliding up, yet only one section will remain
	assert_eq!(controller.sections_count(), 3);
	assert!(!form.remove_controls_visible());

	animator.finish_all();
	assert_eq!(controller.sections_count(), 1);
	assert!(!form.remove_controls_visible());

	// The last section stays usable as a template
	assert!(controller.add_section().is_some());
	assert!(form.remove_controls_visible());
}

#[rstest]
fn test_removing_a_sliding_section_again_is_ignored() {
	let form = Form::new(3);
	let animator = DeferredAnimator::new();
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.confirm(StaticConfirm::accept())
		.animator(animator.clone())
		.build()
		.unwrap();
	let first = form.sections()[0];

	controller.remove_section(&first);
	controller.remove_section(&first);
	assert_eq!(animator.pending(), 1);

	animator.finish_all();
	assert_eq!(controller.sections_count(), 2);
	assert!(form.remove_controls_visible());
}

#[rstest]
fn test_controls_return_when_section_added_during_slide_up() {
	let form = Form::new(2);
	let animator = DeferredAnimator::new();
	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.confirm(StaticConfirm::accept())
		.animator(animator.clone())
		.build()
		.unwrap();

	controller.remove_section(&form.sections()[0]);
	assert!(!form.remove_controls_visible());

	controller.add_section().unwrap();
	assert!(form.remove_controls_visible());

	animator.finish_all();
	assert_eq!(controller.sections_count(), 2);
	assert!(form.remove_controls_visible());
}

#[rstest]
fn test_widgets_are_initialized_on_clone() {
	let dom = MemoryDom::new();
	let section = dom
		.element("div")
		.class("group")
		.child(
			dom.element("input")
				.attr("type", "text")
				.attr("data-plugin", "datetimepicker")
				.attr("data-options", r#"{"format": "Y-m-d H:i", "step": 30}"#)
				.value("2024-05-01 10:00")
				.build(),
		)
		.child(
			dom.element("select")
				.attr("data-plugin", "select2")
				.class("increment")
				.attr("name", "colors_1")
				.child(dom.element("option").attr("value", "red").text("Red").build())
				.child(dom.element("option").attr("value", "green").text("Green").build())
				.build(),
		)
		.child(dom.element("span").class("select2 select2-container").style("width: 50%;").build())
		.child(dom.element("button").class("btn-remove").build())
		.build();
	let container = dom.element("div").child(section).build();

	let calls = Rc::new(RefCell::new(Vec::new()));
	let controller = MultiField::builder(dom.clone(), container)
		.options(options())
		.widget(WidgetKind::DateTimePicker, {
			let calls = Rc::clone(&calls);
			move |dom: &MemoryDom, input: &NodeId, options: &WidgetOptions| -> Result<(), WidgetError> {
				assert_eq!(dom.value(input), "");
				calls.borrow_mut().push(options.clone());
				Ok(())
			}
		})
		.widget(WidgetKind::Select2, {
			let calls = Rc::clone(&calls);
			move |dom: &MemoryDom, select: &NodeId, options: &WidgetOptions| -> Result<(), WidgetError> {
				calls.borrow_mut().push(options.clone());
				let rendered = dom.element("span").class("select2 select2-container").build();
				dom.insert_after(select, &rendered);
				Ok(())
			}
		})
		.build()
		.unwrap();

	let added = controller.add_section().unwrap();

	let calls = calls.borrow();
	assert_eq!(calls.len(), 2);
	let WidgetOptions::DateTimePicker(picker) = &calls[0] else {
		panic!("expected date-time picker first, got {:?}", calls[0]);
	};
	assert_eq!(picker.format.as_deref(), Some("Y-m-d H:i"));
	assert_eq!(picker.step, Some(30));
	let WidgetOptions::Select2(select) = &calls[1] else {
		panic!("expected select options, got {:?}", calls[1]);
	};
	let ids: Vec<&str> = select.data.iter().map(|option| option.id.as_str()).collect();
	assert_eq!(ids, vec!["red", "green"]);

	let rendered = dom.query_all(&added, "span.select2");
	assert_eq!(rendered.len(), 1);
	assert_eq!(dom.style_property(&rendered[0], "width").as_deref(), Some("50%"));
	let select = dom.query_all(&added, "select")[0];
	assert_eq!(dom.attribute(&select, "name").as_deref(), Some("colors_2"));
}

#[rstest]
fn test_failing_widget_does_not_abort_add(one_section: Form) {
	let form = one_section;
	let first = form.sections()[0];
	let picker = form
		.dom
		.element("input")
		.attr("type", "text")
		.attr("data-plugin", "datetimepicker")
		.build();
	form.dom.append_child(&first, &picker);

	let controller = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.widget(
			WidgetKind::DateTimePicker,
			|_: &MemoryDom, _: &NodeId, _: &WidgetOptions| -> Result<(), WidgetError> {
				Err(WidgetError::Initialization {
					kind: WidgetKind::DateTimePicker,
					message: "picker script not loaded".to_string(),
				})
			},
		)
		.build()
		.unwrap();

	assert!(controller.add_section().is_some());
	assert_eq!(controller.sections_count(), 2);
}

// ============================================================================
// Category 5: Configuration
// ============================================================================

#[rstest]
fn test_element_options_override_caller_options(one_section: Form) {
	let form = one_section;
	form.dom.set_attribute(
		&form.container,
		"data-mfield-options",
		r#"{"max": 2, "locale": {"messages": {"removeConfirmation": "Delete row?"}}}"#,
	);

	let controller = bind(
		&form,
		options()
			.with_max(10)
			.with_locale(Messages::new("Remove?")),
	);

	assert_eq!(controller.config().max, 2);
	assert_eq!(controller.config().messages, Messages::new("Delete row?"));
	controller.add_section();
	assert!(controller.add_section().is_none());
}

#[rstest]
fn test_element_options_can_supply_required_selectors(one_section: Form) {
	let form = one_section;
	form.dom.set_attribute(
		&form.container,
		"data-mfield-options",
		r#"{"section": ".group", "btnAdd": ".btn-add", "btnRemove": ".btn-remove"}"#,
	);

	let controller = bind(&form, MultiFieldOptions::new());
	assert_eq!(controller.config().section, ".group");
}

#[rstest]
fn test_invalid_configuration_binds_nothing(one_section: Form) {
	let form = one_section;
	form.dom
		.set_attribute(&form.container, "data-mfield-options", "{max: 2}");

	let err = MultiField::builder(form.dom.clone(), form.container)
		.options(options())
		.build()
		.unwrap_err();

	assert!(matches!(
		err,
		MultiFieldError::Config(ConfigError::InvalidElementOptions(_))
	));
	assert_eq!(form.dom.listener_count(), 0);
}

#[rstest]
#[case(MultiFieldOptions::new().with_btn_add(".btn-add").with_btn_remove(".btn-remove"))]
#[case(options().with_btn_add(""))]
#[case(options().with_section("div:first-child"))]
#[case(options().with_locale("tlh"))]
fn test_bad_options_are_rejected(one_section: Form, #[case] bad: MultiFieldOptions) {
	let form = one_section;
	let result = MultiField::builder(form.dom.clone(), form.container)
		.options(bad)
		.build();
	assert!(matches!(result, Err(MultiFieldError::Config(_))));
}
