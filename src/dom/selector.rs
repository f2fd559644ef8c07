//! CSS selector engine for the in-memory document.
//!
//! Supported syntax:
//!
//! - type (`input`), universal (`*`), class (`.group`) and id (`#main`)
//! - attributes: `[name]`, `[type=radio]`, `[type="radio"]`, and the
//!   `~=`, `|=`, `^=`, `$=`, `*=` operators
//! - descendant (` `) and child (`>`) combinators
//! - selector lists (`input.increment, textarea.increment`)
//!
//! Pseudo-classes and sibling combinators are rejected with
//! [`DomError::InvalidSelector`].
//!
//! Type and attribute names are matched case-insensitively, attribute values
//! and classes case-sensitively, as in HTML documents.

use crate::error::DomError;

/// Read access to an element, as needed for matching.
pub trait MatchElement: Sized {
	/// Lower-case tag name.
	fn tag_name(&self) -> &str;

	fn attribute(&self, name: &str) -> Option<&str>;

	fn parent_element(&self) -> Option<Self>;

	fn has_class(&self, class: &str) -> bool {
		self.attribute("class")
			.is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
	}
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
	selectors: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
	/// Left to right.
	compounds: Vec<Compound>,
	/// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
	combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
	Descendant,
	Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
	tag: Option<String>,
	ids: Vec<String>,
	classes: Vec<String>,
	attributes: Vec<AttributeSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSelector {
	name: String,
	condition: Option<(AttributeOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOp {
	Equals,
	Includes,
	DashMatch,
	Prefix,
	Suffix,
	Substring,
}

impl SelectorList {
	/// Parses a selector list.
	///
	/// # Example
	///
	/// ```
	/// use reinhardt_multifield::dom::selector::SelectorList;
	///
	/// assert!(SelectorList::parse("input.increment, select[data-plugin=select2]").is_ok());
	/// assert!(SelectorList::parse("li:first-child").is_err());
	/// ```
	pub fn parse(input: &str) -> Result<Self, DomError> {
		Parser::new(input).parse_list()
	}

	/// Whether `element` matches any selector in the list.
	pub fn matches<E: MatchElement>(&self, element: &E) -> bool {
		self.selectors.iter().any(|selector| selector.matches(element))
	}
}

impl ComplexSelector {
	fn matches<E: MatchElement>(&self, element: &E) -> bool {
		let last = self.compounds.len() - 1;
		self.compounds[last].matches(element) && self.matches_ancestors(last, element)
	}

	/// Matches `compounds[..index]` against the ancestors of `element`,
	/// which already matched `compounds[index]`.
	fn matches_ancestors<E: MatchElement>(&self, index: usize, element: &E) -> bool {
		if index == 0 {
			return true;
		}
		let wanted = &self.compounds[index - 1];
		match self.combinators[index - 1] {
			Combinator::Child => element
				.parent_element()
				.is_some_and(|parent| wanted.matches(&parent) && self.matches_ancestors(index - 1, &parent)),
			Combinator::Descendant => {
				let mut ancestor = element.parent_element();
				while let Some(candidate) = ancestor {
					if wanted.matches(&candidate) && self.matches_ancestors(index - 1, &candidate) {
						return true;
					}
					ancestor = candidate.parent_element();
				}
				false
			}
		}
	}
}

impl Compound {
	fn matches<E: MatchElement>(&self, element: &E) -> bool {
		if let Some(tag) = &self.tag
			&& element.tag_name() != tag
		{
			return false;
		}
		self.ids
			.iter()
			.all(|id| element.attribute("id") == Some(id.as_str()))
			&& self.classes.iter().all(|class| element.has_class(class))
			&& self
				.attributes
				.iter()
				.all(|attribute| attribute.matches(element))
	}
}

impl AttributeSelector {
	fn matches<E: MatchElement>(&self, element: &E) -> bool {
		let Some(actual) = element.attribute(&self.name) else {
			return false;
		};
		let Some((op, expected)) = &self.condition else {
			return true;
		};
		let expected = expected.as_str();
		match op {
			AttributeOp::Equals => actual == expected,
			AttributeOp::Includes => {
				!expected.is_empty() && actual.split_whitespace().any(|word| word == expected)
			}
			AttributeOp::DashMatch => {
				actual == expected
					|| actual
						.strip_prefix(expected)
						.is_some_and(|rest| rest.starts_with('-'))
			}
			AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
			AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
			AttributeOp::Substring => !expected.is_empty() && actual.contains(expected),
		}
	}
}

struct Parser<'a> {
	input: &'a str,
	chars: Vec<char>,
	pos: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self {
			input,
			chars: input.chars().collect(),
			pos: 0,
		}
	}

	fn error(&self, reason: impl Into<String>) -> DomError {
		DomError::invalid_selector(self.input, reason)
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn advance(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += 1;
		Some(c)
	}

	/// Skips whitespace, returning whether any was skipped.
	fn skip_whitespace(&mut self) -> bool {
		let start = self.pos;
		while self.peek().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
		self.pos > start
	}

	fn parse_list(&mut self) -> Result<SelectorList, DomError> {
		let mut selectors = Vec::new();
		loop {
			self.skip_whitespace();
			selectors.push(self.parse_complex()?);
			self.skip_whitespace();
			match self.advance() {
				None => break,
				Some(',') => continue,
				Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
			}
		}
		Ok(SelectorList { selectors })
	}

	fn parse_complex(&mut self) -> Result<ComplexSelector, DomError> {
		let mut compounds = vec![self.parse_compound()?];
		let mut combinators = Vec::new();

		loop {
			let had_whitespace = self.skip_whitespace();
			match self.peek() {
				None | Some(',') => break,
				Some('>') => {
					self.pos += 1;
					self.skip_whitespace();
					combinators.push(Combinator::Child);
				}
				Some(c @ ('+' | '~')) => {
					return Err(self.error(format!("unsupported combinator `{c}`")));
				}
				Some(_) if had_whitespace => combinators.push(Combinator::Descendant),
				Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
			}
			compounds.push(self.parse_compound()?);
		}

		Ok(ComplexSelector {
			compounds,
			combinators,
		})
	}

	fn parse_compound(&mut self) -> Result<Compound, DomError> {
		let mut compound = Compound::default();
		let mut has_part = false;

		match self.peek() {
			Some('*') => {
				self.pos += 1;
				has_part = true;
			}
			Some(c) if c.is_ascii_alphabetic() => {
				compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
				has_part = true;
			}
			_ => {}
		}

		loop {
			match self.peek() {
				Some('.') => {
					self.pos += 1;
					compound.classes.push(self.parse_ident()?);
				}
				Some('#') => {
					self.pos += 1;
					compound.ids.push(self.parse_ident()?);
				}
				Some('[') => {
					self.pos += 1;
					compound.attributes.push(self.parse_attribute()?);
				}
				Some(':') => return Err(self.error("pseudo-classes are not supported")),
				_ => break,
			}
			has_part = true;
		}

		if has_part {
			Ok(compound)
		} else {
			Err(self.error("expected a selector"))
		}
	}

	fn parse_ident(&mut self) -> Result<String, DomError> {
		let start = self.pos;
		while self
			.peek()
			.is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
		{
			self.pos += 1;
		}
		if self.pos == start {
			return Err(self.error("expected an identifier"));
		}
		Ok(self.chars[start..self.pos].iter().collect())
	}

	fn parse_attribute(&mut self) -> Result<AttributeSelector, DomError> {
		self.skip_whitespace();
		let name = self.parse_ident()?.to_ascii_lowercase();
		self.skip_whitespace();

		let op = match self.advance() {
			Some(']') => {
				return Ok(AttributeSelector {
					name,
					condition: None,
				});
			}
			Some('=') => AttributeOp::Equals,
			Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
				if self.advance() != Some('=') {
					return Err(self.error(format!("expected `=` after `{c}`")));
				}
				match c {
					'~' => AttributeOp::Includes,
					'|' => AttributeOp::DashMatch,
					'^' => AttributeOp::Prefix,
					'$' => AttributeOp::Suffix,
					_ => AttributeOp::Substring,
				}
			}
			Some(c) => return Err(self.error(format!("unexpected `{c}` in attribute selector"))),
			None => return Err(self.error("unterminated attribute selector")),
		};

		self.skip_whitespace();
		let value = match self.peek() {
			Some(quote @ ('"' | '\'')) => {
				self.pos += 1;
				self.parse_quoted(quote)?
			}
			_ => self.parse_ident()?,
		};
		self.skip_whitespace();

		if self.advance() != Some(']') {
			return Err(self.error("unterminated attribute selector"));
		}
		Ok(AttributeSelector {
			name,
			condition: Some((op, value)),
		})
	}

	fn parse_quoted(&mut self, quote: char) -> Result<String, DomError> {
		let mut value = String::new();
		loop {
			match self.advance() {
				Some(c) if c == quote => return Ok(value),
				Some('\\') => match self.advance() {
					Some(escaped) => value.push(escaped),
					None => return Err(self.error("unterminated string")),
				},
				Some(c) => value.push(c),
				None => return Err(self.error("unterminated string")),
			}
		}
	}
}
