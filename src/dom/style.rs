//! Inline `style` attribute handling for the in-memory document.

use indexmap::IndexMap;

/// Parsed declarations of an inline `style` attribute.
///
/// Property names are lower-cased; declaration order is preserved so that
/// serialisation is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclarations {
	properties: IndexMap<String, String>,
}

impl StyleDeclarations {
	/// Parses `color: red; width: 120px`. Malformed declarations are skipped.
	pub fn parse(style: &str) -> Self {
		let properties = style
			.split(';')
			.filter_map(|declaration| {
				let (name, value) = declaration.split_once(':')?;
				let name = name.trim().to_ascii_lowercase();
				let value = value.trim();
				(!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
			})
			.collect();
		Self { properties }
	}

	pub fn get(&self, property: &str) -> Option<&str> {
		self.properties
			.get(&property.to_ascii_lowercase())
			.map(String::as_str)
	}

	pub fn set(&mut self, property: &str, value: &str) {
		self.properties
			.insert(property.to_ascii_lowercase(), value.to_string());
	}

	pub fn remove(&mut self, property: &str) {
		self.properties.shift_remove(&property.to_ascii_lowercase());
	}

	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}
}

impl std::fmt::Display for StyleDeclarations {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (index, (name, value)) in self.properties.iter().enumerate() {
			if index > 0 {
				f.write_str(" ")?;
			}
			write!(f, "{name}: {value};")?;
		}
		Ok(())
	}
}
