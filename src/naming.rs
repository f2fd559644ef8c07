//! Field name renumbering.
//!
//! Cloned sections carry the field names of the section they were copied
//! from. Fields that take part in renumbering encode their section index as
//! the **first** run of decimal digits in their `name`, e.g. `item_1_name` or
//! `rows[1][qty]`. Only that run is rewritten; later runs belong to the field
//! itself and are kept as-is.
//!
//! A name whose first digit run is not the section index (`sku42_row_1`) is
//! renumbered on the wrong run. Such fields must not be marked for
//! renumbering.

use std::sync::LazyLock;

use regex::Regex;

static INDEX_RUN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[0-9]+").expect("index pattern is valid"));

/// Increments the first run of decimal digits in `name`.
///
/// Returns `None` when the name contains no digits. The run is replaced by
/// the decimal form of its value plus one, so leading zeros are dropped.
/// Runs of any length are handled without overflow.
///
/// # Example
///
/// ```
/// use reinhardt_multifield::naming::increment_first_index;
///
/// assert_eq!(increment_first_index("item_1_name").as_deref(), Some("item_2_name"));
/// assert_eq!(increment_first_index("item_1_qty5").as_deref(), Some("item_2_qty5"));
/// assert_eq!(increment_first_index("rows[9][x]").as_deref(), Some("rows[10][x]"));
/// assert_eq!(increment_first_index("comment"), None);
/// ```
pub fn increment_first_index(name: &str) -> Option<String> {
	let run = INDEX_RUN.find(name)?;
	let next = increment_decimal(run.as_str());

	let mut renamed = String::with_capacity(name.len() + 1);
	renamed.push_str(&name[..run.start()]);
	renamed.push_str(&next);
	renamed.push_str(&name[run.end()..]);
	Some(renamed)
}

/// Adds one to a string of ASCII digits, carrying as needed.
fn increment_decimal(digits: &str) -> String {
	let significant = digits.trim_start_matches('0');
	let mut bytes: Vec<u8> = if significant.is_empty() {
		vec![b'0']
	} else {
		significant.bytes().collect()
	};

	let mut position = bytes.len();
	loop {
		if position == 0 {
			bytes.insert(0, b'1');
			break;
		}
		position -= 1;
		if bytes[position] == b'9' {
			bytes[position] = b'0';
		} else {
			bytes[position] += 1;
			break;
		}
	}

	bytes.into_iter().map(char::from).collect()
}
