//! Query highlighting inside match labels.

use regex::RegexBuilder;

/// A run of label text, flagged when it matches the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
	/// Text of the run.
	pub text: &'a str,
	/// Whether the run matches the query.
	pub matched: bool,
}

/// Splits `label` into runs matching `query` (literal, case-insensitive).
///
/// A blank query yields the whole label as one unmatched run. An empty label
/// yields no runs.
pub fn highlight<'a>(label: &'a str, query: &str) -> Vec<Segment<'a>> {
	if label.is_empty() {
		return Vec::new();
	}
	let whole = vec![Segment {
		text: label,
		matched: false,
	}];
	if query.is_empty() {
		return whole;
	}
	let Ok(pattern) = RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build() else {
		return whole;
	};

	let mut segments = Vec::new();
	let mut last = 0;
	for found in pattern.find_iter(label) {
		if found.start() > last {
			segments.push(Segment {
				text: &label[last..found.start()],
				matched: false,
			});
		}
		segments.push(Segment {
			text: found.as_str(),
			matched: true,
		});
		last = found.end();
	}
	if last < label.len() {
		segments.push(Segment {
			text: &label[last..],
			matched: false,
		});
	}
	segments
}
