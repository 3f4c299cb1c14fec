use std::fmt;

/// A chain identifier carrying an implicit revision number as a `-N` suffix
/// (e.g. `mars-4` is revision 4). Absence of the suffix, or `-0`, is revision 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(String);

impl ChainId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// `parseRevisionNumber`: a left-inverse of the `"foo-" + N` suffix convention.
	pub fn revision_number(&self) -> u64 {
		parse_revision_number(&self.0)
	}
}

fn parse_revision_number(id: &str) -> u64 {
	match id.rsplit_once('-') {
		Some((prefix, suffix)) if !prefix.is_empty() => suffix.parse().unwrap_or(0),
		_ => 0,
	}
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<String> for ChainId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl From<&str> for ChainId {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_revision_suffix() {
		assert_eq!(ChainId::new("mars-4").revision_number(), 4);
		assert_eq!(ChainId::new("mars-0").revision_number(), 0);
		assert_eq!(ChainId::new("mars").revision_number(), 0);
		assert_eq!(ChainId::new("mars-1-2").revision_number(), 2);
	}

	#[test]
	fn non_numeric_suffix_is_revision_zero() {
		assert_eq!(ChainId::new("foo-bar").revision_number(), 0);
	}
}
