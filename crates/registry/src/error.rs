use thiserror::Error;

/// Why an identifier failed the safe-identifier check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierIssue {
	/// The identifier was empty.
	Empty,
	/// The identifier started with `/`.
	LeadingSlash,
	/// The identifier contained a backslash.
	Backslash,
	/// The identifier contained a `..` sequence.
	PathTraversal,
	/// The identifier contained a character outside `[A-Za-z0-9._-]`.
	DisallowedChar(char),
}

impl std::fmt::Display for IdentifierIssue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Empty => write!(f, "must not be empty"),
			Self::LeadingSlash => write!(f, "must not start with '/'"),
			Self::Backslash => write!(f, "must not contain '\\'"),
			Self::PathTraversal => write!(f, "must not contain '..'"),
			Self::DisallowedChar(c) => write!(f, "contains disallowed character {c:?}"),
		}
	}
}

/// Validation failures raised while constructing a [`crate::Candidate`] or settings.
///
/// Every variant names the field, the offending value, and what would have been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
	#[error("invalid {field} {value:?}: {issue} (allowed: {allowed})")]
	InvalidIdentifier {
		field: &'static str,
		value: String,
		issue: IdentifierIssue,
		allowed: &'static str,
	},

	#[error("{field} {value} out of bounds (allowed: {min}..={max})")]
	OutOfBounds {
		field: &'static str,
		value: i64,
		min: i32,
		max: i32,
	},
}

impl CandidateError {
	/// Name of the field that failed validation.
	pub fn field(&self) -> &'static str {
		match self {
			Self::InvalidIdentifier { field, .. } | Self::OutOfBounds { field, .. } => field,
		}
	}
}
