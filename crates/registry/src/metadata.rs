use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Auxiliary descriptive data attached to a candidate. Never consulted for ranking.
///
/// Ordered so serialized output and iteration are stable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Closed value model for candidate metadata: a scalar or a flat string mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	Map(BTreeMap<String, String>),
}

impl MetadataValue {
	/// Returns the string payload, if this is a string.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}
}

impl From<bool> for MetadataValue {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<i64> for MetadataValue {
	fn from(v: i64) -> Self {
		Self::Int(v)
	}
}

impl From<i32> for MetadataValue {
	fn from(v: i32) -> Self {
		Self::Int(i64::from(v))
	}
}

impl From<f64> for MetadataValue {
	fn from(v: f64) -> Self {
		Self::Float(v)
	}
}

impl From<&str> for MetadataValue {
	fn from(v: &str) -> Self {
		Self::Str(v.to_string())
	}
}

impl From<String> for MetadataValue {
	fn from(v: String) -> Self {
		Self::Str(v)
	}
}

impl From<BTreeMap<String, String>> for MetadataValue {
	fn from(v: BTreeMap<String, String>) -> Self {
		Self::Map(v)
	}
}
