//! Raw dataset records as they arrive from the data source.
//!
//! Each collection is a JSON array. Records are validated one at a time so a
//! single malformed entry never aborts a load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{LoadError, RecordError};

/// Stable node identifier, shared by nodes and the edges that reference them.
pub type NodeId = u64;

/// A person (or any entity) in the network.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawNode {
	/// Unique identifier referenced by edges.
	pub id: NodeId,
	/// Categorical attribute used for coloring, filtering and category edges.
	#[serde(rename = "department", alias = "category")]
	pub category: String,
	/// Scalar importance metric (citation count in the faculty dataset).
	#[serde(
		rename = "citations",
		alias = "importance",
		default,
		deserialize_with = "null_as_zero"
	)]
	pub importance: f64,
	/// Every other field (name, email, research areas, image url, ...).
	/// Opaque to the layout engine.
	#[serde(flatten)]
	pub attributes: Map<String, Value>,
}

/// Missing counts are stored as `null` by some exports; treat them as zero.
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
	Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A weighted similarity relation between two nodes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawEdge {
	pub source_id: NodeId,
	pub target_id: NodeId,
	pub weight: f64,
}

/// An unweighted relation between two nodes sharing a category.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawCategoryEdge {
	pub source_id: NodeId,
	pub target_id: NodeId,
}

/// The raw collections of one load.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
	pub nodes: Vec<RawNode>,
	pub edges: Vec<RawEdge>,
	/// `None` when the category-edge source was unavailable.
	pub category_edges: Option<Vec<RawCategoryEdge>>,
}

/// Records that survived per-record validation, plus what was rejected.
#[derive(Debug)]
pub struct Parsed<T> {
	pub records: Vec<T>,
	pub rejected: Vec<RecordError>,
}

/// Parse a JSON array, deserializing each element independently.
///
/// Fails only when the body is not JSON or not an array.
pub fn parse_records<T: DeserializeOwned>(
	json: &str,
	kind: &'static str,
) -> Result<Parsed<T>, LoadError> {
	let value: Value =
		serde_json::from_str(json).map_err(|source| LoadError::Parse { what: kind, source })?;
	let Value::Array(items) = value else {
		return Err(LoadError::NotAnArray { what: kind });
	};

	let mut records = Vec::with_capacity(items.len());
	let mut rejected = Vec::new();
	for (index, item) in items.into_iter().enumerate() {
		match serde_json::from_value::<T>(item) {
			Ok(record) => records.push(record),
			Err(e) => rejected.push(RecordError::Malformed {
				kind,
				index,
				reason: e.to_string(),
			}),
		}
	}
	Ok(Parsed { records, rejected })
}

impl RawNode {
	/// A string attribute from the opaque payload, if present.
	pub fn text(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).and_then(Value::as_str)
	}
}
