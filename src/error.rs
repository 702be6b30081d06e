//! Error types for dataset loading and record ingestion.
//!
//! Nothing here is fatal to the page: a [`LoadError`] leaves the previous view
//! in place and shows a message, a [`RecordError`] drops one record.

use thiserror::Error;

/// Failure to obtain a dataset collection.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("request to {url} failed: {reason}")]
	Network { url: String, reason: String },
	#[error("request to {url} returned HTTP {status}")]
	Status { url: String, status: u16 },
	#[error("could not parse {what}: {source}")]
	Parse {
		what: &'static str,
		#[source]
		source: serde_json::Error,
	},
	#[error("expected a JSON array of {what}")]
	NotAnArray { what: &'static str },
}

/// Rejection of a single node or edge record during ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
	#[error("{kind} #{index} is malformed: {reason}")]
	Malformed {
		kind: &'static str,
		index: usize,
		reason: String,
	},
	#[error("node id {0} appears more than once")]
	DuplicateNode(u64),
	#[error("edge {0} -> {0} is a self-loop")]
	SelfLoop(u64),
	#[error("edge {source_id} -> {target_id} has a non-finite weight")]
	NonFiniteWeight { source_id: u64, target_id: u64 },
}
