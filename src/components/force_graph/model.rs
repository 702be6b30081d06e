//! Graph data model: normalized nodes, weighted links and category links.
//!
//! Built once per successful load. Edge endpoints are resolved against an
//! explicit [`NodeIndex`], edges below the weight threshold are dropped for
//! good, and the derived per-node metrics (`connections`, `influence`,
//! `radius`) are recomputed from the surviving edge set.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::{debug, info, warn};
use serde_json::{Map, Value};

use super::config::GraphConfig;
use super::types::{NodeId, RawCategoryEdge, RawEdge, RawNode};
use crate::error::RecordError;

/// Golden angle in degrees, used to spread initial positions.
const GOLDEN_ANGLE_DEG: f64 = 137.508;

/// A node with its derived metrics and initial position.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	pub category: String,
	pub importance: f64,
	/// Domain payload for the renderer (name, email, ...).
	pub attributes: Map<String, Value>,
	/// Number of surviving weighted links incident to this node.
	pub connections: usize,
	pub influence: f64,
	pub radius: f64,
	/// Seed position handed to the simulation.
	pub x: f64,
	pub y: f64,
}

impl Node {
	/// A string attribute from the payload, if present.
	pub fn text(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).and_then(Value::as_str)
	}

	/// Display name, falling back to the id.
	pub fn name(&self) -> String {
		self.text("name")
			.map(str::to_owned)
			.unwrap_or_else(|| self.id.to_string())
	}
}

/// A weighted link that passed the threshold; endpoints are node indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
	pub source_id: NodeId,
	pub target_id: NodeId,
	pub source: usize,
	pub target: usize,
	pub weight: f64,
}

/// An unweighted link between two nodes of the same category.
/// Drawn only; it never takes part in the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryLink {
	pub source: usize,
	pub target: usize,
}

/// Node id to position in the node list.
#[derive(Clone, Debug, Default)]
pub struct NodeIndex {
	by_id: HashMap<NodeId, usize>,
}

impl NodeIndex {
	pub fn get(&self, id: NodeId) -> Option<usize> {
		self.by_id.get(&id).copied()
	}

	pub fn len(&self) -> usize {
		self.by_id.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_id.is_empty()
	}
}

/// What ingestion dropped, and why.
#[derive(Clone, Debug, Default)]
pub struct IngestReport {
	pub rejected: Vec<RecordError>,
	pub dangling_edges: usize,
	pub below_threshold: usize,
	pub dangling_category_edges: usize,
}

/// The normalized graph for one load.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
	pub category_links: Vec<CategoryLink>,
	pub report: IngestReport,
	index: NodeIndex,
}

/// Influence score: weighted blend of importance and connectivity.
pub fn influence(importance: f64, connections: usize, weights: [f64; 2]) -> f64 {
	let importance = if importance.is_finite() { importance.max(0.0) } else { 0.0 };
	importance * weights[0] + connections as f64 * weights[1]
}

/// Clamped radius for an influence value; monotone non-decreasing.
pub fn radius_for(influence: f64, min_r: f64, max_r: f64, scale: f64) -> f64 {
	let influence = if influence.is_nan() { 0.0 } else { influence.max(0.0) };
	(min_r + scale * influence.sqrt()).clamp(min_r, max_r)
}

/// Deterministic seed position: golden-angle spiral keyed by node id.
pub fn seed_position(id: NodeId, width: f64, height: f64) -> (f64, f64) {
	let min_dim = width.min(height).max(1.0);
	let angle = ((id as f64) * GOLDEN_ANGLE_DEG % 360.0).to_radians();
	let ring = min_dim * 0.25 + (id % 3) as f64 * min_dim * 0.1;
	(width / 2.0 + ring * angle.cos(), height / 2.0 + ring * angle.sin())
}

/// Pair up every two nodes that share a category.
pub fn derive_category_links(nodes: &[Node]) -> Vec<CategoryLink> {
	let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
	for (i, node) in nodes.iter().enumerate() {
		members.entry(node.category.as_str()).or_default().push(i);
	}
	let mut links = Vec::new();
	for group in members.values() {
		for (a, &source) in group.iter().enumerate() {
			for &target in &group[a + 1..] {
				links.push(CategoryLink { source, target });
			}
		}
	}
	links.sort_by_key(|l| (l.source, l.target));
	links
}

impl GraphModel {
	/// Normalize raw records into a graph for a `width` x `height` canvas.
	///
	/// Empty node input yields an empty graph, not an error.
	pub fn build(
		raw_nodes: Vec<RawNode>,
		raw_edges: &[RawEdge],
		raw_category_edges: Option<&[RawCategoryEdge]>,
		config: &GraphConfig,
		width: f64,
		height: f64,
	) -> Self {
		let mut model = Self::default();
		if raw_nodes.is_empty() {
			info!("graph: no nodes loaded, showing an empty graph");
			return model;
		}

		for raw in raw_nodes {
			let idx = model.nodes.len();
			match model.index.by_id.entry(raw.id) {
				Entry::Occupied(_) => {
					warn!("graph: dropping duplicate node id {}", raw.id);
					model.report.rejected.push(RecordError::DuplicateNode(raw.id));
					continue;
				}
				Entry::Vacant(slot) => {
					slot.insert(idx);
				}
			}
			let (x, y) = seed_position(raw.id, width, height);
			model.nodes.push(Node {
				id: raw.id,
				category: raw.category,
				importance: raw.importance,
				attributes: raw.attributes,
				connections: 0,
				influence: 0.0,
				radius: 0.0,
				x,
				y,
			});
		}

		for edge in raw_edges {
			if edge.source_id == edge.target_id {
				warn!("graph: dropping self-loop on node {}", edge.source_id);
				model.report.rejected.push(RecordError::SelfLoop(edge.source_id));
				continue;
			}
			if !edge.weight.is_finite() {
				model.report.rejected.push(RecordError::NonFiniteWeight {
					source_id: edge.source_id,
					target_id: edge.target_id,
				});
				continue;
			}
			let (Some(source), Some(target)) = (
				model.index.get(edge.source_id),
				model.index.get(edge.target_id),
			) else {
				debug!(
					"graph: dropping edge {} -> {} with unknown endpoint",
					edge.source_id, edge.target_id
				);
				model.report.dangling_edges += 1;
				continue;
			};
			if edge.weight < config.min_weight {
				model.report.below_threshold += 1;
				continue;
			}
			model.links.push(Link {
				source_id: edge.source_id,
				target_id: edge.target_id,
				source,
				target,
				weight: edge.weight,
			});
		}

		model.category_links = match raw_category_edges {
			Some(edges) => {
				let mut links = Vec::with_capacity(edges.len());
				for edge in edges {
					match (model.index.get(edge.source_id), model.index.get(edge.target_id)) {
						(Some(source), Some(target)) if source != target => {
							links.push(CategoryLink { source, target })
						}
						_ => model.report.dangling_category_edges += 1,
					}
				}
				links
			}
			None if config.derive_category_links => derive_category_links(&model.nodes),
			None => Vec::new(),
		};

		model.recompute_metrics(config, width, height);

		if model.report.dangling_edges > 0 || model.report.dangling_category_edges > 0 {
			warn!(
				"graph: dropped {} edges and {} category edges with unknown endpoints",
				model.report.dangling_edges, model.report.dangling_category_edges
			);
		}
		info!(
			"graph: {} nodes, {} links (>= {}), {} below threshold, {} category links",
			model.nodes.len(),
			model.links.len(),
			config.min_weight,
			model.report.below_threshold,
			model.category_links.len()
		);
		model
	}

	/// Recompute `connections`, `influence` and `radius` from the link set.
	/// Idempotent; touches nothing else.
	pub fn recompute_metrics(&mut self, config: &GraphConfig, width: f64, height: f64) {
		let mut counts = vec![0usize; self.nodes.len()];
		for link in &self.links {
			counts[link.source] += 1;
			counts[link.target] += 1;
		}
		let (min_r, max_r) = config.radius_bounds(width, height);
		for (node, connections) in self.nodes.iter_mut().zip(counts) {
			node.connections = connections;
			node.influence = influence(node.importance, connections, config.influence_weights);
			node.radius = radius_for(node.influence, min_r, max_r, config.radius_scale);
		}
	}

	pub fn index(&self) -> &NodeIndex {
		&self.index
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.index.get(id).map(|i| &self.nodes[i])
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Indices of links incident to node `idx`.
	pub fn incident_links(&self, idx: usize) -> Vec<usize> {
		self.links
			.iter()
			.enumerate()
			.filter(|(_, l)| l.source == idx || l.target == idx)
			.map(|(i, _)| i)
			.collect()
	}

	/// Indices of category links incident to node `idx`.
	pub fn incident_category_links(&self, idx: usize) -> Vec<usize> {
		self.category_links
			.iter()
			.enumerate()
			.filter(|(_, l)| l.source == idx || l.target == idx)
			.map(|(i, _)| i)
			.collect()
	}

	/// Distinct categories with member counts, largest first (ties by name).
	pub fn categories(&self) -> Vec<(String, usize)> {
		let mut counts: HashMap<&str, usize> = HashMap::new();
		for node in &self.nodes {
			*counts.entry(node.category.as_str()).or_insert(0) += 1;
		}
		let mut categories: Vec<(String, usize)> = counts
			.into_iter()
			.map(|(c, n)| (c.to_owned(), n))
			.collect();
		categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
		categories
	}

	/// Smallest and largest weight among surviving links.
	pub fn weight_extent(&self) -> Option<(f64, f64)> {
		self.links.iter().map(|l| l.weight).fold(None, |acc, w| match acc {
			None => Some((w, w)),
			Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
		})
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn raw_node(id: NodeId, importance: f64, category: &str) -> RawNode {
		RawNode {
			id,
			category: category.into(),
			importance,
			attributes: Map::new(),
		}
	}

	fn edge(source_id: NodeId, target_id: NodeId, weight: f64) -> RawEdge {
		RawEdge {
			source_id,
			target_id,
			weight,
		}
	}

	fn build(nodes: Vec<RawNode>, edges: &[RawEdge]) -> GraphModel {
		GraphModel::build(nodes, edges, None, &GraphConfig::default(), 800.0, 600.0)
	}

	#[test]
	fn strong_edge_is_retained() {
		let model = build(
			vec![raw_node(1, 100.0, "A"), raw_node(2, 0.0, "A")],
			&[edge(1, 2, 0.9)],
		);
		assert_eq!(model.links.len(), 1);
		assert_eq!(model.node(1).unwrap().connections, 1);
		assert_eq!(model.node(2).unwrap().connections, 1);
		assert!(model.node(1).unwrap().radius > model.node(2).unwrap().radius);
	}

	#[test]
	fn weak_edge_is_dropped() {
		let model = build(
			vec![raw_node(1, 100.0, "A"), raw_node(2, 0.0, "A")],
			&[edge(1, 2, 0.5)],
		);
		assert!(model.links.is_empty());
		assert_eq!(model.report.below_threshold, 1);
		assert_eq!(model.node(1).unwrap().connections, 0);
		assert_eq!(model.node(2).unwrap().connections, 0);
	}

	#[test]
	fn dangling_edge_is_dropped_quietly() {
		let model = build(
			vec![raw_node(1, 1.0, "A"), raw_node(2, 1.0, "A")],
			&[edge(1, 2, 0.8), edge(1, 99, 0.8)],
		);
		assert_eq!(model.nodes.len(), 2);
		assert_eq!(model.links.len(), 1);
		assert_eq!(model.report.dangling_edges, 1);
	}

	#[test]
	fn empty_input_is_an_empty_graph() {
		let model = build(Vec::new(), &[edge(1, 2, 0.9)]);
		assert!(model.is_empty());
		assert!(model.links.is_empty());
	}

	#[test]
	fn duplicates_and_self_loops_are_rejected() {
		let model = build(
			vec![raw_node(1, 1.0, "A"), raw_node(1, 5.0, "B"), raw_node(2, 1.0, "A")],
			&[edge(2, 2, 0.9)],
		);
		assert_eq!(model.nodes.len(), 2);
		assert_eq!(model.node(1).unwrap().category, "A");
		assert_eq!(
			model.report.rejected,
			vec![RecordError::DuplicateNode(1), RecordError::SelfLoop(2)]
		);
	}

	#[test]
	fn category_links_are_resolved_but_not_counted() {
		let raw = [
			RawCategoryEdge { source_id: 1, target_id: 2 },
			RawCategoryEdge { source_id: 1, target_id: 42 },
		];
		let model = GraphModel::build(
			vec![raw_node(1, 1.0, "A"), raw_node(2, 1.0, "A")],
			&[],
			Some(&raw),
			&GraphConfig::default(),
			800.0,
			600.0,
		);
		assert_eq!(model.category_links, vec![CategoryLink { source: 0, target: 1 }]);
		assert_eq!(model.report.dangling_category_edges, 1);
		assert!(model.nodes.iter().all(|n| n.connections == 0));
	}

	#[test]
	fn category_links_can_be_derived() {
		let config = GraphConfig {
			derive_category_links: true,
			..GraphConfig::default()
		};
		let model = GraphModel::build(
			vec![
				raw_node(1, 1.0, "A"),
				raw_node(2, 1.0, "B"),
				raw_node(3, 1.0, "A"),
				raw_node(4, 1.0, "A"),
			],
			&[],
			None,
			&config,
			800.0,
			600.0,
		);
		assert_eq!(
			model.category_links,
			vec![
				CategoryLink { source: 0, target: 2 },
				CategoryLink { source: 0, target: 3 },
				CategoryLink { source: 2, target: 3 },
			]
		);
	}

	#[test]
	fn recompute_is_idempotent() {
		let mut model = build(
			vec![raw_node(1, 10.0, "A"), raw_node(2, 3.0, "B"), raw_node(3, 0.0, "B")],
			&[edge(1, 2, 0.7), edge(2, 3, 0.95)],
		);
		let before = model.nodes.clone();
		model.recompute_metrics(&GraphConfig::default(), 800.0, 600.0);
		model.recompute_metrics(&GraphConfig::default(), 800.0, 600.0);
		assert_eq!(model.nodes, before);
	}

	#[test]
	fn seed_positions_are_deterministic_and_distinct() {
		let a = seed_position(7, 800.0, 600.0);
		assert_eq!(a, seed_position(7, 800.0, 600.0));
		assert_ne!(a, seed_position(8, 800.0, 600.0));
	}

	#[test]
	fn categories_are_ordered_by_size() {
		let model = build(
			vec![raw_node(1, 0.0, "B"), raw_node(2, 0.0, "A"), raw_node(3, 0.0, "A")],
			&[],
		);
		assert_eq!(
			model.categories(),
			vec![("A".to_string(), 2), ("B".to_string(), 1)]
		);
	}

	proptest! {
		#[test]
		fn retained_links_meet_threshold_and_connections_sum(
			weights in proptest::collection::vec((0u64..12, 0u64..12, 0.0f64..1.0), 0..60),
			min_weight in 0.0f64..1.0,
		) {
			let nodes = (0..10).map(|id| raw_node(id, id as f64, "A")).collect();
			let edges: Vec<RawEdge> = weights.iter().map(|&(s, t, w)| edge(s, t, w)).collect();
			let config = GraphConfig { min_weight, ..GraphConfig::default() };
			let model = GraphModel::build(nodes, &edges, None, &config, 800.0, 600.0);

			prop_assert!(model.links.iter().all(|l| l.weight >= min_weight));
			let total: usize = model.nodes.iter().map(|n| n.connections).sum();
			prop_assert_eq!(total, 2 * model.links.len());
			for (i, node) in model.nodes.iter().enumerate() {
				prop_assert_eq!(node.connections, model.incident_links(i).len());
			}
		}

		#[test]
		fn radius_is_bounded_and_monotone(a in 0.0f64..1e12, b in 0.0f64..1e12) {
			let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
			let r_lo = radius_for(lo, 15.0, 45.0, 2.0);
			let r_hi = radius_for(hi, 15.0, 45.0, 2.0);
			prop_assert!(r_lo <= r_hi);
			prop_assert!((15.0..=45.0).contains(&r_lo));
			prop_assert!((15.0..=45.0).contains(&r_hi));
		}
	}

	#[test]
	fn radius_handles_degenerate_influence() {
		assert_eq!(radius_for(0.0, 15.0, 45.0, 2.0), 15.0);
		assert_eq!(radius_for(f64::INFINITY, 15.0, 45.0, 2.0), 45.0);
		assert_eq!(radius_for(f64::NAN, 15.0, 45.0, 2.0), 15.0);
		assert_eq!(radius_for(-4.0, 15.0, 45.0, 2.0), 15.0);
	}
}
