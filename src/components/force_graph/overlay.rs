//! Text shown around the canvas: node labels, the hover tooltip, the
//! category legend and the reading key. Also picks the photo for each node.

use super::model::{GraphModel, Node};
use super::theme::{CategoryColors, Color};

/// Research areas are cut after this many characters in the tooltip.
pub const TOOLTIP_TEXT_LIMIT: usize = 150;
/// Legend shows at most this many categories.
pub const LEGEND_LIMIT: usize = 12;
const LEGEND_NAME_LIMIT: usize = 35;
const LEGEND_NAME_KEEP: usize = 32;

/// Prefixes stripped from category names in the legend.
const CATEGORY_PREFIXES: [&str; 2] = ["Departamento de ", "Departamento "];

/// Cut `text` to `limit` chars, marking the cut with `...`.
fn truncate(text: &str, limit: usize, keep: usize) -> String {
	if text.chars().count() > limit {
		let mut short: String = text.chars().take(keep).collect();
		short.push_str("...");
		short
	} else {
		text.to_owned()
	}
}

/// Canvas label: the first two words of the name, only for important nodes.
pub fn node_label(node: &Node, min_importance: f64) -> Option<String> {
	if node.importance <= min_importance {
		return None;
	}
	let name = node.name();
	let label = name.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
	(!label.is_empty()).then_some(label)
}

/// Photo drawn inside a node, if the record names one.
pub fn image_url(node: &Node) -> Option<&str> {
	node.text("image_url")
		.map(str::trim)
		.filter(|url| !url.is_empty())
}

/// Lines of the reading key shown next to the legend.
pub const READING_KEY: [&str; 5] = [
	"Size = number of citations",
	"Blue line = similarity (weighted)",
	"Gray line = same department",
	"Node border = department",
	"Hover for more information",
];

/// Everything the hover tooltip shows for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub name: String,
	pub category: String,
	pub email: Option<String>,
	pub importance: f64,
	pub connections: usize,
	pub research_areas: Option<String>,
}

impl Tooltip {
	pub fn for_node(node: &Node) -> Self {
		Self {
			name: node.name(),
			category: node.category.clone(),
			email: node.text("email").map(str::to_owned),
			importance: node.importance,
			connections: node.connections,
			research_areas: node
				.text("research_areas")
				.map(|areas| truncate(areas, TOOLTIP_TEXT_LIMIT, TOOLTIP_TEXT_LIMIT)),
		}
	}
}

/// One row of the category legend.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
	pub category: String,
	pub label: String,
	pub members: usize,
	pub color: Color,
}

/// Shorten a category name for the legend.
pub fn legend_label(category: &str) -> String {
	let short = CATEGORY_PREFIXES
		.iter()
		.find_map(|prefix| category.strip_prefix(prefix))
		.unwrap_or(category);
	truncate(short, LEGEND_NAME_LIMIT, LEGEND_NAME_KEEP)
}

/// The largest categories, biggest first.
pub fn legend(graph: &GraphModel, colors: &CategoryColors) -> Vec<LegendEntry> {
	graph
		.categories()
		.into_iter()
		.take(LEGEND_LIMIT)
		.map(|(category, members)| LegendEntry {
			label: legend_label(&category),
			color: colors.get(&category),
			category,
			members,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::force_graph::config::GraphConfig;
	use crate::components::force_graph::theme::CategoryPalette;
	use crate::components::force_graph::types::RawNode;

	fn node(id: u64, category: &str, importance: f64, attrs: serde_json::Value) -> RawNode {
		RawNode {
			id,
			category: category.into(),
			importance,
			attributes: attrs.as_object().cloned().unwrap_or_default(),
		}
	}

	fn graph(nodes: Vec<RawNode>) -> GraphModel {
		GraphModel::build(nodes, &[], None, &GraphConfig::default(), 800.0, 600.0)
	}

	#[test]
	fn labels_only_for_important_nodes() {
		let g = graph(vec![
			node(1, "A", 120.0, json!({ "name": "Ana María López Ruiz" })),
			node(2, "A", 50.0, json!({ "name": "Luis Pérez" })),
			node(3, "A", 80.0, json!({})),
		]);
		assert_eq!(node_label(&g.nodes[0], 50.0).as_deref(), Some("Ana María"));
		assert_eq!(node_label(&g.nodes[1], 50.0), None);
		assert_eq!(node_label(&g.nodes[2], 50.0).as_deref(), Some("3"));
	}

	#[test]
	fn image_urls_skip_blank_values() {
		let g = graph(vec![
			node(1, "A", 0.0, json!({ "image_url": " /img/1.jpg " })),
			node(2, "A", 0.0, json!({ "image_url": "" })),
			node(3, "A", 0.0, json!({ "image_url": null })),
			node(4, "A", 0.0, json!({})),
		]);
		assert_eq!(image_url(&g.nodes[0]), Some("/img/1.jpg"));
		assert!(g.nodes[1..].iter().all(|n| image_url(n).is_none()));
	}

	#[test]
	fn tooltip_truncates_research_areas() {
		let long = "x".repeat(400);
		let g = graph(vec![node(
			7,
			"Física",
			12.0,
			json!({ "name": "Eva", "email": "eva@uni.edu", "research_areas": long }),
		)]);
		let tip = Tooltip::for_node(&g.nodes[0]);
		assert_eq!(tip.name, "Eva");
		assert_eq!(tip.email.as_deref(), Some("eva@uni.edu"));
		let areas = tip.research_areas.unwrap();
		assert_eq!(areas.chars().count(), TOOLTIP_TEXT_LIMIT + 3);
		assert!(areas.ends_with("..."));
	}

	#[test]
	fn legend_names_are_shortened() {
		assert_eq!(legend_label("Departamento de Física"), "Física");
		assert_eq!(legend_label("Departamento Química"), "Química");
		let long = legend_label("Departamento de Ingeniería de Sistemas y Computación Avanzada");
		assert_eq!(long.chars().count(), 35);
		assert!(long.ends_with("..."));
	}

	#[test]
	fn legend_keeps_the_largest_categories() {
		let mut nodes = Vec::new();
		let mut id = 0;
		for c in 0..15u64 {
			for _ in 0..=c {
				id += 1;
				nodes.push(node(id, &format!("C{c:02}"), 0.0, json!({})));
			}
		}
		let g = graph(nodes);
		let colors = CategoryPalette::categorical().assign(g.nodes.iter().map(|n| n.category.as_str()));
		let entries = legend(&g, &colors);
		assert_eq!(entries.len(), LEGEND_LIMIT);
		assert_eq!(entries[0].category, "C14");
		assert_eq!(entries[0].members, 15);
		assert_eq!(entries[11].category, "C03");
	}
}
