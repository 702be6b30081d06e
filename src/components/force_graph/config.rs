//! Tunable options for ingestion, layout and interaction.
//!
//! Every option has a default; a JSON config may override any subset. Values
//! that make no sense for a visualization (negative radii, inverted ranges,
//! NaN) are clamped back to their defaults instead of failing.

use log::warn;
use serde::Deserialize;

/// Where the dataset collections are fetched from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
	pub nodes: String,
	pub edges: String,
	/// Optional third collection; a failed fetch means "no category edges".
	#[serde(alias = "categoryEdges")]
	pub category_edges: Option<String>,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self {
			nodes: "/api/faculty_nodes".into(),
			edges: "/api/faculty_edges".into(),
			category_edges: Some("/api/faculty_department_edges".into()),
		}
	}
}

/// Complete graph configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
	/// Edges with `weight < min_weight` never enter the graph.
	#[serde(alias = "minWeight")]
	pub min_weight: f64,
	/// `[min, max]` node radius in pixels.
	#[serde(alias = "radiusRange")]
	pub radius_range: [f64; 2],
	/// Growth of the radius with `sqrt(influence)`.
	#[serde(alias = "radiusScale")]
	pub radius_scale: f64,
	/// Weights of `[importance, connections]` in the influence score.
	#[serde(alias = "influenceWeights")]
	pub influence_weights: [f64; 2],
	/// Magnitude of the many-body repulsion.
	#[serde(alias = "repulsionStrength")]
	pub repulsion_strength: f64,
	/// Barnes-Hut opening criterion; larger is faster and coarser.
	#[serde(alias = "barnesHutTheta")]
	pub barnes_hut_theta: f64,
	/// `[min, max]` link target distance; weight 1 maps to `min`.
	#[serde(alias = "linkDistanceRange")]
	pub link_distance_range: [f64; 2],
	#[serde(alias = "centerStrength")]
	pub center_strength: f64,
	/// Extra spacing added to each radius by the collision force.
	#[serde(alias = "collisionPadding")]
	pub collision_padding: f64,
	#[serde(alias = "collisionIterations")]
	pub collision_iterations: usize,
	#[serde(alias = "alphaDecay")]
	pub alpha_decay: f64,
	/// Energy below which the layout counts as settled.
	#[serde(alias = "alphaMin")]
	pub alpha_min: f64,
	#[serde(alias = "velocityDecay")]
	pub velocity_decay: f64,
	/// Energy held while a node is being dragged.
	#[serde(alias = "dragAlphaTarget")]
	pub drag_alpha_target: f64,
	/// Energy injected when focusing a category.
	#[serde(alias = "filterAlpha")]
	pub filter_alpha: f64,
	/// Seconds the focused category stays pinned at the center.
	#[serde(alias = "filterReleaseDelay")]
	pub filter_release_delay: f64,
	#[serde(alias = "zoomScaleRange")]
	pub zoom_scale_range: [f64; 2],
	/// Only nodes above this importance get a text label.
	#[serde(alias = "labelMinImportance")]
	pub label_min_importance: f64,
	/// Derive category edges from shared categories when none were loaded.
	#[serde(alias = "deriveCategoryLinks")]
	pub derive_category_links: bool,
	/// Visual preset, `"light"` or `"midnight"`.
	pub theme: String,
	pub endpoints: Endpoints,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			min_weight: 0.65,
			radius_range: [15.0, 45.0],
			radius_scale: 2.0,
			influence_weights: [0.7, 0.3],
			repulsion_strength: 300.0,
			barnes_hut_theta: 0.9,
			link_distance_range: [50.0, 150.0],
			center_strength: 0.1,
			collision_padding: 4.0,
			collision_iterations: 2,
			alpha_decay: 0.02,
			alpha_min: 0.001,
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			filter_alpha: 0.9,
			filter_release_delay: 0.4,
			zoom_scale_range: [0.1, 8.0],
			label_min_importance: 50.0,
			derive_category_links: false,
			theme: "light".into(),
			endpoints: Endpoints::default(),
		}
	}
}

/// Names accepted by the `theme` option.
const THEMES: [&str; 2] = ["light", "midnight"];

/// Replace `value` with `fallback` unless `ok(value)` holds.
fn check(name: &str, value: &mut f64, fallback: f64, ok: impl Fn(f64) -> bool) {
	if !value.is_finite() || !ok(*value) {
		warn!("config: {name} = {value} is out of range, using {fallback}");
		*value = fallback;
	}
}

/// Replace an inverted or non-positive range with `fallback`.
fn check_range(name: &str, range: &mut [f64; 2], fallback: [f64; 2]) {
	let [lo, hi] = *range;
	if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
		warn!("config: {name} = [{lo}, {hi}] is not a valid range, using {fallback:?}");
		*range = fallback;
	}
}

impl GraphConfig {
	/// Parse a JSON override; unknown or missing keys fall back to defaults.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str::<Self>(json).map(Self::sanitized)
	}

	/// Clamp every out-of-range option back to its default.
	pub fn sanitized(mut self) -> Self {
		let d = Self::default();
		check("min_weight", &mut self.min_weight, d.min_weight, |_| true);
		check_range("radius_range", &mut self.radius_range, d.radius_range);
		check("radius_scale", &mut self.radius_scale, d.radius_scale, |v| v >= 0.0);
		for (w, fallback) in self.influence_weights.iter_mut().zip(d.influence_weights) {
			check("influence_weights", w, fallback, |v| v >= 0.0);
		}
		check(
			"repulsion_strength",
			&mut self.repulsion_strength,
			d.repulsion_strength,
			|v| v >= 0.0,
		);
		check(
			"barnes_hut_theta",
			&mut self.barnes_hut_theta,
			d.barnes_hut_theta,
			|v| v > 0.0,
		);
		check_range(
			"link_distance_range",
			&mut self.link_distance_range,
			d.link_distance_range,
		);
		check("center_strength", &mut self.center_strength, d.center_strength, |v| {
			(0.0..=1.0).contains(&v)
		});
		check(
			"collision_padding",
			&mut self.collision_padding,
			d.collision_padding,
			|v| v >= 0.0,
		);
		if self.collision_iterations == 0 {
			warn!("config: collision_iterations = 0, using {}", d.collision_iterations);
			self.collision_iterations = d.collision_iterations;
		}
		check("alpha_decay", &mut self.alpha_decay, d.alpha_decay, |v| {
			v > 0.0 && v < 1.0
		});
		check("alpha_min", &mut self.alpha_min, d.alpha_min, |v| v > 0.0 && v < 1.0);
		check("velocity_decay", &mut self.velocity_decay, d.velocity_decay, |v| {
			(0.0..=1.0).contains(&v)
		});
		check(
			"drag_alpha_target",
			&mut self.drag_alpha_target,
			d.drag_alpha_target,
			|v| (0.0..=1.0).contains(&v),
		);
		check("filter_alpha", &mut self.filter_alpha, d.filter_alpha, |v| {
			(0.0..=1.0).contains(&v)
		});
		check(
			"filter_release_delay",
			&mut self.filter_release_delay,
			d.filter_release_delay,
			|v| v >= 0.0,
		);
		check_range(
			"zoom_scale_range",
			&mut self.zoom_scale_range,
			d.zoom_scale_range,
		);
		check(
			"label_min_importance",
			&mut self.label_min_importance,
			d.label_min_importance,
			|_| true,
		);
		if !THEMES.contains(&self.theme.as_str()) {
			warn!("config: unknown theme {:?}, using {:?}", self.theme, d.theme);
			self.theme = d.theme;
		}
		self
	}

	/// Radius bounds for a canvas, never above half its shortest side.
	pub fn radius_bounds(&self, width: f64, height: f64) -> (f64, f64) {
		let [lo, hi] = self.radius_range;
		let half = (width.min(height) / 2.0).max(1.0);
		let hi = hi.min(half);
		(lo.min(hi), hi)
	}

	/// Target link distance for an edge weight, always positive.
	pub fn link_distance(&self, weight: f64) -> f64 {
		let [lo, hi] = self.link_distance_range;
		(hi - weight * (hi - lo)).max(1.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_other_defaults() {
		let config = GraphConfig::from_json(r#"{"min_weight": 0.5, "collision_iterations": 3}"#)
			.unwrap();
		assert_eq!(config.min_weight, 0.5);
		assert_eq!(config.collision_iterations, 3);
		assert_eq!(config.radius_range, [15.0, 45.0]);
		assert_eq!(config.endpoints, Endpoints::default());
	}

	#[test]
	fn invalid_values_fall_back_to_defaults() {
		let config = GraphConfig::from_json(
			r#"{"radius_range": [-5, 10], "alpha_decay": 3.0, "zoom_scale_range": [8, 0.1],
				"collision_iterations": 0}"#,
		)
		.unwrap();
		let d = GraphConfig::default();
		assert_eq!(config.radius_range, d.radius_range);
		assert_eq!(config.alpha_decay, d.alpha_decay);
		assert_eq!(config.zoom_scale_range, d.zoom_scale_range);
		assert_eq!(config.collision_iterations, d.collision_iterations);
	}

	#[test]
	fn camel_case_keys_are_accepted() {
		let config = GraphConfig::from_json(
			r#"{"minWeight": 0.7, "radiusRange": [10, 30], "linkDistanceRange": [40, 120],
				"zoomScaleRange": [0.5, 4], "endpoints": {"categoryEdges": null}}"#,
		)
		.unwrap();
		assert_eq!(config.min_weight, 0.7);
		assert_eq!(config.radius_range, [10.0, 30.0]);
		assert_eq!(config.link_distance_range, [40.0, 120.0]);
		assert_eq!(config.zoom_scale_range, [0.5, 4.0]);
		assert_eq!(config.endpoints.category_edges, None);
		assert_eq!(config.endpoints.nodes, Endpoints::default().nodes);
	}

	#[test]
	fn theme_names_are_checked() {
		let config = GraphConfig::from_json(r#"{"theme": "midnight"}"#).unwrap();
		assert_eq!(config.theme, "midnight");
		let config = GraphConfig::from_json(r#"{"theme": "sepia"}"#).unwrap();
		assert_eq!(config.theme, "light");
	}

	#[test]
	fn radius_bounds_respect_small_canvases() {
		let config = GraphConfig::default();
		assert_eq!(config.radius_bounds(800.0, 600.0), (15.0, 45.0));
		assert_eq!(config.radius_bounds(60.0, 20.0), (10.0, 10.0));
	}

	#[test]
	fn stronger_links_are_shorter() {
		let config = GraphConfig::default();
		assert_eq!(config.link_distance(0.0), 150.0);
		assert_eq!(config.link_distance(1.0), 50.0);
		assert!(config.link_distance(0.9) < config.link_distance(0.7));
		assert!(config.link_distance(5.0) >= 1.0);
	}
}
