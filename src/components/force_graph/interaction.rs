//! Interaction controller: drag, category focus, hover and zoom/pan.
//!
//! Handlers never mutate the simulation in place. They enqueue
//! [`Intent`]s that the engine applies at the start of its next tick, so a
//! pin set during a drag move is seen by the next tick, never the current one.

use std::collections::HashSet;

use log::debug;

use super::config::GraphConfig;
use super::model::GraphModel;
use super::simulation::{ForceSimulation, Intent};
use super::types::NodeId;

/// Value of the "show everything" filter option.
pub const ALL_CATEGORIES: &str = "all";

/// Which nodes the category filter lets through.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategorySelection {
	#[default]
	All,
	Only(String),
}

impl CategorySelection {
	/// Parse a filter value; [`ALL_CATEGORIES`] selects everything.
	pub fn parse(value: &str) -> Self {
		if value == ALL_CATEGORIES {
			Self::All
		} else {
			Self::Only(value.to_owned())
		}
	}
}

/// Pan and zoom transform applied to the entire graph view.
///
/// Purely a view transform: screen = world * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
		(wx * self.k + self.x, wy * self.k + self.y)
	}

	/// Zoom by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, range: [f64; 2]) {
		let new_k = (self.k * factor).clamp(range[0], range[1]);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PanState {
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// Links to emphasize for the hovered node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Highlight {
	pub node: Option<usize>,
	/// Indices into `GraphModel::links`.
	pub links: Vec<usize>,
	/// Indices into `GraphModel::category_links`.
	pub category_links: Vec<usize>,
}

impl Highlight {
	/// Highlight for `idx`, or an empty one.
	pub fn for_node(graph: &GraphModel, idx: Option<usize>) -> Self {
		match idx {
			Some(i) if i < graph.nodes.len() => Self {
				node: Some(i),
				links: graph.incident_links(i),
				category_links: graph.incident_category_links(i),
			},
			_ => Self::default(),
		}
	}
}

/// Pins held at the center after a category focus, released on a timer.
#[derive(Clone, Debug, PartialEq)]
struct PendingRelease {
	nodes: Vec<usize>,
	remaining: f64,
}

/// Mediates user input against the graph model and the simulation.
#[derive(Clone, Debug)]
pub struct InteractionController {
	drag_alpha_target: f64,
	filter_alpha: f64,
	release_delay: f64,
	zoom_range: [f64; 2],
	center: (f64, f64),
	dragging: Option<usize>,
	selection: CategorySelection,
	allowed: Vec<bool>,
	release: Option<PendingRelease>,
	highlight: Highlight,
	pan: Option<PanState>,
	pub transform: ViewTransform,
}

impl InteractionController {
	pub fn new(config: &GraphConfig, graph: &GraphModel, width: f64, height: f64) -> Self {
		Self {
			drag_alpha_target: config.drag_alpha_target,
			filter_alpha: config.filter_alpha,
			release_delay: config.filter_release_delay,
			zoom_range: config.zoom_scale_range,
			center: (width / 2.0, height / 2.0),
			dragging: None,
			selection: CategorySelection::All,
			allowed: vec![true; graph.nodes.len()],
			release: None,
			highlight: Highlight::default(),
			pan: None,
			transform: ViewTransform::default(),
		}
	}

	// Drag

	/// Pin `id` where it is and keep the layout warm while it moves.
	pub fn on_drag_start(
		&mut self,
		graph: &GraphModel,
		sim: &mut ForceSimulation,
		id: NodeId,
	) -> bool {
		let Some(idx) = graph.index().get(id).filter(|&i| self.is_node_visible(i)) else {
			return false;
		};
		let Some(body) = sim.body(idx).copied() else {
			return false;
		};
		if self.dragging.is_none() {
			sim.enqueue(Intent::AlphaTarget(self.drag_alpha_target));
			if sim.is_at_rest() {
				sim.enqueue(Intent::Reheat {
					alpha: self.drag_alpha_target,
				});
			}
		}
		if let Some(release) = &mut self.release {
			release.nodes.retain(|&n| n != idx);
		}
		sim.enqueue(Intent::Pin {
			node: idx,
			x: body.x,
			y: body.y,
		});
		self.dragging = Some(idx);
		true
	}

	/// Move the pin of the dragged node to world position `(x, y)`.
	pub fn on_drag_move(
		&mut self,
		graph: &GraphModel,
		sim: &mut ForceSimulation,
		id: NodeId,
		x: f64,
		y: f64,
	) {
		if let Some(node) = graph.index().get(id).filter(|&i| Some(i) == self.dragging) {
			sim.enqueue(Intent::Pin { node, x, y });
		}
	}

	/// Release the dragged node and let the energy decay again.
	pub fn on_drag_end(&mut self, graph: &GraphModel, sim: &mut ForceSimulation, id: NodeId) {
		let idx = graph.index().get(id);
		if idx.is_none() || idx != self.dragging {
			return;
		}
		if let Some(node) = self.dragging.take() {
			sim.enqueue(Intent::Unpin { node });
			sim.enqueue(Intent::AlphaTarget(0.0));
		}
	}

	pub fn dragging(&self) -> Option<usize> {
		self.dragging
	}

	// Category filter

	/// Apply a category filter.
	///
	/// A specific category also pulls its members to the center, pins them
	/// there, reheats the layout and schedules the pins' release.
	pub fn select_category(
		&mut self,
		graph: &GraphModel,
		sim: &mut ForceSimulation,
		selection: CategorySelection,
	) {
		self.flush_release(sim);
		self.allowed = graph
			.nodes
			.iter()
			.map(|n| match &selection {
				CategorySelection::All => true,
				CategorySelection::Only(c) => &n.category == c,
			})
			.collect();
		debug!(
			"interaction: filter {:?}, {} nodes allowed",
			selection,
			self.allowed.iter().filter(|&&a| a).count()
		);
		if let Some(h) = self.highlight.node {
			if !self.is_node_visible(h) {
				self.highlight = Highlight::default();
			}
		}

		if let CategorySelection::Only(_) = &selection {
			let (cx, cy) = self.center;
			let members: Vec<usize> = (0..self.allowed.len())
				.filter(|&i| self.allowed[i] && Some(i) != self.dragging)
				.collect();
			if !members.is_empty() {
				for &node in &members {
					sim.enqueue(Intent::Place { node, x: cx, y: cy });
					sim.enqueue(Intent::Pin { node, x: cx, y: cy });
				}
				sim.enqueue(Intent::Reheat {
					alpha: self.filter_alpha,
				});
				self.release = Some(PendingRelease {
					nodes: members,
					remaining: self.release_delay,
				});
			}
		}
		self.selection = selection;
	}

	/// Release the category-focus pins right away.
	fn flush_release(&mut self, sim: &mut ForceSimulation) {
		if let Some(release) = self.release.take() {
			for node in release.nodes {
				sim.enqueue(Intent::Unpin { node });
			}
		}
	}

	/// Advance timers by `dt` seconds; releases focus pins when due.
	pub fn advance(&mut self, sim: &mut ForceSimulation, dt: f64) {
		let due = match &mut self.release {
			Some(release) => {
				release.remaining -= dt;
				release.remaining <= 0.0
			}
			None => false,
		};
		if due {
			self.flush_release(sim);
		}
	}

	pub fn has_pending_release(&self) -> bool {
		self.release.is_some()
	}

	pub fn selection(&self) -> &CategorySelection {
		&self.selection
	}

	pub fn is_node_visible(&self, idx: usize) -> bool {
		self.allowed.get(idx).copied().unwrap_or(false)
	}

	/// A link is visible only when both endpoints are.
	pub fn is_edge_visible(&self, source: usize, target: usize) -> bool {
		self.is_node_visible(source) && self.is_node_visible(target)
	}

	/// Ids of all nodes the current filter lets through.
	pub fn allowed_ids(&self, graph: &GraphModel) -> HashSet<NodeId> {
		graph
			.nodes
			.iter()
			.enumerate()
			.filter(|(i, _)| self.is_node_visible(*i))
			.map(|(_, n)| n.id)
			.collect()
	}

	// Hover

	/// Set the hovered node; recomputes the highlight set only.
	pub fn hover(&mut self, graph: &GraphModel, idx: Option<usize>) -> &Highlight {
		let idx = idx.filter(|&i| self.is_node_visible(i));
		if self.highlight.node != idx {
			self.highlight = Highlight::for_node(graph, idx);
		}
		&self.highlight
	}

	pub fn highlight(&self) -> &Highlight {
		&self.highlight
	}

	// Zoom and pan

	/// Zoom around a screen point, clamped to the configured scale range.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.transform.zoom_at(sx, sy, factor, self.zoom_range);
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = Some(PanState {
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		});
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if let Some(pan) = self.pan {
			self.transform.x = pan.transform_start_x + (sx - pan.start_x);
			self.transform.y = pan.transform_start_y + (sy - pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan = None;
	}

	pub fn is_panning(&self) -> bool {
		self.pan.is_some()
	}

	/// Back to the identity transform.
	pub fn reset_view(&mut self) {
		self.pan = None;
		self.transform = ViewTransform::default();
	}

	/// Keep the focus point in the middle of a resized canvas.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.center = (width / 2.0, height / 2.0);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::simulation::Phase;
	use crate::components::force_graph::types::{RawCategoryEdge, RawEdge, RawNode};

	struct Scene {
		graph: GraphModel,
		sim: ForceSimulation,
		ctl: InteractionController,
	}

	fn scene() -> Scene {
		let nodes = [(1, "Physics"), (2, "Physics"), (3, "Math"), (4, "Math"), (5, "Art")]
			.into_iter()
			.map(|(id, category)| RawNode {
				id,
				category: category.into(),
				importance: 10.0,
				attributes: Default::default(),
			})
			.collect();
		let edges = [(1, 2, 0.9), (2, 3, 0.8), (3, 4, 0.7), (4, 5, 0.3)].map(
			|(source_id, target_id, weight)| RawEdge {
				source_id,
				target_id,
				weight,
			},
		);
		let category_edges = [
			RawCategoryEdge { source_id: 1, target_id: 2 },
			RawCategoryEdge { source_id: 3, target_id: 4 },
		];
		let config = GraphConfig::default();
		let graph =
			GraphModel::build(nodes, &edges, Some(&category_edges), &config, 800.0, 600.0);
		let mut sim = ForceSimulation::new(&config, 800.0, 600.0);
		sim.seed_graph(&graph);
		let ctl = InteractionController::new(&config, &graph, 800.0, 600.0);
		Scene { graph, sim, ctl }
	}

	fn settle(sim: &mut ForceSimulation) {
		while sim.phase() != Phase::Settled {
			sim.tick();
		}
	}

	#[test]
	fn drag_then_release_clears_pin() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		assert!(ctl.on_drag_start(&graph, &mut sim, 1));
		ctl.on_drag_move(&graph, &mut sim, 1, 50.0, 50.0);
		sim.tick();
		let body = sim.body(0).unwrap();
		assert_eq!((body.x, body.y), (50.0, 50.0));
		assert_eq!(body.pin, Some((50.0, 50.0)));

		ctl.on_drag_end(&graph, &mut sim, 1);
		assert_eq!(ctl.dragging(), None);
		sim.tick();
		let body = sim.body(0).unwrap();
		assert_eq!(body.pin, None);
		assert!(body.vx != 0.0 || body.vy != 0.0);
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn drag_start_reheats_a_resting_layout() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		settle(&mut sim);
		ctl.on_drag_start(&graph, &mut sim, 3);
		assert!(sim.tick());
		assert_eq!(sim.phase(), Phase::Reheated);
		assert!(sim.alpha() > 0.25);
	}

	#[test]
	fn drag_move_is_seen_by_the_next_tick_only() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		ctl.on_drag_start(&graph, &mut sim, 2);
		sim.tick();
		ctl.on_drag_move(&graph, &mut sim, 2, 10.0, 20.0);
		assert_ne!(sim.body(1).unwrap().pin, Some((10.0, 20.0)));
		sim.tick();
		assert_eq!(sim.body(1).unwrap().pin, Some((10.0, 20.0)));
	}

	#[test]
	fn moving_another_node_is_ignored() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		ctl.on_drag_start(&graph, &mut sim, 1);
		ctl.on_drag_move(&graph, &mut sim, 2, 10.0, 20.0);
		ctl.on_drag_end(&graph, &mut sim, 2);
		assert_eq!(ctl.dragging(), Some(0));
		sim.tick();
		assert_eq!(sim.body(1).unwrap().pin, None);
	}

	#[test]
	fn unknown_or_hidden_nodes_cannot_be_dragged() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		assert!(!ctl.on_drag_start(&graph, &mut sim, 99));
		ctl.select_category(&graph, &mut sim, CategorySelection::parse("Math"));
		assert!(!ctl.on_drag_start(&graph, &mut sim, 1));
	}

	#[test]
	fn filter_then_all_restores_visibility() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		ctl.select_category(&graph, &mut sim, CategorySelection::parse("Math"));
		assert_eq!(ctl.allowed_ids(&graph), HashSet::from([3, 4]));
		let visible_links: Vec<bool> = graph
			.links
			.iter()
			.map(|l| ctl.is_edge_visible(l.source, l.target))
			.collect();
		assert_eq!(visible_links, vec![false, false, true]);

		ctl.select_category(&graph, &mut sim, CategorySelection::parse(ALL_CATEGORIES));
		assert_eq!(ctl.allowed_ids(&graph).len(), graph.nodes.len());
		assert!(
			graph
				.links
				.iter()
				.all(|l| ctl.is_edge_visible(l.source, l.target))
		);
		assert!(
			graph
				.category_links
				.iter()
				.all(|l| ctl.is_edge_visible(l.source, l.target))
		);
	}

	#[test]
	fn focus_pins_members_at_center_then_releases() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		settle(&mut sim);
		ctl.select_category(&graph, &mut sim, CategorySelection::parse("Physics"));
		assert!(ctl.has_pending_release());
		sim.tick();
		assert_eq!(sim.phase(), Phase::Reheated);
		for idx in [0, 1] {
			let body = sim.body(idx).unwrap();
			assert_eq!((body.x, body.y), (400.0, 300.0));
		}
		assert_eq!(sim.body(2).unwrap().pin, None);

		ctl.advance(&mut sim, 0.2);
		sim.tick();
		assert!(sim.body(0).unwrap().pin.is_some());

		ctl.advance(&mut sim, 0.25);
		assert!(!ctl.has_pending_release());
		sim.tick();
		assert!(sim.bodies().iter().all(|b| b.pin.is_none()));
	}

	#[test]
	fn switching_focus_releases_previous_members() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		ctl.select_category(&graph, &mut sim, CategorySelection::parse("Physics"));
		sim.tick();
		ctl.select_category(&graph, &mut sim, CategorySelection::parse("Art"));
		sim.tick();
		assert_eq!(sim.body(0).unwrap().pin, None);
		assert_eq!(sim.body(1).unwrap().pin, None);
		assert!(sim.body(4).unwrap().pin.is_some());
	}

	#[test]
	fn unknown_category_hides_everything_without_pinning() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		ctl.select_category(&graph, &mut sim, CategorySelection::parse("Music"));
		assert!(ctl.allowed_ids(&graph).is_empty());
		assert!(!ctl.has_pending_release());
	}

	#[test]
	fn hover_highlights_incident_links_only() {
		let Scene { graph, mut ctl, .. } = scene();
		let before = graph.nodes.clone();
		let highlight = ctl.hover(&graph, Some(1)).clone();
		assert_eq!(highlight.node, Some(1));
		assert_eq!(highlight.links, vec![0, 1]);
		assert_eq!(highlight.category_links, vec![0]);
		assert_eq!(graph.nodes, before);

		assert_eq!(ctl.hover(&graph, None), &Highlight::default());
	}

	#[test]
	fn zoom_is_clamped_and_leaves_world_alone() {
		let Scene {
			graph,
			mut sim,
			mut ctl,
		} = scene();
		sim.tick();
		let bodies = sim.bodies().to_vec();
		for _ in 0..100 {
			ctl.zoom_at(400.0, 300.0, 1.5);
		}
		assert_eq!(ctl.transform.k, 8.0);
		for _ in 0..100 {
			ctl.zoom_at(400.0, 300.0, 0.5);
		}
		assert_eq!(ctl.transform.k, 0.1);
		assert_eq!(sim.bodies(), bodies.as_slice());
		let _ = graph;
	}

	#[test]
	fn zoom_keeps_the_cursor_point_fixed() {
		let mut t = ViewTransform::default();
		let before = t.screen_to_world(200.0, 100.0);
		t.zoom_at(200.0, 100.0, 2.0, [0.1, 8.0]);
		let after = t.screen_to_world(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
		let (sx, sy) = t.world_to_screen(after.0, after.1);
		assert!((sx - 200.0).abs() < 1e-9 && (sy - 100.0).abs() < 1e-9);
	}

	#[test]
	fn pan_follows_the_pointer() {
		let Scene { mut ctl, .. } = scene();
		ctl.begin_pan(10.0, 10.0);
		ctl.pan_to(40.0, -5.0);
		assert_eq!((ctl.transform.x, ctl.transform.y), (30.0, -15.0));
		ctl.end_pan();
		ctl.pan_to(100.0, 100.0);
		assert_eq!((ctl.transform.x, ctl.transform.y), (30.0, -15.0));
		ctl.zoom_at(0.0, 0.0, 2.0);
		ctl.reset_view();
		assert_eq!(ctl.transform, ViewTransform::default());
	}
}
