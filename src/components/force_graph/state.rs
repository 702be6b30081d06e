//! Per-frame state of the network view.
//!
//! Ties the graph model, the layout engine and the interaction controller
//! together for the canvas component, and animates hover highlights with
//! smooth per-node intensity transitions. Tracks whether anything changed
//! since the last frame so a settled, idle view is not redrawn.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::info;

use super::config::GraphConfig;
use super::interaction::{CategorySelection, InteractionController};
use super::model::GraphModel;
use super::overlay::{LegendEntry, Tooltip, legend};
use super::scale::{ScaleConfig, ScaledValues};
use super::simulation::ForceSimulation;
use super::theme::{CategoryColors, Theme};
use super::types::Dataset;

/// Smoothed highlight intensity per node.
///
/// Each node eases toward 1.0 while it is the hovered node or one of its
/// neighbors, and back toward 0.0 afterwards. A short hold time keeps the
/// highlight from flashing when the pointer grazes a node.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	pub hovered_node: Option<usize>,
	target_set: HashSet<usize>,
	node_intensity: HashMap<usize, f64>,
	hover_ring_intensity: HashMap<usize, f64>,
	hold_timer: HashMap<usize, f64>,
	cached_max: f64,
}

/// Seconds a highlight is held before it may fade out.
const MIN_HOLD_TIME: f64 = 0.12;
/// Intensities below this are dropped.
const VISIBLE_EPSILON: f64 = 0.005;

impl HighlightState {
	/// Set the hovered node and the neighbors lit up with it.
	pub fn set_hover(&mut self, node: Option<usize>, neighbors: &[usize]) {
		if self.hovered_node == node {
			return;
		}
		self.hovered_node = node;
		self.target_set.clear();

		let Some(idx) = node else {
			return;
		};
		self.target_set.insert(idx);
		self.target_set.extend(neighbors.iter().copied());
		for &n in &self.target_set {
			self.hold_timer.insert(n, MIN_HOLD_TIME);
		}
	}

	/// Ease every intensity toward its target by `dt` seconds.
	///
	/// value += (target - value) * (1 - e^(-speed * dt))
	///
	/// Returns `true` while any highlight is visible or fading.
	pub fn tick(&mut self, dt: f64) -> bool {
		const FADE_IN_SPEED: f64 = 6.0;
		const FADE_OUT_SPEED: f64 = 4.0;

		let active = !self.target_set.is_empty()
			|| !self.node_intensity.is_empty()
			|| !self.hover_ring_intensity.is_empty();

		let fade_in = 1.0 - (-FADE_IN_SPEED * dt).exp();
		let fade_out = (-FADE_OUT_SPEED * dt).exp();

		for &idx in &self.target_set {
			let intensity = self.node_intensity.entry(idx).or_insert(0.0);
			*intensity += (1.0 - *intensity) * fade_in;
		}
		if let Some(idx) = self.hovered_node {
			let intensity = self.hover_ring_intensity.entry(idx).or_insert(0.0);
			*intensity += (1.0 - *intensity) * fade_in;
		}

		let target_set = &self.target_set;
		self.hold_timer.retain(|idx, timer| {
			if target_set.contains(idx) {
				return true;
			}
			*timer -= dt;
			*timer > 0.0
		});

		let hold_timer = &self.hold_timer;
		let held = |idx: &usize| hold_timer.get(idx).is_some_and(|&t| t > 0.0);
		let mut max: f64 = 0.0;
		self.node_intensity.retain(|idx, intensity| {
			if !target_set.contains(idx) && !held(idx) {
				*intensity *= fade_out;
			}
			max = max.max(*intensity);
			target_set.contains(idx) || *intensity > VISIBLE_EPSILON
		});

		let hovered = self.hovered_node;
		self.hover_ring_intensity.retain(|idx, intensity| {
			if hovered == Some(*idx) {
				return true;
			}
			if !held(idx) {
				*intensity *= fade_out;
			}
			*intensity > VISIBLE_EPSILON
		});

		self.cached_max = max;
		active
	}

	pub fn node_intensity(&self, idx: usize) -> f64 {
		self.node_intensity.get(&idx).copied().unwrap_or(0.0)
	}

	pub fn hover_ring_intensity(&self, idx: usize) -> f64 {
		self.hover_ring_intensity.get(&idx).copied().unwrap_or(0.0)
	}

	/// Link intensity: geometric mean of its endpoints.
	pub fn edge_intensity(&self, a: usize, b: usize) -> f64 {
		(self.node_intensity(a) * self.node_intensity(b)).sqrt()
	}

	/// Largest node intensity, used to dim everything else.
	pub fn max_intensity(&self) -> f64 {
		self.cached_max
	}
}

/// Node currently being dragged and where it was grabbed.
#[derive(Clone, Copy, Debug, PartialEq)]
struct DragGrab {
	node: usize,
	/// Node position minus pointer position, world units.
	offset_x: f64,
	offset_y: f64,
}

/// Core view state: model, layout, interaction and highlight tracking.
///
/// Created once per successful load, then mutated each frame by the
/// animation loop.
pub struct ForceGraphState {
	pub graph: GraphModel,
	pub sim: ForceSimulation,
	pub interaction: InteractionController,
	pub highlight: HighlightState,
	pub config: GraphConfig,
	pub colors: CategoryColors,
	pub width: f64,
	pub height: f64,
	grab: Option<DragGrab>,
	/// Set by the simulation whenever bodies move.
	moved: Rc<Cell<bool>>,
	/// Set by input that changes the picture without moving bodies.
	dirty: bool,
}

impl ForceGraphState {
	/// Build the model and seed the layout for a `width` x `height` canvas.
	pub fn new(dataset: Dataset, config: GraphConfig, width: f64, height: f64, theme: &Theme) -> Self {
		let Dataset {
			nodes,
			edges,
			category_edges,
		} = dataset;
		let graph = GraphModel::build(
			nodes,
			&edges,
			category_edges.as_deref(),
			&config,
			width,
			height,
		);
		let mut sim = ForceSimulation::new(&config, width, height);
		sim.seed_graph(&graph);
		let moved = Rc::new(Cell::new(true));
		let flag = moved.clone();
		sim.on_tick(move |_| flag.set(true));
		let interaction = InteractionController::new(&config, &graph, width, height);
		let colors = theme
			.palette
			.assign(graph.nodes.iter().map(|n| n.category.as_str()));
		info!(
			"view: {} nodes ready on a {}x{} canvas",
			graph.nodes.len(),
			width,
			height
		);

		Self {
			graph,
			sim,
			interaction,
			highlight: HighlightState::default(),
			config,
			colors,
			width,
			height,
			grab: None,
			moved,
			dirty: true,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.interaction.transform.screen_to_world(sx, sy)
	}

	/// Topmost visible node under a screen point, by its own radius.
	pub fn node_at_position(&self, sx: f64, sy: f64, config: &ScaleConfig) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let scale = ScaledValues::new(config, self.interaction.transform.k);
		self.sim
			.bodies()
			.iter()
			.enumerate()
			.rev()
			.filter(|(i, _)| self.interaction.is_node_visible(*i))
			.find(|(_, b)| {
				let (dx, dy) = (b.x - gx, b.y - gy);
				(dx * dx + dy * dy).sqrt() <= b.radius + scale.hit_slop
			})
			.map(|(i, _)| i)
	}

	/// Hover `node`; the controller decides which links and neighbors light up.
	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.highlight.hovered_node == node {
			return;
		}
		let highlight = self.interaction.hover(&self.graph, node);
		let neighbors: Vec<usize> = highlight
			.links
			.iter()
			.filter_map(|&i| self.graph.links.get(i))
			.map(|l| if highlight.node == Some(l.source) { l.target } else { l.source })
			.collect();
		self.highlight.set_hover(highlight.node, &neighbors);
		self.dirty = true;
	}

	/// Number of nodes the current filter lets through.
	pub fn visible_count(&self) -> usize {
		self.interaction.allowed_ids(&self.graph).len()
	}

	/// Tooltip content for the hovered node.
	pub fn tooltip(&self) -> Option<Tooltip> {
		let idx = self.highlight.hovered_node?;
		self.graph.nodes.get(idx).map(Tooltip::for_node)
	}

	pub fn legend(&self) -> Vec<LegendEntry> {
		legend(&self.graph, &self.colors)
	}

	/// Start dragging the node at `idx`, grabbed at screen point `(sx, sy)`.
	pub fn begin_drag(&mut self, idx: usize, sx: f64, sy: f64) -> bool {
		let Some(node) = self.graph.nodes.get(idx) else {
			return false;
		};
		if !self.interaction.on_drag_start(&self.graph, &mut self.sim, node.id) {
			return false;
		}
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let (bx, by) = self
			.sim
			.body(idx)
			.map(|b| (b.x, b.y))
			.unwrap_or((gx, gy));
		self.grab = Some(DragGrab {
			node: idx,
			offset_x: bx - gx,
			offset_y: by - gy,
		});
		true
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(grab) = self.grab else {
			return;
		};
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let id = self.graph.nodes[grab.node].id;
		self.interaction.on_drag_move(
			&self.graph,
			&mut self.sim,
			id,
			gx + grab.offset_x,
			gy + grab.offset_y,
		);
		self.dirty = true;
	}

	pub fn end_drag(&mut self) {
		if let Some(grab) = self.grab.take() {
			let id = self.graph.nodes[grab.node].id;
			self.interaction.on_drag_end(&self.graph, &mut self.sim, id);
		}
	}

	pub fn is_dragging(&self) -> bool {
		self.grab.is_some()
	}

	/// Apply the category filter value from the select box.
	pub fn select_category(&mut self, value: &str) {
		self.interaction
			.select_category(&self.graph, &mut self.sim, CategorySelection::parse(value));
		if let Some(h) = self.highlight.hovered_node {
			if !self.interaction.is_node_visible(h) {
				self.highlight.set_hover(None, &[]);
			}
		}
		self.dirty = true;
	}

	/// Advance timers, layout and highlight animation by `dt` seconds.
	///
	/// Returns `true` when the frame needs to be redrawn.
	pub fn tick(&mut self, dt: f64) -> bool {
		self.interaction.advance(&mut self.sim, dt);
		self.sim.tick();
		let fading = self.highlight.tick(dt);
		let moved = self.moved.replace(false);
		moved | fading | std::mem::take(&mut self.dirty)
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.interaction.begin_pan(sx, sy);
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		self.interaction.pan_to(sx, sy);
		self.dirty = true;
	}

	pub fn end_pan(&mut self) {
		self.interaction.end_pan();
	}

	pub fn is_panning(&self) -> bool {
		self.interaction.is_panning()
	}

	/// Zoom by `factor` around the screen point `(sx, sy)`.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.interaction.zoom_at(sx, sy, factor);
		self.dirty = true;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.sim.set_center(width / 2.0, height / 2.0);
		self.interaction.resize(width, height);
		self.dirty = true;
	}

	/// Reset pan and zoom.
	pub fn reset_view(&mut self) {
		self.interaction.reset_view();
		self.dirty = true;
	}
}
