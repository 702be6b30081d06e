//! Force-directed layout engine.
//!
//! Owns position and velocity of every node and advances them one tick at a
//! time. Energy (`alpha`) starts high after [`ForceSimulation::seed`] and
//! decays toward `alpha_target`; once both fall below `alpha_min` the layout
//! is settled and ticks stop integrating.
//!
//! Interaction never touches bodies directly: it enqueues [`Intent`]s, which
//! are applied at the start of the next tick.

use std::collections::VecDeque;

use log::{debug, warn};

use super::config::GraphConfig;
use super::forces::{
	Body, Jiggle, LinkTerm, apply_center, apply_collision, apply_links, apply_many_body,
};
use super::model::{GraphModel, Link, Node, NodeIndex};

/// Lifecycle of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Nothing loaded.
	Idle,
	/// Seeded, energy decaying.
	Running,
	/// Energy boosted by an interaction, decaying again.
	Reheated,
	/// Energy below the floor; bodies stay put apart from pins.
	Settled,
}

/// A change requested by the interaction layer, applied before the next tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
	/// Fix a body at a position.
	Pin { node: usize, x: f64, y: f64 },
	/// Release a body back to free motion.
	Unpin { node: usize },
	/// Teleport a body and zero its velocity.
	Place { node: usize, x: f64, y: f64 },
	/// Raise energy to at least `alpha`.
	Reheat { alpha: f64 },
	/// Energy level the decay converges to.
	AlphaTarget(f64),
}

/// Emitted to subscribers after every integrating tick.
#[derive(Debug)]
pub struct TickEvent<'a> {
	pub tick: u64,
	pub alpha: f64,
	pub bodies: &'a [Body],
}

type Subscriber = Box<dyn FnMut(&TickEvent<'_>)>;

/// The layout engine. One instance per loaded graph.
pub struct ForceSimulation {
	config: GraphConfig,
	bodies: Vec<Body>,
	links: Vec<LinkTerm>,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	phase: Phase,
	ticks: u64,
	jiggle: Jiggle,
	pending: VecDeque<Intent>,
	subscribers: Vec<Subscriber>,
}

impl ForceSimulation {
	pub fn new(config: &GraphConfig, width: f64, height: f64) -> Self {
		Self {
			config: config.clone(),
			bodies: Vec::new(),
			links: Vec::new(),
			center: (width / 2.0, height / 2.0),
			alpha: 0.0,
			alpha_target: 0.0,
			phase: Phase::Idle,
			ticks: 0,
			jiggle: Jiggle::default(),
			pending: VecDeque::new(),
			subscribers: Vec::new(),
		}
	}

	/// Seed from a built graph model.
	pub fn seed_graph(&mut self, graph: &GraphModel) {
		self.seed(&graph.nodes, &graph.links, graph.index());
	}

	/// Load bodies and links and start running at full energy.
	///
	/// Links whose endpoints are not in `index` are dropped. Zero nodes
	/// leaves the simulation idle.
	pub fn seed(&mut self, nodes: &[Node], links: &[Link], index: &NodeIndex) {
		self.pending.clear();
		self.jiggle = Jiggle::default();
		self.ticks = 0;
		self.alpha_target = 0.0;
		self.bodies = nodes.iter().map(|n| Body::at(n.x, n.y, n.radius)).collect();
		self.links.clear();

		if self.bodies.is_empty() {
			self.alpha = 0.0;
			self.phase = Phase::Idle;
			return;
		}

		let resolve = |id| index.get(id).filter(|&i| i < nodes.len());
		let mut resolved = Vec::with_capacity(links.len());
		for link in links {
			match (resolve(link.source_id), resolve(link.target_id)) {
				(Some(s), Some(t)) if s != t => resolved.push((s, t, link.weight)),
				_ => warn!(
					"simulation: dropping link {} -> {} with unknown endpoint",
					link.source_id, link.target_id
				),
			}
		}

		let mut degree = vec![0usize; self.bodies.len()];
		for &(s, t, _) in &resolved {
			degree[s] += 1;
			degree[t] += 1;
		}
		self.links = resolved
			.into_iter()
			.map(|(s, t, w)| LinkTerm::new(s, t, self.config.link_distance(w), &degree))
			.collect();

		self.alpha = 1.0;
		self.phase = Phase::Running;
		debug!(
			"simulation: seeded {} bodies, {} links",
			self.bodies.len(),
			self.links.len()
		);
	}

	/// Queue a change for the next tick.
	pub fn enqueue(&mut self, intent: Intent) {
		self.pending.push_back(intent);
	}

	/// Raise energy to at least `alpha` without reseeding.
	pub fn reheat(&mut self, alpha: f64) {
		if self.phase == Phase::Idle {
			return;
		}
		self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
		if self.phase != Phase::Reheated {
			debug!("simulation: reheated to {:.3}", self.alpha);
		}
		self.phase = Phase::Reheated;
	}

	/// Tear down: drop all bodies and stop ticking.
	pub fn stop(&mut self) {
		self.bodies.clear();
		self.links.clear();
		self.pending.clear();
		self.alpha = 0.0;
		self.alpha_target = 0.0;
		self.phase = Phase::Idle;
	}

	/// Register a callback fired after every integrating tick.
	pub fn on_tick(&mut self, subscriber: impl FnMut(&TickEvent<'_>) + 'static) {
		self.subscribers.push(Box::new(subscriber));
	}

	/// Move the centering target, e.g. after a canvas resize.
	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	fn apply_intent(&mut self, intent: Intent) {
		match intent {
			Intent::Pin { node, x, y } => {
				if let Some(body) = self.bodies.get_mut(node) {
					body.pin = Some((x, y));
				}
			}
			Intent::Unpin { node } => {
				if let Some(body) = self.bodies.get_mut(node) {
					body.pin = None;
				}
			}
			Intent::Place { node, x, y } => {
				if let Some(body) = self.bodies.get_mut(node) {
					body.x = x;
					body.y = y;
					body.vx = 0.0;
					body.vy = 0.0;
				}
			}
			Intent::Reheat { alpha } => self.reheat(alpha),
			Intent::AlphaTarget(target) => {
				self.alpha_target = target.clamp(0.0, 1.0);
				if self.phase == Phase::Settled && self.alpha_target >= self.config.alpha_min {
					self.phase = Phase::Reheated;
				}
			}
		}
	}

	/// Apply queued intents, then advance one step.
	///
	/// Returns `true` when bodies moved and subscribers were notified.
	pub fn tick(&mut self) -> bool {
		while let Some(intent) = self.pending.pop_front() {
			self.apply_intent(intent);
		}

		match self.phase {
			Phase::Idle => false,
			Phase::Settled => {
				let moved = self.hold_pins();
				if moved {
					self.emit();
				}
				moved
			}
			Phase::Running | Phase::Reheated => {
				self.step();
				self.emit();
				true
			}
		}
	}

	/// Snap pinned bodies onto their pins; `true` if any moved.
	fn hold_pins(&mut self) -> bool {
		let mut moved = false;
		for body in &mut self.bodies {
			if let Some((fx, fy)) = body.pin {
				moved |= body.x != fx || body.y != fy;
				body.x = fx;
				body.y = fy;
				body.vx = 0.0;
				body.vy = 0.0;
			}
		}
		moved
	}

	fn step(&mut self) {
		let c = &self.config;
		self.alpha += (self.alpha_target - self.alpha) * c.alpha_decay;

		apply_links(&mut self.bodies, &self.links, self.alpha, &mut self.jiggle);
		apply_many_body(
			&mut self.bodies,
			-c.repulsion_strength,
			c.barnes_hut_theta,
			self.alpha,
			&mut self.jiggle,
		);
		apply_center(&mut self.bodies, self.center.0, self.center.1, c.center_strength);
		apply_collision(
			&mut self.bodies,
			c.collision_padding,
			c.collision_iterations,
			&mut self.jiggle,
		);

		let keep = 1.0 - c.velocity_decay;
		for body in &mut self.bodies {
			match body.pin {
				Some((fx, fy)) => {
					body.x = fx;
					body.y = fy;
					body.vx = 0.0;
					body.vy = 0.0;
				}
				None => {
					body.vx *= keep;
					body.vy *= keep;
					body.x += body.vx;
					body.y += body.vy;
				}
			}
		}

		self.ticks += 1;
		if self.alpha < c.alpha_min && self.alpha_target < c.alpha_min {
			debug!("simulation: settled after {} ticks", self.ticks);
			self.phase = Phase::Settled;
		}
	}

	fn emit(&mut self) {
		let event = TickEvent {
			tick: self.ticks,
			alpha: self.alpha,
			bodies: &self.bodies,
		};
		for subscriber in &mut self.subscribers {
			subscriber(&event);
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// At rest: settled or nothing loaded.
	pub fn is_at_rest(&self) -> bool {
		matches!(self.phase, Phase::Settled | Phase::Idle)
	}

	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	pub fn body(&self, idx: usize) -> Option<&Body> {
		self.bodies.get(idx)
	}

	pub fn links(&self) -> &[LinkTerm] {
		&self.links
	}

	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	pub fn has_pending(&self) -> bool {
		!self.pending.is_empty()
	}
}
