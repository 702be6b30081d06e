//! Force terms of the layout.
//!
//! Every term only adds to body velocities; positions change once per tick,
//! during integration. Coincident bodies are separated with a tiny
//! deterministic jiggle so the layout is reproducible.

use super::quadtree::Quadtree;

/// Below this many bodies repulsion is computed exactly, pair by pair.
pub const EXACT_REPULSION_LIMIT: usize = 32;

/// Squared minimum distance for repulsion, avoids blow-ups at close range.
const DISTANCE_MIN2: f64 = 1.0;

/// Mutable physical state of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub radius: f64,
	/// Fixed position; overrides integration while set.
	pub pin: Option<(f64, f64)>,
}

impl Body {
	pub fn at(x: f64, y: f64, radius: f64) -> Self {
		Self {
			x,
			y,
			radius,
			..Self::default()
		}
	}
}

/// A link resolved to body indices with its precomputed parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkTerm {
	pub source: usize,
	pub target: usize,
	pub distance: f64,
	pub strength: f64,
	/// Share of the correction applied to the target.
	pub bias: f64,
}

impl LinkTerm {
	/// Degree-normalized strength and bias for a link.
	pub fn new(source: usize, target: usize, distance: f64, degree: &[usize]) -> Self {
		let (ds, dt) = (degree[source].max(1) as f64, degree[target].max(1) as f64);
		Self {
			source,
			target,
			distance,
			strength: 1.0 / ds.min(dt),
			bias: ds / (ds + dt),
		}
	}
}

/// Linear congruential generator for reproducible tiny offsets.
#[derive(Clone, Debug)]
pub struct Jiggle {
	state: u32,
}

impl Default for Jiggle {
	fn default() -> Self {
		Self { state: 1 }
	}
}

impl Jiggle {
	pub fn next(&mut self) -> f64 {
		self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		(f64::from(self.state) / 4_294_967_296.0 - 0.5) * 1e-6
	}
}

/// Spring each link toward its target distance.
pub fn apply_links(bodies: &mut [Body], links: &[LinkTerm], alpha: f64, jiggle: &mut Jiggle) {
	for link in links {
		let (s, t) = (bodies[link.source], bodies[link.target]);
		let mut dx = t.x + t.vx - s.x - s.vx;
		let mut dy = t.y + t.vy - s.y - s.vy;
		if dx == 0.0 {
			dx = jiggle.next();
		}
		if dy == 0.0 {
			dy = jiggle.next();
		}
		let l = (dx * dx + dy * dy).sqrt();
		let k = (l - link.distance) / l * alpha * link.strength;
		dx *= k;
		dy *= k;
		bodies[link.target].vx -= dx * link.bias;
		bodies[link.target].vy -= dy * link.bias;
		bodies[link.source].vx += dx * (1.0 - link.bias);
		bodies[link.source].vy += dy * (1.0 - link.bias);
	}
}

/// Velocity change on a body at `(xi, yi)` from a charge at offset `(dx, dy)`.
fn charge_impulse(
	mut dx: f64,
	mut dy: f64,
	charge: f64,
	alpha: f64,
	jiggle: &mut Jiggle,
) -> (f64, f64) {
	if dx == 0.0 {
		dx = jiggle.next();
	}
	if dy == 0.0 {
		dy = jiggle.next();
	}
	let mut l = dx * dx + dy * dy;
	if l < DISTANCE_MIN2 {
		l = (DISTANCE_MIN2 * l).sqrt();
	}
	let w = charge * alpha / l;
	(dx * w, dy * w)
}

/// Many-body repulsion with per-body charge `charge` (negative repels).
///
/// Exact for small graphs, Barnes-Hut with opening angle `theta` otherwise.
pub fn apply_many_body(
	bodies: &mut [Body],
	charge: f64,
	theta: f64,
	alpha: f64,
	jiggle: &mut Jiggle,
) {
	if charge == 0.0 || bodies.len() < 2 {
		return;
	}
	if bodies.len() <= EXACT_REPULSION_LIMIT {
		for i in 0..bodies.len() {
			let (mut ax, mut ay) = (0.0, 0.0);
			for j in 0..bodies.len() {
				if i == j {
					continue;
				}
				let (fx, fy) = charge_impulse(
					bodies[j].x - bodies[i].x,
					bodies[j].y - bodies[i].y,
					charge,
					alpha,
					jiggle,
				);
				ax += fx;
				ay += fy;
			}
			bodies[i].vx += ax;
			bodies[i].vy += ay;
		}
		return;
	}

	let points: Vec<(f64, f64)> = bodies.iter().map(|b| (b.x, b.y)).collect();
	let tree = Quadtree::build(&points);
	let masses = tree.masses(&vec![charge; bodies.len()]);
	let theta2 = theta * theta;

	for (i, &(xi, yi)) in points.iter().enumerate() {
		let (mut ax, mut ay) = (0.0, 0.0);
		tree.visit(|idx, cell| {
			let mass = masses[idx];
			if mass.strength == 0.0 {
				return true;
			}
			let (dx, dy) = (mass.x - xi, mass.y - yi);
			let w = cell.width();
			let l = dx * dx + dy * dy;
			if w * w / theta2 < l {
				let (fx, fy) = charge_impulse(dx, dy, mass.strength, alpha, jiggle);
				ax += fx;
				ay += fy;
				return true;
			}
			if !cell.is_leaf() {
				return false;
			}
			for &j in cell.points.iter().filter(|&&j| j != i) {
				let (xj, yj) = tree.point(j);
				let (fx, fy) = charge_impulse(xj - xi, yj - yi, charge, alpha, jiggle);
				ax += fx;
				ay += fy;
			}
			true
		});
		bodies[i].vx += ax;
		bodies[i].vy += ay;
	}
}

/// Pull the centroid of all bodies toward `(cx, cy)`.
pub fn apply_center(bodies: &mut [Body], cx: f64, cy: f64, strength: f64) {
	if bodies.is_empty() || strength == 0.0 {
		return;
	}
	let n = bodies.len() as f64;
	let (sx, sy) = bodies
		.iter()
		.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
	let (dx, dy) = ((cx - sx / n) * strength, (cy - sy / n) * strength);
	for body in bodies.iter_mut() {
		body.vx += dx;
		body.vy += dy;
	}
}

/// Push overlapping circles apart, `iterations` relaxation passes.
///
/// Each pass looks at predicted positions (`x + vx`) and splits the overlap
/// between the two bodies in proportion to the other's squared radius.
pub fn apply_collision(bodies: &mut [Body], padding: f64, iterations: usize, jiggle: &mut Jiggle) {
	if bodies.len() < 2 {
		return;
	}
	let radii: Vec<f64> = bodies.iter().map(|b| b.radius + padding).collect();
	for _ in 0..iterations {
		let predicted: Vec<(f64, f64)> = bodies.iter().map(|b| (b.x + b.vx, b.y + b.vy)).collect();
		let tree = Quadtree::build(&predicted);
		let reach = tree.max_radii(&radii);

		for i in 0..bodies.len() {
			let (xi, yi) = predicted[i];
			let ri = radii[i];
			let mut candidates = Vec::new();
			tree.visit(|idx, cell| {
				if cell.is_leaf() {
					candidates.extend(cell.points.iter().copied().filter(|&j| j > i));
					return true;
				}
				let r = ri + reach[idx];
				cell.x0 > xi + r || cell.x1 < xi - r || cell.y0 > yi + r || cell.y1 < yi - r
			});

			for j in candidates {
				let (a, b) = (bodies[i], bodies[j]);
				let rj = radii[j];
				let r = ri + rj;
				let mut dx = a.x + a.vx - b.x - b.vx;
				let mut dy = a.y + a.vy - b.y - b.vy;
				let mut l = dx * dx + dy * dy;
				if l >= r * r {
					continue;
				}
				if dx == 0.0 {
					dx = jiggle.next();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = jiggle.next();
					l += dy * dy;
				}
				let d = l.sqrt();
				let k = (r - d) / d;
				dx *= k;
				dy *= k;
				let share = (rj * rj) / (ri * ri + rj * rj);
				bodies[i].vx += dx * share;
				bodies[i].vy += dy * share;
				bodies[j].vx -= dx * (1.0 - share);
				bodies[j].vy -= dy * (1.0 - share);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn distance(a: &Body, b: &Body) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn link_pulls_distant_ends_together() {
		let mut bodies = [Body::at(0.0, 0.0, 10.0), Body::at(300.0, 0.0, 10.0)];
		let link = LinkTerm::new(0, 1, 60.0, &[1, 1]);
		apply_links(&mut bodies, &[link], 1.0, &mut Jiggle::default());
		assert!(bodies[0].vx > 0.0);
		assert!(bodies[1].vx < 0.0);
	}

	#[test]
	fn link_pushes_close_ends_apart() {
		let mut bodies = [Body::at(0.0, 0.0, 10.0), Body::at(10.0, 0.0, 10.0)];
		let link = LinkTerm::new(0, 1, 60.0, &[1, 1]);
		apply_links(&mut bodies, &[link], 1.0, &mut Jiggle::default());
		assert!(bodies[0].vx < 0.0);
		assert!(bodies[1].vx > 0.0);
	}

	#[test]
	fn link_strength_is_degree_normalized() {
		let link = LinkTerm::new(0, 1, 50.0, &[4, 2]);
		assert_eq!(link.strength, 0.5);
		assert!((link.bias - 4.0 / 6.0).abs() < 1e-12);
	}

	#[test]
	fn repulsion_separates_bodies() {
		let mut bodies = [Body::at(0.0, 0.0, 1.0), Body::at(5.0, 0.0, 1.0)];
		apply_many_body(&mut bodies, -300.0, 0.9, 1.0, &mut Jiggle::default());
		assert!(bodies[0].vx < 0.0);
		assert!(bodies[1].vx > 0.0);
	}

	#[test]
	fn barnes_hut_tracks_exact_repulsion() {
		let layout: Vec<Body> = (0..200)
			.map(|i| {
				let a = i as f64 * 2.399_963;
				let r = 10.0 * (i as f64).sqrt();
				Body::at(400.0 + r * a.cos(), 300.0 + r * a.sin(), 5.0)
			})
			.collect();

		let mut approx = layout.clone();
		apply_many_body(&mut approx, -300.0, 0.5, 1.0, &mut Jiggle::default());

		let mut exact = layout;
		for i in 0..exact.len() {
			let (mut ax, mut ay) = (0.0, 0.0);
			for j in 0..exact.len() {
				if i != j {
					let (fx, fy) = charge_impulse(
						exact[j].x - exact[i].x,
						exact[j].y - exact[i].y,
						-300.0,
						1.0,
						&mut Jiggle::default(),
					);
					ax += fx;
					ay += fy;
				}
			}
			exact[i].vx = ax;
			exact[i].vy = ay;
		}

		let err: f64 = approx
			.iter()
			.zip(&exact)
			.map(|(a, e)| ((a.vx - e.vx).powi(2) + (a.vy - e.vy).powi(2)).sqrt())
			.sum();
		let norm: f64 = exact.iter().map(|e| (e.vx.powi(2) + e.vy.powi(2)).sqrt()).sum();
		assert!(err / norm < 0.1, "relative error {}", err / norm);
	}

	#[test]
	fn center_moves_centroid_toward_target() {
		let mut bodies = [Body::at(0.0, 0.0, 1.0), Body::at(10.0, 0.0, 1.0)];
		apply_center(&mut bodies, 105.0, 0.0, 0.1);
		assert!((bodies[0].vx - 10.0).abs() < 1e-9);
		assert_eq!(bodies[0].vx, bodies[1].vx);
		assert_eq!(bodies[0].vy, 0.0);
	}

	#[test]
	fn collision_separates_overlapping_circles() {
		let mut bodies = [Body::at(0.0, 0.0, 10.0), Body::at(5.0, 0.0, 10.0)];
		apply_collision(&mut bodies, 0.0, 2, &mut Jiggle::default());
		let (a, b) = (bodies[0], bodies[1]);
		let moved_a = Body::at(a.x + a.vx, a.y + a.vy, 0.0);
		let moved_b = Body::at(b.x + b.vx, b.y + b.vy, 0.0);
		assert!(distance(&moved_a, &moved_b) > 5.0);
		assert!(a.vx < 0.0 && b.vx > 0.0);
	}

	#[test]
	fn collision_ignores_separated_circles() {
		let mut bodies = [Body::at(0.0, 0.0, 10.0), Body::at(50.0, 0.0, 10.0)];
		apply_collision(&mut bodies, 4.0, 2, &mut Jiggle::default());
		assert_eq!(bodies[0].vx, 0.0);
		assert_eq!(bodies[1].vx, 0.0);
	}

	#[test]
	fn coincident_bodies_still_separate() {
		let mut bodies = [Body::at(1.0, 1.0, 10.0), Body::at(1.0, 1.0, 10.0)];
		apply_collision(&mut bodies, 0.0, 1, &mut Jiggle::default());
		assert_ne!(bodies[0].vx, 0.0);
		assert_ne!(bodies[1].vx, 0.0);
	}
}
