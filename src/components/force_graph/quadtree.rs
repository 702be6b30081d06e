//! Point quadtree used by the repulsion and collision forces.
//!
//! Cells live in a flat arena; a child is always stored after its parent, so
//! a reverse sweep over the arena visits children before parents. Leaves hold
//! one point, or several when they coincide or the depth limit is reached.

/// Subdivision stops here; deeper points share a leaf.
const MAX_DEPTH: usize = 32;

/// One square region of the tree.
#[derive(Clone, Debug)]
pub struct Cell {
	pub x0: f64,
	pub y0: f64,
	pub x1: f64,
	pub y1: f64,
	pub children: [Option<usize>; 4],
	/// Point indices; only leaves carry points.
	pub points: Vec<usize>,
}

impl Cell {
	fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
		Self {
			x0,
			y0,
			x1,
			y1,
			children: [None; 4],
			points: Vec::new(),
		}
	}

	pub fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}

	pub fn width(&self) -> f64 {
		self.x1 - self.x0
	}

	fn quadrant(&self, x: f64, y: f64) -> usize {
		let xm = (self.x0 + self.x1) / 2.0;
		let ym = (self.y0 + self.y1) / 2.0;
		usize::from(x >= xm) | (usize::from(y >= ym) << 1)
	}

	fn child_bounds(&self, q: usize) -> (f64, f64, f64, f64) {
		let xm = (self.x0 + self.x1) / 2.0;
		let ym = (self.y0 + self.y1) / 2.0;
		let (x0, x1) = if q & 1 == 0 { (self.x0, xm) } else { (xm, self.x1) };
		let (y0, y1) = if q & 2 == 0 { (self.y0, ym) } else { (ym, self.y1) };
		(x0, y0, x1, y1)
	}
}

/// Aggregate charge of a cell: total strength and its weighted centroid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mass {
	pub strength: f64,
	pub x: f64,
	pub y: f64,
}

/// Arena quadtree over a snapshot of point positions.
#[derive(Clone, Debug, Default)]
pub struct Quadtree {
	cells: Vec<Cell>,
	points: Vec<(f64, f64)>,
}

impl Quadtree {
	/// Build a tree covering every point. Non-finite points are skipped.
	pub fn build(points: &[(f64, f64)]) -> Self {
		let mut tree = Self {
			cells: Vec::new(),
			points: points.to_vec(),
		};
		let finite = || points.iter().filter(|(x, y)| x.is_finite() && y.is_finite());
		let Some((mut x0, mut y0)) = finite().next().copied() else {
			return tree;
		};
		let (mut x1, mut y1) = (x0, y0);
		for &(x, y) in finite() {
			x0 = x0.min(x);
			y0 = y0.min(y);
			x1 = x1.max(x);
			y1 = y1.max(y);
		}
		// Square extent, padded so points on the far edge stay inside.
		let size = (x1 - x0).max(y1 - y0).max(1.0) * (1.0 + 1e-9) + 1e-9;
		tree.cells.push(Cell::new(x0, y0, x0 + size, y0 + size));

		for (i, &(x, y)) in points.iter().enumerate() {
			if x.is_finite() && y.is_finite() {
				tree.insert(i, x, y);
			}
		}
		tree
	}

	fn insert(&mut self, i: usize, x: f64, y: f64) {
		let mut cell = 0;
		let mut depth = 0;
		loop {
			if self.cells[cell].is_leaf() {
				let Some(&first) = self.cells[cell].points.first() else {
					self.cells[cell].points.push(i);
					return;
				};
				if depth >= MAX_DEPTH || self.points[first] == (x, y) {
					self.cells[cell].points.push(i);
					return;
				}
				// Split: the resident points coincide, so they move down together.
				let resident = std::mem::take(&mut self.cells[cell].points);
				let (fx, fy) = self.points[first];
				let child = self.child(cell, fx, fy);
				self.cells[child].points = resident;
			}
			cell = self.child(cell, x, y);
			depth += 1;
		}
	}

	/// Child cell of `cell` containing `(x, y)`, created on demand.
	fn child(&mut self, cell: usize, x: f64, y: f64) -> usize {
		let q = self.cells[cell].quadrant(x, y);
		if let Some(existing) = self.cells[cell].children[q] {
			return existing;
		}
		let (x0, y0, x1, y1) = self.cells[cell].child_bounds(q);
		let idx = self.cells.len();
		self.cells.push(Cell::new(x0, y0, x1, y1));
		self.cells[cell].children[q] = Some(idx);
		idx
	}

	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	pub fn point(&self, i: usize) -> (f64, f64) {
		self.points[i]
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	/// Per-cell total strength and centroid weighted by `|strength|`.
	pub fn masses(&self, strengths: &[f64]) -> Vec<Mass> {
		let mut masses = vec![Mass::default(); self.cells.len()];
		for (idx, cell) in self.cells.iter().enumerate().rev() {
			let (mut total, mut weight, mut sx, mut sy) = (0.0, 0.0, 0.0, 0.0);
			let mut add = |strength: f64, x: f64, y: f64, w: f64| {
				total += strength;
				weight += w;
				sx += x * w;
				sy += y * w;
			};
			for &p in &cell.points {
				let (x, y) = self.points[p];
				let s = strengths.get(p).copied().unwrap_or(0.0);
				add(s, x, y, s.abs());
			}
			for &child in cell.children.iter().flatten() {
				let m = masses[child];
				add(m.strength, m.x, m.y, m.strength.abs());
			}
			masses[idx] = if weight > 0.0 {
				Mass {
					strength: total,
					x: sx / weight,
					y: sy / weight,
				}
			} else {
				Mass {
					strength: total,
					x: (cell.x0 + cell.x1) / 2.0,
					y: (cell.y0 + cell.y1) / 2.0,
				}
			};
		}
		masses
	}

	/// Largest radius found anywhere under each cell.
	pub fn max_radii(&self, radii: &[f64]) -> Vec<f64> {
		let mut out = vec![0.0f64; self.cells.len()];
		for (idx, cell) in self.cells.iter().enumerate().rev() {
			let own = cell
				.points
				.iter()
				.map(|&p| radii.get(p).copied().unwrap_or(0.0))
				.fold(0.0, f64::max);
			let deepest = cell
				.children
				.iter()
				.flatten()
				.map(|&c| out[c])
				.fold(own, f64::max);
			out[idx] = deepest;
		}
		out
	}

	/// Pre-order traversal; return `true` from `f` to skip a cell's children.
	pub fn visit(&self, mut f: impl FnMut(usize, &Cell) -> bool) {
		if self.cells.is_empty() {
			return;
		}
		let mut stack = vec![0];
		while let Some(idx) = stack.pop() {
			let cell = &self.cells[idx];
			if f(idx, cell) {
				continue;
			}
			stack.extend(cell.children.iter().rev().flatten());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn leaf_points(tree: &Quadtree) -> Vec<usize> {
		let mut seen = Vec::new();
		tree.visit(|_, cell| {
			seen.extend(&cell.points);
			false
		});
		seen.sort_unstable();
		seen
	}

	#[test]
	fn every_point_lands_in_one_leaf() {
		let points: Vec<(f64, f64)> = (0..50)
			.map(|i| ((i * 37 % 101) as f64, (i * 53 % 97) as f64))
			.collect();
		let tree = Quadtree::build(&points);
		assert_eq!(leaf_points(&tree), (0..50).collect::<Vec<_>>());
		for cell in tree.cells() {
			assert!(cell.is_leaf() || cell.points.is_empty());
			for &p in &cell.points {
				let (x, y) = points[p];
				assert!(x >= cell.x0 && x <= cell.x1 && y >= cell.y0 && y <= cell.y1);
			}
		}
	}

	#[test]
	fn coincident_points_share_a_leaf() {
		let tree = Quadtree::build(&[(5.0, 5.0), (5.0, 5.0), (9.0, 1.0)]);
		let shared = tree
			.cells()
			.iter()
			.find(|c| c.points.len() == 2)
			.expect("coincident leaf");
		assert_eq!(shared.points, vec![0, 1]);
	}

	#[test]
	fn masses_aggregate_to_the_root() {
		let tree = Quadtree::build(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
		let masses = tree.masses(&[-1.0, -1.0, -1.0, -1.0]);
		let root = masses[0];
		assert_eq!(root.strength, -4.0);
		assert!((root.x - 5.0).abs() < 1e-9);
		assert!((root.y - 5.0).abs() < 1e-9);
	}

	#[test]
	fn max_radii_bubble_up() {
		let tree = Quadtree::build(&[(0.0, 0.0), (100.0, 100.0)]);
		let radii = tree.max_radii(&[3.0, 7.0]);
		assert_eq!(radii[0], 7.0);
	}

	#[test]
	fn empty_and_non_finite_inputs() {
		assert!(Quadtree::build(&[]).is_empty());
		let tree = Quadtree::build(&[(f64::NAN, 0.0), (1.0, 1.0)]);
		assert_eq!(leaf_points(&tree), vec![1]);
	}
}
