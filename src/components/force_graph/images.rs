//! Node photos, loaded once per graph and drawn clipped to the node circle.
//!
//! A node whose record names no photo, or whose photo fails to load, keeps
//! its category fill.

use log::debug;
use web_sys::HtmlImageElement;

use super::model::GraphModel;
use super::overlay::image_url;

/// Source square `(sx, sy, side)` that fills a circle without distortion,
/// centered on the image.
pub fn cover_crop(width: f64, height: f64) -> (f64, f64, f64) {
	let side = width.min(height);
	((width - side) / 2.0, (height - side) / 2.0, side)
}

/// One optional photo per node index.
#[derive(Default)]
pub struct NodeImages {
	images: Vec<Option<HtmlImageElement>>,
	shown: Vec<bool>,
}

impl NodeImages {
	/// Start loading the photo of every node that has one.
	pub fn load(graph: &GraphModel) -> Self {
		let images: Vec<Option<HtmlImageElement>> = graph
			.nodes
			.iter()
			.map(|node| {
				let url = image_url(node)?;
				let img = HtmlImageElement::new().ok()?;
				img.set_src(url);
				Some(img)
			})
			.collect();
		debug!(
			"images: loading {} node photos",
			images.iter().flatten().count()
		);
		let shown = vec![false; images.len()];
		Self { images, shown }
	}

	/// The photo for `idx` once it has loaded. A broken image never is.
	pub fn ready(&self, idx: usize) -> Option<&HtmlImageElement> {
		self.images
			.get(idx)?
			.as_ref()
			.filter(|img| img.complete() && img.natural_width() > 0)
	}

	/// `true` when some photo finished loading since the last call.
	pub fn poll(&mut self) -> bool {
		let mut changed = false;
		for idx in 0..self.images.len() {
			if !self.shown[idx] && self.ready(idx).is_some() {
				self.shown[idx] = true;
				changed = true;
			}
		}
		changed
	}
}
