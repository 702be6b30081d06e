//! Zoom-dependent scaling of graph visuals.
//!
//! Node radii and link widths live in world space and grow with zoom like the
//! layout itself. Strokes, label fonts and hit slop are specified in screen
//! pixels and converted here once per frame.
//!
//! # Scaling Behaviors
//!
//! - [`ScaleBehavior::World`]: scales with zoom.
//! - [`ScaleBehavior::Screen`]: constant pixel size, divided by `k` to undo the
//!   canvas transform.
//! - [`ScaleBehavior::Clamped`]: world-space scaling bounded in screen pixels.

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	World,
	Screen,
	/// `(min_screen, max_screen)` in pixels.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Opacity multiplier as a function of zoom.
#[derive(Clone, Debug)]
pub enum AlphaBehavior {
	Constant,
	/// Zero at `zero_alpha_k`, full at `full_alpha_k`.
	Fade {
		zero_alpha_k: f64,
		full_alpha_k: f64,
	},
}

impl AlphaBehavior {
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::Constant => 1.0,
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				((k - zero_alpha_k) / (full_alpha_k - zero_alpha_k)).clamp(0.0, 1.0)
			}
		}
	}
}

/// Complete scale configuration.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Weighted link width range in world units, mapped from the weight extent.
	pub link_width_range: [f64; 2],
	pub link_width_behavior: ScaleBehavior,
	/// Category link width in world units.
	pub category_link_width: f64,
	/// Node border width behavior (base comes from the theme).
	pub border_behavior: ScaleBehavior,
	/// Label font size in screen pixels.
	pub label_size: f64,
	pub label_min_k: f64,
	pub label_alpha: AlphaBehavior,
	/// Gap between a node and its label, world units.
	pub label_offset: f64,
	/// Extra pick radius in screen pixels.
	pub hit_slop: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			link_width_range: [1.0, 8.0],
			link_width_behavior: ScaleBehavior::Clamped {
				min_screen: 0.5,
				max_screen: f64::INFINITY,
			},
			category_link_width: 1.5,
			border_behavior: ScaleBehavior::World,
			label_size: 10.0,
			label_min_k: 0.5,
			label_alpha: AlphaBehavior::Fade {
				zero_alpha_k: 0.3,
				full_alpha_k: 0.6,
			},
			label_offset: 15.0,
			hit_slop: 2.0,
		}
	}
}

/// Pre-computed scale values for a specific zoom level.
///
/// Create once per frame; sizes are world-space, ready for use under the
/// canvas transform.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	pub k: f64,
	/// e.g. `"bold 10px sans-serif"`.
	pub label_font: String,
	pub label_alpha: f64,
	pub hit_slop: f64,
	link_width_range: [f64; 2],
	link_width_behavior: ScaleBehavior,
	border_behavior: ScaleBehavior,
}

impl ScaledValues {
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let label_font_size = config.label_size / k.max(config.label_min_k);
		Self {
			k,
			label_font: format!("bold {label_font_size}px sans-serif"),
			label_alpha: config.label_alpha.apply(k),
			hit_slop: config.hit_slop / k,
			link_width_range: config.link_width_range,
			link_width_behavior: config.link_width_behavior.clone(),
			border_behavior: config.border_behavior.clone(),
		}
	}

	/// Link width for `weight`, linear over the surviving weight extent.
	///
	/// A degenerate extent (one link, or all weights equal) maps to the middle
	/// of the range.
	pub fn link_width(&self, weight: f64, extent: Option<(f64, f64)>) -> f64 {
		let [lo, hi] = self.link_width_range;
		let t = match extent {
			Some((min, max)) if max > min => ((weight - min) / (max - min)).clamp(0.0, 1.0),
			_ => 0.5,
		};
		self.link_width_behavior.apply(lo + t * (hi - lo), self.k)
	}

	pub fn border_width(&self, base: f64) -> f64 {
		self.border_behavior.apply(base, self.k)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn link_width_spans_the_range() {
		let scaled = ScaledValues::new(&ScaleConfig::default(), 1.0);
		let extent = Some((0.65, 0.95));
		assert_eq!(scaled.link_width(0.65, extent), 1.0);
		assert_eq!(scaled.link_width(0.95, extent), 8.0);
	}

	#[test]
	fn equal_weights_get_the_middle_width() {
		let scaled = ScaledValues::new(&ScaleConfig::default(), 1.0);
		assert_eq!(scaled.link_width(0.8, Some((0.8, 0.8))), 4.5);
		assert_eq!(scaled.link_width(0.8, None), 4.5);
	}

	#[test]
	fn thin_links_stay_visible_when_zoomed_out() {
		let scaled = ScaledValues::new(&ScaleConfig::default(), 0.1);
		assert!((scaled.link_width(0.65, Some((0.65, 0.95))) - 5.0).abs() < 1e-9);
	}

	#[test]
	fn labels_fade_out_at_low_zoom() {
		let config = ScaleConfig::default();
		assert_eq!(ScaledValues::new(&config, 0.2).label_alpha, 0.0);
		assert_eq!(ScaledValues::new(&config, 1.0).label_alpha, 1.0);
	}
}
