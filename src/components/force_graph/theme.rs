//! Visual theming for the network view.
//!
//! Colors for the two link layers, the highlight accents and the ordinal
//! category palette used for node borders and the legend.

use std::collections::HashMap;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		let up = |c: u8| (c as f64 + (255.0 - c as f64) * f) as u8;
		Self {
			r: up(self.r),
			g: up(self.g),
			b: up(self.b),
			a: self.a,
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t) as u8;
		Self {
			r: mix(self.r, other.r),
			g: mix(self.g, other.g),
			b: mix(self.b, other.b),
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Ten strong hues.
const CATEGORY10: [Color; 10] = [
	Color::rgb(31, 119, 180),
	Color::rgb(255, 127, 14),
	Color::rgb(44, 160, 44),
	Color::rgb(214, 39, 40),
	Color::rgb(148, 103, 189),
	Color::rgb(140, 86, 75),
	Color::rgb(227, 119, 194),
	Color::rgb(127, 127, 127),
	Color::rgb(188, 189, 34),
	Color::rgb(23, 190, 207),
];

/// Twelve pastels.
const SET3: [Color; 12] = [
	Color::rgb(141, 211, 199),
	Color::rgb(255, 255, 179),
	Color::rgb(190, 186, 218),
	Color::rgb(251, 128, 114),
	Color::rgb(128, 177, 211),
	Color::rgb(253, 180, 98),
	Color::rgb(179, 222, 105),
	Color::rgb(252, 205, 229),
	Color::rgb(217, 217, 217),
	Color::rgb(188, 128, 189),
	Color::rgb(204, 235, 197),
	Color::rgb(255, 237, 111),
];

/// Six light/dark pairs.
const PAIRED: [Color; 12] = [
	Color::rgb(166, 206, 227),
	Color::rgb(31, 120, 180),
	Color::rgb(178, 223, 138),
	Color::rgb(51, 160, 44),
	Color::rgb(251, 154, 153),
	Color::rgb(227, 26, 28),
	Color::rgb(253, 191, 111),
	Color::rgb(255, 127, 0),
	Color::rgb(202, 178, 214),
	Color::rgb(106, 61, 154),
	Color::rgb(255, 255, 153),
	Color::rgb(177, 89, 40),
];

/// Ordinal palette: the n-th distinct category gets the n-th color, wrapping.
#[derive(Clone, Debug)]
pub struct CategoryPalette {
	pub colors: Vec<Color>,
}

impl CategoryPalette {
	/// Thirty-four hues: category10, then set3, then paired.
	pub fn categorical() -> Self {
		Self {
			colors: [CATEGORY10.as_slice(), SET3.as_slice(), PAIRED.as_slice()].concat(),
		}
	}

	pub fn get(&self, index: usize) -> Color {
		if self.colors.is_empty() {
			return Color::rgb(128, 128, 128);
		}
		self.colors[index % self.colors.len()]
	}

	/// Assign colors to categories in order of first appearance.
	pub fn assign<'a>(&self, categories: impl IntoIterator<Item = &'a str>) -> CategoryColors {
		let mut by_name = HashMap::new();
		for category in categories {
			let next = by_name.len();
			by_name.entry(category.to_owned()).or_insert_with(|| self.get(next));
		}
		CategoryColors {
			by_name,
			fallback: Color::rgb(128, 128, 128),
		}
	}
}

/// Category name to color, fixed for the lifetime of one load.
#[derive(Clone, Debug, Default)]
pub struct CategoryColors {
	by_name: HashMap<String, Color>,
	fallback: Color,
}

impl Default for Color {
	fn default() -> Self {
		Self::rgb(128, 128, 128)
	}
}

impl CategoryColors {
	pub fn get(&self, category: &str) -> Color {
		self.by_name.get(category).copied().unwrap_or(self.fallback)
	}
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	pub color: Color,
	/// Secondary color for the radial gradient
	pub color_secondary: Color,
	pub use_gradient: bool,
}

/// Style of one link layer.
#[derive(Clone, Debug)]
pub struct LinkStyle {
	pub color: Color,
	/// Opacity when nothing is hovered.
	pub opacity: f64,
	/// Opacity of links not touching the hovered node.
	pub dimmed_opacity: f64,
	pub highlight_color: Color,
	pub highlight_opacity: f64,
}

/// Node visual style.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// How far the category color is washed toward white for the fill.
	pub fill_lightness: f64,
	/// Border width in screen pixels.
	pub border_width: f64,
	pub hover_border_width: f64,
	pub hover_color: Color,
	pub label_color: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	/// Weighted similarity links.
	pub link: LinkStyle,
	/// Unweighted same-category links.
	pub category_link: LinkStyle,
	pub node: NodeStyle,
	pub error_color: Color,
	pub palette: CategoryPalette,
}

impl Theme {
	/// Light theme: blue similarity links over faint gray category links.
	pub fn light() -> Self {
		Self {
			name: "light",
			background: BackgroundStyle {
				color: Color::rgb(248, 250, 252),
				color_secondary: Color::rgb(255, 255, 255),
				use_gradient: true,
			},
			link: LinkStyle {
				color: Color::rgb(37, 99, 235),
				opacity: 0.6,
				dimmed_opacity: 0.3,
				highlight_color: Color::rgb(255, 107, 107),
				highlight_opacity: 1.0,
			},
			category_link: LinkStyle {
				color: Color::rgb(148, 163, 184),
				opacity: 0.25,
				dimmed_opacity: 0.15,
				highlight_color: Color::rgb(249, 115, 22),
				highlight_opacity: 0.9,
			},
			node: NodeStyle {
				fill_lightness: 0.8,
				border_width: 3.0,
				hover_border_width: 4.0,
				hover_color: Color::rgb(255, 107, 107),
				label_color: Color::rgb(51, 51, 51),
			},
			error_color: Color::rgb(220, 53, 69),
			palette: CategoryPalette::categorical(),
		}
	}

	/// Dark variant for embedding in dark pages.
	pub fn midnight() -> Self {
		let light = Self::light();
		Self {
			name: "midnight",
			background: BackgroundStyle {
				color: Color::rgb(18, 20, 28),
				color_secondary: Color::rgb(25, 28, 38),
				use_gradient: true,
			},
			link: LinkStyle {
				color: Color::rgb(96, 165, 250),
				..light.link
			},
			category_link: LinkStyle {
				color: Color::rgb(100, 116, 139),
				..light.category_link
			},
			node: NodeStyle {
				fill_lightness: 0.15,
				label_color: Color::rgb(226, 232, 240),
				..light.node
			},
			..light
		}
	}

	/// Look a theme up by name, falling back to the light theme.
	pub fn by_name(name: &str) -> Self {
		match name {
			"midnight" => Self::midnight(),
			_ => Self::light(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::light()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn categories_get_colors_in_first_seen_order() {
		let palette = CategoryPalette::categorical();
		let colors = palette.assign(["Math", "Physics", "Math", "Art"]);
		assert_eq!(colors.get("Math"), palette.get(0));
		assert_eq!(colors.get("Physics"), palette.get(1));
		assert_eq!(colors.get("Art"), palette.get(2));
		assert_eq!(colors.get("Music"), Color::rgb(128, 128, 128));
	}

	#[test]
	fn palette_wraps() {
		let palette = CategoryPalette::categorical();
		assert_eq!(palette.colors.len(), 34);
		assert_eq!(palette.get(10), Color::rgb(141, 211, 199));
		assert_eq!(palette.get(22), Color::rgb(166, 206, 227));
		assert_eq!(palette.get(34), palette.get(0));
	}

	#[test]
	fn themes_are_found_by_name() {
		assert_eq!(Theme::by_name("midnight").name, "midnight");
		assert_eq!(Theme::by_name("light").name, "light");
		assert_eq!(Theme::by_name("unknown").name, "light");
	}

	#[test]
	fn css_output() {
		assert_eq!(Color::rgb(37, 99, 235).to_css(), "#2563eb");
		assert_eq!(
			Color::rgb(148, 163, 184).with_alpha(0.25).to_css(),
			"rgba(148, 163, 184, 0.25)"
		);
		assert_eq!(Color::rgb(0, 0, 0).lighten(1.0), Color::rgb(255, 255, 255));
	}
}
