//! Canvas rendering for the network view.
//!
//! Rendering uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Category links, then weighted links (world space)
//! 3. Dimmed nodes, then highlighted nodes on top, photos clipped to circles
//! 4. Labels
//!
//! Hidden nodes and links whose endpoints are hidden are skipped entirely.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::forces::Body;
use super::images::{NodeImages, cover_crop};
use super::overlay::node_label;
use super::scale::{ScaleConfig, ScaledValues};
use super::state::ForceGraphState;
use super::theme::{LinkStyle, Theme};

/// Ease a 0..1 transition.
fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// How much dimmed nodes lose when something is hovered.
const NODE_DIM: f64 = 0.25;

/// Renders the complete graph to the canvas.
pub fn render(
	state: &ForceGraphState,
	images: &NodeImages,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	theme: &Theme,
) {
	let transform = state.interaction.transform;
	let scale = ScaledValues::new(config, transform.k);

	draw_background(state, ctx, theme);

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	draw_category_links(state, ctx, config, &scale, theme);
	draw_links(state, ctx, &scale, theme);
	draw_nodes(state, images, ctx, &scale, theme);
	draw_labels(state, ctx, config, &scale, theme);

	ctx.restore();
}

fn draw_background(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let (cx, cy) = (state.width / 2.0, state.height / 2.0);
	let gradient = theme
		.background
		.use_gradient
		.then(|| {
			ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, state.width.max(state.height) * 0.8)
				.ok()
		})
		.flatten();

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&theme.background.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
}

/// Link emphasis: how strongly the link touches the hovered node.
fn link_emphasis(state: &ForceGraphState, source: usize, target: usize) -> f64 {
	let h = &state.highlight;
	smooth_step(h.hover_ring_intensity(source).max(h.hover_ring_intensity(target)))
}

/// Stroke color for a link given its emphasis and the global dimming.
fn link_stroke(style: &LinkStyle, emphasis: f64, dim: f64) -> String {
	let base = style.opacity + (style.dimmed_opacity - style.opacity) * dim;
	let opacity = base + (style.highlight_opacity - base) * emphasis;
	style
		.color
		.lerp(style.highlight_color, emphasis)
		.with_alpha(opacity)
		.to_css()
}

fn stroke_segment(ctx: &CanvasRenderingContext2d, a: &Body, b: &Body) {
	ctx.begin_path();
	ctx.move_to(a.x, a.y);
	ctx.line_to(b.x, b.y);
	ctx.stroke();
}

fn draw_category_links(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let bodies = state.sim.bodies();
	let dim = smooth_step(state.highlight.max_intensity());
	let highlight = state.interaction.highlight();
	let hover = highlight
		.node
		.map_or(0.0, |i| smooth_step(state.highlight.hover_ring_intensity(i)));
	ctx.set_line_width(config.link_width_behavior.apply(config.category_link_width, scale.k));

	for (i, link) in state.graph.category_links.iter().enumerate() {
		if !state.interaction.is_edge_visible(link.source, link.target) {
			continue;
		}
		let (Some(a), Some(b)) = (bodies.get(link.source), bodies.get(link.target)) else {
			continue;
		};
		let emphasis = if highlight.category_links.contains(&i) {
			hover
		} else {
			0.0
		};
		ctx.set_stroke_style_str(&link_stroke(&theme.category_link, emphasis, dim));
		stroke_segment(ctx, a, b);
	}
}

fn draw_links(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let bodies = state.sim.bodies();
	let dim = smooth_step(state.highlight.max_intensity());
	let extent = state.graph.weight_extent();

	// Emphasized links last so they sit on top.
	let mut order: Vec<(usize, f64)> = state
		.graph
		.links
		.iter()
		.enumerate()
		.filter(|(_, l)| state.interaction.is_edge_visible(l.source, l.target))
		.map(|(i, l)| (i, link_emphasis(state, l.source, l.target)))
		.collect();
	order.sort_by(|a, b| a.1.total_cmp(&b.1));

	for (i, emphasis) in order {
		let link = &state.graph.links[i];
		let (Some(a), Some(b)) = (bodies.get(link.source), bodies.get(link.target)) else {
			continue;
		};
		ctx.set_stroke_style_str(&link_stroke(&theme.link, emphasis, dim));
		ctx.set_line_width(scale.link_width(link.weight, extent));
		stroke_segment(ctx, a, b);
	}
}

fn draw_nodes(
	state: &ForceGraphState,
	images: &NodeImages,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let dim = smooth_step(state.highlight.max_intensity());
	let visible = |i: &usize| state.interaction.is_node_visible(*i);

	// Pass 1: nodes outside the highlight
	for i in (0..state.graph.nodes.len()).filter(visible) {
		if state.highlight.node_intensity(i) > 0.001 {
			continue;
		}
		draw_node(state, images, ctx, scale, theme, i, 1.0 - NODE_DIM * dim);
	}

	// Pass 2: highlighted and transitioning nodes on top
	for i in (0..state.graph.nodes.len()).filter(visible) {
		let t = smooth_step(state.highlight.node_intensity(i));
		if t <= 0.001 {
			continue;
		}
		let dimmed = 1.0 - NODE_DIM * dim;
		draw_node(state, images, ctx, scale, theme, i, dimmed + (1.0 - dimmed) * t);
	}
}

fn draw_node(
	state: &ForceGraphState,
	images: &NodeImages,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	idx: usize,
	alpha: f64,
) {
	let (Some(node), Some(body)) = (state.graph.nodes.get(idx), state.sim.body(idx)) else {
		return;
	};
	let base = state.colors.get(&node.category);
	let ring_t = smooth_step(state.highlight.hover_ring_intensity(idx));
	let style = &theme.node;

	ctx.set_global_alpha(alpha);

	ctx.begin_path();
	let _ = ctx.arc(body.x, body.y, body.radius, 0.0, 2.0 * PI);
	match images.ready(idx) {
		Some(img) => {
			let (sx, sy, side) =
				cover_crop(f64::from(img.natural_width()), f64::from(img.natural_height()));
			let r = body.radius;
			ctx.save();
			ctx.clip();
			let _ = ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
				img,
				sx,
				sy,
				side,
				side,
				body.x - r,
				body.y - r,
				2.0 * r,
				2.0 * r,
			);
			// The path survives restore, so the border below still follows it.
			ctx.restore();
		}
		None => {
			ctx.set_fill_style_str(&base.lighten(style.fill_lightness).to_css());
			ctx.fill();
		}
	}

	let border = style.border_width + (style.hover_border_width - style.border_width) * ring_t;
	ctx.set_stroke_style_str(&base.lerp(style.hover_color, ring_t).to_css());
	ctx.set_line_width(scale.border_width(border));
	ctx.stroke();

	ctx.set_global_alpha(1.0);
}

fn draw_labels(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	scale: &ScaledValues,
	theme: &Theme,
) {
	if scale.label_alpha < 0.01 {
		return;
	}
	ctx.set_font(&scale.label_font);
	ctx.set_text_align("center");
	ctx.set_fill_style_str(
		&theme
			.node
			.label_color
			.with_alpha(scale.label_alpha)
			.to_css(),
	);

	for (i, node) in state.graph.nodes.iter().enumerate() {
		if !state.interaction.is_node_visible(i) {
			continue;
		}
		let (Some(label), Some(body)) = (
			node_label(node, state.config.label_min_importance),
			state.sim.body(i),
		) else {
			continue;
		};
		let _ = ctx.fill_text(&label, body.x, body.y + body.radius + config.label_offset);
	}
}
