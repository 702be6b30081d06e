//! Leptos component wrapping the network canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel event
//! handlers for node dragging, panning, zooming and hover. An animation loop
//! runs via `requestAnimationFrame`, advancing the layout and redrawing each
//! frame that changed until the component is unmounted. The category filter,
//! tooltip, legend and reading key are plain DOM laid over the canvas.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::images::NodeImages;
use super::interaction::ALL_CATEGORIES;
use super::overlay::{LegendEntry, READING_KEY, Tooltip};
use super::render;
use super::scale::ScaleConfig;
use super::state::ForceGraphState;
use super::theme::Theme;
use super::types::Dataset;

/// Frame step in seconds when no previous frame time is known.
const FRAME_DT: f64 = 0.016;
/// Longest step fed to timers, so a backgrounded tab does not jump.
const MAX_FRAME_DT: f64 = 0.1;

/// Bundles graph state with its visual configuration.
struct GraphContext {
	state: ForceGraphState,
	images: NodeImages,
	scale: ScaleConfig,
	theme: Theme,
}

/// Work deferred until the animation loop sees the component is gone.
#[derive(Default)]
struct Teardown {
	steps: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Teardown {
	fn defer(&self, step: impl FnOnce() + 'static) {
		self.steps.borrow_mut().push(Box::new(step));
	}

	/// Run every deferred step once; `false` when nothing was left.
	fn run(&self) -> bool {
		let steps = std::mem::take(&mut *self.steps.borrow_mut());
		let ran = !steps.is_empty();
		for step in steps {
			step();
		}
		ran
	}
}

/// Tooltip content plus its page position.
#[derive(Clone, Debug, PartialEq)]
struct TooltipView {
	tip: Tooltip,
	left: f64,
	top: f64,
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Categories in order of first appearance, as offered by the filter.
fn filter_options(state: &ForceGraphState) -> Vec<String> {
	let mut seen = Vec::new();
	for node in &state.graph.nodes {
		if !seen.contains(&node.category) {
			seen.push(node.category.clone());
		}
	}
	seen
}

/// Renders the interactive collaboration network on a canvas element.
///
/// Each new value of `data` rebuilds the graph and reseeds the layout. The
/// component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and follow window resizes.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<Dataset>,
	#[prop(optional)] config: GraphConfig,
	#[prop(optional)] theme: Option<Theme>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let teardown = Rc::new(Teardown::default());
	let stopped = Arc::new(AtomicBool::new(false));
	let theme = theme.unwrap_or_else(|| Theme::by_name(&config.theme));

	let categories = RwSignal::new(Vec::<String>::new());
	let legend = RwSignal::new(Vec::<LegendEntry>::new());
	let tooltip = RwSignal::new(None::<TooltipView>);
	let selected = RwSignal::new(ALL_CATEGORIES.to_owned());
	let shown = RwSignal::new((0usize, 0usize));

	{
		let stopped = stopped.clone();
		on_cleanup(move || {
			debug!("graph: component unmounted, stopping animation");
			stopped.store(true, Ordering::Relaxed);
		});
	}

	let (context_init, animate_init, resize_cb_init, teardown_init) = (
		context.clone(),
		animate.clone(),
		resize_cb.clone(),
		teardown.clone(),
	);
	Effect::new(move |_| {
		let dataset = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("graph: 2d canvas context unavailable");
				return;
			}
		};

		// Reload replaces everything: model, layout, filter and view.
		let state = ForceGraphState::new(dataset, config.clone(), w, h, &theme);
		categories.set(filter_options(&state));
		legend.set(state.legend());
		shown.set((state.visible_count(), state.graph.nodes.len()));
		tooltip.set(None);
		selected.set(ALL_CATEGORIES.to_owned());
		let images = NodeImages::load(&state.graph);
		*context_init.borrow_mut() = Some(GraphContext {
			state,
			images,
			scale: ScaleConfig::default(),
			theme: theme.clone(),
		});

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.state.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			// Keeps the closure alive until the listener is gone.
			let resize_cb = resize_cb_init.clone();
			teardown_init.defer(move || {
				if let (Some(cb), Some(win)) = (resize_cb.borrow_mut().take(), web_sys::window()) {
					let _ =
						win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
					debug!("graph: resize listener removed");
				}
			});
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let (context_anim, animate_inner, teardown, stopped) = (
			context_init.clone(),
			animate_init.clone(),
			teardown_init.clone(),
			stopped.clone(),
		);
		let mut last_frame: Option<f64> = None;
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if stopped.load(Ordering::Relaxed) {
				teardown.run();
				if let Some(mut c) = context_anim.borrow_mut().take() {
					c.state.sim.stop();
				}
				return;
			}
			let now = js_sys::Date::now();
			let dt = last_frame
				.map(|last| ((now - last) / 1000.0).clamp(0.0, MAX_FRAME_DT))
				.unwrap_or(FRAME_DT);
			last_frame = Some(now);
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				if c.state.tick(dt) | c.images.poll() {
					render::render(&c.state, &c.images, &ctx, &c.scale, &c.theme);
				}
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);
		if let Some(ref mut c) = *context_md.borrow_mut() {
			let hit = c.state.node_at_position(x, y, &c.scale);
			if !hit.is_some_and(|idx| c.state.begin_drag(idx, x, y)) {
				c.state.begin_pan(x, y);
			}
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			if c.state.is_dragging() {
				c.state.drag_to(x, y);
			} else if c.state.is_panning() {
				c.state.pan_to(x, y);
			} else {
				let hovered = c.state.node_at_position(x, y, &c.scale);
				c.state.set_hover(hovered);
			}
			let view = c.state.tooltip().map(|tip| TooltipView {
				tip,
				left: ev.page_x() as f64 + 10.0,
				top: ev.page_y() as f64 + 10.0,
			});
			if tooltip.get_untracked() != view {
				tooltip.set(view);
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			c.state.end_drag();
			c.state.end_pan();
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.state.end_drag();
			c.state.end_pan();
			c.state.set_hover(None);
		}
		tooltip.set(None);
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			c.state.zoom_at(x, y, factor);
		}
	};

	let context_sel = context.clone();
	let on_filter = move |ev: leptos::ev::Event| {
		let value = event_target_value(&ev);
		if let Some(ref mut c) = *context_sel.borrow_mut() {
			c.state.select_category(&value);
			shown.set((c.state.visible_count(), c.state.graph.nodes.len()));
		}
		selected.set(value);
		tooltip.set(None);
	};

	let context_reset = context.clone();
	let on_reset = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_reset.borrow_mut() {
			c.state.reset_view();
		}
	};

	view! {
		<div class="force-graph">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="graph-controls">
				<label for="category-filter">"Filter by department"</label>
				<select id="category-filter" on:change=on_filter prop:value=move || selected.get()>
					<option value=ALL_CATEGORIES>"All"</option>
					{move || {
						categories
							.get()
							.into_iter()
							.map(|c| {
								let value = c.clone();
								view! { <option value=value>{c}</option> }
							})
							.collect_view()
					}}
				</select>
				<button class="reset-view" on:click=on_reset>"Center"</button>
				<span class="graph-count">
					{move || {
						let (visible, total) = shown.get();
						format!("Showing {visible} of {total}")
					}}
				</span>
			</div>
			<div class="graph-key">
				<h3>"How to read"</h3>
				<ul>{READING_KEY.iter().map(|line| view! { <li>{*line}</li> }).collect_view()}</ul>
			</div>
			<div class="graph-legend">
				<h3>"Departments"</h3>
				<ul>
					{move || {
						legend
							.get()
							.into_iter()
							.map(|entry| {
								let swatch = format!("border-color: {};", entry.color.to_css());
								view! {
									<li title=entry.category>
										<span class="swatch" style=swatch></span>
										{entry.label}
									</li>
								}
							})
							.collect_view()
					}}
				</ul>
			</div>
			{move || {
				tooltip
					.get()
					.map(|TooltipView { tip, left, top }| {
						let style = format!(
							"position: absolute; left: {left}px; top: {top}px; max-width: 300px;"
						);
						view! {
							<div class="graph-tooltip" style=style>
								<strong>{tip.name}</strong>
								<br />
								"Department: "{tip.category}
								<br />
								"Email: "{tip.email.unwrap_or_default()}
								<br />
								"Citations: "{tip.importance}
								<br />
								"Connections: "{tip.connections}
								<br />
								"Research areas: "{tip.research_areas.unwrap_or_default()}
							</div>
						}
					})
			}}
		</div>
	}
}
