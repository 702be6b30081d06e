//! faculty-network: interactive collaboration network of faculty members.
//!
//! This crate provides a WASM-based visualization that fetches people and
//! their weighted similarity links, lays them out with a force simulation and
//! renders them on a canvas with drag, pan/zoom, hover and department focus.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, error, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod error;
pub mod loader;

pub use components::force_graph::{
	Dataset, Endpoints, ForceGraphCanvas, ForceSimulation, GraphConfig, GraphModel,
	InteractionController, Theme,
};
pub use error::{LoadError, RecordError};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("faculty-network: logging initialized");
}

/// Read overrides from a script element with id="graph-config".
/// Expected format: a JSON object with any subset of [`GraphConfig`] fields.
fn load_config() -> GraphConfig {
	let text = (|| {
		let window: Window = web_sys::window()?;
		let element = window.document()?.get_element_by_id("graph-config")?;
		let script: HtmlScriptElement = element.dyn_into().ok()?;
		script.text().ok()
	})();
	let Some(json) = text else {
		return GraphConfig::default();
	};

	match GraphConfig::from_json(&json) {
		Ok(config) => {
			info!("faculty-network: loaded config overrides");
			config
		}
		Err(e) => {
			warn!("faculty-network: ignoring malformed graph-config: {}", e);
			GraphConfig::default()
		}
	}
}

/// Progress of the dataset fetch, apart from the dataset itself.
///
/// The last good dataset lives in its own signal and is only replaced by a
/// successful load, so a failed reload keeps the current graph on screen.
#[derive(Clone, Debug, Default, PartialEq)]
struct LoadStatus {
	loading: bool,
	error: Option<String>,
}

impl LoadStatus {
	fn begin(&mut self) {
		self.loading = true;
	}

	/// Record a finished fetch; returns the dataset to publish, if any.
	fn settle(&mut self, outcome: Result<Dataset, LoadError>) -> Option<Dataset> {
		self.loading = false;
		match outcome {
			Ok(dataset) => {
				self.error = None;
				Some(dataset)
			}
			Err(e) => {
				error!("faculty-network: error loading network data: {}", e);
				self.error = Some(e.to_string());
				None
			}
		}
	}
}

/// Fetch the dataset in the background and publish the outcome.
fn start_load(
	endpoints: Endpoints,
	status: RwSignal<LoadStatus>,
	dataset: RwSignal<Option<Dataset>>,
) {
	if status.with_untracked(|s| s.loading) {
		return;
	}
	status.update(LoadStatus::begin);
	wasm_bindgen_futures::spawn_local(async move {
		let outcome = loader::load_dataset(&endpoints).await;
		let mut published = None;
		status.update(|s| published = s.settle(outcome));
		if let Some(data) = published {
			dataset.set(Some(data));
		}
	});
}

/// Main application component.
/// Fetches the network and renders the force-directed visualization.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();
	let status = RwSignal::new(LoadStatus::default());
	let dataset = RwSignal::new(None::<Dataset>);
	start_load(config.endpoints.clone(), status, dataset);

	let endpoints = config.endpoints.clone();
	let on_reload = move |_| start_load(endpoints.clone(), status, dataset);
	let error_style = format!(
		"color: {}; font-size: 18px; text-align: center;",
		Theme::by_name(&config.theme).error_color.to_css()
	);
	let data = Signal::derive(move || dataset.get().unwrap_or_default());

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Faculty Collaboration Network" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<Show when=move || dataset.with(Option::is_some)>
				<ForceGraphCanvas data=data config=config.clone() fullscreen=true />
			</Show>
			<Show when=move || status.with(|s| s.loading)>
				<p class="graph-status">"Loading network..."</p>
			</Show>
			{move || {
				status
					.with(|s| s.error.clone())
					.map(|reason| {
						view! {
							<p class="graph-error" style=error_style.clone()>
								"Error loading network data"
								<br />
								<small>{reason}</small>
							</p>
						}
					})
			}}
			<div class="graph-overlay">
				<h1>"Faculty Collaboration Network"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Scroll to zoom. Drag background to pan."
				</p>
				<button
					class="reload"
					on:click=on_reload
					prop:disabled=move || status.with(|s| s.loading)
				>
					"Reload"
				</button>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::RawNode;

	fn one_node() -> Dataset {
		Dataset {
			nodes: vec![RawNode {
				id: 1,
				category: "Physics".into(),
				importance: 10.0,
				attributes: Default::default(),
			}],
			..Dataset::default()
		}
	}

	#[test]
	fn failed_reload_keeps_the_last_dataset() {
		let mut current = None;
		let mut status = LoadStatus::default();

		status.begin();
		assert!(status.loading);
		if let Some(data) = status.settle(Ok(one_node())) {
			current = Some(data);
		}
		assert_eq!(status, LoadStatus::default());

		status.begin();
		let failure = LoadError::Status {
			url: "/api/faculty_nodes".into(),
			status: 503,
		};
		assert!(status.settle(Err(failure)).is_none());
		assert!(!status.loading);
		assert!(status.error.as_deref().is_some_and(|e| e.contains("503")));
		assert_eq!(current.map(|d| d.nodes.len()), Some(1));
	}

	#[test]
	fn successful_reload_clears_the_error() {
		let mut status = LoadStatus {
			loading: true,
			error: Some("timeout".into()),
		};
		assert!(status.settle(Ok(one_node())).is_some());
		assert_eq!(status.error, None);
	}
}
