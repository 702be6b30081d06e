//! Dataset fetch over the browser `fetch` API.
//!
//! Nodes and edges are required; the category-edge collection is optional
//! and any failure there is logged and treated as "none available".

use log::{info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::components::force_graph::{Dataset, Endpoints, parse_records};
use crate::error::LoadError;

fn network(url: &str, reason: impl std::fmt::Debug) -> LoadError {
	LoadError::Network {
		url: url.to_owned(),
		reason: format!("{reason:?}"),
	}
}

/// Issue the request now; the returned future resolves to the response.
fn start(url: &str) -> Result<JsFuture, LoadError> {
	let opts = RequestInit::new();
	opts.set_method("GET");
	opts.set_mode(RequestMode::SameOrigin);

	let request = Request::new_with_str_and_init(url, &opts).map_err(|e| network(url, e))?;
	let window = web_sys::window().ok_or_else(|| network(url, "no window"))?;
	Ok(JsFuture::from(window.fetch_with_request(&request)))
}

/// Wait for a started request and read its body as text.
async fn finish(url: &str, pending: JsFuture) -> Result<String, LoadError> {
	let value = pending.await.map_err(|e| network(url, e))?;
	let resp: Response = value
		.dyn_into()
		.map_err(|_| network(url, "response is not a Response"))?;
	if !resp.ok() {
		return Err(LoadError::Status {
			url: url.to_owned(),
			status: resp.status(),
		});
	}
	let text = JsFuture::from(resp.text().map_err(|e| network(url, e))?)
		.await
		.map_err(|e| network(url, e))?;
	text.as_string()
		.ok_or_else(|| network(url, "body is not text"))
}

/// Parse one collection, logging every rejected record.
fn collect<T: DeserializeOwned>(body: &str, kind: &'static str) -> Result<Vec<T>, LoadError> {
	let parsed = parse_records::<T>(body, kind)?;
	for rejected in &parsed.rejected {
		warn!("loader: {rejected}");
	}
	Ok(parsed.records)
}

/// Fetch all collections. Nothing is returned unless both nodes and edges
/// arrived and parsed.
pub async fn load_dataset(endpoints: &Endpoints) -> Result<Dataset, LoadError> {
	let nodes_req = start(&endpoints.nodes)?;
	let edges_req = start(&endpoints.edges)?;
	let category_req = endpoints
		.category_edges
		.as_deref()
		.map(|url| (url, start(url)));

	let nodes = collect(&finish(&endpoints.nodes, nodes_req).await?, "node")?;
	let edges = collect(&finish(&endpoints.edges, edges_req).await?, "edge")?;

	let category_edges = match category_req {
		None => None,
		Some((url, pending)) => {
			let body = match pending {
				Ok(pending) => finish(url, pending).await,
				Err(e) => Err(e),
			};
			match body.and_then(|b| collect(&b, "category edge")) {
				Ok(records) => Some(records),
				Err(e) => {
					warn!("loader: category edges unavailable: {e}");
					None
				}
			}
		}
	};

	info!(
		"loader: {} nodes, {} edges, {} category edges",
		nodes.len(),
		edges.len(),
		category_edges.as_ref().map_or(0, Vec::len)
	);
	Ok(Dataset {
		nodes,
		edges,
		category_edges,
	})
}
