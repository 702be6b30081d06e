//! Force-directed collaboration network.
//!
//! The renderer-independent core is a graph model built from raw records
//! ([`model`]), a force layout engine ([`simulation`]) advanced one tick at a
//! time, and an interaction controller ([`interaction`]) that turns drags,
//! category focus and hover into queued simulation intents. The canvas
//! component on top draws the current positions every animation frame.
//!
//! # Example
//!
//! ```ignore
//! use faculty_network::{Dataset, ForceGraphCanvas, GraphConfig};
//!
//! let data = Signal::derive(move || dataset.clone());
//! view! { <ForceGraphCanvas data=data config=GraphConfig::default() fullscreen=true /> }
//! ```

mod component;
pub mod config;
pub mod forces;
mod images;
pub mod interaction;
pub mod model;
pub mod overlay;
mod quadtree;
mod render;
pub mod scale;
pub mod simulation;
mod state;
pub mod theme;
pub mod types;

pub use component::ForceGraphCanvas;
pub use config::{Endpoints, GraphConfig};
pub use interaction::{CategorySelection, InteractionController};
pub use model::GraphModel;
pub use simulation::{ForceSimulation, Intent, Phase, TickEvent};
pub use theme::Theme;
pub use types::{Dataset, NodeId, parse_records};
