#![forbid(unsafe_code)]

//! `lanewise` lays out BPMN process diagrams: pools stacked on the canvas, lanes stacked inside
//! their pool, and the flow nodes of every lane arranged by a layered (Sugiyama-style) layout.
//!
//! Each lane, lane-less pool and the set of unparented elements is laid out as an independent
//! region with `dugong`; the regions are then sized, stacked and translated into absolute canvas
//! coordinates. The result is a copy of the input graph with `x`/`y`/`width`/`height` filled in
//! on every element and `waypoints` on every flow whose endpoints were laid out together.
//!
//! ```no_run
//! use lanewise::{Graph, LayoutOptions};
//!
//! let graph = Graph::from_json_str(r#"{"elements": [], "flows": []}"#)?;
//! let laid_out = lanewise::apply_layout_sync(&graph, &LayoutOptions::default())?;
//! # Ok::<(), lanewise::Error>(())
//! ```

pub mod classify;
pub mod compose;
mod error;
pub mod geom;
pub mod hierarchy;
mod layout;
pub mod model;
pub mod options;
pub mod process;
pub mod region;
pub mod resolve;
mod route;

pub use classify::{ElementKind, dimensions_for};
pub use error::{Error, Result};
pub use geom::{Bounds, Point, Rect, Size};
pub use model::{Element, Flow, Graph};
pub use options::{CrossContainerFlows, Direction, LayoutOptions, Padding};
pub use process::ProcessModel;

/// Lays out `graph` and returns the laid-out copy.
///
/// The returned future does all its work on first poll; it exists so callers in async
/// contexts can treat a layout run as one awaitable unit. Dropping it before completion
/// discards the result.
pub async fn apply_layout(graph: &Graph, options: &LayoutOptions) -> Result<Graph> {
    apply_layout_sync(graph, options)
}

/// Synchronous layout helper (executor-free).
pub fn apply_layout_sync(graph: &Graph, options: &LayoutOptions) -> Result<Graph> {
    layout::run(graph, options)
}
