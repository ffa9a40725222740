use crate::compose::compose;
use crate::model::Graph;
use crate::options::{CrossContainerFlows, LayoutOptions};
use crate::resolve::{Resolved, resolve};
use crate::route;
use crate::Result;
use tracing::{debug, trace};

/// Runs the whole layout and returns a laid-out copy of `graph`.
///
/// The input is never modified; on error nothing is produced.
pub(crate) fn run(graph: &Graph, options: &LayoutOptions) -> Result<Graph> {
    options.validate()?;
    debug!(
        elements = graph.elements.len(),
        flows = graph.flows.len(),
        direction = options.direction.as_str(),
        spacing = options.spacing,
        "layout start"
    );

    let composition = compose(&graph.elements, &graph.flows, options)?;
    let mut resolved = resolve(&composition)?;
    if options.cross_container_flows == CrossContainerFlows::Orthogonal {
        route_cross_container(graph, options, &mut resolved);
    }

    let out = merge(graph, &resolved);
    debug!(
        placed = resolved.boxes.len(),
        routed = resolved.routes.len(),
        "layout done"
    );
    Ok(out)
}

/// Routes flows that no single region laid out, using the resolved absolute boxes.
fn route_cross_container(graph: &Graph, options: &LayoutOptions, resolved: &mut Resolved) {
    for f in &graph.flows {
        if resolved.routes.contains_key(&f.id) {
            continue;
        }
        let (Some(from), Some(to)) = (resolved.boxes.get(&f.source), resolved.boxes.get(&f.target))
        else {
            trace!(flow = %f.id, "endpoint without geometry; left unrouted");
            continue;
        };
        let points = if f.is_self_loop() {
            route::self_loop(from, options.direction)
        } else {
            route::orthogonal(from, to, &[], options.direction)
        };
        trace!(flow = %f.id, points = points.len(), "routed across containers");
        resolved.routes.insert(f.id.clone(), points);
    }
}

/// Copies `graph` with resolved geometry written over it.
///
/// Elements without a resolved box keep whatever geometry they had. Waypoints are replaced
/// wholesale: a flow that got no route ends up with none rather than a stale one.
fn merge(graph: &Graph, resolved: &Resolved) -> Graph {
    let mut out = graph.clone();
    for e in &mut out.elements {
        if let Some(rect) = resolved.boxes.get(&e.id) {
            e.set_rect(*rect);
        }
    }
    for f in &mut out.flows {
        f.waypoints = resolved.routes.get(&f.id).cloned();
        if f.waypoints.is_none() {
            trace!(flow = %f.id, source = %f.source, target = %f.target, "flow left unrouted");
        }
    }
    out
}
