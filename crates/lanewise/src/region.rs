//! Lays out one flat region (a lane, a lane-less pool, or the free elements) with dugong.

use crate::classify::dimensions_for;
use crate::geom::{Bounds, EPS, Point, Rect, Size};
use crate::model::{Element, Flow};
use crate::options::{Direction, LayoutOptions};
use crate::route;
use crate::{Error, Result};
use dugong::graphlib::{Graph, GraphOptions};
use dugong::{EdgeLabel, GraphLabel, NodeLabel, RankDir};
use rustc_hash::FxHashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, trace};

/// Size reported for a region with no nodes.
pub const EMPTY_REGION_SIZE: Size = Size::new(100.0, 100.0);

const EDGE_SEPARATION: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub id: String,
    /// Top-left box relative to the region origin.
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Start point, bends, end point; relative to the region origin.
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionLayout {
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
}

impl RegionLayout {
    fn empty() -> Self {
        Self {
            width: EMPTY_REGION_SIZE.width,
            height: EMPTY_REGION_SIZE.height,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        for n in &mut self.nodes {
            n.rect = n.rect.translate(dx, dy);
        }
        for e in &mut self.edges {
            for p in &mut e.points {
                *p = p.translate(dx, dy);
            }
        }
    }
}

/// Interior points of a layered edge that actually bend it.
///
/// Points are reported as `[tail border, inner.., head border]`; inner points that sit on the
/// straight line between the two borders carry no routing information and are dropped.
fn bend_hints(layered: &[Point]) -> Vec<Point> {
    let (Some(first), Some(last)) = (layered.first(), layered.last()) else {
        return Vec::new();
    };
    if layered.len() <= 2 {
        return Vec::new();
    }
    let (dx, dy) = (last.x - first.x, last.y - first.y);
    let len = dx.hypot(dy);
    layered[1..layered.len() - 1]
        .iter()
        .copied()
        .filter(|p| {
            let cross = (p.x - first.x) * dy - (p.y - first.y) * dx;
            len <= EPS || (cross / len).abs() > 1.0
        })
        .collect()
}

fn solver_error(region: &str, message: impl Into<String>) -> Error {
    Error::Solver {
        region: region.to_string(),
        message: message.into(),
    }
}

/// Lays out `nodes` plus the subset of `all_flows` whose source and target are both in `nodes`.
///
/// Coordinates in the result are relative to the region, whose bounding box starts at (0, 0).
/// `region` only names the region in logs and errors.
pub fn layout_region(
    region: &str,
    nodes: &[&Element],
    all_flows: &[Flow],
    options: &LayoutOptions,
) -> Result<RegionLayout> {
    if nodes.is_empty() {
        trace!(region, "empty region");
        return Ok(RegionLayout::empty());
    }

    let members: FxHashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let flows: Vec<&Flow> = all_flows
        .iter()
        .filter(|f| members.contains(f.source.as_str()) && members.contains(f.target.as_str()))
        .collect();

    // dugong always ranks top to bottom here; RIGHT is handled by swapping axes on the way in
    // and out so node sizes are respected along the rank axis.
    let transpose = options.direction == Direction::Right;
    let axis = |x: f64, y: f64| if transpose { (y, x) } else { (x, y) };

    let mut g = Graph::<NodeLabel, EdgeLabel, GraphLabel>::new(GraphOptions {
        multigraph: true,
        ..Default::default()
    });
    g.set_graph(GraphLabel {
        rankdir: RankDir::TB,
        nodesep: options.spacing,
        ranksep: options.layer_spacing(),
        edgesep: EDGE_SEPARATION,
        ..Default::default()
    });

    for n in nodes {
        let (width, height) = {
            let size = dimensions_for(&n.ty);
            axis(size.width, size.height)
        };
        g.set_node(
            n.id.clone(),
            NodeLabel {
                width,
                height,
                ..Default::default()
            },
        );
    }
    for f in &flows {
        g.set_edge_named(
            f.source.clone(),
            f.target.clone(),
            Some(f.id.clone()),
            Some(EdgeLabel {
                minlen: 1,
                weight: 1.0,
                ..Default::default()
            }),
        );
    }

    debug!(
        region,
        nodes = nodes.len(),
        flows = flows.len(),
        "running layered layout"
    );
    catch_unwind(AssertUnwindSafe(|| dugong::layout(&mut g))).map_err(|panic| {
        let message = panic
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| panic.downcast_ref::<&str>().copied())
            .unwrap_or("layered layout panicked");
        solver_error(region, message)
    })?;

    let mut positioned: Vec<PositionedNode> = Vec::with_capacity(nodes.len());
    for n in nodes {
        let label = g
            .node(&n.id)
            .ok_or_else(|| solver_error(region, format!("node `{}` vanished", n.id)))?;
        let (Some(cx), Some(cy)) = (label.x, label.y) else {
            return Err(solver_error(
                region,
                format!("node `{}` has no coordinates", n.id),
            ));
        };
        let (cx, cy) = axis(cx, cy);
        let (width, height) = axis(label.width, label.height);
        let rect = Rect::from_center(cx, cy, Size::new(width, height));
        if !rect.is_finite() {
            return Err(solver_error(
                region,
                format!("node `{}` has non-finite coordinates", n.id),
            ));
        }
        positioned.push(PositionedNode {
            id: n.id.clone(),
            rect,
        });
    }

    let rect_of = |id: &str| {
        positioned
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.rect)
    };

    let mut edges: Vec<PositionedEdge> = Vec::with_capacity(flows.len());
    for f in &flows {
        let (Some(from), Some(to)) = (rect_of(&f.source), rect_of(&f.target)) else {
            continue;
        };
        let points = if f.is_self_loop() {
            route::self_loop(&from, options.direction)
        } else {
            let layered: Vec<Point> = g
                .edge(&f.source, &f.target, Some(f.id.as_str()))
                .map(|e| {
                    e.points
                        .iter()
                        .map(|p| {
                            let (x, y) = axis(p.x, p.y);
                            Point::new(x, y)
                        })
                        .collect()
                })
                .unwrap_or_default();
            route::orthogonal(&from, &to, &bend_hints(&layered), options.direction)
        };
        if points.iter().any(|p| !p.is_finite()) {
            return Err(solver_error(
                region,
                format!("flow `{}` has non-finite waypoints", f.id),
            ));
        }
        edges.push(PositionedEdge {
            id: f.id.clone(),
            source: f.source.clone(),
            target: f.target.clone(),
            points,
        });
    }

    let bounds = Bounds::from_points(
        positioned
            .iter()
            .flat_map(|n| [(n.rect.x, n.rect.y), (n.rect.right(), n.rect.bottom())])
            .chain(edges.iter().flat_map(|e| e.points.iter().map(|p| (p.x, p.y)))),
    )
    .ok_or_else(|| solver_error(region, "region has no extent"))?;

    let mut out = RegionLayout {
        width: bounds.width(),
        height: bounds.height(),
        nodes: positioned,
        edges,
    };
    out.translate(-bounds.min_x, -bounds.min_y);

    debug!(
        region,
        width = out.width,
        height = out.height,
        edges = out.edges.len(),
        "region laid out"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Direction;

    fn task(id: &str) -> Element {
        Element::new(id, "bpmn:Task")
    }

    #[test]
    fn empty_region_gets_the_default_box() {
        let out = layout_region("empty", &[], &[], &LayoutOptions::default()).expect("layout");
        assert_eq!(out.size(), EMPTY_REGION_SIZE);
        assert!(out.nodes.is_empty() && out.edges.is_empty());
    }

    #[test]
    fn flows_leaving_the_region_are_ignored() {
        let a = task("A");
        let b = task("B");
        let flows = vec![Flow::new("F1", "A", "B"), Flow::new("F2", "A", "Elsewhere")];
        let out = layout_region("r", &[&a, &b], &flows, &LayoutOptions::default()).expect("layout");
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].id, "F1");
    }

    #[test]
    fn region_is_normalized_to_the_origin() {
        let a = task("A");
        let b = Element::new("B", "bpmn:ExclusiveGateway");
        let flows = vec![Flow::new("F1", "A", "B")];
        let out = layout_region("r", &[&a, &b], &flows, &LayoutOptions::default()).expect("layout");

        let min_x = out.nodes.iter().map(|n| n.rect.x).fold(f64::INFINITY, f64::min);
        let min_y = out.nodes.iter().map(|n| n.rect.y).fold(f64::INFINITY, f64::min);
        assert!(min_x >= -1e-6 && min_y >= -1e-6);
        for n in &out.nodes {
            assert!(n.rect.right() <= out.width + 1e-6);
            assert!(n.rect.bottom() <= out.height + 1e-6);
        }
        assert_eq!(out.nodes[1].rect.width, 50.0);
    }

    #[test]
    fn straight_layered_points_give_no_hints() {
        let straight = [
            Point::new(0.0, 0.0),
            Point::new(50.0, 25.0),
            Point::new(100.0, 50.0),
        ];
        assert!(bend_hints(&straight).is_empty());

        let bent = [
            Point::new(0.0, 0.0),
            Point::new(50.0, 80.0),
            Point::new(100.0, 0.0),
        ];
        assert_eq!(bend_hints(&bent), vec![Point::new(50.0, 80.0)]);
    }

    #[test]
    fn edges_attach_to_side_ports() {
        let a = task("A");
        let b = task("B");
        let flows = vec![Flow::new("F1", "A", "B")];
        let opts = LayoutOptions::default().with_direction(Direction::Right);
        let out = layout_region("r", &[&a, &b], &flows, &opts).expect("layout");

        let ra = out.nodes[0].rect;
        let rb = out.nodes[1].rect;
        let pts = &out.edges[0].points;
        let first = pts.first().expect("start");
        let last = pts.last().expect("end");
        assert!((first.x - ra.right()).abs() < 1e-6);
        assert!((last.x - rb.x).abs() < 1e-6);
    }
}
