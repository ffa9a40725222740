//! Assembles per-region layouts into container-relative placements.
//!
//! Every element ends up with a box relative to its *frame parent*: lane content is relative to
//! its lane, lanes and unlaned pool content are relative to their pool, and pools, standalone
//! lanes and the free region are placed directly on the canvas.

use crate::geom::{Point, Rect, Size};
use crate::hierarchy::{Partition, partition};
use crate::model::{Element, Flow};
use crate::options::LayoutOptions;
use crate::region::{RegionLayout, layout_region};
use crate::Result;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

pub const MIN_LANE_SIZE: Size = Size::new(600.0, 150.0);
pub const MIN_POOL_SIZE: Size = Size::new(600.0, 200.0);

/// Coordinate frame a relative box or route was computed in.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Relative to the resolved origin of the container with this id.
    Container(String),
    /// Canvas coordinates after adding a fixed offset.
    Canvas { dx: f64, dy: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: String,
    pub rect: Rect,
    /// Container this box is relative to; `None` means the box is already absolute.
    pub frame_parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub flow_id: String,
    pub frame: Frame,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub placements: Vec<Placement>,
    pub routes: Vec<RouteRecord>,
}

impl Composition {
    fn place(&mut self, id: &str, rect: Rect, frame_parent: Option<&str>) {
        self.placements.push(Placement {
            id: id.to_string(),
            rect,
            frame_parent: frame_parent.map(str::to_string),
        });
    }

    /// Copies a region's nodes and edges in, shifted by `(dx, dy)` inside `container`.
    fn absorb(&mut self, region: &RegionLayout, container: &str, dx: f64, dy: f64) {
        for n in &region.nodes {
            self.place(&n.id, n.rect.translate(dx, dy), Some(container));
        }
        for e in &region.edges {
            self.routes.push(RouteRecord {
                flow_id: e.id.clone(),
                frame: Frame::Container(container.to_string()),
                points: e.points.iter().map(|p| p.translate(dx, dy)).collect(),
            });
        }
    }
}

/// A laid-out lane before it is stretched and stacked.
struct LaneBox<'a> {
    lane: &'a Element,
    region: RegionLayout,
    size: Size,
}

struct Compositor<'a, 'o> {
    elements: &'a [Element],
    partition: Partition<'a>,
    flows: &'a [Flow],
    options: &'o LayoutOptions,
    pool_ids: FxHashSet<&'a str>,
    container_ids: FxHashSet<&'a str>,
    out: Composition,
}

/// Lays out every region of `elements` and stacks the results on the canvas.
pub fn compose(elements: &[Element], flows: &[Flow], options: &LayoutOptions) -> Result<Composition> {
    let partition = partition(elements);
    let pool_ids: FxHashSet<&str> = partition.pools.iter().map(|p| p.id.as_str()).collect();
    let container_ids: FxHashSet<&str> = partition
        .pools
        .iter()
        .chain(&partition.lanes)
        .map(|e| e.id.as_str())
        .collect();
    let mut c = Compositor {
        elements,
        partition,
        flows,
        options,
        pool_ids,
        container_ids,
        out: Composition::default(),
    };

    let mut cursor_y = 0.0;
    let mut stacked = 0usize;
    for container in c.top_level_containers() {
        let size = if container.is_pool() {
            c.pool(container)?
        } else {
            c.standalone_lane(container)?
        };
        c.out
            .place(&container.id, Rect::new(0.0, cursor_y, size.width, size.height), None);
        debug!(
            container = %container.id,
            y = cursor_y,
            width = size.width,
            height = size.height,
            "stacked container"
        );
        cursor_y += size.height + options.spacing;
        stacked += 1;
    }

    let free = c.free_members();
    if !free.is_empty() {
        let offset_y = if stacked == 0 { 0.0 } else { cursor_y };
        let region = layout_region("free", &free, flows, options)?;
        for n in &region.nodes {
            c.out.place(&n.id, n.rect.translate(0.0, offset_y), None);
        }
        for e in region.edges {
            c.out.routes.push(RouteRecord {
                flow_id: e.id,
                frame: Frame::Canvas {
                    dx: 0.0,
                    dy: offset_y,
                },
                points: e.points,
            });
        }
    }

    Ok(c.out)
}

impl<'a> Compositor<'a, '_> {
    /// Pools plus lanes that have no pool to live in, in input order.
    fn top_level_containers(&self) -> Vec<&'a Element> {
        self.elements
            .iter()
            .filter(|e| e.is_pool() || (e.is_lane() && !self.is_pool_lane(e)))
            .collect()
    }

    fn is_pool_lane(&self, lane: &Element) -> bool {
        lane.parent_id
            .as_deref()
            .is_some_and(|p| self.pool_ids.contains(p))
    }

    /// Unparented elements plus elements whose parent is not a pool or lane, in input order.
    fn free_members(&self) -> Vec<&'a Element> {
        self.elements
            .iter()
            .filter(|e| !e.kind().is_container())
            .filter(|e| match e.parent_id.as_deref() {
                None => true,
                Some(parent) if self.container_ids.contains(parent) => false,
                Some(parent) => {
                    trace!(id = %e.id, parent, "parent is not a container; laying out as free");
                    true
                }
            })
            .collect()
    }

    fn lane_box(&self, lane: &'a Element) -> Result<LaneBox<'a>> {
        let members = self.partition.members_of(&lane.id);
        let region = layout_region(&lane.id, &members, self.flows, self.options)?;
        let pad = self.options.padding;
        let size = Size::new(
            (region.width + pad.lane_header + 2.0 * pad.content).max(MIN_LANE_SIZE.width),
            (region.height + 2.0 * pad.content).max(MIN_LANE_SIZE.height),
        );
        Ok(LaneBox { lane, region, size })
    }

    /// Moves lane content into place: right of the lane header, centered vertically.
    fn absorb_lane(&mut self, lane: &LaneBox<'_>, height: f64) {
        let pad = self.options.padding;
        let dx = pad.lane_header + pad.content;
        let dy = (height - lane.region.height) / 2.0;
        self.out.absorb(&lane.region, &lane.lane.id, dx, dy);
    }

    fn standalone_lane(&mut self, lane: &'a Element) -> Result<Size> {
        let laid = self.lane_box(lane)?;
        self.absorb_lane(&laid, laid.size.height);
        Ok(laid.size)
    }

    fn pool(&mut self, pool: &'a Element) -> Result<Size> {
        let pad = self.options.padding;
        let lanes: Vec<&'a Element> = self.partition.lanes_of(&pool.id).collect();
        let direct = self.partition.members_of(&pool.id);

        if lanes.is_empty() {
            let region = layout_region(&pool.id, &direct, self.flows, self.options)?;
            let size = Size::new(
                (region.width + pad.pool_header + 2.0 * pad.content).max(MIN_POOL_SIZE.width),
                (region.height + 2.0 * pad.content).max(MIN_POOL_SIZE.height),
            );
            let dx = pad.pool_header + pad.content;
            let dy = (size.height - region.height) / 2.0;
            self.out.absorb(&region, &pool.id, dx, dy);
            return Ok(size);
        }

        let mut boxes = Vec::with_capacity(lanes.len());
        for lane in lanes {
            boxes.push(self.lane_box(lane)?);
        }

        // Elements placed directly in a laned pool get their own band below the lanes.
        let band = if direct.is_empty() {
            None
        } else {
            let region = layout_region(&pool.id, &direct, self.flows, self.options)?;
            let size = Size::new(
                region.width + 2.0 * pad.content,
                (region.height + 2.0 * pad.content).max(MIN_LANE_SIZE.height),
            );
            Some((region, size))
        };

        let inner_width = boxes
            .iter()
            .map(|b| b.size.width)
            .chain(band.iter().map(|(_, s)| s.width))
            .fold(0.0, f64::max);

        let mut y = 0.0;
        for b in &boxes {
            self.absorb_lane(b, b.size.height);
            self.out.place(
                &b.lane.id,
                Rect::new(pad.pool_header, y, inner_width, b.size.height),
                Some(&pool.id),
            );
            y += b.size.height;
        }
        if let Some((region, size)) = band {
            let dx = pad.pool_header + pad.content;
            let dy = y + (size.height - region.height) / 2.0;
            self.out.absorb(&region, &pool.id, dx, dy);
            y += size.height;
        }

        Ok(Size::new(inner_width + pad.pool_header, y))
    }
}
