//! Turns container-relative placements into absolute canvas geometry.

use crate::compose::{Composition, Frame};
use crate::geom::{Point, Rect};
use crate::{Error, Result};
use rustc_hash::FxHashMap;

/// Canvas → pool → lane → element is three levels; the cap leaves room for nested lanes.
pub const MAX_CONTAINMENT_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    pub boxes: FxHashMap<String, Rect>,
    /// Absolute waypoints keyed by flow id. Flows without a route have no entry.
    pub routes: FxHashMap<String, Vec<Point>>,
}

struct Resolver<'c> {
    relative: FxHashMap<&'c str, (Rect, Option<&'c str>)>,
    origins: FxHashMap<&'c str, Point>,
}

impl<'c> Resolver<'c> {
    fn new(composition: &'c Composition) -> Self {
        let mut relative = FxHashMap::default();
        for p in &composition.placements {
            relative.insert(p.id.as_str(), (p.rect, p.frame_parent.as_deref()));
        }
        Self {
            relative,
            origins: FxHashMap::default(),
        }
    }

    /// Absolute top-left corner of `id`, walking the frame-parent chain.
    ///
    /// Every origin computed along the way is cached, so shared ancestors are resolved once.
    fn origin(&mut self, id: &'c str) -> Result<Point> {
        if let Some(p) = self.origins.get(id) {
            return Ok(*p);
        }

        let mut chain: Vec<(&'c str, Point)> = Vec::new();
        let mut cur = id;
        let base = loop {
            if let Some(p) = self.origins.get(cur) {
                break *p;
            }
            let Some(&(rect, parent)) = self.relative.get(cur) else {
                // Only reachable for a parent id; placed ids always have an entry.
                let child = chain.last().map(|(c, _)| *c).unwrap_or(id);
                return Err(Error::UnknownContainer {
                    id: child.to_string(),
                    parent: cur.to_string(),
                });
            };
            chain.push((cur, Point::new(rect.x, rect.y)));
            if chain.len() > MAX_CONTAINMENT_DEPTH {
                return Err(Error::ContainmentDepth {
                    id: id.to_string(),
                    max_depth: MAX_CONTAINMENT_DEPTH,
                });
            }
            match parent {
                Some(p) => cur = p,
                None => break Point::new(0.0, 0.0),
            }
        };

        let mut acc = base;
        for (node, rel) in chain.into_iter().rev() {
            acc = acc.translate(rel.x, rel.y);
            self.origins.insert(node, acc);
        }
        Ok(acc)
    }

    fn frame_offset(&mut self, frame: &'c Frame) -> Result<Point> {
        match frame {
            Frame::Container(id) => self.origin(id),
            Frame::Canvas { dx, dy } => Ok(Point::new(*dx, *dy)),
        }
    }
}

pub fn resolve(composition: &Composition) -> Result<Resolved> {
    let mut r = Resolver::new(composition);
    let mut out = Resolved::default();

    for p in &composition.placements {
        let origin = r.origin(&p.id)?;
        out.boxes
            .insert(p.id.clone(), Rect::new(origin.x, origin.y, p.rect.width, p.rect.height));
    }

    for route in &composition.routes {
        if route.points.is_empty() || out.routes.contains_key(&route.flow_id) {
            continue;
        }
        let offset = r.frame_offset(&route.frame)?;
        let points = route
            .points
            .iter()
            .map(|p| p.translate(offset.x, offset.y))
            .collect();
        out.routes.insert(route.flow_id.clone(), points);
    }

    Ok(out)
}
