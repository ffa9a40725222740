//! Orthogonal flow routing with fixed port sides.
//!
//! Flows leave their source on the trailing side (right for `RIGHT`, bottom for `DOWN`) and
//! enter their target on the leading side (left / top). Between the two ports the route only
//! uses horizontal and vertical segments.

use crate::geom::{EPS, Point, Rect};
use crate::options::Direction;

/// Distance a route keeps from node borders when it has to go around them.
pub(crate) const CLEARANCE: f64 = 20.0;

pub(crate) fn exit_port(rect: &Rect, dir: Direction) -> Point {
    let c = rect.center();
    match dir {
        Direction::Right => Point::new(rect.right(), c.y),
        Direction::Down => Point::new(c.x, rect.bottom()),
    }
}

pub(crate) fn entry_port(rect: &Rect, dir: Direction) -> Point {
    let c = rect.center();
    match dir {
        Direction::Right => Point::new(rect.x, c.y),
        Direction::Down => Point::new(c.x, rect.y),
    }
}

/// Routes `from -> to` through the bend `hints` (usually the layered layout's dummy node
/// positions), replacing every diagonal step with an axis-aligned elbow.
///
/// Without hints, a target that lies behind the source along the flow axis gets a detour
/// around both boxes instead of a route cutting back through the source.
pub(crate) fn orthogonal(from: &Rect, to: &Rect, hints: &[Point], dir: Direction) -> Vec<Point> {
    let start = exit_port(from, dir);
    let end = entry_port(to, dir);

    if hints.is_empty() && is_backward(start, end, dir) {
        return simplify(detour(from, to, start, end, dir));
    }

    let mut out = vec![start];
    for &next in hints.iter().chain(std::iter::once(&end)) {
        let Some(&prev) = out.last() else {
            continue;
        };
        push_elbow(&mut out, prev, next, dir);
    }
    simplify(out)
}

/// A rectangular loop from the exit port around the node's far corner back to the entry port.
pub(crate) fn self_loop(rect: &Rect, dir: Direction) -> Vec<Point> {
    let start = exit_port(rect, dir);
    let end = entry_port(rect, dir);
    let pts = match dir {
        Direction::Right => {
            let over = rect.y - CLEARANCE;
            vec![
                start,
                Point::new(start.x + CLEARANCE, start.y),
                Point::new(start.x + CLEARANCE, over),
                Point::new(end.x - CLEARANCE, over),
                Point::new(end.x - CLEARANCE, end.y),
                end,
            ]
        }
        Direction::Down => {
            let beside = rect.right() + CLEARANCE;
            vec![
                start,
                Point::new(start.x, start.y + CLEARANCE),
                Point::new(beside, start.y + CLEARANCE),
                Point::new(beside, end.y - CLEARANCE),
                Point::new(end.x, end.y - CLEARANCE),
                end,
            ]
        }
    };
    simplify(pts)
}

fn is_backward(start: Point, end: Point, dir: Direction) -> bool {
    match dir {
        Direction::Right => end.x < start.x - EPS,
        Direction::Down => end.y < start.y - EPS,
    }
}

fn detour(from: &Rect, to: &Rect, start: Point, end: Point, dir: Direction) -> Vec<Point> {
    match dir {
        Direction::Right => {
            let below = from.bottom().max(to.bottom()) + CLEARANCE;
            vec![
                start,
                Point::new(start.x + CLEARANCE, start.y),
                Point::new(start.x + CLEARANCE, below),
                Point::new(end.x - CLEARANCE, below),
                Point::new(end.x - CLEARANCE, end.y),
                end,
            ]
        }
        Direction::Down => {
            let beside = from.right().max(to.right()) + CLEARANCE;
            vec![
                start,
                Point::new(start.x, start.y + CLEARANCE),
                Point::new(beside, start.y + CLEARANCE),
                Point::new(beside, end.y - CLEARANCE),
                Point::new(end.x, end.y - CLEARANCE),
                end,
            ]
        }
    }
}

fn push_elbow(out: &mut Vec<Point>, prev: Point, next: Point, dir: Direction) {
    let aligned = (prev.x - next.x).abs() <= EPS || (prev.y - next.y).abs() <= EPS;
    if !aligned {
        // Bend halfway along the flow axis so parallel flows between the same layers line up.
        match dir {
            Direction::Right => {
                let mid = (prev.x + next.x) / 2.0;
                out.push(Point::new(mid, prev.y));
                out.push(Point::new(mid, next.y));
            }
            Direction::Down => {
                let mid = (prev.y + next.y) / 2.0;
                out.push(Point::new(prev.x, mid));
                out.push(Point::new(next.x, mid));
            }
        }
    }
    out.push(next);
}

/// Drops repeated points and interior points that sit on a straight horizontal or vertical run.
pub(crate) fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_some_and(|last| last.approx_eq(&p)) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let same_x = (a.x - b.x).abs() <= EPS && (b.x - p.x).abs() <= EPS;
            let same_y = (a.y - b.y).abs() <= EPS && (b.y - p.y).abs() <= EPS;
            if same_x || same_y {
                out.pop();
            }
        }
        out.push(p);
    }
    if out.len() == 1 {
        out.push(out[0]);
    }
    out
}
