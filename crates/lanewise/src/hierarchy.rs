//! Splits the flat element list into pools, lanes, free elements and per-container buckets.

use crate::classify::ElementKind;
use crate::model::Element;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

pub type ChildMap<'a> = IndexMap<&'a str, Vec<&'a Element>, FxBuildHasher>;

#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub pools: Vec<&'a Element>,
    pub lanes: Vec<&'a Element>,
    /// Non-container elements without a `parentId`.
    pub free: Vec<&'a Element>,
    /// Direct children keyed by the `parentId` they name, in first-seen order. Parents are not
    /// validated, so a key may name an element that does not exist or is not a container.
    pub container_children: ChildMap<'a>,
}

impl<'a> Partition<'a> {
    pub fn children_of(&self, id: &str) -> &[&'a Element] {
        self.container_children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Lanes registered under `pool_id`, in input order.
    pub fn lanes_of(&self, pool_id: &str) -> impl Iterator<Item = &'a Element> + '_ {
        self.children_of(pool_id)
            .iter()
            .copied()
            .filter(|e| e.is_lane())
    }

    /// Non-lane children of `container_id`, in input order.
    pub fn members_of(&self, container_id: &str) -> Vec<&'a Element> {
        self.children_of(container_id)
            .iter()
            .copied()
            .filter(|e| !e.is_lane())
            .collect()
    }
}

pub fn partition(elements: &[Element]) -> Partition<'_> {
    let mut out = Partition::default();

    for e in elements {
        match e.kind() {
            ElementKind::Pool => out.pools.push(e),
            ElementKind::Lane => out.lanes.push(e),
            _ => {}
        }
    }

    // Buckets are filled in input order regardless of kind so sibling order is stable.
    for e in elements {
        let kind = e.kind();
        if kind == ElementKind::Pool {
            continue;
        }
        match e.parent_id.as_deref() {
            Some(parent) => out
                .container_children
                .entry(parent)
                .or_default()
                .push(e),
            None if kind == ElementKind::Lane => {}
            None => out.free.push(e),
        }
    }

    out
}
