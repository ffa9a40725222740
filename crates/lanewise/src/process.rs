//! Import of the editor's persisted process JSON.
//!
//! A process model describes one process with optional lanes. Lane membership is given either
//! by an element's `laneId` or by the lane's `childElementIds`; both are folded into `parentId`.

use crate::classify::{LANE_TYPE, POOL_TYPE};
use crate::model::{Element, Flow, Graph};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessModel {
    pub process: ProcessInfo,
    #[serde(default)]
    pub lanes: Vec<ProcessLane>,
    #[serde(default)]
    pub elements: Vec<ProcessElement>,
    #[serde(default)]
    pub flows: Vec<ProcessFlow>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessLane {
    pub id: String,
    #[serde(default)]
    pub child_element_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `name`, `laneId`, `meta` and anything else stay in `extra` and are copied through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessElement {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessElement {
    pub fn lane_id(&self) -> Option<&str> {
        self.extra.get("laneId").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessFlow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `userTask` -> `bpmn:UserTask`. Tags that already carry a namespace prefix are kept as-is.
pub fn normalize_type_tag(tag: &str) -> String {
    let tag = tag.trim();
    if tag.contains(':') {
        return tag.to_string();
    }
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => format!("bpmn:{}{}", first.to_uppercase(), chars.as_str()),
        None => "bpmn:".to_string(),
    }
}

impl ProcessModel {
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_graph(self) -> Graph {
        let pool_id = self.process.id.clone();
        let lane_ids: FxHashSet<&str> = self.lanes.iter().map(|l| l.id.as_str()).collect();

        // First lane listing an element wins.
        let mut listed_in: FxHashMap<&str, &str> = FxHashMap::default();
        for lane in &self.lanes {
            for child in &lane.child_element_ids {
                listed_in.entry(child.as_str()).or_insert(lane.id.as_str());
            }
        }

        let mut elements = Vec::with_capacity(1 + self.lanes.len() + self.elements.len());
        let mut pool = Element::new(pool_id.clone(), POOL_TYPE);
        pool.extra = self.process.extra.clone();
        elements.push(pool);

        for lane in &self.lanes {
            let mut e = Element::new(lane.id.clone(), LANE_TYPE).with_parent(pool_id.clone());
            e.extra = lane.extra.clone();
            if !lane.child_element_ids.is_empty() {
                e.extra.insert(
                    "childElementIds".to_string(),
                    Value::from(lane.child_element_ids.clone()),
                );
            }
            elements.push(e);
        }

        for el in &self.elements {
            let parent = el
                .lane_id()
                .filter(|id| lane_ids.contains(id))
                .or_else(|| listed_in.get(el.id.as_str()).copied())
                .unwrap_or(pool_id.as_str());
            let mut e = Element::new(el.id.clone(), normalize_type_tag(&el.ty)).with_parent(parent);
            e.extra = el.extra.clone();
            elements.push(e);
        }

        let mut used: FxHashSet<String> = self.flows.iter().filter_map(|f| f.id.clone()).collect();
        let mut next = 1usize;
        let mut flows = Vec::with_capacity(self.flows.len());
        for f in &self.flows {
            let id = match &f.id {
                Some(id) => id.clone(),
                None => loop {
                    let candidate = format!("Flow_{next}");
                    next += 1;
                    if used.insert(candidate.clone()) {
                        break candidate;
                    }
                },
            };
            let mut flow = Flow::new(id, f.source.clone(), f.target.clone());
            flow.extra = f.extra.clone();
            flows.push(flow);
        }

        let mut graph = Graph::new(elements, flows);
        graph.extra = self.extra;
        graph
    }
}

impl From<ProcessModel> for Graph {
    fn from(model: ProcessModel) -> Self {
        model.into_graph()
    }
}
