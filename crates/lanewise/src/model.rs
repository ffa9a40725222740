use crate::classify::ElementKind;
use crate::geom::{Bounds, Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A BPMN diagram as the editor stores it: flat element and flow lists, containment expressed
/// through `parentId`.
///
/// Keys this crate does not understand are kept in the `extra` maps and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Graph {
    pub fn new(elements: Vec<Element>, flows: Vec<Flow>) -> Self {
        Self {
            elements,
            flows,
            extra: Map::new(),
        }
    }

    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn flow(&self, id: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.id == id)
    }

    /// Bounding box of every element box and waypoint that carries geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points: Vec<(f64, f64)> = Vec::new();
        for e in &self.elements {
            if let Some(r) = e.rect() {
                points.push((r.x, r.y));
                points.push((r.right(), r.bottom()));
            }
        }
        for f in &self.flows {
            for p in f.waypoints.iter().flatten() {
                points.push((p.x, p.y));
            }
        }
        Bounds::from_points(points)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    pub fn new(id: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ty: ty.into(),
            parent_id: None,
            x: None,
            y: None,
            width: None,
            height: None,
            extra: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ElementKind {
        ElementKind::from_type_tag(&self.ty)
    }

    pub fn is_pool(&self) -> bool {
        self.kind() == ElementKind::Pool
    }

    pub fn is_lane(&self) -> bool {
        self.kind() == ElementKind::Lane
    }

    pub fn name(&self) -> Option<&str> {
        self.extra.get("name").and_then(Value::as_str)
    }

    /// The laid-out box, if all four geometry fields are present.
    pub fn rect(&self) -> Option<Rect> {
        Some(Rect::new(self.x?, self.y?, self.width?, self.height?))
    }

    pub(crate) fn set_rect(&mut self, rect: Rect) {
        self.x = Some(rect.x);
        self.y = Some(rect.y);
        self.width = Some(rect.width);
        self.height = Some(rect.height);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<Point>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flow {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            waypoints: None,
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
