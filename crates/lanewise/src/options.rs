//! Layout options and the JSON config layer that feeds them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

pub const DEFAULT_SPACING: f64 = 50.0;

/// Main flow direction inside every region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Left to right, the usual reading direction for process diagrams.
    #[default]
    Right,
    /// Top to bottom.
    Down,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Right => "RIGHT",
            Self::Down => "DOWN",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RIGHT" | "LR" => Ok(Self::Right),
            "DOWN" | "TB" | "TD" => Ok(Self::Down),
            other => Err(Error::InvalidOptions {
                message: format!("unknown direction `{other}` (expected RIGHT or DOWN)"),
            }),
        }
    }
}

/// What to do with flows whose endpoints were laid out in different regions (a task in one lane
/// connected to a task in another lane, or a message flow between pools).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossContainerFlows {
    /// Leave `waypoints` absent and let the renderer draw its own fallback.
    #[default]
    Omit,
    /// Route them orthogonally between the resolved absolute boxes after composition.
    Orthogonal,
}

impl FromStr for CrossContainerFlows {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "omit" => Ok(Self::Omit),
            "orthogonal" => Ok(Self::Orthogonal),
            other => Err(Error::InvalidOptions {
                message: format!(
                    "unknown cross-container flow mode `{other}` (expected omit or orthogonal)"
                ),
            }),
        }
    }
}

/// Fixed insets applied around region content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    /// Label band on the left edge of a lane.
    pub lane_header: f64,
    /// Label band on the left edge of a pool; lanes start right of it.
    pub pool_header: f64,
    /// Gap between region content and the container border, on every side.
    pub content: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            lane_header: 30.0,
            pool_header: 30.0,
            content: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub direction: Direction,
    /// Node-to-node spacing, inter-layer spacing (unless `layer_spacing` is set) and the gap
    /// between stacked pools.
    pub spacing: f64,
    pub layer_spacing: Option<f64>,
    pub padding: Padding,
    pub cross_container_flows: CrossContainerFlows,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Right,
            spacing: DEFAULT_SPACING,
            layer_spacing: None,
            padding: Padding::default(),
            cross_container_flows: CrossContainerFlows::Omit,
        }
    }
}

fn json_f64(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_i64().map(|n| n as f64))
        .or_else(|| v.as_u64().map(|n| n as f64))
}

fn config_f64(cfg: &Value, path: &[&str]) -> Option<f64> {
    let mut cur = cfg;
    for key in path {
        cur = cur.get(*key)?;
    }
    json_f64(cur)
}

fn config_str<'a>(cfg: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = cfg;
    for key in path {
        cur = cur.get(*key)?;
    }
    cur.as_str()
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads options from a JSON config object such as
    /// `{"direction": "DOWN", "spacing": 80, "padding": {"content": 24}}`.
    ///
    /// Missing or wrongly typed keys keep their defaults; unknown keys are ignored.
    pub fn from_config(cfg: &Value) -> Self {
        let mut out = Self::default();
        if let Some(direction) = config_str(cfg, &["direction"]).and_then(|s| s.parse().ok()) {
            out.direction = direction;
        }
        if let Some(spacing) = config_f64(cfg, &["spacing"]) {
            out.spacing = spacing;
        }
        out.layer_spacing = config_f64(cfg, &["layerSpacing"]);
        if let Some(mode) =
            config_str(cfg, &["crossContainerFlows"]).and_then(|s| s.parse().ok())
        {
            out.cross_container_flows = mode;
        }
        if let Some(v) = config_f64(cfg, &["padding", "laneHeader"]) {
            out.padding.lane_header = v;
        }
        if let Some(v) = config_f64(cfg, &["padding", "poolHeader"]) {
            out.padding.pool_header = v;
        }
        if let Some(v) = config_f64(cfg, &["padding", "content"]) {
            out.padding.content = v;
        }
        out
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_layer_spacing(mut self, layer_spacing: f64) -> Self {
        self.layer_spacing = Some(layer_spacing);
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_cross_container_flows(mut self, mode: CrossContainerFlows) -> Self {
        self.cross_container_flows = mode;
        self
    }

    pub fn layer_spacing(&self) -> f64 {
        self.layer_spacing.unwrap_or(self.spacing)
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("spacing", self.spacing),
            ("layerSpacing", self.layer_spacing()),
            ("padding.laneHeader", self.padding.lane_header),
            ("padding.poolHeader", self.padding.pool_header),
            ("padding.content", self.padding.content),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidOptions {
                    message: format!("{name} must be a finite, non-negative number (got {value})"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_overrides_defaults() {
        let cfg = json!({
            "direction": "down",
            "spacing": 80,
            "layerSpacing": 120.5,
            "crossContainerFlows": "orthogonal",
            "padding": {"content": 10}
        });
        let o = LayoutOptions::from_config(&cfg);
        assert_eq!(o.direction, Direction::Down);
        assert_eq!(o.spacing, 80.0);
        assert_eq!(o.layer_spacing(), 120.5);
        assert_eq!(o.cross_container_flows, CrossContainerFlows::Orthogonal);
        assert_eq!(o.padding.content, 10.0);
        assert_eq!(o.padding.lane_header, Padding::default().lane_header);
    }

    #[test]
    fn bad_config_values_keep_defaults() {
        let cfg = json!({"direction": "sideways", "spacing": "wide", "crossContainerFlows": 3});
        assert_eq!(LayoutOptions::from_config(&cfg), LayoutOptions::default());
        assert_eq!(LayoutOptions::from_config(&json!(null)), LayoutOptions::default());
    }

    #[test]
    fn layer_spacing_follows_spacing_unless_set() {
        let o = LayoutOptions::new().with_spacing(70.0);
        assert_eq!(o.layer_spacing(), 70.0);
        assert_eq!(o.with_layer_spacing(30.0).layer_spacing(), 30.0);
    }

    #[test]
    fn validate_rejects_negative_and_nan() {
        assert!(LayoutOptions::default().validate().is_ok());
        assert!(LayoutOptions::new().with_spacing(-1.0).validate().is_err());
        assert!(LayoutOptions::new().with_spacing(f64::NAN).validate().is_err());
        let padding = Padding {
            content: f64::INFINITY,
            ..Padding::default()
        };
        assert!(LayoutOptions::new().with_padding(padding).validate().is_err());
    }

    #[test]
    fn direction_parsing() {
        assert_eq!("RIGHT".parse::<Direction>().ok(), Some(Direction::Right));
        assert_eq!(" lr ".parse::<Direction>().ok(), Some(Direction::Right));
        assert_eq!("Down".parse::<Direction>().ok(), Some(Direction::Down));
        assert!("up".parse::<Direction>().is_err());
    }
}
