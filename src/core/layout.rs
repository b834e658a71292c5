//! Diagram-interchange data attached to elements.
//!
//! Everything in this module is cosmetic. The differ compares layouts by
//! value and reports differences separately from semantic changes.
//! Coordinates compare with `NaN` equal to itself, so a layout always
//! equals its own copy.

use serde::{Deserialize, Serialize};

use crate::types::NonEmptyVec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box, origin at the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds of the given size centered on `center`.
    pub fn centered_at(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

fn same_coordinate(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        same_coordinate(self.x, other.x) && same_coordinate(self.y, other.y)
    }
}

impl PartialEq for Bounds {
    fn eq(&self, other: &Self) -> bool {
        same_coordinate(self.x, other.x)
            && same_coordinate(self.y, other.y)
            && same_coordinate(self.width, other.width)
            && same_coordinate(self.height, other.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Geometry {
    /// Node-like element drawn as a box.
    Shape {
        bounds: Bounds,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<Bounds>,
    },
    /// Edge-like element drawn through its waypoints.
    Edge {
        waypoints: NonEmptyVec<Point>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<Bounds>,
    },
}

/// Fill/stroke colors applied by the editor, e.g. coloring tasks by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
}

impl Style {
    pub fn new(fill: impl Into<String>, stroke: impl Into<String>) -> Self {
        Self {
            fill: Some(fill.into()),
            stroke: Some(stroke.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl Layout {
    pub fn shape(bounds: Bounds) -> Self {
        Self {
            geometry: Geometry::Shape {
                bounds,
                label: None,
            },
            style: None,
        }
    }

    pub fn edge(waypoints: NonEmptyVec<Point>) -> Self {
        Self {
            geometry: Geometry::Edge {
                waypoints,
                label: None,
            },
            style: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, bounds: Bounds) -> Self {
        match &mut self.geometry {
            Geometry::Shape { label, .. } | Geometry::Edge { label, .. } => *label = Some(bounds),
        }
        self
    }

    /// Bounds of the shape, `None` for edges.
    pub fn bounds(&self) -> Option<&Bounds> {
        match &self.geometry {
            Geometry::Shape { bounds, .. } => Some(bounds),
            Geometry::Edge { .. } => None,
        }
    }
}
