//! Element model shared by ingestion, the differ and the editor.

mod definitions;
mod element;
mod kind;
mod layout;
mod model;

pub use definitions::Definitions;
pub use element::Element;
pub use kind::{ElementKind, FieldSpec, FieldType, NAME};
pub use layout::{Bounds, Geometry, Layout, Point, Style};
pub use model::{InvariantViolation, Model};
