//! Editing capability driven by explicit command values.
//!
//! Edits never touch a [`Model`](crate::core::Model): a [`Draft`] copies
//! one, applies [`Command`]s through the [`ModelEditor`] operations, and
//! commits a new snapshot. [`AuditTrail`] pairs each committed batch with
//! the change report between the snapshots before and after it.

mod audit;
mod draft;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use audit::{AuditEntry, AuditTrail};
pub use draft::Draft;

use crate::{
    core::{Element, ElementKind, InvariantViolation, Point, Style},
    types::{AttributeValue, ElementId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no element with id `{0}`")]
    UnknownElement(String),
    #[error("element id `{0}` is already taken")]
    DuplicateId(ElementId),
    #[error("`{0}` is not a connection kind")]
    NotAConnection(ElementKind),
    #[error("`{0}` is a connection kind; use a flow command")]
    IsAConnection(ElementKind),
    #[error("`{0}` elements cannot be annotated")]
    NotAnnotatable(ElementKind),
    #[error("element `{0}` has no layout")]
    NoLayout(ElementId),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Attribute patch: `Some` sets a value, `None` removes the attribute.
/// The key `name` edits the element label.
pub type AttributePatch = BTreeMap<String, Option<AttributeValue>>;

/// Style applied to every element of a kind by [`Command::ColorByKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRule {
    pub kind: ElementKind,
    pub style: Style,
}

/// A named edit of a live diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    CreateElement {
        kind: ElementKind,
        #[serde(default)]
        attributes: BTreeMap<String, AttributeValue>,
        #[serde(default)]
        parent: Option<ElementId>,
        /// Center of the new shape; without it the element has no layout.
        #[serde(default)]
        at: Option<Point>,
    },
    CreateFlow {
        kind: ElementKind,
        source: ElementId,
        target: ElementId,
        #[serde(default)]
        attributes: BTreeMap<String, AttributeValue>,
    },
    UpdateAttributes {
        id: ElementId,
        patch: AttributePatch,
    },
    SetLayoutHint {
        id: ElementId,
        style: Style,
    },
    Retype {
        id: ElementId,
        kind: ElementKind,
    },
    /// Text annotation next to the flow node `target`, linked by an
    /// association.
    Annotate {
        target: ElementId,
        text: String,
        at: Point,
    },
    ColorByKind {
        rules: Vec<ColorRule>,
    },
}

/// Live editing operations.
pub trait ModelEditor {
    /// Create a node-like element under `parent` and return it.
    fn create_element(
        &mut self,
        kind: ElementKind,
        attributes: BTreeMap<String, AttributeValue>,
        parent: Option<ElementId>,
    ) -> Result<Element, EditError>;

    /// Create a connection from `source` to `target` and return it.
    fn create_flow(
        &mut self,
        kind: ElementKind,
        source: &ElementId,
        target: &ElementId,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Result<Element, EditError>;

    fn update_attributes(&mut self, id: &ElementId, patch: AttributePatch) -> Result<(), EditError>;

    fn set_layout_hint(&mut self, id: &ElementId, style: Style) -> Result<(), EditError>;
}
