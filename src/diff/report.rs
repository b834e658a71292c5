//! Change report produced by the differ.
//!
//! Every collection is sorted by element id (then by field name for
//! [`FieldChange`]s), so two reports for the same inputs serialize to the
//! same bytes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    core::ElementKind,
    types::{AttributeValue, ElementId},
};

/// An element whose id persisted but whose kind changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retype {
    pub id: ElementId,
    pub old_kind: ElementKind,
    pub new_kind: ElementKind,
}

/// A registered field whose value differs. An absent side is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub id: ElementId,
    pub field: String,
    pub old_value: Option<AttributeValue>,
    pub new_value: Option<AttributeValue>,
}

/// An element that moved to a different container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relocation {
    pub id: ElementId,
    pub old_parent: Option<ElementId>,
    pub new_parent: Option<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub added: Vec<ElementId>,
    pub removed: Vec<ElementId>,
    pub retyped: Vec<Retype>,
    pub changed: Vec<FieldChange>,
    pub layout_changed: Vec<ElementId>,
    pub moved: Vec<Relocation>,
}

impl ChangeReport {
    /// Sort every collection into report order.
    pub(crate) fn normalize(&mut self) {
        self.added.sort_unstable();
        self.removed.sort_unstable();
        self.retyped.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        self.changed
            .sort_unstable_by(|a, b| (&a.id, &a.field).cmp(&(&b.id, &b.field)));
        self.layout_changed.sort_unstable();
        self.moved.sort_unstable_by(|a, b| a.id.cmp(&b.id));
    }

    /// No difference of any kind.
    pub fn is_empty(&self) -> bool {
        !self.has_semantic_changes() && self.layout_changed.is_empty()
    }

    /// Any difference other than layout.
    pub fn has_semantic_changes(&self) -> bool {
        !(self.added.is_empty()
            && self.removed.is_empty()
            && self.retyped.is_empty()
            && self.changed.is_empty()
            && self.moved.is_empty())
    }

    /// Copy of the report without layout-only entries.
    #[must_use]
    pub fn semantic_view(&self) -> Self {
        Self {
            layout_changed: Vec::new(),
            ..self.clone()
        }
    }

    /// Every id mentioned anywhere in the report, sorted.
    pub fn touched_ids(&self) -> BTreeSet<&ElementId> {
        self.added
            .iter()
            .chain(&self.removed)
            .chain(self.retyped.iter().map(|r| &r.id))
            .chain(self.changed.iter().map(|c| &c.id))
            .chain(&self.layout_changed)
            .chain(self.moved.iter().map(|m| &m.id))
            .collect()
    }

    /// Field changes recorded for one element, in field order.
    pub fn changes_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FieldChange> + 'a {
        self.changed.iter().filter(move |change| change.id.as_str() == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
