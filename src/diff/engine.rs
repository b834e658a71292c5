//! Structural comparison of two model snapshots.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument};

use super::{ChangeReport, DiffOptions, FieldChange, Relocation, Retype};
use crate::{
    core::{Element, FieldSpec, FieldType, InvariantViolation, Model},
    types::{AttributeValue, ElementId},
};

/// Compares model snapshots according to its [`DiffOptions`].
#[derive(Debug, Clone, Default)]
pub struct Differ {
    options: DiffOptions,
}

impl Differ {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Compute the change report from `old` to `new`.
    ///
    /// Neither input is modified and the report owns all of its data.
    ///
    /// # Errors
    ///
    /// Fails with [`InvariantViolation::DuplicateId`] when either model holds
    /// two elements with the same id (only possible for models built with
    /// [`Model::from_elements_unchecked`]).
    #[instrument(level = "debug", skip_all, fields(old = old.len(), new = new.len()))]
    pub fn diff(&self, old: &Model, new: &Model) -> Result<ChangeReport, InvariantViolation> {
        old.check_unique()?;
        new.check_unique()?;

        let mut report = ChangeReport::default();
        let mut common = Vec::with_capacity(old.len().min(new.len()));
        for before in old {
            match new.get(before.id.as_str()) {
                Some(after) => common.push((before, after)),
                None => report.removed.push(before.id.clone()),
            }
        }
        report.added = new
            .iter()
            .filter(|after| !old.contains(after.id.as_str()))
            .map(|after| after.id.clone())
            .collect();

        let parallel = self.options.runs_parallel(common.len());
        let compared = if parallel {
            common
                .par_iter()
                .fold(Comparison::default, |acc, &(before, after)| {
                    acc.compare(before, after)
                })
                .reduce(Comparison::default, Comparison::merge)
        } else {
            common
                .iter()
                .fold(Comparison::default(), |acc, &(before, after)| {
                    acc.compare(before, after)
                })
        };
        compared.fill(&mut report);
        report.normalize();

        debug!(
            parallel,
            shared = common.len(),
            added = report.added.len(),
            removed = report.removed.len(),
            retyped = report.retyped.len(),
            changed = report.changed.len(),
            layout_changed = report.layout_changed.len(),
            moved = report.moved.len(),
            "models compared"
        );
        Ok(report)
    }
}

/// Compare two models with default options.
///
/// See [`Differ::diff`].
pub fn diff(old: &Model, new: &Model) -> Result<ChangeReport, InvariantViolation> {
    Differ::default().diff(old, new)
}

/// References match by the id they name. Values that cannot name an id
/// (booleans, integers) only match an identical value.
fn same_reference(old: Option<&AttributeValue>, new: Option<&AttributeValue>) -> bool {
    match (old, new) {
        (Some(old), Some(new)) => match (old.as_reference(), new.as_reference()) {
            (Some(old), Some(new)) => old == new,
            _ => old == new,
        },
        (old, new) => old == new,
    }
}

/// Findings for a subset of the shared ids. Merged buffers are sorted by
/// [`ChangeReport::normalize`], so merge order never shows in the output.
#[derive(Debug, Default)]
struct Comparison {
    retyped: Vec<Retype>,
    changed: Vec<FieldChange>,
    layout_changed: Vec<ElementId>,
    moved: Vec<Relocation>,
}

impl Comparison {
    fn compare(mut self, before: &Element, after: &Element) -> Self {
        if before.kind != after.kind {
            self.retyped.push(Retype {
                id: before.id.clone(),
                old_kind: before.kind.clone(),
                new_kind: after.kind.clone(),
            });
        } else {
            for spec in before.kind.fields() {
                self.compare_field(spec, before, after);
            }
        }

        if before.parent != after.parent {
            self.moved.push(Relocation {
                id: before.id.clone(),
                old_parent: before.parent.clone(),
                new_parent: after.parent.clone(),
            });
        }

        if before.layout != after.layout {
            self.layout_changed.push(before.id.clone());
        }
        self
    }

    fn compare_field(&mut self, spec: &FieldSpec, before: &Element, after: &Element) {
        let old_value = before.field_value(spec);
        let new_value = after.field_value(spec);
        let same = match spec.ty {
            FieldType::Reference => same_reference(old_value.as_deref(), new_value.as_deref()),
            FieldType::Scalar | FieldType::Flag => old_value == new_value,
        };
        if !same {
            self.changed.push(FieldChange {
                id: before.id.clone(),
                field: spec.name.to_owned(),
                old_value: old_value.map(|value| value.into_owned()),
                new_value: new_value.map(|value| value.into_owned()),
            });
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.retyped.extend(other.retyped);
        self.changed.extend(other.changed);
        self.layout_changed.extend(other.layout_changed);
        self.moved.extend(other.moved);
        self
    }

    fn fill(self, report: &mut ChangeReport) {
        report.retyped = self.retyped;
        report.changed = self.changed;
        report.layout_changed = self.layout_changed;
        report.moved = self.moved;
    }
}
