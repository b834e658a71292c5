//! Structural differ for process models.
//!
//! [`diff`] compares two [`Model`](crate::core::Model) snapshots by element
//! id and returns a [`ChangeReport`]:
//!
//! - ids present only in the new model are `added`, only in the old `removed`;
//! - a shared id whose kind changed is `retyped` and nothing else is compared
//!   field-wise for it;
//! - registered fields of the kind that differ are `changed`;
//! - a different parent is `moved`;
//! - a different layout is `layoutChanged`, and only that.
//!
//! The report is sorted, so the same inputs always serialize to the same
//! bytes whether comparisons ran on one thread or many.

mod engine;
mod options;
mod report;
mod summary;

pub use engine::{diff, Differ};
pub use options::{DiffOptions, Execution, OptionsError};
pub use report::{ChangeReport, FieldChange, Relocation, Retype};
pub use summary::render_summary;
