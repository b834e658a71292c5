//! Structural diffing of BPMN 2.0 process models.
//!
//! Process diagrams are read into an immutable [`Model`] of typed
//! [`Element`]s keyed by id. [`diff`] compares two snapshots and reports
//! what was added, removed, retyped, changed, moved, or only re-laid-out.
//!
//! ```
//! use bpmn_diff::{diff, ingest};
//!
//! let before = ingest::from_xml(r#"<definitions><process id="P"><task id="T" name="Scan"/></process></definitions>"#)?;
//! let after = ingest::from_xml(r#"<definitions><process id="P"><userTask id="T" name="Scan"/></process></definitions>"#)?;
//!
//! let report = diff(&before.model, &after.model)?;
//! assert_eq!(report.retyped[0].id.as_str(), "T");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod check;
pub mod core;
pub mod diff;
pub mod edit;
pub mod ingest;
pub mod types;

pub use crate::core::{Definitions, Element, ElementKind, InvariantViolation, Layout, Model};
pub use crate::diff::{diff, ChangeReport, DiffOptions, Differ};
pub use crate::ingest::IngestionError;
pub use crate::types::{AttributeValue, ElementId};
