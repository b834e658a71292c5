//! Human-readable rendering of a [`ChangeReport`].

use std::fmt::Write as _;

use super::ChangeReport;
use crate::types::{AttributeValue, ElementId};

/// Render a plain-text summary for review output.
///
/// Informational only; the structured report is the source of truth.
pub fn render_summary(report: &ChangeReport) -> String {
    let mut out = String::new();

    if report.is_empty() {
        out.push_str("No changes.\n");
        return out;
    }

    list(&mut out, "Added", &report.added);
    list(&mut out, "Removed", &report.removed);

    if !report.retyped.is_empty() {
        let _ = writeln!(out, "Retyped ({}):", report.retyped.len());
        for retype in &report.retyped {
            let _ = writeln!(out, "  {}: {} -> {}", retype.id, retype.old_kind, retype.new_kind);
        }
    }

    if !report.changed.is_empty() {
        let _ = writeln!(out, "Changed ({}):", report.changed.len());
        for change in &report.changed {
            let _ = writeln!(
                out,
                "  {}.{}: {} -> {}",
                change.id,
                change.field,
                value(change.old_value.as_ref()),
                value(change.new_value.as_ref())
            );
        }
    }

    if !report.moved.is_empty() {
        let _ = writeln!(out, "Moved ({}):", report.moved.len());
        for relocation in &report.moved {
            let _ = writeln!(
                out,
                "  {}: {} -> {}",
                relocation.id,
                parent(relocation.old_parent.as_ref()),
                parent(relocation.new_parent.as_ref())
            );
        }
    }

    list(&mut out, "Layout changed", &report.layout_changed);
    out
}

fn list(out: &mut String, title: &str, ids: &[ElementId]) {
    if ids.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title} ({}):", ids.len());
    for id in ids {
        let _ = writeln!(out, "  {id}");
    }
}

fn value(value: Option<&AttributeValue>) -> String {
    value.map_or_else(|| "(none)".to_owned(), ToString::to_string)
}

fn parent(parent: Option<&ElementId>) -> String {
    parent.map_or_else(|| "(root)".to_owned(), ToString::to_string)
}
