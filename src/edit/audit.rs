use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{Command, Draft, EditError};
use crate::{
    core::Model,
    diff::{ChangeReport, Differ},
};

/// One committed batch of commands and what it changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub batch_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub commands: Vec<Command>,
    pub report: ChangeReport,
}

/// Ordered log of applied command batches.
#[derive(Debug, Default)]
pub struct AuditTrail {
    differ: Differ,
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new(differ: Differ) -> Self {
        Self {
            differ,
            entries: Vec::new(),
        }
    }

    /// Apply `commands` in order to a copy of `model` and record the batch.
    ///
    /// # Errors
    ///
    /// Returns the first failing command's error; nothing is recorded and
    /// `model` is unchanged in that case.
    #[instrument(level = "debug", skip_all, fields(commands = commands.len()))]
    pub fn apply(&mut self, model: &Model, commands: Vec<Command>) -> Result<Model, EditError> {
        let mut draft = Draft::new(model);
        for command in &commands {
            draft.apply(command)?;
        }
        let updated = draft.commit()?;
        let report = self.differ.diff(model, &updated)?;

        let entry = AuditEntry {
            batch_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            commands,
            report,
        };
        info!(
            batch = %entry.batch_id,
            added = entry.report.added.len(),
            changed = entry.report.changed.len(),
            retyped = entry.report.retyped.len(),
            "recorded command batch"
        );
        self.entries.push(entry);
        Ok(updated)
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}
