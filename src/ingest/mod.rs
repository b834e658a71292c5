//! BPMN 2.0 XML ingestion.
//!
//! Turns a `definitions` document into [`Definitions`] holding a validated
//! [`Model`](crate::core::Model): every element has a non-empty unique id,
//! reference attributes are copied verbatim, and layouts come from the
//! diagram-interchange section when present.

mod reader;

use std::path::{Path, PathBuf};

use quick_xml::events::attributes::AttrError;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    check::{dangling_references, DanglingReference},
    core::Definitions,
    types::ElementId,
};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: usize,
        source: quick_xml::Error,
    },
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("document root is `{0}`, expected `definitions`")]
    NotDefinitions(String),
    #[error("document has no `definitions` element")]
    Empty,
    #[error("`{tag}` element has no id")]
    MissingId { tag: String },
    #[error("duplicate element id `{0}`")]
    DuplicateId(ElementId),
    #[error("invalid `{attribute}` coordinate {value:?} in diagram section")]
    InvalidCoordinate { attribute: String, value: String },
    #[error("`{}` refers to missing element `{}` through `{}`", .0.element, .0.target, .0.field)]
    DanglingReference(DanglingReference),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Ingestion settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Reject documents whose parents or reference attributes name ids
    /// that do not exist.
    pub strict_references: bool,
}

/// Read a BPMN document with default options.
///
/// # Errors
///
/// Returns an [`IngestionError`] when the document is not well-formed XML,
/// has no `definitions` root, or violates id uniqueness.
pub fn from_xml(xml: &str) -> Result<Definitions, IngestionError> {
    from_xml_with(xml, IngestOptions::default())
}

/// Read a BPMN document.
///
/// # Errors
///
/// As [`from_xml`]; additionally fails on the first dangling reference when
/// [`IngestOptions::strict_references`] is set.
#[instrument(level = "debug", skip(xml), fields(bytes = xml.len()))]
pub fn from_xml_with(xml: &str, options: IngestOptions) -> Result<Definitions, IngestionError> {
    let definitions = reader::read(xml)?;

    if options.strict_references {
        if let Some(dangling) = dangling_references(&definitions.model).into_iter().next() {
            return Err(IngestionError::DanglingReference(dangling));
        }
    }

    debug!(elements = definitions.model.len(), "document ingested");
    Ok(definitions)
}

/// Read a BPMN document from a file.
///
/// # Errors
///
/// Returns [`IngestionError::Io`] if the file cannot be read, otherwise as
/// [`from_xml_with`].
pub fn from_path(path: &Path, options: IngestOptions) -> Result<Definitions, IngestionError> {
    let xml = std::fs::read_to_string(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_xml_with(&xml, options)
}
