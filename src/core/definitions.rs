use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, Model};

/// BPMN 2.0 Definitions root element
///
/// Produced by ingestion: the document-level attributes plus the element
/// model read from every process and collaboration in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: Option<String>,
    pub model: Model,
}

impl Definitions {
    pub fn new(model: Model) -> Self {
        Self {
            name: None,
            target_namespace: None,
            model,
        }
    }

    /// Process elements, in document order.
    pub fn processes(&self) -> impl Iterator<Item = &Element> {
        self.model
            .iter()
            .filter(|element| element.kind == ElementKind::Process)
    }

    pub fn into_model(self) -> Model {
        self.model
    }
}
