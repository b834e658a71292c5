use std::{borrow::Cow, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use super::{ElementKind, FieldSpec, Layout};
use crate::types::{AttributeValue, ElementId};

/// A node or edge of the process graph.
///
/// Relations to other elements (`parent`, reference attributes) are plain
/// ids resolved through the owning [`Model`](super::Model), never pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl Element {
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            name: None,
            attributes: BTreeMap::new(),
            parent: None,
            layout: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Current value of a registered field.
    ///
    /// `name` is read from [`Element::name`]; every other field from the
    /// attribute map.
    pub fn field_value(&self, spec: &FieldSpec) -> Option<Cow<'_, AttributeValue>> {
        if spec.name == super::kind::NAME.name {
            return self
                .name
                .as_ref()
                .map(|name| Cow::Owned(AttributeValue::Text(name.clone())));
        }
        self.attributes.get(spec.name).map(Cow::Borrowed)
    }

    /// Ids this element refers to through registered reference fields.
    pub fn references(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.kind
            .fields()
            .iter()
            .filter(|spec| spec.ty == super::FieldType::Reference)
            .filter_map(|spec| {
                let target = self.attributes.get(spec.name)?.as_reference()?;
                Some((spec.name, target))
            })
    }

    pub fn source_ref(&self) -> Option<&str> {
        self.attributes.get("sourceRef")?.as_reference()
    }

    pub fn target_ref(&self) -> Option<&str> {
        self.attributes.get("targetRef")?.as_reference()
    }
}
