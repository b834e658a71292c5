use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Element;
use crate::types::ElementId;

/// A broken structural invariant of a [`Model`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("duplicate element id `{0}`")]
    DuplicateId(ElementId),
}

/// An immutable snapshot of a process diagram.
///
/// Elements keep their document order; the id index is derived from them.
/// Serialized as the element sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Element>", into = "Vec<Element>")]
pub struct Model {
    elements: Vec<Element>,
    #[serde(skip)]
    index: HashMap<ElementId, usize>,
}

impl Model {
    /// Build a model, rejecting duplicate ids.
    pub fn try_new(elements: Vec<Element>) -> Result<Self, InvariantViolation> {
        let mut index = HashMap::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            if index.insert(element.id.clone(), position).is_some() {
                return Err(InvariantViolation::DuplicateId(element.id.clone()));
            }
        }
        Ok(Self { elements, index })
    }

    /// Build a model without rejecting duplicate ids.
    ///
    /// The index keeps the first element for each id. Consumers that rely
    /// on uniqueness (the differ) re-check it with [`Model::check_unique`].
    pub fn from_elements_unchecked(elements: Vec<Element>) -> Self {
        let mut index = HashMap::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            index.entry(element.id.clone()).or_insert(position);
        }
        Self { elements, index }
    }

    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Verify id uniqueness, naming the first duplicate in document order.
    pub fn check_unique(&self) -> Result<(), InvariantViolation> {
        if self.index.len() == self.elements.len() {
            return Ok(());
        }
        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if !seen.insert(&element.id) {
                return Err(InvariantViolation::DuplicateId(element.id.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index.get(id).map(|&position| &self.elements[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in document order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ElementId> {
        self.elements.iter().map(|element| &element.id)
    }

    /// Direct children of `parent`, in document order.
    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |element| element.parent.as_ref().is_some_and(|p| p.as_str() == parent))
    }

    /// Chain of containers from the element's parent up to the root.
    ///
    /// Stops at the first dangling parent, and at a repeated id so a
    /// malformed parent cycle cannot loop forever.
    pub fn ancestors<'a>(&'a self, id: &str) -> Vec<&'a Element> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.get(id).and_then(|element| element.parent.as_ref());
        while let Some(parent_id) = current {
            if !visited.insert(parent_id) {
                break;
            }
            let Some(parent) = self.get(parent_id.as_str()) else {
                break;
            };
            chain.push(parent);
            current = parent.parent.as_ref();
        }
        chain
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<Element>> for Model {
    type Error = InvariantViolation;

    fn try_from(elements: Vec<Element>) -> Result<Self, Self::Error> {
        Self::try_new(elements)
    }
}

impl From<Model> for Vec<Element> {
    fn from(model: Model) -> Self {
        model.elements
    }
}

impl<'a> IntoIterator for &'a Model {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
