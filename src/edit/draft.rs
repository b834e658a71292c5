use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use uuid::Uuid;

use super::{AttributePatch, ColorRule, Command, EditError, ModelEditor};
use crate::{
    core::{Bounds, Element, ElementKind, Layout, Model, Point, Style},
    types::{AttributeValue, ElementId, NonEmptyVec},
};

/// Mutable working copy of a model.
///
/// The source model is cloned on creation and never touched; [`Draft::commit`]
/// produces the edited snapshot.
#[derive(Debug, Clone)]
pub struct Draft {
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
}

impl Draft {
    pub fn new(model: &Model) -> Self {
        let elements = model.elements().to_vec();
        let index = elements
            .iter()
            .enumerate()
            .map(|(position, element)| (element.id.clone(), position))
            .collect();
        Self { elements, index }
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index.get(id).map(|&position| &self.elements[position])
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Apply one command, returning the ids it created or modified.
    pub fn apply(&mut self, command: &Command) -> Result<Vec<ElementId>, EditError> {
        match command {
            Command::CreateElement {
                kind,
                attributes,
                parent,
                at,
            } => {
                let element = self.create_element(kind.clone(), attributes.clone(), parent.clone())?;
                if let Some(center) = at {
                    self.place(&element.id, *center)?;
                }
                Ok(vec![element.id])
            }
            Command::CreateFlow {
                kind,
                source,
                target,
                attributes,
            } => {
                let flow = self.create_flow(kind.clone(), source, target, attributes.clone())?;
                Ok(vec![flow.id])
            }
            Command::UpdateAttributes { id, patch } => {
                self.update_attributes(id, patch.clone())?;
                Ok(vec![id.clone()])
            }
            Command::SetLayoutHint { id, style } => {
                self.set_layout_hint(id, style.clone())?;
                Ok(vec![id.clone()])
            }
            Command::Retype { id, kind } => {
                self.get_mut(id.as_str())?.kind = kind.clone();
                Ok(vec![id.clone()])
            }
            Command::Annotate { target, text, at } => self.annotate(target, text, *at),
            Command::ColorByKind { rules } => Ok(self.color_by_kind(rules)),
        }
    }

    /// Finish editing and produce the new snapshot.
    pub fn commit(self) -> Result<Model, EditError> {
        Ok(Model::try_new(self.elements)?)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Element, EditError> {
        match self.index.get(id) {
            Some(&position) => Ok(&mut self.elements[position]),
            None => Err(EditError::UnknownElement(id.to_owned())),
        }
    }

    fn require(&self, id: &ElementId) -> Result<&Element, EditError> {
        self.get(id.as_str())
            .ok_or_else(|| EditError::UnknownElement(id.to_string()))
    }

    fn insert(&mut self, element: Element) -> Result<Element, EditError> {
        if self.index.contains_key(&element.id) {
            return Err(EditError::DuplicateId(element.id));
        }
        self.index.insert(element.id.clone(), self.elements.len());
        self.elements.push(element.clone());
        Ok(element)
    }

    /// Unused id in modeler style, e.g. `Activity_1a2b3c4`.
    fn fresh_id(&self, kind: &ElementKind) -> ElementId {
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{}_{}", kind.id_prefix(), &suffix[..7]);
            if let Ok(id) = ElementId::new(candidate) {
                if !self.index.contains_key(&id) {
                    return id;
                }
            }
        }
    }

    /// Give a node a default-sized shape centered on `center`.
    fn place(&mut self, id: &ElementId, center: Point) -> Result<(), EditError> {
        let element = self.get_mut(id.as_str())?;
        if let Some((width, height)) = element.kind.default_size() {
            element.layout = Some(Layout::shape(Bounds::centered_at(center, width, height)));
        }
        Ok(())
    }

    /// Straight edge between the centers of two shapes, when both have one.
    fn straight_edge(&self, source: &ElementId, target: &ElementId) -> Option<Layout> {
        let from = self.get(source.as_str())?.layout.as_ref()?.bounds()?.center();
        let to = self.get(target.as_str())?.layout.as_ref()?.bounds()?.center();
        let mut waypoints = NonEmptyVec::new(from);
        waypoints.push(to);
        Some(Layout::edge(waypoints))
    }

    fn annotate(
        &mut self,
        target: &ElementId,
        text: &str,
        at: Point,
    ) -> Result<Vec<ElementId>, EditError> {
        let target_element = self.require(target)?;
        if !target_element.kind.is_flow_node() {
            return Err(EditError::NotAnnotatable(target_element.kind.clone()));
        }
        let parent = target_element.parent.clone();
        let mut attributes = BTreeMap::new();
        attributes.insert("text".to_owned(), AttributeValue::text(text));

        let annotation = self.create_element(ElementKind::TextAnnotation, attributes, parent)?;
        self.place(&annotation.id, at)?;
        let association = self.create_flow(
            ElementKind::Association,
            target,
            &annotation.id,
            BTreeMap::new(),
        )?;
        Ok(vec![annotation.id, association.id])
    }

    fn color_by_kind(&mut self, rules: &[ColorRule]) -> Vec<ElementId> {
        let mut touched = Vec::new();
        for element in &mut self.elements {
            let Some(rule) = rules.iter().find(|rule| rule.kind == element.kind) else {
                continue;
            };
            if let Some(layout) = element.layout.as_mut() {
                layout.style = Some(rule.style.clone());
                touched.push(element.id.clone());
            }
        }
        debug!(colored = touched.len(), "applied color rules");
        touched
    }
}

impl ModelEditor for Draft {
    fn create_element(
        &mut self,
        kind: ElementKind,
        attributes: BTreeMap<String, AttributeValue>,
        parent: Option<ElementId>,
    ) -> Result<Element, EditError> {
        if kind.is_connection() {
            return Err(EditError::IsAConnection(kind));
        }
        if let Some(parent) = &parent {
            self.require(parent)?;
        }
        let mut element = Element::new(self.fresh_id(&kind), kind);
        element.attributes = attributes;
        element.parent = parent;
        self.insert(element)
    }

    fn create_flow(
        &mut self,
        kind: ElementKind,
        source: &ElementId,
        target: &ElementId,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Result<Element, EditError> {
        if !kind.is_connection() {
            return Err(EditError::NotAConnection(kind));
        }
        let parent = self.require(source)?.parent.clone();
        self.require(target)?;

        let mut flow = Element::new(self.fresh_id(&kind), kind);
        flow.attributes = attributes;
        flow.attributes
            .insert("sourceRef".to_owned(), AttributeValue::Reference(source.clone()));
        flow.attributes
            .insert("targetRef".to_owned(), AttributeValue::Reference(target.clone()));
        flow.parent = parent;
        flow.layout = self.straight_edge(source, target);
        self.insert(flow)
    }

    fn update_attributes(&mut self, id: &ElementId, patch: AttributePatch) -> Result<(), EditError> {
        let element = self.get_mut(id.as_str())?;
        for (key, value) in patch {
            if key == crate::core::NAME.name {
                element.name = value.map(|value| match value {
                    AttributeValue::Text(text) => text,
                    other => other.to_string(),
                });
                continue;
            }
            match value {
                Some(value) => {
                    element.attributes.insert(key, value);
                }
                None => {
                    element.attributes.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn set_layout_hint(&mut self, id: &ElementId, style: Style) -> Result<(), EditError> {
        let element = self.get_mut(id.as_str())?;
        match element.layout.as_mut() {
            Some(layout) => {
                layout.style = Some(style);
                Ok(())
            }
            None => Err(EditError::NoLayout(element.id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ElementId {
        value.parse().unwrap()
    }

    fn base() -> Model {
        Model::try_new(vec![
            Element::new(id("P"), ElementKind::Process),
            Element::new(id("Task_1"), ElementKind::Task)
                .with_parent(id("P"))
                .with_layout(Layout::shape(Bounds::new(100.0, 100.0, 100.0, 80.0))),
            Element::new(id("End"), ElementKind::EndEvent).with_parent(id("P")),
        ])
        .unwrap()
    }

    #[test]
    fn created_ids_follow_kind_prefix() {
        let mut draft = Draft::new(&base());
        let task = draft
            .create_element(ElementKind::UserTask, BTreeMap::new(), Some(id("P")))
            .unwrap();
        assert!(task.id.as_str().starts_with("Activity_"));
        assert_eq!(task.id.as_str().len(), "Activity_".len() + 7);
    }

    #[test]
    fn flow_requires_existing_endpoints_and_connection_kind() {
        let mut draft = Draft::new(&base());
        assert_eq!(
            draft.create_flow(ElementKind::SequenceFlow, &id("Task_1"), &id("Nope"), BTreeMap::new()),
            Err(EditError::UnknownElement("Nope".into()))
        );
        assert_eq!(
            draft.create_flow(ElementKind::Task, &id("Task_1"), &id("End"), BTreeMap::new()),
            Err(EditError::NotAConnection(ElementKind::Task))
        );

        let flow = draft
            .create_flow(ElementKind::SequenceFlow, &id("Task_1"), &id("End"), BTreeMap::new())
            .unwrap();
        assert_eq!(flow.source_ref(), Some("Task_1"));
        assert_eq!(flow.target_ref(), Some("End"));
        assert_eq!(flow.parent, Some(id("P")));
        assert!(flow.layout.is_none(), "End has no shape to route to");
    }

    #[test]
    fn annotate_rejects_targets_that_are_not_flow_nodes() {
        let mut draft = Draft::new(&base());
        let flow = draft
            .create_flow(ElementKind::SequenceFlow, &id("Task_1"), &id("End"), BTreeMap::new())
            .unwrap();
        for (target, kind) in [(id("P"), ElementKind::Process), (flow.id, ElementKind::SequenceFlow)] {
            assert_eq!(
                draft.apply(&Command::Annotate {
                    target,
                    text: "note".into(),
                    at: Point::new(0.0, 0.0),
                }),
                Err(EditError::NotAnnotatable(kind))
            );
        }
        assert_eq!(draft.len(), 4);
    }

    #[test]
    fn annotate_adds_annotation_and_association() {
        let mut draft = Draft::new(&base());
        let created = draft
            .apply(&Command::Annotate {
                target: id("Task_1"),
                text: "needs review".into(),
                at: Point::new(500.0, 100.0),
            })
            .unwrap();
        assert_eq!(created.len(), 2);

        let annotation = draft.get(created[0].as_str()).unwrap();
        assert_eq!(annotation.kind, ElementKind::TextAnnotation);
        assert_eq!(annotation.parent, Some(id("P")));
        assert_eq!(
            annotation.layout.as_ref().and_then(Layout::bounds),
            Some(&Bounds::new(450.0, 85.0, 100.0, 30.0))
        );

        let association = draft.get(created[1].as_str()).unwrap();
        assert_eq!(association.kind, ElementKind::Association);
        assert_eq!(association.target_ref(), Some(created[0].as_str()));
        assert!(association.layout.is_some());
    }

    #[test]
    fn update_attributes_sets_and_removes() {
        let mut draft = Draft::new(&base());
        let mut patch = AttributePatch::new();
        patch.insert("name".into(), Some(AttributeValue::text("Review")));
        patch.insert("default".into(), Some(AttributeValue::Reference(id("Flow_1"))));
        draft.update_attributes(&id("Task_1"), patch).unwrap();

        let mut removal = AttributePatch::new();
        removal.insert("default".into(), None);
        draft.update_attributes(&id("Task_1"), removal).unwrap();

        let task = draft.get("Task_1").unwrap();
        assert_eq!(task.name.as_deref(), Some("Review"));
        assert!(task.attributes.is_empty());
    }

    #[test]
    fn layout_hint_needs_a_layout() {
        let mut draft = Draft::new(&base());
        assert_eq!(
            draft.set_layout_hint(&id("End"), Style::new("green", "black")),
            Err(EditError::NoLayout(id("End")))
        );
        draft
            .set_layout_hint(&id("Task_1"), Style::new("green", "black"))
            .unwrap();
    }

    #[test]
    fn color_by_kind_skips_elements_without_layout() {
        let mut draft = Draft::new(&base());
        let touched = draft
            .apply(&Command::ColorByKind {
                rules: vec![
                    ColorRule {
                        kind: ElementKind::Task,
                        style: Style::new("orange", "black"),
                    },
                    ColorRule {
                        kind: ElementKind::EndEvent,
                        style: Style::new("green", "black"),
                    },
                ],
            })
            .unwrap();
        assert_eq!(touched, [id("Task_1")]);
    }

    #[test]
    fn source_model_is_untouched() {
        let model = base();
        let mut draft = Draft::new(&model);
        draft
            .apply(&Command::Retype {
                id: id("Task_1"),
                kind: ElementKind::UserApproveTask,
            })
            .unwrap();
        let edited = draft.commit().unwrap();
        assert_eq!(model.get("Task_1").unwrap().kind, ElementKind::Task);
        assert_eq!(edited.get("Task_1").unwrap().kind, ElementKind::UserApproveTask);
    }
}
