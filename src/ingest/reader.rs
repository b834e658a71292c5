//! Streaming reader over the BPMN XML event stream.
//!
//! Each open XML element pushes a [`Frame`] describing what its children
//! mean; closing it pops the frame and commits whatever it collected.
//! Lane membership and diagram layouts name elements by id and are resolved
//! once the whole document has been read.

use std::collections::HashMap;

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use tracing::{debug, warn};

use super::IngestionError;
use crate::{
    core::{Bounds, Definitions, Element, ElementKind, FieldType, Layout, Model, Point, Style},
    types::{AttributeValue, ElementId, NonEmptyVec},
};

/// Children of flow containers that are never elements themselves.
const NON_ELEMENT_TAGS: &[&str] = &[
    "incoming",
    "outgoing",
    "extensionElements",
    "documentation",
    "ioSpecification",
    "property",
    "dataInputAssociation",
    "dataOutputAssociation",
    "standardLoopCharacteristics",
    "multiInstanceLoopCharacteristics",
];

#[derive(Debug)]
enum Frame {
    Definitions,
    Collaboration,
    /// Process or sub-process; new flow elements are parented to it.
    Container(ElementId),
    /// Lanes created here are parented to the given container.
    LaneSet(ElementId),
    Lane(ElementId),
    FlowNodeRef {
        lane: ElementId,
        text: String,
    },
    Element(usize),
    /// Text content stored into a field of the element at `element`.
    Content {
        element: usize,
        field: &'static str,
        text: String,
    },
    Diagram,
    Shape,
    Edge,
    Label,
    Skip,
}

/// Diagram-interchange entry being read.
#[derive(Debug, Default)]
struct DiEntry {
    target: Option<String>,
    bounds: Option<Bounds>,
    label: Option<Bounds>,
    waypoints: Vec<Point>,
    style: Option<Style>,
}

#[derive(Debug, Default)]
struct DocumentReader {
    name: Option<String>,
    target_namespace: Option<String>,
    seen_definitions: bool,
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
    stack: Vec<Frame>,
    lane_members: Vec<(ElementId, String)>,
    layouts: Vec<(String, Layout)>,
    entry: DiEntry,
}

/// Attribute of an XML element, keyed by local name.
struct RawAttribute {
    local: String,
    prefixed: bool,
    value: String,
}

pub(super) fn read(xml: &str) -> Result<Definitions, IngestionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut document = DocumentReader::default();

    loop {
        let event = reader.read_event().map_err(|source| IngestionError::Xml {
            position: reader.buffer_position(),
            source,
        })?;
        match event {
            Event::Start(start) => {
                let frame = document.open(&start)?;
                document.stack.push(frame);
            }
            Event::Empty(start) => {
                let frame = document.open(&start)?;
                document.close(frame);
            }
            Event::End(_) => {
                if let Some(frame) = document.stack.pop() {
                    document.close(frame);
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|source| IngestionError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                document.append_text(&text);
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                document.append_text(&String::from_utf8_lossy(&bytes));
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    document.finish()
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn attributes(start: &BytesStart<'_>) -> Result<Vec<RawAttribute>, IngestionError> {
    let mut collected = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let value = attribute
            .unescape_value()
            .map_err(|source| IngestionError::Xml {
                position: 0,
                source,
            })?
            .into_owned();
        collected.push(RawAttribute {
            local: String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned(),
            prefixed: attribute.key.prefix().is_some(),
            value,
        });
    }
    Ok(collected)
}

fn find<'a>(attributes: &'a [RawAttribute], local: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attribute| attribute.local == local)
        .map(|attribute| attribute.value.as_str())
}

/// A finite number; `NaN` and infinities are rejected along with non-numbers.
fn coordinate(attributes: &[RawAttribute], name: &str) -> Result<f64, IngestionError> {
    let value = find(attributes, name).unwrap_or_default();
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| IngestionError::InvalidCoordinate {
            attribute: name.to_owned(),
            value: value.to_owned(),
        })
}

fn bounds(start: &BytesStart<'_>) -> Result<Bounds, IngestionError> {
    let attributes = attributes(start)?;
    Ok(Bounds::new(
        coordinate(&attributes, "x")?,
        coordinate(&attributes, "y")?,
        coordinate(&attributes, "width")?,
        coordinate(&attributes, "height")?,
    ))
}

/// Colors written by modelers on shapes and edges (`bioc:` or `color:` namespaces).
fn style(attributes: &[RawAttribute]) -> Option<Style> {
    let fill = find(attributes, "fill").or_else(|| find(attributes, "background-color"));
    let stroke = find(attributes, "stroke").or_else(|| find(attributes, "border-color"));
    if fill.is_none() && stroke.is_none() {
        return None;
    }
    Some(Style {
        fill: fill.map(str::to_owned),
        stroke: stroke.map(str::to_owned),
    })
}

fn typed_value(kind: &ElementKind, name: &str, value: String) -> AttributeValue {
    match kind.field(name).map(|spec| spec.ty) {
        Some(FieldType::Reference) => match ElementId::new(value) {
            Ok(id) => AttributeValue::Reference(id),
            Err(_) => AttributeValue::Text(String::new()),
        },
        Some(FieldType::Flag) => match value.as_str() {
            "true" => AttributeValue::Bool(true),
            "false" => AttributeValue::Bool(false),
            _ => AttributeValue::Text(value),
        },
        Some(FieldType::Scalar) | None => AttributeValue::Text(value),
    }
}

impl DocumentReader {
    fn open(&mut self, start: &BytesStart<'_>) -> Result<Frame, IngestionError> {
        let tag = local_name(start);
        let Some(top) = self.stack.last() else {
            return self.open_root(start, tag);
        };

        let frame = match top {
            Frame::Skip | Frame::FlowNodeRef { .. } | Frame::Content { .. } => Frame::Skip,
            Frame::Definitions => match tag.as_str() {
                "process" => {
                    let id = self.push_element(start, &tag, None)?;
                    id.map_or(Frame::Skip, Frame::Container)
                }
                "collaboration" => Frame::Collaboration,
                "BPMNDiagram" => Frame::Diagram,
                _ => self.open_element(start, &tag, None)?,
            },
            Frame::Collaboration => self.open_element(start, &tag, None)?,
            Frame::Container(container) => {
                let container = container.clone();
                match tag.as_str() {
                    "laneSet" => Frame::LaneSet(container),
                    tag if ElementKind::from_tag(tag).is_sub_process() => {
                        let id = self.push_element(start, tag, Some(container))?;
                        id.map_or(Frame::Skip, Frame::Container)
                    }
                    tag if NON_ELEMENT_TAGS.contains(&tag) => Frame::Skip,
                    _ => self.open_element(start, &tag, Some(container))?,
                }
            }
            Frame::LaneSet(parent) => {
                if tag == "lane" {
                    let parent = parent.clone();
                    let id = self.push_element(start, &tag, Some(parent))?;
                    id.map_or(Frame::Skip, Frame::Lane)
                } else {
                    Frame::Skip
                }
            }
            Frame::Lane(lane) => match tag.as_str() {
                "flowNodeRef" => Frame::FlowNodeRef {
                    lane: lane.clone(),
                    text: String::new(),
                },
                "childLaneSet" => Frame::LaneSet(lane.clone()),
                _ => Frame::Skip,
            },
            Frame::Element(element) => {
                let element = *element;
                self.open_child(start, &tag, element)?
            }
            Frame::Diagram => match tag.as_str() {
                "BPMNPlane" => Frame::Diagram,
                "BPMNShape" | "BPMNEdge" => {
                    let attributes = attributes(start)?;
                    self.entry = DiEntry {
                        target: find(&attributes, "bpmnElement").map(str::to_owned),
                        style: style(&attributes),
                        ..DiEntry::default()
                    };
                    if tag == "BPMNShape" {
                        Frame::Shape
                    } else {
                        Frame::Edge
                    }
                }
                _ => Frame::Skip,
            },
            Frame::Shape => match tag.as_str() {
                "Bounds" => {
                    self.entry.bounds = Some(bounds(start)?);
                    Frame::Skip
                }
                "BPMNLabel" => Frame::Label,
                _ => Frame::Skip,
            },
            Frame::Edge => match tag.as_str() {
                "waypoint" => {
                    let attributes = attributes(start)?;
                    self.entry.waypoints.push(Point::new(
                        coordinate(&attributes, "x")?,
                        coordinate(&attributes, "y")?,
                    ));
                    Frame::Skip
                }
                "BPMNLabel" => Frame::Label,
                _ => Frame::Skip,
            },
            Frame::Label => {
                if tag == "Bounds" {
                    self.entry.label = Some(bounds(start)?);
                }
                Frame::Skip
            }
        };
        Ok(frame)
    }

    fn open_root(&mut self, start: &BytesStart<'_>, tag: String) -> Result<Frame, IngestionError> {
        if tag != "definitions" || self.seen_definitions {
            return Err(IngestionError::NotDefinitions(tag));
        }
        let attributes = attributes(start)?;
        self.name = find(&attributes, "name").map(str::to_owned);
        self.target_namespace = find(&attributes, "targetNamespace")
            .filter(|namespace| !namespace.is_empty())
            .map(str::to_owned);
        self.seen_definitions = true;
        Ok(Frame::Definitions)
    }

    fn open_element(
        &mut self,
        start: &BytesStart<'_>,
        tag: &str,
        parent: Option<ElementId>,
    ) -> Result<Frame, IngestionError> {
        let pushed = self.push_element(start, tag, parent)?;
        Ok(match pushed {
            Some(_) => Frame::Element(self.elements.len() - 1),
            None => Frame::Skip,
        })
    }

    /// Child of a non-container element.
    ///
    /// Known element tags, and tags carrying an id inside an element of
    /// unknown kind, are nested elements parented to it. Anything else is
    /// read as content.
    fn open_child(
        &mut self,
        start: &BytesStart<'_>,
        tag: &str,
        element: usize,
    ) -> Result<Frame, IngestionError> {
        let child = ElementKind::from_tag(tag);
        let parent_unknown = matches!(self.elements[element].kind, ElementKind::Unknown(_));
        let nested = !matches!(child, ElementKind::Unknown(_))
            || (parent_unknown && find(&attributes(start)?, "id").is_some());
        if !nested {
            return Ok(self.open_content(element, tag));
        }

        let parent = self.elements[element].id.clone();
        if parent_unknown {
            warn!(%parent, tag, "reading element nested in an element of unknown kind");
        }
        if child.is_sub_process() {
            let id = self.push_element(start, tag, Some(parent))?;
            return Ok(id.map_or(Frame::Skip, Frame::Container));
        }
        self.open_element(start, tag, Some(parent))
    }

    /// Children of a flow element that carry part of its content.
    fn open_content(&mut self, element: usize, tag: &str) -> Frame {
        let field = match tag {
            "conditionExpression" => "conditionExpression",
            "text" => "text",
            "script" => "script",
            tag if tag.ends_with("EventDefinition") => {
                self.elements[element]
                    .attributes
                    .insert("eventDefinition".to_owned(), AttributeValue::text(tag));
                return Frame::Skip;
            }
            _ => return Frame::Skip,
        };
        Frame::Content {
            element,
            field,
            text: String::new(),
        }
    }

    /// Create an element from its start tag.
    ///
    /// Returns `None` for id-less tags of unknown kind, which are skipped
    /// together with their children.
    fn push_element(
        &mut self,
        start: &BytesStart<'_>,
        tag: &str,
        parent: Option<ElementId>,
    ) -> Result<Option<ElementId>, IngestionError> {
        let attributes = attributes(start)?;
        let mut kind = ElementKind::from_tag(tag);

        let id = match find(&attributes, "id").map(ElementId::new) {
            Some(Ok(id)) => id,
            Some(Err(_)) => return Err(IngestionError::MissingId { tag: tag.to_owned() }),
            None if matches!(kind, ElementKind::Unknown(_)) => {
                debug!(tag, "skipping element without id");
                return Ok(None);
            }
            None => return Err(IngestionError::MissingId { tag: tag.to_owned() }),
        };

        let mut retyped = false;
        if kind == ElementKind::Task {
            let declared = attributes
                .iter()
                .find(|attribute| attribute.local == "type" && !attribute.prefixed)
                .map(|attribute| ElementKind::from_type_name(&attribute.value));
            if let Some(declared) = declared.filter(ElementKind::is_task) {
                kind = declared;
                retyped = true;
            }
        }

        let mut element = Element::new(id.clone(), kind);
        element.parent = parent;
        for attribute in attributes {
            match attribute.local.as_str() {
                "id" => {}
                "name" => element.name = Some(attribute.value),
                "type" if retyped && !attribute.prefixed => {}
                _ => {
                    let value = typed_value(&element.kind, &attribute.local, attribute.value);
                    element.attributes.insert(attribute.local, value);
                }
            }
        }

        if self.index.insert(id.clone(), self.elements.len()).is_some() {
            return Err(IngestionError::DuplicateId(id));
        }
        self.elements.push(element);
        Ok(Some(id))
    }

    fn append_text(&mut self, content: &str) {
        match self.stack.last_mut() {
            Some(Frame::Content { text, .. } | Frame::FlowNodeRef { text, .. }) => {
                text.push_str(content);
            }
            _ => {}
        }
    }

    fn close(&mut self, frame: Frame) {
        match frame {
            Frame::Content {
                element,
                field,
                text,
            } => {
                let text = text.trim();
                if !text.is_empty() {
                    let element = &mut self.elements[element];
                    let value = typed_value(&element.kind, field, text.to_owned());
                    element.attributes.insert(field.to_owned(), value);
                }
            }
            Frame::FlowNodeRef { lane, text } => {
                let member = text.trim();
                if !member.is_empty() {
                    self.lane_members.push((lane, member.to_owned()));
                }
            }
            Frame::Shape => {
                let entry = std::mem::take(&mut self.entry);
                self.commit_layout(entry, false);
            }
            Frame::Edge => {
                let entry = std::mem::take(&mut self.entry);
                self.commit_layout(entry, true);
            }
            _ => {}
        }
    }

    fn commit_layout(&mut self, entry: DiEntry, is_edge: bool) {
        let Some(target) = entry.target else {
            debug!("diagram element without bpmnElement");
            return;
        };
        let layout = if is_edge {
            NonEmptyVec::from_vec(entry.waypoints).map(Layout::edge)
        } else {
            entry.bounds.map(Layout::shape)
        };
        let Some(mut layout) = layout else {
            debug!(%target, "diagram element without geometry");
            return;
        };
        if let Some(label) = entry.label {
            layout = layout.with_label(label);
        }
        layout.style = entry.style;
        self.layouts.push((target, layout));
    }

    fn finish(mut self) -> Result<Definitions, IngestionError> {
        if !self.seen_definitions {
            return Err(IngestionError::Empty);
        }

        for (lane, member) in std::mem::take(&mut self.lane_members) {
            match self.index.get(member.as_str()) {
                Some(&position) => self.elements[position].parent = Some(lane),
                None => warn!(%lane, %member, "lane refers to unknown flow node"),
            }
        }

        for (target, layout) in std::mem::take(&mut self.layouts) {
            match self.index.get(target.as_str()) {
                Some(&position) => self.elements[position].layout = Some(layout),
                None => warn!(%target, "diagram element refers to unknown element"),
            }
        }

        let model = Model::try_new(self.elements).map_err(|violation| match violation {
            crate::core::InvariantViolation::DuplicateId(id) => IngestionError::DuplicateId(id),
        })?;
        Ok(Definitions {
            name: self.name,
            target_namespace: self.target_namespace,
            model,
        })
    }
}
