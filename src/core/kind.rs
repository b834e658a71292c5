//! Closed set of element kinds and the fields each kind registers.
//!
//! The differ only ever compares the fields listed here. An attribute that a
//! kind does not register is carried on the element but never diffed, so
//! adding a field to a kind is an explicit change to this table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a registered field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free-form value compared by equality.
    Scalar,
    /// Boolean flag; ingestion parses `true`/`false`.
    Flag,
    /// Id of another element; compared by id, never dereferenced.
    Reference,
}

/// A field registered for an element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldSpec {
    const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Scalar,
        }
    }

    const fn flag(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Flag,
        }
    }

    const fn reference(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Reference,
        }
    }
}

/// Registered for every kind; stored on [`Element::name`](super::Element::name).
pub const NAME: FieldSpec = FieldSpec::scalar("name");

const DEFAULT_FLOW: FieldSpec = FieldSpec::reference("default");
const EVENT_DEFINITION: FieldSpec = FieldSpec::scalar("eventDefinition");
const GATEWAY_DIRECTION: FieldSpec = FieldSpec::scalar("gatewayDirection");
const SOURCE_REF: FieldSpec = FieldSpec::reference("sourceRef");
const TARGET_REF: FieldSpec = FieldSpec::reference("targetRef");
const MESSAGE_REF: FieldSpec = FieldSpec::reference("messageRef");
const IMPLEMENTATION: FieldSpec = FieldSpec::scalar("implementation");
const ASSIGNEE: FieldSpec = FieldSpec::scalar("assignee");
const CLASS: FieldSpec = FieldSpec::scalar("class");

const NAME_ONLY: &[FieldSpec] = &[NAME];
const START_EVENT: &[FieldSpec] = &[NAME, EVENT_DEFINITION, FieldSpec::flag("isInterrupting")];
const THROW_OR_CATCH_EVENT: &[FieldSpec] = &[NAME, EVENT_DEFINITION];
const BOUNDARY_EVENT: &[FieldSpec] = &[
    NAME,
    EVENT_DEFINITION,
    FieldSpec::reference("attachedToRef"),
    FieldSpec::flag("cancelActivity"),
];
const TASK: &[FieldSpec] = &[NAME, DEFAULT_FLOW];
const USER_TASK: &[FieldSpec] = &[
    NAME,
    DEFAULT_FLOW,
    ASSIGNEE,
    FieldSpec::scalar("candidateGroups"),
    FieldSpec::scalar("formKey"),
];
const USER_APPROVE_TASK: &[FieldSpec] = &[
    NAME,
    DEFAULT_FLOW,
    ASSIGNEE,
    FieldSpec::scalar("approvers"),
];
const SERVICE_TASK: &[FieldSpec] = &[NAME, DEFAULT_FLOW, IMPLEMENTATION, CLASS];
const SCRIPT_TASK: &[FieldSpec] = &[
    NAME,
    DEFAULT_FLOW,
    FieldSpec::scalar("scriptFormat"),
    FieldSpec::scalar("script"),
];
const MESSAGE_TASK: &[FieldSpec] = &[NAME, DEFAULT_FLOW, MESSAGE_REF];
const BUSINESS_RULE_TASK: &[FieldSpec] = &[
    NAME,
    DEFAULT_FLOW,
    IMPLEMENTATION,
    FieldSpec::scalar("decisionRef"),
];
const CALL_ACTIVITY: &[FieldSpec] = &[NAME, DEFAULT_FLOW, FieldSpec::scalar("calledElement")];
const BRANCHING_GATEWAY: &[FieldSpec] = &[NAME, DEFAULT_FLOW, GATEWAY_DIRECTION];
const SIMPLE_GATEWAY: &[FieldSpec] = &[NAME, GATEWAY_DIRECTION];
const SEQUENCE_FLOW: &[FieldSpec] = &[
    NAME,
    SOURCE_REF,
    TARGET_REF,
    FieldSpec::scalar("conditionExpression"),
    FieldSpec::flag("isImmediate"),
];
const ASSOCIATION: &[FieldSpec] = &[
    NAME,
    SOURCE_REF,
    TARGET_REF,
    FieldSpec::scalar("associationDirection"),
];
const MESSAGE_FLOW: &[FieldSpec] = &[NAME, SOURCE_REF, TARGET_REF, MESSAGE_REF];
const TEXT_ANNOTATION: &[FieldSpec] = &[
    NAME,
    FieldSpec::scalar("text"),
    FieldSpec::scalar("textFormat"),
];
const PROCESS: &[FieldSpec] = &[
    NAME,
    FieldSpec::flag("isExecutable"),
    FieldSpec::scalar("processType"),
    FieldSpec::flag("isClosed"),
    CLASS,
];
const SUB_PROCESS: &[FieldSpec] = &[NAME, FieldSpec::flag("triggeredByEvent")];
const AD_HOC_SUB_PROCESS: &[FieldSpec] = &[
    NAME,
    FieldSpec::scalar("ordering"),
    FieldSpec::flag("cancelRemainingInstances"),
];
const PARTICIPANT: &[FieldSpec] = &[NAME, FieldSpec::reference("processRef")];

/// Kind of a BPMN element.
///
/// Serialized as the BPMN tag name (`"userTask"`, `"sequenceFlow"`, ...).
/// Tags outside the known set are kept as [`ElementKind::Unknown`]; the tag
/// is part of the kind, so two different unknown tags are different kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    StartEvent,
    EndEvent,
    IntermediateCatchEvent,
    IntermediateThrowEvent,
    BoundaryEvent,
    Task,
    UserTask,
    ServiceTask,
    ScriptTask,
    SendTask,
    ReceiveTask,
    ManualTask,
    BusinessRuleTask,
    UserApproveTask,
    CallActivity,
    ExclusiveGateway,
    ParallelGateway,
    InclusiveGateway,
    EventBasedGateway,
    ComplexGateway,
    SequenceFlow,
    Association,
    MessageFlow,
    TextAnnotation,
    Process,
    SubProcess,
    AdHocSubProcess,
    Transaction,
    Lane,
    Participant,
    Unknown(String),
}

impl ElementKind {
    /// Resolve a tag name (without namespace prefix).
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "startEvent" => Self::StartEvent,
            "endEvent" => Self::EndEvent,
            "intermediateCatchEvent" => Self::IntermediateCatchEvent,
            "intermediateThrowEvent" => Self::IntermediateThrowEvent,
            "boundaryEvent" => Self::BoundaryEvent,
            "task" => Self::Task,
            "userTask" => Self::UserTask,
            "serviceTask" => Self::ServiceTask,
            "scriptTask" => Self::ScriptTask,
            "sendTask" => Self::SendTask,
            "receiveTask" => Self::ReceiveTask,
            "manualTask" => Self::ManualTask,
            "businessRuleTask" => Self::BusinessRuleTask,
            "userApproveTask" => Self::UserApproveTask,
            "callActivity" => Self::CallActivity,
            "exclusiveGateway" => Self::ExclusiveGateway,
            "parallelGateway" => Self::ParallelGateway,
            "inclusiveGateway" => Self::InclusiveGateway,
            "eventBasedGateway" => Self::EventBasedGateway,
            "complexGateway" => Self::ComplexGateway,
            "sequenceFlow" => Self::SequenceFlow,
            "association" => Self::Association,
            "messageFlow" => Self::MessageFlow,
            "textAnnotation" => Self::TextAnnotation,
            "process" => Self::Process,
            "subProcess" => Self::SubProcess,
            "adHocSubProcess" => Self::AdHocSubProcess,
            "transaction" => Self::Transaction,
            "lane" => Self::Lane,
            "participant" => Self::Participant,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Resolve a type name as written by modelers, e.g. `bpmn:UserTask`.
    ///
    /// The prefix is dropped and the first letter lower-cased before
    /// matching; `bpmn:UserApproveTask` resolves to [`ElementKind::UserApproveTask`].
    pub fn from_type_name(name: &str) -> Self {
        let local = name.rsplit(':').next().unwrap_or(name);
        let mut chars = local.chars();
        match chars.next() {
            Some(first) => Self::from_tag(&format!("{}{}", first.to_ascii_lowercase(), chars.as_str())),
            None => Self::Unknown(String::new()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::StartEvent => "startEvent",
            Self::EndEvent => "endEvent",
            Self::IntermediateCatchEvent => "intermediateCatchEvent",
            Self::IntermediateThrowEvent => "intermediateThrowEvent",
            Self::BoundaryEvent => "boundaryEvent",
            Self::Task => "task",
            Self::UserTask => "userTask",
            Self::ServiceTask => "serviceTask",
            Self::ScriptTask => "scriptTask",
            Self::SendTask => "sendTask",
            Self::ReceiveTask => "receiveTask",
            Self::ManualTask => "manualTask",
            Self::BusinessRuleTask => "businessRuleTask",
            Self::UserApproveTask => "userApproveTask",
            Self::CallActivity => "callActivity",
            Self::ExclusiveGateway => "exclusiveGateway",
            Self::ParallelGateway => "parallelGateway",
            Self::InclusiveGateway => "inclusiveGateway",
            Self::EventBasedGateway => "eventBasedGateway",
            Self::ComplexGateway => "complexGateway",
            Self::SequenceFlow => "sequenceFlow",
            Self::Association => "association",
            Self::MessageFlow => "messageFlow",
            Self::TextAnnotation => "textAnnotation",
            Self::Process => "process",
            Self::SubProcess => "subProcess",
            Self::AdHocSubProcess => "adHocSubProcess",
            Self::Transaction => "transaction",
            Self::Lane => "lane",
            Self::Participant => "participant",
            Self::Unknown(tag) => tag,
        }
    }

    /// Fields compared by the differ, in registration order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::StartEvent => START_EVENT,
            Self::EndEvent | Self::IntermediateCatchEvent | Self::IntermediateThrowEvent => {
                THROW_OR_CATCH_EVENT
            }
            Self::BoundaryEvent => BOUNDARY_EVENT,
            Self::Task | Self::ManualTask => TASK,
            Self::UserTask => USER_TASK,
            Self::UserApproveTask => USER_APPROVE_TASK,
            Self::ServiceTask => SERVICE_TASK,
            Self::ScriptTask => SCRIPT_TASK,
            Self::SendTask | Self::ReceiveTask => MESSAGE_TASK,
            Self::BusinessRuleTask => BUSINESS_RULE_TASK,
            Self::CallActivity => CALL_ACTIVITY,
            Self::ExclusiveGateway | Self::InclusiveGateway | Self::ComplexGateway => {
                BRANCHING_GATEWAY
            }
            Self::ParallelGateway | Self::EventBasedGateway => SIMPLE_GATEWAY,
            Self::SequenceFlow => SEQUENCE_FLOW,
            Self::Association => ASSOCIATION,
            Self::MessageFlow => MESSAGE_FLOW,
            Self::TextAnnotation => TEXT_ANNOTATION,
            Self::Process => PROCESS,
            Self::SubProcess | Self::Transaction => SUB_PROCESS,
            Self::AdHocSubProcess => AD_HOC_SUB_PROCESS,
            Self::Participant => PARTICIPANT,
            Self::Lane | Self::Unknown(_) => NAME_ONLY,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    pub fn is_event(&self) -> bool {
        matches!(
            self,
            Self::StartEvent
                | Self::EndEvent
                | Self::IntermediateCatchEvent
                | Self::IntermediateThrowEvent
                | Self::BoundaryEvent
        )
    }

    pub fn is_task(&self) -> bool {
        matches!(
            self,
            Self::Task
                | Self::UserTask
                | Self::ServiceTask
                | Self::ScriptTask
                | Self::SendTask
                | Self::ReceiveTask
                | Self::ManualTask
                | Self::BusinessRuleTask
                | Self::UserApproveTask
                | Self::CallActivity
        )
    }

    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            Self::ExclusiveGateway
                | Self::ParallelGateway
                | Self::InclusiveGateway
                | Self::EventBasedGateway
                | Self::ComplexGateway
        )
    }

    /// Edge-like kinds carrying `sourceRef`/`targetRef`.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::SequenceFlow | Self::Association | Self::MessageFlow)
    }

    /// Nodes that take part in the sequence-flow graph.
    pub fn is_flow_node(&self) -> bool {
        self.is_event() || self.is_task() || self.is_gateway() || self.is_sub_process()
    }

    /// Activities that hold their own flow elements.
    pub fn is_sub_process(&self) -> bool {
        matches!(self, Self::SubProcess | Self::AdHocSubProcess | Self::Transaction)
    }

    /// Prefix of generated ids, following modeler conventions (`Activity_0x1y2z3`).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            kind if kind.is_event() => "Event",
            kind if kind.is_task() => "Activity",
            kind if kind.is_gateway() => "Gateway",
            Self::SequenceFlow | Self::MessageFlow => "Flow",
            Self::Association => "Association",
            Self::TextAnnotation => "TextAnnotation",
            Self::Process => "Process",
            kind if kind.is_sub_process() => "Activity",
            Self::Lane => "Lane",
            Self::Participant => "Participant",
            _ => "Element",
        }
    }

    /// Default shape size `(width, height)` for node-like kinds.
    pub fn default_size(&self) -> Option<(f64, f64)> {
        match self {
            kind if kind.is_event() => Some((36.0, 36.0)),
            kind if kind.is_task() => Some((100.0, 80.0)),
            kind if kind.is_gateway() => Some((50.0, 50.0)),
            kind if kind.is_sub_process() => Some((350.0, 200.0)),
            Self::TextAnnotation => Some((100.0, 30.0)),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<String> for ElementKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Unknown(tag) => tag,
            known => known.tag().to_owned(),
        }
    }
}
