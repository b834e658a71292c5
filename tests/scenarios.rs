use std::path::{Path, PathBuf};

use bpmn_diff::{
    check::{dangling_references, FlowGraph},
    core::{Bounds, Element, ElementKind, Layout, Model},
    diff::{render_summary, FieldChange, Relocation, Retype},
    ingest::{self, IngestOptions},
    AttributeValue, DiffOptions, Differ, ElementId,
};

fn id(value: &str) -> ElementId {
    value.parse().unwrap()
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load(name: &str) -> Model {
    ingest::from_path(&fixture(name), IngestOptions::default())
        .unwrap()
        .into_model()
}

/// Start -> Task1 -> End with flows flow1 and flow2.
fn linear_process() -> Vec<Element> {
    vec![
        Element::new(id("P"), ElementKind::Process),
        Element::new(id("Start"), ElementKind::StartEvent)
            .with_parent(id("P"))
            .with_layout(Layout::shape(Bounds::new(100.0, 100.0, 36.0, 36.0))),
        Element::new(id("Task1"), ElementKind::Task)
            .with_name("Scan QR code")
            .with_parent(id("P"))
            .with_layout(Layout::shape(Bounds::new(200.0, 100.0, 100.0, 80.0))),
        Element::new(id("End"), ElementKind::EndEvent)
            .with_parent(id("P"))
            .with_layout(Layout::shape(Bounds::new(400.0, 100.0, 36.0, 36.0))),
        Element::new(id("flow1"), ElementKind::SequenceFlow)
            .with_parent(id("P"))
            .with_attribute("sourceRef", id("Start"))
            .with_attribute("targetRef", id("Task1")),
        Element::new(id("flow2"), ElementKind::SequenceFlow)
            .with_parent(id("P"))
            .with_attribute("sourceRef", id("Task1"))
            .with_attribute("targetRef", id("End")),
    ]
}

fn replace(elements: &mut [Element], replacement: Element) {
    let slot = elements
        .iter_mut()
        .find(|element| element.id == replacement.id)
        .unwrap();
    *slot = replacement;
}

#[test]
fn retyped_task_reports_only_the_retype() {
    let old = Model::try_new(linear_process()).unwrap();
    let mut elements = linear_process();
    let mut approval = old.get("Task1").unwrap().clone();
    approval.kind = ElementKind::UserApproveTask;
    replace(&mut elements, approval);
    let new = Model::try_new(elements).unwrap();

    let report = bpmn_diff::diff(&old, &new).unwrap();

    assert_eq!(
        report.retyped,
        [Retype {
            id: id("Task1"),
            old_kind: ElementKind::Task,
            new_kind: ElementKind::UserApproveTask,
        }]
    );
    assert!(report.added.is_empty());
    assert!(report.removed.is_empty());
    assert!(report.changed.is_empty());
    assert!(report.moved.is_empty());
    assert!(report.layout_changed.is_empty());
}

#[test]
fn removal_leaves_dangling_flow_untouched() {
    let old = Model::try_new(linear_process()).unwrap();
    let new = Model::try_new(
        linear_process()
            .into_iter()
            .filter(|element| !matches!(element.id.as_str(), "Task1" | "flow2"))
            .collect(),
    )
    .unwrap();

    let report = bpmn_diff::diff(&old, &new).unwrap();

    assert_eq!(report.removed, [id("Task1"), id("flow2")]);
    assert!(report.added.is_empty());
    assert!(report.changed.is_empty());
    assert!(report.retyped.is_empty());

    let dangling = dangling_references(&new);
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].element, id("flow1"));
    assert_eq!(dangling[0].target, "Task1");
}

#[test]
fn bounds_shift_is_layout_only() {
    let old = Model::try_new(linear_process()).unwrap();
    let mut elements = linear_process();
    let shifted = old
        .get("Task1")
        .unwrap()
        .clone()
        .with_layout(Layout::shape(Bounds::new(200.0, 200.0, 100.0, 80.0)));
    replace(&mut elements, shifted);
    let new = Model::try_new(elements).unwrap();

    let report = bpmn_diff::diff(&old, &new).unwrap();

    assert_eq!(report.layout_changed, [id("Task1")]);
    assert!(report.changed.is_empty());
    assert!(!report.has_semantic_changes());
    assert!(report.semantic_view().is_empty());
}

fn wide_model(count: usize, renamed_every: usize, reversed: bool) -> Model {
    let mut elements = vec![Element::new(id("P"), ElementKind::Process)];
    for index in 0..count {
        let name = if renamed_every > 0 && index % renamed_every == 0 {
            format!("renamed {index}")
        } else {
            format!("task {index}")
        };
        elements.push(
            Element::new(id(&format!("Task_{index:05}")), ElementKind::Task)
                .with_name(name)
                .with_parent(id("P")),
        );
    }
    if reversed {
        elements.reverse();
    }
    Model::try_new(elements).unwrap()
}

#[test]
fn parallel_and_sequential_reports_serialize_identically() {
    let old = wide_model(5_000, 0, false);
    let new = wide_model(5_000, 7, true);

    let sequential = Differ::new(DiffOptions::sequential()).diff(&old, &new).unwrap();
    let parallel = Differ::new(DiffOptions::parallel()).diff(&old, &new).unwrap();
    let auto = Differ::default().diff(&old, &new).unwrap();

    assert_eq!(sequential.changed.len(), 715);
    assert_eq!(sequential.to_json().unwrap(), parallel.to_json().unwrap());
    assert_eq!(sequential.to_json().unwrap(), auto.to_json().unwrap());
}

#[test]
fn added_and_removed_swap_when_inputs_swap() {
    let old = Model::try_new(linear_process()).unwrap();
    let mut elements = linear_process();
    elements.retain(|element| element.id.as_str() != "End");
    elements.push(Element::new(id("Gateway_1"), ElementKind::ExclusiveGateway).with_parent(id("P")));
    let new = Model::try_new(elements).unwrap();

    let forward = bpmn_diff::diff(&old, &new).unwrap();
    let backward = bpmn_diff::diff(&new, &old).unwrap();

    assert_eq!(forward.added, backward.removed);
    assert_eq!(forward.removed, backward.added);
    assert_eq!(forward.added, [id("Gateway_1")]);
}

#[test]
fn only_registered_fields_are_compared() {
    let old = Model::try_new(linear_process()).unwrap();
    let mut elements = linear_process();
    let task = old
        .get("Task1")
        .unwrap()
        .clone()
        .with_attribute("customProperty", "anything")
        .with_attribute("default", id("flow2"));
    replace(&mut elements, task);
    let new = Model::try_new(elements).unwrap();

    let report = bpmn_diff::diff(&old, &new).unwrap();

    assert_eq!(
        report.changed,
        [FieldChange {
            id: id("Task1"),
            field: "default".into(),
            old_value: None,
            new_value: Some(AttributeValue::Reference(id("flow2"))),
        }]
    );
}

#[test]
fn fixture_revisions_produce_expected_report() {
    let old = load("scan_v1.bpmn");
    let new = load("scan_v2.bpmn");

    let report = bpmn_diff::diff(&old, &new).unwrap();

    assert_eq!(report.added, [id("Note_1")]);
    assert_eq!(report.removed, [id("F_Yes")]);
    assert_eq!(
        report.retyped,
        [Retype {
            id: id("Scan"),
            old_kind: ElementKind::Task,
            new_kind: ElementKind::UserApproveTask,
        }]
    );
    assert_eq!(
        report.changed,
        [FieldChange {
            id: id("F_No"),
            field: "name".into(),
            old_value: Some("No".into()),
            new_value: Some("Not scanned".into()),
        }]
    );
    assert_eq!(
        report.moved,
        [Relocation {
            id: id("Open"),
            old_parent: Some(id("Lane_1")),
            new_parent: Some(id("CustomerProcess")),
        }]
    );
    assert_eq!(report.layout_changed, [id("Merge")]);

    let summary = render_summary(&report);
    assert!(summary.contains("Note_1"));
    assert!(summary.contains("userApproveTask"));
}

#[test]
fn fixture_reads_collaboration_lanes_and_layout() {
    let definitions = ingest::from_path(&fixture("scan_v1.bpmn"), IngestOptions::default()).unwrap();
    assert_eq!(definitions.name.as_deref(), Some("Scan"));
    assert_eq!(definitions.target_namespace, None);
    let processes: Vec<&str> = definitions.processes().map(|p| p.id.as_str()).collect();
    assert_eq!(processes, ["CustomerProcess"]);

    let model = &definitions.model;
    assert_eq!(model.len(), 15);
    assert_eq!(
        model.get("Customer").unwrap().kind,
        ElementKind::Participant
    );
    assert_eq!(model.get("Scan").unwrap().parent, Some(id("Lane_1")));
    assert_eq!(
        model.get("Notice").unwrap().name.as_deref(),
        Some("Notices\nQR code")
    );

    let yes = model.get("F_Yes").unwrap();
    assert_eq!(yes.source_ref(), Some("SCAN_OK"));
    assert_eq!(yes.target_ref(), Some("Merge"));
    assert!(yes.layout.is_some());
    assert!(model.get("Merge").unwrap().layout.as_ref().unwrap().bounds().is_some());

    assert!(dangling_references(model).is_empty());
    let graph = FlowGraph::new(model);
    assert_eq!(graph.flow_count(), 6);
    assert!(graph.has_cycles());
    assert!(graph.unreachable().is_empty());
}

#[test]
fn changes_inside_ad_hoc_sub_process_are_reported() {
    let document = |body: &str| {
        format!(
            r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL"><process id="P"><adHocSubProcess id="A">{body}</adHocSubProcess></process></definitions>"#
        )
    };
    let old = ingest::from_xml(&document(r#"<task id="T" name="one"/>"#))
        .unwrap()
        .into_model();
    let new = ingest::from_xml(&document(r#"<task id="T" name="two"/><task id="U"/>"#))
        .unwrap()
        .into_model();

    let report = bpmn_diff::diff(&old, &new).unwrap();

    assert_eq!(report.added, [id("U")]);
    assert_eq!(
        report.changed,
        [FieldChange {
            id: id("T"),
            field: "name".into(),
            old_value: Some("one".into()),
            new_value: Some("two".into()),
        }]
    );
    assert_eq!(new.get("U").unwrap().parent, Some(id("A")));
}

#[test]
fn non_finite_coordinates_are_rejected() {
    let xml = r#"<definitions><process id="P"><task id="T"/></process>
        <BPMNDiagram id="D"><BPMNPlane id="Plane"><BPMNShape id="T_di" bpmnElement="T">
        <Bounds x="NaN" y="0" width="100" height="80"/></BPMNShape></BPMNPlane></BPMNDiagram></definitions>"#;
    assert!(matches!(
        ingest::from_xml(xml),
        Err(bpmn_diff::IngestionError::InvalidCoordinate { .. })
    ));
}

#[test]
fn strict_ingestion_accepts_consistent_fixture() {
    let options = IngestOptions {
        strict_references: true,
    };
    assert!(ingest::from_path(&fixture("scan_v2.bpmn"), options).is_ok());
}

#[test]
fn missing_fixture_is_an_io_error() {
    let error = ingest::from_path(&fixture("absent.bpmn"), IngestOptions::default()).unwrap_err();
    assert!(matches!(error, bpmn_diff::IngestionError::Io { .. }));
}
