use std::collections::BTreeMap;

use bpmn_diff::{
    core::{Bounds, Element, ElementKind, FieldType, Layout, Model, NAME},
    AttributeValue, DiffOptions, Differ, ElementId,
};
use proptest::prelude::*;

fn id(value: &str) -> ElementId {
    value.parse().unwrap()
}

fn kind_strategy() -> impl Strategy<Value = ElementKind> {
    proptest::sample::select(vec![
        ElementKind::Task,
        ElementKind::UserTask,
        ElementKind::ServiceTask,
        ElementKind::ExclusiveGateway,
        ElementKind::StartEvent,
        ElementKind::EndEvent,
        ElementKind::SequenceFlow,
    ])
}

/// An id among the first few elements, stored either as text or as a reference.
fn reference_strategy() -> impl Strategy<Value = AttributeValue> {
    (0u8..4, any::<bool>()).prop_map(|(target, as_text)| {
        let target = format!("E{target}");
        if as_text {
            AttributeValue::Text(target)
        } else {
            AttributeValue::Reference(id(&target))
        }
    })
}

/// Optional values for each registered field of `kind`, plus one
/// attribute no kind registers.
fn attributes_strategy(kind: &ElementKind) -> impl Strategy<Value = BTreeMap<String, AttributeValue>> {
    let mut entries: Vec<BoxedStrategy<Option<(String, AttributeValue)>>> = kind
        .fields()
        .iter()
        .filter(|spec| spec.name != NAME.name)
        .map(|spec| {
            let field = spec.name.to_owned();
            let value = match spec.ty {
                FieldType::Reference => reference_strategy().boxed(),
                FieldType::Flag => any::<bool>().prop_map(AttributeValue::Bool).boxed(),
                FieldType::Scalar => "[a-z]{1,6}".prop_map(AttributeValue::Text).boxed(),
            };
            proptest::option::of(value.prop_map(move |value| (field.clone(), value))).boxed()
        })
        .collect();
    entries.push(
        proptest::option::of(
            "[a-z]{1,6}".prop_map(|value| ("customProperty".to_owned(), AttributeValue::Text(value))),
        )
        .boxed(),
    );
    entries.prop_map(|entries| entries.into_iter().flatten().collect())
}

fn element_strategy(index: usize) -> impl Strategy<Value = Element> {
    kind_strategy()
        .prop_flat_map(|kind| {
            (
                Just(kind.clone()),
                attributes_strategy(&kind),
                proptest::option::of("[a-z ]{1,12}"),
                proptest::option::of(0u8..3),
                proptest::option::of((0i32..50, 0i32..50)),
            )
        })
        .prop_map(move |(kind, attributes, name, parent, position)| {
            let mut element = Element::new(id(&format!("E{index}")), kind);
            element.attributes = attributes;
            element.name = name;
            element.parent = parent.map(|p| id(&format!("Lane_{p}")));
            element.layout = position.map(|(x, y)| {
                Layout::shape(Bounds::new(f64::from(x) * 10.0, f64::from(y) * 10.0, 100.0, 80.0))
            });
            element
        })
}

/// Elements keyed by their index, so ids are unique by construction.
fn elements_strategy() -> impl Strategy<Value = BTreeMap<usize, Element>> {
    proptest::collection::btree_set(0usize..60, 0..30).prop_flat_map(|indices| {
        indices
            .into_iter()
            .map(|index| element_strategy(index).prop_map(move |element| (index, element)))
            .collect::<Vec<_>>()
            .prop_map(|pairs| pairs.into_iter().collect::<BTreeMap<_, _>>())
    })
}

fn model(elements: &BTreeMap<usize, Element>) -> Model {
    Model::try_new(elements.values().cloned().collect()).unwrap()
}

proptest! {
    #[test]
    fn diff_with_itself_is_empty(elements in elements_strategy()) {
        let model = model(&elements);
        let report = bpmn_diff::diff(&model, &model).unwrap();
        prop_assert!(report.is_empty());
    }

    #[test]
    fn added_and_removed_mirror_each_other(
        old in elements_strategy(),
        new in elements_strategy(),
    ) {
        let (old, new) = (model(&old), model(&new));
        let forward = bpmn_diff::diff(&old, &new).unwrap();
        let backward = bpmn_diff::diff(&new, &old).unwrap();
        prop_assert_eq!(&forward.added, &backward.removed);
        prop_assert_eq!(&forward.removed, &backward.added);
        prop_assert_eq!(forward.retyped.len(), backward.retyped.len());
        prop_assert_eq!(&forward.layout_changed, &backward.layout_changed);

        let fields = |report: &bpmn_diff::ChangeReport| {
            report
                .changed
                .iter()
                .map(|change| (change.id.clone(), change.field.clone()))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(fields(&forward), fields(&backward));
    }

    #[test]
    fn changes_only_name_registered_fields(
        old in elements_strategy(),
        new in elements_strategy(),
    ) {
        let (old, new) = (model(&old), model(&new));
        let report = bpmn_diff::diff(&old, &new).unwrap();
        for change in &report.changed {
            let kind = &old.get(change.id.as_str()).unwrap().kind;
            prop_assert!(kind.field(&change.field).is_some(), "{} on {}", change.field, kind);
            prop_assert_ne!(change.field.as_str(), "customProperty");
            prop_assert_ne!(&change.old_value, &change.new_value);
        }
    }

    #[test]
    fn parallel_matches_sequential(
        old in elements_strategy(),
        new in elements_strategy(),
    ) {
        let (old, new) = (model(&old), model(&new));
        let sequential = Differ::new(DiffOptions::sequential()).diff(&old, &new).unwrap();
        let parallel = Differ::new(DiffOptions::parallel()).diff(&old, &new).unwrap();
        prop_assert_eq!(sequential.to_json().unwrap(), parallel.to_json().unwrap());
    }

    #[test]
    fn element_order_does_not_change_the_report(
        old in elements_strategy(),
        new in elements_strategy(),
    ) {
        let reversed = Model::try_new(new.values().rev().cloned().collect()).unwrap();
        let old = model(&old);
        let report = bpmn_diff::diff(&old, &model(&new)).unwrap();
        let reordered = bpmn_diff::diff(&old, &reversed).unwrap();
        prop_assert_eq!(report, reordered);
    }

    #[test]
    fn retyped_elements_report_no_field_changes(
        old in elements_strategy(),
        new in elements_strategy(),
    ) {
        let report = bpmn_diff::diff(&model(&old), &model(&new)).unwrap();
        for retype in &report.retyped {
            prop_assert_ne!(&retype.old_kind, &retype.new_kind);
            prop_assert_eq!(report.changes_for(retype.id.as_str()).count(), 0);
        }
    }

    #[test]
    fn reported_ids_exist_on_the_right_side(
        old in elements_strategy(),
        new in elements_strategy(),
    ) {
        let (old, new) = (model(&old), model(&new));
        let report = bpmn_diff::diff(&old, &new).unwrap();
        for added in &report.added {
            prop_assert!(new.contains(added.as_str()) && !old.contains(added.as_str()));
        }
        for removed in &report.removed {
            prop_assert!(old.contains(removed.as_str()) && !new.contains(removed.as_str()));
        }
        for change in &report.changed {
            prop_assert!(old.contains(change.id.as_str()) && new.contains(change.id.as_str()));
        }
    }

    #[test]
    fn reference_and_text_forms_compare_equal(target in "[A-Za-z][A-Za-z0-9_]{0,10}") {
        let flow = |value: AttributeValue| {
            Element::new(id("Flow_1"), ElementKind::SequenceFlow).with_attribute("targetRef", value)
        };
        let old = Model::try_new(vec![flow(AttributeValue::Text(target.clone()))]).unwrap();
        let new = Model::try_new(vec![flow(AttributeValue::Reference(id(&target)))]).unwrap();
        prop_assert!(bpmn_diff::diff(&old, &new).unwrap().is_empty());
    }
}
