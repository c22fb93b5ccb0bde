//! Queue behavior exercised through the public API.

use std::collections::HashMap;

use caskade_core::queue::{self, InstallItem, ItemKind, NewItem};
use caskade_core::vars::substitute;

fn formula(name: &str) -> NewItem {
    NewItem::new(ItemKind::Formula, name)
}

fn names(queue: &[InstallItem]) -> Vec<&str> {
    queue.iter().map(|item| item.name.as_str()).collect()
}

#[test]
fn reindex_yields_contiguous_positions_in_array_order() {
    let outcome = queue::add_multiple(
        Vec::new(),
        vec![formula("a"), formula("b"), formula("c")],
    );
    let mut items = outcome.queue;
    items[0].position = Some(3);
    items[1].position = Some(1);
    items[2].position = Some(2);

    let items = queue::reindex(items);

    assert_eq!(names(&items), vec!["b", "c", "a"]);
    let positions: Vec<i64> = items.iter().filter_map(|item| item.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[test]
fn adding_the_same_formula_twice_reports_a_duplicate() {
    let outcome = queue::add(Vec::new(), formula("git"));
    let outcome = queue::add(outcome.queue, formula("git"));

    assert!(outcome.added.is_empty());
    assert_eq!(outcome.duplicates, vec!["formula:git"]);
}

#[test]
fn adding_the_same_script_twice_is_allowed() {
    let script = || {
        NewItem::new(
            ItemKind::Script {
                commands: vec!["echo hi".to_string()],
                prompt_for_input: Default::default(),
            },
            "setup",
        )
    };
    let outcome = queue::add(Vec::new(), script());
    let outcome = queue::add(outcome.queue, script());

    assert_eq!(outcome.queue.len(), 2);
    assert!(outcome.duplicates.is_empty());
    assert_ne!(outcome.queue[0].id, outcome.queue[1].id);
}

#[test]
fn move_to_front_shifts_the_rest_down() {
    let outcome = queue::add_multiple(
        Vec::new(),
        vec![formula("a"), formula("b"), formula("c")],
    );

    let items = queue::move_item(outcome.queue, "formula:c", 1);

    assert_eq!(names(&items), vec!["c", "a", "b"]);
    let positions: Vec<i64> = items.iter().filter_map(|item| item.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[test]
fn merge_with_nothing_new_returns_existing_as_is() {
    let existing = queue::add_multiple(Vec::new(), vec![formula("a"), formula("b")]).queue;
    let snapshot = existing.clone();

    let merged = queue::merge(existing, Vec::new());
    assert_eq!(merged, snapshot);

    let merged = queue::merge(merged, snapshot.clone());
    assert_eq!(merged, snapshot);
}

#[test]
fn substitute_replaces_known_and_keeps_unknown_tokens() {
    let values = HashMap::from([("x".to_string(), "hi".to_string())]);

    assert_eq!(substitute("echo {{x}}", &values), "echo hi");
    assert_eq!(substitute("echo {{y}}", &HashMap::new()), "echo {{y}}");
}
