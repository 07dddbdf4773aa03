//! End-to-end state delegation and scheduling scenarios.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value};
use weft::{
    clear_defer_hook, create, flush, set_defer_hook, Container, HostNode, StateStore,
};

fn recorder(store: &StateStore, key: &str) -> Rc<RefCell<Vec<Value>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    // The subscription stays active for the store's lifetime.
    let _ = store.on(key, move |value| sink.borrow_mut().push(value.clone()));
    seen
}

#[test]
fn child_shadows_parent_without_fan_out() {
    let parent = StateStore::new();
    parent.set("color", "blue");
    let child = StateStore::with_parent(&parent);

    assert_eq!(child.get("color"), Some(json!("blue")));

    let parent_seen = recorder(&parent, "color");
    let child_seen = recorder(&child, "color");

    child.set("color", "red");
    assert_eq!(*child_seen.borrow(), vec![json!("red")]);
    assert!(parent_seen.borrow().is_empty());
    assert_eq!(parent.get("color"), Some(json!("blue")));

    // Parent writes after shadowing do not reach the child.
    parent.set("color", "green");
    assert_eq!(child.get("color"), Some(json!("red")));
    assert_eq!(child_seen.borrow().len(), 1);
}

#[test]
fn immediate_subscriber_sees_current_value_first() {
    let store = StateStore::new();
    store.set("step", 1);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let subscription = store.on_immediate("step", move |value| sink.borrow_mut().push(value.clone()));

    store.set("step", 2);
    store.set("step", 3);
    assert_eq!(*seen.borrow(), vec![json!(1), json!(2), json!(3)]);

    subscription.dispose();
    subscription.dispose();
    store.set("step", 4);
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn nested_children_read_ancestor_state_at_first_render() {
    let app = StateStore::new();
    app.set("user", "grace");

    let tree = create(&json!({
        "type": "container",
        "children": [
            {"type": "element", "bind": "user"},
            {
                "type": "container",
                "children": [{"type": "element", "bind": "user"}],
            },
        ],
    }))
    .unwrap();
    let root = HostNode::new("body");
    tree.mount(&root, Some(&app)).unwrap();

    assert_eq!(root.text_content(), "gracegrace");

    // A write on the outer container's store shadows the app value for
    // everything below it.
    tree.state().unwrap().set("user", "linus");
    flush().unwrap();
    assert_eq!(root.text_content(), "linuslinus");
}

#[test]
fn unmounted_tree_ignores_late_writes() {
    let app = StateStore::new();
    let tree = Container::from_config(&json!({
        "type": "container",
        "children": [{"type": "element", "bind": "status"}],
    }))
    .unwrap();
    tree.mount(&HostNode::new("body"), Some(&app)).unwrap();
    let store = tree.component().state().unwrap();
    let child = tree.children()[0].clone();

    tree.unmount().unwrap();
    assert!(child.is_retired());
    assert_eq!(app.subscriber_count("status"), 0);

    // Late writes and requests are silent no-ops.
    store.set("status", "late");
    assert_eq!(store.get("status"), None);
    app.set("status", "still fine");
    tree.component().request_render();
    flush().unwrap();
}

#[test]
fn defer_hook_schedules_one_flush_per_turn() {
    let app = StateStore::new();
    let tree = create(&json!({
        "type": "container",
        "children": [
            {"type": "element", "bind": "n"},
            {"type": "element", "bind": "n"},
        ],
    }))
    .unwrap();
    let root = HostNode::new("body");
    tree.mount(&root, Some(&app)).unwrap();

    let scheduled = Rc::new(Cell::new(0));
    let counter = scheduled.clone();
    set_defer_hook(move || counter.set(counter.get() + 1));

    app.set("n", 1);
    app.set("n", 2);
    assert_eq!(scheduled.get(), 1);
    assert_eq!(root.text_content(), "");

    flush().unwrap();
    assert_eq!(root.text_content(), "22");
    clear_defer_hook();
}
