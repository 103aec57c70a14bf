use ertia_core::node::{Dependency, MAX_NODE_RETRIES, Node, RetryOutcome};
use ertia_core::status::{DependencyStatus, NodeStatus};

fn node_with(dependencies: Vec<Dependency>) -> Node {
    Node {
        dependencies,
        ..Node::new()
    }
}

#[test]
fn needs_adapting_only_for_new_active_and_retrying() {
    let mut node = Node::new();

    for (status, expected) in [
        (NodeStatus::New, true),
        (NodeStatus::Active, true),
        (NodeStatus::Retrying, true),
        (NodeStatus::Deploying, false),
        (NodeStatus::Ready, false),
        (NodeStatus::Failing, false),
        (NodeStatus::Restarting, false),
        (NodeStatus::Stopped, false),
        (NodeStatus::Error, false),
        (NodeStatus::Deleted, false),
    ] {
        node.status = status;
        assert_eq!(node.needs_adapting(), expected, "status {status}");
    }
}

#[test]
fn requires_pending_dependencies() {
    for status in [
        DependencyStatus::New,
        DependencyStatus::Retrying,
        DependencyStatus::Waiting,
    ] {
        let node = node_with(vec![Dependency::new("k3s").with_status(status)]);
        assert!(node.requires("k3s"), "status {status}");
        assert!(!node.fulfils("k3s"), "status {status}");
    }
}

#[test]
fn fulfils_ready_dependencies() {
    let node = node_with(vec![
        Dependency::new("k3s").with_status(DependencyStatus::Ready),
    ]);

    assert!(node.fulfils("k3s"));
    assert!(!node.requires("k3s"));
}

#[test]
fn deploying_and_failing_are_neither_required_nor_fulfilled() {
    let node = node_with(vec![
        Dependency::new("helm").with_status(DependencyStatus::Deploying),
        Dependency::new("dns").with_status(DependencyStatus::Failing),
    ]);

    assert!(!node.requires("helm"));
    assert!(!node.fulfils("helm"));
    assert!(!node.requires("dns"));
    assert!(!node.fulfils("dns"));
}

#[test]
fn unrelated_names_resolve_to_false() {
    let node = node_with(vec![
        Dependency::new("X").with_status(DependencyStatus::New),
        Dependency::new("Z").with_status(DependencyStatus::Ready),
    ]);

    assert!(node.requires("X"));
    assert!(!node.requires("Y"));
    assert!(!node.fulfils("Y"));
}

#[test]
fn duplicate_entries_can_require_and_fulfil_at_once() {
    let node = node_with(vec![
        Dependency::new("k3s").with_status(DependencyStatus::Ready),
        Dependency::new("k3s").with_status(DependencyStatus::Waiting),
    ]);

    assert!(node.requires("k3s"));
    assert!(node.fulfils("k3s"));
    // lookup by name returns the entry inserted first
    assert_eq!(
        node.dependency("k3s").map(|d| d.status),
        Some(DependencyStatus::Ready)
    );
}

#[test]
fn retry_increments_until_cap() {
    let mut node = Node::new();

    let outcome = node.retry();

    assert_eq!(outcome, RetryOutcome::Retrying { attempt: 1 });
    assert_eq!(node.retries, 1);
    assert_eq!(node.status, NodeStatus::Retrying);
}

#[test]
fn retry_at_ten_still_retries() {
    let mut node = Node {
        retries: 10,
        ..Node::new()
    };

    let outcome = node.retry();

    assert_eq!(outcome, RetryOutcome::Retrying { attempt: 11 });
    assert_eq!(node.retries, 11);
    assert_eq!(node.status, NodeStatus::Retrying);
}

#[test]
fn retry_past_cap_marks_failing_without_incrementing() {
    let mut node = Node {
        retries: 11,
        status: NodeStatus::Retrying,
        ..Node::new()
    };

    let outcome = node.retry();

    assert_eq!(outcome, RetryOutcome::Exhausted { retries: 11 });
    assert!(outcome.is_exhausted());
    assert_eq!(node.retries, 11);
    assert_eq!(node.status, NodeStatus::Failing);

    // stays put on further calls
    node.retry();
    assert_eq!(node.retries, 11);
    assert_eq!(node.status, NodeStatus::Failing);
}

#[test]
fn retries_never_decrease_across_a_full_escalation() {
    let mut node = Node::new();
    let mut last = node.retries;

    for _ in 0..20 {
        node.retry();
        assert!(node.retries >= last);
        last = node.retries;
    }

    assert_eq!(node.retries, MAX_NODE_RETRIES + 1);
    assert_eq!(node.status, NodeStatus::Failing);
}

#[test]
fn record_failure_keeps_error_and_uses_custom_limit() {
    let mut node = Node::new();

    node.record_failure("ssh timeout", 1);
    node.record_failure("ssh timeout", 1);
    let outcome = node.record_failure("ssh refused", 1);

    assert!(outcome.is_exhausted());
    assert_eq!(node.retries, 2);
    assert_eq!(node.error, "ssh refused");
    assert_eq!(node.status, NodeStatus::Failing);
}
