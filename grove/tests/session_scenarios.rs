//! End-to-end session scenarios: edits, lazy loading, and load races.
//!
//! Time is paused, so simulated latency advances instantly and
//! deterministically.

use std::sync::Arc;

use grove::core::algebra::locate;
use grove::load::latency::LatencyPolicy;
use grove::session::{ExpandOutcome, TreeSession};
use grove::test_support::{RecordingSource, child_ids, forest, lazy, leaf};
use grove::tree::{Forest, Node};

fn session(
    forest: Forest,
    source: &Arc<RecordingSource>,
) -> TreeSession<Arc<RecordingSource>> {
    TreeSession::with_parts(
        forest,
        Arc::clone(source),
        "n",
        LatencyPolicy::new(50, 200, 400),
    )
}

fn lazy_parent_source() -> Arc<RecordingSource> {
    Arc::new(RecordingSource::new().with(
        "p",
        vec![Node::leaf("c1", "One"), Node::lazy("c2", "Two")],
    ))
}

#[test]
fn add_child_then_move_to_root() {
    let source = Arc::new(RecordingSource::new());
    let session = session(Forest::from_nodes([Node::leaf("r1", "A")]), &source);

    let forest = session.add_child("r1", "B");
    let r1 = locate(&forest, "r1").expect("r1");
    assert_eq!(r1.has_children, Some(true));
    assert_eq!(r1.children().len(), 1);
    let generated = r1.children()[0].id.clone();
    assert_eq!(r1.children()[0].name, "B");

    let forest = session.move_node(generated.as_str(), None, 0);
    let expected = Forest::from_nodes([
        Node::leaf(generated.clone(), "B"),
        Node::with_children("r1", "A", Vec::new()),
    ]);
    assert_eq!(forest, expected);
    let r1 = locate(&forest, "r1").expect("r1");
    assert_eq!(r1.children, Some(Vec::new()));
    assert_eq!(r1.has_children, Some(false));
}

#[test]
fn move_into_descendant_leaves_forest_untouched() {
    let source = Arc::new(RecordingSource::new());
    let session = session(forest(vec![leaf("A")]), &source);
    session.add_child("A", "B");
    let b = child_ids(&session.forest(), "A").remove(0);
    session.add_child(&b, "C");
    let c = child_ids(&session.forest(), &b).remove(0);

    let before = session.forest();
    let after = session.move_node("A", Some(c.as_str()), 0);
    assert!(after.ptr_eq(&before));
}

#[tokio::test(start_paused = true)]
async fn concurrent_expands_share_one_fetch() {
    let source = lazy_parent_source();
    let session = session(forest(vec![lazy("p")]), &source);

    let (first, second) = tokio::join!(session.expand("p"), session.expand("p"));
    assert_eq!(
        first.expect("first"),
        ExpandOutcome::Loaded {
            children: 2,
            from_cache: false
        }
    );
    assert_eq!(second.expect("second"), ExpandOutcome::AlreadyLoading);
    assert_eq!(source.calls(), 1);
    assert_eq!(child_ids(&session.forest(), "p"), vec!["c1", "c2"]);
}

#[tokio::test(start_paused = true)]
async fn loading_is_observable_while_fetch_is_outstanding() {
    let source = lazy_parent_source();
    let session = session(forest(vec![lazy("p")]), &source);
    let loading = session.subscribe_loading();

    let (outcome, seen) = tokio::join!(session.expand("p"), async {
        (session.is_loading("p"), loading.borrow().contains("p"))
    });
    outcome.expect("expand");
    assert_eq!(seen, (true, true));
    assert!(!session.is_loading("p"));
}

#[tokio::test(start_paused = true)]
async fn second_expand_after_settle_does_not_refetch() {
    let source = lazy_parent_source();
    let session = session(forest(vec![lazy("p")]), &source);

    session.expand("p").await.expect("first");
    session.collapse("p");
    let outcome = session.expand("p").await.expect("second");
    assert_eq!(outcome, ExpandOutcome::Expanded);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn reinserted_node_replays_cached_children() {
    let source = lazy_parent_source();
    let session = session(forest(vec![lazy("p")]), &source);

    session.expand("p").await.expect("first");
    session.remove("p");
    assert!(session.loads().is_cached("p"));

    session.insert_node(None, 0, Node::lazy("p", "Back again"));
    let started = tokio::time::Instant::now();
    let outcome = session.expand("p").await.expect("replay");
    assert_eq!(
        outcome,
        ExpandOutcome::Loaded {
            children: 2,
            from_cache: true
        }
    );
    assert!(started.elapsed() < std::time::Duration::from_millis(200));
    assert_eq!(source.calls(), 1);
    assert_eq!(child_ids(&session.forest(), "p"), vec!["c1", "c2"]);
}

#[tokio::test(start_paused = true)]
async fn collapse_during_load_still_applies_children() {
    let source = lazy_parent_source();
    let session = session(forest(vec![lazy("p")]), &source);

    let (outcome, collapsed) =
        tokio::join!(session.expand("p"), async { session.collapse("p") });
    outcome.expect("expand");
    assert!(collapsed);
    assert!(!session.is_expanded("p"));
    assert_eq!(child_ids(&session.forest(), "p"), vec!["c1", "c2"]);
}

#[tokio::test(start_paused = true)]
async fn remove_during_load_is_not_resurrected() {
    let source = lazy_parent_source();
    let session = session(forest(vec![lazy("p"), leaf("q")]), &source);

    let (outcome, _) = tokio::join!(session.expand("p"), async { session.remove("p") });
    assert!(matches!(
        outcome.expect("expand"),
        ExpandOutcome::Loaded { .. }
    ));
    let forest = session.forest();
    assert!(locate(&forest, "p").is_none());
    assert_eq!(forest.roots().len(), 1);
    assert!(session.loads().is_cached("p"));
}

#[tokio::test(start_paused = true)]
async fn failed_load_releases_node_for_retry() {
    let source = lazy_parent_source();
    source.fail("p");
    let session = session(forest(vec![lazy("p")]), &source);

    let err = session.expand("p").await.expect_err("expected failure");
    assert!(format!("{:#}", err).contains("backend unavailable"));
    assert!(!session.is_loading("p"));
    assert!(!session.is_expanded("p"));
    assert!(locate(&session.forest(), "p").expect("p").needs_load());

    source.heal("p");
    let outcome = session.expand("p").await.expect("retry");
    assert_eq!(
        outcome,
        ExpandOutcome::Loaded {
            children: 2,
            from_cache: false
        }
    );
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn generated_ids_skip_lazily_loaded_ids() {
    let source = Arc::new(RecordingSource::new().with("p", vec![Node::leaf("n40", "Loaded")]));
    let session = session(forest(vec![lazy("p")]), &source);

    session.expand("p").await.expect("expand");
    let forest = session.add_child("p", "Fresh");
    assert_eq!(child_ids(&forest, "p"), vec!["n40", "n41"]);
}

#[tokio::test(start_paused = true)]
async fn has_children_tracks_edits() {
    let source = lazy_parent_source();
    let session = session(forest(vec![lazy("p")]), &source);
    session.expand("p").await.expect("expand");

    session.remove("c1");
    session.remove("c2");
    let p = locate(&session.forest(), "p").cloned().expect("p");
    assert_eq!(p.has_children, Some(false));

    session.add_child("p", "again");
    let p = locate(&session.forest(), "p").cloned().expect("p");
    assert_eq!(p.has_children, Some(true));
}
