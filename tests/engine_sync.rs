//! Integration tests for the list synchronization engine.
//!
//! Each test wires the engine to a scripted mock gateway and drives it on a
//! current-thread runtime, so interleavings are deterministic: the mock
//! yields once before answering, which is exactly one suspension point.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use ticklist::auth::{SessionGate, StaticTokenProvider};
use ticklist::engine::{Engine, Phase};
use ticklist::model::{Todo, TodoPatch, ViewFilter};
use ticklist::remote::{SyncError, TodoGateway};

fn todo(id: i64, text: &str, is_done: bool) -> Todo {
    Todo {
        id,
        text: text.into(),
        is_done,
    }
}

/// Gateway double: records calls, answers from scripted queues, and yields
/// once per call so a second intent can arrive while the first is in flight.
#[derive(Default)]
struct MockGateway {
    calls: RefCell<Vec<String>>,
    fetch_results: RefCell<VecDeque<Result<Vec<Todo>, SyncError>>>,
    create_results: RefCell<VecDeque<Result<Todo, SyncError>>>,
    update_results: RefCell<VecDeque<Result<Todo, SyncError>>>,
    toggle_results: RefCell<VecDeque<Result<Todo, SyncError>>>,
    delete_results: RefCell<VecDeque<Result<(), SyncError>>>,
}

impl MockGateway {
    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TodoGateway for MockGateway {
    async fn fetch_all(&self) -> Result<Vec<Todo>, SyncError> {
        self.calls.borrow_mut().push("fetch_all".into());
        tokio::task::yield_now().await;
        self.fetch_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted fetch_all")
    }

    async fn create(&self, text: &str) -> Result<Todo, SyncError> {
        self.calls.borrow_mut().push(format!("create {}", text));
        tokio::task::yield_now().await;
        self.create_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted create")
    }

    async fn update(&self, id: i64, patch: TodoPatch) -> Result<Todo, SyncError> {
        self.calls
            .borrow_mut()
            .push(format!("update {} {:?}", id, patch.text));
        tokio::task::yield_now().await;
        self.update_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted update")
    }

    async fn toggle(&self, id: i64) -> Result<Todo, SyncError> {
        self.calls.borrow_mut().push(format!("toggle {}", id));
        tokio::task::yield_now().await;
        self.toggle_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted toggle")
    }

    async fn delete(&self, id: i64) -> Result<(), SyncError> {
        self.calls.borrow_mut().push(format!("delete {}", id));
        tokio::task::yield_now().await;
        self.delete_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted delete")
    }
}

async fn session(token: Option<&str>) -> Rc<SessionGate> {
    let gate = Rc::new(SessionGate::new(Rc::new(StaticTokenProvider::new(
        token.map(str::to_string),
    ))));
    gate.init().await;
    gate
}

/// Authenticated engine over a fresh mock.
async fn engine() -> (Engine, Rc<MockGateway>, Rc<SessionGate>) {
    let gateway = Rc::new(MockGateway::default());
    let gate = session(Some("tok")).await;
    (Engine::new(gateway.clone(), gate.clone()), gateway, gate)
}

/// Authenticated engine already initialized with the given items.
async fn ready_engine(items: Vec<Todo>) -> (Engine, Rc<MockGateway>, Rc<SessionGate>) {
    let (eng, gateway, gate) = engine().await;
    gateway.fetch_results.borrow_mut().push_back(Ok(items));
    eng.initialize().await.unwrap();
    (eng, gateway, gate)
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_fetch_populates_the_list() {
    let (eng, _, _) = ready_engine(vec![todo(1, "buy milk", false)]).await;

    let view = eng.snapshot();
    assert_eq!(view.items, vec![todo(1, "buy milk", false)]);
    assert!(!view.global_loading);
    assert!(view.global_error.is_none());
    assert_eq!(eng.phase(), Phase::Ready);
}

#[tokio::test]
async fn initial_fetch_failure_leaves_a_usable_errored_list() {
    let (eng, gateway, _) = engine().await;
    gateway
        .fetch_results
        .borrow_mut()
        .push_back(Err(SyncError::Transport("connection refused".into())));

    eng.initialize().await.unwrap();

    let view = eng.snapshot();
    assert!(view.items.is_empty());
    assert!(!view.global_loading);
    assert!(view.global_error.unwrap().contains("backend unreachable"));
    assert_eq!(eng.phase(), Phase::Ready);
}

#[tokio::test]
async fn initialize_is_valid_only_once() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;

    eng.initialize().await.unwrap();

    assert_eq!(gateway.calls(), vec!["fetch_all"]);
    assert_eq!(eng.snapshot().items, vec![todo(1, "a", false)]);
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_appends_the_server_assigned_todo() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "buy milk", false)]).await;
    gateway
        .create_results
        .borrow_mut()
        .push_back(Ok(todo(2, "write spec", false)));

    eng.add_todo("write spec").await.unwrap();

    let view = eng.snapshot();
    assert_eq!(
        view.items,
        vec![todo(1, "buy milk", false), todo(2, "write spec", false)]
    );
    assert!(!view.global_loading);
}

#[tokio::test]
async fn whitespace_only_add_never_reaches_the_gateway() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;

    assert_eq!(eng.add_todo("   ").await, Err(SyncError::EmptyText));

    assert_eq!(gateway.calls(), vec!["fetch_all"]);
    assert_eq!(eng.snapshot().items, vec![todo(1, "a", false)]);
}

#[tokio::test]
async fn add_trims_before_sending() {
    let (eng, gateway, _) = ready_engine(vec![]).await;
    gateway
        .create_results
        .borrow_mut()
        .push_back(Ok(todo(1, "buy milk", false)));

    eng.add_todo("  buy milk  ").await.unwrap();

    assert_eq!(gateway.calls(), vec!["fetch_all", "create buy milk"]);
}

#[tokio::test]
async fn failed_add_inserts_nothing() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
    let before = eng.snapshot().items;
    gateway
        .create_results
        .borrow_mut()
        .push_back(Err(SyncError::Remote {
            status: 500,
            message: "oops".into(),
        }));

    eng.add_todo("doomed").await.unwrap();

    let view = eng.snapshot();
    assert_eq!(view.items, before);
    assert!(!view.global_loading);
    assert!(view.global_error.unwrap().contains("500"));
}

// ---------------------------------------------------------------------------
// Toggle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_replaces_the_item_in_place() {
    let (eng, gateway, _) =
        ready_engine(vec![todo(1, "a", false), todo(2, "b", false)]).await;
    gateway
        .toggle_results
        .borrow_mut()
        .push_back(Ok(todo(1, "a", true)));

    eng.toggle_todo(1).await.unwrap();

    let view = eng.snapshot();
    assert_eq!(view.items, vec![todo(1, "a", true), todo(2, "b", false)]);
    assert!(view.pending.is_empty());
}

#[tokio::test]
async fn toggle_twice_awaited_returns_to_the_original_state() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
    gateway
        .toggle_results
        .borrow_mut()
        .extend([Ok(todo(1, "a", true)), Ok(todo(1, "a", false))]);

    eng.toggle_todo(1).await.unwrap();
    eng.toggle_todo(1).await.unwrap();

    assert_eq!(eng.snapshot().items, vec![todo(1, "a", false)]);
}

#[tokio::test]
async fn concurrent_toggle_on_the_same_id_is_rejected() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
    // only one response scripted: the rejected call must never reach it
    gateway
        .toggle_results
        .borrow_mut()
        .push_back(Ok(todo(1, "a", true)));

    let (first, second) = tokio::join!(eng.toggle_todo(1), eng.toggle_todo(1));
    first.unwrap();
    second.unwrap();

    assert_eq!(gateway.calls(), vec!["fetch_all", "toggle 1"]);
    let view = eng.snapshot();
    assert_eq!(view.items, vec![todo(1, "a", true)]);
    assert!(view.pending.is_empty());
}

#[tokio::test]
async fn concurrent_mutations_on_different_ids_proceed_independently() {
    let (eng, gateway, _) =
        ready_engine(vec![todo(1, "a", false), todo(2, "b", false)]).await;
    gateway
        .toggle_results
        .borrow_mut()
        .push_back(Ok(todo(1, "a", true)));
    gateway.delete_results.borrow_mut().push_back(Ok(()));

    let (first, second) = tokio::join!(eng.toggle_todo(1), eng.delete_todo(2));
    first.unwrap();
    second.unwrap();

    let view = eng.snapshot();
    assert_eq!(view.items, vec![todo(1, "a", true)]);
    assert!(view.pending.is_empty());
}

#[tokio::test]
async fn toggle_on_an_unknown_id_is_a_no_op() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;

    eng.toggle_todo(99).await.unwrap();

    assert_eq!(gateway.calls(), vec!["fetch_all"]);
}

#[tokio::test]
async fn toggle_failure_keeps_the_item_and_records_the_error() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
    gateway
        .toggle_results
        .borrow_mut()
        .push_back(Err(SyncError::Transport("timed out".into())));

    eng.toggle_todo(1).await.unwrap();

    let view = eng.snapshot();
    assert_eq!(view.items, vec![todo(1, "a", false)]);
    assert!(view.pending.is_empty());
    assert!(view.item_errors.get(&1).unwrap().contains("unreachable"));
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_sends_a_text_patch_and_replaces_the_item() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
    gateway
        .update_results
        .borrow_mut()
        .push_back(Ok(todo(1, "a, but better", false)));

    eng.edit_todo(1, "a, but better").await.unwrap();

    assert_eq!(
        gateway.calls(),
        vec!["fetch_all", "update 1 Some(\"a, but better\")"]
    );
    assert_eq!(eng.snapshot().items, vec![todo(1, "a, but better", false)]);
}

#[tokio::test]
async fn edit_to_empty_text_is_rejected_client_side() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;

    assert_eq!(eng.edit_todo(1, "  ").await, Err(SyncError::EmptyText));

    assert_eq!(gateway.calls(), vec!["fetch_all"]);
}

#[tokio::test]
async fn edit_failure_keeps_the_old_text() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
    gateway
        .update_results
        .borrow_mut()
        .push_back(Err(SyncError::Remote {
            status: 422,
            message: "nope".into(),
        }));

    eng.edit_todo(1, "rejected").await.unwrap();

    let view = eng.snapshot();
    assert_eq!(view.items, vec![todo(1, "a", false)]);
    assert!(view.item_errors.contains_key(&1));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_the_item_on_confirmation() {
    let (eng, gateway, _) =
        ready_engine(vec![todo(1, "a", false), todo(2, "b", true)]).await;
    gateway.delete_results.borrow_mut().push_back(Ok(()));

    eng.delete_todo(2).await.unwrap();

    let view = eng.snapshot();
    assert_eq!(view.items, vec![todo(1, "a", false)]);
    assert!(view.pending.is_empty());
}

#[tokio::test]
async fn delete_failure_keeps_the_item_and_flags_it() {
    let (eng, gateway, _) =
        ready_engine(vec![todo(1, "a", false), todo(2, "b", true)]).await;
    gateway
        .delete_results
        .borrow_mut()
        .push_back(Err(SyncError::Remote {
            status: 500,
            message: "db down".into(),
        }));

    eng.delete_todo(2).await.unwrap();

    let view = eng.snapshot();
    assert!(view.items.iter().any(|t| t.id == 2));
    assert!(!view.pending.contains(&2));
    assert!(view.item_errors.get(&2).unwrap().contains("500"));
}

// ---------------------------------------------------------------------------
// Auth gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_remote_operation_is_gated_on_the_session() {
    let gateway = Rc::new(MockGateway::default());
    let gate = session(None).await;
    let eng = Engine::new(gateway.clone(), gate);

    assert_eq!(eng.initialize().await, Err(SyncError::Auth));
    assert_eq!(eng.add_todo("x").await, Err(SyncError::Auth));
    assert_eq!(eng.toggle_todo(1).await, Err(SyncError::Auth));
    assert_eq!(eng.edit_todo(1, "x").await, Err(SyncError::Auth));
    assert_eq!(eng.delete_todo(1).await, Err(SyncError::Auth));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn set_filter_works_without_a_session() {
    let gateway = Rc::new(MockGateway::default());
    let gate = session(None).await;
    let eng = Engine::new(gateway, gate);

    eng.set_filter(ViewFilter::Active);
    assert_eq!(eng.snapshot().filter, ViewFilter::Active);
}

#[tokio::test]
async fn mid_session_token_rejection_forces_a_logout() {
    let (eng, gateway, gate) = ready_engine(vec![todo(1, "a", false)]).await;
    gateway
        .toggle_results
        .borrow_mut()
        .push_back(Err(SyncError::Auth));

    eng.toggle_todo(1).await.unwrap();

    assert!(!gate.is_authenticated());
    let view = eng.snapshot();
    assert!(view.global_error.unwrap().contains("session expired"));
    assert_eq!(view.items, vec![todo(1, "a", false)]);
}

// ---------------------------------------------------------------------------
// Filtering through the snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snapshot_applies_the_filter_without_mutating_canonical_state() {
    let (eng, _, _) = ready_engine(vec![
        todo(1, "a", false),
        todo(2, "b", true),
        todo(3, "c", false),
    ])
    .await;

    eng.set_filter(ViewFilter::Active);
    let active: Vec<i64> = eng.snapshot().items.iter().map(|t| t.id).collect();
    assert_eq!(active, vec![1, 3]);

    eng.set_filter(ViewFilter::Completed);
    let completed: Vec<i64> = eng.snapshot().items.iter().map(|t| t.id).collect();
    assert_eq!(completed, vec![2]);

    eng.set_filter(ViewFilter::All);
    assert_eq!(eng.snapshot().items.len(), 3);
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolutions_after_close_do_not_mutate_state() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
            gateway
                .toggle_results
                .borrow_mut()
                .push_back(Ok(todo(1, "a", true)));

            let inner = eng.clone();
            let handle = tokio::task::spawn_local(async move { inner.toggle_todo(1).await });
            // let the toggle reach its suspension point, then tear down
            tokio::task::yield_now().await;
            eng.close();
            handle.await.unwrap().unwrap();

            assert_eq!(eng.snapshot().items, vec![todo(1, "a", false)]);
        })
        .await;
}

#[tokio::test]
async fn operations_after_close_are_no_ops() {
    let (eng, gateway, _) = ready_engine(vec![todo(1, "a", false)]).await;
    eng.close();

    eng.toggle_todo(1).await.unwrap();
    eng.add_todo("late").await.unwrap();

    assert_eq!(gateway.calls(), vec!["fetch_all"]);
}
