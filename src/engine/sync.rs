use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::auth::session::SessionGate;
use crate::engine::state::{ListState, Phase, ViewState};
use crate::model::filter::ViewFilter;
use crate::model::todo::{Todo, TodoPatch};
use crate::remote::error::SyncError;
use crate::remote::gateway::TodoGateway;

/// The list synchronization engine.
///
/// Owns the canonical list and funnels every mutation through confirmed
/// gateway responses; there are no optimistic local edits. Cheap to clone
/// (shared state cell), single-threaded: the only suspension points are the
/// gateway calls, so state borrows are never held across an await.
///
/// Error policy: pre-flight failures (`Auth` before any request is made,
/// `EmptyText` validation) are returned to the caller; in-flight gateway
/// failures are recorded as state flags and the operation returns `Ok`, so
/// nothing propagates uncaught into the rendering layer.
#[derive(Clone)]
pub struct Engine {
    state: Rc<RefCell<ListState>>,
    gateway: Rc<dyn TodoGateway>,
    session: Rc<SessionGate>,
}

impl Engine {
    pub fn new(gateway: Rc<dyn TodoGateway>, session: Rc<SessionGate>) -> Self {
        Engine {
            state: Rc::new(RefCell::new(ListState::default())),
            gateway,
            session,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn snapshot(&self) -> ViewState {
        ViewState::from_state(&self.state.borrow())
    }

    /// Pure local view change, always succeeds.
    pub fn set_filter(&self, filter: ViewFilter) {
        self.state.borrow_mut().filter = filter;
    }

    /// Tear down: late gateway resolutions must not touch state after this.
    pub fn close(&self) {
        self.state.borrow_mut().closed = true;
    }

    /// Initial full fetch. Valid only once, from `Uninitialized`; on failure
    /// the engine still becomes ready (with an empty, error-flagged list) so
    /// the view stays usable.
    pub async fn initialize(&self) -> Result<(), SyncError> {
        self.require_auth()?;
        {
            let mut st = self.state.borrow_mut();
            if st.closed {
                return Ok(());
            }
            if st.phase != Phase::Uninitialized {
                debug!("initialize called twice, ignoring");
                return Ok(());
            }
            st.phase = Phase::Loading;
            st.global_loading = true;
        }

        let result = self.gateway.fetch_all().await;

        let mut st = self.state.borrow_mut();
        if st.closed {
            return Ok(());
        }
        st.global_loading = false;
        st.phase = Phase::Ready;
        match result {
            Ok(items) => {
                st.global_error = None;
                st.items.clear();
                for todo in items {
                    st.append_item(todo);
                }
            }
            Err(err) => self.record_global(&mut st, err),
        }
        Ok(())
    }

    /// Create a todo from raw input. Whitespace-only text is rejected here,
    /// before any request. On success the server's todo (with its assigned
    /// id) is appended; on failure the list is left byte-for-byte unchanged.
    pub async fn add_todo(&self, raw_text: &str) -> Result<(), SyncError> {
        self.require_auth()?;
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(SyncError::EmptyText);
        }
        {
            let mut st = self.state.borrow_mut();
            if st.closed {
                return Ok(());
            }
            st.global_loading = true;
            st.global_error = None;
        }

        let result = self.gateway.create(text).await;

        let mut st = self.state.borrow_mut();
        if st.closed {
            return Ok(());
        }
        st.global_loading = false;
        match result {
            Ok(todo) => st.append_item(todo),
            Err(err) => self.record_global(&mut st, err),
        }
        Ok(())
    }

    /// Flip an item's done state on the server, then reconcile.
    pub async fn toggle_todo(&self, id: i64) -> Result<(), SyncError> {
        self.require_auth()?;
        if !self.begin_item(id, "toggle") {
            return Ok(());
        }
        let result = self.gateway.toggle(id).await;
        self.finish_item(id, result)
    }

    /// Change an item's text on the server, then reconcile. Callers keep
    /// their edit buffer on failure so the user can retry or cancel.
    pub async fn edit_todo(&self, id: i64, new_text: &str) -> Result<(), SyncError> {
        self.require_auth()?;
        let text = new_text.trim();
        if text.is_empty() {
            return Err(SyncError::EmptyText);
        }
        if !self.begin_item(id, "edit") {
            return Ok(());
        }
        let result = self.gateway.update(id, TodoPatch::text(text)).await;
        self.finish_item(id, result)
    }

    /// Delete an item once the server confirms.
    pub async fn delete_todo(&self, id: i64) -> Result<(), SyncError> {
        self.require_auth()?;
        if !self.begin_item(id, "delete") {
            return Ok(());
        }
        let result = self.gateway.delete(id).await;
        match result {
            Ok(()) => {
                let mut st = self.state.borrow_mut();
                if st.closed {
                    return Ok(());
                }
                st.remove_item(id);
                Ok(())
            }
            Err(err) => self.finish_item(id, Err(err)),
        }
    }

    fn require_auth(&self) -> Result<(), SyncError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(SyncError::Auth)
        }
    }

    /// Single-flight entry for per-item mutations. Returns false (no-op)
    /// when the id is unknown or already has an operation in flight.
    fn begin_item(&self, id: i64, op: &str) -> bool {
        let mut st = self.state.borrow_mut();
        if st.closed {
            return false;
        }
        if !st.contains(id) {
            debug!(id, op, "ignoring operation on unknown todo");
            return false;
        }
        if !st.pending.insert(id) {
            debug!(id, op, "operation already in flight, rejecting");
            return false;
        }
        st.item_errors.remove(&id);
        true
    }

    /// Reconcile a per-item result: clear pending, then either swap in the
    /// server's todo or record the failure against the item.
    fn finish_item(&self, id: i64, result: Result<Todo, SyncError>) -> Result<(), SyncError> {
        let mut st = self.state.borrow_mut();
        if st.closed {
            return Ok(());
        }
        st.pending.remove(&id);
        match result {
            Ok(todo) => st.replace_item(todo),
            Err(SyncError::Auth) => {
                // the backend no longer accepts the token: a session
                // problem, not an item problem
                self.session.force_logout();
                st.global_error = Some(SyncError::Auth.to_string());
            }
            Err(err) => {
                warn!(id, %err, "todo operation failed");
                st.item_errors.insert(id, err.to_string());
            }
        }
        Ok(())
    }

    /// Global-flag failure path for the initial fetch and add.
    fn record_global(&self, st: &mut ListState, err: SyncError) {
        if err == SyncError::Auth {
            self.session.force_logout();
            st.global_error = Some(SyncError::Auth.to_string());
        } else {
            warn!(%err, "list operation failed");
            st.global_error = Some(err.to_string());
        }
    }
}
