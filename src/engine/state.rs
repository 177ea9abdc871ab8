use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::model::filter::{ViewFilter, select_visible};
use crate::model::todo::Todo;

/// Engine lifecycle: one initial fetch, then ready for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// Canonical list state, owned exclusively by the engine.
///
/// Invariants:
/// - `items` holds no duplicate ids, in insertion order
/// - `pending` only contains ids currently present in `items`
/// - at most one in-flight mutating operation per id (`pending` is the lock)
/// - `global_loading` covers only the initial fetch and add; per-item
///   operations use `pending`
#[derive(Debug, Default)]
pub struct ListState {
    pub items: Vec<Todo>,
    pub phase: Phase,
    pub global_loading: bool,
    pub global_error: Option<String>,
    pub pending: HashSet<i64>,
    pub item_errors: BTreeMap<i64, String>,
    pub filter: ViewFilter,
    /// Set when the owning view is torn down; late resolutions must not
    /// mutate a discarded state
    pub closed: bool,
}

impl ListState {
    pub fn contains(&self, id: i64) -> bool {
        self.items.iter().any(|t| t.id == id)
    }

    /// Reconcile a confirmed server response into the matching slot.
    pub fn replace_item(&mut self, updated: Todo) {
        match self.items.iter_mut().find(|t| t.id == updated.id) {
            Some(slot) => *slot = updated,
            None => warn!(id = updated.id, "server returned an unknown todo, dropping"),
        }
    }

    pub fn remove_item(&mut self, id: i64) {
        self.items.retain(|t| t.id != id);
        self.pending.remove(&id);
        self.item_errors.remove(&id);
    }

    /// Append, refusing duplicate ids so the no-duplicates invariant holds
    /// even against a misbehaving server.
    pub fn append_item(&mut self, todo: Todo) {
        if self.contains(todo.id) {
            warn!(id = todo.id, "server returned a duplicate id, replacing in place");
            self.replace_item(todo);
        } else {
            self.items.push(todo);
        }
    }
}

/// What the rendering layer consumes each frame.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    /// Visible subset of the canonical list, filter applied, order kept
    pub items: Vec<Todo>,
    pub filter: ViewFilter,
    pub global_loading: bool,
    pub global_error: Option<String>,
    /// Ids with a mutation in flight (sorted for stable output)
    pub pending: Vec<i64>,
    /// Last failure per id, cleared when the next operation on it starts
    pub item_errors: BTreeMap<i64, String>,
}

impl ViewState {
    pub fn from_state(state: &ListState) -> Self {
        let mut pending: Vec<i64> = state.pending.iter().copied().collect();
        pending.sort_unstable();
        ViewState {
            items: select_visible(&state.items, state.filter),
            filter: state.filter,
            global_loading: state.global_loading,
            global_error: state.global_error.clone(),
            pending,
            item_errors: state.item_errors.clone(),
        }
    }
}
