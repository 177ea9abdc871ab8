use async_trait::async_trait;

use crate::model::todo::{Todo, TodoPatch};
use crate::remote::error::SyncError;

/// Typed wrapper over the remote CRUD service.
///
/// Every operation requires a valid session token and performs exactly one
/// attempt; retry policy belongs to whoever drives the engine (currently
/// nobody: failures are surfaced and the user repeats the action).
#[async_trait(?Send)]
pub trait TodoGateway {
    /// Full list, in the server's creation order.
    async fn fetch_all(&self) -> Result<Vec<Todo>, SyncError>;
    /// Create from non-empty, pre-trimmed text; the server assigns the id.
    async fn create(&self, text: &str) -> Result<Todo, SyncError>;
    /// Partial update of an existing todo.
    async fn update(&self, id: i64, patch: TodoPatch) -> Result<Todo, SyncError>;
    /// Flip `is_done` on the server.
    async fn toggle(&self, id: i64) -> Result<Todo, SyncError>;
    /// Remove an existing todo.
    async fn delete(&self, id: i64) -> Result<(), SyncError>;
}
