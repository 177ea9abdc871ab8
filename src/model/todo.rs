use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// A single todo item.
///
/// The wire format uses `todo` for the text field and camelCase `isDone`;
/// the serde renames must stay exactly as they are for backend compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Server-assigned for synced items, process-local for `Todo::new`
    pub id: i64,
    #[serde(rename = "todo")]
    pub text: String,
    #[serde(rename = "isDone")]
    pub is_done: bool,
}

impl Todo {
    /// Create a todo with a fresh process-local id and `is_done = false`.
    /// The text is used verbatim; trimming is the caller's responsibility.
    pub fn new(text: impl Into<String>) -> Self {
        Todo {
            id: next_local_id(),
            text: text.into(),
            is_done: false,
        }
    }
}

/// Partial update body for `PUT /todos/{id}`. Absent fields are left
/// untouched by the server, so `None` must not serialize at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodoPatch {
    #[serde(rename = "todo", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "isDone", skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl TodoPatch {
    pub fn text(text: impl Into<String>) -> Self {
        TodoPatch {
            text: Some(text.into()),
            is_done: None,
        }
    }

    pub fn done(is_done: bool) -> Self {
        TodoPatch {
            text: None,
            is_done: Some(is_done),
        }
    }
}

static NEXT_LOCAL_ID: AtomicI64 = AtomicI64::new(0);

/// Strictly increasing per-process id, seeded from the wall clock on first
/// use so locally created ids sort after anything from earlier runs.
fn next_local_id() -> i64 {
    let seed = chrono::Utc::now().timestamp_millis();
    let _ = NEXT_LOCAL_ID.compare_exchange(0, seed, Ordering::Relaxed, Ordering::Relaxed);
    NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_todo_starts_not_done() {
        let todo = Todo::new("buy milk");
        assert_eq!(todo.text, "buy milk");
        assert!(!todo.is_done);
    }

    #[test]
    fn local_ids_strictly_increase() {
        let a = Todo::new("a");
        let b = Todo::new("b");
        let c = Todo::new("c");
        assert!(a.id < b.id);
        assert!(b.id < c.id);
    }

    #[test]
    fn wire_field_names() {
        let todo = Todo {
            id: 1,
            text: "buy milk".into(),
            is_done: false,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["todo"], "buy milk");
        assert_eq!(json["isDone"], false);
        assert!(json.get("text").is_none());
    }

    #[test]
    fn wire_round_trip() {
        let parsed: Todo =
            serde_json::from_str(r#"{"id":7,"todo":"write tests","isDone":true}"#).unwrap();
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.text, "write tests");
        assert!(parsed.is_done);
    }

    #[test]
    fn patch_skips_absent_fields() {
        let json = serde_json::to_string(&TodoPatch::text("new text")).unwrap();
        assert_eq!(json, r#"{"todo":"new text"}"#);
        let json = serde_json::to_string(&TodoPatch::done(true)).unwrap();
        assert_eq!(json, r#"{"isDone":true}"#);
    }
}
