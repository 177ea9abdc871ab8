use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::todo::Todo;

/// Which subset of the list is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl ViewFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            ViewFilter::All => true,
            ViewFilter::Active => !todo.is_done,
            ViewFilter::Completed => todo.is_done,
        }
    }

    /// Cycle order for the filter tabs: all → active → completed → all
    pub fn next(self) -> ViewFilter {
        match self {
            ViewFilter::All => ViewFilter::Active,
            ViewFilter::Active => ViewFilter::Completed,
            ViewFilter::Completed => ViewFilter::All,
        }
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewFilter::All => "all",
            ViewFilter::Active => "active",
            ViewFilter::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ViewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ViewFilter::All),
            "active" => Ok(ViewFilter::Active),
            "completed" | "done" => Ok(ViewFilter::Completed),
            other => Err(format!(
                "unknown filter '{}' (expected all, active, or completed)",
                other
            )),
        }
    }
}

/// Stable, order-preserving selection of the visible subset.
pub fn select_visible(items: &[Todo], filter: ViewFilter) -> Vec<Todo> {
    items
        .iter()
        .filter(|todo| filter.matches(todo))
        .cloned()
        .collect()
}
