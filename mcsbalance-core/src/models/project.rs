//! Billing project type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A project the authenticated account has access to.
///
/// Identity is the `id`; the `title` is only a display label and is used as
/// the metric dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier (the `pid` of the API).
    pub id: String,
    /// Human-readable project title.
    pub title: String,
}

impl Project {
    /// Creates a new project.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}
