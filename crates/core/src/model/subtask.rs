use serde::{Deserialize, Serialize};

use crate::model::Identified;
use crate::types::DbId;

/// A checklist item. Belongs to exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    #[serde(default)]
    pub id: DbId,
    pub description: String,
    #[serde(default)]
    pub checked: bool,
    /// Back-reference to the owning task.
    #[serde(default)]
    pub task_id: DbId,
}

impl SubTask {
    pub fn new(description: impl Into<String>, task_id: DbId) -> Self {
        Self {
            id: 0,
            description: description.into(),
            checked: false,
            task_id,
        }
    }
}

impl Identified for SubTask {
    fn id(&self) -> DbId {
        self.id
    }
}
