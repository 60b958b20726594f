use serde::{Deserialize, Serialize};

use crate::model::{remove_by_id, upsert_by_id, Identified, Task};
use crate::types::DbId;

/// A column of tasks. Task order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default)]
    pub id: DbId,
    pub title: String,
    /// Back-reference to the owning board.
    #[serde(default)]
    pub board_id: DbId,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(title: impl Into<String>, board_id: DbId) -> Self {
        Self {
            id: 0,
            title: title.into(),
            board_id,
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, id: DbId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains_task(&self, id: DbId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Replace the task with the same id in place, or append it.
    pub fn upsert_task(&mut self, mut task: Task) {
        task.task_list_id = self.id;
        upsert_by_id(&mut self.tasks, task);
    }

    pub fn remove_task(&mut self, id: DbId) -> Option<Task> {
        remove_by_id(&mut self.tasks, id)
    }
}

impl Identified for TaskList {
    fn id(&self) -> DbId {
        self.id
    }
}
