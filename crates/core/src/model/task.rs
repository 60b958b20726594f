use serde::{Deserialize, Serialize};

use crate::model::{
    insert_relative, remove_by_id, upsert_by_id, Identified, Placement, SubTask, Tag,
};
use crate::types::DbId;

/// A card inside a task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub background_color: String,
    pub font_color: String,
    /// Back-reference to the owning task list.
    #[serde(default)]
    pub task_list_id: DbId,
    /// Checklist order is user-significant.
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Task {
    pub fn new(title: impl Into<String>, task_list_id: DbId) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            background_color: "#ffffff".into(),
            font_color: "#000000".into(),
            task_list_id,
            sub_tasks: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// Number of checked subtasks.
    pub fn checked_count(&self) -> usize {
        self.sub_tasks.iter().filter(|s| s.checked).count()
    }

    pub fn subtask(&self, id: DbId) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|s| s.id == id)
    }

    /// Replace the subtask with the same id, or append it.
    pub fn upsert_subtask(&mut self, mut subtask: SubTask) {
        subtask.task_id = self.id;
        upsert_by_id(&mut self.sub_tasks, subtask);
    }

    pub fn remove_subtask(&mut self, id: DbId) -> Option<SubTask> {
        remove_by_id(&mut self.sub_tasks, id)
    }

    /// Place `subtask` before or after `anchor` in the checklist.
    pub fn insert_subtask_relative(
        &mut self,
        mut subtask: SubTask,
        anchor: DbId,
        placement: Placement,
    ) -> bool {
        subtask.task_id = self.id;
        insert_relative(&mut self.sub_tasks, subtask, anchor, placement)
    }

    pub fn upsert_tag(&mut self, tag: Tag) {
        upsert_by_id(&mut self.tags, tag);
    }

    pub fn remove_tag(&mut self, id: DbId) -> Option<Tag> {
        remove_by_id(&mut self.tags, id)
    }

    /// Computed card style.
    pub fn style(&self) -> String {
        format!("background-color: {};", self.background_color)
    }

    /// Computed title style.
    pub fn title_style(&self) -> String {
        format!("color: {};", self.font_color)
    }
}

impl Identified for Task {
    fn id(&self) -> DbId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtask(id: DbId, description: &str, checked: bool) -> SubTask {
        SubTask {
            id,
            description: description.into(),
            checked,
            task_id: 1,
        }
    }

    #[test]
    fn checked_count_counts_only_checked() {
        let mut task = Task::new("t", 1);
        task.id = 1;
        task.upsert_subtask(subtask(1, "a", true));
        task.upsert_subtask(subtask(2, "b", false));
        task.upsert_subtask(subtask(3, "c", true));
        assert_eq!(task.checked_count(), 2);
    }

    #[test]
    fn upsert_subtask_sets_back_reference() {
        let mut task = Task::new("t", 1);
        task.id = 44;
        task.upsert_subtask(SubTask::new("step", 0));
        assert_eq!(task.sub_tasks[0].task_id, 44);
    }

    #[test]
    fn blank_description_is_not_a_description() {
        let mut task = Task::new("t", 1);
        assert!(!task.has_description());
        task.description = "   ".into();
        assert!(!task.has_description());
        task.description = "details".into();
        assert!(task.has_description());
    }

    #[test]
    fn insert_subtask_relative_reorders_checklist() {
        let mut task = Task::new("t", 1);
        task.id = 1;
        task.upsert_subtask(subtask(1, "a", false));
        task.upsert_subtask(subtask(2, "b", false));
        assert!(task.insert_subtask_relative(subtask(2, "b", false), 1, Placement::Before));
        let order: Vec<_> = task.sub_tasks.iter().map(|s| s.id).collect();
        assert_eq!(order, vec![2, 1]);
    }
}
