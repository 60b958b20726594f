use serde::{Deserialize, Serialize};

use crate::model::{
    insert_relative, remove_by_id, upsert_by_id, ColorEntity, Identified, Placement, Tag, Task,
    TaskList,
};
use crate::types::DbId;

/// Top-level collaborative document.
///
/// Owns its task lists (cascade on save and delete). List order is display
/// order and list ids are unique within a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(default)]
    pub id: DbId,
    pub title: String,
    pub board_bg_color: String,
    pub board_font_color: String,
    pub task_lists_bg_color: String,
    pub task_lists_font_color: String,
    /// Human-readable code other users join with. Assigned by the server.
    #[serde(default)]
    pub join_code: String,
    /// Password hash, or empty when the board is unprotected.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub task_default_color: ColorEntity,
    #[serde(default)]
    pub task_lists: Vec<TaskList>,
    #[serde(default)]
    pub task_color_presets: Vec<ColorEntity>,
}

impl Board {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            board_bg_color: "#f4f5f7".into(),
            board_font_color: "#172b4d".into(),
            task_lists_bg_color: "#ebecf0".into(),
            task_lists_font_color: "#172b4d".into(),
            join_code: String::new(),
            password: String::new(),
            task_default_color: ColorEntity::default(),
            task_lists: Vec::new(),
            task_color_presets: Vec::new(),
        }
    }

    pub fn is_protected(&self) -> bool {
        !self.password.is_empty()
    }

    /// Computed board style.
    pub fn style(&self) -> String {
        format!(
            "background-color: {}; color: {};",
            self.board_bg_color, self.board_font_color
        )
    }

    /// Style every task list of this board inherits.
    pub fn task_list_style(&self) -> String {
        format!(
            "background-color: {}; color: {};",
            self.task_lists_bg_color, self.task_lists_font_color
        )
    }

    // ---- task lists ----

    pub fn task_list(&self, id: DbId) -> Option<&TaskList> {
        self.task_lists.iter().find(|l| l.id == id)
    }

    pub fn task_list_mut(&mut self, id: DbId) -> Option<&mut TaskList> {
        self.task_lists.iter_mut().find(|l| l.id == id)
    }

    /// Replace the list with the same id in place, or append it.
    pub fn upsert_task_list(&mut self, mut list: TaskList) {
        list.board_id = self.id;
        upsert_by_id(&mut self.task_lists, list);
    }

    pub fn remove_task_list(&mut self, id: DbId) -> Option<TaskList> {
        remove_by_id(&mut self.task_lists, id)
    }

    // ---- tasks ----

    pub fn find_task(&self, id: DbId) -> Option<&Task> {
        self.task_lists.iter().find_map(|l| l.task(id))
    }

    pub fn find_task_mut(&mut self, id: DbId) -> Option<&mut Task> {
        self.task_lists
            .iter_mut()
            .find_map(|l| l.tasks.iter_mut().find(|t| t.id == id))
    }

    /// Write `task` into the list named by `task.task_list_id`.
    ///
    /// An existing copy in that list is replaced in place; a copy sitting in
    /// any other list is removed so the task never appears twice. Returns
    /// `false` when the target list is not part of this board.
    pub fn insert_or_replace_task(&mut self, task: Task) -> bool {
        if self.task_list(task.task_list_id).is_none() {
            return false;
        }
        for list in self.task_lists.iter_mut() {
            if list.id != task.task_list_id {
                list.remove_task(task.id);
            }
        }
        match self.task_list_mut(task.task_list_id) {
            Some(list) => {
                list.upsert_task(task);
                true
            }
            None => false,
        }
    }

    /// Remove a task from whichever list holds it.
    pub fn remove_task(&mut self, id: DbId) -> Option<Task> {
        self.task_lists.iter_mut().find_map(|l| l.remove_task(id))
    }

    /// Place `task` next to `anchor`, moving it into the anchor's list.
    pub fn insert_task_relative(
        &mut self,
        mut task: Task,
        anchor: DbId,
        placement: Placement,
    ) -> bool {
        let Some(target) = self
            .task_lists
            .iter()
            .find(|l| l.contains_task(anchor))
            .map(|l| l.id)
        else {
            return false;
        };
        if anchor != task.id {
            self.remove_task(task.id);
        }
        task.task_list_id = target;
        match self.task_list_mut(target) {
            Some(list) => insert_relative(&mut list.tasks, task, anchor, placement),
            None => false,
        }
    }

    // ---- tags ----

    /// Tags used anywhere on the board, de-duplicated by id in first-seen order.
    pub fn distinct_tags(&self) -> Vec<Tag> {
        let mut seen = Vec::new();
        for task in self.task_lists.iter().flat_map(|l| l.tasks.iter()) {
            for tag in &task.tags {
                if !seen.iter().any(|t: &Tag| t.id == tag.id) {
                    seen.push(tag.clone());
                }
            }
        }
        seen
    }

    /// Overwrite every task's copy of `tag` (matched by id).
    ///
    /// Returns the number of copies that changed.
    pub fn replace_tag_everywhere(&mut self, tag: &Tag) -> usize {
        let mut changed = 0;
        for task in self.task_lists.iter_mut().flat_map(|l| l.tasks.iter_mut()) {
            for copy in task.tags.iter_mut().filter(|t| t.id == tag.id) {
                if copy != tag {
                    *copy = tag.clone();
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Drop every task's copy of the tag with the given id.
    pub fn remove_tag_everywhere(&mut self, tag_id: DbId) -> usize {
        let mut removed = 0;
        for task in self.task_lists.iter_mut().flat_map(|l| l.tasks.iter_mut()) {
            let before = task.tags.len();
            task.tags.retain(|t| t.id != tag_id);
            removed += before - task.tags.len();
        }
        removed
    }

    // ---- colour presets ----

    pub fn upsert_color_preset(&mut self, preset: ColorEntity) {
        upsert_by_id(&mut self.task_color_presets, preset);
    }

    pub fn remove_color_preset(&mut self, id: DbId) -> Option<ColorEntity> {
        remove_by_id(&mut self.task_color_presets, id)
    }
}

impl Identified for Board {
    fn id(&self) -> DbId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: DbId, list: DbId) -> Task {
        let mut t = Task::new(format!("task {id}"), list);
        t.id = id;
        t
    }

    fn board() -> Board {
        let mut board = Board::new("Sprint");
        board.id = 1;
        for (list_id, task_ids) in [(10, vec![100, 101]), (11, vec![110])] {
            let mut list = TaskList::new(format!("list {list_id}"), 1);
            list.id = list_id;
            for id in task_ids {
                list.upsert_task(task(id, list_id));
            }
            board.upsert_task_list(list);
        }
        board
    }

    fn order(board: &Board, list: DbId) -> Vec<DbId> {
        board
            .task_list(list)
            .map(|l| l.tasks.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let original = board();
        let mut copy = original.clone();
        copy.task_list_mut(10).unwrap().tasks[0].title = "changed".into();
        assert_eq!(original.find_task(100).unwrap().title, "task 100");
        assert_ne!(original, copy);
    }

    #[test]
    fn insert_or_replace_moves_task_between_lists() {
        let mut board = board();
        let mut moved = task(100, 11);
        moved.title = "moved".into();
        assert!(board.insert_or_replace_task(moved));
        assert_eq!(order(&board, 10), vec![101]);
        assert_eq!(order(&board, 11), vec![110, 100]);
        assert_eq!(board.find_task(100).unwrap().title, "moved");
    }

    #[test]
    fn insert_or_replace_keeps_position() {
        let mut board = board();
        let mut edited = task(100, 10);
        edited.description = "more".into();
        assert!(board.insert_or_replace_task(edited));
        assert_eq!(order(&board, 10), vec![100, 101]);
    }

    #[test]
    fn insert_or_replace_unknown_list_is_rejected() {
        let mut board = board();
        assert!(!board.insert_or_replace_task(task(100, 99)));
        assert_eq!(order(&board, 10), vec![100, 101]);
    }

    #[test]
    fn insert_task_relative_crosses_lists() {
        let mut board = board();
        let t = board.find_task(110).cloned().unwrap();
        assert!(board.insert_task_relative(t, 101, Placement::Before));
        assert_eq!(order(&board, 10), vec![100, 110, 101]);
        assert!(order(&board, 11).is_empty());
        assert_eq!(board.find_task(110).unwrap().task_list_id, 10);
    }

    #[test]
    fn tag_edits_reach_every_copy() {
        let mut board = board();
        let mut tag = Tag::new("old", 1);
        tag.id = 3;
        board.find_task_mut(100).unwrap().upsert_tag(tag.clone());
        board.find_task_mut(110).unwrap().upsert_tag(tag.clone());

        tag.description = "new".into();
        assert_eq!(board.replace_tag_everywhere(&tag), 2);
        assert_eq!(board.find_task(100).unwrap().tags[0].description, "new");
        assert_eq!(board.find_task(110).unwrap().tags[0].description, "new");
        assert_eq!(board.replace_tag_everywhere(&tag), 0);

        let distinct = board.distinct_tags();
        assert_eq!(distinct.len(), 1);
        assert_eq!(board.remove_tag_everywhere(3), 2);
        assert!(board.distinct_tags().is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(board()).unwrap();
        assert!(json["taskLists"].is_array());
        assert_eq!(json["taskLists"][0]["boardId"], 1);
        assert!(json["taskListsBgColor"].is_string());
    }
}
