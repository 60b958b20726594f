use serde::{Deserialize, Serialize};

use crate::model::Identified;
use crate::types::DbId;

/// A board-scoped label. Tasks carry value copies, so an edit has to be
/// written into every task holding a copy with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default)]
    pub id: DbId,
    pub description: String,
    #[serde(default)]
    pub board_id: DbId,
    pub tag_color: String,
    pub tag_font_color: String,
}

impl Tag {
    pub fn new(description: impl Into<String>, board_id: DbId) -> Self {
        Self {
            id: 0,
            description: description.into(),
            board_id,
            tag_color: "#dddddd".into(),
            tag_font_color: "#000000".into(),
        }
    }

    /// Whether two tags look the same to a user (ids aside).
    pub fn same_label(&self, other: &Tag) -> bool {
        self.board_id == other.board_id
            && self.description == other.description
            && self.tag_color == other.tag_color
            && self.tag_font_color == other.tag_font_color
    }

    /// Computed chip style.
    pub fn style(&self) -> String {
        format!(
            "background-color: {}; color: {};",
            self.tag_color, self.tag_font_color
        )
    }
}

impl Identified for Tag {
    fn id(&self) -> DbId {
        self.id
    }
}
