use serde::{Deserialize, Serialize};

use crate::model::Identified;
use crate::types::DbId;

/// A reusable background/font colour pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorEntity {
    #[serde(default)]
    pub id: DbId,
    pub background_color: String,
    pub font_color: String,
}

impl ColorEntity {
    pub fn new(background_color: impl Into<String>, font_color: impl Into<String>) -> Self {
        Self {
            id: 0,
            background_color: background_color.into(),
            font_color: font_color.into(),
        }
    }
}

impl Default for ColorEntity {
    fn default() -> Self {
        Self::new("#ffffff", "#000000")
    }
}

impl Identified for ColorEntity {
    fn id(&self) -> DbId {
        self.id
    }
}
