/// Entity identifiers. `0` means "not persisted yet".
pub type DbId = i64;

/// Id carried by entities that have never been saved.
pub const UNSAVED_ID: DbId = 0;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
