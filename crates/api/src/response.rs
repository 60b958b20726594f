//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. The client decodes
//! the same type, so it lives here and is re-exported for tests.

use serde::{Deserialize, Serialize};

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: board }))
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}
