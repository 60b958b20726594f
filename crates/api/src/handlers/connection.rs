use axum::response::IntoResponse;
use axum::Json;

use crate::response::DataResponse;

/// GET /api/v1/connection
///
/// Connectivity check used by clients before they remember a server.
pub async fn test_connection() -> impl IntoResponse {
    Json(DataResponse { data: "ok" })
}
