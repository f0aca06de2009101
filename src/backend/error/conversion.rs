/**
 * Error Conversion
 *
 * This module converts backend errors into HTTP responses.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "plan 'p-1' not found",
 *   "kind": "not_found",
 *   "status": 404
 * }
 * ```
 *
 * Internal failures carry the generic message; their detail is logged.
 */
use crate::backend::error::types::BackendError;
use crate::shared::PlanError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            BackendError::Plan(PlanError::MalformedIdentifier { .. }) => {
                tracing::error!("[Plans] {}", self);
            }
            BackendError::Plan(PlanError::PartialWrite { source, .. }) => {
                tracing::error!("[Plans] {} (cause: {})", self, source);
            }
            _ if self.is_internal() => {
                tracing::error!("[Plans] Internal failure: {}", self);
            }
            _ => {
                tracing::debug!("[Plans] Request rejected with {}: {}", status, self);
            }
        }

        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
