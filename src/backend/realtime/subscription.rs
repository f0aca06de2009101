/**
 * Event Stream Handler
 *
 * This module implements the Server-Sent Events handler for
 * `GET /api/events/{connectionId}`. A client first negotiates a connection
 * id, opens this stream, and then registers the id with a plan's group.
 *
 * # Stream Format
 *
 * Each plan event becomes one SSE event whose name is the target and whose
 * data is the serialized `PlanEvent`:
 *
 * ```http
 * event: activityAdded
 * data: {"target":"activityAdded","arguments":[{"id":2,"dateId":"2025-01-01","byUser":"alice"}],"timestamp":"..."}
 * ```
 *
 * # Connection Management
 *
 * - Keep-alive comments are injected by axum
 * - Lagged receivers log and continue
 * - The stream ends when the hub forgets the connection
 */
use crate::backend::error::BackendError;
use crate::backend::realtime::hub::GroupHub;
use crate::shared::PlanError;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Handle an event stream subscription (GET /api/events/{connectionId})
///
/// # Errors
///
/// * `404 Not Found` - If the connection id was never negotiated or has expired
pub async fn handle_event_stream(
    State(hub): State<Arc<GroupHub>>,
    Path(connection_id): Path<String>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, axum::Error>>>, BackendError> {
    let receiver = hub
        .subscribe(&connection_id)
        .await
        .map_err(|_| PlanError::not_found("connection", connection_id.clone()))?;

    tracing::info!("[Realtime] Event stream opened for connection {}", connection_id);

    let stream = stream::unfold(
        (receiver, connection_id),
        |(mut rx, connection_id)| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let data = match serde_json::to_string(&event) {
                            Ok(data) => data,
                            Err(e) => {
                                tracing::error!("[Realtime] Failed to serialize event: {:?}", e);
                                continue;
                            }
                        };
                        let sse_event = Event::default().event(event.target.as_str()).data(data);
                        return Some((Ok(sse_event), (rx, connection_id)));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Realtime] Connection {} lagged, skipped {} events",
                            connection_id,
                            skipped
                        );
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("[Realtime] Connection {} closed, ending stream", connection_id);
                        return None;
                    }
                }
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
