/**
 * Group Broadcasting
 *
 * This module defines the broadcast service contract used by the fanout
 * coordinator: deliver an event to every connection joined to a group, and
 * join or leave connections explicitly.
 *
 * # Delivery
 *
 * Delivery is fire-and-forget. The caller learns how many connections the
 * event was handed to, never whether a client processed it.
 */
use crate::shared::error::BroadcastError;
use crate::shared::PlanEvent;
use async_trait::async_trait;

/// Pub/sub broadcast service
#[async_trait]
pub trait Broadcaster: Send + Sync + 'static {
    /// Deliver the event to every connection in `event.group`
    ///
    /// Returns the number of connections the event was handed to.
    async fn send_to_group(&self, event: &PlanEvent) -> Result<usize, BroadcastError>;

    /// Join a connection to a group
    async fn add_to_group(&self, group: &str, connection_id: &str) -> Result<(), BroadcastError>;

    /// Remove a connection from a group
    async fn remove_from_group(&self, group: &str, connection_id: &str) -> Result<(), BroadcastError>;
}

/// Send a plan event and log the outcome
///
/// A group with no members is not an error; the event is simply dropped.
pub async fn broadcast_event(
    broadcaster: &dyn Broadcaster,
    event: &PlanEvent,
) -> Result<usize, BroadcastError> {
    match broadcaster.send_to_group(event).await {
        Ok(0) => {
            tracing::debug!(
                "[Realtime] No connections in group {} for {}",
                event.group,
                event.target.as_str()
            );
            Ok(0)
        }
        Ok(count) => {
            tracing::info!(
                "[Realtime] {} broadcast to {} connections in group {}",
                event.target.as_str(),
                count,
                event.group
            );
            Ok(count)
        }
        Err(e) => {
            tracing::error!(
                "[Realtime] Failed to broadcast {} to group {}: {}",
                event.target.as_str(),
                event.group,
                e
            );
            Err(e)
        }
    }
}
