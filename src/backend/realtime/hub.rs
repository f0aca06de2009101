/**
 * In-Process Group Hub
 *
 * This module implements `Broadcaster` for connections served by this
 * process. Each negotiated connection owns a `tokio::sync::broadcast`
 * channel; its event stream subscribes to that channel. Groups are sets of
 * connection ids.
 *
 * # Lifecycle
 *
 * 1. `connect` allocates a connection id (negotiate)
 * 2. `subscribe` attaches an event stream to it
 * 3. `add_to_group` joins it to a plan's group (registerUser)
 * 4. `cleanup_inactive_connections` drops connections whose stream has been
 *    gone longer than the idle timeout, and removes them from every group
 */
use crate::backend::realtime::broadcast::Broadcaster;
use crate::shared::error::BroadcastError;
use crate::shared::PlanEvent;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

struct Connection {
    sender: broadcast::Sender<PlanEvent>,
    last_seen: Instant,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<String, Connection>,
    groups: HashMap<String, HashSet<String>>,
}

/// Connection registry and group membership for this process
#[derive(Clone)]
pub struct GroupHub {
    state: Arc<RwLock<HubState>>,
    capacity: usize,
}

impl GroupHub {
    /// Create a hub whose per-connection buffers hold `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(HubState::default())),
            capacity: capacity.max(1),
        }
    }

    /// Allocate a new connection id
    pub async fn connect(&self) -> String {
        let connection_id = Uuid::new_v4().to_string();
        let (sender, _) = broadcast::channel(self.capacity);
        self.state.write().await.connections.insert(
            connection_id.clone(),
            Connection {
                sender,
                last_seen: Instant::now(),
            },
        );
        tracing::debug!("[Realtime] Connection {} negotiated", connection_id);
        connection_id
    }

    /// Attach a receiver to an existing connection
    pub async fn subscribe(
        &self,
        connection_id: &str,
    ) -> Result<broadcast::Receiver<PlanEvent>, BroadcastError> {
        let mut state = self.state.write().await;
        let connection = state
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| BroadcastError::UnknownConnection {
                connection_id: connection_id.to_string(),
            })?;
        connection.last_seen = Instant::now();
        Ok(connection.sender.subscribe())
    }

    /// Forget a connection and its group memberships
    pub async fn disconnect(&self, connection_id: &str) {
        let mut state = self.state.write().await;
        state.connections.remove(connection_id);
        for members in state.groups.values_mut() {
            members.remove(connection_id);
        }
        state.groups.retain(|_, members| !members.is_empty());
    }

    /// Drop connections that have had no receiver for longer than `idle`
    pub async fn cleanup_inactive_connections(&self, idle: Duration) -> usize {
        let stale: Vec<String> = {
            let mut state = self.state.write().await;
            let now = Instant::now();
            let mut stale = Vec::new();
            for (id, connection) in state.connections.iter_mut() {
                if connection.sender.receiver_count() > 0 {
                    connection.last_seen = now;
                } else if now.duration_since(connection.last_seen) >= idle {
                    stale.push(id.clone());
                }
            }
            stale
        };
        for id in &stale {
            self.disconnect(id).await;
        }
        stale.len()
    }

    /// Number of connections joined to a group
    pub async fn group_size(&self, group: &str) -> usize {
        self.state
            .read()
            .await
            .groups
            .get(group)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Number of negotiated connections
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }
}

#[async_trait]
impl Broadcaster for GroupHub {
    async fn send_to_group(&self, event: &PlanEvent) -> Result<usize, BroadcastError> {
        let state = self.state.read().await;
        let Some(members) = state.groups.get(&event.group) else {
            return Ok(0);
        };
        let mut delivered = 0;
        for connection_id in members {
            if let Some(connection) = state.connections.get(connection_id) {
                // A connection whose stream is gone has no receivers; skip it.
                if connection.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        Ok(delivered)
    }

    async fn add_to_group(&self, group: &str, connection_id: &str) -> Result<(), BroadcastError> {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(connection_id) {
            return Err(BroadcastError::UnknownConnection {
                connection_id: connection_id.to_string(),
            });
        }
        state
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(connection_id.to_string());
        tracing::info!("[Realtime] Connection {} joined group {}", connection_id, group);
        Ok(())
    }

    async fn remove_from_group(&self, group: &str, connection_id: &str) -> Result<(), BroadcastError> {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(connection_id) {
            return Err(BroadcastError::UnknownConnection {
                connection_id: connection_id.to_string(),
            });
        }
        if let Some(members) = state.groups.get_mut(group) {
            members.remove(connection_id);
            if members.is_empty() {
                state.groups.remove(group);
            }
        }
        tracing::info!("[Realtime] Connection {} left group {}", connection_id, group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::EventTarget;
    use assert_matches::assert_matches;

    fn event(group: &str) -> PlanEvent {
        PlanEvent::new(EventTarget::DateAdded, group, serde_json::json!({"id": "2025-01-01"}))
    }

    #[tokio::test]
    async fn test_only_group_members_receive() {
        let hub = GroupHub::new(16);
        let a = hub.connect().await;
        let b = hub.connect().await;
        let mut rx_a = hub.subscribe(&a).await.unwrap();
        let mut rx_b = hub.subscribe(&b).await.unwrap();
        hub.add_to_group("plan-1", &a).await.unwrap();
        hub.add_to_group("plan-2", &b).await.unwrap();

        let count = hub.send_to_group(&event("plan-1")).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(rx_a.recv().await.unwrap().target, EventTarget::DateAdded);
        assert_matches!(rx_b.try_recv(), Err(broadcast::error::TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_unknown_connection_rejected() {
        let hub = GroupHub::new(16);
        assert_matches!(
            hub.add_to_group("plan-1", "nope").await,
            Err(BroadcastError::UnknownConnection { .. })
        );
        assert_matches!(hub.subscribe("nope").await, Err(BroadcastError::UnknownConnection { .. }));
    }

    #[tokio::test]
    async fn test_no_group_is_not_an_error() {
        let hub = GroupHub::new(16);
        assert_eq!(hub.send_to_group(&event("empty")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_leave_group() {
        let hub = GroupHub::new(16);
        let a = hub.connect().await;
        let _rx = hub.subscribe(&a).await.unwrap();
        hub.add_to_group("plan-1", &a).await.unwrap();
        assert_eq!(hub.group_size("plan-1").await, 1);
        hub.remove_from_group("plan-1", &a).await.unwrap();
        assert_eq!(hub.group_size("plan-1").await, 0);
        assert_eq!(hub.send_to_group(&event("plan-1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_drops_connections_without_stream() {
        let hub = GroupHub::new(16);
        let live = hub.connect().await;
        let gone = hub.connect().await;
        let _rx = hub.subscribe(&live).await.unwrap();
        hub.add_to_group("plan-1", &gone).await.unwrap();

        assert_eq!(hub.cleanup_inactive_connections(Duration::ZERO).await, 1);
        assert_eq!(hub.connection_count().await, 1);
        assert_eq!(hub.group_size("plan-1").await, 0);
    }
}
