//! services/api/src/adapters/notifier.rs
//!
//! Concrete implementations of the `Notifier` port.
//!
//! `BroadcastNotifier` is the push transport: one `tokio::sync::broadcast`
//! channel per session room plus a lobby channel for active-session-list
//! changes. `NullNotifier` is the polling variant: it publishes nowhere
//! and clients drive updates by re-fetching the list endpoints.

use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;
use vidya_core::domain::BoardEvent;
use vidya_core::ports::{EventStream, Notifier};

/// Buffered events per room. A subscriber that falls further behind than
/// this drops events and recovers with a full re-fetch.
const ROOM_CAPACITY: usize = 64;

//=========================================================================================
// BroadcastNotifier (push transport)
//=========================================================================================

pub struct BroadcastNotifier {
    rooms: RwLock<HashMap<Uuid, broadcast::Sender<BoardEvent>>>,
    lobby: broadcast::Sender<BoardEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (lobby, _) = broadcast::channel(ROOM_CAPACITY);
        Self {
            rooms: RwLock::new(HashMap::new()),
            lobby,
        }
    }

    async fn room_sender(&self, session_id: Uuid) -> broadcast::Sender<BoardEvent> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone()
    }

    fn receiver_stream(mut rx: broadcast::Receiver<BoardEvent>) -> EventStream {
        Box::pin(stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Best-effort delivery: the client re-syncs via GET.
                        warn!("Subscriber lagged, {} events dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(&self, session_id: Uuid, event: BoardEvent) {
        let rooms = self.rooms.read().await;
        if let Some(sender) = rooms.get(&session_id) {
            // A send error just means nobody is in the room right now.
            let _ = sender.send(event);
        }
    }

    async fn publish_session_list_changed(&self) {
        let _ = self.lobby.send(BoardEvent::SessionListChanged);
    }

    async fn subscribe(&self, session_id: Uuid) -> EventStream {
        let sender = self.room_sender(session_id).await;
        Self::receiver_stream(sender.subscribe())
    }

    async fn subscribe_session_list(&self) -> EventStream {
        Self::receiver_stream(self.lobby.subscribe())
    }
}

//=========================================================================================
// NullNotifier (polling variant)
//=========================================================================================

/// Satisfies the fan-out contract without delivering anything. Used when
/// `REALTIME=false`; connected clients poll instead.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn publish(&self, session_id: Uuid, _event: BoardEvent) {
        debug!("Realtime disabled, dropping event for session {}", session_id);
    }

    async fn publish_session_list_changed(&self) {
        debug!("Realtime disabled, dropping session list change");
    }

    async fn subscribe(&self, _session_id: Uuid) -> EventStream {
        Box::pin(futures::stream::pending())
    }

    async fn subscribe_session_list(&self) -> EventStream {
        Box::pin(futures::stream::pending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn room_events_reach_room_subscribers() {
        let notifier = BroadcastNotifier::new();
        let session_id = Uuid::new_v4();

        let mut events = notifier.subscribe(session_id).await;
        notifier
            .publish(session_id, BoardEvent::SessionCleared { session_id })
            .await;

        match events.next().await {
            Some(BoardEvent::SessionCleared { session_id: got }) => {
                assert_eq!(got, session_id);
            }
            other => panic!("expected SessionCleared, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rooms_are_isolated_from_each_other() {
        let notifier = BroadcastNotifier::new();
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut events = notifier.subscribe(watched).await;
        notifier
            .publish(other, BoardEvent::SessionCleared { session_id: other })
            .await;
        notifier
            .publish(watched, BoardEvent::SessionCleared { session_id: watched })
            .await;

        // The first event delivered must be for the watched room.
        match events.next().await {
            Some(BoardEvent::SessionCleared { session_id }) => {
                assert_eq!(session_id, watched);
            }
            other => panic!("expected SessionCleared, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn session_list_changes_reach_lobby_subscribers() {
        let notifier = BroadcastNotifier::new();

        let mut lobby = notifier.subscribe_session_list().await;
        notifier.publish_session_list_changed().await;

        assert!(matches!(
            lobby.next().await,
            Some(BoardEvent::SessionListChanged)
        ));
    }

    #[tokio::test]
    async fn publishing_to_an_empty_room_is_a_no_op() {
        let notifier = BroadcastNotifier::new();
        let session_id = Uuid::new_v4();
        // No subscribers, no room: must not panic or allocate a room.
        notifier
            .publish(session_id, BoardEvent::SessionCleared { session_id })
            .await;
        assert!(notifier.rooms.read().await.is_empty());
    }
}
