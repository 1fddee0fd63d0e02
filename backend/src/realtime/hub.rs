//! Process-wide event hub
//!
//! Every event is published once on a broadcast channel; each socket keeps
//! only the events addressed to rooms it has joined.

use serde::Serialize;
use shared::realtime::Room;
use tokio::sync::broadcast;

/// Capacity of the broadcast buffer before slow sockets start lagging
const HUB_CAPACITY: usize = 1024;

/// An event addressed to one room
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub room: String,
    pub event: String,
    pub payload: serde_json::Value,
}

#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<RoomEvent>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.tx.subscribe()
    }

    /// Publish `payload` as `event` to `room`. Returns the number of live sockets.
    ///
    /// Never fails: an unserializable payload or an empty hub is only logged.
    pub fn emit<T: Serialize>(&self, room: Room, event: impl Into<String>, payload: &T) -> usize {
        let event = event.into();
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("[Realtime] Failed to serialize {} payload: {:?}", event, e);
                return 0;
            }
        };

        let room = room.to_string();
        match self.tx.send(RoomEvent {
            room: room.clone(),
            event: event.clone(),
            payload,
        }) {
            Ok(subscribers) => {
                tracing::debug!("[Realtime] {} -> {} ({} sockets)", event, room, subscribers);
                subscribers
            }
            Err(_) => {
                tracing::debug!("[Realtime] No sockets connected, dropped {} for {}", event, room);
                0
            }
        }
    }
}
