use super::types::Room;
use serde::Serialize;

/// Frames pushed down a room subscriber's WebSocket, per `spec.md` §6.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomServerMessage {
    Init { room: Room },
    Update { room: Room },
}

/// Frame pushed down the index actor's queue-status WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueServerMessage {
    QueueUpdate { timestamp: i64 },
}
