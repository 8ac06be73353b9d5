//! Wire/domain types: the room record, error codes, WebSocket frames, and
//! the HTTP response envelope shapes from `spec.md` §3, §6, §7.

pub mod errors;
pub mod messages;
pub mod response;
pub mod types;

pub use errors::{ErrorBody, IndexError, RoomError};
pub use messages::{QueueServerMessage, RoomServerMessage};
pub use response::{ApiError, ApiResult};
pub use types::{
    Bid, BidRole, Clocks, CloseReason, Color, GameResult, MoveRecord, Phase, PlayerId,
    PlayerSlot, Room, RoomId,
};
