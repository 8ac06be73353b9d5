use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Every room-operation failure kind named in `spec.md` §4.1/§7, plus the
/// open-question addition (`already_requested`) and the 404 the router
/// needs when a `roomId` doesn't resolve to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("already_initialized")]
    AlreadyInitialized,
    #[error("not_in_lobby")]
    NotInLobby,
    #[error("room_full")]
    RoomFull,
    #[error("room_too_old")]
    RoomTooOld,
    #[error("room_closed")]
    RoomClosed,
    #[error("invalid_phase")]
    InvalidPhase,
    #[error("need_more_players")]
    NeedMorePlayers,
    #[error("start_request_expired")]
    StartRequestExpired,
    #[error("already_requested")]
    AlreadyRequested,
    #[error("not_bidding")]
    NotBidding,
    #[error("invalid_bid_amount")]
    InvalidBidAmount,
    #[error("already_bid")]
    AlreadyBid,
    #[error("bidding_closed")]
    BiddingClosed,
    #[error("not_in_color_pick")]
    NotInColorPick,
    #[error("not_allowed_to_choose")]
    NotAllowedToChoose,
    #[error("invalid_color")]
    InvalidColor,
    #[error("choice_deadline_passed")]
    ChoiceDeadlinePassed,
    #[error("not_playing")]
    NotPlaying,
    #[error("unknown_player_color")]
    UnknownPlayerColor,
    #[error("not_your_turn")]
    NotYourTurn,
    #[error("invalid_move_format")]
    InvalidMoveFormat,
    #[error("illegal_move")]
    IllegalMove,
    #[error("not_finished")]
    NotFinished,
    #[error("rematch_window_closed")]
    RematchWindowClosed,
    #[error("already_voted")]
    AlreadyVoted,
    #[error("playerId_required")]
    PlayerIdRequired,
    #[error("playerId_and_amount_required")]
    PlayerIdAndAmountRequired,
    #[error("unknown_player")]
    UnknownPlayer,
    #[error("room_expired")]
    RoomExpired,
    #[error("room_not_found")]
    RoomNotFound,
    #[error("internal_error")]
    Internal,
}

impl RoomError {
    pub fn code(self) -> &'static str {
        // `Display` (via thiserror) already renders the wire code.
        match self {
            RoomError::AlreadyInitialized => "already_initialized",
            RoomError::NotInLobby => "not_in_lobby",
            RoomError::RoomFull => "room_full",
            RoomError::RoomTooOld => "room_too_old",
            RoomError::RoomClosed => "room_closed",
            RoomError::InvalidPhase => "invalid_phase",
            RoomError::NeedMorePlayers => "need_more_players",
            RoomError::StartRequestExpired => "start_request_expired",
            RoomError::AlreadyRequested => "already_requested",
            RoomError::NotBidding => "not_bidding",
            RoomError::InvalidBidAmount => "invalid_bid_amount",
            RoomError::AlreadyBid => "already_bid",
            RoomError::BiddingClosed => "bidding_closed",
            RoomError::NotInColorPick => "not_in_color_pick",
            RoomError::NotAllowedToChoose => "not_allowed_to_choose",
            RoomError::InvalidColor => "invalid_color",
            RoomError::ChoiceDeadlinePassed => "choice_deadline_passed",
            RoomError::NotPlaying => "not_playing",
            RoomError::UnknownPlayerColor => "unknown_player_color",
            RoomError::NotYourTurn => "not_your_turn",
            RoomError::InvalidMoveFormat => "invalid_move_format",
            RoomError::IllegalMove => "illegal_move",
            RoomError::NotFinished => "not_finished",
            RoomError::RematchWindowClosed => "rematch_window_closed",
            RoomError::AlreadyVoted => "already_voted",
            RoomError::PlayerIdRequired => "playerId_required",
            RoomError::PlayerIdAndAmountRequired => "playerId_and_amount_required",
            RoomError::UnknownPlayer => "unknown_player",
            RoomError::RoomExpired => "room_expired",
            RoomError::RoomNotFound => "room_not_found",
            RoomError::Internal => "internal_error",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            RoomError::RoomTooOld | RoomError::RoomExpired | RoomError::RoomClosed => {
                StatusCode::GONE
            }
            RoomError::RoomNotFound => StatusCode::NOT_FOUND,
            RoomError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Failure kinds for `IndexActor`/`Router` matchmaking operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("playerId_required")]
    PlayerIdRequired,
    #[error("invalid_time_control")]
    InvalidTimeControl,
    #[error("not_queued")]
    NotQueued,
}

impl IndexError {
    pub fn code(self) -> &'static str {
        match self {
            IndexError::PlayerIdRequired => "playerId_required",
            IndexError::InvalidTimeControl => "invalid_time_control",
            IndexError::NotQueued => "not_queued",
        }
    }

    pub fn status(self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// `{error: <code>}` body shape for every failed response, per `spec.md` §6.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl From<RoomError> for ErrorBody {
    fn from(e: RoomError) -> Self {
        ErrorBody { error: e.code() }
    }
}

impl From<IndexError> for ErrorBody {
    fn from(e: IndexError) -> Self {
        ErrorBody { error: e.code() }
    }
}
