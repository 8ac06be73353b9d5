use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type PlayerId = String;
pub type RoomId = String;

/// Current stage of a room's lifecycle. A tagged sum type per the system's
/// redesign guidance, rather than a bare string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Bidding,
    ColorPick,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Who currently holds the right to pick a color, expressed relative to the
/// bid outcome rather than as a raw player id — the spec's `currentPicker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidRole {
    Winner,
    Loser,
}

impl BidRole {
    pub fn other(self) -> BidRole {
        match self {
            BidRole::Winner => BidRole::Loser,
            BidRole::Loser => BidRole::Winner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub amount: i64,
    pub submitted_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clocks {
    pub white_remaining_ms: i64,
    pub black_remaining_ms: i64,
    pub last_tick_at: i64,
    pub turn: Color,
    pub frozen_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub by: PlayerId,
    #[serde(rename = "move")]
    pub mv: String,
    pub at: i64,
}

/// Terminal outcome of a finished game. `Draw`'s cause is carried
/// separately in `Room::reason` so the wire shape matches `spec.md` §8
/// scenario 3/4 (`{result, reason?}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Checkmate,
    Draw,
    TimeForfeit,
    DisconnectForfeit,
}

/// Why a room closed outside of a normal FINISHED game outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StartExpired,
    DeclinedRematch,
    RematchTimeout,
    DisconnectForfeit,
    Left,
}

/// The full per-room record. Nullable fields are gated by `phase` per the
/// invariants in `spec.md` §3 — e.g. `bids` is only meaningful in
/// `Phase::Bidding`, `clocks` only from `Phase::Playing` onward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: RoomId,
    pub phase: Phase,
    pub players: Vec<PlayerSlot>,
    pub max_players: usize,
    pub private: bool,

    pub main_time_ms: i64,
    pub bid_duration_ms: i64,
    pub choice_duration_ms: i64,

    pub bids: HashMap<PlayerId, Bid>,
    pub bid_deadline: Option<i64>,
    pub choice_deadline: Option<i64>,

    pub start_requested_by: Option<PlayerId>,
    pub start_confirm_deadline: Option<i64>,

    pub winner_id: Option<PlayerId>,
    pub loser_id: Option<PlayerId>,
    pub winning_bid_ms: Option<i64>,
    pub losing_bid_ms: Option<i64>,

    pub current_picker: Option<BidRole>,
    pub choice_attempts: u8,

    pub colors: HashMap<PlayerId, Color>,
    pub draw_odds_side: Option<PlayerId>,

    pub clocks: Option<Clocks>,
    pub moves: Vec<MoveRecord>,
    pub game_fen: Option<String>,

    pub result: Option<GameResult>,
    pub reason: Option<String>,

    pub rematch_window_ends: Option<i64>,
    pub rematch_votes: HashMap<PlayerId, bool>,

    pub disconnected_player_id: Option<PlayerId>,
    pub disconnect_start: Option<i64>,
    pub disconnect_timeout_ms: i64,

    pub closed: bool,
    pub close_reason: Option<CloseReason>,
    pub closed_at: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Room {
    pub fn color_of(&self, player_id: &str) -> Option<Color> {
        self.colors.get(player_id).copied()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn other_player(&self, player_id: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .map(|p| &p.id)
            .find(|id| id.as_str() != player_id)
            .cloned()
    }

    pub fn role_player(&self, role: BidRole) -> Option<PlayerId> {
        match role {
            BidRole::Winner => self.winner_id.clone(),
            BidRole::Loser => self.loser_id.clone(),
        }
    }
}
