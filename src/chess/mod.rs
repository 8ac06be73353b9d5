//! The narrow interface the room actor uses to consult chess rules.
//!
//! Per the system's design notes, move legality and terminal-position
//! detection are delegated to an external engine; the room logic only ever
//! consumes the boolean/enum verdicts defined here. [`ShakmatyPosition`] is
//! the concrete adapter backed by the `shakmaty` crate; tests substitute
//! [`ScriptedPosition`] to drive specific endgame scenarios without
//! constructing real FENs.

mod shakmaty_engine;
#[cfg(test)]
mod scripted;

pub use shakmaty_engine::ShakmatyPosition;
#[cfg(test)]
pub use scripted::ScriptedPosition;

/// Side to move / side of a piece. Distinct from `crate::protocol::Color`
/// so the chess adapter has no dependency on the room's wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// Not 4-5 chars, squares out of `[a-h][1-8]`, or a missing/spurious
    /// promotion letter per the fixed promotion rule.
    MalformedFormat,
    /// Well-formed but not a legal move in the current position.
    Illegal,
}

/// Terminal status of the position immediately after a move was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl TerminalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TerminalStatus::Ongoing)
    }

    /// The `reason` string surfaced to clients for non-checkmate draws.
    pub fn draw_reason(self) -> Option<&'static str> {
        match self {
            TerminalStatus::Stalemate => Some("stalemate"),
            TerminalStatus::InsufficientMaterial => Some("insufficient_material"),
            TerminalStatus::ThreefoldRepetition => Some("threefold_repetition"),
            TerminalStatus::FiftyMoveRule => Some("fifty_move_rule"),
            _ => None,
        }
    }
}

/// Non-king material held by one side, coarse enough to answer the
/// flag-fall mate-possibility question in `spec.md` §4.1/§8 B3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialCount {
    pub queens: u32,
    pub rooks: u32,
    pub pawns: u32,
    pub minors: u32, // bishops + knights
}

impl MaterialCount {
    /// `queens|rooks|pawns` OR `>= 2 minors` implies mate is still
    /// achievable. This is the exact rule the spec fixes, including the
    /// wrinkle that two minor pieces (even two knights) count as
    /// mate-possible even though two knights alone cannot force mate.
    pub fn can_still_mate(self) -> bool {
        self.queens > 0 || self.rooks > 0 || self.pawns > 0 || self.minors >= 2
    }
}

/// Syntactic validation shared by every `ChessPosition` impl: 4 or 5
/// characters, `from`/`to` each `[a-h][1-8]`, and (if present) a promotion
/// letter from `qrbn`. Does not know about promotion-*rank* requirements —
/// that needs board state and is checked by the caller.
pub fn split_move(mv: &str) -> Result<(&str, &str, Option<char>), MoveRejection> {
    let bytes = mv.as_bytes();
    if mv.len() != 4 && mv.len() != 5 {
        return Err(MoveRejection::MalformedFormat);
    }
    let is_square = |s: &str| {
        let b = s.as_bytes();
        b.len() == 2 && (b'a'..=b'h').contains(&b[0]) && (b'1'..=b'8').contains(&b[1])
    };
    let from = &mv[0..2];
    let to = &mv[2..4];
    if !is_square(from) || !is_square(to) {
        return Err(MoveRejection::MalformedFormat);
    }
    let promo = if mv.len() == 5 {
        let c = bytes[4] as char;
        if !matches!(c, 'q' | 'r' | 'b' | 'n') {
            return Err(MoveRejection::MalformedFormat);
        }
        Some(c)
    } else {
        None
    };
    Ok((from, to, promo))
}

/// The narrow boundary the room actor talks to. A concrete implementation
/// owns exactly one in-progress game; `gameFen` in the room record is this
/// type's opaque position snapshot.
pub trait ChessPosition: Send {
    /// Starting position.
    fn new_game() -> Self
    where
        Self: Sized;

    /// Reconstruct from an opaque FEN snapshot (used when rehydrating a
    /// room from durable storage).
    fn from_fen(fen: &str) -> Result<Self, ()>
    where
        Self: Sized;

    /// Attempt a move in long algebraic / UCI-ish form: 4 chars
    /// (from-square, to-square) or 5 (+ promotion letter).
    fn try_move(&mut self, mv: &str) -> Result<TerminalStatus, MoveRejection>;

    /// Opaque position snapshot after the last applied move.
    fn fen(&self) -> String;

    /// Non-king material currently held by `side`.
    fn material_for(&self, side: Side) -> MaterialCount;

    /// Whose turn it is in the underlying position (used only for
    /// consistency assertions; the room's `clocks.turn` is authoritative).
    fn turn(&self) -> Side;
}
