use super::{split_move, ChessPosition, MaterialCount, MoveRejection, Side, TerminalStatus};
use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color as ShColor, EnPassantMode, Position, Role, Square};
use std::str::FromStr;

fn to_sh_color(side: Side) -> ShColor {
    match side {
        Side::White => ShColor::White,
        Side::Black => ShColor::Black,
    }
}

fn from_sh_color(color: ShColor) -> Side {
    match color {
        ShColor::White => Side::White,
        ShColor::Black => Side::Black,
    }
}

/// `shakmaty`-backed implementation of [`ChessPosition`]. Keeps a short
/// history of Zobrist hashes alongside the position so threefold repetition
/// can be detected without the room layer knowing anything about hashing.
pub struct ShakmatyPosition {
    pos: Chess,
    hash_history: Vec<u64>,
}

impl ShakmatyPosition {
    fn hash_of(pos: &Chess) -> u64 {
        pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
    }

    fn terminal_status(&self) -> TerminalStatus {
        if self.pos.is_checkmate() {
            TerminalStatus::Checkmate
        } else if self.pos.is_stalemate() {
            TerminalStatus::Stalemate
        } else if self.pos.is_insufficient_material() {
            TerminalStatus::InsufficientMaterial
        } else if self.is_threefold() {
            TerminalStatus::ThreefoldRepetition
        } else if self.pos.halfmoves() >= 100 {
            TerminalStatus::FiftyMoveRule
        } else {
            TerminalStatus::Ongoing
        }
    }

    fn is_threefold(&self) -> bool {
        match self.hash_history.last() {
            Some(last) => self.hash_history.iter().filter(|h| *h == last).count() >= 3,
            None => false,
        }
    }

    /// True if a pawn sits on `from` and `to` is on the back rank for the
    /// mover, i.e. the move *must* carry a promotion letter.
    fn pawn_reaches_back_rank(&self, from: Square, to: Square) -> bool {
        let board = self.pos.board();
        matches!(board.role_at(from), Some(Role::Pawn)) && (to.rank() == shakmaty::Rank::First || to.rank() == shakmaty::Rank::Eighth)
    }
}

impl ChessPosition for ShakmatyPosition {
    fn new_game() -> Self {
        let pos = Chess::default();
        let hash = Self::hash_of(&pos);
        Self {
            pos,
            hash_history: vec![hash],
        }
    }

    fn from_fen(fen: &str) -> Result<Self, ()> {
        let setup: Fen = Fen::from_str(fen).map_err(|_| ())?;
        let pos: Chess = setup.into_position(CastlingMode::Standard).map_err(|_| ())?;
        let hash = Self::hash_of(&pos);
        Ok(Self {
            pos,
            hash_history: vec![hash],
        })
    }

    fn try_move(&mut self, mv: &str) -> Result<TerminalStatus, MoveRejection> {
        let (from_str, to_str, promo) = split_move(mv)?;
        let from = Square::from_ascii(from_str.as_bytes()).map_err(|_| MoveRejection::MalformedFormat)?;
        let to = Square::from_ascii(to_str.as_bytes()).map_err(|_| MoveRejection::MalformedFormat)?;

        if self.pawn_reaches_back_rank(from, to) && promo.is_none() {
            return Err(MoveRejection::MalformedFormat);
        }

        let promotion_role = promo.map(|c| match c {
            'q' => Role::Queen,
            'r' => Role::Rook,
            'b' => Role::Bishop,
            'n' => Role::Knight,
            _ => unreachable!("validated by split_move"),
        });

        let candidate = self
            .pos
            .legal_moves()
            .into_iter()
            .find(|m| m.from() == Some(from) && m.to() == to && m.promotion() == promotion_role)
            .ok_or(MoveRejection::Illegal)?;

        let new_pos = self
            .pos
            .clone()
            .play(&candidate)
            .map_err(|_| MoveRejection::Illegal)?;
        self.pos = new_pos;
        self.hash_history.push(Self::hash_of(&self.pos));

        Ok(self.terminal_status())
    }

    fn fen(&self) -> String {
        Fen(self.pos.clone().into_setup(EnPassantMode::Legal)).to_string()
    }

    fn material_for(&self, side: Side) -> MaterialCount {
        let board = self.pos.board();
        let color = to_sh_color(side);
        let of_role = |role: Role| (board.by_color(color) & board.by_role(role)).count() as u32;
        MaterialCount {
            queens: of_role(Role::Queen),
            rooks: of_role(Role::Rook),
            pawns: of_role(Role::Pawn),
            minors: of_role(Role::Bishop) + of_role(Role::Knight),
        }
    }

    fn turn(&self) -> Side {
        from_sh_color(self.pos.turn())
    }
}
