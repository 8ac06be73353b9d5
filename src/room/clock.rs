//! Chess-clock accounting: elapsed-time deduction and the flag-fall
//! mate-possibility rule from `spec.md` §4.1/§8 B3.

use crate::chess::{ChessPosition, MaterialCount, Side};
use crate::protocol::{Clocks, Color};

pub fn remaining(clocks: &Clocks, color: Color) -> i64 {
    match color {
        Color::White => clocks.white_remaining_ms,
        Color::Black => clocks.black_remaining_ms,
    }
}

fn set_remaining(clocks: &mut Clocks, color: Color, value: i64) {
    match color {
        Color::White => clocks.white_remaining_ms = value,
        Color::Black => clocks.black_remaining_ms = value,
    }
}

/// Subtract the elapsed wall-clock time since `last_tick_at` from the side
/// to move. Returns that side's remaining time *after* the deduction; the
/// caller decides whether that's a flag-fall.
pub fn deduct_elapsed(clocks: &mut Clocks, now: i64) -> i64 {
    let elapsed = now - clocks.last_tick_at;
    let mover = clocks.turn;
    let new_remaining = remaining(clocks, mover) - elapsed;
    set_remaining(clocks, mover, new_remaining);
    new_remaining
}

fn to_chess_side(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

/// Whether the side that did *not* just flag can still deliver mate with
/// its remaining material, per the fixed rule in `spec.md` §4.1/§8 B3.
pub fn opponent_can_still_mate(chess: &dyn ChessPosition, opponent: Color) -> bool {
    material_for(chess, opponent).can_still_mate()
}

pub fn material_for(chess: &dyn ChessPosition, color: Color) -> MaterialCount {
    chess.material_for(to_chess_side(color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::ScriptedPosition;

    fn clocks(turn: Color, white: i64, black: i64, last_tick: i64) -> Clocks {
        Clocks {
            white_remaining_ms: white,
            black_remaining_ms: black,
            last_tick_at: last_tick,
            turn,
            frozen_at: None,
        }
    }

    #[test]
    fn deduct_elapsed_subtracts_from_side_to_move_only() {
        let mut c = clocks(Color::White, 10_000, 20_000, 0);
        let left = deduct_elapsed(&mut c, 1_500);
        assert_eq!(left, 8_500);
        assert_eq!(c.white_remaining_ms, 8_500);
        assert_eq!(c.black_remaining_ms, 20_000);
    }

    #[test]
    fn flag_fall_draw_when_opponent_has_only_king_and_knight() {
        let pos = ScriptedPosition::with_material(
            MaterialCount {
                minors: 1,
                ..Default::default()
            },
            MaterialCount::default(),
        );
        assert!(!opponent_can_still_mate(&pos, Color::White));
    }

    #[test]
    fn flag_fall_mate_possible_with_two_minors() {
        let pos = ScriptedPosition::with_material(
            MaterialCount {
                minors: 2,
                ..Default::default()
            },
            MaterialCount::default(),
        );
        assert!(opponent_can_still_mate(&pos, Color::White));
    }

    #[test]
    fn flag_fall_mate_possible_with_a_single_pawn() {
        let pos = ScriptedPosition::with_material(
            MaterialCount {
                pawns: 1,
                ..Default::default()
            },
            MaterialCount::default(),
        );
        assert!(opponent_can_still_mate(&pos, Color::White));
    }
}
