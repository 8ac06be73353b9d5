use super::{split_move, ChessPosition, MaterialCount, MoveRejection, Side, TerminalStatus};

/// A fully scripted double of [`ChessPosition`] for unit tests that need to
/// drive a specific endgame shape (e.g. "opponent has only king+knight")
/// without constructing a real FEN and move sequence through `shakmaty`.
///
/// Every move is accepted as legal as long as it is syntactically valid;
/// the next [`TerminalStatus`] and material counts are whatever the test
/// pre-loaded via the builder methods.
pub struct ScriptedPosition {
    turn: Side,
    material: [MaterialCount; 2],
    next_status: TerminalStatus,
    fen: String,
    move_log: Vec<String>,
}

fn idx(side: Side) -> usize {
    match side {
        Side::White => 0,
        Side::Black => 1,
    }
}

impl ScriptedPosition {
    pub fn with_material(white: MaterialCount, black: MaterialCount) -> Self {
        Self {
            turn: Side::White,
            material: [white, black],
            next_status: TerminalStatus::Ongoing,
            fen: "scripted".to_string(),
            move_log: Vec::new(),
        }
    }

    pub fn set_turn(&mut self, side: Side) {
        self.turn = side;
    }

    pub fn set_next_status(&mut self, status: TerminalStatus) {
        self.next_status = status;
    }

    pub fn moves_played(&self) -> &[String] {
        &self.move_log
    }
}

impl ChessPosition for ScriptedPosition {
    fn new_game() -> Self {
        Self::with_material(MaterialCount::default(), MaterialCount::default())
    }

    fn from_fen(fen: &str) -> Result<Self, ()> {
        let mut pos = Self::new_game();
        pos.fen = fen.to_string();
        Ok(pos)
    }

    fn try_move(&mut self, mv: &str) -> Result<TerminalStatus, MoveRejection> {
        split_move(mv)?;
        self.move_log.push(mv.to_string());
        self.turn = self.turn.other();
        self.fen = format!("scripted-after-{mv}");
        Ok(self.next_status)
    }

    fn fen(&self) -> String {
        self.fen.clone()
    }

    fn material_for(&self, side: Side) -> MaterialCount {
        self.material[idx(side)]
    }

    fn turn(&self) -> Side {
        self.turn
    }
}
