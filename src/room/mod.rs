//! The room actor: the single-writer state machine that owns one room's
//! lifecycle from `spec.md` §3/§4. Concurrency is a `tokio::sync::Mutex`
//! guarding the in-memory `Room` plus its chess engine, rather than the
//! literal mailbox the design notes sketch — every public method takes the
//! lock for its whole duration, which gives the same single-writer
//! guarantee without a dedicated task per room. See `SPEC_FULL.md` §2 for
//! why that trade was made.

mod bidding;
mod clock;
mod lazy;

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{error, warn};

use crate::broadcast::Fanout;
use crate::chess::{ChessPosition, MoveRejection, ShakmatyPosition, TerminalStatus};
use crate::config::ServerConfig;
use crate::index::{IndexActor, IndexEntry};
use crate::protocol::{
    Bid, BidRole, Clocks, CloseReason, Color, GameResult, MoveRecord, Phase, PlayerId,
    PlayerSlot, Room, RoomError, RoomId, RoomServerMessage,
};
use crate::store::{DynStore, StoreExt};
use crate::time::now_ms;

/// The timeout/window tunables a `RoomActor` needs, lifted out of
/// `ServerConfig` so the room module doesn't depend on the whole config
/// struct's shape.
#[derive(Debug, Clone, Copy)]
pub struct RoomTimeouts {
    pub start_confirm_timeout_ms: i64,
    pub rematch_window_ms: i64,
    pub rematch_window_insufficient_material_ms: i64,
    pub disconnect_timeout_ms: i64,
    pub disconnect_silence_ms: i64,
    pub room_stale_timeout_ms: i64,
}

impl From<&ServerConfig> for RoomTimeouts {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            start_confirm_timeout_ms: cfg.start_confirm_timeout_ms,
            rematch_window_ms: cfg.rematch_window_ms,
            rematch_window_insufficient_material_ms: cfg.rematch_window_insufficient_material_ms,
            disconnect_timeout_ms: cfg.disconnect_timeout_ms,
            disconnect_silence_ms: cfg.disconnect_silence_ms,
            room_stale_timeout_ms: cfg.room_stale_timeout_ms,
        }
    }
}

/// Parameters for `RoomActor::init`, gathering the handful of fields a
/// caller (direct room creation, or the matchmaking router) may seed.
pub struct RoomInit {
    pub room_id: RoomId,
    pub private: bool,
    pub main_time_ms: i64,
    pub bid_duration_ms: i64,
    pub choice_duration_ms: i64,
    pub disconnect_timeout_ms: i64,
    /// Players already known at creation time (a direct create passes the
    /// creator; a matchmaking match passes both matched players).
    pub seed_players: Vec<(PlayerId, String)>,
}

/// Work to perform after a mutation's lock has been released: best-effort,
/// non-blocking calls into the shared index. Never allowed to fail the
/// operation that produced them.
#[derive(Default)]
struct SideEffects {
    reenqueue: Vec<(PlayerId, String, i64)>,
}

struct Inner<C: ChessPosition> {
    room: Option<Room>,
    chess: Option<C>,
    fanout: Fanout<RoomServerMessage>,
    destroyed: bool,
}

impl<C: ChessPosition> Default for Inner<C> {
    fn default() -> Self {
        Self {
            room: None,
            chess: None,
            fanout: Fanout::new(),
            destroyed: false,
        }
    }
}

/// Owns exactly one room. Generic over the chess engine so tests can swap
/// in `ScriptedPosition`; production code uses the default `ShakmatyPosition`.
pub struct RoomActor<C: ChessPosition + 'static = ShakmatyPosition> {
    room_id: RoomId,
    inner: Mutex<Inner<C>>,
    store: DynStore,
    index: Option<Arc<IndexActor>>,
    cfg: RoomTimeouts,
}

impl<C: ChessPosition + 'static> RoomActor<C> {
    pub fn new(room_id: RoomId, store: DynStore, index: Option<Arc<IndexActor>>, cfg: RoomTimeouts) -> Self {
        Self {
            room_id,
            inner: Mutex::new(Inner::default()),
            store,
            index,
            cfg,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Rehydrate a room from whatever the store already holds for this id,
    /// if anything (used when the process restarts with a durable store
    /// backend; a no-op against a fresh `InMemoryStore`).
    pub async fn load_from_store(&self) -> Result<bool, RoomError> {
        let loaded: Option<Room> = self
            .store
            .get("room")
            .await
            .map_err(|e| {
                error!(room_id = %self.room_id, error = %e, "failed to load room from store");
                RoomError::Internal
            })?;
        let Some(room) = loaded else { return Ok(false) };
        let chess = match &room.game_fen {
            Some(fen) => C::from_fen(fen).map_err(|_| RoomError::Internal)?,
            None => C::new_game(),
        };
        let mut guard = self.inner.lock().await;
        guard.room = Some(room);
        guard.chess = Some(chess);
        Ok(true)
    }

    pub async fn init(&self, req: RoomInit) -> Result<Room, RoomError> {
        let mut guard = self.inner.lock().await;
        if guard.room.is_some() {
            return Err(RoomError::AlreadyInitialized);
        }
        let now = now_ms();
        let mut players = Vec::with_capacity(2);
        for (id, name) in req.seed_players.into_iter().take(2) {
            players.push(PlayerSlot {
                id,
                name,
                joined_at: now,
            });
        }
        let room = Room {
            room_id: req.room_id,
            phase: Phase::Lobby,
            players,
            max_players: 2,
            private: req.private,
            main_time_ms: req.main_time_ms,
            bid_duration_ms: req.bid_duration_ms,
            choice_duration_ms: req.choice_duration_ms,
            bids: Default::default(),
            bid_deadline: None,
            choice_deadline: None,
            start_requested_by: None,
            start_confirm_deadline: None,
            winner_id: None,
            loser_id: None,
            winning_bid_ms: None,
            losing_bid_ms: None,
            current_picker: None,
            choice_attempts: 0,
            colors: Default::default(),
            draw_odds_side: None,
            clocks: None,
            moves: Vec::new(),
            game_fen: None,
            result: None,
            reason: None,
            rematch_window_ends: None,
            rematch_votes: Default::default(),
            disconnected_player_id: None,
            disconnect_start: None,
            disconnect_timeout_ms: req.disconnect_timeout_ms,
            closed: false,
            close_reason: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        guard.chess = Some(C::new_game());
        let room = self.commit(&mut guard, room).await?;
        Ok(room)
    }

    pub async fn join(&self, player_id: &str, name: &str) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        let name = name.to_string();
        let stale_ms = self.cfg.room_stale_timeout_ms;
        self.run_op(move |room, _chess, now| {
            if room.closed {
                return Err(RoomError::RoomClosed);
            }
            if now - room.created_at > stale_ms {
                return Err(RoomError::RoomTooOld);
            }
            if room.phase != Phase::Lobby {
                return Err(RoomError::NotInLobby);
            }
            if room.has_player(&player_id) {
                return Ok(SideEffects::default());
            }
            if room.players.len() >= room.max_players {
                return Err(RoomError::RoomFull);
            }
            room.players.push(PlayerSlot {
                id: player_id,
                name,
                joined_at: now,
            });
            room.updated_at = now;
            Ok(SideEffects::default())
        })
        .await
    }

    pub async fn start_bidding(&self, player_id: &str) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        let start_timeout = self.cfg.start_confirm_timeout_ms;
        self.run_op(move |room, _chess, now| {
            if room.closed {
                return Err(RoomError::RoomClosed);
            }
            if room.phase != Phase::Lobby {
                return Err(RoomError::InvalidPhase);
            }
            if !room.has_player(&player_id) {
                return Err(RoomError::UnknownPlayer);
            }
            if room.players.len() < room.max_players {
                return Err(RoomError::NeedMorePlayers);
            }
            match room.start_requested_by.clone() {
                None => {
                    room.start_requested_by = Some(player_id);
                    room.start_confirm_deadline = Some(now + start_timeout);
                    room.updated_at = now;
                }
                Some(requester) => {
                    if now > room.start_confirm_deadline.unwrap_or(now) {
                        return Err(RoomError::StartRequestExpired);
                    }
                    if requester == player_id {
                        return Err(RoomError::AlreadyRequested);
                    }
                    room.phase = Phase::Bidding;
                    room.start_requested_by = None;
                    room.start_confirm_deadline = None;
                    room.bid_deadline = Some(now + room.bid_duration_ms);
                    room.bids.clear();
                    room.updated_at = now;
                }
            }
            Ok(SideEffects::default())
        })
        .await
    }

    pub async fn submit_bid(&self, player_id: &str, amount: i64) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        self.run_op(move |room, _chess, now| {
            if room.phase != Phase::Bidding {
                return Err(RoomError::NotBidding);
            }
            if !room.has_player(&player_id) {
                return Err(RoomError::UnknownPlayer);
            }
            if amount < 0 || amount > room.main_time_ms {
                return Err(RoomError::InvalidBidAmount);
            }
            if room.bids.contains_key(&player_id) {
                return Err(RoomError::AlreadyBid);
            }
            if let Some(dl) = room.bid_deadline {
                if now > dl {
                    return Err(RoomError::BiddingClosed);
                }
            }
            room.bids.insert(
                player_id,
                Bid {
                    amount,
                    submitted_at: now,
                },
            );
            room.updated_at = now;
            bidding::resolve_bidding_if_ready(room, now);
            Ok(SideEffects::default())
        })
        .await
    }

    pub async fn choose_color(&self, player_id: &str, color: Color) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        self.run_op(move |room, _chess, now| {
            if room.phase != Phase::ColorPick {
                return Err(RoomError::NotInColorPick);
            }
            if let Some(dl) = room.choice_deadline {
                if now > dl {
                    return Err(RoomError::ChoiceDeadlinePassed);
                }
            }
            let picker_role = room.current_picker.ok_or(RoomError::NotAllowedToChoose)?;
            let picker_id = room
                .role_player(picker_role)
                .ok_or(RoomError::NotAllowedToChoose)?;
            if picker_id != player_id {
                return Err(RoomError::NotAllowedToChoose);
            }

            let winner_ms = room.winning_bid_ms.ok_or(RoomError::Internal)?;
            let loser_ms = room.main_time_ms;
            let other = room
                .other_player(&player_id)
                .ok_or(RoomError::Internal)?;

            room.colors.insert(player_id.clone(), color);
            room.colors.insert(other, color.other());

            let (white_ms, black_ms) = match color {
                Color::White => (winner_ms, loser_ms),
                Color::Black => (loser_ms, winner_ms),
            };
            room.draw_odds_side = room
                .colors
                .iter()
                .find(|(_, c)| **c == Color::Black)
                .map(|(id, _)| id.clone());
            room.clocks = Some(Clocks {
                white_remaining_ms: white_ms,
                black_remaining_ms: black_ms,
                last_tick_at: now,
                turn: Color::White,
                frozen_at: None,
            });
            room.phase = Phase::Playing;
            room.choice_deadline = None;
            room.updated_at = now;
            Ok(SideEffects::default())
        })
        .await
    }

    pub async fn make_move(&self, player_id: &str, mv: &str) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        let mv = mv.to_string();
        let rematch_ms = self.cfg.rematch_window_ms;
        let rematch_insufficient_ms = self.cfg.rematch_window_insufficient_material_ms;
        self.run_op(move |room, chess, now| {
            if room.phase != Phase::Playing {
                return Err(RoomError::NotPlaying);
            }
            let mover_color = room
                .color_of(&player_id)
                .ok_or(RoomError::UnknownPlayerColor)?;
            let mut clocks = room.clocks.ok_or(RoomError::Internal)?;
            if clocks.turn != mover_color {
                return Err(RoomError::NotYourTurn);
            }

            let remaining_after = clock::deduct_elapsed(&mut clocks, now);
            if remaining_after <= 0 {
                clocks.frozen_at = Some(now);
                room.clocks = Some(clocks);
                let opponent_color = mover_color.other();
                let opponent_can_mate = clock::opponent_can_still_mate(chess, opponent_color);
                let opponent_id = room.other_player(&player_id);
                if opponent_can_mate {
                    room.result = Some(GameResult::TimeForfeit);
                    room.winner_id = opponent_id;
                    room.reason = None;
                    room.rematch_window_ends = Some(now + rematch_ms);
                } else {
                    room.result = Some(GameResult::Draw);
                    room.winner_id = None;
                    room.reason = Some("timeout_but_opponent_cannot_mate".to_string());
                    room.rematch_window_ends = Some(now + rematch_insufficient_ms);
                }
                room.phase = Phase::Finished;
                room.rematch_votes.clear();
                room.updated_at = now;
                return Ok(SideEffects::default());
            }

            let status = chess.try_move(&mv).map_err(|rej| match rej {
                MoveRejection::MalformedFormat => RoomError::InvalidMoveFormat,
                MoveRejection::Illegal => RoomError::IllegalMove,
            })?;

            room.game_fen = Some(chess.fen());
            room.moves.push(MoveRecord {
                by: player_id.clone(),
                mv,
                at: now,
            });
            clocks.last_tick_at = now;
            clocks.turn = mover_color.other();
            room.clocks = Some(clocks);
            if room.disconnected_player_id.as_deref() == Some(player_id.as_str()) {
                room.disconnected_player_id = None;
                room.disconnect_start = None;
            }
            room.updated_at = now;

            match status {
                TerminalStatus::Ongoing => {}
                TerminalStatus::Checkmate => {
                    room.phase = Phase::Finished;
                    room.result = Some(GameResult::Checkmate);
                    room.winner_id = Some(player_id);
                    room.reason = None;
                    room.rematch_window_ends = Some(now + rematch_ms);
                    room.rematch_votes.clear();
                    if let Some(c) = room.clocks.as_mut() {
                        c.frozen_at = Some(now);
                    }
                }
                other => {
                    room.phase = Phase::Finished;
                    room.result = Some(GameResult::Draw);
                    room.winner_id = None;
                    room.reason = other.draw_reason().map(|s| s.to_string());
                    room.rematch_window_ends = Some(now + rematch_ms);
                    room.rematch_votes.clear();
                    if let Some(c) = room.clocks.as_mut() {
                        c.frozen_at = Some(now);
                    }
                }
            }

            Ok(SideEffects::default())
        })
        .await
    }

    /// Let either player force a flag-fall check without submitting a move
    /// themselves — the gap `makeMove`'s own check doesn't cover when the
    /// side to move has abandoned the game rather than attempting an
    /// (even illegal) move. A no-op, not an error, if time hasn't actually
    /// run out yet: this is a probe, the same idempotent shape as
    /// `getState`, not a distinct phase of its own.
    pub async fn claim_time_forfeit(&self, player_id: &str) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        let rematch_ms = self.cfg.rematch_window_ms;
        let rematch_insufficient_ms = self.cfg.rematch_window_insufficient_material_ms;
        self.run_op(move |room, chess, now| {
            if room.phase != Phase::Playing {
                return Err(RoomError::NotPlaying);
            }
            if !room.has_player(&player_id) {
                return Err(RoomError::UnknownPlayer);
            }
            let clocks = room.clocks.ok_or(RoomError::Internal)?;
            let flagged_color = clocks.turn;
            let mut probe = clocks;
            let remaining_after = clock::deduct_elapsed(&mut probe, now);
            if remaining_after > 0 {
                return Ok(SideEffects::default());
            }

            probe.frozen_at = Some(now);
            room.clocks = Some(probe);
            let opponent_color = flagged_color.other();
            let opponent_can_mate = clock::opponent_can_still_mate(chess, opponent_color);
            let opponent_id = room
                .colors
                .iter()
                .find(|(_, c)| **c == opponent_color)
                .map(|(id, _)| id.clone());
            if opponent_can_mate {
                room.result = Some(GameResult::TimeForfeit);
                room.winner_id = opponent_id;
                room.reason = None;
                room.rematch_window_ends = Some(now + rematch_ms);
            } else {
                room.result = Some(GameResult::Draw);
                room.winner_id = None;
                room.reason = Some("timeout_but_opponent_cannot_mate".to_string());
                room.rematch_window_ends = Some(now + rematch_insufficient_ms);
            }
            room.phase = Phase::Finished;
            room.rematch_votes.clear();
            room.updated_at = now;
            Ok(SideEffects::default())
        })
        .await
    }

    pub async fn rematch(&self, player_id: &str, agree: bool) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        self.run_op(move |room, chess, now| {
            if room.phase != Phase::Finished {
                return Err(RoomError::NotFinished);
            }
            match room.rematch_window_ends {
                Some(dl) if now <= dl => {}
                _ => return Err(RoomError::RematchWindowClosed),
            }
            if room.rematch_votes.contains_key(&player_id) {
                return Err(RoomError::AlreadyVoted);
            }
            room.rematch_votes.insert(player_id.clone(), agree);
            room.updated_at = now;

            let mut effects = SideEffects::default();
            if !agree {
                let main_time_ms = room.main_time_ms;
                let yes_voters: Vec<(PlayerId, String)> = room
                    .players
                    .iter()
                    .filter(|p| room.rematch_votes.get(&p.id) == Some(&true))
                    .map(|p| (p.id.clone(), p.name.clone()))
                    .collect();
                close_room(room, now, CloseReason::DeclinedRematch);
                effects.reenqueue = yes_voters
                    .into_iter()
                    .map(|(id, name)| (id, name, main_time_ms))
                    .collect();
            } else if room
                .player_ids()
                .iter()
                .all(|pid| room.rematch_votes.get(pid) == Some(&true))
            {
                reset_for_rematch(room, now);
                *chess = C::new_game();
            }
            Ok(effects)
        })
        .await
    }

    pub async fn leave(&self, player_id: &str) -> Result<Room, RoomError> {
        let player_id = player_id.to_string();
        self.run_op(move |room, _chess, now| {
            room.players.retain(|p| p.id != player_id);
            room.updated_at = now;
            Ok(SideEffects::default())
        })
        .await
    }

    pub async fn heartbeat(&self, player_id: &str) -> Result<Room, RoomError> {
        if player_id.is_empty() {
            return Err(RoomError::PlayerIdRequired);
        }
        self.run_op(move |room, _chess, now| {
            room.updated_at = now;
            Ok(SideEffects::default())
        })
        .await
    }

    pub async fn get_state(&self) -> Result<Room, RoomError> {
        let now = now_ms();
        let mut guard = self.inner.lock().await;
        if guard.destroyed {
            return Err(RoomError::RoomExpired);
        }
        self.apply_lazy_locked(&mut guard, now).await
    }

    pub async fn subscribe(
        &self,
        player_id: Option<&str>,
    ) -> Result<(u64, mpsc::UnboundedReceiver<Arc<RoomServerMessage>>, Room), RoomError> {
        if player_id.map(str::is_empty).unwrap_or(true) {
            return Err(RoomError::PlayerIdRequired);
        }
        let now = now_ms();
        let mut guard = self.inner.lock().await;
        if guard.destroyed {
            return Err(RoomError::RoomExpired);
        }
        let room = self.apply_lazy_locked(&mut guard, now).await?;
        let (id, rx) = guard.fanout.subscribe();
        Ok((id, rx, room))
    }

    pub async fn unsubscribe(&self, id: u64) {
        let mut guard = self.inner.lock().await;
        guard.fanout.unsubscribe(id);
    }

    async fn run_op<F>(&self, f: F) -> Result<Room, RoomError>
    where
        F: FnOnce(&mut Room, &mut C, i64) -> Result<SideEffects, RoomError>,
    {
        let now = now_ms();
        let mut guard = self.inner.lock().await;
        if guard.destroyed {
            return Err(RoomError::RoomExpired);
        }
        let mut room = self.apply_lazy_locked(&mut guard, now).await?;
        let chess = guard.chess.as_mut().ok_or(RoomError::Internal)?;
        let effects = f(&mut room, chess, now)?;
        let room = self.commit(&mut guard, room).await?;
        drop(guard);
        self.apply_side_effects(&effects).await;
        Ok(room)
    }

    async fn apply_lazy_locked(
        &self,
        guard: &mut MutexGuard<'_, Inner<C>>,
        now: i64,
    ) -> Result<Room, RoomError> {
        let mut room = guard.room.clone().ok_or(RoomError::Internal)?;
        let outcome = lazy::advance(&mut room, now, &self.cfg);
        if outcome.expired {
            guard.destroyed = true;
            if let Err(e) = self.store.delete_raw("room").await {
                warn!(room_id = %self.room_id, error = %e, "failed to delete expired room from store");
            }
            if let Some(index) = &self.index {
                index.remove(&self.room_id).await;
            }
            return Err(RoomError::RoomExpired);
        }
        if outcome.changed {
            room = self.commit(guard, room).await?;
            if !outcome.reenqueue.is_empty() {
                let effects = SideEffects {
                    reenqueue: outcome
                        .reenqueue
                        .into_iter()
                        .map(|(id, name)| (id, name, room.main_time_ms))
                        .collect(),
                };
                self.apply_side_effects(&effects).await;
            }
        }
        Ok(room)
    }

    async fn commit(
        &self,
        guard: &mut MutexGuard<'_, Inner<C>>,
        room: Room,
    ) -> Result<Room, RoomError> {
        let value = serde_json::to_value(&room).map_err(|e| {
            error!(room_id = %self.room_id, error = %e, "failed to encode room for storage");
            RoomError::Internal
        })?;
        if let Err(e) = self.store.put_raw("room", value).await {
            error!(room_id = %self.room_id, error = %e, "failed to persist room state");
            return Err(RoomError::Internal);
        }
        guard.room = Some(room.clone());
        guard
            .fanout
            .broadcast(RoomServerMessage::Update { room: room.clone() });
        if let Some(index) = &self.index {
            if room.closed {
                index.remove(&self.room_id).await;
            } else {
                index.update(IndexEntry::from_room(&room)).await;
            }
        }
        Ok(room)
    }

    async fn apply_side_effects(&self, effects: &SideEffects) {
        let Some(index) = &self.index else { return };
        for (player_id, name, main_time_ms) in &effects.reenqueue {
            index.add_to_queue(player_id.clone(), name.clone(), *main_time_ms).await;
        }
    }
}

fn close_room(room: &mut Room, now: i64, reason: CloseReason) {
    room.closed = true;
    room.close_reason = Some(reason);
    room.closed_at = Some(now);
    room.updated_at = now;
}

fn reset_for_rematch(room: &mut Room, now: i64) {
    room.phase = Phase::Lobby;
    room.bids.clear();
    room.bid_deadline = None;
    room.start_requested_by = None;
    room.start_confirm_deadline = None;
    room.winner_id = None;
    room.loser_id = None;
    room.winning_bid_ms = None;
    room.losing_bid_ms = None;
    room.current_picker = None;
    room.choice_attempts = 0;
    room.choice_deadline = None;
    room.colors.clear();
    room.draw_odds_side = None;
    room.clocks = None;
    room.moves.clear();
    room.game_fen = None;
    room.result = None;
    room.reason = None;
    room.rematch_window_ends = None;
    room.rematch_votes.clear();
    room.disconnected_player_id = None;
    room.disconnect_start = None;
    room.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::ScriptedPosition;
    use crate::store::InMemoryStore;

    fn cfg() -> RoomTimeouts {
        RoomTimeouts {
            start_confirm_timeout_ms: 60_000,
            rematch_window_ms: 60_000,
            rematch_window_insufficient_material_ms: 10_000,
            disconnect_timeout_ms: 45_000,
            disconnect_silence_ms: 10_000,
            room_stale_timeout_ms: 5 * 60_000,
        }
    }

    fn actor() -> RoomActor<ScriptedPosition> {
        RoomActor::new(
            "room-1".to_string(),
            Arc::new(InMemoryStore::new()),
            None,
            cfg(),
        )
    }

    async fn init_full_room(actor: &RoomActor<ScriptedPosition>) -> Room {
        actor
            .init(RoomInit {
                room_id: "room-1".to_string(),
                private: false,
                main_time_ms: 300_000,
                bid_duration_ms: 30_000,
                choice_duration_ms: 15_000,
                disconnect_timeout_ms: 45_000,
                seed_players: vec![
                    ("alice".to_string(), "Alice".to_string()),
                    ("bob".to_string(), "Bob".to_string()),
                ],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn join_is_idempotent_for_same_player() {
        let actor = actor();
        actor
            .init(RoomInit {
                room_id: "room-1".to_string(),
                private: false,
                main_time_ms: 300_000,
                bid_duration_ms: 30_000,
                choice_duration_ms: 15_000,
                disconnect_timeout_ms: 45_000,
                seed_players: vec![],
            })
            .await
            .unwrap();
        actor.join("alice", "Alice").await.unwrap();
        let room = actor.join("alice", "Alice").await.unwrap();
        assert_eq!(room.players.len(), 1);
    }

    #[tokio::test]
    async fn second_start_bidding_by_different_player_transitions_phase() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        let room = actor.start_bidding("bob").await.unwrap();
        assert_eq!(room.phase, Phase::Bidding);
    }

    #[tokio::test]
    async fn same_player_double_start_bidding_is_already_requested() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        let err = actor.start_bidding("alice").await.unwrap_err();
        assert_eq!(err, RoomError::AlreadyRequested);
    }

    #[tokio::test]
    async fn full_bid_to_color_pick_to_playing_flow() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        actor.start_bidding("bob").await.unwrap();
        actor.submit_bid("alice", 30_000).await.unwrap();
        let room = actor.submit_bid("bob", 45_000).await.unwrap();
        assert_eq!(room.phase, Phase::ColorPick);
        assert_eq!(room.winner_id.as_deref(), Some("alice"));

        let room = actor.choose_color("alice", Color::White).await.unwrap();
        assert_eq!(room.phase, Phase::Playing);
        let clocks = room.clocks.unwrap();
        assert_eq!(clocks.white_remaining_ms, 30_000);
        assert_eq!(clocks.black_remaining_ms, 300_000);
    }

    #[tokio::test]
    async fn equal_bids_restart_the_round() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        actor.start_bidding("bob").await.unwrap();
        actor.submit_bid("alice", 40_000).await.unwrap();
        let room = actor.submit_bid("bob", 40_000).await.unwrap();
        assert_eq!(room.phase, Phase::Bidding);
        assert!(room.bids.is_empty());
    }

    #[tokio::test]
    async fn move_out_of_turn_is_rejected() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        actor.start_bidding("bob").await.unwrap();
        actor.submit_bid("alice", 30_000).await.unwrap();
        actor.submit_bid("bob", 45_000).await.unwrap();
        actor.choose_color("alice", Color::White).await.unwrap();
        let err = actor.make_move("bob", "e7e5").await.unwrap_err();
        assert_eq!(err, RoomError::NotYourTurn);
    }

    #[tokio::test]
    async fn rematch_decline_closes_room() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        actor.start_bidding("bob").await.unwrap();
        actor.submit_bid("alice", 30_000).await.unwrap();
        actor.submit_bid("bob", 45_000).await.unwrap();
        actor.choose_color("alice", Color::White).await.unwrap();
        // Force a finished game directly for the purposes of this test.
        {
            let mut guard = actor.inner.lock().await;
            let mut room = guard.room.clone().unwrap();
            room.phase = Phase::Finished;
            room.result = Some(GameResult::Checkmate);
            room.winner_id = Some("alice".to_string());
            room.rematch_window_ends = Some(now_ms() + 60_000);
            guard.room = Some(room);
        }
        actor.rematch("alice", true).await.unwrap();
        let room = actor.rematch("bob", false).await.unwrap();
        assert!(room.closed);
        assert_eq!(room.close_reason, Some(CloseReason::DeclinedRematch));
    }

    #[tokio::test]
    async fn unanimous_rematch_resets_to_lobby() {
        let actor = actor();
        init_full_room(&actor).await;
        {
            let mut guard = actor.inner.lock().await;
            let mut room = guard.room.clone().unwrap();
            room.phase = Phase::Finished;
            room.result = Some(GameResult::Checkmate);
            room.winner_id = Some("alice".to_string());
            room.rematch_window_ends = Some(now_ms() + 60_000);
            guard.room = Some(room);
        }
        actor.rematch("alice", true).await.unwrap();
        let room = actor.rematch("bob", true).await.unwrap();
        assert_eq!(room.phase, Phase::Lobby);
        assert_eq!(room.players.len(), 2);
        assert!(room.result.is_none());
    }

    #[tokio::test]
    async fn claim_time_forfeit_is_a_noop_before_the_flag_falls() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        actor.start_bidding("bob").await.unwrap();
        actor.submit_bid("alice", 30_000).await.unwrap();
        actor.submit_bid("bob", 45_000).await.unwrap();
        actor.choose_color("alice", Color::White).await.unwrap();
        let room = actor.claim_time_forfeit("bob").await.unwrap();
        assert_eq!(room.phase, Phase::Playing);
    }

    #[tokio::test]
    async fn claim_time_forfeit_ends_the_game_once_the_clock_is_spent() {
        let actor = actor();
        init_full_room(&actor).await;
        actor.start_bidding("alice").await.unwrap();
        actor.start_bidding("bob").await.unwrap();
        actor.submit_bid("alice", 30_000).await.unwrap();
        actor.submit_bid("bob", 45_000).await.unwrap();
        actor.choose_color("alice", Color::White).await.unwrap();
        {
            let mut guard = actor.inner.lock().await;
            let mut room = guard.room.clone().unwrap();
            let mut clocks = room.clocks.unwrap();
            clocks.last_tick_at = now_ms() - 40_000;
            room.clocks = Some(clocks);
            guard.room = Some(room);
        }
        let room = actor.claim_time_forfeit("bob").await.unwrap();
        assert_eq!(room.phase, Phase::Finished);
        assert_eq!(room.result, Some(GameResult::TimeForfeit));
        assert_eq!(room.winner_id.as_deref(), Some("bob"));
    }
}
