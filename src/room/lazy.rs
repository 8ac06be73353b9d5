//! The lazy-driver pass from `spec.md` §4.1 "Lazy drivers": every
//! operation (and `getState` in particular) must advance deadline-based
//! transitions before doing anything else. There are no timers anywhere in
//! this module — everything is a comparison against `now`.

use super::bidding;
use super::{close_room, RoomTimeouts};
use crate::protocol::{BidRole, CloseReason, GameResult, Phase, PlayerId, Room};

#[derive(Default)]
pub struct LazyOutcome {
    /// Whether any field changed and needs persisting/broadcasting.
    pub changed: bool,
    /// The room crossed its 5-minute stale threshold and must be torn
    /// down entirely (dropped from the index and durable store).
    pub expired: bool,
    /// Players to re-enqueue with the room's time control as a result of
    /// a rematch-window timeout (declines are handled inline by `rematch`
    /// itself, not here).
    pub reenqueue: Vec<(PlayerId, String)>,
}

pub fn advance(room: &mut Room, now: i64, cfg: &RoomTimeouts) -> LazyOutcome {
    let mut outcome = LazyOutcome::default();

    // 1. Bid resolution.
    if room.phase == Phase::Bidding && bidding::resolve_bidding_if_ready(room, now) {
        outcome.changed = true;
    }

    // 2. Color-pick timeout rotation.
    if room.phase == Phase::ColorPick && rotate_color_pick_if_expired(room, now, cfg) {
        outcome.changed = true;
    }

    // 3. Room expiry — terminal, short-circuits the rest of the pass.
    if !room.closed && now - room.updated_at > cfg.room_stale_timeout_ms {
        outcome.changed = true;
        outcome.expired = true;
        return outcome;
    }

    // 4. Start-request expiry.
    if room.phase == Phase::Lobby && expire_start_request_if_needed(room, now) {
        outcome.changed = true;
    }

    // 5. PLAYING disconnect detection and enforcement.
    if room.phase == Phase::Playing && advance_disconnect(room, now, cfg) {
        outcome.changed = true;
    }

    // 6. Post-game rematch window expiry.
    if room.phase == Phase::Finished {
        let reenqueue = expire_rematch_window_if_needed(room, now);
        if !reenqueue.is_empty() || (room.closed && room.close_reason == Some(CloseReason::RematchTimeout) && room.updated_at == now) {
            outcome.changed = true;
        }
        outcome.reenqueue = reenqueue;
    }

    outcome
}

fn rotate_color_pick_if_expired(room: &mut Room, now: i64, cfg: &RoomTimeouts) -> bool {
    let deadline = match room.choice_deadline {
        Some(d) => d,
        None => return false,
    };
    if now <= deadline {
        return false;
    }

    room.choice_attempts += 1;
    if room.choice_attempts >= 4 {
        room.phase = Phase::Finished;
        room.winner_id = None;
        room.result = Some(GameResult::Draw);
        room.reason = Some("color_pick_exhausted".to_string());
        room.choice_deadline = None;
        room.rematch_window_ends = Some(now + cfg.rematch_window_ms);
        room.rematch_votes.clear();
    } else {
        room.current_picker = room.current_picker.map(BidRole::other);
        room.choice_deadline = Some(now + room.choice_duration_ms);
    }
    room.updated_at = now;
    true
}

fn expire_start_request_if_needed(room: &mut Room, now: i64) -> bool {
    if room.closed {
        return false;
    }
    let deadline = match room.start_confirm_deadline {
        Some(d) => d,
        None => return false,
    };
    if now <= deadline {
        return false;
    }
    close_room(room, now, CloseReason::StartExpired);
    room.start_requested_by = None;
    room.start_confirm_deadline = None;
    true
}

fn advance_disconnect(room: &mut Room, now: i64, cfg: &RoomTimeouts) -> bool {
    let clocks = match room.clocks {
        Some(c) => c,
        None => return false,
    };

    match room.disconnected_player_id.clone() {
        None => {
            if now - room.updated_at <= cfg.disconnect_silence_ms {
                return false;
            }
            // Heuristic: the side currently to move is the one still
            // interacting; the waiting side is assumed absent. Preserved
            // as specified even though it misfires if the *moving* side
            // is the one that actually went silent.
            let waiting_color = clocks.turn.other();
            let waiting_player = room
                .colors
                .iter()
                .find(|(_, c)| **c == waiting_color)
                .map(|(id, _)| id.clone());
            match waiting_player {
                Some(pid) => {
                    room.disconnected_player_id = Some(pid);
                    room.disconnect_start = Some(now);
                    room.updated_at = now;
                    true
                }
                None => false,
            }
        }
        Some(disconnected) => {
            let start = room.disconnect_start.unwrap_or(now);
            if now - start <= room.disconnect_timeout_ms {
                return false;
            }
            let winner = room.other_player(&disconnected);
            room.phase = Phase::Finished;
            room.result = Some(GameResult::DisconnectForfeit);
            room.winner_id = winner;
            room.reason = None;
            if let Some(c) = room.clocks.as_mut() {
                c.frozen_at = Some(now);
            }
            // A vanished opponent can't vote on a rematch; close the room
            // immediately rather than opening a window nobody will answer.
            close_room(room, now, CloseReason::DisconnectForfeit);
            true
        }
    }
}

fn expire_rematch_window_if_needed(room: &mut Room, now: i64) -> Vec<(PlayerId, String)> {
    if room.closed {
        return Vec::new();
    }
    let deadline = match room.rematch_window_ends {
        Some(d) => d,
        None => return Vec::new(),
    };
    if now <= deadline {
        return Vec::new();
    }

    let reenqueue: Vec<(PlayerId, String)> = room
        .players
        .iter()
        .filter(|p| room.rematch_votes.get(&p.id) == Some(&true))
        .map(|p| (p.id.clone(), p.name.clone()))
        .collect();

    close_room(room, now, CloseReason::RematchTimeout);
    reenqueue
}
