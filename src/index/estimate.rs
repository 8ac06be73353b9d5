//! Wait-time estimation for matchmaking queues, per `spec.md` §4.2: return
//! `match_now` when someone is already waiting, `none` when no games for
//! this time control are running, otherwise the remaining time on the game
//! closest to ending — anchored to one specific game by id/start/duration so
//! the displayed ETA doesn't jitter as fresh clock snapshots arrive.

use serde::{Deserialize, Serialize, Serializer};

use crate::protocol::RoomId;

/// One PLAYING room for a given time control, as the estimator sees it.
#[derive(Debug, Clone)]
pub struct ActiveGame {
    pub room_id: RoomId,
    pub started_at: i64,
    pub duration_ms: i64,
    pub remaining_ms: i64,
}

/// Which game the last estimate was anchored to, persisted under
/// `estimate_anchor_<timeControl>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub room_id: RoomId,
    pub started_at: i64,
    pub duration_ms: i64,
}

pub fn anchor_key(time_control_ms: i64) -> String {
    format!("estimate_anchor_{time_control_ms}")
}

/// `spec.md` §4.2's three wait-time states: an immediate match, nothing to
/// estimate from, or a concrete millisecond ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEstimate {
    MatchNow,
    None,
    Ms(i64),
}

impl Serialize for QueueEstimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueueEstimate::MatchNow => serializer.serialize_str("match_now"),
            QueueEstimate::None => serializer.serialize_str("none"),
            QueueEstimate::Ms(ms) => serializer.serialize_i64(*ms),
        }
    }
}

/// Compute this tick's estimate, plus a fresh anchor to persist if the
/// previous one no longer matches any active game (`None` means keep
/// whatever was already stored).
pub fn estimate(
    active_games: &[ActiveGame],
    queue_depth: usize,
    anchor: Option<&Anchor>,
    now: i64,
) -> (QueueEstimate, Option<Anchor>) {
    if queue_depth >= 1 {
        return (QueueEstimate::MatchNow, None);
    }
    let Some(closest) = active_games.iter().min_by_key(|g| g.remaining_ms) else {
        return (QueueEstimate::None, None);
    };

    if let Some(anchor) = anchor {
        if active_games.iter().any(|g| {
            g.room_id == anchor.room_id
                && g.started_at == anchor.started_at
                && g.duration_ms == anchor.duration_ms
        }) {
            let remaining = (anchor.started_at + anchor.duration_ms - now).max(0);
            return (QueueEstimate::Ms(remaining), None);
        }
    }

    let fresh = Anchor {
        room_id: closest.room_id.clone(),
        started_at: closest.started_at,
        duration_ms: closest.duration_ms,
    };
    let remaining = (fresh.started_at + fresh.duration_ms - now).max(0);
    (QueueEstimate::Ms(remaining), Some(fresh))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(room_id: &str, started_at: i64, duration_ms: i64, remaining_ms: i64) -> ActiveGame {
        ActiveGame {
            room_id: room_id.to_string(),
            started_at,
            duration_ms,
            remaining_ms,
        }
    }

    #[test]
    fn nonempty_queue_is_always_match_now() {
        let (est, anchor) = estimate(&[game("r1", 0, 300_000, 200_000)], 1, None, 50_000);
        assert_eq!(est, QueueEstimate::MatchNow);
        assert!(anchor.is_none());
    }

    #[test]
    fn no_active_games_and_empty_queue_is_none() {
        let (est, anchor) = estimate(&[], 0, None, 0);
        assert_eq!(est, QueueEstimate::None);
        assert!(anchor.is_none());
    }

    #[test]
    fn fresh_anchor_picks_the_game_closest_to_ending() {
        let games = vec![
            game("far", 0, 600_000, 400_000),
            game("near", 0, 300_000, 50_000),
        ];
        let (est, anchor) = estimate(&games, 0, None, 10_000);
        let anchor = anchor.expect("should anchor when none was stored");
        assert_eq!(anchor.room_id, "near");
        assert_eq!(est, QueueEstimate::Ms(300_000 - 10_000));
    }

    #[test]
    fn matching_anchor_is_reused_without_rescanning_remaining_ms() {
        let anchor = Anchor {
            room_id: "r1".to_string(),
            started_at: 1_000,
            duration_ms: 300_000,
        };
        let games = vec![game("r1", 1_000, 300_000, 9_999)];
        let (est, fresh) = estimate(&games, 0, Some(&anchor), 101_000);
        assert_eq!(est, QueueEstimate::Ms(1_000 + 300_000 - 101_000));
        assert!(fresh.is_none());
    }

    #[test]
    fn stale_anchor_is_replaced_when_its_game_is_gone() {
        let anchor = Anchor {
            room_id: "finished".to_string(),
            started_at: 0,
            duration_ms: 300_000,
        };
        let games = vec![game("r2", 5_000, 300_000, 100_000)];
        let (_, fresh) = estimate(&games, 0, Some(&anchor), 10_000);
        let fresh = fresh.expect("stale anchor should be replaced");
        assert_eq!(fresh.room_id, "r2");
    }
}
