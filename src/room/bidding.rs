//! The bid-resolution algorithm from `spec.md` §4.1, kept as pure
//! functions so the tie-restart/winner-selection logic can be unit tested
//! without spinning up a whole `RoomActor`.

use crate::protocol::{Bid, BidRole, Phase, PlayerId, Room};

/// Outcome of a completed (non-restarted) bid round.
pub struct Resolution {
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub winning_bid_ms: i64,
    pub losing_bid_ms: i64,
}

pub enum Outcome {
    /// Not enough information yet (a bid is still missing and the deadline
    /// hasn't passed).
    Pending,
    /// Equal bids: the round restarts with a fresh deadline and empty bids.
    TieRestart,
    Resolved(Resolution),
}

/// Evaluate the two bids for `p1`/`p2` (join order). `deadline_passed`
/// tells the caller whether missing bids should be defaulted to
/// `main_time_ms` per step 3 of the algorithm; the caller is responsible
/// for actually writing that default back into `bids` before re-entering
/// here once both are present.
pub fn resolve(
    p1: &PlayerId,
    p2: &PlayerId,
    bids: &std::collections::HashMap<PlayerId, Bid>,
    deadline_passed: bool,
) -> Outcome {
    let b1 = bids.get(p1);
    let b2 = bids.get(p2);

    match (b1, b2) {
        (Some(b1), Some(b2)) => {
            if b1.amount == b2.amount {
                Outcome::TieRestart
            } else if b1.amount < b2.amount {
                Outcome::Resolved(Resolution {
                    winner_id: p1.clone(),
                    loser_id: p2.clone(),
                    winning_bid_ms: b1.amount,
                    losing_bid_ms: b2.amount,
                })
            } else {
                Outcome::Resolved(Resolution {
                    winner_id: p2.clone(),
                    loser_id: p1.clone(),
                    winning_bid_ms: b2.amount,
                    losing_bid_ms: b1.amount,
                })
            }
        }
        _ if deadline_passed => {
            // Caller must have already filled in defaults; if either is
            // still missing here, treat as pending rather than panic.
            Outcome::Pending
        }
        _ => Outcome::Pending,
    }
}

/// Drive a BIDDING room forward: fills in defaulted bids once the deadline
/// has passed, then applies [`resolve`]. Returns whether the room changed
/// (either resolved into COLOR_PICK or restarted with a fresh deadline).
/// Used both by `submitBid` (right after a bid is recorded) and by the
/// lazy-driver pass (once the deadline alone has elapsed).
pub fn resolve_bidding_if_ready(room: &mut Room, now: i64) -> bool {
    if room.phase != Phase::Bidding {
        return false;
    }
    let mut ids = room.players.iter().map(|p| p.id.clone());
    let (p1, p2) = match (ids.next(), ids.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };

    let deadline_passed = room.bid_deadline.map(|d| now > d).unwrap_or(false);
    if deadline_passed {
        for pid in [&p1, &p2] {
            room.bids.entry(pid.clone()).or_insert(Bid {
                amount: room.main_time_ms,
                submitted_at: now,
            });
        }
    }

    match resolve(&p1, &p2, &room.bids, deadline_passed) {
        Outcome::Pending => false,
        Outcome::TieRestart => {
            room.bids.clear();
            room.bid_deadline = Some(now + room.bid_duration_ms);
            room.updated_at = now;
            true
        }
        Outcome::Resolved(res) => {
            room.winner_id = Some(res.winner_id);
            room.loser_id = Some(res.loser_id);
            room.winning_bid_ms = Some(res.winning_bid_ms);
            room.losing_bid_ms = Some(res.losing_bid_ms);
            room.phase = Phase::ColorPick;
            room.current_picker = Some(BidRole::Winner);
            room.choice_attempts = 0;
            room.choice_deadline = Some(now + room.choice_duration_ms);
            room.bid_deadline = None;
            room.updated_at = now;
            true
        }
    }
}

/// Deterministic comparison order for bids, used only for tie-break display
/// and tests: amount ascending, then submission time ascending, then
/// player id lexicographic ascending.
pub fn sort_bids(entries: &mut [(PlayerId, Bid)]) {
    entries.sort_by(|(id_a, a), (id_b, b)| {
        a.amount
            .cmp(&b.amount)
            .then(a.submitted_at.cmp(&b.submitted_at))
            .then(id_a.cmp(id_b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(amount: i64, at: i64) -> Bid {
        Bid {
            amount,
            submitted_at: at,
        }
    }

    #[test]
    fn lower_bid_wins() {
        let mut bids = std::collections::HashMap::new();
        bids.insert("p1".to_string(), bid(30_000, 100));
        bids.insert("p2".to_string(), bid(45_000, 100));

        match resolve(&"p1".to_string(), &"p2".to_string(), &bids, false) {
            Outcome::Resolved(r) => {
                assert_eq!(r.winner_id, "p1");
                assert_eq!(r.loser_id, "p2");
                assert_eq!(r.winning_bid_ms, 30_000);
                assert_eq!(r.losing_bid_ms, 45_000);
            }
            _ => panic!("expected resolution"),
        }
    }

    #[test]
    fn equal_bids_restart() {
        let mut bids = std::collections::HashMap::new();
        bids.insert("p1".to_string(), bid(50_000, 100));
        bids.insert("p2".to_string(), bid(50_000, 200));

        assert!(matches!(
            resolve(&"p1".to_string(), &"p2".to_string(), &bids, false),
            Outcome::TieRestart
        ));
    }

    #[test]
    fn missing_bid_before_deadline_is_pending() {
        let mut bids = std::collections::HashMap::new();
        bids.insert("p1".to_string(), bid(10_000, 100));

        assert!(matches!(
            resolve(&"p1".to_string(), &"p2".to_string(), &bids, false),
            Outcome::Pending
        ));
    }

    #[test]
    fn sort_orders_by_amount_then_time_then_id() {
        let mut entries = vec![
            ("zzz".to_string(), bid(100, 5)),
            ("aaa".to_string(), bid(100, 5)),
            ("mmm".to_string(), bid(50, 9)),
        ];
        sort_bids(&mut entries);
        assert_eq!(entries[0].0, "mmm");
        assert_eq!(entries[1].0, "aaa");
        assert_eq!(entries[2].0, "zzz");
    }
}
