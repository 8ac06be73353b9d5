//! Matchmaking queues: one FIFO per supported time control, from
//! `spec.md` §4.2. Matching is pull-based — a queue only produces a match
//! when something asks it to (`add`, `checkMatch`), never on a timer.

use std::collections::HashMap;

use crate::protocol::{IndexError, PlayerId};

#[derive(Debug, Clone)]
struct QueueEntry {
    player_id: PlayerId,
    name: String,
    joined_at: i64,
    last_seen: i64,
}

/// Two players pulled off the same time-control queue, ready for the
/// router to turn into a room.
#[derive(Debug, Clone)]
pub struct MatchDirective {
    pub time_control_ms: i64,
    pub players: Vec<(PlayerId, String)>,
}

pub struct Queues {
    supported_ms: Vec<i64>,
    by_time_control: HashMap<i64, Vec<QueueEntry>>,
}

impl Queues {
    pub fn new(supported_ms: &[i64]) -> Self {
        Self {
            supported_ms: supported_ms.to_vec(),
            by_time_control: supported_ms.iter().map(|tc| (*tc, Vec::new())).collect(),
        }
    }

    fn supported(&self, time_control_ms: i64) -> bool {
        self.supported_ms.contains(&time_control_ms)
    }

    pub fn add(
        &mut self,
        time_control_ms: i64,
        player_id: PlayerId,
        name: String,
        now: i64,
    ) -> Result<Option<MatchDirective>, IndexError> {
        if !self.supported(time_control_ms) {
            return Err(IndexError::InvalidTimeControl);
        }
        let queue = self.by_time_control.entry(time_control_ms).or_default();
        queue.retain(|e| e.player_id != player_id);
        queue.push(QueueEntry {
            player_id,
            name,
            joined_at: now,
            last_seen: now,
        });
        Ok(Self::pop_match(queue, time_control_ms))
    }

    /// Enqueue into every supported time control; matches found along the
    /// way (unlikely but possible if another player is already waiting on
    /// more than one queue) are all returned.
    pub fn add_all(&mut self, player_id: PlayerId, name: String, now: i64) -> Vec<MatchDirective> {
        let tcs = self.supported_ms.clone();
        let mut directives = Vec::new();
        for tc in tcs {
            if let Ok(Some(d)) = self.add(tc, player_id.clone(), name.clone(), now) {
                directives.push(d);
            }
        }
        directives
    }

    pub fn remove_everywhere(&mut self, player_id: &str) {
        for queue in self.by_time_control.values_mut() {
            queue.retain(|e| e.player_id != player_id);
        }
    }

    pub fn check_match(&mut self, time_control_ms: i64) -> Option<MatchDirective> {
        let queue = self.by_time_control.get_mut(&time_control_ms)?;
        Self::pop_match(queue, time_control_ms)
    }

    fn pop_match(queue: &mut Vec<QueueEntry>, time_control_ms: i64) -> Option<MatchDirective> {
        if queue.len() < 2 {
            return None;
        }
        let a = queue.remove(0);
        let b = queue.remove(0);
        Some(MatchDirective {
            time_control_ms,
            players: vec![(a.player_id, a.name), (b.player_id, b.name)],
        })
    }

    pub fn heartbeat(&mut self, player_id: &str, now: i64) {
        for queue in self.by_time_control.values_mut() {
            for entry in queue.iter_mut() {
                if entry.player_id == player_id {
                    entry.last_seen = now;
                }
            }
        }
    }

    /// Drop entries idle longer than `timeout_ms`. Returns whether
    /// anything was actually removed, so the caller only re-persists when
    /// it matters.
    pub fn cleanup_stale(&mut self, now: i64, timeout_ms: i64) -> bool {
        let mut changed = false;
        for queue in self.by_time_control.values_mut() {
            let before = queue.len();
            queue.retain(|e| now - e.last_seen <= timeout_ms);
            changed |= queue.len() != before;
        }
        changed
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.by_time_control
            .values()
            .any(|q| q.iter().any(|e| e.player_id == player_id))
    }

    pub fn depth(&self, time_control_ms: i64) -> usize {
        self.by_time_control
            .get(&time_control_ms)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn clear(&mut self) {
        for queue in self.by_time_control.values_mut() {
            queue.clear();
        }
    }

    /// A plain, serializable view for the durable store.
    pub fn snapshot(&self) -> HashMap<String, Vec<(PlayerId, String, i64, i64)>> {
        self.by_time_control
            .iter()
            .map(|(tc, entries)| {
                let rows = entries
                    .iter()
                    .map(|e| (e.player_id.clone(), e.name.clone(), e.joined_at, e.last_seen))
                    .collect();
                (tc.to_string(), rows)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_time_control_is_rejected() {
        let mut q = Queues::new(&[300_000]);
        let err = q
            .add(999, "a".to_string(), "A".to_string(), 0)
            .unwrap_err();
        assert_eq!(err, IndexError::InvalidTimeControl);
    }

    #[test]
    fn two_entrants_produce_a_match_fifo_order() {
        let mut q = Queues::new(&[300_000]);
        assert!(q.add(300_000, "a".to_string(), "A".to_string(), 0).unwrap().is_none());
        let directive = q
            .add(300_000, "b".to_string(), "B".to_string(), 1)
            .unwrap()
            .expect("match");
        assert_eq!(directive.players[0].0, "a");
        assert_eq!(directive.players[1].0, "b");
        assert_eq!(q.depth(300_000), 0);
    }

    #[test]
    fn cleanup_stale_drops_idle_entries() {
        let mut q = Queues::new(&[300_000]);
        q.add(300_000, "a".to_string(), "A".to_string(), 0).unwrap();
        let changed = q.cleanup_stale(100_000, 5_000);
        assert!(changed);
        assert_eq!(q.depth(300_000), 0);
    }

    #[test]
    fn re_adding_the_same_player_does_not_duplicate_them() {
        let mut q = Queues::new(&[300_000]);
        q.add(300_000, "a".to_string(), "A".to_string(), 0).unwrap();
        q.add(300_000, "a".to_string(), "A".to_string(), 1).unwrap();
        assert_eq!(q.depth(300_000), 1);
    }
}
