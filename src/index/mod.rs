//! The index actor: the shared directory of open rooms plus the
//! matchmaking queues, from `spec.md` §4.2. Like `RoomActor`, this is a
//! `tokio::sync::Mutex`-guarded struct rather than a literal mailbox task —
//! a single process-wide instance, so there's no per-entity fan-out to
//! justify the extra machinery.

mod estimate;
mod queue;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::error;

use crate::broadcast::Fanout;
use crate::protocol::{Clocks, IndexError, Phase, PlayerId, QueueServerMessage, Room, RoomId};
use crate::store::{DynStore, StoreExt};

pub use estimate::QueueEstimate;
pub use queue::MatchDirective;
use queue::Queues;

/// The directory's view of one room: just enough to list/filter open rooms
/// and drive the wait-time estimator without handing out the full `Room`
/// record (which the room's own subscriber channel is for).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub room_id: RoomId,
    pub phase: Phase,
    pub player_ids: Vec<PlayerId>,
    pub private: bool,
    pub main_time_ms: i64,
    pub clocks: Option<Clocks>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl IndexEntry {
    pub fn from_room(room: &Room) -> Self {
        Self {
            room_id: room.room_id.clone(),
            phase: room.phase,
            player_ids: room.player_ids(),
            private: room.private,
            main_time_ms: room.main_time_ms,
            clocks: room.clocks,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

struct State {
    rooms: HashMap<RoomId, IndexEntry>,
    queues: Queues,
    fanout: Fanout<QueueServerMessage>,
}

pub struct IndexActor {
    state: Mutex<State>,
    store: DynStore,
}

impl IndexActor {
    pub fn new(store: DynStore, supported_time_controls_ms: &[i64]) -> Self {
        Self {
            state: Mutex::new(State {
                rooms: HashMap::new(),
                queues: Queues::new(supported_time_controls_ms),
                fanout: Fanout::new(),
            }),
            store,
        }
    }

    /// Attach a new queue-status subscriber, returning its id (for
    /// `unsubscribe`) and the receiving half of its channel.
    pub async fn subscribe(&self) -> (u64, mpsc::UnboundedReceiver<Arc<QueueServerMessage>>) {
        let mut state = self.state.lock().await;
        state.fanout.subscribe()
    }

    pub async fn unsubscribe(&self, id: u64) {
        let mut state = self.state.lock().await;
        state.fanout.unsubscribe(id);
    }

    fn notify_queues_changed(state: &mut State) {
        state.fanout.broadcast(QueueServerMessage::QueueUpdate {
            timestamp: crate::time::now_ms(),
        });
    }

    pub async fn update(&self, entry: IndexEntry) {
        let mut state = self.state.lock().await;
        state.rooms.insert(entry.room_id.clone(), entry);
        self.persist(&state).await;
    }

    pub async fn remove(&self, room_id: &str) {
        let mut state = self.state.lock().await;
        state.rooms.remove(room_id);
        self.persist(&state).await;
    }

    /// Open, non-private rooms still in the LOBBY phase — the set a
    /// "browse open games" screen would show.
    pub async fn list_open(&self) -> Vec<IndexEntry> {
        let state = self.state.lock().await;
        state
            .rooms
            .values()
            .filter(|e| !e.private && e.phase == Phase::Lobby)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.rooms.clear();
        state.queues.clear();
        self.persist(&state).await;
    }

    pub async fn add_to_queue(
        &self,
        player_id: PlayerId,
        name: String,
        time_control_ms: i64,
    ) -> Result<Option<MatchDirective>, IndexError> {
        if player_id.is_empty() {
            return Err(IndexError::PlayerIdRequired);
        }
        let mut state = self.state.lock().await;
        let directive = state
            .queues
            .add(time_control_ms, player_id, name, crate::time::now_ms())?;
        Self::notify_queues_changed(&mut state);
        self.persist(&state).await;
        Ok(directive)
    }

    /// Enqueue the player across every supported time control at once
    /// (`spec.md`'s "join all queues" convenience operation).
    pub async fn join_all(
        &self,
        player_id: PlayerId,
        name: String,
    ) -> Result<Vec<MatchDirective>, IndexError> {
        if player_id.is_empty() {
            return Err(IndexError::PlayerIdRequired);
        }
        let mut state = self.state.lock().await;
        let now = crate::time::now_ms();
        let directives = state.queues.add_all(player_id, name, now);
        Self::notify_queues_changed(&mut state);
        self.persist(&state).await;
        Ok(directives)
    }

    pub async fn remove_from_all_queues(&self, player_id: &str) {
        let mut state = self.state.lock().await;
        state.queues.remove_everywhere(player_id);
        Self::notify_queues_changed(&mut state);
        self.persist(&state).await;
    }

    pub async fn is_queued(&self, player_id: &str) -> bool {
        let state = self.state.lock().await;
        state.queues.contains(player_id)
    }

    /// Current depth of one time control's queue, for `/queue/status` and
    /// the `queuePosition` a fresh entrant just landed at.
    pub async fn queue_depth(&self, time_control_ms: i64) -> usize {
        let state = self.state.lock().await;
        state.queues.depth(time_control_ms)
    }

    pub async fn check_match(&self, time_control_ms: i64) -> Option<MatchDirective> {
        let mut state = self.state.lock().await;
        let directive = state.queues.check_match(time_control_ms);
        if directive.is_some() {
            Self::notify_queues_changed(&mut state);
            self.persist(&state).await;
        }
        directive
    }

    pub async fn heartbeat(&self, player_id: &str) {
        let mut state = self.state.lock().await;
        state.queues.heartbeat(player_id, crate::time::now_ms());
    }

    pub async fn cleanup_stale(&self, queue_stale_timeout_ms: i64) {
        let mut state = self.state.lock().await;
        let changed = state
            .queues
            .cleanup_stale(crate::time::now_ms(), queue_stale_timeout_ms);
        if changed {
            Self::notify_queues_changed(&mut state);
            self.persist(&state).await;
        }
    }

    /// Active, full PLAYING rooms for `time_control_ms` (for `/queue/status`'s
    /// `activeGames` count).
    pub async fn active_game_count(&self, time_control_ms: i64) -> usize {
        let state = self.state.lock().await;
        Self::active_games(&state, time_control_ms).count()
    }

    fn active_games(
        state: &State,
        time_control_ms: i64,
    ) -> impl Iterator<Item = &IndexEntry> {
        state.rooms.values().filter(move |e| {
            e.phase == Phase::Playing
                && e.main_time_ms == time_control_ms
                && e.player_ids.len() == 2
        })
    }

    /// Estimated wait time for a new entrant to `time_control_ms`, per the
    /// anchored-game technique in `spec.md` §4.2: `match_now` if the queue
    /// already has someone waiting, `none` if no games for this time control
    /// are running, otherwise the remaining clock on the game closest to
    /// ending, anchored so the ETA doesn't jitter between calls.
    pub async fn estimate_wait_ms(&self, time_control_ms: i64) -> QueueEstimate {
        let anchor_key = estimate::anchor_key(time_control_ms);
        let anchor: Option<estimate::Anchor> = self.store.get(&anchor_key).await.unwrap_or(None);

        let (queue_depth, active_games) = {
            let state = self.state.lock().await;
            let queue_depth = state.queues.depth(time_control_ms);
            let active_games: Vec<estimate::ActiveGame> = Self::active_games(&state, time_control_ms)
                .filter_map(|e| {
                    let clocks = e.clocks?;
                    Some(estimate::ActiveGame {
                        room_id: e.room_id.clone(),
                        started_at: e.created_at,
                        duration_ms: e.main_time_ms,
                        remaining_ms: clocks.white_remaining_ms.min(clocks.black_remaining_ms),
                    })
                })
                .collect();
            (queue_depth, active_games)
        };

        let now = crate::time::now_ms();
        let (result, fresh_anchor) = estimate::estimate(&active_games, queue_depth, anchor.as_ref(), now);
        if let Some(fresh) = fresh_anchor {
            if let Err(e) = self.store.put(&anchor_key, &fresh).await {
                error!(time_control_ms, error = %e, "failed to persist wait-time anchor");
            }
        }
        result
    }

    async fn persist(&self, state: &State) {
        let rooms: Vec<&IndexEntry> = state.rooms.values().collect();
        if let Err(e) = self.store.put("rooms", &rooms).await {
            error!(error = %e, "failed to persist room directory");
        }
        if let Err(e) = self.store.put("queues", &state.queues.snapshot()).await {
            error!(error = %e, "failed to persist matchmaking queues");
        }
    }
}

pub type SharedIndex = Arc<IndexActor>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn index() -> IndexActor {
        IndexActor::new(Arc::new(InMemoryStore::new()), &[300_000, 600_000])
    }

    #[tokio::test]
    async fn update_then_list_open_reflects_lobby_rooms() {
        let idx = index();
        idx.update(IndexEntry {
            room_id: "r1".to_string(),
            phase: Phase::Lobby,
            player_ids: vec!["a".to_string()],
            private: false,
            main_time_ms: 300_000,
            clocks: None,
            created_at: 0,
            updated_at: 0,
        })
        .await;
        let open = idx.list_open().await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].room_id, "r1");
    }

    #[tokio::test]
    async fn private_rooms_are_excluded_from_list_open() {
        let idx = index();
        idx.update(IndexEntry {
            room_id: "r1".to_string(),
            phase: Phase::Lobby,
            player_ids: vec![],
            private: true,
            main_time_ms: 300_000,
            clocks: None,
            created_at: 0,
            updated_at: 0,
        })
        .await;
        assert!(idx.list_open().await.is_empty());
    }

    #[tokio::test]
    async fn second_queue_entrant_completes_a_match() {
        let idx = index();
        let first = idx
            .add_to_queue("alice".to_string(), "Alice".to_string(), 300_000)
            .await
            .unwrap();
        assert!(first.is_none());
        let second = idx
            .add_to_queue("bob".to_string(), "Bob".to_string(), 300_000)
            .await
            .unwrap();
        let directive = second.expect("expected a match");
        assert_eq!(directive.time_control_ms, 300_000);
        assert_eq!(directive.players.len(), 2);
    }

    #[tokio::test]
    async fn remove_from_all_queues_drops_pending_entry() {
        let idx = index();
        idx.add_to_queue("alice".to_string(), "Alice".to_string(), 300_000)
            .await
            .unwrap();
        idx.remove_from_all_queues("alice").await;
        let second = idx
            .add_to_queue("bob".to_string(), "Bob".to_string(), 300_000)
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn estimate_is_none_with_no_queue_and_no_active_games() {
        let idx = index();
        assert_eq!(idx.estimate_wait_ms(300_000).await, QueueEstimate::None);
    }

    #[tokio::test]
    async fn estimate_is_match_now_once_someone_is_waiting() {
        let idx = index();
        idx.add_to_queue("alice".to_string(), "Alice".to_string(), 300_000)
            .await
            .unwrap();
        assert_eq!(idx.estimate_wait_ms(300_000).await, QueueEstimate::MatchNow);
    }

    #[tokio::test]
    async fn active_game_count_only_counts_full_playing_rooms_for_the_time_control() {
        let idx = index();
        idx.update(IndexEntry {
            room_id: "r1".to_string(),
            phase: Phase::Playing,
            player_ids: vec!["a".to_string(), "b".to_string()],
            private: false,
            main_time_ms: 300_000,
            clocks: None,
            created_at: 0,
            updated_at: 0,
        })
        .await;
        assert_eq!(idx.active_game_count(300_000).await, 1);
        assert_eq!(idx.active_game_count(600_000).await, 0);
    }
}
