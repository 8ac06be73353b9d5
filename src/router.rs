//! Stateless composition over the room registry and the shared index:
//! direct room creation, matchmaking queue joins, and the background
//! sweep that turns completed matches and stale entries into actual room
//! lifecycle events. Grounded in the teacher's maintenance-task pattern —
//! a periodically-spawned sweep owned by the top-level server assembly —
//! generalized here to also drive matchmaking instead of just expiry.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::index::{IndexActor, MatchDirective, QueueEstimate};
use crate::protocol::{IndexError, PlayerId, Room, RoomError, RoomId};
use crate::room::{RoomActor, RoomInit, RoomTimeouts};
use crate::store::{create_store, DynStore, StoreConfig};

pub type SharedRoom = Arc<RoomActor>;

/// The overridable fields `POST /rooms` accepts; anything left `None` falls
/// back to the configured server default.
#[derive(Debug, Clone, Default)]
pub struct CreateRoomParams {
    pub room_id: Option<RoomId>,
    pub private: bool,
    pub main_time_ms: Option<i64>,
    pub bid_duration_ms: Option<i64>,
    pub choice_duration_ms: Option<i64>,
    pub creator: Option<(PlayerId, String)>,
}

/// Result of `/queue/checkMatch`: either the room a prior queue join just
/// formed, or whether the caller is still waiting.
pub struct CheckMatchOutcome {
    pub room: Option<Room>,
    pub in_queue: bool,
}

/// One time control's line in `/queue/status`.
pub struct QueueStatusEntry {
    pub queue_length: usize,
    pub active_games: usize,
    pub estimate: QueueEstimate,
}

/// Result of a queue join: either it completed a match immediately, or the
/// caller is now waiting at `position` in that time control's queue.
pub enum JoinQueueOutcome {
    Matched(Room),
    Queued { position: usize },
}

/// All live `RoomActor`s, keyed by room id. A `DashMap` rather than a
/// `Mutex<HashMap<..>>` since rooms are looked up far more than the set of
/// rooms itself changes — the teacher makes the same call for its
/// connection table.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, SharedRoom>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }
}

impl RoomRegistry {
    pub fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.get(room_id).map(|r| r.clone())
    }

    pub fn insert(&self, room: SharedRoom) {
        self.rooms.insert(room.room_id().to_string(), room);
    }

    pub fn remove(&self, room_id: &str) {
        self.rooms.remove(room_id);
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

pub struct Router {
    pub registry: Arc<RoomRegistry>,
    pub index: Arc<IndexActor>,
    store: DynStore,
    cfg: Arc<ServerConfig>,
}

impl Router {
    pub fn new(cfg: Arc<ServerConfig>) -> Arc<Self> {
        let store = create_store(&StoreConfig::InMemory);
        let index = Arc::new(IndexActor::new(
            create_store(&StoreConfig::InMemory),
            &cfg.supported_time_controls_ms,
        ));
        Arc::new(Self {
            registry: Arc::new(RoomRegistry::default()),
            index,
            store,
            cfg,
        })
    }

    fn room_timeouts(&self) -> RoomTimeouts {
        RoomTimeouts::from(self.cfg.as_ref())
    }

    /// Direct room creation: an explicit "create a private/public room"
    /// request from a client, optionally seeding the creator as the first
    /// player and overriding any of the per-room tunables `spec.md` §6's
    /// `POST /rooms` body exposes.
    pub async fn create_room(&self, params: CreateRoomParams) -> Result<Room, RoomError> {
        let room_id = params.room_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.registry.get(&room_id).is_some() {
            return Err(RoomError::AlreadyInitialized);
        }
        let actor = Arc::new(RoomActor::new(
            room_id.clone(),
            self.store.clone(),
            Some(self.index.clone()),
            self.room_timeouts(),
        ));
        let room = actor
            .init(RoomInit {
                room_id,
                private: params.private,
                main_time_ms: params.main_time_ms.unwrap_or(self.cfg.default_main_time_ms),
                bid_duration_ms: params
                    .bid_duration_ms
                    .unwrap_or(self.cfg.default_bid_duration_ms),
                choice_duration_ms: params
                    .choice_duration_ms
                    .unwrap_or(self.cfg.default_choice_duration_ms),
                disconnect_timeout_ms: self.cfg.disconnect_timeout_ms,
                seed_players: params.creator.into_iter().collect(),
            })
            .await?;
        self.registry.insert(actor);
        Ok(room)
    }

    pub fn get_room(&self, room_id: &str) -> Option<SharedRoom> {
        self.registry.get(room_id)
    }

    /// Join the first open public lobby with a free seat for `main_time_ms`
    /// (any time control if unset); creates a fresh public room if none is
    /// available, seeding the caller as its first player.
    pub async fn join_next(
        &self,
        player_id: PlayerId,
        name: String,
        main_time_ms: Option<i64>,
    ) -> Result<Room, RoomError> {
        let candidate = self
            .index
            .list_open()
            .await
            .into_iter()
            .filter(|e| main_time_ms.map(|tc| e.main_time_ms == tc).unwrap_or(true))
            .find(|e| e.player_ids.len() < 2)
            .and_then(|e| self.registry.get(&e.room_id));

        match candidate {
            Some(room) => room.join(&player_id, &name).await,
            None => {
                self.create_room(CreateRoomParams {
                    room_id: None,
                    private: false,
                    main_time_ms,
                    bid_duration_ms: None,
                    choice_duration_ms: None,
                    creator: Some((player_id, name)),
                })
                .await
            }
        }
    }

    /// Number of open (public, LOBBY-phase) rooms, for
    /// `GET /rooms/available-count`.
    pub async fn available_count(&self) -> usize {
        self.index.list_open().await.len()
    }

    /// Create a room from a completed matchmaking pairing and remove both
    /// players from every queue (`spec.md` §4.2's router responsibility).
    pub async fn create_room_from_match(&self, directive: MatchDirective) -> Result<Room, RoomError> {
        let room_id = Uuid::new_v4().to_string();
        let actor = Arc::new(RoomActor::new(
            room_id.clone(),
            self.store.clone(),
            Some(self.index.clone()),
            self.room_timeouts(),
        ));
        let seed_players = directive.players.clone();
        let result = actor
            .init(RoomInit {
                room_id,
                private: false,
                main_time_ms: directive.time_control_ms,
                bid_duration_ms: self.cfg.default_bid_duration_ms,
                choice_duration_ms: self.cfg.default_choice_duration_ms,
                disconnect_timeout_ms: self.cfg.disconnect_timeout_ms,
                seed_players,
            })
            .await;

        for (player_id, _) in &directive.players {
            self.index.remove_from_all_queues(player_id).await;
        }

        let room = result?;
        self.registry.insert(actor);
        Ok(room)
    }

    pub async fn join_queue(
        &self,
        player_id: PlayerId,
        name: String,
        time_control_ms: i64,
    ) -> Result<JoinQueueOutcome, IndexError> {
        let directive = self
            .index
            .add_to_queue(player_id, name, time_control_ms)
            .await?;
        match directive {
            Some(d) => match self.create_room_from_match(d).await {
                Ok(room) => Ok(JoinQueueOutcome::Matched(room)),
                Err(e) => {
                    warn!(error = %e, "failed to materialize room from queue match");
                    Ok(JoinQueueOutcome::Queued { position: 0 })
                }
            },
            None => {
                let position = self.index.queue_depth(time_control_ms).await;
                Ok(JoinQueueOutcome::Queued { position })
            }
        }
    }

    /// Whether `player_id` has already been matched into a room since
    /// joining a queue, or is still waiting (`spec.md` §6 `checkMatch`).
    pub async fn check_match(&self, player_id: &str) -> CheckMatchOutcome {
        let rooms: Vec<SharedRoom> = self
            .registry
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for room in rooms {
            if let Ok(state) = room.get_state().await {
                if state.has_player(player_id) && state.players.len() == state.max_players {
                    return CheckMatchOutcome {
                        room: Some(state),
                        in_queue: false,
                    };
                }
            }
        }
        CheckMatchOutcome {
            room: None,
            in_queue: self.index.is_queued(player_id).await,
        }
    }

    /// Per-time-control snapshot for `GET /queue/status`: how many are
    /// waiting, how many games for that time control are in progress, and
    /// the anchored wait-time estimate.
    pub async fn queue_status(&self) -> Vec<(i64, QueueStatusEntry)> {
        let mut out = Vec::with_capacity(self.cfg.supported_time_controls_ms.len());
        for &tc in &self.cfg.supported_time_controls_ms {
            let queue_length = self.index.queue_depth(tc).await;
            let active_games = self.index.active_game_count(tc).await;
            let estimate = self.index.estimate_wait_ms(tc).await;
            out.push((
                tc,
                QueueStatusEntry {
                    queue_length,
                    active_games,
                    estimate,
                },
            ));
        }
        out
    }

    pub async fn join_all_queues(
        &self,
        player_id: PlayerId,
        name: String,
    ) -> Result<Vec<Room>, IndexError> {
        let directives = self.index.join_all(player_id, name).await?;
        let mut rooms = Vec::with_capacity(directives.len());
        for d in directives {
            match self.create_room_from_match(d).await {
                Ok(room) => rooms.push(room),
                Err(e) => warn!(error = %e, "failed to materialize room from queue match"),
            }
        }
        Ok(rooms)
    }

    pub async fn leave_queue(&self, player_id: &str) {
        self.index.remove_from_all_queues(player_id).await;
    }

    pub async fn queue_heartbeat(&self, player_id: &str) {
        self.index.heartbeat(player_id).await;
    }

    pub async fn list_open_rooms(&self) -> Vec<crate::index::IndexEntry> {
        self.index.list_open().await
    }

    /// Periodic maintenance: sweep every supported time control for a
    /// match that a `checkMatch` call didn't happen to trigger, drop stale
    /// queue entries, and let each live room's own lazy pass reap itself
    /// (triggered the next time anyone touches it, or immediately here via
    /// `getState` so empty rooms don't linger past their stale timeout
    /// just because nobody is polling them).
    pub async fn run_maintenance_sweep(&self) {
        for &tc in &self.cfg.supported_time_controls_ms {
            while let Some(directive) = self.index.check_match(tc).await {
                info!(time_control_ms = tc, "matchmaking sweep formed a room");
                if let Err(e) = self.create_room_from_match(directive).await {
                    warn!(error = %e, "failed to materialize room from matchmaking sweep");
                }
            }
        }
        self.index.cleanup_stale(self.cfg.queue_stale_timeout_ms).await;

        let room_ids: Vec<RoomId> = self
            .registry
            .rooms
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for room_id in room_ids {
            if let Some(room) = self.registry.get(&room_id) {
                if room.get_state().await.is_err() {
                    self.registry.remove(&room_id);
                }
            }
        }
    }

    pub fn spawn_maintenance_task(self: &Arc<Self>) {
        let router = self.clone();
        let interval = Duration::from_millis(self.cfg.cleanup_interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                router.run_maintenance_sweep().await;
            }
        });
    }
}
