//! Named defaults for every tunable the spec fixes a concrete number for.
//!
//! Kept as constants (rather than inline literals in `room`/`index`) so the
//! values in `spec.md` §3/§4 have exactly one place to change.

/// Base clock per side when a room doesn't override it.
pub const DEFAULT_MAIN_TIME_MS: i64 = 300_000;

/// How long the BIDDING phase waits for both sealed bids.
pub const DEFAULT_BID_DURATION_MS: i64 = 30_000;

/// How long a color-pick turn has before it rotates to the other player.
pub const DEFAULT_CHOICE_DURATION_MS: i64 = 15_000;

/// Two-step "ready to start bidding" confirmation window.
pub const DEFAULT_START_CONFIRM_TIMEOUT_MS: i64 = 60_000;

/// Standard post-game rematch window.
pub const DEFAULT_REMATCH_WINDOW_MS: i64 = 60_000;

/// Shortened rematch window after a timeout that resolved as a draw
/// (opponent had insufficient mating material).
pub const DEFAULT_REMATCH_WINDOW_INSUFFICIENT_MATERIAL_MS: i64 = 10_000;

/// Disconnect grace period before a silent side forfeits on time.
pub const DEFAULT_DISCONNECT_TIMEOUT_MS: i64 = 45_000;

/// Silence threshold before the non-moving side is flagged as disconnected.
pub const DEFAULT_DISCONNECT_SILENCE_MS: i64 = 10_000;

/// A room with no activity for this long is considered stale and is
/// deleted from the index / durable store on the next lazy pass.
pub const ROOM_STALE_TIMEOUT_MS: i64 = 5 * 60_000;

/// Grace period a start-expired room stays in the index (closed) before
/// being dropped entirely.
pub const START_EXPIRED_RETENTION_MS: i64 = 10 * 60_000;

/// Queue entries idle longer than this are dropped by `cleanupStale`.
pub const QUEUE_STALE_TIMEOUT_MS: i64 = 5 * 60_000;

/// Fixed room capacity; the variant is strictly two players.
pub const MAX_PLAYERS: usize = 2;

/// Supported matchmaking time controls, in display order.
pub const SUPPORTED_TIME_CONTROLS_MS: [i64; 3] = [300_000, 600_000, 900_000];

/// Background sweep interval for expiring rooms/queue entries.
pub const CLEANUP_INTERVAL_MS: u64 = 30_000;
