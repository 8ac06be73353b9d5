#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # bidchess-server
//!
//! A real-time multiplayer chess server built around a blind bid-for-color
//! pre-game phase: both players secretly wager time off their own clock for
//! the right to pick a side, then play a standard timed game.

/// Subscriber fan-out for room and queue updates.
pub mod broadcast;

/// External chess engine abstraction.
pub mod chess;

/// Server configuration and environment variables.
pub mod config;

/// HTTP route handlers.
pub mod http;

/// The shared matchmaking index: open-room directory and per-time-control
/// queues.
pub mod index;

/// Structured logging configuration.
pub mod logging;

/// Wire/domain types: room records, error codes, message frames.
pub mod protocol;

/// Per-room game state machine.
pub mod room;

/// Stateless composition over the room registry and the shared index.
pub mod router;

/// Top-level HTTP/WebSocket server assembly.
pub mod server;

/// Persistence abstraction.
pub mod store;

/// Clock source (`now_ms`).
pub mod time;

/// WebSocket upgrade handlers.
pub mod websocket;
