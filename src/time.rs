//! All room/index timestamps are absolute milliseconds since the Unix
//! epoch, per `spec.md` §3/§5 ("All time is `now` read at operation start
//! and used uniformly within that operation"). Plain `i64` math keeps the
//! deadline/elapsed arithmetic in the room and index logic simple integer
//! comparisons rather than `chrono::Duration` juggling; `chrono` is used
//! only at the JSON edges where a human-readable timestamp is useful.

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
