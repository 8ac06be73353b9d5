//! End-to-end HTTP coverage for the routes in `spec.md` §6, driven through
//! the real axum app the way `config_and_endpoints_tests.rs` drives the
//! teacher's server: build the router, wrap it in `axum_test::TestServer`,
//! and assert on the JSON responses a real client would see.

mod test_helpers;

use serde_json::{json, Value};
use test_helpers::test_server;

#[tokio::test]
async fn create_room_then_fetch_it_round_trips() {
    let server = test_server();

    let created = server
        .post("/rooms")
        .json(&json!({ "private": true }))
        .await;
    created.assert_status_ok();
    let body: Value = created.json();
    assert_eq!(body["ok"], true);
    let room_id = body["roomId"].as_str().unwrap().to_string();
    assert_eq!(body["meta"]["phase"], "LOBBY");
    assert_eq!(body["meta"]["private"], true);

    let fetched = server.get(&format!("/rooms/{room_id}")).await;
    fetched.assert_status_ok();
    let fetched_body: Value = fetched.json();
    assert_eq!(fetched_body["roomId"], room_id);
}

#[tokio::test]
async fn unknown_room_is_a_404() {
    let server = test_server();
    let response = server.get("/rooms/does-not-exist").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"], "room_not_found");
}

#[tokio::test]
async fn available_count_reflects_open_public_lobbies() {
    let server = test_server();

    let before: Value = server.get("/rooms/available-count").await.json();
    assert_eq!(before["count"], 0);

    server.post("/rooms").json(&json!({})).await;
    server.post("/rooms").json(&json!({ "private": true })).await;

    let after: Value = server.get("/rooms/available-count").await.json();
    assert_eq!(after["count"], 1);
}

#[tokio::test]
async fn full_bid_and_color_pick_flow_reaches_playing() {
    let server = test_server();

    let created: Value = server
        .post("/rooms")
        .json(&json!({ "mainTimeMs": 60_000 }))
        .await
        .json();
    let room_id = created["roomId"].as_str().unwrap().to_string();
    let base = format!("/rooms/{room_id}");

    server
        .post(&format!("{base}/join"))
        .json(&json!({ "playerId": "alice", "name": "Alice" }))
        .await
        .assert_status_ok();
    server
        .post(&format!("{base}/join"))
        .json(&json!({ "playerId": "bob", "name": "Bob" }))
        .await
        .assert_status_ok();

    server
        .post(&format!("{base}/start-bidding"))
        .json(&json!({ "playerId": "alice" }))
        .await
        .assert_status_ok();
    let after_bidding: Value = server
        .post(&format!("{base}/start-bidding"))
        .json(&json!({ "playerId": "bob" }))
        .await
        .json();
    assert_eq!(after_bidding["phase"], "BIDDING");

    server
        .post(&format!("{base}/submit-bid"))
        .json(&json!({ "playerId": "alice", "amount": 10_000 }))
        .await
        .assert_status_ok();
    let after_bids: Value = server
        .post(&format!("{base}/submit-bid"))
        .json(&json!({ "playerId": "bob", "amount": 20_000 }))
        .await
        .json();
    assert_eq!(after_bids["phase"], "COLOR_PICK");
    // alice bid lower so alice is the bid winner and picks color first.
    assert_eq!(after_bids["winnerId"], "alice");

    let after_choice: Value = server
        .post(&format!("{base}/choose-color"))
        .json(&json!({ "playerId": "alice", "color": "white" }))
        .await
        .json();
    assert_eq!(after_choice["phase"], "PLAYING");
    assert_eq!(after_choice["colors"]["alice"], "white");
    assert_eq!(after_choice["colors"]["bob"], "black");

    let move_response = server
        .post(&format!("{base}/move"))
        .json(&json!({ "playerId": "alice", "move": "e2e4" }))
        .await;
    move_response.assert_status_ok();
    let after_move: Value = move_response.json();
    assert_eq!(after_move["moves"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn queue_join_matches_two_players_into_a_room() {
    let server = test_server();

    let first: Value = server
        .post("/queue/join")
        .json(&json!({ "playerId": "alice", "name": "Alice", "mainTimeMs": 300_000 }))
        .await
        .json();
    assert_eq!(first["queued"], true);
    assert_eq!(first["queuePosition"], 0);

    let second: Value = server
        .post("/queue/join")
        .json(&json!({ "playerId": "bob", "name": "Bob", "mainTimeMs": 300_000 }))
        .await
        .json();
    assert!(second["roomId"].is_string());
    assert!(second["room"]["players"].as_array().unwrap().len() == 2);

    let status: Value = server.get("/queue/status").await.json();
    assert_eq!(status["estimates"]["300000"]["queueLength"], 0);
}

#[tokio::test]
async fn check_match_reports_in_queue_until_matched() {
    let server = test_server();

    server
        .post("/queue/join")
        .json(&json!({ "playerId": "alice", "name": "Alice", "mainTimeMs": 600_000 }))
        .await
        .assert_status_ok();

    let check: Value = server
        .post("/queue/checkMatch")
        .json(&json!({ "playerId": "alice" }))
        .await
        .json();
    assert_eq!(check["matched"], false);
    assert_eq!(check["inQueue"], true);

    server
        .post("/queue/join")
        .json(&json!({ "playerId": "bob", "name": "Bob", "mainTimeMs": 600_000 }))
        .await
        .assert_status_ok();

    let check_again: Value = server
        .post("/queue/checkMatch")
        .json(&json!({ "playerId": "alice" }))
        .await
        .json();
    assert_eq!(check_again["matched"], true);
    assert!(check_again["roomId"].is_string());
}

#[tokio::test]
async fn join_next_creates_then_fills_a_public_room() {
    let server = test_server();

    let first: Value = server
        .post("/rooms/join-next")
        .json(&json!({ "playerId": "alice", "name": "Alice", "mainTimeMs": 300_000 }))
        .await
        .json();
    let room_id = first["roomId"].as_str().unwrap().to_string();

    let second: Value = server
        .post("/rooms/join-next")
        .json(&json!({ "playerId": "bob", "name": "Bob", "mainTimeMs": 300_000 }))
        .await
        .json();
    assert_eq!(second["roomId"], room_id);
    assert_eq!(second["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn queue_leave_removes_player_before_a_match_forms() {
    let server = test_server();

    server
        .post("/queue/join")
        .json(&json!({ "playerId": "alice", "name": "Alice", "mainTimeMs": 900_000 }))
        .await
        .assert_status_ok();
    server
        .post("/queue/leave")
        .json(&json!({ "playerId": "alice" }))
        .await
        .assert_status_ok();

    let check: Value = server
        .post("/queue/checkMatch")
        .json(&json!({ "playerId": "alice" }))
        .await
        .json();
    assert_eq!(check["inQueue"], false);
}
