use std::sync::Arc;
use std::time::Duration;

use crate::{TEST_RESULTS_PREFIX, TestClient, TestServer, UnavailableStore, test_config};

use bug_busters::leaderboard::Leaderboard;
use bug_busters::model::server_message::ServerMessage;
use bug_busters::persistence::{MemoryResultsStore, ResultsStore};

const TTL: Duration = Duration::from_secs(60);

async fn seeded_server(records: &[(&str, &str)]) -> TestServer {
    let store = Arc::new(MemoryResultsStore::new());
    for (key, value) in records {
        store.put(key, value.to_string(), TTL).await.unwrap();
    }
    TestServer::start_with_store(test_config(), store).await
}

async fn fetch_leaderboard(server: &TestServer) -> Leaderboard {
    let response = reqwest::get(server.http_url("/leaderboard"))
        .await
        .expect("Leaderboard request should succeed");
    assert_eq!(response.status(), 200);
    response.json().await.expect("Leaderboard should be JSON")
}

#[tokio::test]
async fn health_check_responds_ok() {
    let server = TestServer::start().await;
    let body = reqwest::get(server.http_url("/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn empty_store_gives_empty_leaderboard() {
    let server = TestServer::start().await;
    let leaderboard = fetch_leaderboard(&server).await;
    assert_eq!(leaderboard.total_participants, 0);
    assert!(leaderboard.entries.is_empty());
}

#[tokio::test]
async fn leaderboard_sorts_by_score_and_skips_malformed_records() {
    let server = seeded_server(&[
        ("test-results-1", r#"{"name":"A","score":50}"#),
        ("test-results-2", r#"{"name":"B","score":90}"#),
        ("test-results-3", "{definitely not json"),
        ("test-results-4", r#"{"name":"C","score":90}"#),
        ("other-prefix-5", r#"{"name":"Z","score":1000}"#),
    ])
    .await;

    let leaderboard = fetch_leaderboard(&server).await;

    assert_eq!(leaderboard.total_participants, 3);
    let names: Vec<&str> = leaderboard.entries.iter().map(|e| e.name.as_str()).collect();
    let scores: Vec<i64> = leaderboard.entries.iter().map(|e| e.score).collect();
    assert_eq!(scores, vec![90, 90, 50]);
    assert_eq!(names[2], "A");
    assert!(names[..2].contains(&"B") && names[..2].contains(&"C"));
    let ranks: Vec<usize> = leaderboard.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn leaderboard_fills_in_missing_name_and_score() {
    let server = seeded_server(&[
        ("test-results-1", r#"{"score":10}"#),
        ("test-results-2", r#"{"name":"NoScore"}"#),
        ("test-results-3", r#"{"name":"","score":5}"#),
    ])
    .await;

    let leaderboard = fetch_leaderboard(&server).await;

    assert_eq!(leaderboard.total_participants, 3);
    assert_eq!(leaderboard.entries[0].name, "Anonymous");
    assert_eq!(leaderboard.entries[0].score, 10);
    assert_eq!(leaderboard.entries[1].name, "Anonymous");
    assert_eq!(leaderboard.entries[2].name, "NoScore");
    assert_eq!(leaderboard.entries[2].score, 0);
}

#[tokio::test]
async fn finished_quiz_shows_up_on_leaderboard() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(&server).await;
    client.start_quiz("Ada", "ada@example.com").await;
    let results = client.answer_all([true; 4]).await;
    match client.recv_msg().await {
        ServerMessage::ResultSaved => {}
        other => panic!("Expected ResultSaved, got {other:?}"),
    }

    let leaderboard = fetch_leaderboard(&server).await;
    assert_eq!(leaderboard.total_participants, 1);
    assert_eq!(leaderboard.entries[0].name, "Ada");
    assert_eq!(leaderboard.entries[0].score, results.score);
}

#[tokio::test]
async fn leaderboard_is_capped_at_one_hundred_entries() {
    let store = Arc::new(MemoryResultsStore::new());
    for i in 0..150 {
        store
            .put(
                &format!("{TEST_RESULTS_PREFIX}-{i}"),
                format!(r#"{{"name":"P{i}","score":{i}}}"#),
                TTL,
            )
            .await
            .unwrap();
    }
    let server = TestServer::start_with_store(test_config(), store).await;

    let leaderboard = fetch_leaderboard(&server).await;

    assert_eq!(leaderboard.entries.len(), 100);
    assert_eq!(leaderboard.entries[0].score, 149);
    assert_eq!(leaderboard.entries[99].score, 50);
}

#[tokio::test]
async fn leaderboard_reports_bad_gateway_when_store_fails() {
    let server = TestServer::start_with_store(test_config(), Arc::new(UnavailableStore)).await;

    let response = reqwest::get(server.http_url("/leaderboard"))
        .await
        .expect("Leaderboard request should complete");

    assert_eq!(response.status(), 502);
}
