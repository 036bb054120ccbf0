use std::time::Duration;

use crate::{TestClient, TestServer, test_config};

use bug_busters::config::AppConfig;
use bug_busters::model::client_message::ClientMessage;
use bug_busters::model::server_message::ServerMessage;

fn short_timer_config(seconds: u32) -> AppConfig {
    AppConfig {
        timer_initial_seconds: seconds,
        ..test_config()
    }
}

#[tokio::test]
async fn timer_ticks_down_once_per_second() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(&server).await;
    client.start_quiz("Ada", "ada@example.com").await;

    for expected_remaining in [1799, 1798] {
        match client.recv_json::<ServerMessage>().await {
            ServerMessage::TimerTick { seconds_remaining } => {
                assert_eq!(seconds_remaining, expected_remaining);
            }
            other => panic!("Expected TimerTick, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn timer_stops_itself_at_zero() {
    let server = TestServer::start_with_config(short_timer_config(3)).await;
    let (mut client, initial) = TestClient::connect(&server).await;
    assert_eq!(initial.seconds_remaining, 3);
    client.start_quiz("Ada", "ada@example.com").await;

    for expected_remaining in [2, 1, 0] {
        match client.recv_json::<ServerMessage>().await {
            ServerMessage::TimerTick { seconds_remaining } => {
                assert_eq!(seconds_remaining, expected_remaining);
            }
            other => panic!("Expected TimerTick, got {other:?}"),
        }
    }

    // Expiry pushes the stopped state
    let state = client.expect_state().await;
    assert_eq!(state.seconds_remaining, 0);
    assert!(!state.timer_running, "Timer should stop at zero");
    assert!(state.low_on_time);
    assert_eq!(state.clock, "00:00");

    // Nothing ticks after expiry
    let no_more = tokio::time::timeout(
        Duration::from_millis(1500),
        client.recv_json::<ServerMessage>(),
    )
    .await;
    assert!(no_more.is_err(), "No ticks should arrive after expiry");
}

#[tokio::test]
async fn quiz_can_still_be_finished_after_time_runs_out() {
    let server = TestServer::start_with_config(short_timer_config(1)).await;
    let (mut client, _) = TestClient::connect(&server).await;
    client.start_quiz("Ada", "ada@example.com").await;

    // One tick to zero, then the expired state
    let _: ServerMessage = client.recv_json().await;
    let state = client.expect_state().await;
    assert_eq!(state.seconds_remaining, 0);

    let results = client.answer_all([true, true, false, false]).await;
    assert_eq!(results.time_remaining, 0);
    assert_eq!(results.score, 0, "200 bonus - 200 penalty + 0 seconds");
}

#[tokio::test]
async fn restart_stops_ticking_and_restores_full_time() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(&server).await;
    client.start_quiz("Ada", "ada@example.com").await;

    // Wait for one tick
    match client.recv_json::<ServerMessage>().await {
        ServerMessage::TimerTick { seconds_remaining } => assert_eq!(seconds_remaining, 1799),
        other => panic!("Expected TimerTick, got {other:?}"),
    }

    client.send_json(&ClientMessage::RestartQuiz).await;
    let state = client.expect_state().await;
    assert_eq!(state.seconds_remaining, 1800);
    assert!(!state.timer_running);

    let no_more = tokio::time::timeout(
        Duration::from_millis(1500),
        client.recv_json::<ServerMessage>(),
    )
    .await;
    assert!(no_more.is_err(), "Should not receive ticks after restart");
}

#[tokio::test]
async fn each_connection_has_its_own_clock() {
    let server = TestServer::start().await;
    let (mut running, _) = TestClient::connect(&server).await;
    let (mut idle, _) = TestClient::connect(&server).await;

    running.start_quiz("Ada", "ada@example.com").await;
    let _: ServerMessage = running.recv_json().await; // first tick

    idle.send_json(&ClientMessage::ShowQuestion { question_number: 1 })
        .await;
    let _ = idle.expect_question().await;
    let no_ticks = tokio::time::timeout(
        Duration::from_millis(1500),
        idle.recv_json::<ServerMessage>(),
    )
    .await;
    assert!(no_ticks.is_err(), "An idle participant's clock should not run");
}
