use std::sync::Arc;
use std::time::Duration;

use crate::{TEST_RESULTS_PREFIX, TestClient, TestServer, UnavailableStore, test_config};

use bug_busters::model::client_message::ClientMessage;
use bug_busters::model::server_message::ServerMessage;
use bug_busters::persistence::{MemoryResultsStore, PersistedResult, ResultsStore};

async fn expect_saved(client: &mut TestClient) {
    match client.recv_msg().await {
        ServerMessage::ResultSaved => {}
        other => panic!("Expected ResultSaved, got {other:?}"),
    }
}

#[tokio::test]
async fn completed_quiz_is_written_once_under_results_prefix() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(&server).await;
    client.start_quiz("Ada", "ada@example.com").await;
    let results = client.answer_all([true, false, true, true]).await;
    expect_saved(&mut client).await;

    let stored = server.stored_results().await;
    assert_eq!(stored.len(), 1, "Exactly one record per completed quiz");

    let (key, value) = &stored[0];
    let suffix = key
        .strip_prefix(&format!("{TEST_RESULTS_PREFIX}-"))
        .expect("Key should start with the results prefix");
    assert!(
        suffix.parse::<i64>().is_ok(),
        "Key suffix should be a millisecond timestamp, got {key}"
    );

    let record: PersistedResult = serde_json::from_str(value).unwrap();
    assert_eq!(record.version, "1");
    assert_eq!(record.name, "Ada");
    assert_eq!(record.email, "ada@example.com");
    assert_eq!(record.score, results.score);
    assert_eq!(record.correct_answers, 3);
    assert_eq!(record.incorrect_answers, 1);
    assert_eq!(record.total_questions, 4);
    assert_eq!(record.time_remaining, results.time_remaining);
    assert_eq!(record.answers.len(), 4);
    assert!(
        chrono::DateTime::parse_from_rfc3339(&record.completed_at).is_ok(),
        "completedAt should be ISO-8601, got {}",
        record.completed_at
    );
}

#[tokio::test]
async fn persisted_record_uses_camel_case_wire_format() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(&server).await;
    client.start_quiz("Ada", "ada@example.com").await;
    client.answer_all([true; 4]).await;
    expect_saved(&mut client).await;

    let stored = server.stored_results().await;
    let value: serde_json::Value = serde_json::from_str(&stored[0].1).unwrap();
    for field in [
        "version",
        "name",
        "email",
        "score",
        "correctAnswers",
        "incorrectAnswers",
        "totalQuestions",
        "timeRemaining",
        "completedAt",
        "answers",
    ] {
        assert!(value.get(field).is_some(), "Missing field {field} in {value}");
    }
    let first_answer = &value["answers"][0];
    assert_eq!(first_answer["questionId"], 1);
    assert_eq!(first_answer["selectedAnswerId"], "b");
    assert_eq!(first_answer["isCorrect"], true);
}

#[tokio::test]
async fn restarting_and_finishing_again_writes_a_second_record() {
    let server = TestServer::start().await;
    let (mut client, _) = TestClient::connect(&server).await;

    client.start_quiz("Ada", "ada@example.com").await;
    client.answer_all([true; 4]).await;
    expect_saved(&mut client).await;

    client.send_json(&ClientMessage::RestartQuiz).await;
    let _ = client.expect_state().await;
    // Keys are millisecond timestamps
    tokio::time::sleep(Duration::from_millis(5)).await;

    client.start_quiz("Grace", "grace@example.com").await;
    client.answer_all([false; 4]).await;
    expect_saved(&mut client).await;

    assert_eq!(server.stored_results().await.len(), 2);
}

#[tokio::test]
async fn failed_save_is_reported_but_results_are_kept() {
    let server = TestServer::start_with_store(test_config(), Arc::new(UnavailableStore)).await;
    let (mut client, _) = TestClient::connect(&server).await;
    client.start_quiz("Ada", "ada@example.com").await;

    let results = client.answer_all([true; 4]).await;
    assert_eq!(results.correct_answers, 4);

    match client.recv_msg().await {
        ServerMessage::SaveFailed { message } => {
            assert!(message.contains("could not be saved"));
        }
        other => panic!("Expected SaveFailed, got {other:?}"),
    }

    // No retry follows
    let no_more = tokio::time::timeout(
        Duration::from_millis(500),
        client.recv_json::<ServerMessage>(),
    )
    .await;
    assert!(no_more.is_err(), "Failed saves should not be retried");
}

#[tokio::test]
async fn memory_store_hides_expired_results() {
    let store = MemoryResultsStore::new();
    store
        .put("test-results-1", "{}".to_string(), Duration::ZERO)
        .await
        .unwrap();
    store
        .put("test-results-2", "{}".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    let listed = store.list_by_prefix(TEST_RESULTS_PREFIX).await.unwrap();
    let keys: Vec<&str> = listed.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, vec!["test-results-2"]);
    assert_eq!(store.len().await, 1);
    assert!(!store.is_empty().await);
}

#[tokio::test]
async fn memory_store_rejects_out_of_range_ttl() {
    let store = MemoryResultsStore::new();
    let result = store
        .put("test-results-1", "{}".to_string(), Duration::MAX)
        .await;

    assert!(result.is_err());
    assert!(store.is_empty().await);
}
