use crate::{
    error::QuizError,
    heartbeat::{Heartbeat, PING_INTERVAL},
    model::{
        client_message::ClientMessage,
        server_message::{ServerMessage, send_msg},
        types::{QuestionView, QuizResults, QuizStateView, format_clock},
    },
    persistence::{PersistedResult, save_result},
    quiz_timer::{reset_timer, start_timer, stop_timer},
    server::{AppState, Attempt, Rx, SharedAttempt, Tx},
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use log::*;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};

/// Snapshot of the attempt as the client sees it.
pub fn quiz_state(attempt: &Attempt) -> QuizStateView {
    let session = &attempt.session;
    let countdown = &attempt.countdown;
    QuizStateView {
        user_name: session.user_name().to_string(),
        user_email: session.user_email().to_string(),
        current_question_number: session.current_question_index() + 1,
        total_questions: session.total_questions(),
        answered: session.answers().len(),
        completed: session.is_completed(),
        seconds_remaining: countdown.remaining_seconds(),
        timer_running: countdown.is_running(),
        low_on_time: countdown.is_low_on_time(),
        clock: format_clock(countdown.remaining_seconds()),
    }
}

fn question_message(attempt: &Attempt, index: usize) -> Option<ServerMessage> {
    let bank = attempt.session.bank();
    bank.get(index).map(|question| ServerMessage::Question {
        question: QuestionView::new(question, index, bank.len()),
    })
}

/// Identity checks done before the session is touched: a name, and something
/// shaped like `x@y.z` for the email.
pub fn validate_identity(name: &str, email: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if !looks_like_email(email) {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    email.char_indices().filter(|(_, c)| *c == '@').any(|(at, _)| {
        let before = email[..at].chars().next_back();
        let domain = email[at + 1..]
            .split(char::is_whitespace)
            .next()
            .unwrap_or("");
        before.is_some_and(|c| !c.is_whitespace())
            && domain
                .char_indices()
                .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
    })
}

/// A completed result waiting to be written once the lock is released.
struct PendingSave {
    result: PersistedResult,
    completed_at: DateTime<Utc>,
    tx: Tx,
}

/// Result of processing a client action: messages to send after releasing
/// the lock, and possibly a result to persist.
struct ActionResult {
    messages: Vec<ServerMessage>,
    save: Option<PendingSave>,
}

impl ActionResult {
    fn reply(messages: Vec<ServerMessage>) -> Self {
        Self {
            messages,
            save: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::reply(vec![ServerMessage::error(message)])
    }
}

/// Stop the clock, score the session and build the results screen. Hands back
/// the record to persist the first time a session completes.
fn finish_quiz(attempt: &mut Attempt, app_state: &AppState) -> ActionResult {
    stop_timer(attempt);

    let policy = app_state.config.scoring_policy;
    let initial_seconds = attempt.countdown.initial_seconds();
    let time_remaining = attempt.countdown.remaining_seconds();
    let session = &attempt.session;
    let tally = session.tally();
    let score = session.calculate_score(policy, time_remaining, initial_seconds);
    info!(
        "Quiz completed by '{}': score {score} ({} correct, {} incorrect, {time_remaining}s left)",
        session.user_name(),
        tally.correct,
        tally.incorrect
    );

    let results = QuizResults {
        user_name: session.user_name().to_string(),
        score,
        breakdown: policy.breakdown(tally, time_remaining, initial_seconds),
        correct_answers: tally.correct,
        incorrect_answers: tally.incorrect,
        total_questions: session.total_questions(),
        time_remaining,
        clock: format_clock(time_remaining),
        review: session.review(),
    };

    let save = if attempt.result_submitted {
        None
    } else {
        let completed_at = Utc::now();
        attempt.result_submitted = true;
        Some(PendingSave {
            result: PersistedResult::from_session(session, score, time_remaining, completed_at),
            completed_at,
            tx: attempt.tx.clone(),
        })
    };

    ActionResult {
        messages: vec![
            ServerMessage::QuizState {
                state: quiz_state(attempt),
            },
            ServerMessage::QuizResults { results },
        ],
        save,
    }
}

/// Apply one client action to the attempt. Called while holding the attempt
/// lock; does not await.
fn process_action(
    action: ClientMessage,
    attempt: &mut Attempt,
    shared: &SharedAttempt,
    app_state: &AppState,
) -> ActionResult {
    match action {
        ClientMessage::StartQuiz { name, email } => {
            if attempt.session.is_completed() {
                return ActionResult::error("Quiz already completed, restart to play again");
            }
            if let Err(message) = validate_identity(&name, &email) {
                return ActionResult::error(message);
            }
            attempt.session.set_user_info(name.trim(), email.trim());
            attempt.started = true;
            start_timer(attempt, shared);

            let mut messages = vec![ServerMessage::QuizState {
                state: quiz_state(attempt),
            }];
            messages.extend(question_message(attempt, attempt.session.current_question_index()));
            ActionResult::reply(messages)
        }

        ClientMessage::ShowQuestion { question_number } => {
            match question_number
                .checked_sub(1)
                .and_then(|index| question_message(attempt, index))
            {
                Some(msg) => ActionResult::reply(vec![msg]),
                None => {
                    warn!("Requested question {question_number} does not exist");
                    ActionResult::reply(vec![ServerMessage::ReturnToStart {
                        message: format!("Question {question_number} does not exist"),
                    }])
                }
            }
        }

        ClientMessage::SubmitAnswer {
            question_id,
            answer_id,
        } => {
            if !attempt.started {
                return ActionResult::error(QuizError::NotStarted.to_string());
            }
            let on_current_question = attempt
                .session
                .current_question()
                .is_some_and(|q| q.id == question_id);

            if let Err(e) = attempt.session.submit_answer(question_id, &answer_id) {
                return ActionResult::error(e.to_string());
            }

            // Revisiting an earlier question only replaces its answer.
            if !on_current_question {
                return ActionResult::reply(vec![ServerMessage::QuizState {
                    state: quiz_state(attempt),
                }]);
            }

            attempt.session.next_question();
            if attempt.session.is_completed() {
                return finish_quiz(attempt, app_state);
            }

            let mut messages = vec![ServerMessage::QuizState {
                state: quiz_state(attempt),
            }];
            messages.extend(question_message(attempt, attempt.session.current_question_index()));
            ActionResult::reply(messages)
        }

        ClientMessage::RestartQuiz => {
            attempt.session.reset();
            reset_timer(attempt);
            attempt.result_submitted = false;
            attempt.started = false;
            ActionResult::reply(vec![ServerMessage::QuizState {
                state: quiz_state(attempt),
            }])
        }
    }
}

/// Write a completed result without blocking the quiz. The participant is told
/// whether it was saved; failures are not retried.
fn spawn_save(app_state: &Arc<AppState>, pending: PendingSave) {
    let app_state = app_state.clone();
    tokio::spawn(async move {
        let config = &app_state.config;
        match save_result(
            app_state.store.as_ref(),
            &config.results_prefix,
            config.results_ttl,
            &pending.result,
            pending.completed_at,
        )
        .await
        {
            Ok(_) => send_msg(&pending.tx, ServerMessage::ResultSaved),
            Err(e) => {
                error!("Failed to save quiz results: {e:?}");
                send_msg(
                    &pending.tx,
                    ServerMessage::SaveFailed {
                        message: "Your results could not be saved".to_string(),
                    },
                );
            }
        }
    });
}

async fn process_client_message(text: &str, app_state: &Arc<AppState>, attempt: &SharedAttempt) {
    // Parse message before acquiring lock
    let action = match serde_json::from_str::<ClientMessage>(text) {
        Ok(action) => action,
        Err(e) => {
            warn!("Failed to parse message: {text}");
            warn!("Error: {e}");
            let tx = attempt.lock().await.tx.clone();
            send_msg(&tx, ServerMessage::error(format!("Invalid message: {e}")));
            return;
        }
    };

    let (tx, result) = {
        let mut guard = attempt.lock().await;
        let result = process_action(action, &mut guard, attempt, app_state);
        (guard.tx.clone(), result)
    };
    // Lock released here

    if let Some(ServerMessage::Error { message }) = result.messages.first() {
        warn!("Sending error response '{message}' back to participant");
    }
    for msg in result.messages {
        send_msg(&tx, msg);
    }
    if let Some(pending) = result.save {
        spawn_save(app_state, pending);
    }
}

pub async fn handle_participant(
    ws_stream: WebSocketStream<TcpStream>,
    app_state: Arc<AppState>,
    attempt: SharedAttempt,
    mut rx: Rx,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut heartbeat = Heartbeat::new();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);

    {
        let guard = attempt.lock().await;
        send_msg(
            &guard.tx,
            ServerMessage::QuizState {
                state: quiz_state(&guard),
            },
        );
    }

    loop {
        tokio::select! {
            // Outgoing messages from channel
            Some(msg) = rx.recv() => {
                if ws_write.send(msg).await.is_err() {
                    break;
                }
            }

            // Incoming messages from WebSocket
            msg_result = ws_read.next() => {
                match msg_result {
                    Some(Ok(Message::Pong(_))) => {
                        heartbeat.record_pong();
                    }
                    Some(Ok(Message::Text(text))) => {
                        if text.is_empty() {
                            warn!("Received empty message");
                        } else {
                            info!("Received message: {text}");
                            process_client_message(&text, &app_state, &attempt).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(_)) => {
                        break;
                    }
                    _ => {} // Ignore Ping (auto-handled by tungstenite), Binary
                }
            }

            // Heartbeat ping timer
            _ = ping_interval.tick() => {
                if !heartbeat.is_alive() {
                    info!("Participant connection timed out (no pong received)");
                    break;
                }
                if ws_write.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Participant gone; the countdown task must not outlive the connection.
    let mut guard = attempt.lock().await;
    stop_timer(&mut guard);
}
