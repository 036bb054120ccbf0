use crate::handler::participant::quiz_state;
use crate::model::server_message::{ServerMessage, send_msg};
use crate::server::{Attempt, SharedAttempt};
use log::{error, info};
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Start or resume the countdown and spawn its tick task. Called while
/// holding the attempt lock; `shared` is the same attempt, for the task.
/// Does nothing if the countdown has already expired.
pub fn start_timer(attempt: &mut Attempt, shared: &SharedAttempt) {
    if let Some(handle) = attempt.timer_abort_handle.take() {
        handle.abort();
    }

    if !attempt.countdown.start() {
        info!("Countdown already expired, not starting");
        return;
    }

    let shared = shared.clone();
    let task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(TICK_INTERVAL).await;

            let mut attempt = shared.lock().await;
            if !attempt.countdown.is_running() {
                error!("Tried to tick quiz timer, but it shouldn't be running!");
                attempt.timer_abort_handle = None;
                break;
            }

            let Some(remaining) = attempt.countdown.tick() else {
                error!("Tried to tick quiz timer, but it was already at zero!");
                attempt.timer_abort_handle = None;
                break;
            };

            send_msg(
                &attempt.tx,
                ServerMessage::TimerTick {
                    seconds_remaining: remaining,
                },
            );

            if remaining == 0 {
                info!("Quiz timer expired");
                attempt.timer_abort_handle = None;
                let state = quiz_state(&attempt);
                send_msg(&attempt.tx, ServerMessage::QuizState { state });
                break;
            }
        }
    });

    attempt.timer_abort_handle = Some(task.abort_handle());
}

/// Pause the countdown without resetting it. Called while holding the
/// attempt lock.
pub fn stop_timer(attempt: &mut Attempt) {
    if let Some(handle) = attempt.timer_abort_handle.take() {
        handle.abort();
    }
    attempt.countdown.stop();
}

/// Stop the countdown and restore its initial value. Called while holding the
/// attempt lock.
pub fn reset_timer(attempt: &mut Attempt) {
    if let Some(handle) = attempt.timer_abort_handle.take() {
        handle.abort();
    }
    attempt.countdown.reset();
}
