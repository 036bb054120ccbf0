use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;

use crate::model::types::{QuestionView, QuizResults, QuizStateView};
use crate::server::Tx;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    QuizState { state: QuizStateView },

    #[serde(rename_all = "camelCase")]
    Question { question: QuestionView },

    #[serde(rename_all = "camelCase")]
    TimerTick { seconds_remaining: u32 },

    #[serde(rename_all = "camelCase")]
    QuizResults { results: QuizResults },

    ResultSaved,

    #[serde(rename_all = "camelCase")]
    SaveFailed { message: String },

    /// The requested screen doesn't exist; the client should go back to
    /// identity entry.
    #[serde(rename_all = "camelCase")]
    ReturnToStart { message: String },

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

pub fn send_msg(tx: &Tx, msg: ServerMessage) {
    if !matches!(msg, ServerMessage::TimerTick { .. }) {
        info!("Sending server message: {msg:?}");
    }
    let msg = serde_json::to_string(&msg).unwrap_or_else(|e| {
        format!("Catastrophic! Serde error when trying to serialize serverside: {e}")
    });
    tx.send(Message::text(msg.clone())).unwrap_or_else(|e| {
        error!("Sending server message through channel failed: {e}");
        error!("Tried to send message: {msg}");
    })
}
