use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ClientMessage {
    /// Identity entry; starts the countdown.
    #[serde(rename_all = "camelCase")]
    StartQuiz { name: String, email: String },

    /// Navigate to a question by its 1-based number.
    #[serde(rename_all = "camelCase")]
    ShowQuestion { question_number: usize },

    /// Answer a question and move on to the next one (or the results).
    #[serde(rename_all = "camelCase")]
    SubmitAnswer { question_id: u32, answer_id: String },

    RestartQuiz,
}
