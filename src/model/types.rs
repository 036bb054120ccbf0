use serde::{Deserialize, Serialize};

/// Points awarded for a correct answer, and deducted for a wrong one.
pub const POINTS_PER_CORRECT_ANSWER: i64 = 100;

// === Question Bank Records ===
// Loaded once at startup and never mutated afterwards.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub hints: Vec<String>,
    pub prompt: String,
    pub answers: Vec<AnswerOption>,
}

impl Question {
    pub fn answer(&self, answer_id: &str) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.id == answer_id)
    }

    pub fn correct_answer(&self) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.is_correct)
    }
}

// === Client-facing Question ===
// Same content as Question, minus the correctness flags.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerChoice {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// 1-based position in the quiz
    pub question_number: usize,
    pub total_questions: usize,
    pub id: u32,
    pub title: String,
    pub description: String,
    pub hints: Vec<String>,
    pub prompt: String,
    pub choices: Vec<AnswerChoice>,
    pub is_last: bool,
}

impl QuestionView {
    pub fn new(question: &Question, index: usize, total_questions: usize) -> Self {
        Self {
            question_number: index + 1,
            total_questions,
            id: question.id,
            title: question.title.clone(),
            description: question.description.clone(),
            hints: question.hints.clone(),
            prompt: question.prompt.clone(),
            choices: question
                .answers
                .iter()
                .map(|a| AnswerChoice {
                    id: a.id.clone(),
                    text: a.text.clone(),
                })
                .collect(),
            is_last: index + 1 == total_questions,
        }
    }
}

// === User Answers ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: u32,
    pub selected_answer_id: String,
    pub is_correct: bool,
}

// === Session Snapshot ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStateView {
    pub user_name: String,
    pub user_email: String,
    pub current_question_number: usize,
    pub total_questions: usize,
    pub answered: usize,
    pub completed: bool,
    pub seconds_remaining: u32,
    pub timer_running: bool,
    pub low_on_time: bool,
    pub clock: String,
}

// === Results ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub correct_bonus: i64,
    pub wrong_answer_penalty: i64,
    pub time_bonus: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub question_number: usize,
    pub question_id: u32,
    pub title: String,
    pub prompt: String,
    pub selected_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResults {
    pub user_name: String,
    pub score: i64,
    pub breakdown: ScoreBreakdown,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub total_questions: usize,
    pub time_remaining: u32,
    pub clock: String,
    pub review: Vec<QuestionReview>,
}

/// Render seconds as a zero-padded `MM:SS` clock.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
