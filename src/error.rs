use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("Question {0} does not exist")]
    UnknownQuestion(u32),

    #[error("Answer '{answer_id}' is not a choice for question {question_id}")]
    UnknownAnswer { question_id: u32, answer_id: String },

    #[error("Start the quiz first")]
    NotStarted,

    #[error("Quiz is already completed")]
    QuizCompleted,

    #[error("Invalid question bank: {0}")]
    InvalidQuestionBank(String),
}

pub type QuizResult<T> = std::result::Result<T, QuizError>;
