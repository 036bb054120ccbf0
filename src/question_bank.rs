use crate::error::{QuizError, QuizResult};
use crate::model::types::Question;
use anyhow::{Context, Result};
use log::info;
use std::collections::HashSet;
use std::path::Path;

const EMBEDDED_QUESTIONS: &str = include_str!("../data/questions.json");

/// Read-only, ordered set of quiz questions.
///
/// Every bank that exists has passed `validate`: at least one question, unique
/// positive question ids, unique answer ids per question, and exactly one
/// correct answer per question.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> QuizResult<Self> {
        validate(&questions)?;
        Ok(Self { questions })
    }

    /// The dataset compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_QUESTIONS).context("Embedded question dataset is invalid")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let questions: Vec<Question> =
            serde_json::from_str(json).context("Failed to parse question dataset")?;
        let bank = Self::new(questions)?;
        info!("Loaded {} questions", bank.len());
        Ok(bank)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read question file {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Look up by 1-based question number, as used in navigation.
    pub fn by_number(&self, question_number: usize) -> Option<&Question> {
        question_number
            .checked_sub(1)
            .and_then(|index| self.questions.get(index))
    }

    pub fn by_id(&self, question_id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

fn validate(questions: &[Question]) -> QuizResult<()> {
    if questions.is_empty() {
        return Err(QuizError::InvalidQuestionBank(
            "at least one question is required".to_string(),
        ));
    }

    let mut question_ids = HashSet::new();
    for question in questions {
        if question.id == 0 {
            return Err(QuizError::InvalidQuestionBank(
                "question ids must be positive".to_string(),
            ));
        }
        if !question_ids.insert(question.id) {
            return Err(QuizError::InvalidQuestionBank(format!(
                "duplicate question id {}",
                question.id
            )));
        }

        let mut answer_ids = HashSet::new();
        for answer in &question.answers {
            if !answer_ids.insert(answer.id.as_str()) {
                return Err(QuizError::InvalidQuestionBank(format!(
                    "question {} has duplicate answer id '{}'",
                    question.id, answer.id
                )));
            }
        }

        let correct = question.answers.iter().filter(|a| a.is_correct).count();
        if correct != 1 {
            return Err(QuizError::InvalidQuestionBank(format!(
                "question {} must have exactly one correct answer, found {correct}",
                question.id
            )));
        }
    }
    Ok(())
}
