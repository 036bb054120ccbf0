use crate::error::{QuizError, QuizResult};
use crate::model::types::{Question, QuestionReview, UserAnswer};
use crate::question_bank::QuestionBank;
use crate::scoring::{ScoringPolicy, Tally};
use std::sync::Arc;

/// One participant's pass through the question bank.
///
/// Progress only moves forward: `Active(0) -> ... -> Active(N-1) -> Completed`.
/// `Completed` is terminal until `reset`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    bank: Arc<QuestionBank>,
    current_question_index: usize,
    answers: Vec<UserAnswer>,
    user_name: String,
    user_email: String,
    completed: bool,
}

impl QuizSession {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self {
            bank,
            current_question_index: 0,
            answers: Vec::new(),
            user_name: String::new(),
            user_email: String::new(),
            completed: false,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.bank.get(self.current_question_index)
    }

    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    pub fn answer_for(&self, question_id: u32) -> Option<&UserAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn total_questions(&self) -> usize {
        self.bank.len()
    }

    /// Overwrites the participant identity. Validation happens at the edge.
    pub fn set_user_info(&mut self, name: impl Into<String>, email: impl Into<String>) {
        self.user_name = name.into();
        self.user_email = email.into();
    }

    /// Record the participant's choice for a question, replacing any earlier
    /// choice for the same question. Correctness comes from the question bank.
    pub fn submit_answer(&mut self, question_id: u32, selected_answer_id: &str) -> QuizResult<bool> {
        if self.completed {
            return Err(QuizError::QuizCompleted);
        }
        let question = self
            .bank
            .by_id(question_id)
            .ok_or(QuizError::UnknownQuestion(question_id))?;
        let answer = question
            .answer(selected_answer_id)
            .ok_or_else(|| QuizError::UnknownAnswer {
                question_id,
                answer_id: selected_answer_id.to_string(),
            })?;
        let is_correct = answer.is_correct;

        let user_answer = UserAnswer {
            question_id,
            selected_answer_id: selected_answer_id.to_string(),
            is_correct,
        };
        match self.answers.iter_mut().find(|a| a.question_id == question_id) {
            Some(existing) => *existing = user_answer,
            None => self.answers.push(user_answer),
        }
        Ok(is_correct)
    }

    /// Advance to the next question, or complete the quiz from the last one.
    pub fn next_question(&mut self) {
        if self.completed {
            return;
        }
        if self.current_question_index + 1 < self.bank.len() {
            self.current_question_index += 1;
        } else {
            self.completed = true;
        }
    }

    pub fn tally(&self) -> Tally {
        let correct = self.answers.iter().filter(|a| a.is_correct).count();
        Tally {
            correct,
            incorrect: self.answers.len() - correct,
        }
    }

    /// Score the committed answers. The caller stops the countdown and passes
    /// its final value in.
    pub fn calculate_score(&self, policy: ScoringPolicy, time_remaining: u32, initial_seconds: u32) -> i64 {
        policy.score(self.tally(), time_remaining, initial_seconds)
    }

    /// Per-question review in bank order, including unanswered questions.
    pub fn review(&self) -> Vec<QuestionReview> {
        self.bank
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let user_answer = self.answer_for(question.id);
                QuestionReview {
                    question_number: index + 1,
                    question_id: question.id,
                    title: question.title.clone(),
                    prompt: question.prompt.clone(),
                    selected_answer: user_answer
                        .and_then(|a| question.answer(&a.selected_answer_id))
                        .map(|a| a.text.clone()),
                    correct_answer: question.correct_answer().map(|a| a.text.clone()),
                    is_correct: user_answer.is_some_and(|a| a.is_correct),
                }
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.current_question_index = 0;
        self.answers.clear();
        self.user_name.clear();
        self.user_email.clear();
        self.completed = false;
    }
}
