use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::leitner::QuizResults;

/// Progress of one quiz, kept in the learner's session between requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizState {
    /// Table the quiz was drawn from
    pub table_id: i64,
    /// Word pair ids still to be asked, head first
    pub queue: VecDeque<i64>,
    /// Word pair currently on screen, waiting for an answer
    pub current: Option<i64>,
    /// Answers given so far
    pub results: QuizResults,
    /// Number of questions the quiz started with
    pub total: usize,
}

impl QuizState {
    pub fn new(table_id: i64, questions: Vec<i64>) -> Self {
        Self {
            table_id,
            total: questions.len(),
            queue: questions.into(),
            current: None,
            results: QuizResults::new(),
        }
    }

    /// The question to show, popping the next one only if none is pending
    pub fn current_or_next(&mut self) -> Option<i64> {
        if self.current.is_none() {
            self.current = self.queue.pop_front();
        }
        self.current
    }

    /// Record an answer to the pending question and return its word id
    pub fn record_answer(&mut self, correct: bool) -> Option<i64> {
        let id = self.current.take()?;
        self.results.insert(id, correct);
        Some(id)
    }

    /// Drop the pending question without an answer (its word vanished)
    pub fn skip_current(&mut self) {
        if self.current.take().is_some() {
            self.total = self.total.saturating_sub(1);
        }
    }

    /// Questions answered or on screen so far, counting from one
    pub fn position(&self) -> usize {
        self.results.len() + usize::from(self.current.is_some())
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_through_quiz() {
        let mut quiz = QuizState::new(7, vec![3, 1, 2]);
        assert_eq!(quiz.total, 3);
        assert!(!quiz.is_finished());

        assert_eq!(quiz.current_or_next(), Some(3));
        assert_eq!(quiz.position(), 1);
        assert_eq!(quiz.record_answer(true), Some(3));

        assert_eq!(quiz.current_or_next(), Some(1));
        assert_eq!(quiz.record_answer(false), Some(1));

        assert_eq!(quiz.current_or_next(), Some(2));
        assert_eq!(quiz.record_answer(true), Some(2));

        assert!(quiz.is_finished());
        assert_eq!(quiz.current_or_next(), None);
        assert_eq!(quiz.results.get(&1), Some(&false));
        assert_eq!(quiz.results.get(&3), Some(&true));
    }

    // Reloading the question page must not skip the pending question
    #[test]
    fn test_resume_shows_same_question() {
        let mut quiz = QuizState::new(1, vec![10, 11]);
        assert_eq!(quiz.current_or_next(), Some(10));
        assert_eq!(quiz.current_or_next(), Some(10));
        assert_eq!(quiz.queue.len(), 1);
    }

    #[test]
    fn test_answer_without_question_is_ignored() {
        let mut quiz = QuizState::new(1, vec![10]);
        assert_eq!(quiz.record_answer(true), None);
        assert!(quiz.results.is_empty());
    }

    #[test]
    fn test_skip_current() {
        let mut quiz = QuizState::new(1, vec![10, 11]);
        quiz.current_or_next();
        quiz.skip_current();
        assert_eq!(quiz.total, 1);
        assert_eq!(quiz.current_or_next(), Some(11));
        quiz.record_answer(false);
        assert!(quiz.is_finished());
        assert_eq!(quiz.results.len(), 1);
    }
}
