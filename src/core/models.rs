use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::leitner::{self, LeitnerBoxes, QuizResults};

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Salted hash, never shown
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Top-level category for word tables. Could be an actual language or
/// something like "ITacronyms" or "Trees".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: i64,
    pub name: String,
}

/// A named list of word pairs to learn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub name: String,
    pub created: NaiveDate,
    pub creator_id: i64,
    pub language_id: i64,
}

/// A word in a language and its translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPair {
    pub id: i64,
    pub foreign_word: String,
    pub translation: String,
    pub language_id: i64,
}

/// A learner's record for one table: Leitner boxes plus score history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub learner_id: i64,
    pub table_id: i64,
    /// Box level per word pair
    pub leitner_boxes: LeitnerBoxes,
    /// Right/wrong per word pair for the latest finished quiz
    pub last_quiz_results: QuizResults,
    pub quiz_attempts: i64,
    pub total_questions: i64,
    pub total_right: i64,
    /// Share of all questions answered right, rounded; none before the first quiz
    pub average_percentage_score: Option<i64>,
    pub last_quiz_date: Option<NaiveDate>,
    pub subscription_date: NaiveDate,
}

impl Subscription {
    /// Fresh subscription with empty boxes, not yet stored
    pub fn new(learner_id: i64, table_id: i64, today: NaiveDate) -> Self {
        Self {
            id: 0,
            learner_id,
            table_id,
            leitner_boxes: LeitnerBoxes::new(),
            last_quiz_results: QuizResults::new(),
            quiz_attempts: 0,
            total_questions: 0,
            total_right: 0,
            average_percentage_score: None,
            last_quiz_date: None,
            subscription_date: today,
        }
    }

    /// Sync the boxes with the table's words and draw the question order
    pub fn prepare_quiz<R: Rng + ?Sized>(
        &mut self,
        word_ids: &[i64],
        quiz_length: usize,
        rng: &mut R,
    ) -> Vec<i64> {
        leitner::reconcile(&mut self.leitner_boxes, word_ids);
        leitner::select_questions(&self.leitner_boxes, quiz_length, rng)
    }

    /// Move words between boxes and update the score counters for a finished quiz.
    ///
    /// `word_ids` are the table's words now; answers to anything else are dropped.
    pub fn record_quiz(&mut self, word_ids: &[i64], results: &QuizResults, today: NaiveDate) {
        leitner::reconcile(&mut self.leitner_boxes, word_ids);
        let results: QuizResults = results
            .iter()
            .filter(|(id, _)| self.leitner_boxes.contains_key(id))
            .map(|(id, correct)| (*id, *correct))
            .collect();

        leitner::apply_results(&mut self.leitner_boxes, &results);

        let right = results.values().filter(|correct| **correct).count() as i64;
        self.quiz_attempts += 1;
        self.total_questions += results.len() as i64;
        self.total_right += right;
        if self.total_questions > 0 {
            let percentage = (self.total_right as f64 * 100.0 / self.total_questions as f64).round();
            self.average_percentage_score = Some(percentage as i64);
        }
        self.last_quiz_results = results;
        self.last_quiz_date = Some(today);
    }
}

/// Language row for the language list
#[derive(Debug, Clone, Serialize)]
pub struct LanguageSummary {
    pub name: String,
    pub table_count: i64,
}

/// Table row for table lists
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub language_name: String,
    pub creator_name: String,
    pub created: NaiveDate,
    pub word_count: i64,
}

/// Subscription row for the home page
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub table_name: String,
    pub language_name: String,
    pub quiz_attempts: i64,
    pub total_questions: i64,
    pub total_right: i64,
    pub average_percentage_score: Option<i64>,
    pub last_quiz_date: Option<NaiveDate>,
}

/// What happened when a word pair was added to a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddWordOutcome {
    /// A new pair was stored and linked
    Created(i64),
    /// A pair with the same foreign word existed in the language and was linked
    Linked(i64),
    /// The table already held a pair with this foreign word
    AlreadyInTable(i64),
}

/// Counts reported after a word list upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub linked: usize,
    pub already_in_table: usize,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn count(&mut self, outcome: AddWordOutcome) {
        match outcome {
            AddWordOutcome::Created(_) => self.created += 1,
            AddWordOutcome::Linked(_) => self.linked += 1,
            AddWordOutcome::AlreadyInTable(_) => self.already_in_table += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_new_subscription() {
        let sub = Subscription::new(1, 2, today());
        assert_eq!(sub.quiz_attempts, 0);
        assert!(sub.leitner_boxes.is_empty());
        assert_eq!(sub.average_percentage_score, None);
        assert_eq!(sub.last_quiz_date, None);
    }

    #[test]
    fn test_prepare_quiz_reconciles_boxes() {
        let mut sub = Subscription::new(1, 2, today());
        sub.leitner_boxes.insert(99, 3);
        let mut rng = StdRng::seed_from_u64(3);

        let questions = sub.prepare_quiz(&[1, 2, 3], 2, &mut rng);

        assert_eq!(questions.len(), 2);
        assert!(!sub.leitner_boxes.contains_key(&99));
        assert_eq!(sub.leitner_boxes.len(), 3);
    }

    // Counters accumulate across quizzes and the percentage is cumulative
    #[test]
    fn test_record_quiz_updates_counters() {
        let mut sub = Subscription::new(1, 2, today());
        sub.leitner_boxes = [(1, 0), (2, 2), (3, 1)].into_iter().collect();

        let first: QuizResults = [(1, true), (2, false), (3, true)].into_iter().collect();
        sub.record_quiz(&[1, 2, 3], &first, today());

        assert_eq!(sub.leitner_boxes[&1], 1);
        assert_eq!(sub.leitner_boxes[&2], 0);
        assert_eq!(sub.leitner_boxes[&3], 2);
        assert_eq!(sub.quiz_attempts, 1);
        assert_eq!(sub.total_questions, 3);
        assert_eq!(sub.total_right, 2);
        assert_eq!(sub.average_percentage_score, Some(67));
        assert_eq!(sub.last_quiz_date, Some(today()));

        let second: QuizResults = [(2, false)].into_iter().collect();
        sub.record_quiz(&[1, 2, 3], &second, today());
        assert_eq!(sub.quiz_attempts, 2);
        assert_eq!(sub.total_questions, 4);
        assert_eq!(sub.average_percentage_score, Some(50));
        assert_eq!(sub.last_quiz_results, second);
    }

    // Words deleted from the table during a quiz don't count
    #[test]
    fn test_record_quiz_ignores_removed_words() {
        let mut sub = Subscription::new(1, 2, today());
        let mut rng = StdRng::seed_from_u64(5);
        sub.prepare_quiz(&[1, 8], 10, &mut rng);

        // Word 8 left the table after it was answered
        let results: QuizResults = [(1, false), (8, true)].into_iter().collect();
        sub.record_quiz(&[1], &results, today());

        assert_eq!(sub.total_questions, 1);
        assert_eq!(sub.total_right, 0);
        assert!(!sub.last_quiz_results.contains_key(&8));
        assert!(!sub.leitner_boxes.contains_key(&8));
        assert_eq!(sub.leitner_boxes[&1], 0);
    }

    #[test]
    fn test_import_summary_counts() {
        let mut summary = ImportSummary::default();
        summary.count(AddWordOutcome::Created(1));
        summary.count(AddWordOutcome::Created(2));
        summary.count(AddWordOutcome::Linked(3));
        summary.count(AddWordOutcome::AlreadyInTable(1));
        assert_eq!(summary.created, 2);
        assert_eq!(summary.linked, 1);
        assert_eq!(summary.already_in_table, 1);
    }
}
