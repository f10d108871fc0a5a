//! Leitner-box scheduling.
//!
//! Every word pair a learner is subscribed to sits in a numbered box. Box 0
//! holds words that are new or were last answered wrong; each correct
//! answer moves a word one box up. Quizzes are drawn from the lowest boxes
//! first.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;

/// Box level per word pair id
pub type LeitnerBoxes = BTreeMap<i64, u32>;

/// Outcome per word pair id of one quiz (true when answered correctly)
pub type QuizResults = BTreeMap<i64, bool>;

/// Bring a box map in line with the words currently in the table
///
/// New words start in box 0, words no longer in the table are forgotten and
/// everything else keeps its box.
pub fn reconcile(boxes: &mut LeitnerBoxes, word_ids: &[i64]) {
    let current: BTreeSet<i64> = word_ids.iter().copied().collect();
    boxes.retain(|id, _| current.contains(id));
    for id in current {
        boxes.entry(id).or_insert(0);
    }
}

/// Choose at most `quiz_length` words, lowest boxes first, in random order
pub fn select_questions<R: Rng + ?Sized>(
    boxes: &LeitnerBoxes,
    quiz_length: usize,
    rng: &mut R,
) -> Vec<i64> {
    let mut ids: Vec<i64> = boxes.keys().copied().collect();

    // Shuffling before the stable sort randomizes order within each box
    ids.shuffle(rng);
    ids.sort_by_key(|id| boxes[id]);
    ids.truncate(quiz_length);
    ids.shuffle(rng);
    ids
}

/// Promote correctly answered words by one box and send the rest to box 0
///
/// Results for words that are no longer in the box map are ignored.
pub fn apply_results(boxes: &mut LeitnerBoxes, results: &QuizResults) {
    for (id, correct) in results {
        if let Some(level) = boxes.get_mut(id) {
            *level = if *correct { level.saturating_add(1) } else { 0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn boxes_from(pairs: &[(i64, u32)]) -> LeitnerBoxes {
        pairs.iter().copied().collect()
    }

    // New ids enter box 0, stale ids disappear, known ids keep their box
    #[test]
    fn test_reconcile() {
        let mut boxes = boxes_from(&[(1, 3), (2, 1), (5, 2)]);
        reconcile(&mut boxes, &[1, 2, 3, 4]);
        assert_eq!(boxes, boxes_from(&[(1, 3), (2, 1), (3, 0), (4, 0)]));
    }

    #[test]
    fn test_reconcile_empty_table_clears_boxes() {
        let mut boxes = boxes_from(&[(1, 3)]);
        reconcile(&mut boxes, &[]);
        assert!(boxes.is_empty());
    }

    // Never more than the quiz length, and the lowest boxes win
    #[test]
    fn test_select_prefers_low_boxes() {
        let boxes: LeitnerBoxes = (1..=20).map(|id| (id, if id <= 5 { 0 } else { 4 })).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = select_questions(&boxes, 5, &mut rng);
        assert_eq!(picked.len(), 5);
        let mut sorted = picked.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);

        let picked = select_questions(&boxes, 10, &mut rng);
        assert_eq!(picked.len(), 10);
        for id in 1..=5 {
            assert!(picked.contains(&id));
        }
    }

    #[test]
    fn test_select_short_table() {
        let boxes = boxes_from(&[(1, 2), (2, 0)]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut picked = select_questions(&boxes, 10, &mut rng);
        picked.sort();
        assert_eq!(picked, vec![1, 2]);

        assert!(select_questions(&LeitnerBoxes::new(), 10, &mut rng).is_empty());
    }

    #[test]
    fn test_select_never_exceeds_quiz_length() {
        let boxes: LeitnerBoxes = (0..50).map(|id| (id, (id % 4) as u32)).collect();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            for length in [0, 1, 3, 10, 49, 50, 80] {
                let picked = select_questions(&boxes, length, &mut rng);
                assert_eq!(picked.len(), length.min(50));
            }
        }
    }

    // Right answers go up exactly one box, wrong answers go back to zero
    #[test]
    fn test_apply_results() {
        let mut boxes = boxes_from(&[(1, 0), (2, 3), (3, 2), (4, 1)]);
        let results: QuizResults = [(1, true), (2, true), (3, false), (9, true)].into_iter().collect();

        apply_results(&mut boxes, &results);

        assert_eq!(boxes, boxes_from(&[(1, 1), (2, 4), (3, 0), (4, 1)]));
    }
}
