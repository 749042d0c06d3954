//! In-flight quiz attempt state and pure grading rules.
//!
//! An attempt is a value object owned by the quiz flow service: it pins the
//! question sequence at start time and tracks position, score and recorded
//! selections. Grading itself is stateless and lives in free functions so it
//! can be tested without an attempt.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::model::ids::{AnswerId, QuestionId, QuizId};
use crate::model::quiz::Answer;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt is already finished")]
    Finished,

    #[error("answer submitted for a question that is not the current one")]
    WrongQuestion,

    #[error("question has no correct answer configured")]
    NoCorrectAnswer,

    #[error("a submission must select at least one answer")]
    EmptySelection,
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

/// The learner's choice for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSelection {
    Single(AnswerId),
    Multiple(BTreeSet<AnswerId>),
}

impl AnswerSelection {
    /// All selected answer ids, regardless of kind.
    #[must_use]
    pub fn answer_ids(&self) -> Vec<AnswerId> {
        match self {
            AnswerSelection::Single(id) => vec![*id],
            AnswerSelection::Multiple(ids) => ids.iter().copied().collect(),
        }
    }
}

/// Grades a single-choice selection: correct iff the selected id is the
/// question's correct answer.
///
/// # Errors
///
/// Returns `AttemptError::NoCorrectAnswer` when the question has no answer
/// flagged correct; authored data is broken and the attempt cannot proceed.
pub fn grade_single(selected: AnswerId, answers: &[Answer]) -> Result<bool, AttemptError> {
    let correct = answers
        .iter()
        .find(|a| a.is_correct())
        .ok_or(AttemptError::NoCorrectAnswer)?;
    Ok(correct.id() == selected)
}

/// Grades a multiple-choice selection: correct iff the selected set equals
/// the correct set exactly. Extra picks and missing picks both fail.
///
/// # Errors
///
/// Returns `AttemptError::EmptySelection` for an empty pick and
/// `AttemptError::NoCorrectAnswer` when no answer is flagged correct.
pub fn grade_multiple(
    selected: &BTreeSet<AnswerId>,
    answers: &[Answer],
) -> Result<bool, AttemptError> {
    if selected.is_empty() {
        return Err(AttemptError::EmptySelection);
    }
    let correct: BTreeSet<AnswerId> = answers
        .iter()
        .filter(|a| a.is_correct())
        .map(Answer::id)
        .collect();
    if correct.is_empty() {
        return Err(AttemptError::NoCorrectAnswer);
    }
    Ok(*selected == correct)
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One pass through a quiz's questions, in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    quiz_id: QuizId,
    question_ids: Vec<QuestionId>,
    position: usize,
    score: u32,
    answers: BTreeMap<QuestionId, AnswerSelection>,
}

impl QuizAttempt {
    /// Starts an attempt over the given questions. The sequence is sorted
    /// ascending by id and frozen for the lifetime of the attempt.
    #[must_use]
    pub fn start(quiz_id: QuizId, mut question_ids: Vec<QuestionId>) -> Self {
        question_ids.sort_unstable();
        question_ids.dedup();
        Self {
            quiz_id,
            question_ids,
            position: 0,
            score: 0,
            answers: BTreeMap::new(),
        }
    }

    /// Records a graded selection for the current question and advances.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Finished` when all questions are answered and
    /// `AttemptError::WrongQuestion` when `question` is not current.
    pub fn record(
        &mut self,
        question: QuestionId,
        selection: AnswerSelection,
        is_correct: bool,
    ) -> Result<(), AttemptError> {
        match self.current_question() {
            None => Err(AttemptError::Finished),
            Some(current) if current != question => Err(AttemptError::WrongQuestion),
            Some(_) => {
                self.answers.insert(question, selection);
                if is_correct {
                    self.score += 1;
                }
                self.position += 1;
                Ok(())
            }
        }
    }

    /// Resets the attempt to the first question, discarding score and
    /// recorded selections.
    pub fn restart(&mut self) {
        self.position = 0;
        self.score = 0;
        self.answers.clear();
    }

    // Accessors
    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn current_question(&self) -> Option<QuestionId> {
        self.question_ids.get(self.position).copied()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position >= self.question_ids.len()
    }

    /// An attempt over a quiz with no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        u32::try_from(self.question_ids.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, AnswerSelection> {
        &self.answers
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(id: u64, question: u64, correct: bool) -> Answer {
        Answer::new(AnswerId::new(id), QuestionId::new(question), "text", correct).unwrap()
    }

    #[test]
    fn attempt_walks_questions_in_id_order() {
        let mut attempt = QuizAttempt::start(
            QuizId::new(1),
            vec![QuestionId::new(3), QuestionId::new(1), QuestionId::new(2)],
        );
        assert_eq!(attempt.current_question(), Some(QuestionId::new(1)));
        attempt
            .record(
                QuestionId::new(1),
                AnswerSelection::Single(AnswerId::new(10)),
                true,
            )
            .unwrap();
        assert_eq!(attempt.current_question(), Some(QuestionId::new(2)));
        assert_eq!(attempt.score(), 1);
    }

    #[test]
    fn record_rejects_out_of_sequence_question() {
        let mut attempt =
            QuizAttempt::start(QuizId::new(1), vec![QuestionId::new(1), QuestionId::new(2)]);
        let err = attempt
            .record(
                QuestionId::new(2),
                AnswerSelection::Single(AnswerId::new(10)),
                true,
            )
            .unwrap_err();
        assert_eq!(err, AttemptError::WrongQuestion);
    }

    #[test]
    fn record_rejects_finished_attempt() {
        let mut attempt = QuizAttempt::start(QuizId::new(1), vec![QuestionId::new(1)]);
        attempt
            .record(
                QuestionId::new(1),
                AnswerSelection::Single(AnswerId::new(10)),
                false,
            )
            .unwrap();
        assert!(attempt.is_finished());
        let err = attempt
            .record(
                QuestionId::new(1),
                AnswerSelection::Single(AnswerId::new(10)),
                false,
            )
            .unwrap_err();
        assert_eq!(err, AttemptError::Finished);
    }

    #[test]
    fn restart_clears_score_and_position() {
        let mut attempt =
            QuizAttempt::start(QuizId::new(1), vec![QuestionId::new(1), QuestionId::new(2)]);
        attempt
            .record(
                QuestionId::new(1),
                AnswerSelection::Single(AnswerId::new(10)),
                true,
            )
            .unwrap();
        attempt.restart();
        assert_eq!(attempt.score(), 0);
        assert_eq!(attempt.current_question(), Some(QuestionId::new(1)));
        assert!(attempt.answers().is_empty());
    }

    #[test]
    fn grade_single_matches_correct_id() {
        let answers = vec![answer(1, 1, false), answer(2, 1, true)];
        assert!(grade_single(AnswerId::new(2), &answers).unwrap());
        assert!(!grade_single(AnswerId::new(1), &answers).unwrap());
    }

    #[test]
    fn grade_single_flags_missing_correct_answer() {
        let answers = vec![answer(1, 1, false)];
        assert_eq!(
            grade_single(AnswerId::new(1), &answers).unwrap_err(),
            AttemptError::NoCorrectAnswer
        );
    }

    #[test]
    fn grade_multiple_requires_exact_set() {
        let answers = vec![answer(1, 1, true), answer(2, 1, true), answer(3, 1, false)];

        let exact: BTreeSet<_> = [AnswerId::new(1), AnswerId::new(2)].into();
        assert!(grade_multiple(&exact, &answers).unwrap());

        let partial: BTreeSet<_> = [AnswerId::new(1)].into();
        assert!(!grade_multiple(&partial, &answers).unwrap());

        let extra: BTreeSet<_> = [AnswerId::new(1), AnswerId::new(2), AnswerId::new(3)].into();
        assert!(!grade_multiple(&extra, &answers).unwrap());
    }

    #[test]
    fn grade_multiple_rejects_empty_selection() {
        let answers = vec![answer(1, 1, true)];
        assert_eq!(
            grade_multiple(&BTreeSet::new(), &answers).unwrap_err(),
            AttemptError::EmptySelection
        );
    }
}
