use std::sync::Arc;

use lms_core::Clock;
use lms_core::attempt::{AnswerSelection, QuizAttempt, grade_multiple, grade_single};
use lms_core::model::{
    Question, QuestionId, QuestionKind, QuizId, QuizResult, QuizResultId, UserAnswer, UserId,
};
use storage::repository::{EnrollmentRepository, QuizRepository, QuizResultRepository};

use crate::error::QuizFlowError;

/// Outcome of starting a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStart {
    /// The quiz has no questions; there is nothing to attempt.
    Empty { quiz_id: QuizId },
    Started(QuizAttempt),
}

/// Outcome of finishing an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizFinish {
    pub result_id: QuizResultId,
    pub result: QuizResult,
    /// The quiz was tied to a course and the pass marked it completed.
    pub course_completed: bool,
    /// The quiz was tied to a course, the attempt failed, and it has been
    /// reset to the first question.
    pub restarted: bool,
}

/// Drives a quiz attempt from start through grading to the persisted result.
///
/// The attempt itself is a value held by the caller; the service grades
/// submissions against authored answers and persists the outcome at finish.
#[derive(Clone)]
pub struct QuizFlowService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn QuizResultRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl QuizFlowService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn QuizResultRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            results,
            enrollments,
        }
    }

    /// Starts an attempt over the quiz's questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Storage` if the quiz is missing or repository
    /// access fails.
    pub async fn start(&self, quiz_id: QuizId) -> Result<QuizStart, QuizFlowError> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        let questions = self.quizzes.questions_for_quiz(quiz.id()).await?;
        if questions.is_empty() {
            return Ok(QuizStart::Empty { quiz_id });
        }

        let question_ids = questions.iter().map(Question::id).collect();
        Ok(QuizStart::Started(QuizAttempt::start(quiz.id(), question_ids)))
    }

    /// Grades the selection for the attempt's current question and records
    /// it, returning whether it was correct.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::KindMismatch` when the selection shape does
    /// not fit the question, `QuizFlowError::Attempt` for out-of-sequence
    /// submissions or broken authored data, and `QuizFlowError::Storage` on
    /// repository failures.
    pub async fn submit_answer(
        &self,
        attempt: &mut QuizAttempt,
        question_id: QuestionId,
        selection: AnswerSelection,
    ) -> Result<bool, QuizFlowError> {
        let questions = self.quizzes.questions_for_quiz(attempt.quiz_id()).await?;
        let question = questions
            .iter()
            .find(|q| q.id() == question_id)
            .ok_or(lms_core::attempt::AttemptError::WrongQuestion)?;

        let answers = self.quizzes.answers_for_question(question_id).await?;
        let is_correct = match (question.kind(), &selection) {
            (QuestionKind::Single, AnswerSelection::Single(chosen)) => {
                grade_single(*chosen, &answers)?
            }
            (QuestionKind::Multiple, AnswerSelection::Multiple(chosen)) => {
                grade_multiple(chosen, &answers)?
            }
            _ => return Err(QuizFlowError::KindMismatch),
        };

        attempt.record(question_id, selection, is_correct)?;
        Ok(is_correct)
    }

    /// Persists the finished attempt as a result, with one recorded row per
    /// selected answer.
    ///
    /// For a course-tied quiz a pass marks the enrollment completed and a
    /// fail resets the attempt to the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::NotFinished` while questions remain, or
    /// `QuizFlowError::Storage` on repository failures.
    pub async fn finish(
        &self,
        user: UserId,
        attempt: &mut QuizAttempt,
    ) -> Result<QuizFinish, QuizFlowError> {
        if !attempt.is_finished() {
            return Err(QuizFlowError::NotFinished);
        }

        let quiz = self.quizzes.get_quiz(attempt.quiz_id()).await?;
        let now = self.clock.now();
        let result = QuizResult::new(
            user,
            quiz.name(),
            attempt.score(),
            attempt.total_questions(),
            now,
        );
        let result_id = self.results.append_result(&result).await?;

        for (question_id, selection) in attempt.answers() {
            let answers = self.quizzes.answers_for_question(*question_id).await?;
            for answer_id in selection.answer_ids() {
                let is_correct = answers
                    .iter()
                    .find(|a| a.id() == answer_id)
                    .is_some_and(lms_core::model::Answer::is_correct);
                self.results
                    .append_user_answer(&UserAnswer::new(
                        user,
                        result_id,
                        *question_id,
                        answer_id,
                        is_correct,
                    ))
                    .await?;
            }
        }

        let mut course_completed = false;
        let mut restarted = false;
        if let Some(course) = quiz.course_id() {
            if result.passed() {
                // only started courses get marked; a pass without an
                // enrollment leaves the course untouched
                if let Some(mut enrollment) =
                    self.enrollments.get_enrollment(user, course).await?
                {
                    enrollment.mark_completed(now);
                    self.enrollments.upsert_enrollment(&enrollment).await?;
                    course_completed = true;
                }
            } else {
                attempt.restart();
                restarted = true;
            }
        }

        tracing::info!(
            user = user.value(),
            quiz = quiz.id().value(),
            percent = result.percent(),
            passed = result.passed(),
            course_completed,
            "quiz attempt finished"
        );

        Ok(QuizFinish {
            result_id,
            result,
            course_completed,
            restarted,
        })
    }
}
