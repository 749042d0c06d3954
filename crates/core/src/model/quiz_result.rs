use chrono::{DateTime, Utc};

use crate::model::ids::{AnswerId, QuestionId, QuizResultId, UserId};

/// Minimum percent (inclusive) for a quiz result to count as passed.
pub const PASS_THRESHOLD: u32 = 80;

/// Outcome of one finished quiz attempt.
///
/// Results reference the quiz by *name*, not id: progress aggregation
/// matches completed quizzes against quiz names, so a result survives the
/// quiz itself being deleted or re-created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    user: UserId,
    quiz_title: String,
    score: u32,
    total_questions: u32,
    percent: u32,
    passed: bool,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Builds a result from a raw score, deriving percent (rounded half-up)
    /// and the pass flag. An empty quiz yields 0 percent.
    #[must_use]
    pub fn new(
        user: UserId,
        quiz_title: impl Into<String>,
        score: u32,
        total_questions: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let percent = if total_questions == 0 {
            0
        } else {
            let scaled = u64::from(score) * 100 + u64::from(total_questions) / 2;
            u32::try_from(scaled / u64::from(total_questions)).unwrap_or(u32::MAX)
        };

        Self {
            user,
            quiz_title: quiz_title.into(),
            score,
            total_questions,
            percent,
            passed: percent >= PASS_THRESHOLD,
            completed_at,
        }
    }

    /// Rehydrates a stored result without re-deriving percent or pass flag.
    #[must_use]
    pub fn from_persisted(
        user: UserId,
        quiz_title: impl Into<String>,
        score: u32,
        total_questions: u32,
        percent: u32,
        passed: bool,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user,
            quiz_title: quiz_title.into(),
            score,
            total_questions,
            percent,
            passed,
            completed_at,
        }
    }

    // Accessors
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn quiz_title(&self) -> &str {
        &self.quiz_title
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn percent(&self) -> u32 {
        self.percent
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// One recorded answer choice within a finished attempt. Multiple-choice
/// questions produce one row per selected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAnswer {
    user: UserId,
    quiz_result: QuizResultId,
    question: QuestionId,
    selected_answer: AnswerId,
    is_correct: bool,
}

impl UserAnswer {
    #[must_use]
    pub fn new(
        user: UserId,
        quiz_result: QuizResultId,
        question: QuestionId,
        selected_answer: AnswerId,
        is_correct: bool,
    ) -> Self {
        Self {
            user,
            quiz_result,
            question,
            selected_answer,
            is_correct,
        }
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn quiz_result(&self) -> QuizResultId {
        self.quiz_result
    }

    #[must_use]
    pub fn question(&self) -> QuestionId {
        self.question
    }

    #[must_use]
    pub fn selected_answer(&self) -> AnswerId {
        self.selected_answer
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}
