use thiserror::Error;

use crate::model::ids::{AnswerId, CourseId, DirectoryId, QuestionId, QuizId};

/// Maximum quiz name length.
pub const MAX_NAME_LEN: usize = 200;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz name cannot be empty")]
    EmptyName,

    #[error("quiz name exceeds {MAX_NAME_LEN} characters")]
    NameTooLong,

    #[error("question text cannot be empty")]
    EmptyQuestionText,

    #[error("answer text cannot be empty")]
    EmptyAnswerText,
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A quiz: a named, ordered set of questions.
///
/// `course_id` is the back-reference used by the finish flow: a quiz tied to
/// a course marks that course completed when passed. Course progress,
/// however, matches results against the quiz *name* — see the progress
/// service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    name: String,
    description: Option<String>,
    directory: Option<DirectoryId>,
    course_id: Option<CourseId>,
}

impl Quiz {
    /// Creates a new quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the name is empty or too long.
    pub fn new(
        id: QuizId,
        name: impl Into<String>,
        description: Option<String>,
        directory: Option<DirectoryId>,
        course_id: Option<CourseId>,
    ) -> Result<Self, QuizError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(QuizError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(QuizError::NameTooLong);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            name,
            description,
            directory,
            course_id,
        })
    }

    /// Detaches the quiz from its knowledge-base directory.
    pub fn clear_directory(&mut self) {
        self.directory = None;
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn directory(&self) -> Option<DirectoryId> {
        self.directory
    }

    #[must_use]
    pub fn course_id(&self) -> Option<CourseId> {
        self.course_id
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Whether a question accepts one answer or a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Single,
    Multiple,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
        }
    }
}

/// One question within a quiz. Questions advance in ascending id order; the
/// schema carries no explicit sequence column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    quiz_id: QuizId,
    text: String,
    kind: QuestionKind,
}

impl Question {
    /// Creates a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestionText` if the text is blank.
    pub fn new(
        id: QuestionId,
        quiz_id: QuizId,
        text: impl Into<String>,
        kind: QuestionKind,
    ) -> Result<Self, QuizError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuizError::EmptyQuestionText);
        }

        Ok(Self {
            id,
            quiz_id,
            text,
            kind,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A candidate answer for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    id: AnswerId,
    question_id: QuestionId,
    text: String,
    is_correct: bool,
}

impl Answer {
    /// Creates a new answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyAnswerText` if the text is blank.
    pub fn new(
        id: AnswerId,
        question_id: QuestionId,
        text: impl Into<String>,
        is_correct: bool,
    ) -> Result<Self, QuizError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuizError::EmptyAnswerText);
        }

        Ok(Self {
            id,
            question_id,
            text,
            is_correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> AnswerId {
        self.id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_rejects_empty_name() {
        let err = Quiz::new(QuizId::new(1), "  ", None, None, None).unwrap_err();
        assert_eq!(err, QuizError::EmptyName);
    }

    #[test]
    fn quiz_filters_blank_description() {
        let quiz = Quiz::new(QuizId::new(1), "Basics", Some("  ".into()), None, None).unwrap();
        assert_eq!(quiz.description(), None);
    }

    #[test]
    fn question_rejects_empty_text() {
        let err =
            Question::new(QuestionId::new(1), QuizId::new(1), " ", QuestionKind::Single)
                .unwrap_err();
        assert_eq!(err, QuizError::EmptyQuestionText);
    }

    #[test]
    fn answer_rejects_empty_text() {
        let err = Answer::new(AnswerId::new(1), QuestionId::new(1), "", true).unwrap_err();
        assert_eq!(err, QuizError::EmptyAnswerText);
    }

    #[test]
    fn question_kind_round_trip_strings() {
        assert_eq!(QuestionKind::Single.as_str(), "single");
        assert_eq!(QuestionKind::Multiple.as_str(), "multiple");
    }
}
