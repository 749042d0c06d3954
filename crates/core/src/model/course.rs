use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, DirectoryId, GroupId, QuizId, UserId};
use crate::slug::{MAX_SLUG_LEN, is_valid_slug};

/// Maximum course title length.
pub const MAX_TITLE_LEN: usize = 200;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course title exceeds {MAX_TITLE_LEN} characters")]
    TitleTooLong,

    #[error("slug may contain only latin letters, digits, hyphens and underscores")]
    InvalidSlug,

    #[error("slug exceeds {MAX_SLUG_LEN} characters")]
    SlugTooLong,
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course: an authored collection of lessons and quizzes.
///
/// The (title, author) pair and the slug are unique; uniqueness itself is
/// enforced by the storage layer, this type only validates shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    author: UserId,
    slug: String,
    image: Option<String>,
    directory: Option<DirectoryId>,
    final_quiz: Option<QuizId>,
    quiz_ids: Vec<QuizId>,
    group_ids: Vec<GroupId>,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates a new course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the title is empty or too long, or the slug
    /// violates the allowed charset.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        author: UserId,
        slug: impl Into<String>,
        image: Option<String>,
        directory: Option<DirectoryId>,
        final_quiz: Option<QuizId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(CourseError::TitleTooLong);
        }

        let slug = slug.into();
        if slug.len() > MAX_SLUG_LEN {
            return Err(CourseError::SlugTooLong);
        }
        if !is_valid_slug(&slug) {
            return Err(CourseError::InvalidSlug);
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            author,
            slug,
            image,
            directory,
            final_quiz,
            quiz_ids: Vec::new(),
            group_ids: Vec::new(),
            created_at,
        })
    }

    /// Replaces the quiz set associated with this course.
    pub fn set_quizzes(&mut self, quiz_ids: Vec<QuizId>) {
        self.quiz_ids = quiz_ids;
    }

    /// Replaces the groups this course is auto-assigned to.
    pub fn set_groups(&mut self, group_ids: Vec<GroupId>) {
        self.group_ids = group_ids;
    }

    /// Detaches the course from its knowledge-base directory.
    pub fn clear_directory(&mut self) {
        self.directory = None;
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn author(&self) -> UserId {
        self.author
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn directory(&self) -> Option<DirectoryId> {
        self.directory
    }

    #[must_use]
    pub fn final_quiz(&self) -> Option<QuizId> {
        self.final_quiz
    }

    #[must_use]
    pub fn quiz_ids(&self) -> &[QuizId] {
        &self.quiz_ids
    }

    #[must_use]
    pub fn group_ids(&self) -> &[GroupId] {
        &self.group_ids
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build(title: &str, slug: &str) -> Result<Course, CourseError> {
        Course::new(
            CourseId::new(1),
            title,
            "about",
            UserId::new(10),
            slug,
            None,
            None,
            None,
            fixed_now(),
        )
    }

    #[test]
    fn course_rejects_empty_title() {
        assert_eq!(build("   ", "ok").unwrap_err(), CourseError::EmptyTitle);
    }

    #[test]
    fn course_rejects_overlong_title() {
        let title = "x".repeat(MAX_TITLE_LEN + 1);
        assert_eq!(build(&title, "ok").unwrap_err(), CourseError::TitleTooLong);
    }

    #[test]
    fn course_rejects_bad_slug() {
        assert_eq!(
            build("Rust", "has space").unwrap_err(),
            CourseError::InvalidSlug
        );
        assert_eq!(build("Rust", "").unwrap_err(), CourseError::InvalidSlug);
    }

    #[test]
    fn course_happy_path() {
        let course = build("Rust 101", "rust-101").unwrap();
        assert_eq!(course.title(), "Rust 101");
        assert_eq!(course.slug(), "rust-101");
        assert_eq!(course.author(), UserId::new(10));
        assert!(course.quiz_ids().is_empty());
        assert!(course.final_quiz().is_none());
    }

    #[test]
    fn course_trims_title() {
        let course = build("  Rust  ", "rust").unwrap();
        assert_eq!(course.title(), "Rust");
    }
}
