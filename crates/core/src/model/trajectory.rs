use crate::model::ids::{CourseId, LessonId, UserId};

/// A curated learning trajectory for one user within one course: an
/// explicit lesson list that overrides course membership when present.
/// Each (user, course) pair carries at most one trajectory; other courses
/// the user is enrolled in are unaffected.
///
/// Lesson order within the trajectory follows each lesson's own `order`
/// field; the trajectory only selects which lessons are in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLessonTrajectory {
    user: UserId,
    course: CourseId,
    lesson_ids: Vec<LessonId>,
}

impl UserLessonTrajectory {
    #[must_use]
    pub fn new(user: UserId, course: CourseId, lesson_ids: Vec<LessonId>) -> Self {
        Self {
            user,
            course,
            lesson_ids,
        }
    }

    /// Replaces the curated lesson set.
    pub fn set_lessons(&mut self, lesson_ids: Vec<LessonId>) {
        self.lesson_ids = lesson_ids;
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn course(&self) -> CourseId {
        self.course
    }

    #[must_use]
    pub fn lesson_ids(&self) -> &[LessonId] {
        &self.lesson_ids
    }

    /// A trajectory with no lessons behaves as if it did not exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lesson_ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, lesson: LessonId) -> bool {
        self.lesson_ids.contains(&lesson)
    }
}
