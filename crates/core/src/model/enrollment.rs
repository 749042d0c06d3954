use chrono::{DateTime, Utc};

use crate::model::ids::{CourseId, LessonId, UserId};

/// Per-(user, course) enrollment record.
///
/// `animation_shown` is the one-shot idempotency gate for the completion
/// reward: experience side effects happen only on its false→true
/// transition. `exp_eligible` mirrors the external `can_receive_exp`
/// predicate and defaults to true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCourse {
    user: UserId,
    course: CourseId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    is_completed: bool,
    animation_shown: bool,
    exp_eligible: bool,
}

impl UserCourse {
    /// Creates a fresh enrollment.
    #[must_use]
    pub fn new(user: UserId, course: CourseId, started_at: DateTime<Utc>) -> Self {
        Self {
            user,
            course,
            started_at,
            completed_at: None,
            is_completed: false,
            animation_shown: false,
            exp_eligible: true,
        }
    }

    /// Rehydrates an enrollment from persisted storage.
    #[must_use]
    pub fn from_persisted(
        user: UserId,
        course: CourseId,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        is_completed: bool,
        animation_shown: bool,
        exp_eligible: bool,
    ) -> Self {
        Self {
            user,
            course,
            started_at,
            completed_at,
            is_completed,
            animation_shown,
            exp_eligible,
        }
    }

    /// Marks the course completed without touching the animation gate.
    ///
    /// Used by the quiz finish flow; the gated reward path goes through the
    /// storage-level conditional flip instead.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        if self.completed_at.is_none() {
            self.completed_at = Some(at);
        }
    }

    /// Marks the enrollment ineligible for the full experience reward.
    pub fn revoke_exp_eligibility(&mut self) {
        self.exp_eligible = false;
    }

    // Accessors
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn course(&self) -> CourseId {
        self.course
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn animation_shown(&self) -> bool {
        self.animation_shown
    }

    #[must_use]
    pub fn exp_eligible(&self) -> bool {
        self.exp_eligible
    }
}

/// Per-(user, lesson) progress row; `completed` flips true when the learner
/// finishes the lesson, viewing alone leaves it false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgress {
    user: UserId,
    lesson: LessonId,
    course: Option<CourseId>,
    completed: bool,
}

impl UserProgress {
    #[must_use]
    pub fn viewed(user: UserId, lesson: LessonId, course: Option<CourseId>) -> Self {
        Self {
            user,
            lesson,
            course,
            completed: false,
        }
    }

    #[must_use]
    pub fn completed(user: UserId, lesson: LessonId, course: Option<CourseId>) -> Self {
        Self {
            user,
            lesson,
            course,
            completed: true,
        }
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn lesson(&self) -> LessonId {
        self.lesson
    }

    #[must_use]
    pub fn course(&self) -> Option<CourseId> {
        self.course
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_enrollment_defaults() {
        let uc = UserCourse::new(UserId::new(1), CourseId::new(2), fixed_now());
        assert!(!uc.is_completed());
        assert!(!uc.animation_shown());
        assert!(uc.exp_eligible());
        assert_eq!(uc.completed_at(), None);
    }

    #[test]
    fn mark_completed_keeps_first_timestamp() {
        let mut uc = UserCourse::new(UserId::new(1), CourseId::new(2), fixed_now());
        let first = fixed_now() + chrono::Duration::days(1);
        let second = first + chrono::Duration::days(1);
        uc.mark_completed(first);
        uc.mark_completed(second);
        assert_eq!(uc.completed_at(), Some(first));
    }
}
