use crate::model::ids::LessonId;

/// Aggregated progress of one user within one course.
///
/// Built by the progress service from lesson progress rows and quiz results;
/// this type owns only the arithmetic and the completion policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProgress {
    completed_lessons: u32,
    total_lessons: u32,
    completed_quizzes: u32,
    total_quizzes: u32,
    /// Pass state of the course's final quiz; `None` when the course has no
    /// final quiz configured.
    final_quiz_passed: Option<bool>,
    next_lesson: Option<LessonId>,
}

impl CourseProgress {
    #[must_use]
    pub fn new(
        completed_lessons: u32,
        total_lessons: u32,
        completed_quizzes: u32,
        total_quizzes: u32,
        final_quiz_passed: Option<bool>,
        next_lesson: Option<LessonId>,
    ) -> Self {
        Self {
            completed_lessons,
            total_lessons,
            completed_quizzes,
            total_quizzes,
            final_quiz_passed,
            next_lesson,
        }
    }

    /// Overall percent, floored: completed items over total items. An empty
    /// course reports 0.
    #[must_use]
    pub fn percent(&self) -> u32 {
        let total = u64::from(self.total_lessons) + u64::from(self.total_quizzes);
        if total == 0 {
            return 0;
        }
        let done = u64::from(self.completed_lessons) + u64::from(self.completed_quizzes);
        u32::try_from(done * 100 / total).unwrap_or(u32::MAX)
    }

    /// Whether the course counts as finished: every lesson and quiz done,
    /// the final quiz (if any) passed, and the course non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_lessons + self.total_quizzes > 0
            && self.completed_lessons >= self.total_lessons
            && self.completed_quizzes >= self.total_quizzes
            && self.final_quiz_passed.unwrap_or(true)
    }

    // Accessors
    #[must_use]
    pub fn completed_lessons(&self) -> u32 {
        self.completed_lessons
    }

    #[must_use]
    pub fn total_lessons(&self) -> u32 {
        self.total_lessons
    }

    #[must_use]
    pub fn completed_quizzes(&self) -> u32 {
        self.completed_quizzes
    }

    #[must_use]
    pub fn total_quizzes(&self) -> u32 {
        self.total_quizzes
    }

    #[must_use]
    pub fn final_quiz_passed(&self) -> Option<bool> {
        self.final_quiz_passed
    }

    #[must_use]
    pub fn next_lesson(&self) -> Option<LessonId> {
        self.next_lesson
    }
}
