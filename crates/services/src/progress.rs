use std::collections::HashSet;
use std::sync::Arc;

use lms_core::model::{CourseId, CourseProgress, LessonId, UserId};
use storage::repository::{
    CourseRepository, EnrollmentRepository, QuizRepository, QuizResultRepository, StorageError,
};

use crate::error::ProgressError;
use crate::trajectory::TrajectoryResolver;

/// Aggregates a user's standing within a course from lesson progress rows
/// and quiz results.
///
/// Quiz completion is matched by quiz *name* against the user's passed
/// results, so results survive quiz deletion and re-creation under the same
/// name.
#[derive(Clone)]
pub struct ProgressService {
    resolver: TrajectoryResolver,
    courses: Arc<dyn CourseRepository>,
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn QuizResultRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        resolver: TrajectoryResolver,
        courses: Arc<dyn CourseRepository>,
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn QuizResultRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            resolver,
            courses,
            quizzes,
            results,
            enrollments,
        }
    }

    /// Computes the user's progress within the course, honoring any curated
    /// trajectory.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the course is missing or
    /// repository access fails.
    pub async fn course_progress(
        &self,
        user: UserId,
        course_id: CourseId,
    ) -> Result<CourseProgress, ProgressError> {
        let course = self.courses.get_course(course_id).await?;
        let scope = self.resolver.resolve(user, course_id).await?;

        // only rows attributed to this course count toward it
        let completed_ids: HashSet<LessonId> = self
            .enrollments
            .progress_for_user(user)
            .await?
            .into_iter()
            .filter(|p| p.is_completed() && p.course() == Some(course_id))
            .map(|p| p.lesson())
            .collect();

        let total_lessons = u32::try_from(scope.len()).unwrap_or(u32::MAX);
        let completed_lessons = u32::try_from(
            scope.iter().filter(|l| completed_ids.contains(&l.id())).count(),
        )
        .unwrap_or(u32::MAX);

        let quizzes = self.quizzes.quizzes_by_ids(course.quiz_ids()).await?;
        let passed: HashSet<String> = self
            .results
            .passed_quiz_titles(user)
            .await?
            .into_iter()
            .collect();
        let total_quizzes = u32::try_from(quizzes.len()).unwrap_or(u32::MAX);
        let completed_quizzes = u32::try_from(
            quizzes.iter().filter(|q| passed.contains(q.name())).count(),
        )
        .unwrap_or(u32::MAX);

        let final_quiz_passed = match course.final_quiz() {
            Some(quiz_id) => match self.quizzes.get_quiz(quiz_id).await {
                Ok(quiz) => Some(passed.contains(quiz.name())),
                // a dangling final-quiz reference behaves like no final quiz
                Err(StorageError::NotFound) => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        let next_lesson = next_lesson_in_scope(&scope, &completed_ids);

        Ok(CourseProgress::new(
            completed_lessons,
            total_lessons,
            completed_quizzes,
            total_quizzes,
            final_quiz_passed,
            next_lesson,
        ))
    }
}

/// Picks the next lesson: the first one ordered after the highest-ordered
/// completed lesson. With nothing completed, or with nothing left after the
/// last completed lesson, it falls back to the first lesson in scope.
fn next_lesson_in_scope(
    scope: &[lms_core::model::Lesson],
    completed: &HashSet<LessonId>,
) -> Option<LessonId> {
    let first = scope.first().map(lms_core::model::Lesson::id)?;

    let max_completed_order = scope
        .iter()
        .filter(|l| completed.contains(&l.id()))
        .map(lms_core::model::Lesson::order)
        .max();

    match max_completed_order {
        Some(max_order) => Some(
            scope
                .iter()
                .find(|l| l.order() > max_order)
                .map_or(first, lms_core::model::Lesson::id),
        ),
        None => Some(first),
    }
}
