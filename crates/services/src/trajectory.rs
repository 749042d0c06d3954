use std::sync::Arc;

use lms_core::model::{CourseId, Lesson, LessonId, UserId, UserLessonTrajectory};
use storage::repository::{LessonRepository, TrajectoryRepository};

use crate::error::ProgressError;

/// Resolves the set of lessons a user works through within a course.
///
/// Trajectories are keyed per (user, course): a non-empty curated
/// trajectory narrows that one course to the lessons it names, while every
/// other course the user is enrolled in keeps its full lesson list. Either
/// way the result is ordered by (order, id).
#[derive(Clone)]
pub struct TrajectoryResolver {
    trajectories: Arc<dyn TrajectoryRepository>,
    lessons: Arc<dyn LessonRepository>,
}

impl TrajectoryResolver {
    #[must_use]
    pub fn new(
        trajectories: Arc<dyn TrajectoryRepository>,
        lessons: Arc<dyn LessonRepository>,
    ) -> Self {
        Self {
            trajectories,
            lessons,
        }
    }

    /// Lessons in scope for `user` within `course`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn resolve(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<Lesson>, ProgressError> {
        match self.trajectories.get_trajectory(user, course).await? {
            Some(trajectory) if !trajectory.is_empty() => {
                let lessons = self.lessons.lessons_by_ids(trajectory.lesson_ids()).await?;
                // guard against stale entries pointing outside the course
                Ok(lessons
                    .into_iter()
                    .filter(|l| l.in_course(course))
                    .collect())
            }
            _ => Ok(self.lessons.lessons_for_course(course).await?),
        }
    }

    /// Replace the user's curated trajectory for one course; an empty list
    /// clears it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn set_trajectory(
        &self,
        user: UserId,
        course: CourseId,
        lesson_ids: Vec<LessonId>,
    ) -> Result<(), ProgressError> {
        if lesson_ids.is_empty() {
            self.trajectories.clear_trajectory(user, course).await?;
        } else {
            self.trajectories
                .set_trajectory(&UserLessonTrajectory::new(user, course, lesson_ids))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn lesson(id: u64, order: u32, courses: &[CourseId]) -> Lesson {
        let mut l = Lesson::new(LessonId::new(id), format!("L{id}"), "", None, order, None).unwrap();
        l.set_courses(courses.to_vec());
        l
    }

    #[tokio::test]
    async fn trajectory_narrows_only_its_own_course() {
        let repo = InMemoryRepository::new();
        let course_a = CourseId::new(1);
        let course_b = CourseId::new(2);
        repo.upsert_lesson(&lesson(1, 1, &[course_a])).await.unwrap();
        repo.upsert_lesson(&lesson(2, 2, &[course_a])).await.unwrap();
        repo.upsert_lesson(&lesson(3, 1, &[course_b])).await.unwrap();
        repo.upsert_lesson(&lesson(4, 2, &[course_b])).await.unwrap();

        let resolver =
            TrajectoryResolver::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        let user = UserId::new(7);

        resolver
            .set_trajectory(user, course_a, vec![LessonId::new(1)])
            .await
            .unwrap();

        // course A is narrowed to the curated lesson
        let scope = resolver.resolve(user, course_a).await.unwrap();
        let ids: Vec<u64> = scope.iter().map(|l| l.id().value()).collect();
        assert_eq!(ids, vec![1]);

        // course B keeps its full lesson set
        let scope = resolver.resolve(user, course_b).await.unwrap();
        assert_eq!(scope.len(), 2);
    }

    #[tokio::test]
    async fn trajectory_skips_lessons_outside_the_course() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new(1);
        let other = CourseId::new(2);
        repo.upsert_lesson(&lesson(1, 1, &[course])).await.unwrap();
        repo.upsert_lesson(&lesson(2, 2, &[other])).await.unwrap();

        let resolver =
            TrajectoryResolver::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        let user = UserId::new(7);

        resolver
            .set_trajectory(user, course, vec![LessonId::new(1), LessonId::new(2)])
            .await
            .unwrap();
        let scope = resolver.resolve(user, course).await.unwrap();
        let ids: Vec<u64> = scope.iter().map(|l| l.id().value()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn clearing_trajectory_restores_course_scope() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new(1);
        repo.upsert_lesson(&lesson(1, 1, &[course])).await.unwrap();

        let resolver =
            TrajectoryResolver::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        let user = UserId::new(7);

        resolver
            .set_trajectory(user, course, vec![LessonId::new(1)])
            .await
            .unwrap();
        resolver.set_trajectory(user, course, Vec::new()).await.unwrap();

        assert!(repo.get_trajectory(user, course).await.unwrap().is_none());
        assert_eq!(resolver.resolve(user, course).await.unwrap().len(), 1);
    }
}
