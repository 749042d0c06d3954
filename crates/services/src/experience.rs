use std::sync::Arc;

use lms_core::Clock;
use lms_core::experience::{
    COURSE_EXP_REWARD, LevelInfo, PARTICIPATION_EXP, completion_reward, level_for_exp,
};
use lms_core::model::{CourseId, UserId};
use storage::repository::{EnrollmentRepository, ProfileRepository, StorageError};

use crate::error::ExperienceError;
use crate::progress::ProgressService;

/// Experience granted for one course completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpAward {
    pub amount: u32,
    pub new_total: u32,
    pub level: LevelInfo,
}

/// A user's experience standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileStats {
    pub exp: u32,
    pub level: LevelInfo,
    pub completed_courses: u32,
}

/// Awards course-completion experience exactly once per enrollment.
///
/// The award is keyed to the enrollment's one-shot animation gate: whichever
/// caller flips it first pays out, every other concurrent or repeated check
/// sees `None`.
#[derive(Clone)]
pub struct ExperienceService {
    clock: Clock,
    progress: ProgressService,
    enrollments: Arc<dyn EnrollmentRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ExperienceService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: ProgressService,
        enrollments: Arc<dyn EnrollmentRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            clock,
            progress,
            enrollments,
            profiles,
        }
    }

    /// Checks the user's standing in the course and pays the completion
    /// reward if the course is finished and the reward has not been paid.
    ///
    /// Returns `None` when the course is incomplete or already rewarded.
    ///
    /// # Errors
    ///
    /// Returns `ExperienceError::Storage` if the user is not enrolled or
    /// repository access fails.
    pub async fn maybe_award(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<ExpAward>, ExperienceError> {
        let progress = self.progress.course_progress(user, course).await?;
        if !progress.is_complete() {
            return Ok(None);
        }

        let flipped = self
            .enrollments
            .complete_course_once(user, course, self.clock.now())
            .await?;
        if !flipped {
            return Ok(None);
        }

        let enrollment = self
            .enrollments
            .get_enrollment(user, course)
            .await?
            .ok_or(StorageError::NotFound)?;

        let amount = completion_reward(enrollment.exp_eligible());
        let new_total = self.profiles.add_exp(user, amount).await?;
        let level = level_for_exp(new_total);

        tracing::info!(
            user = user.value(),
            course = course.value(),
            amount,
            new_total,
            level = level.level,
            "course completion reward granted"
        );

        Ok(Some(ExpAward {
            amount,
            new_total,
            level,
        }))
    }

    /// The user's experience total, level and completed-course count.
    ///
    /// Experience is recomputed from the enrollment list on every call: a
    /// completed, exp-eligible course counts the full reward, every other
    /// started course counts the flat participation amount.
    ///
    /// # Errors
    ///
    /// Returns `ExperienceError::Storage` if repository access fails.
    pub async fn profile_stats(&self, user: UserId) -> Result<ProfileStats, ExperienceError> {
        let enrollments = self.enrollments.enrollments_for_user(user).await?;

        let mut exp: u32 = 0;
        let mut completed_courses: u32 = 0;
        for enrollment in &enrollments {
            if enrollment.is_completed() {
                completed_courses = completed_courses.saturating_add(1);
            }
            let amount = if enrollment.is_completed() && enrollment.exp_eligible() {
                COURSE_EXP_REWARD
            } else {
                PARTICIPATION_EXP
            };
            exp = exp.saturating_add(amount);
        }

        Ok(ProfileStats {
            exp,
            level: level_for_exp(exp),
            completed_courses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{Course, CourseId, UserCourse};
    use lms_core::time::{fixed_clock, fixed_now};
    use storage::repository::{
        CourseRepository, InMemoryRepository, QuizRepository, QuizResultRepository,
        TrajectoryRepository,
    };

    use crate::progress::ProgressService;
    use crate::trajectory::TrajectoryResolver;

    fn service(repo: &InMemoryRepository) -> ExperienceService {
        let resolver = TrajectoryResolver::new(
            Arc::new(repo.clone()) as Arc<dyn TrajectoryRepository>,
            Arc::new(repo.clone()),
        );
        let progress = ProgressService::new(
            resolver,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()) as Arc<dyn QuizRepository>,
            Arc::new(repo.clone()) as Arc<dyn QuizResultRepository>,
            Arc::new(repo.clone()),
        );
        ExperienceService::new(
            fixed_clock(),
            progress,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn seed_course(repo: &InMemoryRepository, id: u64) -> CourseId {
        let course = Course::new(
            CourseId::new(id),
            format!("Course {id}"),
            "",
            UserId::new(1),
            format!("course-{id}"),
            None,
            None,
            None,
            fixed_now(),
        )
        .unwrap();
        repo.upsert_course(&course).await.unwrap();
        course.id()
    }

    #[tokio::test]
    async fn started_courses_contribute_participation_exp() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let user = UserId::new(7);
        let course = seed_course(&repo, 1).await;

        repo.upsert_enrollment(&UserCourse::new(user, course, fixed_now()))
            .await
            .unwrap();

        let stats = service.profile_stats(user).await.unwrap();
        assert_eq!(stats.exp, PARTICIPATION_EXP);
        assert_eq!(stats.level.level, 1);
        assert_eq!(stats.level.progress_percent, PARTICIPATION_EXP);
        assert_eq!(stats.completed_courses, 0);
    }

    #[tokio::test]
    async fn profile_exp_mixes_full_and_participation_rewards() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let user = UserId::new(7);
        let done = seed_course(&repo, 1).await;
        let started = seed_course(&repo, 2).await;
        let ineligible = seed_course(&repo, 3).await;

        let mut completed = UserCourse::new(user, done, fixed_now());
        completed.mark_completed(fixed_now());
        repo.upsert_enrollment(&completed).await.unwrap();

        repo.upsert_enrollment(&UserCourse::new(user, started, fixed_now()))
            .await
            .unwrap();

        let mut revoked = UserCourse::new(user, ineligible, fixed_now());
        revoked.mark_completed(fixed_now());
        revoked.revoke_exp_eligibility();
        repo.upsert_enrollment(&revoked).await.unwrap();

        let stats = service.profile_stats(user).await.unwrap();
        // 100 full + 15 started + 15 completed-but-ineligible
        assert_eq!(stats.exp, 130);
        assert_eq!(stats.level.level, 2);
        assert_eq!(stats.level.progress_percent, 30);
        assert_eq!(stats.completed_courses, 2);
    }
}
