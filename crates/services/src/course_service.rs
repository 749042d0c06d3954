use std::collections::HashMap;
use std::sync::Arc;

use lms_core::Clock;
use lms_core::model::{Course, CourseId, DirectoryId, GroupId, QuizId, UserCourse, UserId};
use lms_core::slug::{slugify, with_suffix};
use storage::repository::{CourseRepository, EnrollmentRepository, ProfileRepository};

use crate::auth::{Actor, AuthPolicy};
use crate::error::CourseServiceError;

/// Input for creating or editing a course.
#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub directory: Option<DirectoryId>,
    pub final_quiz: Option<QuizId>,
    pub quiz_ids: Vec<QuizId>,
    pub group_ids: Vec<GroupId>,
}

/// One user's view of the catalog, split by enrollment state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseListing {
    /// Courses the user has not started.
    pub available: Vec<Course>,
    /// Courses started but not yet completed.
    pub started: Vec<Course>,
    pub completed: Vec<Course>,
}

/// Orchestrates course authoring, enrollment and group-based assignment.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    policy: AuthPolicy,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            clock,
            policy: AuthPolicy::new(),
            courses,
            enrollments,
            profiles,
        }
    }

    /// Create a course authored by the actor, deriving a unique slug from
    /// the title.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Auth` for non-staff actors,
    /// `CourseServiceError::DuplicateTitle` when the actor already has a
    /// course with this title, and validation/storage errors otherwise.
    pub async fn create_course(
        &self,
        actor: Actor,
        id: CourseId,
        draft: CourseDraft,
    ) -> Result<Course, CourseServiceError> {
        self.policy.ensure_staff(actor)?;

        let title = draft.title.trim().to_owned();
        if self
            .courses
            .find_by_title_author(&title, actor.user())
            .await?
            .is_some()
        {
            return Err(CourseServiceError::DuplicateTitle);
        }

        let slug = self.unique_slug(&title).await?;
        let mut course = Course::new(
            id,
            title,
            draft.description,
            actor.user(),
            slug,
            draft.image,
            draft.directory,
            draft.final_quiz,
            self.clock.now(),
        )?;
        course.set_quizzes(draft.quiz_ids);
        course.set_groups(draft.group_ids);

        self.courses.upsert_course(&course).await?;
        tracing::info!(
            course = course.id().value(),
            slug = course.slug(),
            "course created"
        );
        Ok(course)
    }

    /// Update a course in place. The slug assigned at creation is kept.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Auth` unless the actor is the author or
    /// an admin, plus validation/storage errors.
    pub async fn edit_course(
        &self,
        actor: Actor,
        id: CourseId,
        draft: CourseDraft,
    ) -> Result<Course, CourseServiceError> {
        let existing = self.courses.get_course(id).await?;
        self.policy.ensure_course_owner(actor, &existing)?;

        let title = draft.title.trim().to_owned();
        if let Some(other) = self
            .courses
            .find_by_title_author(&title, existing.author())
            .await?
            && other != id
        {
            return Err(CourseServiceError::DuplicateTitle);
        }

        let mut course = Course::new(
            id,
            title,
            draft.description,
            existing.author(),
            existing.slug(),
            draft.image,
            draft.directory,
            draft.final_quiz,
            existing.created_at(),
        )?;
        course.set_quizzes(draft.quiz_ids);
        course.set_groups(draft.group_ids);

        self.courses.upsert_course(&course).await?;
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Auth` unless the actor is the author or
    /// an admin, or `CourseServiceError::Storage` on repository failures.
    pub async fn delete_course(&self, actor: Actor, id: CourseId) -> Result<(), CourseServiceError> {
        let course = self.courses.get_course(id).await?;
        self.policy.ensure_course_owner(actor, &course)?;
        self.courses.delete_course(id).await?;
        tracing::info!(course = id.value(), "course deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if missing or on repository
    /// failures.
    pub async fn get_course(&self, id: CourseId) -> Result<Course, CourseServiceError> {
        Ok(self.courses.get_course(id).await?)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if missing or on repository
    /// failures.
    pub async fn get_course_by_slug(&self, slug: &str) -> Result<Course, CourseServiceError> {
        Ok(self.courses.get_course_by_slug(slug).await?)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` on repository failures.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.list_courses().await?)
    }

    /// The full catalog split by the user's enrollment state: untouched,
    /// started and completed courses.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` on repository failures.
    pub async fn course_list_for_user(
        &self,
        user: UserId,
    ) -> Result<CourseListing, CourseServiceError> {
        let enrollments: HashMap<CourseId, bool> = self
            .enrollments
            .enrollments_for_user(user)
            .await?
            .into_iter()
            .map(|e| (e.course(), e.is_completed()))
            .collect();

        let mut listing = CourseListing::default();
        for course in self.courses.list_courses().await? {
            match enrollments.get(&course.id()) {
                Some(true) => listing.completed.push(course),
                Some(false) => listing.started.push(course),
                None => listing.available.push(course),
            }
        }
        Ok(listing)
    }

    /// Enroll the user into the course, or return the existing enrollment
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the course is missing or on
    /// repository failures.
    pub async fn start_course(
        &self,
        user: UserId,
        course_id: CourseId,
    ) -> Result<UserCourse, CourseServiceError> {
        let course = self.courses.get_course(course_id).await?;

        if let Some(existing) = self.enrollments.get_enrollment(user, course.id()).await? {
            return Ok(existing);
        }

        let enrollment = UserCourse::new(user, course.id(), self.clock.now());
        self.enrollments.upsert_enrollment(&enrollment).await?;
        Ok(enrollment)
    }

    /// Enroll the user into every course assigned to their groups. Existing
    /// enrollments are left alone; returns the number created.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` on repository failures.
    pub async fn sync_group_enrollments(&self, user: UserId) -> Result<u32, CourseServiceError> {
        let mut created = 0;
        for group in self.profiles.groups_for_user(user).await? {
            for course in self.courses.courses_for_group(group).await? {
                if self
                    .enrollments
                    .get_enrollment(user, course.id())
                    .await?
                    .is_none()
                {
                    let enrollment = UserCourse::new(user, course.id(), self.clock.now());
                    self.enrollments.upsert_enrollment(&enrollment).await?;
                    created += 1;
                }
            }
        }
        if created > 0 {
            tracing::debug!(user = user.value(), created, "group enrollments synced");
        }
        Ok(created)
    }

    /// Derives a slug from the title, suffixing a counter until it is free.
    async fn unique_slug(&self, title: &str) -> Result<String, CourseServiceError> {
        let base = {
            let s = slugify(title);
            if s.is_empty() { "course".to_owned() } else { s }
        };

        if !self.courses.slug_exists(&base).await? {
            return Ok(base);
        }
        let mut counter = 1;
        loop {
            let candidate = with_suffix(&base, counter);
            if !self.courses.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> CourseService {
        CourseService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    fn draft(title: &str) -> CourseDraft {
        CourseDraft {
            title: title.to_owned(),
            description: "about".to_owned(),
            ..CourseDraft::default()
        }
    }

    #[tokio::test]
    async fn learners_cannot_create_courses() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let err = service
            .create_course(Actor::learner(UserId::new(1)), CourseId::new(1), draft("Rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::Auth(_)));
    }

    #[tokio::test]
    async fn slug_disambiguates_with_counter() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let staff_a = Actor::staff(UserId::new(1));
        let staff_b = Actor::staff(UserId::new(2));

        let first = service
            .create_course(staff_a, CourseId::new(1), draft("Intro to Rust"))
            .await
            .unwrap();
        let second = service
            .create_course(staff_b, CourseId::new(2), draft("Intro to Rust"))
            .await
            .unwrap();

        assert_eq!(first.slug(), "intro-to-rust");
        assert_eq!(second.slug(), "intro-to-rust-1");
    }

    #[tokio::test]
    async fn duplicate_title_by_same_author_rejected() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let staff = Actor::staff(UserId::new(1));

        service
            .create_course(staff, CourseId::new(1), draft("Rust"))
            .await
            .unwrap();
        let err = service
            .create_course(staff, CourseId::new(2), draft("Rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::DuplicateTitle));
    }

    #[tokio::test]
    async fn edit_requires_author_or_admin() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let author = Actor::staff(UserId::new(1));

        service
            .create_course(author, CourseId::new(1), draft("Rust"))
            .await
            .unwrap();

        let err = service
            .edit_course(Actor::staff(UserId::new(2)), CourseId::new(1), draft("Rust v2"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::Auth(_)));

        let edited = service
            .edit_course(Actor::admin(UserId::new(2)), CourseId::new(1), draft("Rust v2"))
            .await
            .unwrap();
        assert_eq!(edited.title(), "Rust v2");
        // slug assigned at creation survives edits
        assert_eq!(edited.slug(), "rust");
    }

    #[tokio::test]
    async fn start_course_is_idempotent() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let staff = Actor::staff(UserId::new(1));
        let user = UserId::new(5);

        service
            .create_course(staff, CourseId::new(1), draft("Rust"))
            .await
            .unwrap();

        let first = service.start_course(user, CourseId::new(1)).await.unwrap();
        assert_eq!(first.started_at(), fixed_now());
        let again = service.start_course(user, CourseId::new(1)).await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn course_listing_splits_by_enrollment_state() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let staff = Actor::staff(UserId::new(1));
        let user = UserId::new(5);

        for (id, title) in [(1, "Untouched"), (2, "Started"), (3, "Finished")] {
            service
                .create_course(staff, CourseId::new(id), draft(title))
                .await
                .unwrap();
        }
        service.start_course(user, CourseId::new(2)).await.unwrap();
        let mut finished = service.start_course(user, CourseId::new(3)).await.unwrap();
        finished.mark_completed(fixed_now());
        repo.upsert_enrollment(&finished).await.unwrap();

        let listing = service.course_list_for_user(user).await.unwrap();
        let titles = |courses: &[Course]| -> Vec<String> {
            courses.iter().map(|c| c.title().to_owned()).collect()
        };
        assert_eq!(titles(&listing.available), vec!["Untouched"]);
        assert_eq!(titles(&listing.started), vec!["Started"]);
        assert_eq!(titles(&listing.completed), vec!["Finished"]);
    }

    #[tokio::test]
    async fn group_membership_creates_enrollments() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let staff = Actor::staff(UserId::new(1));
        let user = UserId::new(5);

        let mut d = draft("Rust");
        d.group_ids = vec![GroupId::new(3)];
        service.create_course(staff, CourseId::new(1), d).await.unwrap();
        service
            .create_course(staff, CourseId::new(2), draft("Other"))
            .await
            .unwrap();

        repo.set_groups(user, &[GroupId::new(3)]).await.unwrap();

        assert_eq!(service.sync_group_enrollments(user).await.unwrap(), 1);
        // repeat sync creates nothing new
        assert_eq!(service.sync_group_enrollments(user).await.unwrap(), 0);

        let enrollments = repo.enrollments_for_user(user).await.unwrap();
        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0].course(), CourseId::new(1));
    }
}
