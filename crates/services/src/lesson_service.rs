use std::sync::Arc;

use lms_core::model::{CourseId, DirectoryId, Lesson, LessonId, QuizId, UserId, UserProgress, VideoId};
use storage::repository::{CourseRepository, EnrollmentRepository, LessonRepository};

use crate::auth::{Actor, AuthPolicy};
use crate::error::LessonServiceError;
use crate::progress::ProgressService;

/// Input for creating or editing a lesson.
#[derive(Debug, Clone, Default)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    /// Full video link; the id is extracted and stored.
    pub video_link: Option<String>,
    /// Explicit position; `None` appends after the current maximum within
    /// the directory scope.
    pub order: Option<u32>,
    pub directory: Option<DirectoryId>,
    pub course_ids: Vec<CourseId>,
}

/// Where the learner goes after finishing a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Lesson(LessonId),
    /// Every lesson is done; the course's final quiz still stands between
    /// the learner and completion.
    FinalQuiz(QuizId),
    Done,
}

/// Orchestrates lesson authoring and the learner's lesson flow.
#[derive(Clone)]
pub struct LessonService {
    policy: AuthPolicy,
    lessons: Arc<dyn LessonRepository>,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: ProgressService,
}

impl LessonService {
    #[must_use]
    pub fn new(
        lessons: Arc<dyn LessonRepository>,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: ProgressService,
    ) -> Self {
        Self {
            policy: AuthPolicy::new(),
            lessons,
            courses,
            enrollments,
            progress,
        }
    }

    /// Create a lesson, appending it after the last lesson in its directory
    /// scope when no explicit order is given.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Auth` for non-staff actors, plus
    /// validation and storage errors.
    pub async fn create_lesson(
        &self,
        actor: Actor,
        id: LessonId,
        draft: LessonDraft,
    ) -> Result<Lesson, LessonServiceError> {
        self.policy.ensure_staff(actor)?;

        let video_id = draft
            .video_link
            .as_deref()
            .map(VideoId::parse_url)
            .transpose()?;

        let order = match draft.order {
            Some(order) => order,
            None => self.lessons.max_order(draft.directory).await? + 1,
        };

        let mut lesson = Lesson::new(
            id,
            draft.title,
            draft.content,
            video_id,
            order,
            draft.directory,
        )?;
        lesson.set_courses(draft.course_ids);

        self.lessons.upsert_lesson(&lesson).await?;
        Ok(lesson)
    }

    /// Update a lesson in place; `order: None` keeps its current position.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Auth` for non-staff actors, plus
    /// validation and storage errors.
    pub async fn edit_lesson(
        &self,
        actor: Actor,
        id: LessonId,
        draft: LessonDraft,
    ) -> Result<Lesson, LessonServiceError> {
        self.policy.ensure_staff(actor)?;
        let existing = self.lessons.get_lesson(id).await?;

        let video_id = draft
            .video_link
            .as_deref()
            .map(VideoId::parse_url)
            .transpose()?;

        let mut lesson = Lesson::new(
            id,
            draft.title,
            draft.content,
            video_id,
            draft.order.unwrap_or(existing.order()),
            draft.directory,
        )?;
        lesson.set_courses(draft.course_ids);

        self.lessons.upsert_lesson(&lesson).await?;
        Ok(lesson)
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::Auth` for non-staff actors, or storage
    /// errors.
    pub async fn delete_lesson(&self, actor: Actor, id: LessonId) -> Result<(), LessonServiceError> {
        self.policy.ensure_staff(actor)?;
        self.lessons.delete_lesson(id).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if missing or on repository
    /// failures.
    pub async fn get_lesson(&self, id: LessonId) -> Result<Lesson, LessonServiceError> {
        Ok(self.lessons.get_lesson(id).await?)
    }

    /// Record that the user opened the lesson. Viewing never downgrades a
    /// completed lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if the lesson is missing or on
    /// repository failures.
    pub async fn view_lesson(
        &self,
        user: UserId,
        lesson_id: LessonId,
        course: Option<CourseId>,
    ) -> Result<Lesson, LessonServiceError> {
        let lesson = self.lessons.get_lesson(lesson_id).await?;
        self.enrollments
            .upsert_progress(&UserProgress::viewed(user, lesson.id(), course))
            .await?;
        Ok(lesson)
    }

    /// Mark the lesson completed and point the learner at the next step
    /// within the course: the next lesson, the final quiz once all lessons
    /// are done, or nothing further.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if the lesson is missing or on
    /// repository failures.
    pub async fn complete_lesson(
        &self,
        user: UserId,
        lesson_id: LessonId,
        course: Option<CourseId>,
    ) -> Result<NextStep, LessonServiceError> {
        let lesson = self.lessons.get_lesson(lesson_id).await?;
        self.enrollments
            .upsert_progress(&UserProgress::completed(user, lesson.id(), course))
            .await?;

        let Some(course_id) = course else {
            return Ok(NextStep::Done);
        };

        let progress = self.progress.course_progress(user, course_id).await?;
        if progress.completed_lessons() >= progress.total_lessons() {
            if progress.final_quiz_passed() == Some(false) {
                let course = self.courses.get_course(course_id).await?;
                if let Some(final_quiz) = course.final_quiz() {
                    return Ok(NextStep::FinalQuiz(final_quiz));
                }
            }
            return Ok(NextStep::Done);
        }

        match progress.next_lesson() {
            Some(next) => Ok(NextStep::Lesson(next)),
            None => Ok(NextStep::Done),
        }
    }
}
