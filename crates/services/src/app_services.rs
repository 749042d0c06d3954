use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::course_service::CourseService;
use crate::directory_service::DirectoryService;
use crate::error::AppServicesError;
use crate::experience::ExperienceService;
use crate::lesson_service::LessonService;
use crate::progress::ProgressService;
use crate::quiz_flow::QuizFlowService;
use crate::quiz_service::QuizService;
use crate::trajectory::TrajectoryResolver;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    courses: Arc<CourseService>,
    lessons: Arc<LessonService>,
    quizzes: Arc<QuizService>,
    directories: Arc<DirectoryService>,
    progress: Arc<ProgressService>,
    quiz_flow: Arc<QuizFlowService>,
    experience: Arc<ExperienceService>,
    trajectories: Arc<TrajectoryResolver>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    /// Build services over in-memory storage, mainly for tests.
    #[must_use]
    pub fn new_in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    fn from_storage(storage: Storage, clock: Clock) -> Self {
        let resolver = TrajectoryResolver::new(
            Arc::clone(&storage.trajectories),
            Arc::clone(&storage.lessons),
        );
        let progress = ProgressService::new(
            resolver.clone(),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.results),
            Arc::clone(&storage.enrollments),
        );

        let courses = Arc::new(CourseService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.profiles),
        ));
        let lessons = Arc::new(LessonService::new(
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            progress.clone(),
        ));
        let quizzes = Arc::new(QuizService::new(Arc::clone(&storage.quizzes)));
        let directories = Arc::new(DirectoryService::new(
            Arc::clone(&storage.directories),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.courses),
        ));
        let quiz_flow = Arc::new(QuizFlowService::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.results),
            Arc::clone(&storage.enrollments),
        ));
        let experience = Arc::new(ExperienceService::new(
            clock,
            progress.clone(),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.profiles),
        ));

        Self {
            courses,
            lessons,
            quizzes,
            directories,
            progress: Arc::new(progress),
            quiz_flow,
            experience,
            trajectories: Arc::new(resolver),
        }
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn directories(&self) -> Arc<DirectoryService> {
        Arc::clone(&self.directories)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn quiz_flow(&self) -> Arc<QuizFlowService> {
        Arc::clone(&self.quiz_flow)
    }

    #[must_use]
    pub fn experience(&self) -> Arc<ExperienceService> {
        Arc::clone(&self.experience)
    }

    #[must_use]
    pub fn trajectories(&self) -> Arc<TrajectoryResolver> {
        Arc::clone(&self.trajectories)
    }
}
