#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod course_service;
pub mod directory_service;
pub mod error;
pub mod experience;
pub mod lesson_service;
pub mod progress;
pub mod quiz_flow;
pub mod quiz_service;
pub mod trajectory;

pub use lms_core::Clock;

pub use app_services::AppServices;
pub use auth::{Actor, AuthPolicy};
pub use course_service::{CourseDraft, CourseListing, CourseService};
pub use directory_service::{DeleteMode, DirectoryNode, DirectoryService};
pub use error::{
    AppServicesError, AuthError, CourseServiceError, DirectoryServiceError, ExperienceError,
    LessonServiceError, ProgressError, QuizFlowError, QuizServiceError,
};
pub use experience::{ExpAward, ExperienceService, ProfileStats};
pub use lesson_service::{LessonDraft, LessonService, NextStep};
pub use progress::ProgressService;
pub use quiz_flow::{QuizFinish, QuizFlowService, QuizStart};
pub use quiz_service::QuizService;
pub use trajectory::TrajectoryResolver;
