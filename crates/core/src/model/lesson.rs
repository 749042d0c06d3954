use thiserror::Error;
use url::Url;

use crate::model::ids::{CourseId, DirectoryId, LessonId};

/// Maximum lesson title length.
pub const MAX_TITLE_LEN: usize = 200;

/// Rutube video ids are exactly 32 url-safe characters.
const VIDEO_ID_LEN: usize = 32;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson title exceeds {MAX_TITLE_LEN} characters")]
    TitleTooLong,

    #[error("invalid video link; expected https://rutube.ru/video/<id>/")]
    InvalidVideoLink,
}

//
// ─── VIDEO ID ──────────────────────────────────────────────────────────────────
//

/// Identifier of an attached Rutube video, extracted from the full link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoId(String);

impl VideoId {
    /// Parses a full Rutube URL and keeps only the video id.
    ///
    /// Accepts `https://rutube.ru/video/<id>/` and the `video/embed/<id>`
    /// variant; the id must be exactly 32 url-safe characters.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidVideoLink` for anything else.
    pub fn parse_url(link: &str) -> Result<Self, LessonError> {
        let url = Url::parse(link).map_err(|_| LessonError::InvalidVideoLink)?;
        if url.host_str() != Some("rutube.ru") {
            return Err(LessonError::InvalidVideoLink);
        }

        let mut segments = url
            .path_segments()
            .ok_or(LessonError::InvalidVideoLink)?
            .filter(|s| !s.is_empty());
        if segments.next() != Some("video") {
            return Err(LessonError::InvalidVideoLink);
        }
        let id = match segments.next() {
            Some("embed") => segments.next(),
            other => other,
        }
        .ok_or(LessonError::InvalidVideoLink)?;

        if id.len() != VIDEO_ID_LEN
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(LessonError::InvalidVideoLink);
        }

        Ok(Self(id.to_owned()))
    }

    /// Rehydrates an already-extracted id from storage.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidVideoLink` if the stored id is malformed.
    pub fn from_persisted(id: impl Into<String>) -> Result<Self, LessonError> {
        let id = id.into();
        if id.len() != VIDEO_ID_LEN
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(LessonError::InvalidVideoLink);
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A single lesson, attachable to any number of courses and at most one
/// knowledge-base directory.
///
/// `order` positions the lesson within its directory scope; a zero order is
/// treated as "unset" and auto-computed (max + 1) by the lesson service.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    content: String,
    video_id: Option<VideoId>,
    order: u32,
    course_ids: Vec<CourseId>,
    directory: Option<DirectoryId>,
}

impl Lesson {
    /// Creates a new lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is empty or too long.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        content: impl Into<String>,
        video_id: Option<VideoId>,
        order: u32,
        directory: Option<DirectoryId>,
    ) -> Result<Self, LessonError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(LessonError::TitleTooLong);
        }

        Ok(Self {
            id,
            title,
            content: content.into(),
            video_id,
            order,
            course_ids: Vec::new(),
            directory,
        })
    }

    /// Replaces the set of courses this lesson belongs to.
    pub fn set_courses(&mut self, course_ids: Vec<CourseId>) {
        self.course_ids = course_ids;
    }

    /// Assigns the order computed by the lesson service.
    pub fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    /// Detaches the lesson from its knowledge-base directory.
    pub fn clear_directory(&mut self) {
        self.directory = None;
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn video_id(&self) -> Option<&VideoId> {
        self.video_id.as_ref()
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn course_ids(&self) -> &[CourseId] {
        &self.course_ids
    }

    #[must_use]
    pub fn directory(&self) -> Option<DirectoryId> {
        self.directory
    }

    /// Whether this lesson is attached to the given course.
    #[must_use]
    pub fn in_course(&self, course_id: CourseId) -> bool {
        self.course_ids.contains(&course_id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
