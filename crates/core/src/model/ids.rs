use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[doc = $doc:expr] $name:ident),+ $(,)?) => {
        $(
            #[doc = $doc]
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            pub struct $name(u64);

            impl $name {
                #[doc = concat!("Creates a new `", stringify!($name), "`")]
                #[must_use]
                pub fn new(id: u64) -> Self {
                    Self(id)
                }

                /// Returns the underlying u64 value
                #[must_use]
                pub fn value(&self) -> u64 {
                    self.0
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = ParseIdError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.parse::<u64>().map($name::new).map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
                }
            }
        )+
    };
}

define_id! {
    /// Unique identifier for a Course
    CourseId,
    /// Unique identifier for a Lesson
    LessonId,
    /// Unique identifier for a Quiz
    QuizId,
    /// Unique identifier for a Question
    QuestionId,
    /// Unique identifier for an Answer
    AnswerId,
    /// Unique identifier for a knowledge-base Directory
    DirectoryId,
    /// Unique identifier for a User (owned by the auth collaborator)
    UserId,
    /// Unique identifier for a user Group (owned by the auth collaborator)
    GroupId,
    /// Unique identifier for a persisted QuizResult
    QuizResultId,
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_id_display() {
        let id = CourseId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_course_id_from_str() {
        let id: CourseId = "123".parse().unwrap();
        assert_eq!(id, CourseId::new(123));
    }

    #[test]
    fn test_lesson_id_from_str_invalid() {
        let result = "not-a-number".parse::<LessonId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_question_id_debug() {
        let id = QuestionId::new(7);
        assert_eq!(format!("{id:?}"), "QuestionId(7)");
    }

    #[test]
    fn test_id_roundtrip() {
        let original = QuizId::new(42);
        let serialized = original.to_string();
        let deserialized: QuizId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }
}
