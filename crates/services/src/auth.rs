//! Authorization policy for authoring and catalog management.
//!
//! Policy checks are explicit and centralized: services take an [`Actor`]
//! and ask the [`AuthPolicy`] before mutating the catalog, instead of
//! scattering role checks through the call sites.

use lms_core::model::{Course, UserId};

use crate::error::AuthError;

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    user: UserId,
    is_staff: bool,
    is_admin: bool,
}

impl Actor {
    #[must_use]
    pub fn new(user: UserId, is_staff: bool, is_admin: bool) -> Self {
        Self {
            user,
            is_staff,
            is_admin,
        }
    }

    /// A regular learner with no authoring rights.
    #[must_use]
    pub fn learner(user: UserId) -> Self {
        Self::new(user, false, false)
    }

    /// A staff member; admins are staff too.
    #[must_use]
    pub fn staff(user: UserId) -> Self {
        Self::new(user, true, false)
    }

    #[must_use]
    pub fn admin(user: UserId) -> Self {
        Self::new(user, true, true)
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.is_staff || self.is_admin
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

/// Centralized authorization rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthPolicy;

impl AuthPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Authoring courses, lessons, quizzes and directories requires staff.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StaffRequired` for non-staff actors.
    pub fn ensure_staff(&self, actor: Actor) -> Result<(), AuthError> {
        if actor.is_staff() {
            Ok(())
        } else {
            Err(AuthError::StaffRequired)
        }
    }

    /// # Errors
    ///
    /// Returns `AuthError::AdminRequired` for non-admin actors.
    pub fn ensure_admin(&self, actor: Actor) -> Result<(), AuthError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(AuthError::AdminRequired)
        }
    }

    /// Editing or deleting a course is reserved for its author and admins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotCourseOwner` otherwise.
    pub fn ensure_course_owner(&self, actor: Actor, course: &Course) -> Result<(), AuthError> {
        if actor.is_admin() || course.author() == actor.user() {
            Ok(())
        } else {
            Err(AuthError::NotCourseOwner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::CourseId;
    use lms_core::time::fixed_now;

    fn course_by(author: u64) -> Course {
        Course::new(
            CourseId::new(1),
            "Rust",
            "",
            UserId::new(author),
            "rust",
            None,
            None,
            None,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn learner_cannot_author() {
        let policy = AuthPolicy::new();
        assert_eq!(
            policy.ensure_staff(Actor::learner(UserId::new(1))).unwrap_err(),
            AuthError::StaffRequired
        );
        assert!(policy.ensure_staff(Actor::staff(UserId::new(1))).is_ok());
    }

    #[test]
    fn admins_are_staff() {
        let policy = AuthPolicy::new();
        assert!(policy.ensure_staff(Actor::admin(UserId::new(1))).is_ok());
    }

    #[test]
    fn course_owner_rules() {
        let policy = AuthPolicy::new();
        let course = course_by(10);

        assert!(policy
            .ensure_course_owner(Actor::staff(UserId::new(10)), &course)
            .is_ok());
        assert!(policy
            .ensure_course_owner(Actor::admin(UserId::new(99)), &course)
            .is_ok());
        assert_eq!(
            policy
                .ensure_course_owner(Actor::staff(UserId::new(99)), &course)
                .unwrap_err(),
            AuthError::NotCourseOwner
        );
    }
}
