use thiserror::Error;

use crate::model::ids::DirectoryId;

/// Maximum directory name length.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DirectoryError {
    #[error("directory name cannot be empty")]
    EmptyName,

    #[error("directory name exceeds {MAX_NAME_LEN} characters")]
    NameTooLong,

    #[error("directory cannot be its own parent")]
    SelfParent,
}

/// A knowledge-base folder. Directories form a tree via `parent`; siblings
/// sort by (order, name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    id: DirectoryId,
    name: String,
    parent: Option<DirectoryId>,
    order: u32,
}

impl Directory {
    /// Creates a new directory.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the name is empty/too long or the node
    /// points at itself.
    pub fn new(
        id: DirectoryId,
        name: impl Into<String>,
        parent: Option<DirectoryId>,
        order: u32,
    ) -> Result<Self, DirectoryError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DirectoryError::NameTooLong);
        }
        if parent == Some(id) {
            return Err(DirectoryError::SelfParent);
        }

        Ok(Self {
            id,
            name,
            parent,
            order,
        })
    }

    /// Renames the directory.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the new name is empty or too long.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), DirectoryError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DirectoryError::NameTooLong);
        }
        self.name = name;
        Ok(())
    }

    /// Moves the directory under a new parent (or to the root).
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::SelfParent` when pointed at itself. Cycle
    /// detection across deeper ancestry is the directory service's job.
    pub fn reparent(&mut self, parent: Option<DirectoryId>) -> Result<(), DirectoryError> {
        if parent == Some(self.id) {
            return Err(DirectoryError::SelfParent);
        }
        self.parent = parent;
        Ok(())
    }

    pub fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> DirectoryId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<DirectoryId> {
        self.parent
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Sort key used everywhere directories are listed.
    #[must_use]
    pub fn sort_key(&self) -> (u32, &str) {
        (self.order, &self.name)
    }
}
