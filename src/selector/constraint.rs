//! Selector constraints.

use std::fmt;

use crate::filesystem::Version;

/// The four constraint types of the selector grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    Version,
    Latest,
    Dir,
    File,
}

impl ConstraintType {
    /// whether this constraint picks a version or extends the location
    pub fn kind(self) -> ConstraintKind {
        match self {
            ConstraintType::Version | ConstraintType::Latest => ConstraintKind::Version,
            ConstraintType::Dir | ConstraintType::File => ConstraintKind::Location,
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::Version => write!(f, "version"),
            ConstraintType::Latest => write!(f, "latest"),
            ConstraintType::Dir => write!(f, "dir"),
            ConstraintType::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Version,
    Location,
}

/// One token of a selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// descend into a directory
    Dir(String),
    /// name a file inside the current directory
    File(String),
    /// pin an explicit version
    Version(Version),
    /// pin the latest version, scoped by the location so far
    Latest,
}

impl Constraint {
    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            Constraint::Dir(_) => ConstraintType::Dir,
            Constraint::File(_) => ConstraintType::File,
            Constraint::Version(_) => ConstraintType::Version,
            Constraint::Latest => ConstraintType::Latest,
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        self.constraint_type().kind()
    }

    /// the path segment of a location constraint
    pub fn location(&self) -> Option<&str> {
        match self {
            Constraint::Dir(path) | Constraint::File(path) => Some(path),
            Constraint::Version(_) | Constraint::Latest => None,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Dir(path) => write!(f, "dir({:?})", path),
            Constraint::File(name) => write!(f, "file({:?})", name),
            Constraint::Version(version) => write!(f, "version({:?})", version.as_str()),
            Constraint::Latest => write!(f, "latest()"),
        }
    }
}
