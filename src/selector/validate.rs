//! Constraint chain validation.

use std::ops::BitOr;

use crate::selector::constraint::{Constraint, ConstraintKind, ConstraintType};
use crate::selector::error::{SelectorError, SelectorResult};

/// Operation-specific requirements layered on top of the grammar rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationFlags(u8);

impl ValidationFlags {
    pub const NONE: Self = Self(0);
    /// the operation reads a file and needs a File() constraint
    pub const REQUIRE_FILE: Self = Self(1);
    /// the operation reads a directory and must not see a File() constraint
    pub const REJECT_FILE: Self = Self(2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ValidationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Check a constraint chain against the grammar and `flags`.
pub fn validate(constraints: &[Constraint], flags: ValidationFlags) -> SelectorResult<()> {
    let version_constraints = constraints
        .iter()
        .filter(|c| c.kind() == ConstraintKind::Version)
        .count();
    if version_constraints > 1 {
        return Err(SelectorError::DuplicateVersionConstraint);
    }

    let mut file_seen = false;
    for constraint in constraints {
        match constraint {
            Constraint::File(_) if file_seen => return Err(SelectorError::DuplicateFileConstraint),
            Constraint::File(_) => file_seen = true,
            Constraint::Dir(_) if file_seen => return Err(SelectorError::DirAfterFile),
            _ => {}
        }
    }

    for constraint in constraints {
        if let Some(location) = constraint.location() {
            if location.is_empty() {
                return Err(SelectorError::EmptyLocation(constraint.constraint_type()));
            }
        }
    }

    if flags.contains(ValidationFlags::REQUIRE_FILE) && !file_seen {
        return Err(SelectorError::MissingFileConstraint);
    }
    if flags.contains(ValidationFlags::REJECT_FILE) && file_seen {
        return Err(SelectorError::FileConstraintOnDirectoryOp);
    }

    Ok(())
}

/// whether the chain names a file
pub(crate) fn has_file(constraints: &[Constraint]) -> bool {
    constraints
        .iter()
        .any(|c| c.constraint_type() == ConstraintType::File)
}
