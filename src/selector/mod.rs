//! Selector module
//!
//! Queries against a bucket are written as a chain of constraints:
//!
//! ```text
//!   bucket.select() ─┬─ .version(v) / .latest()   pick a version
//!                    ├─ .dir(path)                 descend (repeatable)
//!                    └─ .file(name)                name a file (once, last location)
//!
//!   terminal:  .list()      children of a directory
//!              .blob_ref()  stored reference of a file
//!              .versions()  history of a file or directory
//! ```
//!
//! A terminal operation validates the chain (`validate`), resolves it to a
//! path, kind and version under the bucket's read lock (`resolve`), and then
//! reads the histories.

mod constraint;
mod error;
mod resolve;
mod selector;
mod validate;

pub use constraint::{Constraint, ConstraintKind, ConstraintType};
pub use error::{SelectorError, SelectorResult};
pub use resolve::{resolve, Resolution, VersionSpec};
pub use selector::Selector;
pub use validate::{validate, ValidationFlags};
