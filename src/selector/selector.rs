//! The immutable query builder.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::filesystem::{
    Bucket, BucketState, FilesystemError, FsResult, PathKind, StoredBlobRef, Version,
};
use crate::selector::constraint::Constraint;
use crate::selector::error::SelectorError;
use crate::selector::resolve::{resolve, Resolution, VersionSpec};
use crate::selector::validate::{validate, ValidationFlags};

/// One node of the constraint chain, linked to the constraint before it.
#[derive(Debug)]
struct Link {
    constraint: Constraint,
    prev: Option<Arc<Link>>,
}

/// A query against one bucket.
///
/// Every builder method returns a new selector sharing the chain built so
/// far; the receiver is never changed. A common prefix can be reused to fan
/// out several queries:
///
/// ```ignore
/// let photos = bucket.select().dir("photos");
/// let all = photos.list()?;
/// let now = photos.latest().list()?;
/// ```
#[derive(Clone)]
pub struct Selector {
    bucket: Bucket,
    tail: Option<Arc<Link>>,
}

impl Selector {
    pub(crate) fn new(bucket: Bucket) -> Self {
        Self { bucket, tail: None }
    }

    fn push(&self, constraint: Constraint) -> Self {
        Self {
            bucket: self.bucket.clone(),
            tail: Some(Arc::new(Link {
                constraint,
                prev: self.tail.clone(),
            })),
        }
    }

    /// Pin an explicit version.
    pub fn version(&self, version: impl Into<Version>) -> Self {
        self.push(Constraint::Version(version.into()))
    }

    /// Pin the latest version, of the bucket if no location precedes this
    /// constraint, otherwise of the location selected so far.
    pub fn latest(&self) -> Self {
        self.push(Constraint::Latest)
    }

    /// Descend into a directory. `dir` may contain several segments.
    pub fn dir(&self, dir: impl Into<String>) -> Self {
        self.push(Constraint::Dir(dir.into()))
    }

    /// Name a file in the current directory.
    pub fn file(&self, name: impl Into<String>) -> Self {
        self.push(Constraint::File(name.into()))
    }

    /// The constraint chain in the order it was built.
    pub fn constraints(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        let mut link = self.tail.as_deref();
        while let Some(node) = link {
            constraints.push(node.constraint.clone());
            link = node.prev.as_deref();
        }
        constraints.reverse();
        constraints
    }

    fn query<T>(
        &self,
        flags: ValidationFlags,
        op: impl FnOnce(&BucketState, Resolution) -> FsResult<T>,
    ) -> FsResult<T> {
        let constraints = self.constraints();
        validate(&constraints, flags)?;
        self.bucket.with_state(|state| {
            let resolution = resolve(&constraints, state)?;
            debug!(
                bucket = self.bucket.name(),
                path = %resolution.path,
                kind = %resolution.kind,
                version = ?resolution.version.exact(),
                "resolved selector"
            );
            op(state, resolution)
        })
    }

    /// Names of the direct children of the selected directory, sorted.
    ///
    /// Without a version constraint this is the union over every version of
    /// the directory.
    pub fn list(&self) -> FsResult<Vec<String>> {
        self.query(ValidationFlags::REJECT_FILE, |state, resolution| {
            let history = state
                .dir_history(&resolution.path)
                .ok_or_else(|| FilesystemError::DirectoryNotFound(resolution.path.clone()))?;

            let versions = match resolution.version {
                VersionSpec::Exact(version) => {
                    if !history.contains(&version) {
                        return Err(FilesystemError::VersionNotFound {
                            kind: PathKind::Dir,
                            path: resolution.path,
                            version,
                        });
                    }
                    vec![version]
                }
                VersionSpec::Unconstrained => history.versions().to_vec(),
            };

            Ok(state
                .children_at(&resolution.path, &versions)
                .into_iter()
                .collect())
        })
    }

    /// The blob reference stored for the selected file at the selected
    /// version.
    pub fn blob_ref(&self) -> FsResult<StoredBlobRef> {
        self.query(ValidationFlags::REQUIRE_FILE, |state, resolution| {
            let history = state
                .file_history(&resolution.path)
                .ok_or_else(|| FilesystemError::FileNotFound(resolution.path.clone()))?;

            match resolution.version {
                VersionSpec::Exact(version) => {
                    history
                        .at(&version)
                        .cloned()
                        .ok_or(FilesystemError::VersionNotFound {
                            kind: PathKind::File,
                            path: resolution.path,
                            version,
                        })
                }
                VersionSpec::Unconstrained if history.len() > 1 => {
                    Err(FilesystemError::AmbiguousVersion {
                        path: resolution.path,
                        versions: history.len(),
                    })
                }
                VersionSpec::Unconstrained => Err(SelectorError::VersionRequired.into()),
            }
        })
    }

    /// The versions of the selected file or directory, ascending.
    ///
    /// With a version constraint the result holds just that version.
    pub fn versions(&self) -> FsResult<Vec<Version>> {
        self.query(ValidationFlags::NONE, |state, resolution| {
            let mut versions: Vec<Version> = match resolution.kind {
                PathKind::File => state
                    .file_history(&resolution.path)
                    .ok_or_else(|| FilesystemError::FileNotFound(resolution.path.clone()))?
                    .versions()
                    .cloned()
                    .collect(),
                PathKind::Dir => state
                    .dir_history(&resolution.path)
                    .ok_or_else(|| FilesystemError::DirectoryNotFound(resolution.path.clone()))?
                    .versions()
                    .to_vec(),
            };

            if let VersionSpec::Exact(version) = resolution.version {
                if !versions.contains(&version) {
                    return Err(FilesystemError::VersionNotFound {
                        kind: resolution.kind,
                        path: resolution.path,
                        version,
                    });
                }
                return Ok(vec![version]);
            }

            versions.sort();
            Ok(versions)
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "select()")?;
        for constraint in self.constraints() {
            write!(f, ".{}", constraint)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("bucket", &self.bucket.name())
            .field("constraints", &self.constraints())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::{BlobRef, FilesystemService, MemoryFilesystem};

    fn bucket_with_history() -> (MemoryFilesystem, Bucket, Version, Version) {
        let fs = MemoryFilesystem::new();
        let bucket = fs.bucket("b");

        let mut tx = bucket.new_put_transaction();
        tx.dir("photos").file("a.jpg", BlobRef::new("s", "a1"));
        let v1 = tx.commit().unwrap();

        let mut tx = bucket.new_put_transaction();
        tx.dir("photos").file("b.jpg", BlobRef::new("s", "b1"));
        let v2 = tx.commit().unwrap();

        (fs, bucket, v1, v2)
    }

    #[test]
    fn test_builders_do_not_mutate_receiver() {
        let (_fs, bucket, _, _) = bucket_with_history();
        let base = bucket.select().dir("photos");

        let latest = base.latest();
        let file = base.file("a.jpg");

        assert_eq!(base.constraints(), vec![Constraint::Dir("photos".to_string())]);
        assert_eq!(latest.constraints().len(), 2);
        assert_eq!(file.constraints().len(), 2);
        assert_eq!(base.list().unwrap(), vec!["a.jpg", "b.jpg"]);
        assert_eq!(latest.list().unwrap(), vec!["b.jpg"]);
    }

    #[test]
    fn test_display() {
        let (_fs, bucket, _, _) = bucket_with_history();
        let selector = bucket.select().latest().dir("a").file("b");
        assert_eq!(
            selector.to_string(),
            "select().latest().dir(\"a\").file(\"b\")"
        );
    }

    #[test]
    fn test_grammar_errors_surface() {
        let (_fs, bucket, v1, _) = bucket_with_history();

        let err = bucket.select().latest().version(v1).list().unwrap_err();
        assert!(matches!(
            err,
            FilesystemError::Selector(SelectorError::DuplicateVersionConstraint)
        ));

        let err = bucket.select().file("a").dir("b").versions().unwrap_err();
        assert!(matches!(
            err,
            FilesystemError::Selector(SelectorError::DirAfterFile)
        ));

        let err = bucket.select().dir("photos").blob_ref().unwrap_err();
        assert!(matches!(
            err,
            FilesystemError::Selector(SelectorError::MissingFileConstraint)
        ));

        let err = bucket.select().file("a").list().unwrap_err();
        assert!(matches!(
            err,
            FilesystemError::Selector(SelectorError::FileConstraintOnDirectoryOp)
        ));

        let err = bucket.select().dir("").list().unwrap_err();
        assert!(err.is_grammar());
    }

    #[test]
    fn test_list_at_missing_version() {
        let (_fs, bucket, _, _) = bucket_with_history();
        let err = bucket.select().dir("photos").version("1").list().unwrap_err();
        assert!(matches!(
            err,
            FilesystemError::VersionNotFound { kind: PathKind::Dir, .. }
        ));
    }

    #[test]
    fn test_list_missing_directory() {
        let (_fs, bucket, _, _) = bucket_with_history();
        let err = bucket.select().dir("videos").list().unwrap_err();
        assert!(matches!(err, FilesystemError::DirectoryNotFound(p) if p == "videos"));
    }

    #[test]
    fn test_blob_ref_at_version() {
        let (_fs, bucket, v1, v2) = bucket_with_history();
        let a = bucket.select().dir("photos").file("a.jpg");

        let stored = a.version(v1.clone()).blob_ref().unwrap();
        assert_eq!(stored.version, v1);
        assert_eq!(stored.blob_ref, BlobRef::new("s", "a1"));

        let err = a.version(v2).blob_ref().unwrap_err();
        assert!(matches!(
            err,
            FilesystemError::VersionNotFound { kind: PathKind::File, .. }
        ));

        let err = bucket.select().file("missing").latest().blob_ref().unwrap_err();
        assert!(matches!(err, FilesystemError::FileNotFound(_)));
    }

    #[test]
    fn test_unconstrained_blob_ref_with_one_version() {
        let (_fs, bucket, _, _) = bucket_with_history();
        let err = bucket
            .select()
            .dir("photos")
            .file("a.jpg")
            .blob_ref()
            .unwrap_err();
        assert!(matches!(
            err,
            FilesystemError::Selector(SelectorError::VersionRequired)
        ));
    }

    #[test]
    fn test_versions() {
        let (_fs, bucket, v1, v2) = bucket_with_history();

        let photos = bucket.select().dir("photos");
        assert_eq!(photos.versions().unwrap(), vec![v1.clone(), v2.clone()]);
        assert_eq!(photos.latest().versions().unwrap(), vec![v2.clone()]);
        assert_eq!(photos.version(v1.clone()).versions().unwrap(), vec![v1.clone()]);

        let a = photos.file("a.jpg");
        assert_eq!(a.versions().unwrap(), vec![v1]);
        assert!(matches!(
            a.version(v2).versions().unwrap_err(),
            FilesystemError::VersionNotFound { kind: PathKind::File, .. }
        ));

        assert!(bucket
            .select()
            .dir("nothing")
            .versions()
            .unwrap_err()
            .is_not_found());
    }
}
