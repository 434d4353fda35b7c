//! Terminal placement of processed files.
//!
//! Every file ends in exactly one of three areas. Destination names are picked
//! and claimed under one lock, so concurrent units never race for the same
//! name, and an existing file is never overwritten.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::error;

use crate::error::FailureKind;

/// Sub-directory of the error area that receives validation failures.
pub const VALIDATION_ERRORS_DIR: &str = "ValidationErrors";

/// Upper bound on `<stem>_<n>` suffixes tried before giving up.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Destination area of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlacementArea {
    Processed,
    ValidationErrors,
    Errors,
}

impl PlacementArea {
    /// Area for a pipeline result: success, validation failure, anything else.
    pub fn for_result(failure: Option<FailureKind>) -> Self {
        match failure {
            None => PlacementArea::Processed,
            Some(FailureKind::Validation) => PlacementArea::ValidationErrors,
            Some(_) => PlacementArea::Errors,
        }
    }
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("no free destination name for {name} in {dir}")]
    Collision { dir: PathBuf, name: String },

    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to prepare {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Moves files into the processed / error areas.
#[derive(Debug)]
pub struct OutcomePlacement {
    processed: PathBuf,
    errors: PathBuf,
    validation_errors: PathBuf,
    claim: Mutex<()>,
}

impl OutcomePlacement {
    pub fn new(processed: impl Into<PathBuf>, errors: impl Into<PathBuf>) -> Self {
        let errors = errors.into();
        Self {
            processed: processed.into(),
            validation_errors: errors.join(VALIDATION_ERRORS_DIR),
            errors,
            claim: Mutex::new(()),
        }
    }

    pub fn directory(&self, area: PlacementArea) -> &Path {
        match area {
            PlacementArea::Processed => &self.processed,
            PlacementArea::ValidationErrors => &self.validation_errors,
            PlacementArea::Errors => &self.errors,
        }
    }

    /// Create all destination directories.
    pub async fn ensure_directories(&self) -> Result<(), PlacementError> {
        for dir in [&self.processed, &self.errors, &self.validation_errors] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| PlacementError::Directory {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Move `file` into `area`, keeping its name unless that name is taken.
    ///
    /// Returns the final location.
    pub async fn place(&self, file: &Path, area: PlacementArea) -> Result<PathBuf, PlacementError> {
        let name = file
            .file_name()
            .ok_or_else(|| PlacementError::NoFileName(file.to_path_buf()))?;
        let dir = self.directory(area);

        let _claim = self.claim.lock().await;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| PlacementError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;

        let target = free_destination(dir, Path::new(name)).await?;
        move_file(file, &target).await?;
        Ok(target)
    }
}

async fn exists(path: &Path) -> Result<bool, PlacementError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|source| PlacementError::Directory {
            path: path.to_path_buf(),
            source,
        })
}

/// `dir/name`, or `dir/<stem>_<n>.<ext>` for the smallest free `n`.
async fn free_destination(dir: &Path, name: &Path) -> Result<PathBuf, PlacementError> {
    let candidate = dir.join(name);
    if !exists(&candidate).await? {
        return Ok(candidate);
    }

    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = name.extension().map(|e| e.to_string_lossy().into_owned());

    for n in 1..=MAX_COLLISION_SUFFIX {
        let file_name = match &extension {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        };
        let candidate = dir.join(file_name);
        if !exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    Err(PlacementError::Collision {
        dir: dir.to_path_buf(),
        name: name.to_string_lossy().into_owned(),
    })
}

/// Rename, falling back to copy + remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> Result<(), PlacementError> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to).await,
        Err(source) => Err(PlacementError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }),
    }
}

/// Copy `from` to `to`, then remove `from`. If the source cannot be removed
/// the copy is deleted again so that exactly one copy remains.
async fn copy_then_remove(from: &Path, to: &Path) -> Result<(), PlacementError> {
    let move_error = |source| PlacementError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    tokio::fs::copy(from, to).await.map_err(move_error)?;
    if let Err(e) = tokio::fs::remove_file(from).await {
        if let Err(undo) = tokio::fs::remove_file(to).await {
            error!(
                from = %from.display(),
                to = %to.display(),
                error = %undo,
                "failed to remove copy after source could not be removed; file now exists twice"
            );
        }
        return Err(move_error(e));
    }
    Ok(())
}
