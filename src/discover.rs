//! Job discovery.
//!
//! A job is any executable regular file inside the job directory. Entries
//! are visited in lexical order of their file names so the run order is
//! reproducible across filesystems. Hidden entries are ignored, matching a
//! shell glob over the directory.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, Metadata};
use thiserror::Error;
use tracing::{debug, warn};

use crate::job::Job;

/// Whether discovery descends into subdirectories.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DiscoveryMode {
    /// Only entries directly inside the job directory are considered.
    #[default]
    Flat,
    /// Subdirectories are searched depth-first, each in lexical order.
    Recursive,
}

impl DiscoveryMode {
    /// Maps a `recursive` toggle onto a discovery mode.
    #[must_use]
    pub const fn from_recursive(recursive: bool) -> Self {
        if recursive {
            Self::Recursive
        } else {
            Self::Flat
        }
    }
}

/// Errors raised when the job directory cannot be listed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DiscoveryError {
    /// Raised when the job directory does not exist.
    #[error("job directory missing: {path}")]
    Missing {
        /// Directory that was expected to hold jobs.
        path: Utf8PathBuf,
    },
    /// Raised when the job path exists but is not a directory.
    #[error("job path is not a directory: {path}")]
    NotADirectory {
        /// Path that was expected to be a directory.
        path: Utf8PathBuf,
    },
    /// Raised when the directory or one of its subdirectories cannot be read.
    #[error("failed to read job directory {path}: {message}")]
    Unreadable {
        /// Directory that could not be read.
        path: Utf8PathBuf,
        /// Operating system error string.
        message: String,
    },
}

/// Lists the executable jobs under `root` in discovery order.
///
/// An empty directory yields an empty list.
///
/// # Errors
///
/// Returns [`DiscoveryError`] when `root` is absent, is not a directory, or
/// cannot be read.
pub fn discover(root: &Utf8Path, mode: DiscoveryMode) -> Result<Vec<Job>, DiscoveryError> {
    let dir = open_root(root)?;
    let mut jobs = Vec::new();
    collect(&dir, root, mode, &mut jobs)?;
    debug!(root = %root, count = jobs.len(), ?mode, "discovered jobs");
    Ok(jobs)
}

fn open_root(root: &Utf8Path) -> Result<Dir, DiscoveryError> {
    Dir::open_ambient_dir(root, ambient_authority()).map_err(|err| map_open_error(root, &err))
}

fn collect(
    dir: &Dir,
    prefix: &Utf8Path,
    mode: DiscoveryMode,
    jobs: &mut Vec<Job>,
) -> Result<(), DiscoveryError> {
    let unreadable = |err: io::Error| DiscoveryError::Unreadable {
        path: prefix.to_path_buf(),
        message: err.to_string(),
    };

    let mut names = Vec::new();
    for listed in dir.entries().map_err(unreadable)? {
        let entry = listed.map_err(unreadable)?;
        match entry.file_name() {
            Ok(name) if name.starts_with('.') => {}
            Ok(name) => names.push(name),
            Err(err) => {
                warn!(directory = %prefix, error = %err, "skipping entry with a non UTF-8 name");
            }
        }
    }
    names.sort_unstable();

    for name in names {
        let path = prefix.join(&name);
        match inspect(dir, &name, &path) {
            Some(Entry::Directory) if mode == DiscoveryMode::Recursive => {
                let child = dir
                    .open_dir(&name)
                    .map_err(|err| DiscoveryError::Unreadable {
                        path: path.clone(),
                        message: err.to_string(),
                    })?;
                collect(&child, &path, mode, jobs)?;
            }
            Some(Entry::LinkedDirectory) if mode == DiscoveryMode::Recursive => {
                debug!(path = %path, "not descending into symlinked directory");
            }
            Some(Entry::Job) => jobs.push(Job::new(path)),
            Some(Entry::Other) => debug!(path = %path, "skipping non-executable entry"),
            Some(Entry::Directory | Entry::LinkedDirectory) | None => {}
        }
    }

    Ok(())
}

/// What a directory entry turned out to be.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Entry {
    Directory,
    LinkedDirectory,
    Job,
    Other,
}

/// Classifies `name` through the open directory handle.
///
/// Symlinks are resolved inside `dir`, so a link that points outside the
/// job directory is skipped with a warning.
fn inspect(dir: &Dir, name: &str, path: &Utf8Path) -> Option<Entry> {
    let resolved = dir.symlink_metadata(name).and_then(|link| {
        if link.is_symlink() {
            dir.metadata(name).map(|target| (true, target))
        } else {
            Ok((false, link))
        }
    });
    let (linked, metadata) = match resolved {
        Ok(found) => found,
        Err(err) => {
            warn!(path = %path, error = %err, "skipping entry that cannot be inspected");
            return None;
        }
    };

    Some(if metadata.is_dir() {
        if linked {
            Entry::LinkedDirectory
        } else {
            Entry::Directory
        }
    } else if metadata.is_file() && is_executable(&metadata) {
        Entry::Job
    } else {
        Entry::Other
    })
}

fn map_open_error(root: &Utf8Path, err: &io::Error) -> DiscoveryError {
    let path = root.to_path_buf();
    match err.kind() {
        io::ErrorKind::NotFound => DiscoveryError::Missing { path },
        io::ErrorKind::NotADirectory => DiscoveryError::NotADirectory { path },
        _ => DiscoveryError::Unreadable {
            path,
            message: err.to_string(),
        },
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use cap_std::fs_utf8::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
const fn is_executable(_metadata: &Metadata) -> bool {
    true
}
