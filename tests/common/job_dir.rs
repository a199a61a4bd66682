//! Temporary project roots with a job directory for integration tests.
//!
//! Integration tests are compiled as separate crates, so this file is pulled
//! in with `#[path = "common/job_dir.rs"]` rather than shared as a module.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Name of the job directory inside the project root; matches the default.
pub const JOBS_DIR: &str = "tests";

/// A temporary project root containing a `tests/` job directory.
#[derive(Debug)]
pub struct Project {
    root: Utf8PathBuf,
    _tmp: TempDir,
}

impl Project {
    /// Creates a project with an empty job directory.
    pub fn new() -> Self {
        let project = Self::without_jobs_dir();
        fs::create_dir_all(project.jobs_dir())
            .unwrap_or_else(|err| panic!("create job directory: {err}"));
        project
    }

    /// Creates a project whose job directory does not exist.
    pub fn without_jobs_dir() -> Self {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("create project root: {err}"));
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|path| panic!("non-UTF-8 temp path: {}", path.display()));
        Self { root, _tmp: tmp }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn jobs_dir(&self) -> Utf8PathBuf {
        self.root.join(JOBS_DIR)
    }

    /// Adds a job that exits with `code`.
    pub fn add_job(&self, name: &str, code: i32) {
        self.add_script(name, &format!("#!/bin/sh\nexit {code}\n"));
    }

    /// Adds a job that appends its name to `ran.log` in the project root
    /// before exiting with `code`.
    pub fn add_logging_job(&self, name: &str, code: i32) {
        self.add_script(name, &format!("#!/bin/sh\necho {name} >> ran.log\nexit {code}\n"));
    }

    /// Adds an executable script with the given body.
    pub fn add_script(&self, name: &str, body: &str) {
        let path = self.jobs_dir().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|err| panic!("create parent directories for {path}: {err}"));
        }
        fs::write(&path, body).unwrap_or_else(|err| panic!("write {path}: {err}"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .unwrap_or_else(|err| panic!("chmod {path}: {err}"));
        }
    }

    /// Names recorded by logging jobs, in execution order.
    pub fn ran(&self) -> Vec<String> {
        fs::read_to_string(self.root.join("ran.log"))
            .map(|log| log.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}
