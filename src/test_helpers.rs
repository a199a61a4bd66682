//! Shared unit-test utilities for job directories and environment mutation.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets environment variables while holding a global mutex.
    pub fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::set_var(key, value) };
        }
        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in self.previous.iter().rev() {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Writes `contents` to `path` and marks it executable.
pub fn write_executable(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|err| panic!("create parent directories for {path}: {err}"));
    }
    fs::write(path, contents).unwrap_or_else(|err| panic!("write {path}: {err}"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .unwrap_or_else(|err| panic!("chmod {path}: {err}"));
    }
}

/// Temporary directory populated with job scripts.
pub struct JobDir {
    path: Utf8PathBuf,
    _tmp: TempDir,
}

impl JobDir {
    /// Creates an empty job directory.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("create job directory: {err}"));
        let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|path| panic!("non-UTF-8 temp path: {}", path.display()));
        Self { path, _tmp: tmp }
    }

    /// Root of the job directory.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Adds a shell job that exits with `code`.
    pub fn add_job(&self, name: &str, code: i32) -> Utf8PathBuf {
        let path = self.path.join(name);
        write_executable(&path, &format!("#!/bin/sh\nexit {code}\n"));
        path
    }

    /// Adds a non-executable file.
    pub fn add_file(&self, name: &str, contents: &str) {
        let path = self.path.join(name);
        fs::write(&path, contents).unwrap_or_else(|err| panic!("write {path}: {err}"));
    }
}
