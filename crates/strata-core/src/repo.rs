//! Repository — the main entry point for strata operations.
//!
//! A Repository is a handle rooted at a working directory. Persisted
//! state lives under `.strata/`: one directory per version holding a
//! full copy of every tracked file, a `current` pointer file, and the
//! append-only history ledger.
//!
//! Files are tracked by base filename only, exactly as recorded in the
//! snapshot tree. Two files from different directories with the same
//! base name therefore collide; this is a known limitation of the
//! flat tracking namespace.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{StrataError, StrataResult};
use crate::fsutil::{self, atomic_write};
use crate::history::{HistoryLog, LogEntry};

/// The `.strata` control directory name.
pub const STRATA_DIR: &str = ".strata";

const VERSIONS_DIR: &str = "versions";
const CURRENT_FILE: &str = "current";
const HISTORY_FILE: &str = "history.log";

/// Message recorded for version 0.
const INIT_MESSAGE: &str = "Repository initialized.";

/// A strata repository.
pub struct Repository {
    /// Root of the working directory (where `.strata/` lives).
    root: PathBuf,
    /// Path to the `.strata/` directory.
    strata_dir: PathBuf,
    /// Append-only version/message ledger.
    history: HistoryLog,
}

/// Outcome of a checkout, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResult {
    /// The version the working directory now reflects.
    pub version: u64,
    /// Number of files copied out of the target snapshot.
    pub files_restored: usize,
}

impl Repository {
    /// Initialize a new strata repository in the given directory.
    ///
    /// Creates version 0 (an empty snapshot), points `current` at it,
    /// and records the initialization entry in the ledger.
    pub fn init(root: &Path) -> StrataResult<Self> {
        let strata_dir = root.join(STRATA_DIR);

        if strata_dir.exists() {
            return Err(StrataError::AlreadyInitialized);
        }

        fs::create_dir_all(strata_dir.join(VERSIONS_DIR).join("0"))?;
        atomic_write(&strata_dir.join(CURRENT_FILE), b"0")?;

        let repo = Self::open(root)?;
        repo.history.record(0, INIT_MESSAGE)?;
        Ok(repo)
    }

    /// Open an existing strata repository.
    pub fn open(root: &Path) -> StrataResult<Self> {
        let strata_dir = root.join(STRATA_DIR);

        if !strata_dir.exists() {
            return Err(StrataError::NotInitialized);
        }

        let history = HistoryLog::new(&strata_dir.join(HISTORY_FILE));

        Ok(Self {
            root: root.to_path_buf(),
            strata_dir,
            history,
        })
    }

    /// The version the working directory currently reflects.
    pub fn current_version(&self) -> StrataResult<u64> {
        let raw = fs::read_to_string(self.strata_dir.join(CURRENT_FILE))?;
        raw.trim()
            .parse()
            .map_err(|_| StrataError::Corrupt(format!("current pointer is not a version: {raw:?}")))
    }

    /// Start tracking a file.
    ///
    /// Derives the next version as a full copy of the current snapshot
    /// plus the file's contents. Returns the new version number.
    pub fn add_file(&self, path: &Path, message: Option<&str>) -> StrataResult<u64> {
        let name = source_filename(path)?;
        let current_dir = self.version_dir(self.current_version()?);
        if current_dir.join(&name).exists() {
            return Err(StrataError::AlreadyTracked(name));
        }

        let default = format!("Added file: {name}");
        let message = effective_message(message, &default);

        let (next, next_dir) = self.derive_version()?;
        fs::copy(path, next_dir.join(&name))?;
        self.finish_version(next, &message)?;
        Ok(next)
    }

    /// Stop tracking a file.
    ///
    /// The working directory copy (if any) is left alone; only the new
    /// snapshot omits it.
    pub fn detach_file(&self, path: &Path, message: Option<&str>) -> StrataResult<u64> {
        let name = filename_of(path)
            .ok_or_else(|| StrataError::NotTracked(path.display().to_string()))?;
        let current_dir = self.version_dir(self.current_version()?);
        if !current_dir.join(&name).exists() {
            return Err(StrataError::NotTracked(name));
        }

        let default = format!("Detached file: {name}");
        let message = effective_message(message, &default);

        let (next, next_dir) = self.derive_version()?;
        fs::remove_file(next_dir.join(&name))?;
        self.finish_version(next, &message)?;
        Ok(next)
    }

    /// Record a tracked file's current contents in a new version.
    ///
    /// The live file is only read, never modified.
    pub fn commit_file(&self, path: &Path, message: Option<&str>) -> StrataResult<u64> {
        let name = source_filename(path)?;
        let current_dir = self.version_dir(self.current_version()?);
        if !current_dir.join(&name).exists() {
            return Err(StrataError::NotTracked(name));
        }

        let default = format!("Committed file: {name}");
        let message = effective_message(message, &default);

        let (next, next_dir) = self.derive_version()?;
        fs::copy(path, next_dir.join(&name))?;
        self.finish_version(next, &message)?;
        Ok(next)
    }

    /// Restore the working directory to a stored version.
    ///
    /// First removes the current snapshot's own top-level entries from
    /// the working directory (never the control directory, never
    /// unrelated working-directory content), then copies the target
    /// snapshot's tree out, then rewrites the `current` pointer.
    /// Checking out the already-current version is idempotent.
    pub fn checkout(&self, version: &str) -> StrataResult<CheckoutResult> {
        let target = self.resolve_version(version)?;
        let current_dir = self.version_dir(self.current_version()?);

        for entry in fs::read_dir(&current_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if name == STRATA_DIR {
                continue;
            }
            let working_path = self.root.join(&name);
            if working_path.is_dir() {
                fs::remove_dir_all(&working_path)?;
            } else if working_path.exists() {
                fs::remove_file(&working_path)?;
            }
        }

        let target_dir = self.version_dir(target);
        let mut files_restored = 0;
        for entry in fsutil::walk_tree(&target_dir)? {
            if entry.rel_path.starts_with(STRATA_DIR) {
                continue;
            }
            let dst = self.root.join(&entry.rel_path);
            if entry.is_dir {
                fs::create_dir_all(&dst)?;
            } else {
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(target_dir.join(&entry.rel_path), &dst)?;
                files_restored += 1;
            }
        }

        atomic_write(
            &self.strata_dir.join(CURRENT_FILE),
            target.to_string().as_bytes(),
        )?;

        Ok(CheckoutResult {
            version: target,
            files_restored,
        })
    }

    /// Look up a version's recorded message. `None` means the current
    /// version.
    pub fn version_info(&self, version: Option<&str>) -> StrataResult<LogEntry> {
        let version = match version {
            Some(raw) => self.resolve_version(raw)?,
            None => self.current_version()?,
        };
        self.history.entry_for(version)
    }

    /// The most recent history entries, newest first. `None` returns
    /// all of them.
    pub fn history(&self, limit: Option<usize>) -> StrataResult<Vec<LogEntry>> {
        self.history.recent(limit)
    }

    /// Parse and validate a version argument against stored snapshots.
    fn resolve_version(&self, raw: &str) -> StrataResult<u64> {
        let invalid = || StrataError::InvalidVersion(raw.to_string());
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let version: u64 = raw.parse().map_err(|_| invalid())?;
        if !self.version_dir(version).is_dir() {
            return Err(invalid());
        }
        Ok(version)
    }

    fn version_dir(&self, version: u64) -> PathBuf {
        self.strata_dir.join(VERSIONS_DIR).join(version.to_string())
    }

    /// Copy the current snapshot into the next version directory.
    ///
    /// The `current` pointer and the ledger are untouched until
    /// [`finish_version`](Self::finish_version) runs, after the
    /// caller's one-file mutation — a crash mid-copy never leaves the
    /// pointer on an incomplete snapshot.
    fn derive_version(&self) -> StrataResult<(u64, PathBuf)> {
        let current = self.current_version()?;
        let next = current + 1;
        let next_dir = self.version_dir(next);
        fs::create_dir_all(&next_dir)?;
        fsutil::copy_tree(&self.version_dir(current), &next_dir)?;
        Ok((next, next_dir))
    }

    /// Advance the pointer and record the ledger entry for a fully
    /// written snapshot.
    fn finish_version(&self, version: u64, message: &str) -> StrataResult<()> {
        atomic_write(
            &self.strata_dir.join(CURRENT_FILE),
            version.to_string().as_bytes(),
        )?;
        self.history.record(version, message)
    }
}

/// The base filename a path is tracked under.
fn filename_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

/// Validate a file that must exist on disk (add/commit source).
fn source_filename(path: &Path) -> StrataResult<String> {
    let name = filename_of(path)
        .ok_or_else(|| StrataError::FileNotFound(path.display().to_string()))?;
    if !path.is_file() {
        return Err(StrataError::FileNotFound(name));
    }
    Ok(name)
}

/// User message (trimmed) if supplied, else the generated default.
fn effective_message(message: Option<&str>, default: &str) -> String {
    match message {
        Some(m) => m.trim().to_string(),
        None => default.to_string(),
    }
}
