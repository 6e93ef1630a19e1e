//! In-memory remote filesystem
//!
//! Backs `deploy --dry-run` and the tests. Replies mimic an FTP server:
//! missing paths and refused operations come back as 550, injected transfer
//! failures as 451.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Read;

use crate::core::RemoteError;
use crate::deploy::remote::{path_segments, RemoteFs, RemoteResult};

/// One call made against a [`MemoryRemote`], with its path resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    Cwd(String),
    Mkdir(String),
    Put(String),
    Remove(String),
    Close,
}

/// Remote filesystem held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    cwd: String,
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    ops: Vec<RemoteOp>,
    failing_puts: HashSet<String>,
    failing_mkdirs: HashSet<String>,
    closed: bool,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Empty remote positioned at `/`
    pub fn new() -> Self {
        Self {
            cwd: "/".to_string(),
            dirs: BTreeSet::from(["/".to_string()]),
            files: BTreeMap::new(),
            ops: Vec::new(),
            failing_puts: HashSet::new(),
            failing_mkdirs: HashSet::new(),
            closed: false,
        }
    }

    /// Make every store to `path` (absolute) fail
    pub fn fail_put(&mut self, path: impl Into<String>) {
        self.failing_puts.insert(path.into());
    }

    /// Make creating `path` (absolute) fail
    pub fn fail_mkdir(&mut self, path: impl Into<String>) {
        self.failing_mkdirs.insert(path.into());
    }

    /// Whether the absolute directory exists
    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains(path)
    }

    /// Contents of the absolute file, if stored
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Absolute paths of every stored file
    pub fn file_paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Working directory, readable after the session is closed
    pub fn current_dir(&self) -> &str {
        &self.cwd
    }

    /// Every call made so far
    pub fn ops(&self) -> &[RemoteOp] {
        &self.ops
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Resolve `path` against the working directory, folding `.` and `..`
    fn resolve(&self, path: &str) -> String {
        let mut parts: Vec<&str> = if path.starts_with('/') {
            Vec::new()
        } else {
            path_segments(&self.cwd).collect()
        };

        for segment in path_segments(path) {
            if segment == ".." {
                parts.pop();
            } else {
                parts.push(segment);
            }
        }

        format!("/{}", parts.join("/"))
    }

    fn parent_of(path: &str) -> &str {
        match path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &path[..idx],
        }
    }

    fn ensure_open(&self) -> RemoteResult<()> {
        if self.closed {
            return Err(RemoteError::Connection("session closed".to_string()));
        }
        Ok(())
    }
}

impl RemoteFs for MemoryRemote {
    fn pwd(&mut self) -> RemoteResult<String> {
        self.ensure_open()?;
        Ok(self.cwd.clone())
    }

    fn cwd(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_open()?;
        let target = self.resolve(path);
        self.ops.push(RemoteOp::Cwd(target.clone()));

        if !self.dirs.contains(&target) {
            return Err(RemoteError::rejected(
                550,
                format!("{}: No such file or directory", path),
            ));
        }
        self.cwd = target;
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_open()?;
        let target = self.resolve(path);
        self.ops.push(RemoteOp::Mkdir(target.clone()));

        if self.failing_mkdirs.contains(&target) {
            return Err(RemoteError::rejected(550, format!("{}: Permission denied", path)));
        }
        if self.dirs.contains(&target) || self.files.contains_key(&target) {
            return Err(RemoteError::rejected(550, format!("{}: File exists", path)));
        }
        if !self.dirs.contains(Self::parent_of(&target)) {
            return Err(RemoteError::rejected(
                550,
                format!("{}: No such file or directory", path),
            ));
        }

        self.dirs.insert(target);
        Ok(())
    }

    fn put(&mut self, path: &str, reader: &mut dyn Read) -> RemoteResult<u64> {
        self.ensure_open()?;
        let target = self.resolve(path);
        self.ops.push(RemoteOp::Put(target.clone()));

        if !self.dirs.contains(Self::parent_of(&target)) {
            return Err(RemoteError::rejected(
                553,
                format!("{}: No such file or directory", path),
            ));
        }

        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        if self.failing_puts.contains(&target) {
            // Leave what a dropped data connection would: a truncated file
            data.truncate(data.len() / 2);
            self.files.insert(target, data);
            return Err(RemoteError::rejected(451, "Transfer aborted"));
        }

        let len = data.len() as u64;
        self.files.insert(target, data);
        Ok(len)
    }

    fn remove(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_open()?;
        let target = self.resolve(path);
        self.ops.push(RemoteOp::Remove(target.clone()));

        match self.files.remove(&target) {
            Some(_) => Ok(()),
            None => Err(RemoteError::rejected(
                550,
                format!("{}: No such file or directory", path),
            )),
        }
    }

    fn close(&mut self) -> RemoteResult<()> {
        self.ensure_open()?;
        self.ops.push(RemoteOp::Close);
        self.closed = true;
        Ok(())
    }
}
