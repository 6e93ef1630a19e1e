//! Directory uploader
//!
//! Mirrors a local directory tree onto a [`RemoteFs`], one file at a time.
//! A file that fails is logged and counted; the rest still go up.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::core::{DeployError, FailedUpload, RemoteError, Result, UploadOutcome};
use crate::deploy::remote::{ensure_remote_dir, RemoteFs};

/// Local files found under a build directory
#[derive(Debug, Default)]
pub struct LocalTree {
    /// Regular files, relative to the root, in lexicographic order
    pub files: Vec<PathBuf>,
    /// Entries the walk could not read (symlink loops, dangling links,
    /// unreadable directories)
    pub unreadable: Vec<FailedUpload>,
}

/// Every regular file under `root`, relative to it
///
/// Only an unreadable `root` is an error; bad entries below it are collected
/// in [`LocalTree::unreadable`] and the walk carries on.
pub fn collect_files(root: &Path) -> Result<LocalTree> {
    let mut tree = LocalTree::default();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(remote_path)
                    .unwrap_or_default();
                warn!("Skipping {}: {}", path, e);
                tree.unreadable.push(FailedUpload {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| DeployError::Io(std::io::Error::other(e)))?;
        tree.files.push(rel.to_path_buf());
    }

    tree.files.sort();
    Ok(tree)
}

/// `/` separated form of a relative path
pub fn remote_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Uploads a local tree into one remote directory
pub struct Uploader<'a, R: RemoteFs + ?Sized> {
    remote: &'a mut R,
    remote_root: String,
    /// Remote directories known to exist, relative to `remote_root`
    ensured: HashSet<String>,
    cleanup_partial: bool,
}

impl<'a, R: RemoteFs + ?Sized> Uploader<'a, R> {
    /// Create an uploader targeting `remote_root`
    pub fn new(remote: &'a mut R, remote_root: impl Into<String>) -> Self {
        Self {
            remote,
            remote_root: remote_root.into(),
            ensured: HashSet::new(),
            cleanup_partial: true,
        }
    }

    /// Whether to delete the remote file after a failed transfer
    pub fn cleanup_partial(mut self, enabled: bool) -> Self {
        self.cleanup_partial = enabled;
        self
    }

    /// Upload every file under `local_root`
    ///
    /// Fails only if the remote target directory cannot be entered or the
    /// local root cannot be read. Per-file failures, including local entries
    /// the walk could not read, end up in the outcome.
    pub fn upload_tree(&mut self, local_root: &Path) -> Result<UploadOutcome> {
        let tree = collect_files(local_root)?;
        info!(
            "Uploading {} files from {} to {}",
            tree.files.len(),
            local_root.display(),
            self.remote_root
        );

        self.enter_root()?;

        let mut outcome = UploadOutcome {
            failures: tree.unreadable,
            ..UploadOutcome::default()
        };
        for rel in &tree.files {
            let target = remote_path(rel);
            match self.upload_file(&local_root.join(rel), &target) {
                Ok(bytes) => {
                    info!("Uploaded {} ({} bytes)", target, bytes);
                    outcome.record_success(bytes);
                }
                Err(e) => {
                    warn!("Failed to upload {}: {}", target, e);
                    outcome.record_failure(target, e.to_string());
                }
            }
        }

        info!("{}", outcome);
        Ok(outcome)
    }

    fn enter_root(&mut self) -> Result<()> {
        if self.remote_root.is_empty() {
            return Ok(());
        }
        ensure_remote_dir(self.remote, &self.remote_root)?;
        self.remote.cwd(&self.remote_root)?;
        Ok(())
    }

    fn upload_file(&mut self, local: &Path, target: &str) -> Result<u64> {
        if let Some((parent, _)) = target.rsplit_once('/') {
            if !self.ensured.contains(parent) {
                ensure_remote_dir(self.remote, parent)?;
                self.ensured.insert(parent.to_string());
            }
        }

        let mut reader = BufReader::new(File::open(local)?);
        match self.remote.put(target, &mut reader) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.discard_partial(target, &e);
                Err(e.into())
            }
        }
    }

    fn discard_partial(&mut self, target: &str, cause: &RemoteError) {
        if !self.cleanup_partial || !matches!(cause, RemoteError::Rejected { .. }) {
            return;
        }
        // Nothing to do when the server never created the file
        let _ = self.remote.remove(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::memory::{MemoryRemote, RemoteOp};
    use std::fs;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_collect_files_sorted_and_relative() {
        let dir = site(&[
            ("index.html", "<html>"),
            ("assets/app.js", "js"),
            ("about/index.html", "about"),
        ]);
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let tree = collect_files(dir.path()).unwrap();
        assert!(tree.unreadable.is_empty());
        assert_eq!(
            tree.files,
            vec![
                PathBuf::from("about/index.html"),
                PathBuf::from("assets/app.js"),
                PathBuf::from("index.html"),
            ]
        );
    }

    #[test]
    fn test_remote_path_uses_forward_slashes() {
        let rel: PathBuf = ["assets", "img", "logo.png"].iter().collect();
        assert_eq!(remote_path(&rel), "assets/img/logo.png");
    }

    #[test]
    fn test_directory_created_before_store() {
        let dir = site(&[("assets/app.js", "js")]);
        let mut remote = MemoryRemote::new();

        Uploader::new(&mut remote, "/www")
            .upload_tree(dir.path())
            .unwrap();

        let ops = remote.ops();
        let mkdir = ops
            .iter()
            .position(|op| *op == RemoteOp::Mkdir("/www/assets".into()))
            .unwrap();
        let put = ops
            .iter()
            .position(|op| *op == RemoteOp::Put("/www/assets/app.js".into()))
            .unwrap();
        assert!(mkdir < put);
    }

    #[test]
    fn test_failed_store_is_cleaned_up() {
        let dir = site(&[("a.txt", "aaaa"), ("b.txt", "bbbb")]);
        let mut remote = MemoryRemote::new();
        remote.fail_put("/a.txt");

        let outcome = Uploader::new(&mut remote, "/")
            .upload_tree(dir.path())
            .unwrap();

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed(), 1);
        assert!(remote.file("/a.txt").is_none());
        assert_eq!(remote.file("/b.txt"), Some(&b"bbbb"[..]));
    }

    #[test]
    fn test_partial_file_kept_when_cleanup_disabled() {
        let dir = site(&[("a.txt", "aaaa")]);
        let mut remote = MemoryRemote::new();
        remote.fail_put("/a.txt");

        Uploader::new(&mut remote, "/")
            .cleanup_partial(false)
            .upload_tree(dir.path())
            .unwrap();

        assert_eq!(remote.file("/a.txt"), Some(&b"aa"[..]));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_does_not_stop_the_run() {
        let dir = site(&[("index.html", "<html>")]);
        std::os::unix::fs::symlink(".", dir.path().join("loop")).unwrap();
        let mut remote = MemoryRemote::new();

        let outcome = Uploader::new(&mut remote, "/www")
            .upload_tree(dir.path())
            .unwrap();

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.failures[0].path, "loop");
        assert_eq!(remote.file("/www/index.html"), Some(&b"<html>"[..]));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_is_reported() {
        let dir = site(&[("index.html", "x")]);
        std::os::unix::fs::symlink("gone.js", dir.path().join("app.js")).unwrap();

        let tree = collect_files(dir.path()).unwrap();
        assert_eq!(tree.files, vec![PathBuf::from("index.html")]);
        assert_eq!(tree.unreadable.len(), 1);
        assert_eq!(tree.unreadable[0].path, "app.js");
    }

    #[test]
    fn test_unreachable_root_is_fatal() {
        let dir = site(&[("index.html", "x")]);
        let mut remote = MemoryRemote::new();
        remote.fail_mkdir("/www");

        let err = Uploader::new(&mut remote, "/www")
            .upload_tree(dir.path())
            .unwrap_err();
        assert!(matches!(err, DeployError::Remote(_)));
    }
}
