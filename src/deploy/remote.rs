//! Remote filesystem abstraction
//!
//! The uploader talks to a [`RemoteFs`], which carries the remote working
//! directory as session state. [`CursorGuard`] saves that directory and puts
//! it back when dropped, whatever happened in between.

use std::io::Read;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::core::RemoteError;

/// Result of a single remote operation
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Command/response file-transfer session with a current working directory
pub trait RemoteFs {
    /// Current working directory
    fn pwd(&mut self) -> RemoteResult<String>;

    /// Change the working directory
    fn cwd(&mut self, path: &str) -> RemoteResult<()>;

    /// Create a directory
    fn mkdir(&mut self, path: &str) -> RemoteResult<()>;

    /// Store `reader`'s bytes at `path` in binary mode, returning the byte count
    fn put(&mut self, path: &str, reader: &mut dyn Read) -> RemoteResult<u64>;

    /// Delete a file
    fn remove(&mut self, path: &str) -> RemoteResult<()>;

    /// End the session
    fn close(&mut self) -> RemoteResult<()>;
}

impl<R: RemoteFs + ?Sized> RemoteFs for &mut R {
    fn pwd(&mut self) -> RemoteResult<String> {
        (**self).pwd()
    }

    fn cwd(&mut self, path: &str) -> RemoteResult<()> {
        (**self).cwd(path)
    }

    fn mkdir(&mut self, path: &str) -> RemoteResult<()> {
        (**self).mkdir(path)
    }

    fn put(&mut self, path: &str, reader: &mut dyn Read) -> RemoteResult<u64> {
        (**self).put(path, reader)
    }

    fn remove(&mut self, path: &str) -> RemoteResult<()> {
        (**self).remove(path)
    }

    fn close(&mut self) -> RemoteResult<()> {
        (**self).close()
    }
}

/// Restores the remote working directory on drop
pub struct CursorGuard<'a, R: RemoteFs + ?Sized> {
    remote: &'a mut R,
    saved: String,
}

impl<'a, R: RemoteFs + ?Sized> CursorGuard<'a, R> {
    /// Remember the current directory of `remote`
    pub fn save(remote: &'a mut R) -> RemoteResult<Self> {
        let saved = remote.pwd()?;
        Ok(Self { remote, saved })
    }

    /// Directory that will be restored
    pub fn saved(&self) -> &str {
        &self.saved
    }
}

impl<R: RemoteFs + ?Sized> Deref for CursorGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.remote
    }
}

impl<R: RemoteFs + ?Sized> DerefMut for CursorGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.remote
    }
}

impl<R: RemoteFs + ?Sized> Drop for CursorGuard<'_, R> {
    fn drop(&mut self) {
        // Only an already-failed creation can leave us somewhere odd
        if let Err(e) = self.remote.cwd(&self.saved) {
            debug!("Could not restore remote directory {}: {}", self.saved, e);
        }
    }
}

/// Make sure every segment of `path` exists remotely
///
/// Each segment is entered, and created first if the server refuses the
/// change of directory with a permanent reply. The working directory is the
/// same afterwards as before, on success and on error. Returns how many
/// directories were created.
pub fn ensure_remote_dir<R: RemoteFs + ?Sized>(remote: &mut R, path: &str) -> RemoteResult<usize> {
    let mut guard = CursorGuard::save(remote)?;
    let mut created = 0;

    if path.starts_with('/') {
        guard.cwd("/")?;
    }

    for segment in path_segments(path) {
        match guard.cwd(segment) {
            Ok(()) => {}
            Err(e) if e.is_permanent() => {
                debug!("Creating remote directory {}", segment);
                guard.mkdir(segment)?;
                guard.cwd(segment)?;
                created += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(created)
}

/// Non-empty components of a `/` separated path
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Join two remote paths with a single `/`
pub fn join_remote(base: &str, rel: &str) -> String {
    match (base.trim_end_matches('/'), rel.trim_start_matches('/')) {
        ("", rel) if base.starts_with('/') => format!("/{}", rel),
        ("", rel) => rel.to_string(),
        (base, "") => base.to_string(),
        (base, rel) => format!("{}/{}", base, rel),
    }
}
