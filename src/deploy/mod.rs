//! Deploy module - mirrors the site build onto an FTP server
//!
//! Contains the credentials loader, the remote filesystem abstraction with
//! its FTP and in-memory backends, the uploader, and the orchestration that
//! ties them together.

pub mod credentials;
pub mod ftp;
pub mod memory;
pub mod remote;
pub mod session;
pub mod uploader;

pub use credentials::{load_credentials, Credentials};
pub use ftp::FtpSession;
pub use memory::MemoryRemote;
pub use remote::{ensure_remote_dir, CursorGuard, RemoteFs};
pub use session::{dry_run, run, run_with};
pub use uploader::{collect_files, LocalTree, Uploader};
