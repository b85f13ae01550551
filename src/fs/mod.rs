//! Host-neutral filesystem adapter.
//!
//! Shaped after the teacher's `vfs::Vfs` trait (one async trait, a single
//! concrete implementation wrapping `tokio::fs`, `io::Error` mapped at the
//! boundary) but cut down to the five operations the protocol engine
//! actually needs: stat, mkdir, unlink, recursive rmdir, and directory
//! enumeration.

mod local;

pub use local::LocalFilesystem;

use std::io;
use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

#[derive(Debug, Clone)]
pub struct Stat {
    pub kind: EntryKind,
    pub size: u64,
    pub mtime: SystemTime,
}

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub mtime: SystemTime,
}

#[async_trait]
pub trait Filesystem: Send + Sync {
    /// `None` if `path` does not exist.
    async fn stat(&self, path: &Path) -> io::Result<Option<Stat>>;

    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    async fn unlink_file(&self, path: &Path) -> io::Result<()>;

    /// Recursively removes `path`. Entries whose name starts with `.` are
    /// skipped. When `delete_files` is true, files are unlinked before the
    /// containing directory is removed; when false, files are left in
    /// place (which will make the final `rmdir` of a non-empty directory
    /// fail — see `crate::session`'s RMD handler, which always passes
    /// `true`).
    async fn rmdir_recursive(&self, path: &Path, delete_files: bool) -> io::Result<()>;

    /// Lists the non-dot entries of `path`, sorted by name.
    async fn enumerate(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}
