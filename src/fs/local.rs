use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{DirEntry, EntryKind, Filesystem, Stat};

/// Wraps `tokio::fs` calls rooted at an arbitrary host path. Unlike the
/// teacher's `ShadowFS`, there is no handle/fileid indirection — FTP
/// commands always carry a full path, never a cached handle, so every
/// operation here takes the host-absolute `Path` the caller already
/// resolved via `nav`.
#[derive(Debug, Clone)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        LocalFilesystem
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_kind(file_type: std::fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

fn is_dotfile(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn stat(&self, path: &Path) -> io::Result<Option<Stat>> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(Some(Stat {
                kind: entry_kind(meta.file_type()),
                size: meta.len(),
                mtime: meta.modified().unwrap_or(std::time::UNIX_EPOCH),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).await?;
        set_world_writable(path).await
    }

    async fn unlink_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

    async fn rmdir_recursive(&self, path: &Path, delete_files: bool) -> io::Result<()> {
        remove_recursive(path, delete_files).await?;
        fs::remove_dir(path).await
    }

    async fn enumerate(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut reader = fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name();
            if is_dotfile(&name) {
                continue;
            }
            let meta = entry.metadata().await?;
            entries.push(DirEntry {
                name: name.to_string_lossy().into_owned(),
                kind: entry_kind(meta.file_type()),
                size: meta.len(),
                mtime: meta.modified().unwrap_or(std::time::UNIX_EPOCH),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to).await
    }
}

async fn remove_recursive(path: &Path, delete_files: bool) -> io::Result<()> {
    let mut reader = match fs::read_dir(path).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name();
        if is_dotfile(&name) {
            continue;
        }
        let child: PathBuf = entry.path();
        let file_type = entry.file_type().await?;
        if file_type.is_dir() {
            Box::pin(remove_recursive(&child, delete_files)).await?;
            fs::remove_dir(&child).await?;
        } else if delete_files {
            fs::remove_file(&child).await?;
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn set_world_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o777)).await
}

#[cfg(not(unix))]
async fn set_world_writable(_path: &Path) -> io::Result<()> {
    Ok(())
}
