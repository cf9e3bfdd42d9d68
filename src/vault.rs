// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Vault file layer: file references, creation events and storage access

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::paths;
use crate::{HashPasteError, Result};

/// Directory (relative to the vault root) that trashed files are moved into
pub const TRASH_DIR: &str = ".trash";

/// A file inside the vault, addressed by its vault-relative `/` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFile {
    path: String,
}

impl VaultFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path component
    pub fn name(&self) -> &str {
        paths::basename(&self.path)
    }

    /// Text after the last `.` of the name, or empty when there is none
    pub fn extension(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) => &name[idx + 1..],
            None => "",
        }
    }

    /// Parent folder path; files at the vault root report `/`
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.path[..idx],
        }
    }
}

/// Notification that a file appeared in the vault
#[derive(Debug, Clone)]
pub struct FileCreationEvent {
    pub file: VaultFile,
    /// Creation time reported by the file system
    pub ctime: DateTime<Utc>,
}

impl FileCreationEvent {
    pub fn new(file: VaultFile, ctime: DateTime<Utc>) -> Self {
        Self { file, ctime }
    }
}

/// Storage operations the rename pipeline needs from the vault.
///
/// Every awaited call is a point where another event's handling may run.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Full binary content of a file
    async fn read_binary(&self, path: &str) -> Result<Vec<u8>>;

    /// Move a file to a new vault path. Fails when the target exists.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Remove a file from the vault without destroying it
    async fn trash(&self, path: &str) -> Result<()>;

    /// Whether a file (not a folder) exists at the normalized path
    fn exists(&self, path: &str) -> bool;
}

/// Vault backed by a directory on the local file system
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a vault path onto the file system
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let normalized = paths::normalize(path);
        if normalized == "/" {
            return Ok(self.root.clone());
        }

        let mut resolved = self.root.clone();
        for part in normalized.split('/') {
            if part == ".." {
                return Err(HashPasteError::Config(format!(
                    "Path escapes the vault: {}",
                    path
                )));
            }
            resolved.push(part);
        }
        Ok(resolved)
    }

    /// Vault path of a file system path under the root
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    /// Creation time of a file, falling back to its modification time
    pub fn creation_time(&self, path: &str) -> Result<DateTime<Utc>> {
        let metadata = std::fs::metadata(self.resolve(path)?)?;
        let time = metadata.created().or_else(|_| metadata.modified())?;
        Ok(DateTime::<Utc>::from(time))
    }

    /// First free name for `name` inside the trash directory
    fn trash_target(&self, trash: &Path, name: &str) -> PathBuf {
        let candidate = trash.join(name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
            _ => (name, ""),
        };

        let mut n = 1u32;
        loop {
            let candidate = trash.join(format!("{} {}{}", stem, n, ext));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::read(&full).await?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        if !source.is_file() {
            return Err(HashPasteError::NotFound(from.to_string()));
        }
        if tokio::fs::try_exists(&target).await? {
            return Err(HashPasteError::FileSystem(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("Destination file already exists: {}", to),
            )));
        }

        tokio::fs::rename(&source, &target).await?;
        debug!("Moved {:?} -> {:?}", source, target);
        Ok(())
    }

    async fn trash(&self, path: &str) -> Result<()> {
        let source = self.resolve(path)?;
        if !source.is_file() {
            return Err(HashPasteError::NotFound(path.to_string()));
        }

        let trash = self.root.join(TRASH_DIR);
        tokio::fs::create_dir_all(&trash).await?;

        let target = self.trash_target(&trash, paths::basename(&paths::normalize(path)));
        tokio::fs::rename(&source, &target).await?;
        debug!("Trashed {:?} -> {:?}", source, target);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }
}
