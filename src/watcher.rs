// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! File system watcher feeding creation events into the rename pipeline

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info, warn};

use crate::config::CONFIG_DIR;
use crate::renamer::{RenameOutcome, Renamer};
use crate::vault::{FileCreationEvent, FsVault, VaultFile, TRASH_DIR};
use crate::Result;

/// Longest wait for a created file to stop growing
pub const STABLE_MAX_WAIT: Duration = Duration::from_secs(10);

/// Events emitted by the watcher
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A new file appeared in the vault
    Created(FileCreationEvent),
    /// The settings file was written
    SettingsChanged,
    /// Watcher error
    Error(String),
}

/// Source of vault events, consumed by the watch loop
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` once the source is closed
    async fn next_event(&mut self) -> Option<WatchEvent>;
}

/// Watches a vault directory on disk
pub struct VaultWatcher {
    watcher: RecommendedWatcher,
    vault: FsVault,
    settings_path: PathBuf,
    event_rx: UnboundedReceiver<notify::Result<Event>>,
    pending: VecDeque<WatchEvent>,
}

impl VaultWatcher {
    /// Start watching the vault root and the settings file
    pub fn new(vault: FsVault, settings_path: PathBuf, recursive: bool) -> Result<Self> {
        let (tx, rx) = unbounded_channel();

        let config = Config::default().with_poll_interval(Duration::from_secs(2));

        // The settings directory must exist before it can be watched
        if let Some(parent) = settings_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created settings directory: {:?}", parent);
            }
        }

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            config,
        )?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(vault.root(), mode)?;
        info!("Watching vault: {:?}", vault.root());

        let inside_watch = if recursive {
            settings_path.starts_with(vault.root())
        } else {
            settings_path.parent() == Some(vault.root())
        };
        if !inside_watch {
            if let Some(parent) = settings_path.parent() {
                watcher.watch(parent, RecursiveMode::NonRecursive)?;
                debug!("Watching settings directory: {:?}", parent);
            }
        }

        Ok(Self {
            watcher,
            vault,
            settings_path,
            event_rx: rx,
            pending: VecDeque::new(),
        })
    }

    /// Stop watching the vault
    pub fn unwatch(&mut self) -> Result<()> {
        self.watcher.unwatch(self.vault.root())?;
        info!("Stopped watching: {:?}", self.vault.root());
        Ok(())
    }

    /// Convert a notify event into zero or more of ours
    fn convert_event(&self, event: Event) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        for path in &event.paths {
            if *path == self.settings_path {
                if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    out.push(WatchEvent::SettingsChanged);
                }
                continue;
            }

            if !matches!(event.kind, EventKind::Create(_)) {
                continue;
            }
            if !path.is_file() || !should_process(path) || self.is_internal(path) {
                continue;
            }

            let Some(rel) = self.vault.relative(path) else {
                continue;
            };
            match self.vault.creation_time(&rel) {
                Ok(ctime) => out.push(WatchEvent::Created(FileCreationEvent::new(
                    VaultFile::new(rel),
                    ctime,
                ))),
                Err(e) => debug!("Skipping {:?}: {}", path, e),
            }
        }
        out
    }

    /// Files under the settings or trash directories
    fn is_internal(&self, path: &Path) -> bool {
        let root = self.vault.root();
        path.starts_with(root.join(CONFIG_DIR)) || path.starts_with(root.join(TRASH_DIR))
    }
}

#[async_trait]
impl EventSource for VaultWatcher {
    async fn next_event(&mut self) -> Option<WatchEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            match self.event_rx.recv().await? {
                Ok(event) => {
                    let converted = self.convert_event(event);
                    self.pending.extend(converted);
                }
                Err(e) => return Some(WatchEvent::Error(e.to_string())),
            }
        }
    }
}

/// Wait for file to be stable (not being written).
///
/// An empty file never counts as stable: creation is reported before the
/// first byte lands. Returns `false` if the file disappears.
pub async fn wait_for_stable(path: &Path, max_wait: Duration) -> bool {
    let check_interval = Duration::from_millis(500);
    let start = std::time::Instant::now();

    let mut last_size = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return false,
    };

    loop {
        tokio::time::sleep(check_interval).await;

        if start.elapsed() > max_wait {
            warn!("File stability check timed out for {:?}", path);
            return true; // Proceed anyway
        }

        let current_size = match std::fs::metadata(path) {
            Ok(m) => m.len(),
            Err(_) => return false, // File was deleted
        };

        if current_size == last_size && current_size > 0 {
            return true;
        }

        last_size = current_size;
        debug!("File {:?} still being written, size: {}", path, current_size);
    }
}

/// Let a created file settle, then run it through the renamer.
///
/// `received` is when the creation was observed. The creation window is
/// measured against it, not against the end of the wait.
pub async fn process_created(
    renamer: &Renamer,
    vault: &FsVault,
    event: &FileCreationEvent,
    received: DateTime<Utc>,
    max_wait: Duration,
) -> Result<RenameOutcome> {
    if !renamer.should_handle(event, received, &renamer.settings()) {
        debug!("Ignoring {}", event.file.path());
        return Ok(RenameOutcome::Ignored);
    }

    let full = vault.resolve(event.file.path())?;
    if !wait_for_stable(&full, max_wait).await {
        debug!("File disappeared during stability check: {:?}", full);
        return Ok(RenameOutcome::Ignored);
    }

    renamer.handle_event_at(event, received).await
}

/// Check if a file should be considered at all
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    // Hidden files
    if filename.starts_with('.') {
        return false;
    }

    // Partial downloads and editor swap files
    let temp_extensions = [".tmp", ".part", ".crdownload", ".partial", ".download", ".swp"];
    for ext in &temp_extensions {
        if filename.ends_with(ext) {
            return false;
        }
    }

    true
}
