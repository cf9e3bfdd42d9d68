// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Rename pipeline for newly created images
//!
//! One pass per creation event, no retries:
//! filter, require an active document, derive the hashed name, resolve a
//! same-name collision (content mode only), rename, patch the reference on
//! the cursor line, notify.

use chrono::{DateTime, Local, Utc};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

use crate::classifier::{is_image_file, is_markdown_file, is_pasted_image};
use crate::config::PluginSettings;
use crate::digest::hash;
use crate::editor::{Cursor, Editor};
use crate::history::{create_entry, History, JournalAction};
use crate::notice::{Notifier, NOTICE_DURATION};
use crate::paths;
use crate::vault::{FileCreationEvent, Vault, VaultFile};
use crate::{HashPasteError, Result};

/// Events reported later than this after the file's creation are ignored
pub const CREATION_WINDOW_MS: i64 = 1000;

/// Name chosen for one created file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDecision {
    pub new_name: String,
    pub new_path: String,
    pub should_rename: bool,
}

/// Result of handling one creation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Outside the creation window or not an in-scope file
    Ignored,
    /// Nothing is open in the editor
    NoActiveDocument,
    /// The file now lives at `to`
    Renamed {
        from: String,
        to: String,
        reference_patched: bool,
    },
    /// An identical file already held the hashed name; the new one was trashed
    Deduplicated {
        removed: String,
        existing: String,
        reference_patched: bool,
    },
    /// The file already carries its hashed name
    AlreadyNamed { path: String },
}

/// Local-time rendering hashed together with the file name in name mode.
///
/// Matches JavaScript's `Date#toString` up to the offset, without the
/// trailing `(Zone Name)` it appends.
pub fn timestamp_string(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local)
        .format("%a %b %d %Y %H:%M:%S GMT%z")
        .to_string()
}

/// Best-effort single in-place reference patch.
///
/// Replaces the first literal occurrence of `original` in `line`, falling
/// back to its URL-encoded form. Only one reference on one line is ever
/// rewritten. Returns `None` when neither form occurs.
pub fn patch_reference_line(line: &str, original: &str, new_name: &str) -> Option<String> {
    if original.is_empty() {
        return None;
    }
    if line.contains(original) {
        return Some(line.replacen(original, new_name, 1));
    }

    let encoded = urlencoding::encode(original);
    if encoded != original && line.contains(encoded.as_ref()) {
        return Some(line.replacen(encoded.as_ref(), new_name, 1));
    }

    None
}

/// Reacts to file creation events by renaming images to their hashed names
pub struct Renamer {
    vault: Arc<dyn Vault>,
    editor: Arc<dyn Editor>,
    notifier: Arc<dyn Notifier>,
    settings: RwLock<PluginSettings>,
    history: Option<History>,
}

impl Renamer {
    pub fn new(
        vault: Arc<dyn Vault>,
        editor: Arc<dyn Editor>,
        notifier: Arc<dyn Notifier>,
        settings: PluginSettings,
    ) -> Self {
        Self {
            vault,
            editor,
            notifier,
            settings: RwLock::new(settings),
            history: None,
        }
    }

    /// Record every rename and dedup in a journal
    pub fn with_history(mut self, history: History) -> Self {
        self.history = Some(history);
        self
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> PluginSettings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the settings used for subsequent events
    pub fn update_settings(&self, settings: PluginSettings) {
        let mut current = self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = settings;
    }

    /// Whether an event is in scope for renaming
    pub fn should_handle(
        &self,
        event: &FileCreationEvent,
        now: DateTime<Utc>,
        settings: &PluginSettings,
    ) -> bool {
        let gap_ms = (now - event.ctime).num_milliseconds();
        if gap_ms > CREATION_WINDOW_MS {
            return false;
        }

        let file = &event.file;
        if is_markdown_file(file) {
            return false;
        }

        is_pasted_image(file) || (settings.copy_image_file_support && is_image_file(file))
    }

    pub async fn handle_event(&self, event: &FileCreationEvent) -> Result<RenameOutcome> {
        self.handle_event_at(event, Utc::now()).await
    }

    /// Run the pipeline for one event as of `now`
    pub async fn handle_event_at(
        &self,
        event: &FileCreationEvent,
        now: DateTime<Utc>,
    ) -> Result<RenameOutcome> {
        let settings = self.settings();
        let file = &event.file;

        if !self.should_handle(event, now, &settings) {
            debug!("Ignoring {}", file.path());
            return Ok(RenameOutcome::Ignored);
        }

        if self.with_editor(|editor| editor.active_file()).await?.is_none() {
            debug!("No active document, leaving {} as is", file.path());
            return Ok(RenameOutcome::NoActiveDocument);
        }

        let origin_name = file.name().to_string();
        let content = if settings.hash_context {
            Some(self.vault.read_binary(file.path()).await?)
        } else {
            None
        };

        let decision = self.generate_decision(file, content.as_deref(), now, &settings);
        let digest = decision
            .new_name
            .strip_suffix(&format!(".{}", file.extension()))
            .unwrap_or(&decision.new_name)
            .to_string();
        let new_path = paths::normalize(&decision.new_path);

        if new_path == paths::normalize(file.path()) {
            debug!("{} already carries its hashed name", file.path());
            return Ok(RenameOutcome::AlreadyNamed { path: new_path });
        }

        let decision = match content {
            Some(ref bytes) => self.resolve_collision(file, bytes, decision, &settings).await?,
            None => decision,
        };

        if decision.should_rename {
            if let Err(e) = self.vault.rename(file.path(), &decision.new_path).await {
                error!("Failed to rename {} to {}: {}", file.path(), new_path, e);
                return Err(e);
            }
            info!("Renamed {} -> {}", file.path(), new_path);
            self.journal(JournalAction::Renamed, file.path(), &new_path, &digest);
        } else {
            self.journal(JournalAction::Deduplicated, file.path(), &new_path, &digest);
        }

        let patched = self
            .patch_active_line(&origin_name, &decision.new_name)
            .await?;

        let outcome = if decision.should_rename {
            RenameOutcome::Renamed {
                from: file.path().to_string(),
                to: new_path,
                reference_patched: patched.unwrap_or(false),
            }
        } else {
            RenameOutcome::Deduplicated {
                removed: file.path().to_string(),
                existing: new_path,
                reference_patched: patched.unwrap_or(false),
            }
        };

        if patched.is_some() && decision.should_rename && settings.notification {
            self.notifier.notify(
                &format!("Pasted image renamed to {}", decision.new_name),
                NOTICE_DURATION,
            );
        }

        Ok(outcome)
    }

    /// Hash content when given, otherwise the name plus the current time
    fn generate_decision(
        &self,
        file: &VaultFile,
        content: Option<&[u8]>,
        now: DateTime<Utc>,
        settings: &PluginSettings,
    ) -> RenameDecision {
        let digest = match content {
            Some(bytes) => hash(settings.hash_algorithm, settings.encoding_digest, bytes),
            None => hash(
                settings.hash_algorithm,
                settings.encoding_digest,
                format!("{}{}", file.name(), timestamp_string(now)),
            ),
        };

        let new_name = format!("{}.{}", digest, file.extension());
        let new_path = paths::join(&[file.parent(), new_name.as_str()]);

        RenameDecision {
            new_name,
            new_path,
            should_rename: true,
        }
    }

    /// Trash the new file when an identical one already has its hashed name
    async fn resolve_collision(
        &self,
        file: &VaultFile,
        content: &[u8],
        mut decision: RenameDecision,
        settings: &PluginSettings,
    ) -> Result<RenameDecision> {
        let target = paths::normalize(&decision.new_path);
        if !self.vault.exists(&target) {
            return Ok(decision);
        }

        let existing = self.vault.read_binary(&target).await?;
        if existing.as_slice() != content {
            warn!(
                "{} differs from the file already at {}, renaming anyway",
                file.path(),
                target
            );
            return Ok(decision);
        }

        self.vault.trash(file.path()).await?;
        decision.should_rename = false;
        info!("{} duplicates {}, moved to trash", file.path(), target);

        if settings.notification {
            self.notifier.notify(
                &format!(
                    "Pasted image {} already exists as a hashed file, and has been removed.",
                    file.name()
                ),
                NOTICE_DURATION,
            );
        }

        Ok(decision)
    }

    /// Rewrite the cursor line; `None` when no editor view is available
    /// Run an editor call on the blocking pool; editors may touch the disk
    async fn with_editor<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Editor) -> T + Send + 'static,
        T: Send + 'static,
    {
        let editor = Arc::clone(&self.editor);
        tokio::task::spawn_blocking(move || f(editor.as_ref()))
            .await
            .map_err(|e| HashPasteError::Editor(e.to_string()))
    }

    async fn patch_active_line(&self, original: &str, new_name: &str) -> Result<Option<bool>> {
        let original = original.to_string();
        let new_name = new_name.to_string();
        self.with_editor(move |editor| {
            let Some(cursor) = editor.cursor() else {
                return Ok(None);
            };
            let Some(line) = editor.line(cursor.line) else {
                return Ok(None);
            };

            match patch_reference_line(&line, &original, &new_name) {
                Some(replaced) => {
                    editor.replace_range(
                        Cursor::new(cursor.line, 0),
                        Cursor::new(cursor.line, line.len()),
                        &replaced,
                    )?;
                    Ok(Some(true))
                }
                None => Ok(Some(false)),
            }
        })
        .await?
    }

    fn journal(&self, action: JournalAction, original: &str, new_path: &str, digest: &str) {
        if let Some(ref history) = self.history {
            if let Err(e) = history.append(&create_entry(action, original, new_path, digest)) {
                warn!("Failed to write history entry: {}", e);
            }
        }
    }
}
