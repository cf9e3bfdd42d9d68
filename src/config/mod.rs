// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for hashpaste

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::digest::{EncodeDigest, HashAlgorithm};
use crate::{HashPasteError, Result};

/// Per-vault directory holding settings and the rename journal
pub const CONFIG_DIR: &str = ".hashpaste";
pub const SETTINGS_FILE: &str = "data.json";
pub const HISTORY_FILE: &str = "history.jsonl";

/// Keys accepted by [`PluginSettings::set`]
pub const SETTING_KEYS: &[&str] = &[
    "hashAlgorithm",
    "encodingDigest",
    "copyImageFileSupport",
    "notification",
    "hashContext",
];

/// Rename behaviour settings
///
/// Missing keys in a stored file fall back to the defaults.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginSettings {
    /// Hash function used for new names
    pub hash_algorithm: HashAlgorithm,

    /// Text encoding of the digest
    pub encoding_digest: EncodeDigest,

    /// Also rename image files copied into the vault, not only pasted ones
    pub copy_image_file_support: bool,

    /// Show a notice after each rename
    pub notification: bool,

    /// Hash file content instead of name + timestamp
    pub hash_context: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Sha512,
            encoding_digest: EncodeDigest::Hex,
            copy_image_file_support: false,
            notification: true,
            hash_context: false,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(HashPasteError::Config(format!(
            "Expected a boolean for {}, got '{}'",
            key, other
        ))),
    }
}

impl PluginSettings {
    /// Change one setting by its stored key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "hashAlgorithm" => self.hash_algorithm = value.parse()?,
            "encodingDigest" => self.encoding_digest = value.parse()?,
            "copyImageFileSupport" => self.copy_image_file_support = parse_bool(key, value)?,
            "notification" => self.notification = parse_bool(key, value)?,
            "hashContext" => self.hash_context = parse_bool(key, value)?,
            other => return Err(HashPasteError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

/// Settings file location for a vault
pub fn settings_path(vault: &Path) -> PathBuf {
    vault.join(CONFIG_DIR).join(SETTINGS_FILE)
}

/// Rename journal location for a vault
pub fn history_path(vault: &Path) -> PathBuf {
    vault.join(CONFIG_DIR).join(HISTORY_FILE)
}

/// JSON-backed settings persistence
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored settings merged over the defaults
    pub fn load(&self) -> Result<PluginSettings> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let settings: PluginSettings = serde_json::from_str(&content)
                .map_err(|e| HashPasteError::Config(format!("Failed to parse settings: {}", e)))?;
            Ok(settings)
        } else {
            tracing::info!("Settings file not found at {:?}, using defaults", self.path);
            Ok(PluginSettings::default())
        }
    }

    pub fn save(&self, settings: &PluginSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Change one setting and persist the result
    pub fn set(&self, key: &str, value: &str) -> Result<PluginSettings> {
        let mut settings = self.load()?;
        settings.set(key, value)?;
        self.save(&settings)?;
        Ok(settings)
    }

    /// Overwrite the stored settings with the defaults
    pub fn reset(&self) -> Result<PluginSettings> {
        let settings = PluginSettings::default();
        self.save(&settings)?;
        Ok(settings)
    }
}
