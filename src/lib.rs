// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! hashpaste: hash-named pasted images for markdown vaults
//!
//! Watches a vault for freshly pasted or copied images, renames them to a
//! digest of their content (or of their name and the current time), drops
//! exact duplicates and rewrites the reference on the active editor line.

pub mod classifier;
pub mod config;
pub mod digest;
pub mod editor;
pub mod error;
pub mod history;
pub mod notice;
pub mod paths;
pub mod renamer;
pub mod vault;
pub mod watcher;

pub use config::PluginSettings;
pub use error::{HashPasteError, Result};
pub use renamer::{RenameOutcome, Renamer};
