// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for hashpaste

use thiserror::Error;

/// Result type alias for hashpaste operations
pub type Result<T> = std::result::Result<T, HashPasteError>;

/// hashpaste error types
#[derive(Error, Debug)]
pub enum HashPasteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported digest encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("Not found in vault: {0}")]
    NotFound(String),
}
