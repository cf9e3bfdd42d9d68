// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Predicates deciding which created files enter the rename pipeline

use crate::vault::VaultFile;

/// Name prefix given to images pasted from the clipboard
pub const PASTED_IMAGE_PREFIX: &str = "Pasted image ";

/// Extensions treated as images when copy support is on
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heif", "heic", "svg", "ico",
];

/// Note files are never renamed. The comparison is exact.
pub fn is_markdown_file(file: &VaultFile) -> bool {
    file.extension() == "md"
}

pub fn is_pasted_image(file: &VaultFile) -> bool {
    file.name().starts_with(PASTED_IMAGE_PREFIX)
}

/// Case-insensitive match against [`IMAGE_EXTENSIONS`]
pub fn is_image_file(file: &VaultFile) -> bool {
    let ext = file.extension().to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}
