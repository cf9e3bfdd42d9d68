// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Forward-slash path helpers for vault-relative paths
//!
//! Vault paths are plain strings with `/` separators regardless of the host
//! platform, so these never go through `std::path`.

/// Join path segments.
///
/// Every segment is split on `/`; empty and `.` components are dropped.
/// A leading empty component survives when the first segment is empty or
/// starts with `/`, which keeps an absolute path absolute.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in segments {
        parts.extend(segment.as_ref().split('/'));
    }

    let mut joined: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    if parts.first() == Some(&"") {
        joined.insert(0, "");
    }

    joined.join("/")
}

/// Everything after the last `/`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Everything after the last `.` of the whole path.
///
/// The search is not limited to the final component: `a.b/c` yields `b/c`.
/// A path without any `.` is returned unchanged.
pub fn extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Canonical form used for vault lookups.
///
/// Backslashes become `/`, runs of separators collapse, leading and trailing
/// separators are stripped and non-breaking spaces become plain spaces. The
/// vault root normalizes to `/`.
pub fn normalize(path: &str) -> String {
    let cleaned = path.replace(['\u{00A0}', '\u{202F}'], " ");
    let normalized = cleaned
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        "/".to_string()
    } else {
        normalized
    }
}
