// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Transient user-visible notifications

use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// How long a notice stays visible
pub const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Surface for short-lived messages to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, duration: Duration);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, _duration: Duration) {
        info!(target: "notice", "{}", message);
    }
}

/// Keeps every notice it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, _duration: Duration) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
