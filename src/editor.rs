// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Active editor access
//!
//! The rename pipeline only ever touches one line: the one under the cursor
//! of the active document. [`MemoryEditor`] keeps the document in memory for
//! embedding hosts; [`NoteFileEditor`] treats a markdown file on disk as the
//! open document.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::{HashPasteError, Result};

/// Position in a document. `ch` is a byte offset into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub ch: usize,
}

impl Cursor {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// Editor surface of the host
pub trait Editor: Send + Sync {
    /// Vault path of the document in focus, if any
    fn active_file(&self) -> Option<String>;

    /// Cursor of the active editor; `None` when no editor is available
    fn cursor(&self) -> Option<Cursor>;

    /// Text of a line without its terminator
    fn line(&self, line: usize) -> Option<String>;

    /// Replace the text between two positions as a single edit
    fn replace_range(&self, from: Cursor, to: Cursor, text: &str) -> Result<()>;
}

/// Byte offset of a cursor within `text`
fn offset_of(text: &str, cursor: Cursor) -> Result<usize> {
    let mut offset = 0;
    for (idx, line) in text.split('\n').enumerate() {
        if idx == cursor.line {
            if cursor.ch > line.len() || !line.is_char_boundary(cursor.ch) {
                return Err(HashPasteError::Editor(format!(
                    "Column {} out of range on line {}",
                    cursor.ch, cursor.line
                )));
            }
            return Ok(offset + cursor.ch);
        }
        offset += line.len() + 1;
    }
    Err(HashPasteError::Editor(format!("Line {} out of range", cursor.line)))
}

fn splice(text: &str, from: Cursor, to: Cursor, replacement: &str) -> Result<String> {
    let start = offset_of(text, from)?;
    let end = offset_of(text, to)?;
    if end < start {
        return Err(HashPasteError::Editor("Range end precedes start".to_string()));
    }

    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    Ok(out)
}

fn nth_line(text: &str, line: usize) -> Option<String> {
    text.split('\n').nth(line).map(str::to_string)
}

#[derive(Debug, Default)]
struct Buffer {
    file: Option<String>,
    text: String,
    cursor: Option<Cursor>,
}

/// In-memory document with a cursor
#[derive(Debug, Default)]
pub struct MemoryEditor {
    buffer: Mutex<Buffer>,
}

impl MemoryEditor {
    /// Editor with `text` open as `file` and the cursor at `cursor_line`
    pub fn open(file: impl Into<String>, text: impl Into<String>, cursor_line: usize) -> Self {
        Self {
            buffer: Mutex::new(Buffer {
                file: Some(file.into()),
                text: text.into(),
                cursor: Some(Cursor::new(cursor_line, 0)),
            }),
        }
    }

    /// Editor with nothing open
    pub fn closed() -> Self {
        Self::default()
    }

    /// Drop the editor view while keeping the active document
    pub fn detach_view(&self) -> Result<()> {
        self.lock()?.cursor = None;
        Ok(())
    }

    pub fn set_cursor(&self, cursor: Cursor) -> Result<()> {
        self.lock()?.cursor = Some(cursor);
        Ok(())
    }

    /// Whole document text
    pub fn text(&self) -> Result<String> {
        Ok(self.lock()?.text.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Buffer>> {
        self.buffer
            .lock()
            .map_err(|_| HashPasteError::Editor("Editor lock poisoned".to_string()))
    }
}

impl Editor for MemoryEditor {
    fn active_file(&self) -> Option<String> {
        self.lock().ok()?.file.clone()
    }

    fn cursor(&self) -> Option<Cursor> {
        let buffer = self.lock().ok()?;
        buffer.file.as_ref()?;
        buffer.cursor
    }

    fn line(&self, line: usize) -> Option<String> {
        nth_line(&self.lock().ok()?.text, line)
    }

    fn replace_range(&self, from: Cursor, to: Cursor, text: &str) -> Result<()> {
        let mut buffer = self.lock()?;
        buffer.text = splice(&buffer.text, from, to, text)?;
        Ok(())
    }
}

/// A markdown note on disk acting as the open document.
///
/// The cursor is pinned to a configured line, or sits on the last non-empty
/// line of the note, where freshly pasted references usually land.
#[derive(Debug, Clone)]
pub struct NoteFileEditor {
    vault_path: String,
    file_path: PathBuf,
    pinned_line: Option<usize>,
}

impl NoteFileEditor {
    pub fn new(vault_path: impl Into<String>, file_path: PathBuf, pinned_line: Option<usize>) -> Self {
        Self {
            vault_path: vault_path.into(),
            file_path,
            pinned_line,
        }
    }

    fn read(&self) -> Option<String> {
        std::fs::read_to_string(&self.file_path).ok()
    }
}

impl Editor for NoteFileEditor {
    fn active_file(&self) -> Option<String> {
        self.file_path.is_file().then(|| self.vault_path.clone())
    }

    fn cursor(&self) -> Option<Cursor> {
        let text = self.read()?;
        let line = match self.pinned_line {
            Some(line) => line,
            None => text
                .split('\n')
                .enumerate()
                .filter(|(_, l)| !l.trim().is_empty())
                .map(|(idx, _)| idx)
                .last()
                .unwrap_or(0),
        };
        Some(Cursor::new(line, 0))
    }

    fn line(&self, line: usize) -> Option<String> {
        nth_line(&self.read()?, line)
    }

    fn replace_range(&self, from: Cursor, to: Cursor, text: &str) -> Result<()> {
        let current = std::fs::read_to_string(&self.file_path)?;
        let updated = splice(&current, from, to, text)?;
        std::fs::write(&self.file_path, updated)?;
        Ok(())
    }
}
