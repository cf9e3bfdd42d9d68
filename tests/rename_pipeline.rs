// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

use chrono::{Duration, Utc};
use hashpaste::config::PluginSettings;
use hashpaste::digest::{hash, EncodeDigest, HashAlgorithm};
use hashpaste::editor::{MemoryEditor, NoteFileEditor};
use hashpaste::history::{History, JournalAction};
use hashpaste::notice::RecordingNotifier;
use hashpaste::renamer::timestamp_string;
use hashpaste::vault::{FileCreationEvent, FsVault, VaultFile, TRASH_DIR};
use hashpaste::watcher::{process_created, STABLE_MAX_WAIT};
use hashpaste::{RenameOutcome, Renamer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tempfile::{tempdir, TempDir};

struct Fixture {
    dir: TempDir,
    editor: Arc<MemoryEditor>,
    notifier: Arc<RecordingNotifier>,
    renamer: Renamer,
}

fn fixture(settings: PluginSettings, note: &str, cursor_line: usize) -> Fixture {
    let dir = tempdir().unwrap();
    let editor = Arc::new(MemoryEditor::open("note.md", note, cursor_line));
    let notifier = Arc::new(RecordingNotifier::new());
    let renamer = Renamer::new(
        Arc::new(FsVault::new(dir.path())),
        editor.clone(),
        notifier.clone(),
        settings,
    );
    Fixture {
        dir,
        editor,
        notifier,
        renamer,
    }
}

fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn created(path: &str, age_ms: i64) -> (FileCreationEvent, chrono::DateTime<Utc>) {
    let now = Utc::now();
    let event = FileCreationEvent::new(VaultFile::new(path), now - Duration::milliseconds(age_ms));
    (event, now)
}

fn content_settings() -> PluginSettings {
    PluginSettings {
        hash_context: true,
        ..PluginSettings::default()
    }
}

#[tokio::test]
async fn pasted_image_renamed_by_name_and_time() {
    let fx = fixture(PluginSettings::default(), "Some text\n![[Pasted image 1.png]] ok", 1);
    write_file(fx.dir.path(), "Pasted image 1.png", b"\x89PNG");

    let (event, now) = created("Pasted image 1.png", 200);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();

    let digest = hash(
        HashAlgorithm::Sha512,
        EncodeDigest::Hex,
        format!("Pasted image 1.png{}", timestamp_string(now)),
    );
    let expected = format!("{}.png", digest);

    assert_eq!(
        outcome,
        RenameOutcome::Renamed {
            from: "Pasted image 1.png".to_string(),
            to: expected.clone(),
            reference_patched: true,
        }
    );
    assert!(fx.dir.path().join(&expected).is_file());
    assert!(!fx.dir.path().join("Pasted image 1.png").exists());
    assert_eq!(
        fx.editor.text().unwrap(),
        format!("Some text\n![[{}]] ok", expected)
    );
    assert_eq!(
        fx.notifier.messages(),
        vec![format!("Pasted image renamed to {}", expected)]
    );
}

#[tokio::test]
async fn duplicate_content_is_trashed_instead_of_renamed() {
    let fx = fixture(content_settings(), "![[Pasted image 2.png]]", 0);
    let bytes = b"identical image bytes";
    let digest = hash(HashAlgorithm::Sha512, EncodeDigest::Hex, bytes);
    let existing = format!("assets/{}.png", digest);
    write_file(fx.dir.path(), &existing, bytes);
    write_file(fx.dir.path(), "assets/Pasted image 2.png", bytes);

    let (event, now) = created("assets/Pasted image 2.png", 50);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();

    assert_eq!(
        outcome,
        RenameOutcome::Deduplicated {
            removed: "assets/Pasted image 2.png".to_string(),
            existing: existing.clone(),
            reference_patched: true,
        }
    );
    assert!(!fx.dir.path().join("assets/Pasted image 2.png").exists());
    assert!(fx.dir.path().join(TRASH_DIR).join("Pasted image 2.png").is_file());
    assert_eq!(std::fs::read(fx.dir.path().join(&existing)).unwrap(), bytes);
    assert_eq!(fx.editor.text().unwrap(), format!("![[{}.png]]", digest));

    let messages = fx.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Pasted image 2.png"));
    assert!(messages[0].contains("has been removed"));
}

#[tokio::test]
async fn duplicate_without_notifications_is_silent() {
    let settings = PluginSettings {
        notification: false,
        ..content_settings()
    };
    let fx = fixture(settings, "", 0);
    let bytes = b"png";
    let digest = hash(HashAlgorithm::Sha512, EncodeDigest::Hex, bytes);
    write_file(fx.dir.path(), &format!("{}.png", digest), bytes);
    write_file(fx.dir.path(), "Pasted image 3.png", bytes);

    let (event, now) = created("Pasted image 3.png", 10);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();

    assert!(matches!(outcome, RenameOutcome::Deduplicated { .. }));
    assert!(fx.notifier.messages().is_empty());
}

#[tokio::test]
async fn stale_event_is_ignored() {
    let fx = fixture(PluginSettings::default(), "![[Pasted image 4.png]]", 0);
    write_file(fx.dir.path(), "Pasted image 4.png", b"png");

    let (event, now) = created("Pasted image 4.png", 1500);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();

    assert_eq!(outcome, RenameOutcome::Ignored);
    assert!(fx.dir.path().join("Pasted image 4.png").is_file());
    assert_eq!(fx.editor.text().unwrap(), "![[Pasted image 4.png]]");
    assert!(fx.notifier.messages().is_empty());
}

#[tokio::test]
async fn markdown_file_is_ignored() {
    let settings = PluginSettings {
        copy_image_file_support: true,
        ..PluginSettings::default()
    };
    let fx = fixture(settings, "", 0);
    write_file(fx.dir.path(), "Pasted image 5.md", b"# not an image");

    let (event, now) = created("Pasted image 5.md", 0);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();

    assert_eq!(outcome, RenameOutcome::Ignored);
    assert!(fx.dir.path().join("Pasted image 5.md").is_file());
}

#[tokio::test]
async fn renamed_file_hashes_to_its_own_name() {
    let settings = PluginSettings {
        hash_algorithm: HashAlgorithm::Sha256,
        encoding_digest: EncodeDigest::Base64url,
        copy_image_file_support: true,
        ..content_settings()
    };
    let fx = fixture(settings, "![](holiday%20photo.jpg)", 0);
    write_file(fx.dir.path(), "photos/holiday photo.jpg", b"\xff\xd8\xff\xe0 jpeg body");

    let (event, now) = created("photos/holiday photo.jpg", 300);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();

    let RenameOutcome::Renamed { to, reference_patched, .. } = outcome else {
        panic!("expected a rename, got {:?}", outcome);
    };
    assert!(reference_patched);

    let stem = to
        .strip_prefix("photos/")
        .and_then(|name| name.strip_suffix(".jpg"))
        .unwrap();
    let renamed = std::fs::read(fx.dir.path().join(&to)).unwrap();
    assert_eq!(hash(HashAlgorithm::Sha256, EncodeDigest::Base64url, renamed), stem);
    assert!(!stem.contains('='));
    assert_eq!(fx.editor.text().unwrap(), format!("![]({}.jpg)", stem));
}

#[tokio::test]
async fn copied_image_needs_copy_support() {
    let fx = fixture(PluginSettings::default(), "", 0);
    write_file(fx.dir.path(), "diagram.svg", b"<svg/>");

    let (event, now) = created("diagram.svg", 10);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();

    assert_eq!(outcome, RenameOutcome::Ignored);
    assert!(fx.dir.path().join("diagram.svg").is_file());
}

#[tokio::test]
async fn journal_records_renames_and_dedups() {
    let dir = tempdir().unwrap();
    let history_file = dir.path().join(".hashpaste").join("history.jsonl");
    let editor = Arc::new(MemoryEditor::open("note.md", "", 0));
    let renamer = Renamer::new(
        Arc::new(FsVault::new(dir.path())),
        editor,
        Arc::new(RecordingNotifier::new()),
        content_settings(),
    )
    .with_history(History::new(history_file.clone()));

    write_file(dir.path(), "Pasted image a.png", b"same");
    let (event, now) = created("Pasted image a.png", 10);
    renamer.handle_event_at(&event, now).await.unwrap();

    write_file(dir.path(), "Pasted image b.png", b"same");
    let (event, now) = created("Pasted image b.png", 10);
    renamer.handle_event_at(&event, now).await.unwrap();

    let entries = History::new(history_file).read_all().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, JournalAction::Renamed);
    assert_eq!(entries[1].action, JournalAction::Deduplicated);
    assert_eq!(entries[0].new_path, entries[1].new_path);
    assert_eq!(entries[0].digest, hash(HashAlgorithm::Sha512, EncodeDigest::Hex, b"same"));
}

#[tokio::test]
async fn concurrent_pastes_are_handled_independently() {
    let fx = fixture(content_settings(), "", 0);
    write_file(fx.dir.path(), "Pasted image x.png", b"first");
    write_file(fx.dir.path(), "Pasted image y.png", b"second");

    let (first, now) = created("Pasted image x.png", 10);
    let (second, _) = created("Pasted image y.png", 10);
    let (a, b) = tokio::join!(
        fx.renamer.handle_event_at(&first, now),
        fx.renamer.handle_event_at(&second, now)
    );

    assert!(matches!(a.unwrap(), RenameOutcome::Renamed { .. }));
    assert!(matches!(b.unwrap(), RenameOutcome::Renamed { .. }));
    for bytes in [&b"first"[..], &b"second"[..]] {
        let name = format!("{}.png", hash(HashAlgorithm::Sha512, EncodeDigest::Hex, bytes));
        assert!(fx.dir.path().join(name).is_file());
    }
}

#[tokio::test]
async fn missing_file_fails_only_that_event() {
    let fx = fixture(content_settings(), "", 0);

    let (event, now) = created("Pasted image gone.png", 10);
    assert!(fx.renamer.handle_event_at(&event, now).await.is_err());

    write_file(fx.dir.path(), "Pasted image here.png", b"ok");
    let (event, now) = created("Pasted image here.png", 10);
    let outcome = fx.renamer.handle_event_at(&event, now).await.unwrap();
    assert!(matches!(outcome, RenameOutcome::Renamed { .. }));
}

#[tokio::test]
async fn content_written_after_creation_is_hashed_once_settled() {
    let fx = fixture(content_settings(), "", 0);
    let path = fx.dir.path().join("Pasted image late.png");
    std::fs::write(&path, b"").unwrap();

    let received = Utc::now();
    let event = FileCreationEvent::new(VaultFile::new("Pasted image late.png"), received);
    let writer = std::thread::spawn(move || {
        std::thread::sleep(StdDuration::from_millis(300));
        std::fs::write(path, b"full image body").unwrap();
    });

    let vault = FsVault::new(fx.dir.path());
    let outcome = process_created(&fx.renamer, &vault, &event, received, STABLE_MAX_WAIT)
        .await
        .unwrap();
    writer.join().unwrap();

    let expected = format!(
        "{}.png",
        hash(HashAlgorithm::Sha512, EncodeDigest::Hex, b"full image body")
    );
    let RenameOutcome::Renamed { to, .. } = outcome else {
        panic!("expected a rename, got {:?}", outcome);
    };
    assert_eq!(to, expected);
    assert_eq!(
        std::fs::read(fx.dir.path().join(&expected)).unwrap(),
        b"full image body"
    );
}

#[tokio::test]
async fn vanished_file_is_dropped_before_hashing() {
    let fx = fixture(content_settings(), "", 0);
    let received = Utc::now();
    let event = FileCreationEvent::new(VaultFile::new("Pasted image gone.png"), received);

    let vault = FsVault::new(fx.dir.path());
    let outcome = process_created(&fx.renamer, &vault, &event, received, STABLE_MAX_WAIT)
        .await
        .unwrap();
    assert_eq!(outcome, RenameOutcome::Ignored);
}

#[tokio::test]
async fn note_on_disk_gets_its_reference_rewritten() {
    let dir = tempdir().unwrap();
    let note = dir.path().join("daily.md");
    std::fs::write(&note, "# Today\n![[Pasted image n.png]]\n").unwrap();
    write_file(dir.path(), "Pasted image n.png", b"note image");

    let renamer = Renamer::new(
        Arc::new(FsVault::new(dir.path())),
        Arc::new(NoteFileEditor::new("daily.md", note.clone(), None)),
        Arc::new(RecordingNotifier::new()),
        content_settings(),
    );

    let (event, now) = created("Pasted image n.png", 10);
    let outcome = renamer.handle_event_at(&event, now).await.unwrap();

    let name = format!("{}.png", hash(HashAlgorithm::Sha512, EncodeDigest::Hex, b"note image"));
    assert_eq!(
        outcome,
        RenameOutcome::Renamed {
            from: "Pasted image n.png".to_string(),
            to: name.clone(),
            reference_patched: true,
        }
    );
    assert_eq!(
        std::fs::read_to_string(&note).unwrap(),
        format!("# Today\n![[{}]]\n", name)
    );
}
