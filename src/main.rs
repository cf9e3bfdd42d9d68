// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! hashpaste: hash-named pasted images for markdown vaults

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use hashpaste::config::{history_path, settings_path, SettingsStore, SETTING_KEYS};
use hashpaste::digest::{hash, EncodeDigest, HashAlgorithm};
use hashpaste::editor::{Editor, MemoryEditor, NoteFileEditor};
use hashpaste::history::History;
use hashpaste::notice::LogNotifier;
use hashpaste::vault::FsVault;
use hashpaste::watcher::{process_created, EventSource, VaultWatcher, WatchEvent, STABLE_MAX_WAIT};
use hashpaste::{HashPasteError, Renamer, Result};

/// hashpaste CLI - rename pasted images to their hashes
#[derive(Parser, Debug)]
#[command(name = "hashpaste")]
#[command(version)]
#[command(about = "Rename pasted vault images to content or name hashes", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Vault root directory
    #[arg(long, default_value = ".", global = true)]
    vault: PathBuf,

    /// Settings file (default: <vault>/.hashpaste/data.json)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the vault and rename new images
    Watch {
        /// Note acting as the open document; without it nothing is renamed
        #[arg(short, long)]
        note: Option<PathBuf>,

        /// Cursor line in the note, 0-based (default: last non-empty line)
        #[arg(short, long)]
        line: Option<usize>,

        /// Watch subfolders too
        #[arg(short, long)]
        recursive: bool,
    },

    /// Print the digest a file would be named after
    Hash {
        /// File to hash, or the literal text with --text
        input: String,

        /// Hash algorithm (sha256, sha384, sha512, md5)
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Digest encoding (hex, base64url)
        #[arg(short, long)]
        encoding: Option<String>,

        /// Hash the argument itself instead of a file
        #[arg(long)]
        text: bool,
    },

    /// Settings management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Rename journal
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current settings
    Show,

    /// Change one setting and save it
    Set {
        /// Setting key, e.g. hashAlgorithm
        key: String,

        /// New value
        value: String,
    },

    /// Restore the default settings
    Reset,
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recent renames
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Clear the journal
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let store = SettingsStore::new(
        cli.settings
            .clone()
            .unwrap_or_else(|| settings_path(&cli.vault)),
    );

    match cli.command {
        Some(Commands::Watch { note, line, recursive }) => {
            run_watch(&cli.vault, store, note, line, recursive).await
        }
        Some(Commands::Hash { input, algorithm, encoding, text }) => {
            run_hash(&store, input, algorithm, encoding, text)
        }
        Some(Commands::Config { action }) => run_config_command(&store, action),
        Some(Commands::History { action }) => run_history_command(&cli.vault, action),
        None => run_watch(&cli.vault, store, None, None, false).await,
    }
}

/// Absolute form of `path`, resolved against `base` when relative
fn absolute(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}

/// Run the watch loop until Ctrl+C or SIGTERM
async fn run_watch(
    vault_dir: &Path,
    store: SettingsStore,
    note: Option<PathBuf>,
    line: Option<usize>,
    recursive: bool,
) -> Result<()> {
    let root = vault_dir.canonicalize()?;
    let cwd = std::env::current_dir()?;
    let store = SettingsStore::new(absolute(&cwd, store.path()));
    let settings = store.load()?;
    info!(
        "Settings: {} / {}, hash by {}",
        settings.hash_algorithm,
        settings.encoding_digest,
        if settings.hash_context { "content" } else { "name" }
    );

    let vault = FsVault::new(root.clone());

    let editor: Arc<dyn Editor> = match note {
        Some(note) => {
            let full = absolute(&root, &note);
            let rel = vault.relative(&full).ok_or_else(|| {
                HashPasteError::Config(format!("Note {:?} is not inside the vault", note))
            })?;
            info!("Active document: {}", rel);
            Arc::new(NoteFileEditor::new(rel, full, line))
        }
        None => {
            warn!("No --note given: there is no active document, images will not be renamed");
            Arc::new(MemoryEditor::closed())
        }
    };

    let renamer = Arc::new(
        Renamer::new(
            Arc::new(vault.clone()),
            editor,
            Arc::new(LogNotifier),
            settings,
        )
        .with_history(History::new(history_path(&root))),
    );

    let mut watcher = VaultWatcher::new(vault.clone(), store.path().to_path_buf(), recursive)?;

    // Setup graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }

        let _ = shutdown_tx.send(true);
    });

    info!("Watching {:?}. Press Ctrl+C to stop.", root);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            event = watcher.next_event() => match event {
                Some(WatchEvent::Created(event)) => {
                    let received = Utc::now();
                    let renamer = renamer.clone();
                    let vault = vault.clone();
                    tokio::spawn(async move {
                        let result =
                            process_created(&renamer, &vault, &event, received, STABLE_MAX_WAIT)
                                .await;
                        if let Err(e) = result {
                            error!("Failed to process {}: {}", event.file.path(), e);
                        }
                    });
                }
                Some(WatchEvent::SettingsChanged) => match store.load() {
                    Ok(settings) => {
                        renamer.update_settings(settings);
                        info!("Settings reloaded");
                    }
                    Err(e) => warn!("Keeping previous settings: {}", e),
                },
                Some(WatchEvent::Error(e)) => warn!("Watch error: {}", e),
                None => {
                    warn!("Watcher closed");
                    break;
                }
            },
        }
    }

    info!("hashpaste stopped.");
    Ok(())
}

/// Print the digest of a file or a literal string
fn run_hash(
    store: &SettingsStore,
    input: String,
    algorithm: Option<String>,
    encoding: Option<String>,
    text: bool,
) -> Result<()> {
    let settings = store.load()?;
    let algorithm: HashAlgorithm = match algorithm {
        Some(a) => a.parse()?,
        None => settings.hash_algorithm,
    };
    let encoding: EncodeDigest = match encoding {
        Some(e) => e.parse()?,
        None => settings.encoding_digest,
    };

    let bytes = if text {
        input.into_bytes()
    } else {
        std::fs::read(&input)?
    };

    println!("{}", hash(algorithm, encoding, bytes));
    Ok(())
}

/// Run config commands
fn run_config_command(store: &SettingsStore, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let settings = store.load()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommands::Set { key, value } => {
            if !SETTING_KEYS.contains(&key.as_str()) {
                eprintln!("Known keys: {}", SETTING_KEYS.join(", "));
            }
            let settings = store.set(&key, &value)?;
            println!("Saved {:?}", store.path());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommands::Reset => {
            store.reset()?;
            println!("Restored defaults in {:?}", store.path());
        }
    }

    Ok(())
}

/// Run history commands
fn run_history_command(vault_dir: &Path, action: HistoryCommands) -> Result<()> {
    let history = History::new(history_path(vault_dir));

    match action {
        HistoryCommands::List { count } => {
            let entries = history.get_recent(count)?;
            println!("Recent history ({} entries):", entries.len());
            for entry in entries {
                println!(
                    "  {} {:?} {} -> {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.action,
                    entry.original_path,
                    entry.new_path
                );
            }
        }
        HistoryCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing history");
                return Ok(());
            }
            history.clear()?;
            println!("History cleared");
        }
    }

    Ok(())
}
