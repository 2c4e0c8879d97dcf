//! phantom-card - Main Entry Point
//!
//! Command-line front end: export a page region, build social cards and
//! share links, and manage the active theme.

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use phantom_card::config::{load_config, FileThemeStorage, MemoryThemeStorage, Settings, ThemeStorage};
use phantom_card::export::{
    copy_link, download_blob, generate_export_filename, open_exported, parse_share_url,
    validate_export_readiness, CopyOutcome, ExportFormat, ExportKind, ExportOptions,
    ExportPayload, Exporter, SocialPlatform,
};
use phantom_card::page::Document;
use phantom_card::theme::{MenuKey, ThemeEngine, ThemeMenu, ThemeRegistry};
use phantom_card::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Application name constant.
const APP_NAME: &str = "phantom-card";

/// Export a themed resume page to images, PDF and share links.
#[derive(Parser, Debug)]
#[command(name = "phantom-card")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a page region as png, jpg, pdf or link.
    Export {
        /// Page snapshot (JSON element tree).
        #[arg(short, long)]
        page: PathBuf,

        /// Output format (defaults to the configured format).
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Id of the element to capture (conventional ids are probed if omitted).
        #[arg(long)]
        id: Option<String>,

        /// Output file name inside the export directory.
        #[arg(short, long)]
        out: Option<String>,

        /// Capture scale.
        #[arg(short, long)]
        scale: Option<f32>,
    },

    /// Export an element as a social media card.
    Social {
        #[arg(short, long)]
        page: PathBuf,

        /// twitter, linkedin, facebook, instagram or general.
        #[arg(long, default_value = "general")]
        platform: SocialPlatform,

        #[arg(long, default_value = "share-card")]
        id: String,
    },

    /// Build a share link for the page and copy it to the clipboard.
    Share {
        #[arg(short, long)]
        page: PathBuf,
    },

    /// Decode the theme and payload carried by a share link.
    ParseShare { url: String },

    /// Check whether an element is ready to be exported.
    Validate {
        #[arg(short, long)]
        page: PathBuf,

        #[arg(long, default_value = "share-card")]
        id: String,
    },

    /// Inspect or change the active theme.
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    /// List available themes.
    List,
    /// Show the persisted theme.
    Current,
    /// Select and persist a theme.
    Set { id: String },
    /// Drive the theme menu with key names (up, down, enter, escape, ...).
    Keys { keys: Vec<String> },
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = load_config();
    info!("Starting {}", APP_NAME);

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Export {
            page,
            format,
            id,
            out,
            scale,
        } => {
            let format = format.unwrap_or(settings.default_format);
            let mut options = match id {
                Some(id) => ExportOptions::for_id(&id),
                None => ExportOptions::default(),
            };
            options.scale = scale;
            if format == ExportFormat::Jpg {
                options.quality = Some(settings.jpg_quality);
            }
            options.filename = out;

            let mut document = load_themed_page(&page, settings)?;
            let exporter = exporter_for(&page, settings);
            let payload = exporter.export_resume(&mut document, format, &options, |p| {
                info!("[{:>3.0}%] {}", p.progress, p.stage);
            })?;

            match payload {
                ExportPayload::Binary { bytes, format } => {
                    let filename = options.filename.unwrap_or_else(|| {
                        generate_export_filename(
                            &settings.brand,
                            ExportKind::Resume,
                            format,
                            Utc::now(),
                        )
                    });
                    deliver(&bytes, &filename, settings)?;
                }
                ExportPayload::Link(link) => share(&link),
            }
            Ok(())
        }

        Commands::Social { page, platform, id } => {
            let mut document = load_themed_page(&page, settings)?;
            let bytes = exporter_for(&page, settings).export_for_social_media(
                &mut document,
                platform,
                &id,
                |p| info!("[{:>3.0}%] {}", p.progress, p.stage),
            )?;
            let filename = generate_export_filename(
                &settings.brand,
                ExportKind::Social,
                ExportFormat::Png,
                Utc::now(),
            );
            deliver(&bytes, &filename, settings)
        }

        Commands::Share { page } => {
            let mut document = load_themed_page(&page, settings)?;
            let payload = exporter_for(&page, settings).export_resume(
                &mut document,
                ExportFormat::Link,
                &ExportOptions::default(),
                |_| {},
            )?;
            if let Some(link) = payload.link() {
                share(link);
            }
            Ok(())
        }

        Commands::ParseShare { url } => {
            let link = parse_share_url(&url, Utc::now().timestamp_millis());
            println!("theme: {}", link.theme.as_deref().unwrap_or("-"));
            match link.data {
                Some(data) => println!(
                    "share: theme={} timestamp={} version={}",
                    data.theme, data.timestamp, data.version
                ),
                None => println!("share: -"),
            }
            Ok(())
        }

        Commands::Validate { page, id } => {
            let document = Document::from_json(&read_page(&page)?)?;
            let readiness = validate_export_readiness(&document, &id);
            if readiness.ready {
                println!("{} is ready for export", id);
            }
            for issue in &readiness.issues {
                println!("- {}", issue);
            }
            Ok(())
        }

        Commands::Theme { action } => run_theme(action, settings),
    }
}

fn run_theme(action: ThemeAction, settings: &Settings) -> Result<()> {
    let registry = load_registry(settings);
    let storage = FileThemeStorage::default_location()?;
    let mut document = Document::new("about:blank");

    match action {
        ThemeAction::List => {
            for theme in registry.all() {
                let marker = if theme.id == registry.default_id() { "*" } else { " " };
                println!("{} {:<8} {}", marker, theme.id, theme.name);
            }
        }
        ThemeAction::Current => {
            let stored = storage.load();
            println!("{}", registry.resolve(stored.as_deref()).id);
        }
        ThemeAction::Set { id } => {
            let mut engine = ThemeEngine::new(registry, Box::new(storage));
            engine.initialize(&mut document);
            engine.set_theme(&mut document, &id);
            println!("{}", engine.current_theme_id());
        }
        ThemeAction::Keys { keys } => {
            let mut engine = ThemeEngine::new(registry, Box::new(storage));
            engine.initialize(&mut document);
            let mut menu = ThemeMenu::new();
            for name in &keys {
                match MenuKey::from_name(name) {
                    Some(key) => {
                        menu.handle_key(key, &mut engine, &mut document);
                    }
                    None => warn!("Ignoring unknown key: {}", name),
                }
            }
            menu.close(&mut engine, &mut document);
            println!("{}", engine.current_theme_id());
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn read_page(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

fn load_registry(settings: &Settings) -> ThemeRegistry {
    match &settings.theme_file {
        Some(path) => ThemeRegistry::load_or_fallback(path),
        None => ThemeRegistry::builtin(),
    }
}

/// Parse a page snapshot and apply the persisted theme to it. Storage is
/// read once and never written.
fn load_themed_page(path: &Path, settings: &Settings) -> Result<Document> {
    let mut document = Document::from_json(&read_page(path)?)?;
    let stored = FileThemeStorage::default_location()
        .ok()
        .and_then(|storage| storage.load());
    let storage = match stored {
        Some(id) => MemoryThemeStorage::with_value(&id),
        None => MemoryThemeStorage::default(),
    };
    ThemeEngine::new(load_registry(settings), Box::new(storage)).initialize(&mut document);
    Ok(document)
}

fn exporter_for(page: &Path, settings: &Settings) -> Exporter {
    let registry = load_registry(settings);
    let exporter = Exporter::from_settings(settings).with_fallback_theme(registry.default_id());
    match page.parent() {
        Some(dir) => exporter.with_base_dir(dir),
        None => exporter,
    }
}

fn deliver(bytes: &[u8], filename: &str, settings: &Settings) -> Result<()> {
    let path = download_blob(bytes, &settings.resolved_export_dir(), filename)?;
    println!("{}", path.display());
    if settings.open_after_export {
        open_exported(&path);
    }
    Ok(())
}

fn share(link: &str) {
    match copy_link(link) {
        CopyOutcome::Copied => println!("{}\n(copied to clipboard)", link),
        CopyOutcome::Manual(text) => println!("{}", text),
    }
}
