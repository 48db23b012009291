mod db;
mod document;
mod notify;
mod parser;
mod preview;
mod profile;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::parser::Extractor;
use crate::profile::Profile;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "folio_parser", about = "Résumé to structured portfolio profile extractor")]
struct Cli {
    /// Settings file (TOML); FOLIO_* environment variables override it
    #[arg(long, global = true, default_value = settings::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract profiles from résumé files and print them as JSON (no network)
    Extract {
        /// PDF or text résumés
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Build the profile for one résumé: extract, fetch project previews, cache
    Build {
        file: PathBuf,
        /// Ignore the cached profile and rebuild
        #[arg(long)]
        refresh: bool,
        /// Skip project preview images
        #[arg(long)]
        no_images: bool,
    },
    /// Print the cached profile for a résumé
    Show { file: PathBuf },
    /// Send a contact message to the profile owner (stored locally if mail fails)
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
        /// Résumé whose cached contact e-mail receives the message
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// List contact messages kept in local storage
    Messages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    let result = match cli.command {
        Commands::Extract { files, pretty } => {
            let extractor = Extractor::new(settings.vocabulary.clone());
            let results: Vec<_> = files
                .par_iter()
                .map(|path| {
                    document::load_document(path).map(|doc| extractor.extract(&doc.text))
                })
                .collect();

            let mut failed = 0usize;
            for (path, result) in files.iter().zip(results) {
                match result {
                    Ok(profile) => print_profile(&profile, pretty)?,
                    Err(e) => {
                        warn!(file = %path.display(), "Extraction failed: {:#}", e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} files could not be read", failed, files.len());
            }
            Ok(())
        }
        Commands::Build {
            file,
            refresh,
            no_images,
        } => {
            let conn = db::connect(&settings.database_path)?;
            db::init_schema(&conn)?;
            let source = source_key(&file);

            if !refresh {
                if let Some(profile) = db::load_profile(&conn, &source)? {
                    info!(source = %source, "Using cached profile");
                    print_profile(&profile, true)?;
                    return Ok(());
                }
            }

            let doc = document::load_document(&file)?;
            let extractor = Extractor::new(settings.vocabulary.clone());
            let mut profile = extractor.extract(&doc.text);
            println!(
                "Extracted {} from {}: {} projects, {} journey items",
                profile.name,
                doc.source.display(),
                profile.projects.len(),
                profile.journey.len()
            );

            if !no_images {
                let source_impl = Arc::new(preview::HttpPreview::new(&settings.preview)?);
                let stats = preview::enrich_projects(
                    &mut profile.projects,
                    source_impl,
                    &settings.image_dir,
                    settings.preview.concurrency,
                )
                .await?;
                println!(
                    "Previews: {} projects ({} saved, {} remote)",
                    stats.total, stats.saved, stats.remote
                );
            }

            db::save_profile(&conn, &source, &profile)?;
            print_profile(&profile, true)?;
            Ok(())
        }
        Commands::Show { file } => {
            let conn = db::connect(&settings.database_path)?;
            db::init_schema(&conn)?;
            match db::load_profile(&conn, &source_key(&file))? {
                Some(profile) => print_profile(&profile, true)?,
                None => println!("No cached profile for {}. Run 'build' first.", file.display()),
            }
            Ok(())
        }
        Commands::Contact {
            name,
            email,
            message,
            source,
        } => {
            let form = notify::ContactForm::new(&name, &email, &message)?;
            let conn = db::connect(&settings.database_path)?;
            db::init_schema(&conn)?;

            let cached = match &source {
                Some(path) => db::load_profile(&conn, &source_key(path))?,
                None => None,
            };
            let recipient = cached
                .map(|p| p.contact_email)
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| settings.vocabulary.fallback_email.clone());

            let notifier = notify::SmtpNotifier::new(settings.smtp.clone());
            match notify::deliver(&conn, &notifier, &form, &recipient).await? {
                notify::Delivery::Sent => println!("Message sent to {}.", recipient),
                notify::Delivery::Stored => println!("Mail unavailable; message stored locally."),
            }
            Ok(())
        }
        Commands::Messages => {
            let conn = db::connect(&settings.database_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_messages(&conn)?;
            if rows.is_empty() {
                println!("No stored messages.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<19} | {:<20} | {:<28} | {:<24} | {:<40}",
                "#", "Received", "Name", "Email", "To", "Message"
            );
            println!("{}", "-".repeat(149));
            for r in &rows {
                println!(
                    "{:>4} | {:<19} | {:<20} | {:<28} | {:<24} | {:<40}",
                    r.id,
                    r.created_at,
                    truncate(&r.name, 20),
                    truncate(&r.email, 28),
                    truncate(&r.recipient, 24),
                    truncate(&r.message.replace('\n', " "), 40)
                );
            }
            println!("\n{} stored messages", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Cache key for a résumé: its canonical path when it exists.
fn source_key(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn print_profile(profile: &Profile, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(profile)
    } else {
        serde_json::to_string(profile)
    }
    .context("Failed to serialize profile")?;
    println!("{}", json);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
