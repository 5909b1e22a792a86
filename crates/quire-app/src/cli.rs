// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: argument parsing and the `export` command.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use quire_core::ExportConfig;
use quire_core::error::{QuireError, Result};
use quire_core::types::{ChapterId, ExportFormat, ExportRequest, StoryId};
use quire_export::Exporter;
use quire_store::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "quire")]
#[command(version, about = "Export story chapters to DOCX or PDF", long_about = None)]
#[command(after_help = "EXAMPLES:
    quire export pdf --store story.json --story 1
    quire export docx --store story.json --chapter 4 --chapter 2 --out-dir out")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render chapters into a single document
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output format (docx or pdf)
    #[arg(value_name = "FORMAT")]
    pub format: String,

    /// JSON store snapshot to read stories, chapters and entities from
    #[arg(long, value_name = "FILE")]
    pub store: PathBuf,

    /// Story to export; also supplies the document title
    #[arg(long, value_name = "ID")]
    pub story: Option<u64>,

    /// Chapter to export; repeat for several
    #[arg(long = "chapter", value_name = "ID")]
    pub chapters: Vec<u64>,

    /// Directory uploaded images are read from
    #[arg(long, value_name = "DIR")]
    pub uploads: Option<PathBuf>,

    /// JSON export configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory the document is written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
}

impl ExportArgs {
    fn request(&self) -> ExportRequest {
        ExportRequest {
            story_id: self.story.map(StoryId),
            chapter_ids: (!self.chapters.is_empty())
                .then(|| self.chapters.iter().copied().map(ChapterId).collect()),
        }
    }

    fn export_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load(path)?,
            None => ExportConfig::default(),
        };
        if let Some(uploads) = &self.uploads {
            config.upload_dir = uploads.clone();
        }
        debug!(?config, "export configuration");
        Ok(config)
    }
}

/// What a successful export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub path: PathBuf,
    pub content_type: String,
    pub bytes: usize,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} bytes)",
            self.path.display(),
            self.content_type,
            self.bytes
        )
    }
}

/// Process exit status for a failed command.
pub fn exit_code(err: &QuireError) -> u8 {
    if err.is_client_error() { 2 } else { 1 }
}

pub fn run(cli: Cli) -> Result<Report> {
    match cli.command {
        Command::Export(args) => export(&args),
    }
}

fn export(args: &ExportArgs) -> Result<Report> {
    if ExportFormat::from_key(&args.format).is_none() {
        return Err(QuireError::UnsupportedFormat(args.format.clone()));
    }
    let config = args.export_config()?;
    let store = MemoryStore::open(&args.store)?;
    let exporter = Exporter::new(&store, config);

    let document = exporter.export(&args.format, &args.request())?;

    std::fs::create_dir_all(&args.out_dir)?;
    let path = args.out_dir.join(&document.filename);
    std::fs::write(&path, &document.bytes)?;
    info!(path = %path.display(), "document written");

    Ok(Report {
        path,
        content_type: document.content_type,
        bytes: document.bytes.len(),
    })
}
