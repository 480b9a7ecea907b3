//! `roster-ingest` CLI - Turn typed lists and roster photos into player names

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use roster_ingest::AppConfig;

#[derive(Parser)]
#[command(name = "roster-ingest")]
#[command(about = "Player name ingestion from typed lists and roster photos")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/roster-ingest/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Lines, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a typed list of names (comma or backtick separated)
    Text {
        /// Names to split; read from stdin when omitted
        raw: Option<String>,
    },

    /// Read names from roster photos
    Image {
        /// Image files (PNG, JPEG, or anything the engine accepts)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Recognition language (e.g. eng, eng+deu)
        #[arg(short, long)]
        lang: Option<String>,

        /// Page segmentation mode (0-13)
        #[arg(long)]
        psm: Option<u8>,

        /// Use the lenient noise policy for handwritten rosters
        #[arg(long)]
        handwriting: bool,

        /// Names expected on the roster, comma or backtick separated
        #[arg(short, long)]
        expect: Option<String>,

        /// Fail unless at least this many expected names are found
        #[arg(long, requires = "expect")]
        min_recall: Option<usize>,

        /// Also print rejected OCR lines to stderr
        #[arg(long)]
        show_rejected: bool,
    },
}

/// How names are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One name per line
    Lines,
    /// JSON array of strings
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Text { raw } => {
            cmd::text::cmd_text(raw.as_deref(), cli.format)?;
        }
        Commands::Image {
            paths,
            lang,
            psm,
            handwriting,
            expect,
            min_recall,
            show_rejected,
        } => {
            let options = cmd::image::ImageOptions {
                lang,
                psm,
                handwriting,
                expect,
                min_recall,
                show_rejected,
            };
            cmd::image::cmd_image(&paths, &options, config, cli.format).await?;
        }
    }

    Ok(())
}
