//! webprep CLI: command-line interface for preparing website assets.
//!
//! Usage:
//!   webprep thumbs [OPTIONS]     Generate compressed thumbnails
//!   webprep resize [OPTIONS]     Shrink a folder of images by a factor
//!   webprep variants [OPTIONS]   Write .webp/.avif siblings for jpg/png files
//!   webprep fonts [FILES]...     Convert OpenType fonts to WOFF2
//!   webprep type <FILE>          Replay a text file as paced keystrokes
//!   webprep config show|init     Inspect or create the config file
//!   webprep check                Check system capabilities

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use webprep_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "webprep",
    about = "Prepare images, fonts and demo typing for a website",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type a text file into the focused window like a person would
    Type {
        /// File whose lines are typed
        file: PathBuf,

        /// Time to switch to the target window before typing starts
        #[arg(long)]
        start_delay_ms: Option<u64>,

        /// Print the typing schedule without sending keystrokes
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate compressed thumbnails for image folders
    Thumbs {
        /// Directory the folders are relative to
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Folder to process (repeatable; "." is the base directory itself)
        #[arg(long = "folder")]
        folders: Vec<String>,

        /// Thumbnail output directory, relative to the base directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Maximum thumbnail width in pixels
        #[arg(long)]
        max_width: Option<u32>,

        /// Encoder quality (0-100)
        #[arg(short, long)]
        quality: Option<u8>,

        /// Output format: webp|jpg|png|avif
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Shrink every image in a folder by a fixed factor
    Resize {
        /// Folder of source images
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Folder for resized copies
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Scale factor applied to both dimensions
        #[arg(short, long)]
        scale: Option<f64>,
    },

    /// Write .webp and .avif siblings next to every jpg/png under a tree
    Variants {
        /// Root of the image tree
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// WebP quality (0-100)
        #[arg(long)]
        webp_quality: Option<u8>,

        /// AVIF quality (0-100)
        #[arg(long)]
        avif_quality: Option<u8>,
    },

    /// Convert OpenType/TrueType fonts to WOFF2
    Fonts {
        /// Font files (defaults to the configured list)
        files: Vec<PathBuf>,

        /// Write .woff2 files here instead of next to each font
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Brotli quality (0-11)
        #[arg(short, long)]
        quality: Option<u32>,

        /// Decode each output and compare it with its source
        #[arg(long)]
        verify: bool,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check system capabilities
    Check,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `config init` must work even when the existing file is broken.
    let config = match &cli.command {
        Commands::Config {
            action: ConfigAction::Init { .. },
        } => AppConfig::default(),
        _ => load_config(cli.config.as_ref())?,
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    webprep_common::logging::init_logging(&logging);
    tracing::debug!(config = ?cli.config, level = %logging.level, "Logging initialized");

    match cli.command {
        Commands::Type {
            file,
            start_delay_ms,
            dry_run,
        } => commands::type_text::run(config, file, start_delay_ms, dry_run).await,
        Commands::Thumbs {
            base_dir,
            folders,
            output_dir,
            max_width,
            quality,
            format,
        } => commands::thumbs::run(
            config, base_dir, folders, output_dir, max_width, quality, format,
        ),
        Commands::Resize {
            input_dir,
            output_dir,
            scale,
        } => commands::resize::run(config, input_dir, output_dir, scale),
        Commands::Variants {
            root,
            webp_quality,
            avif_quality,
        } => commands::variants::run(config, root, webp_quality, avif_quality),
        Commands::Fonts {
            files,
            out_dir,
            quality,
            verify,
        } => commands::fonts::run(config, files, out_dir, quality, verify),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config, cli.config.as_deref()),
            ConfigAction::Init { force } => commands::config::init(cli.config.as_deref(), force),
        },
        Commands::Check => commands::check::run(&config, cli.config.as_deref()),
    }
}
