//! Streamline annotation CLI - emits one annotation per invocation.
//!
//! Handy for annotating shell scripts and benchmarks. See the
//! `streamline_annotate` library for the encoder itself.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamline_annotate::{AnnotateError, Annotator, Color, Config};

// CLI
#[derive(Parser)]
#[command(name = "streamline-annotate")]
#[command(version)]
#[command(about = "Emit Streamline annotations from the command line")]
struct Cli {
    /// Annotation device or file (overrides config and STREAMLINE_ANNOTATE_PATH)
    #[arg(long, global = true)]
    sink: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail if the sink is unavailable or the write fails
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Text annotation; with no message and no colour, ends the channel's annotation
    Annotate {
        /// Channel number
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        channel: i32,
        /// Colour name, #rrggbb or r,g,b
        #[arg(long)]
        color: Option<Color>,
        /// Annotation text
        message: Option<String>,
    },
    /// End the annotation on a channel
    End {
        /// Channel number
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        channel: i32,
    },
    /// Name a channel and bind it to a group
    #[command(allow_negative_numbers = true)]
    NameChannel {
        /// Channel number
        channel: i32,
        /// Group number
        group: i32,
        /// Channel name
        name: Option<String>,
    },
    /// Name a group
    #[command(allow_negative_numbers = true)]
    NameGroup {
        /// Group number
        group: i32,
        /// Group name
        name: Option<String>,
    },
    /// Image annotation
    Visual {
        /// Text label
        #[arg(long)]
        label: Option<String>,
        /// Image file (PNG, GIF, TIFF, JPEG, BMP)
        image: Option<PathBuf>,
    },
    /// Point-in-time marker
    Marker {
        /// Colour name, #rrggbb or r,g,b
        #[arg(long)]
        color: Option<Color>,
        /// Marker text
        message: Option<String>,
    },
    /// Print the effective configuration as JSON
    Config,
}

/// Resolve configuration: file (or defaults), env overrides, then `--sink`.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load(),
    };
    if let Some(sink) = &cli.sink {
        config.sink_path.clone_from(sink);
        config.enabled = true;
    }
    Ok(config)
}

/// Emit the record for `cli.command`.
///
/// The outer error is a local failure (an unreadable image file) that is
/// reported regardless of `--strict`; the inner one is the annotation result.
fn emit(cli: &Cli, annotator: &Annotator) -> Result<Result<(), AnnotateError>> {
    let result = match &cli.command {
        Commands::Annotate { channel, color, message } => {
            annotator.try_annotate_channel_color(*channel, *color, message.as_deref())
        }
        Commands::End { channel } => annotator.try_annotate_channel_color(*channel, None, None),
        Commands::NameChannel { channel, group, name } => {
            annotator.try_name_channel(*channel, *group, name.as_deref())
        }
        Commands::NameGroup { group, name } => annotator.try_name_group(*group, name.as_deref()),
        Commands::Visual { label, image } => {
            let image = image
                .as_ref()
                .map(|path| {
                    std::fs::read(path)
                        .with_context(|| format!("Failed to read image {}", path.display()))
                })
                .transpose()?;
            annotator.try_visual(label.as_deref(), image.as_deref())
        }
        Commands::Marker { color, message } => {
            annotator.try_marker_color_str(*color, message.as_deref())
        }
        // Printed by `run` before any sink is opened.
        Commands::Config => Ok(()),
    };
    Ok(result)
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;

    if matches!(cli.command, Commands::Config) {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let annotator = Annotator::from_config(&config);
    log::debug!(
        "Annotating to {} (enabled: {})",
        config.sink_path.display(),
        annotator.is_enabled()
    );
    if cli.strict && !annotator.is_enabled() {
        bail!(
            "Annotation sink {} is unavailable",
            config.sink_path.display()
        );
    }

    match emit(cli, &annotator)? {
        Ok(()) => Ok(()),
        Err(e) if cli.strict => Err(e).context("Failed to emit annotation"),
        Err(e) => {
            log::warn!("Annotation dropped: {e}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    run(&cli)
}
