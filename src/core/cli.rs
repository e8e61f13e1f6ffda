//! Command line interface for glyphwright
//!
//! Handles parsing command line arguments and provides
//! validation for user inputs. Many CLI options are documented with
//! examples to help users understand the expected format.

use crate::core::config_file::ConfigFile;
use crate::raster::Threshold;
use crate::vectorize::VectorizeOptions;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// glyphwright CLI arguments
///
/// Examples:
///   glyphwright trace stamp.png -o stamp.svg          # Vectorize one image
///   glyphwright trace stamp.png --budget 4096 --json  # Tight budget, JSON report
///   glyphwright import logo.svg -o clean.svg          # Sanitize a vector glyph
///   glyphwright build --family Stamps -o stamps.ttf a.png b.svg
///   glyphwright build -o icons.ttf --glyph 0041=a.png --ufo icons.ufo
///   glyphwright --new-config                          # Write ~/.config/glyphwright
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "glyphwright",
    version,
    about = "Turn glyph images into size-bounded vector outlines and TrueType fonts",
    long_about = "glyphwright traces raster glyph images into single-colour SVG outlines that fit a byte budget, cleans caller-supplied SVG glyphs, and assembles glyph sets into TrueType fonts with automatic Private Use Area code points."
)]
pub struct CliArgs {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to ~/.config/glyphwright/logs/
    #[clap(long = "log-file", global = true)]
    pub log_file: bool,

    /// Initialize user configuration directory with default settings
    ///
    /// This creates the ~/.config/glyphwright directory with:
    /// - settings.json: budget, timeout, threshold and font defaults
    /// - logs/: destination of `--log-file`
    #[clap(
        long = "new-config",
        help = "Initialize user config directory with default settings",
        long_help = "Initialize the ~/.config/glyphwright directory with a settings.json file holding every default and a logs/ directory. Values in settings.json apply whenever the matching command line flag is absent."
    )]
    pub new_config: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Vectorize a PNG or JPEG glyph image into an SVG outline
    Trace(TraceArgs),
    /// Sanitize an SVG glyph and normalize it to a single outline
    Import(ImportArgs),
    /// Assemble images and SVGs into a TrueType font
    Build(BuildArgs),
}

/// Pipeline flags shared by `trace` and `build`
#[derive(Args, Debug, Clone, Default)]
pub struct VectorizeArgs {
    /// Maximum size of one serialized glyph, in bytes
    #[clap(long = "budget", value_name = "BYTES")]
    pub budget: Option<usize>,

    /// Luminance cut-off: "auto" (Otsu) or 0-255
    #[clap(long = "threshold", value_name = "auto|0-255", value_parser = parse_threshold)]
    pub threshold: Option<Threshold>,

    /// Give up on one image after this many seconds
    #[clap(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl VectorizeArgs {
    /// Resolve pipeline options
    ///
    /// Priority order:
    /// 1. CLI argument
    /// 2. Config file setting (~/.config/glyphwright/settings.json)
    /// 3. Built-in default
    pub fn vectorize_options(&self, config: &ConfigFile) -> VectorizeOptions {
        let mut options = config.vectorize_options();
        if let Some(budget) = self.budget {
            debug!("Using budget from CLI: {}", budget);
            options.budget.max_bytes = budget;
        }
        if let Some(threshold) = self.threshold {
            options.threshold = threshold;
        }
        if let Some(secs) = self.timeout {
            options.timeout = Duration::from_secs(secs);
        }
        options
    }
}

#[derive(Args, Debug, Clone)]
pub struct TraceArgs {
    /// PNG or JPEG image to vectorize
    pub image: PathBuf,

    /// Where to write the SVG (defaults to the image path with .svg)
    #[clap(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[clap(flatten)]
    pub vectorize: VectorizeArgs,

    /// Print the budget report as JSON
    #[clap(long = "json")]
    pub json: bool,
}

impl TraceArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.image.with_extension("svg"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// SVG file, or a bare <path> fragment
    pub svg: PathBuf,

    /// Where to write the cleaned SVG (defaults to stdout)
    #[clap(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// An explicit code point assignment, written `CODEPOINT=FILE`
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSpec {
    pub codepoint: String,
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Family name (falls back to settings.json, then "Untitled")
    #[clap(long = "family")]
    pub family: Option<String>,

    /// Style name written to the name table
    #[clap(long = "style", default_value = "Regular")]
    pub style: String,

    /// Where to write the TrueType font
    #[clap(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Also write the glyph set as a UFO source
    #[clap(long = "ufo", value_name = "DIR")]
    pub ufo: Option<PathBuf>,

    /// Add FILE at CODEPOINT (hex, e.g. 0041 or U+E000); repeatable
    #[clap(long = "glyph", value_name = "CODEPOINT=FILE", value_parser = parse_glyph_spec)]
    pub glyph: Vec<GlyphSpec>,

    /// Advance width of every glyph, in font units
    #[clap(long = "advance-width")]
    pub advance_width: Option<u16>,

    /// Seed for reproducible Private Use Area assignment
    #[clap(long = "seed")]
    pub seed: Option<u64>,

    #[clap(flatten)]
    pub vectorize: VectorizeArgs,

    /// Images or SVGs placed at automatically allocated code points
    pub files: Vec<PathBuf>,
}

impl BuildArgs {
    pub fn inputs(&self) -> impl Iterator<Item = &Path> {
        self.glyph
            .iter()
            .map(|spec| spec.file.as_path())
            .chain(self.files.iter().map(PathBuf::as_path))
    }
}

fn parse_threshold(value: &str) -> Result<Threshold, String> {
    Threshold::parse(value).ok_or_else(|| format!("expected \"auto\" or 0-255, got '{value}'"))
}

fn parse_glyph_spec(value: &str) -> Result<GlyphSpec, String> {
    match value.split_once('=') {
        Some((codepoint, file)) if !codepoint.trim().is_empty() && !file.is_empty() => {
            Ok(GlyphSpec {
                codepoint: codepoint.trim().to_string(),
                file: PathBuf::from(file),
            })
        }
        _ => Err(format!("expected CODEPOINT=FILE, got '{value}'")),
    }
}

fn check_file(path: &Path) -> Result<(), String> {
    if !path.is_file() {
        return Err(format!(
            "Input file does not exist: {}\nMake sure the path is correct and the file exists.",
            path.display()
        ));
    }
    Ok(())
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// This ensures that all input paths exist before any work starts,
    /// providing clear error messages for common mistakes.
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            None if self.new_config => Ok(()),
            None => Err("No command given.\nUse one of: trace, import, build.".to_string()),
            Some(Command::Trace(args)) => check_file(&args.image),
            Some(Command::Import(args)) => check_file(&args.svg),
            Some(Command::Build(args)) => {
                if args.glyph.is_empty() && args.files.is_empty() {
                    return Err(
                        "Nothing to build: pass image/SVG files or --glyph CODEPOINT=FILE"
                            .to_string(),
                    );
                }
                args.inputs().try_for_each(check_file)
            }
        }
    }
}
