//! Application runner logic
//!
//! Handles the different ways to run glyphwright: one function per
//! subcommand, all reporting through `anyhow`.

use crate::core::cli::{BuildArgs, CliArgs, Command, ImportArgs, TraceArgs};
use crate::core::config_file::ConfigFile;
use crate::data::save_ufo;
use crate::font_source::{Codepoint, FontAssembler, FontLibrary};
use crate::logging;
use crate::path::{import_svg, GlyphPath};
use crate::raster::PixelGrid;
use crate::vectorize::{vectorize_with_timeout, BudgetReport, Degradation, VectorizeOptions};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Create and run the application with the given CLI arguments.
/// Handles special CLI flags and delegates to the subcommand runners.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    cli_args.validate().map_err(|message| anyhow!(message))?;
    let _log_guard = logging::init_logging(cli_args.verbose, cli_args.log_file)?;

    if cli_args.new_config {
        ConfigFile::initialize_config_directory()
            .context("Failed to initialize config directory")?;
        if cli_args.command.is_none() {
            return Ok(());
        }
    }

    let config = ConfigFile::load().unwrap_or_default();
    match &cli_args.command {
        Some(Command::Trace(args)) => run_trace(args, &config),
        Some(Command::Import(args)) => run_import(args),
        Some(Command::Build(args)) => run_build(args, &config).map(|_| ()),
        None => Ok(()),
    }
}

/// What `trace --json` prints
#[derive(Debug, Serialize)]
pub struct TraceSummary {
    pub output: PathBuf,
    pub degradations: Vec<Degradation>,
    pub report: BudgetReport,
}

pub fn run_trace(args: &TraceArgs, config: &ConfigFile) -> Result<()> {
    let options = args.vectorize.vectorize_options(config);
    let runtime = blocking_runtime()?;
    let grid = load_pixel_grid(&args.image)?;
    let outcome = runtime
        .block_on(vectorize_with_timeout(grid, options))
        .with_context(|| format!("Failed to vectorize {}", args.image.display()))?;

    let output = args.output_path();
    fs::write(&output, outcome.to_svg())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let summary = TraceSummary {
        output,
        degradations: outcome.degradations,
        report: outcome.report,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_trace_summary(&summary);
    }
    Ok(())
}

fn print_trace_summary(summary: &TraceSummary) {
    let report = &summary.report;
    println!("Wrote {}", summary.output.display());
    println!(
        "  {} bytes of {} budget, {} contours, {} rounds, epsilon {:.2}",
        report.serialized_len, report.budget, report.contour_count, report.rounds, report.epsilon
    );
    if report.downscaled {
        println!(
            "  traced at {}x{} after downscaling",
            report.working_width, report.working_height
        );
    }
    for degradation in &summary.degradations {
        match degradation.as_error() {
            Some(error) => warn!("{}: {}", summary.output.display(), error),
            None => warn!("{}: {:?}", summary.output.display(), degradation),
        }
    }
}

pub fn run_import(args: &ImportArgs) -> Result<()> {
    let path = load_svg(&args.svg)?;
    let svg = path.to_svg();
    match &args.output {
        Some(output) => {
            fs::write(output, svg).with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {}", output.display());
        }
        None => println!("{svg}"),
    }
    Ok(())
}

/// Build the font and return the code point given to each input, in
/// input order (explicit `--glyph` entries first).
pub fn run_build(args: &BuildArgs, config: &ConfigFile) -> Result<Vec<(PathBuf, Codepoint)>> {
    let options = args.vectorize.vectorize_options(config);
    let family = args.family.as_deref().unwrap_or_else(|| config.family_name());
    let mut metrics = config.font_metrics();
    if let Some(advance_width) = args.advance_width {
        metrics = metrics.with_advance_width(advance_width);
    }

    let library = match args.seed {
        Some(seed) => FontLibrary::seeded(seed),
        None => FontLibrary::new(),
    };
    let assembler = FontAssembler::new(family)
        .with_style(args.style.as_str())
        .with_metrics(metrics);
    let font = library.create_font(assembler)?;
    let runtime = blocking_runtime()?;

    let requests = args
        .glyph
        .iter()
        .map(|spec| (spec.file.as_path(), Some(spec.codepoint.as_str())))
        .chain(args.files.iter().map(|file| (file.as_path(), None)));

    let mut assigned = Vec::new();
    for (file, requested) in requests {
        let path = glyph_path_for_file(&runtime, file, &options)?;
        let codepoint = library
            .add_glyph(font, requested, path)
            .with_context(|| format!("Failed to add {}", file.display()))?;
        println!("U+{}  {}", codepoint, file.display());
        assigned.push((file.to_path_buf(), codepoint));
    }

    let binary = library.font_binary(font)?;
    fs::write(&args.output, binary.as_slice())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Wrote {} ({} glyphs)", args.output.display(), assigned.len() + 1);

    if let Some(ufo) = &args.ufo {
        save_ufo(&library.artifact(font)?, ufo)?;
        println!("Wrote {}", ufo.display());
    }
    Ok(assigned)
}

/// SVG inputs are imported; anything else is decoded and vectorized
fn glyph_path_for_file(
    runtime: &Runtime,
    file: &Path,
    options: &VectorizeOptions,
) -> Result<GlyphPath> {
    if is_svg(file) {
        return load_svg(file);
    }
    let grid = load_pixel_grid(file)?;
    let outcome = runtime
        .block_on(vectorize_with_timeout(grid, options.clone()))
        .with_context(|| format!("Failed to vectorize {}", file.display()))?;
    if outcome.is_degraded() {
        warn!("{} was degraded: {:?}", file.display(), outcome.degradations);
    }
    Ok(outcome.path)
}

fn is_svg(file: &Path) -> bool {
    file.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

fn load_svg(file: &Path) -> Result<GlyphPath> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    import_svg(&text).with_context(|| format!("Failed to import {}", file.display()))
}

/// Decode a PNG or JPEG into an RGBA grid
pub fn load_pixel_grid(file: &Path) -> Result<PixelGrid> {
    let image = image::open(file)
        .with_context(|| format!("Failed to decode {}", file.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(PixelGrid::from_rgba(width, height, image.into_raw())?)
}

fn blocking_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("Failed to start the conversion runtime")
}
