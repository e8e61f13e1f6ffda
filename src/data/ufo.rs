//! UFO file I/O operations

use crate::font_source::FontArtifact;
use anyhow::{Context, Result};
use norad::Font;
use std::path::Path;
use tracing::info;

/// Load a UFO font file from disk
pub fn load_ufo_from_path(path: impl AsRef<Path>) -> Result<Font> {
    let path = path.as_ref();
    let font = Font::load(path).with_context(|| format!("loading UFO {}", path.display()))?;
    Ok(font)
}

/// Write `artifact` as a UFO source package at `path`
pub fn save_ufo(artifact: &FontArtifact, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    artifact
        .to_norad_font()
        .save(path)
        .with_context(|| format!("saving UFO {}", path.display()))?;
    info!(
        "Saved UFO source with {} glyphs to {}",
        artifact.glyph_count(),
        path.display()
    );
    Ok(())
}
