//! In-memory store of fonts under construction
//!
//! Each font lives behind its own mutex. Adding a glyph reads the used
//! code points, resolves the new one, stores the glyph and recompiles the
//! font without releasing that lock, so concurrent adds to one font can
//! never hand out the same code point and the stored binary always
//! matches a complete glyph set. Different fonts never contend.

use super::assembler::{FontArtifact, FontAssembler};
use super::codepoint::{Codepoint, CodepointAllocator, UsedCodepoints};
use crate::core::errors::{GlyphError, GlyphResult};
use crate::path::GlyphPath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontId(u64);

impl fmt::Display for FontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct FontRecord {
    assembler: FontAssembler,
    allocator: CodepointAllocator,
    glyphs: BTreeMap<Codepoint, GlyphPath>,
    artifact: FontArtifact,
    binary: Arc<Vec<u8>>,
}

impl FontRecord {
    fn used_codepoints(&self) -> UsedCodepoints {
        self.glyphs.keys().copied().collect()
    }

    /// Recompile from the current glyph set
    fn rebuild(&mut self) -> GlyphResult<()> {
        let artifact = self
            .assembler
            .assemble(self.glyphs.iter().map(|(cp, path)| (*cp, path.clone())))?;
        let binary = artifact.to_ttf()?;
        self.artifact = artifact;
        self.binary = Arc::new(binary);
        Ok(())
    }
}

/// Fonts keyed by [`FontId`], each guarded by its own lock
#[derive(Default)]
pub struct FontLibrary {
    fonts: RwLock<HashMap<FontId, Arc<Mutex<FontRecord>>>>,
    next_id: AtomicU64,
    /// Seed for reproducible code point allocation
    seed: Option<u64>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocators of new fonts draw from seeded generators
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Create an empty font (just `.notdef`)
    pub fn create_font(&self, assembler: FontAssembler) -> GlyphResult<FontId> {
        let id = FontId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let allocator = match self.seed {
            Some(seed) => CodepointAllocator::seeded(seed.wrapping_add(id.0)),
            None => CodepointAllocator::new(),
        };
        let artifact = assembler.assemble(std::iter::empty())?;
        let binary = Arc::new(artifact.to_ttf()?);
        let record = FontRecord {
            assembler,
            allocator,
            glyphs: BTreeMap::new(),
            artifact,
            binary,
        };

        self.fonts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(record)));
        info!("Created font {}", id);
        Ok(id)
    }

    pub fn remove_font(&self, id: FontId) -> GlyphResult<()> {
        self.fonts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| GlyphError::UnknownFont(id.to_string()))
    }

    pub fn font_ids(&self) -> Vec<FontId> {
        let mut ids: Vec<FontId> = self
            .fonts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    fn record(&self, id: FontId) -> GlyphResult<Arc<Mutex<FontRecord>>> {
        self.fonts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| GlyphError::UnknownFont(id.to_string()))
    }

    /// Run `f` with the font's lock held
    fn with_record<T>(
        &self,
        id: FontId,
        f: impl FnOnce(&mut FontRecord) -> GlyphResult<T>,
    ) -> GlyphResult<T> {
        let record = self.record(id)?;
        let mut guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    /// Add a glyph under `requested` (hex, any accepted form) or a freshly
    /// allocated Private Use Area code point, then recompile the font.
    ///
    /// Nothing is stored if the code point is taken or recompiling fails.
    pub fn add_glyph(
        &self,
        id: FontId,
        requested: Option<&str>,
        path: GlyphPath,
    ) -> GlyphResult<Codepoint> {
        self.with_record(id, |record| {
            let used = record.used_codepoints();
            let codepoint = record.allocator.resolve(requested, &used)?;
            record.glyphs.insert(codepoint, path);
            if let Err(err) = record.rebuild() {
                record.glyphs.remove(&codepoint);
                return Err(err);
            }
            debug!("Font {}: added glyph {}", id, codepoint);
            Ok(codepoint)
        })
    }

    /// Move the glyph at `from` to the code point `to`
    pub fn remap_glyph(&self, id: FontId, from: Codepoint, to: &str) -> GlyphResult<Codepoint> {
        self.with_record(id, |record| {
            let target: Codepoint = to.parse()?;
            if target == from {
                return Ok(target);
            }
            if record.glyphs.contains_key(&target) {
                return Err(GlyphError::DuplicateCodepoint(target));
            }
            let path = record
                .glyphs
                .remove(&from)
                .ok_or(GlyphError::UnknownGlyph(from))?;
            record.glyphs.insert(target, path);
            if let Err(err) = record.rebuild() {
                if let Some(path) = record.glyphs.remove(&target) {
                    record.glyphs.insert(from, path);
                }
                return Err(err);
            }
            debug!("Font {}: moved glyph {} to {}", id, from, target);
            Ok(target)
        })
    }

    pub fn used_codepoints(&self, id: FontId) -> GlyphResult<UsedCodepoints> {
        self.with_record(id, |record| Ok(record.used_codepoints()))
    }

    /// The most recently compiled TrueType binary
    pub fn font_binary(&self, id: FontId) -> GlyphResult<Arc<Vec<u8>>> {
        self.with_record(id, |record| Ok(record.binary.clone()))
    }

    pub fn artifact(&self, id: FontId) -> GlyphResult<FontArtifact> {
        self.with_record(id, |record| Ok(record.artifact.clone()))
    }
}
