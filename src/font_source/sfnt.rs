//! TrueType (`glyf` flavour) font writer
//!
//! Emits exactly the tables a simple monospaced font needs:
//! `OS/2 cmap glyf head hhea hmtx loca maxp name post`. Glyphs are simple
//! (no composites, no hinting instructions) and `loca` is always long.
//!
//! Table layout follows OpenType: tables are 4-byte aligned and
//! sorted by tag, table checksums are computed over zero-padded data,
//! and `head.checkSumAdjustment` makes the whole file sum to 0xB1B0AFBA.

use super::metrics::FontMetrics;
use crate::core::errors::{GlyphError, GlyphResult};
use tracing::{debug, warn};

/// The largest glyph count a TrueType font can address
pub const MAX_GLYPHS: usize = 65_535;
/// Points per glyph: end indices and `maxp.maxPoints` are 16-bit
pub const MAX_OUTLINE_POINTS: usize = u16::MAX as usize;
/// Contours per glyph: `numberOfContours` is a signed 16-bit count
pub const MAX_OUTLINE_CONTOURS: usize = i16::MAX as usize;

const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;
const HEAD_MAGIC: u32 = 0x5F0F_3CF5;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;
/// Offset of `checkSumAdjustment` inside `head`
const HEAD_ADJUSTMENT_OFFSET: usize = 8;
/// Seconds from the 1904 epoch used by `head` to the Unix epoch
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

const FLAG_ON_CURVE: u8 = 0x01;

/// Highest format 4 segment count whose subtable length fits in 16 bits
const MAX_FORMAT4_SEGMENTS: usize = (u16::MAX as usize - 16) / 8;

/// Windows platform, Unicode encodings, US English
const PLATFORM_WINDOWS: u16 = 3;
const ENCODING_UNICODE_BMP: u16 = 1;
const ENCODING_UNICODE_FULL: u16 = 10;
const LANGUAGE_EN_US: u16 = 0x0409;

/// Big-endian append helpers
trait WriteBe {
    fn put_u8(&mut self, v: u8);
    fn put_u16(&mut self, v: u16);
    fn put_i16(&mut self, v: i16);
    fn put_u32(&mut self, v: u32);
    fn put_i64(&mut self, v: i64);
}

impl WriteBe for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }
    fn put_u16(&mut self, v: u16) {
        self.extend_from_slice(&v.to_be_bytes());
    }
    fn put_i16(&mut self, v: i16) {
        self.extend_from_slice(&v.to_be_bytes());
    }
    fn put_u32(&mut self, v: u32) {
        self.extend_from_slice(&v.to_be_bytes());
    }
    fn put_i64(&mut self, v: i64) {
        self.extend_from_slice(&v.to_be_bytes());
    }
}

/// A point of a TrueType outline, in font units (y up)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlinePoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub fn on(x: i16, y: i16) -> Self {
        Self { x, y, on_curve: true }
    }

    pub fn off(x: i16, y: i16) -> Self {
        Self { x, y, on_curve: false }
    }
}

/// Glyph bounding box in font units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphBounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl GlyphBounds {
    fn union(self, other: GlyphBounds) -> GlyphBounds {
        GlyphBounds {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    fn width(&self) -> i32 {
        self.x_max as i32 - self.x_min as i32
    }
}

/// A simple (non-composite) glyph outline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleGlyph {
    contours: Vec<Vec<OutlinePoint>>,
}

impl SimpleGlyph {
    /// Empty contours are dropped
    pub fn new(contours: Vec<Vec<OutlinePoint>>) -> Self {
        Self {
            contours: contours.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }

    pub fn contours(&self) -> &[Vec<OutlinePoint>] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Vec::len).sum()
    }

    pub fn bounds(&self) -> Option<GlyphBounds> {
        self.contours.iter().flatten().fold(None, |acc, p| {
            let b = GlyphBounds {
                x_min: p.x,
                y_min: p.y,
                x_max: p.x,
                y_max: p.y,
            };
            Some(acc.map_or(b, |acc: GlyphBounds| acc.union(b)))
        })
    }

    /// Rejects outlines whose counts would wrap in the 16-bit `glyf` fields
    pub fn check_limits(&self) -> GlyphResult<()> {
        let points = self.point_count();
        let contours = self.contours.len();
        if points > MAX_OUTLINE_POINTS || contours > MAX_OUTLINE_CONTOURS {
            return Err(GlyphError::OutlineTooComplex { points, contours });
        }
        Ok(())
    }

    /// `glyf` entry; empty for a glyph without contours
    fn encode(&self) -> Vec<u8> {
        let Some(bounds) = self.bounds() else {
            return Vec::new();
        };
        let mut data = Vec::new();
        data.put_i16(self.contours.len() as i16);
        data.put_i16(bounds.x_min);
        data.put_i16(bounds.y_min);
        data.put_i16(bounds.x_max);
        data.put_i16(bounds.y_max);

        let mut end = 0usize;
        for contour in &self.contours {
            end += contour.len();
            data.put_u16((end - 1) as u16);
        }
        // No instructions
        data.put_u16(0);

        let points: Vec<&OutlinePoint> = self.contours.iter().flatten().collect();
        // Long (16-bit) deltas throughout: only the on-curve bit is ever set
        for p in &points {
            data.put_u8(if p.on_curve { FLAG_ON_CURVE } else { 0 });
        }
        let mut previous = 0i16;
        for p in &points {
            data.put_i16(p.x.wrapping_sub(previous));
            previous = p.x;
        }
        previous = 0;
        for p in &points {
            data.put_i16(p.y.wrapping_sub(previous));
            previous = p.y;
        }
        data
    }
}

/// One glyph as it goes into the font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRecord {
    pub codepoint: Option<u32>,
    pub advance_width: u16,
    pub outline: SimpleGlyph,
}

/// Serializes a glyph list into a TrueType binary.
///
/// Glyph ids follow slice order; callers put `.notdef` first and keep
/// code points ascending.
#[derive(Debug, Clone)]
pub struct TrueTypeWriter<'a> {
    pub family_name: &'a str,
    pub style_name: &'a str,
    pub metrics: FontMetrics,
    /// Creation time, seconds since the Unix epoch
    pub created: i64,
}

impl TrueTypeWriter<'_> {
    pub fn write(&self, glyphs: &[GlyphRecord]) -> GlyphResult<Vec<u8>> {
        if glyphs.len() > MAX_GLYPHS {
            return Err(GlyphError::TooManyGlyphs(glyphs.len()));
        }
        for glyph in glyphs {
            glyph.outline.check_limits()?;
        }

        let (glyf, loca) = build_glyf_and_loca(glyphs);
        let summary = GlyphSummary::new(glyphs);
        let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"OS/2", self.build_os2(glyphs, &summary)),
            (*b"cmap", build_cmap(glyphs)),
            (*b"glyf", glyf),
            (*b"head", self.build_head(&summary)),
            (*b"hhea", self.build_hhea(glyphs, &summary)),
            (*b"hmtx", build_hmtx(glyphs)),
            (*b"loca", loca),
            (*b"maxp", build_maxp(glyphs.len() as u16, &summary)),
            (*b"name", self.build_name()),
            (*b"post", self.build_post()),
        ];
        tables.sort_by_key(|(tag, _)| *tag);

        let font = write_sfnt(&tables);
        debug!(
            "Wrote TrueType font: {} glyphs, {} bytes",
            glyphs.len(),
            font.len()
        );
        Ok(font)
    }

    fn build_head(&self, summary: &GlyphSummary) -> Vec<u8> {
        let timestamp = self.created + MAC_EPOCH_OFFSET;
        let mut data = Vec::with_capacity(54);
        data.put_u32(0x0001_0000); // version
        data.put_u32(0x0001_0000); // fontRevision
        data.put_u32(0); // checkSumAdjustment, patched after layout
        data.put_u32(HEAD_MAGIC);
        // Baseline at y=0, left sidebearing at x=0, integer ppem scaling
        data.put_u16(0x000B);
        data.put_u16(self.metrics.units_per_em);
        data.put_i64(timestamp); // created
        data.put_i64(timestamp); // modified
        data.put_i16(summary.bounds.x_min);
        data.put_i16(summary.bounds.y_min);
        data.put_i16(summary.bounds.x_max);
        data.put_i16(summary.bounds.y_max);
        data.put_u16(0); // macStyle
        data.put_u16(8); // lowestRecPPEM
        data.put_i16(2); // fontDirectionHint
        data.put_i16(1); // indexToLocFormat: long
        data.put_i16(0); // glyphDataFormat
        data
    }

    fn build_hhea(&self, glyphs: &[GlyphRecord], summary: &GlyphSummary) -> Vec<u8> {
        let advance_max = glyphs.iter().map(|g| g.advance_width).max().unwrap_or(0);
        let mut min_lsb = i16::MAX;
        let mut min_rsb = i16::MAX;
        let mut max_extent = i16::MIN;
        for glyph in glyphs {
            if let Some(b) = glyph.outline.bounds() {
                min_lsb = min_lsb.min(b.x_min);
                let extent = clamp_i16(b.x_min as i32 + b.width());
                max_extent = max_extent.max(extent);
                min_rsb = min_rsb.min(clamp_i16(glyph.advance_width as i32 - extent as i32));
            }
        }
        if summary.outline_count == 0 {
            (min_lsb, min_rsb, max_extent) = (0, 0, 0);
        }

        let mut data = Vec::with_capacity(36);
        data.put_u32(0x0001_0000);
        data.put_i16(self.metrics.ascender);
        data.put_i16(self.metrics.descender);
        data.put_i16(0); // lineGap
        data.put_u16(advance_max);
        data.put_i16(min_lsb);
        data.put_i16(min_rsb);
        data.put_i16(max_extent);
        data.put_i16(1); // caretSlopeRise
        data.put_i16(0); // caretSlopeRun
        data.put_i16(0); // caretOffset
        for _ in 0..4 {
            data.put_i16(0); // reserved
        }
        data.put_i16(0); // metricDataFormat
        data.put_u16(glyphs.len() as u16); // numberOfHMetrics
        data
    }

    fn build_os2(&self, glyphs: &[GlyphRecord], summary: &GlyphSummary) -> Vec<u8> {
        let m = &self.metrics;
        let upm = m.units_per_em as f64;
        let scaled = |ratio: f64| clamp_i16((upm * ratio).round() as i32);

        let codepoints: Vec<u32> = glyphs.iter().filter_map(|g| g.codepoint).collect();
        let first = codepoints.iter().min().copied().unwrap_or(0).min(0xFFFF) as u16;
        let last = codepoints.iter().max().copied().unwrap_or(0).min(0xFFFF) as u16;
        let mut unicode_range = [0u32; 4];
        if codepoints.iter().any(|&c| c < 0x80) {
            unicode_range[0] |= 1; // Basic Latin
        }
        if codepoints.iter().any(|&c| (0xE000..=0xF8FF).contains(&c)) {
            unicode_range[1] |= 1 << (60 - 32); // Private Use Area
        }
        if codepoints.iter().any(|&c| c > 0xFFFF) {
            unicode_range[1] |= 1 << (57 - 32); // Non-Plane 0
        }

        let mut data = Vec::with_capacity(96);
        data.put_u16(4); // version
        data.put_i16(clamp_i16(m.advance_width as i32)); // xAvgCharWidth
        data.put_u16(400); // usWeightClass
        data.put_u16(5); // usWidthClass
        data.put_u16(0); // fsType: installable
        data.put_i16(scaled(0.65)); // ySubscriptXSize
        data.put_i16(scaled(0.6)); // ySubscriptYSize
        data.put_i16(0); // ySubscriptXOffset
        data.put_i16(scaled(0.075)); // ySubscriptYOffset
        data.put_i16(scaled(0.65)); // ySuperscriptXSize
        data.put_i16(scaled(0.6)); // ySuperscriptYSize
        data.put_i16(0); // ySuperscriptXOffset
        data.put_i16(scaled(0.35)); // ySuperscriptYOffset
        data.put_i16(scaled(0.05)); // yStrikeoutSize
        data.put_i16(scaled(0.25)); // yStrikeoutPosition
        data.put_i16(0); // sFamilyClass
        data.extend_from_slice(&[0u8; 10]); // panose
        for range in unicode_range {
            data.put_u32(range);
        }
        data.extend_from_slice(b"GLWR"); // achVendID
        data.put_u16(0x0040 | 0x0080); // fsSelection: REGULAR | USE_TYPO_METRICS
        data.put_u16(first);
        data.put_u16(last);
        data.put_i16(m.ascender); // sTypoAscender
        data.put_i16(m.descender); // sTypoDescender
        data.put_i16(0); // sTypoLineGap
        let win_ascent = (m.ascender as i32).max(summary.bounds.y_max as i32).max(0);
        let win_descent = (-(m.descender as i32)).max(-(summary.bounds.y_min as i32)).max(0);
        data.put_u16(win_ascent.min(u16::MAX as i32) as u16);
        data.put_u16(win_descent.min(u16::MAX as i32) as u16);
        data.put_u32(1); // ulCodePageRange1: Latin 1
        data.put_u32(0); // ulCodePageRange2
        data.put_i16(scaled(0.5)); // sxHeight
        data.put_i16(scaled(0.7)); // sCapHeight
        data.put_u16(0); // usDefaultChar
        data.put_u16(0x20); // usBreakChar
        data.put_u16(0); // usMaxContext
        data
    }

    fn build_name(&self) -> Vec<u8> {
        let full_name = format!("{} {}", self.family_name, self.style_name);
        let postscript_name = postscript_name(self.family_name, self.style_name);
        let unique_id = format!("1.000;{postscript_name}");
        let entries: [(u16, &str); 6] = [
            (1, self.family_name),
            (2, self.style_name),
            (3, &unique_id),
            (4, &full_name),
            (5, "Version 1.000"),
            (6, &postscript_name),
        ];

        let encoded: Vec<Vec<u8>> = entries
            .iter()
            .map(|(_, text)| text.encode_utf16().flat_map(u16::to_be_bytes).collect())
            .collect();

        let mut data = Vec::new();
        data.put_u16(0); // format
        data.put_u16(entries.len() as u16);
        data.put_u16((6 + entries.len() * 12) as u16); // storage offset
        let mut offset = 0usize;
        for ((name_id, _), bytes) in entries.iter().zip(&encoded) {
            data.put_u16(PLATFORM_WINDOWS);
            data.put_u16(ENCODING_UNICODE_BMP);
            data.put_u16(LANGUAGE_EN_US);
            data.put_u16(*name_id);
            data.put_u16(bytes.len() as u16);
            data.put_u16(offset as u16);
            offset += bytes.len();
        }
        for bytes in &encoded {
            data.extend_from_slice(bytes);
        }
        data
    }

    fn build_post(&self) -> Vec<u8> {
        let upm = self.metrics.units_per_em as i32;
        let mut data = Vec::with_capacity(32);
        data.put_u32(0x0003_0000); // version 3: no glyph names
        data.put_u32(0); // italicAngle
        data.put_i16(clamp_i16(-upm / 10)); // underlinePosition
        data.put_i16(clamp_i16(upm / 20)); // underlineThickness
        data.put_u32(1); // isFixedPitch
        for _ in 0..4 {
            data.put_u32(0); // min/max memory hints
        }
        data
    }
}

/// Font-wide figures derived from the glyph outlines
struct GlyphSummary {
    bounds: GlyphBounds,
    outline_count: usize,
    max_points: u16,
    max_contours: u16,
}

impl GlyphSummary {
    fn new(glyphs: &[GlyphRecord]) -> Self {
        let mut bounds: Option<GlyphBounds> = None;
        let mut outline_count = 0;
        let mut max_points = 0;
        let mut max_contours = 0;
        for glyph in glyphs {
            if let Some(b) = glyph.outline.bounds() {
                bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
                outline_count += 1;
            }
            max_points = max_points.max(glyph.outline.point_count());
            max_contours = max_contours.max(glyph.outline.contours().len());
        }
        Self {
            bounds: bounds.unwrap_or(GlyphBounds {
                x_min: 0,
                y_min: 0,
                x_max: 0,
                y_max: 0,
            }),
            outline_count,
            max_points: max_points as u16,
            max_contours: max_contours as u16,
        }
    }
}

fn build_glyf_and_loca(glyphs: &[GlyphRecord]) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut loca = Vec::with_capacity((glyphs.len() + 1) * 4);
    for glyph in glyphs {
        loca.put_u32(glyf.len() as u32);
        glyf.extend_from_slice(&glyph.outline.encode());
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
    }
    loca.put_u32(glyf.len() as u32);
    (glyf, loca)
}

fn build_hmtx(glyphs: &[GlyphRecord]) -> Vec<u8> {
    let mut data = Vec::with_capacity(glyphs.len() * 4);
    for glyph in glyphs {
        data.put_u16(glyph.advance_width);
        data.put_i16(glyph.outline.bounds().map_or(0, |b| b.x_min));
    }
    data
}

fn build_maxp(num_glyphs: u16, summary: &GlyphSummary) -> Vec<u8> {
    let mut data = Vec::with_capacity(32);
    data.put_u32(0x0001_0000); // version 1.0
    data.put_u16(num_glyphs);
    data.put_u16(summary.max_points);
    data.put_u16(summary.max_contours);
    data.put_u16(0); // maxCompositePoints
    data.put_u16(0); // maxCompositeContours
    data.put_u16(2); // maxZones
    for _ in 0..8 {
        // twilight points, storage, function defs, instruction defs,
        // stack elements, instruction size, component elements and depth
        data.put_u16(0);
    }
    data
}

/// (code point, glyph id) pairs in code point order
fn cmap_entries(glyphs: &[GlyphRecord]) -> Vec<(u32, u16)> {
    let mut entries: Vec<(u32, u16)> = glyphs
        .iter()
        .enumerate()
        .filter_map(|(gid, g)| g.codepoint.map(|cp| (cp, gid as u16)))
        .collect();
    entries.sort_unstable();
    entries
}

/// Runs where both the code point and the glyph id step by one
fn contiguous_runs(entries: &[(u32, u16)]) -> Vec<(u32, u32, u16)> {
    let mut runs: Vec<(u32, u32, u16)> = Vec::new();
    for &(cp, gid) in entries {
        if let Some(last) = runs.last_mut() {
            let next_gid = last.2 as u32 + (last.1 - last.0) + 1;
            if cp == last.1 + 1 && gid as u32 == next_gid {
                last.1 = cp;
                continue;
            }
        }
        runs.push((cp, cp, gid));
    }
    runs
}

/// `cmap` with a format 4 (3,1) subtable for the BMP and a format 12
/// (3,10) subtable covering every code point
fn build_cmap(glyphs: &[GlyphRecord]) -> Vec<u8> {
    let entries = cmap_entries(glyphs);
    let bmp: Vec<(u32, u16)> = entries.iter().copied().filter(|&(cp, _)| cp < 0xFFFF).collect();
    let format4 = build_cmap_format4(&contiguous_runs(&bmp));
    let format12 = build_cmap_format12(&contiguous_runs(&entries));

    let mut data = Vec::with_capacity(20 + format4.len() + format12.len());
    data.put_u16(0); // version
    data.put_u16(2); // numTables
    let header_len = 4 + 2 * 8;
    data.put_u16(PLATFORM_WINDOWS);
    data.put_u16(ENCODING_UNICODE_BMP);
    data.put_u32(header_len as u32);
    data.put_u16(PLATFORM_WINDOWS);
    data.put_u16(ENCODING_UNICODE_FULL);
    data.put_u32((header_len + format4.len()) as u32);
    data.extend_from_slice(&format4);
    data.extend_from_slice(&format12);
    data
}

fn build_cmap_format4(runs: &[(u32, u32, u16)]) -> Vec<u8> {
    let mut runs = runs.to_vec();
    if runs.len() >= MAX_FORMAT4_SEGMENTS {
        warn!(
            "BMP code points need {} cmap segments; the format 4 subtable keeps the first {}",
            runs.len(),
            MAX_FORMAT4_SEGMENTS - 1
        );
        runs.truncate(MAX_FORMAT4_SEGMENTS - 1);
    }
    // Terminating segment
    let mut segments: Vec<(u16, u16, u16)> = runs
        .iter()
        .map(|&(start, end, gid)| {
            let delta = (gid as u32).wrapping_sub(start) as u16;
            (start as u16, end as u16, delta)
        })
        .collect();
    segments.push((0xFFFF, 0xFFFF, 1));

    let seg_count = segments.len() as u16;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = 2 * (1u16 << entry_selector);

    let mut data = Vec::with_capacity(16 + segments.len() * 8);
    data.put_u16(4); // format
    data.put_u16(16 + seg_count * 8); // length
    data.put_u16(0); // language
    data.put_u16(seg_count * 2);
    data.put_u16(search_range);
    data.put_u16(entry_selector);
    data.put_u16(seg_count * 2 - search_range);
    for &(_, end, _) in &segments {
        data.put_u16(end);
    }
    data.put_u16(0); // reservedPad
    for &(start, _, _) in &segments {
        data.put_u16(start);
    }
    for &(_, _, delta) in &segments {
        data.put_u16(delta);
    }
    for _ in &segments {
        data.put_u16(0); // idRangeOffset
    }
    data
}

fn build_cmap_format12(runs: &[(u32, u32, u16)]) -> Vec<u8> {
    let mut data = Vec::with_capacity(16 + runs.len() * 12);
    data.put_u16(12); // format
    data.put_u16(0); // reserved
    data.put_u32((16 + runs.len() * 12) as u32);
    data.put_u32(0); // language
    data.put_u32(runs.len() as u32);
    for &(start, end, gid) in runs {
        data.put_u32(start);
        data.put_u32(end);
        data.put_u32(gid as u32);
    }
    data
}

/// PostScript name: printable ASCII without spaces or delimiters, ≤ 63 bytes
fn postscript_name(family: &str, style: &str) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_ascii_graphic() && !"[](){}<>/%".contains(*c))
            .collect()
    };
    let mut name = clean(family);
    if name.is_empty() {
        name.push_str("Untitled");
    }
    let style = clean(style);
    if !style.is_empty() {
        name.push('-');
        name.push_str(&style);
    }
    name.truncate(63);
    name
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Sum of big-endian u32 words, the final partial word zero-padded
pub fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Lay out the table directory and data, then patch `checkSumAdjustment`
fn write_sfnt(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;

    let mut output = Vec::new();
    output.put_u32(SFNT_VERSION_TRUETYPE);
    output.put_u16(num_tables);
    output.put_u16(search_range);
    output.put_u16(entry_selector);
    output.put_u16(num_tables * 16 - search_range);

    let mut offset = 12 + tables.len() * 16;
    let mut head_offset = None;
    for (tag, data) in tables {
        if tag == b"head" {
            head_offset = Some(offset);
        }
        output.extend_from_slice(tag);
        output.put_u32(table_checksum(data));
        output.put_u32(offset as u32);
        output.put_u32(data.len() as u32);
        offset += data.len().next_multiple_of(4);
    }
    for (_, data) in tables {
        output.extend_from_slice(data);
        output.resize(output.len().next_multiple_of(4), 0);
    }

    if let Some(head) = head_offset {
        let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(&output));
        let at = head + HEAD_ADJUSTMENT_OFFSET;
        output[at..at + 4].copy_from_slice(&adjustment.to_be_bytes());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_glyph(x0: i16, y0: i16, x1: i16, y1: i16) -> SimpleGlyph {
        SimpleGlyph::new(vec![vec![
            OutlinePoint::on(x0, y0),
            OutlinePoint::on(x0, y1),
            OutlinePoint::on(x1, y1),
            OutlinePoint::on(x1, y0),
        ]])
    }

    fn sample_glyphs() -> Vec<GlyphRecord> {
        vec![
            GlyphRecord {
                codepoint: None,
                advance_width: 600,
                outline: SimpleGlyph::default(),
            },
            GlyphRecord {
                codepoint: Some(0x41),
                advance_width: 600,
                outline: square_glyph(100, 0, 500, 700),
            },
            GlyphRecord {
                codepoint: Some(0x42),
                advance_width: 600,
                outline: square_glyph(50, -200, 550, 800),
            },
            GlyphRecord {
                codepoint: Some(0xE000),
                advance_width: 600,
                outline: square_glyph(0, 0, 10, 10),
            },
            GlyphRecord {
                codepoint: Some(0x1F600),
                advance_width: 600,
                outline: square_glyph(0, 0, 10, 10),
            },
        ]
    }

    fn writer() -> TrueTypeWriter<'static> {
        TrueTypeWriter {
            family_name: "Test Family",
            style_name: "Regular",
            metrics: FontMetrics::default(),
            created: 0,
        }
    }

    #[test]
    fn test_table_checksum() {
        assert_eq!(table_checksum(b"ABCD"), 0x4142_4344);
        assert_eq!(table_checksum(b"ABCDE"), 0x4142_4344 + 0x4500_0000);
        assert_eq!(table_checksum(&[]), 0);
    }

    #[test]
    fn test_contiguous_runs() {
        let entries = [(0x41, 1), (0x42, 2), (0x43, 3), (0x45, 4), (0x46, 6)];
        assert_eq!(
            contiguous_runs(&entries),
            vec![(0x41, 0x43, 1), (0x45, 0x45, 4), (0x46, 0x46, 6)]
        );
    }

    #[test]
    fn test_postscript_name() {
        assert_eq!(postscript_name("My Font (Beta)", "Bold Italic"), "MyFontBeta-BoldItalic");
        assert_eq!(postscript_name("", ""), "Untitled");
    }

    #[test]
    fn test_simple_glyph_encoding() {
        let data = square_glyph(10, 20, 30, 40).encode();
        // header 10 + endPts 2 + instructionLength 2 + flags 4 + x 8 + y 8
        assert_eq!(data.len(), 34);
        assert_eq!(&data[0..2], &1i16.to_be_bytes());
        assert_eq!(&data[2..10], &[0, 10, 0, 20, 0, 30, 0, 40]);
        assert_eq!(&data[10..12], &3u16.to_be_bytes());
        assert!(SimpleGlyph::default().encode().is_empty());
    }

    #[test]
    fn test_file_checksum_is_magic() {
        let font = writer().write(&sample_glyphs()).unwrap();
        assert_eq!(font.len() % 4, 0);
        assert_eq!(table_checksum(&font), CHECKSUM_MAGIC);
    }

    #[test]
    fn test_tables_are_sorted() {
        let font = writer().write(&sample_glyphs()).unwrap();
        let count = u16::from_be_bytes([font[4], font[5]]) as usize;
        assert_eq!(count, 10);
        let tags: Vec<&[u8]> = (0..count).map(|i| &font[12 + i * 16..16 + i * 16]).collect();
        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted);
        assert_eq!(tags[0], b"OS/2");
    }

    #[test]
    fn test_font_parses() {
        let font = writer().write(&sample_glyphs()).unwrap();
        let face = ttf_parser::Face::parse(&font, 0).unwrap();
        assert_eq!(face.number_of_glyphs(), 5);
        assert_eq!(face.units_per_em(), 1000);
        assert_eq!(face.ascender(), 800);
        assert_eq!(face.descender(), -200);
        assert_eq!(face.glyph_index('A'), Some(ttf_parser::GlyphId(1)));
        assert_eq!(face.glyph_index('B'), Some(ttf_parser::GlyphId(2)));
        assert_eq!(face.glyph_index('\u{E000}'), Some(ttf_parser::GlyphId(3)));
        assert_eq!(face.glyph_index('\u{1F600}'), Some(ttf_parser::GlyphId(4)));
        assert_eq!(face.glyph_index('C'), None);
        assert_eq!(face.glyph_hor_advance(ttf_parser::GlyphId(1)), Some(600));
        let bbox = face.glyph_bounding_box(ttf_parser::GlyphId(1)).unwrap();
        assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (100, 0, 500, 700));
        assert!(face.glyph_bounding_box(ttf_parser::GlyphId(0)).is_none());

        let family = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::FAMILY)
            .and_then(|n| n.to_string());
        assert_eq!(family.as_deref(), Some("Test Family"));
    }

    #[test]
    fn test_too_many_glyphs() {
        let glyphs = vec![
            GlyphRecord {
                codepoint: None,
                advance_width: 0,
                outline: SimpleGlyph::default(),
            };
            MAX_GLYPHS + 1
        ];
        assert_eq!(
            writer().write(&glyphs),
            Err(GlyphError::TooManyGlyphs(MAX_GLYPHS + 1))
        );
    }

    #[test]
    fn test_outline_with_too_many_points_is_rejected() {
        let contour: Vec<OutlinePoint> = (0..=MAX_OUTLINE_POINTS)
            .map(|i| OutlinePoint::on((i % 1000) as i16, (i / 1000) as i16))
            .collect();
        let glyphs = vec![
            GlyphRecord {
                codepoint: None,
                advance_width: 0,
                outline: SimpleGlyph::default(),
            },
            GlyphRecord {
                codepoint: Some('A' as u32),
                advance_width: 600,
                outline: SimpleGlyph::new(vec![contour]),
            },
        ];
        assert_eq!(
            writer().write(&glyphs),
            Err(GlyphError::OutlineTooComplex {
                points: MAX_OUTLINE_POINTS + 1,
                contours: 1,
            })
        );
    }

    #[test]
    fn test_outline_with_too_many_contours_is_rejected() {
        let contours: Vec<Vec<OutlinePoint>> = (0..=MAX_OUTLINE_CONTOURS)
            .map(|i| vec![OutlinePoint::on(i as i16, 0)])
            .collect();
        let glyph = SimpleGlyph::new(contours);
        assert_eq!(
            glyph.check_limits(),
            Err(GlyphError::OutlineTooComplex {
                points: MAX_OUTLINE_CONTOURS + 1,
                contours: MAX_OUTLINE_CONTOURS + 1,
            })
        );
        let at_limit = SimpleGlyph::new(glyph.contours()[..MAX_OUTLINE_CONTOURS].to_vec());
        assert_eq!(at_limit.check_limits(), Ok(()));
    }
}
