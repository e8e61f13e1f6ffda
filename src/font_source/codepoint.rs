//! Unicode code points and Private Use Area allocation

use crate::core::errors::{GlyphError, GlyphResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// First code point of the BMP Private Use Area
pub const PUA_START: u32 = 0xE000;
/// Last code point of the BMP Private Use Area (inclusive)
pub const PUA_END: u32 = 0xF8FF;

pub const DEFAULT_MAX_RANDOM_ATTEMPTS: usize = 10_000;

/// A Unicode scalar value. Displays as uppercase hex with at least four digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Codepoint(u32);

impl Codepoint {
    /// `None` for surrogates and values past U+10FFFF
    pub fn new(value: u32) -> Option<Self> {
        char::from_u32(value).map(|_| Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn to_char(self) -> char {
        // Construction guarantees a scalar value
        char::from_u32(self.0).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    pub fn is_private_use(self) -> bool {
        (PUA_START..=PUA_END).contains(&self.0)
    }

    pub fn is_bmp(self) -> bool {
        self.0 <= 0xFFFF
    }
}

impl fmt::Display for Codepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl From<char> for Codepoint {
    fn from(c: char) -> Self {
        Self(c as u32)
    }
}

impl FromStr for Codepoint {
    type Err = GlyphError;

    /// Accepts `0041`, `41`, `U+0041` and `0x41`, in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GlyphError::InvalidCodepoint(s.to_string());
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let digits = lower
            .strip_prefix("u+")
            .or_else(|| lower.strip_prefix("0x"))
            .unwrap_or(&lower);
        if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid());
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        Codepoint::new(value).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Codepoint {
    type Error = GlyphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Codepoint> for String {
    fn from(cp: Codepoint) -> Self {
        cp.to_string()
    }
}

/// The code points already taken in one font
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedCodepoints(BTreeSet<Codepoint>);

impl UsedCodepoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored hex strings; entries that do not parse are skipped
    pub fn from_hex_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut used = Self::new();
        for value in values {
            match value.as_ref().parse::<Codepoint>() {
                Ok(cp) => {
                    used.insert(cp);
                }
                Err(_) => warn!("Ignoring unparsable code point '{}'", value.as_ref()),
            }
        }
        used
    }

    pub fn contains(&self, cp: Codepoint) -> bool {
        self.0.contains(&cp)
    }

    /// Returns false if `cp` was already present
    pub fn insert(&mut self, cp: Codepoint) -> bool {
        self.0.insert(cp)
    }

    pub fn remove(&mut self, cp: Codepoint) -> bool {
        self.0.remove(&cp)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Codepoint> + '_ {
        self.0.iter().copied()
    }

    fn private_use_count(&self) -> usize {
        self.0
            .range(Codepoint(PUA_START)..=Codepoint(PUA_END))
            .count()
    }
}

impl FromIterator<Codepoint> for UsedCodepoints {
    fn from_iter<T: IntoIterator<Item = Codepoint>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Picks code points for glyphs that arrive without one.
///
/// Random draws spread new glyphs across the Private Use Area; once
/// `max_random_attempts` draws have all collided, a linear scan finds the
/// lowest free value. Callers must hold the font's lock between reading
/// the used set and persisting the glyph.
#[derive(Debug, Clone)]
pub struct CodepointAllocator {
    rng: StdRng,
    max_random_attempts: usize,
}

impl Default for CodepointAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodepointAllocator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            max_random_attempts: DEFAULT_MAX_RANDOM_ATTEMPTS,
        }
    }

    /// Reproducible draws, for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_random_attempts: DEFAULT_MAX_RANDOM_ATTEMPTS,
        }
    }

    pub fn with_max_random_attempts(mut self, attempts: usize) -> Self {
        self.max_random_attempts = attempts;
        self
    }

    /// A Private Use Area code point not in `used`
    pub fn allocate(&mut self, used: &UsedCodepoints) -> GlyphResult<Codepoint> {
        let capacity = (PUA_END - PUA_START + 1) as usize;
        if used.private_use_count() >= capacity {
            return Err(GlyphError::CodepointRangeExhausted);
        }

        for _ in 0..self.max_random_attempts {
            let cp = Codepoint(self.rng.gen_range(PUA_START..=PUA_END));
            if !used.contains(cp) {
                debug!("Allocated code point {} by random draw", cp);
                return Ok(cp);
            }
        }

        let cp = (PUA_START..=PUA_END)
            .map(Codepoint)
            .find(|cp| !used.contains(*cp))
            .ok_or(GlyphError::CodepointRangeExhausted)?;
        debug!("Allocated code point {} by linear scan", cp);
        Ok(cp)
    }

    /// Validate a requested code point, or allocate one when none was given
    pub fn resolve(
        &mut self,
        requested: Option<&str>,
        used: &UsedCodepoints,
    ) -> GlyphResult<Codepoint> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let cp: Codepoint = raw.parse()?;
                if used.contains(cp) {
                    Err(GlyphError::DuplicateCodepoint(cp))
                } else {
                    Ok(cp)
                }
            }
            None => self.allocate(used),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(value: u32) -> Codepoint {
        Codepoint::new(value).unwrap()
    }

    #[test]
    fn test_parse_forms() {
        for text in ["0041", "41", "U+0041", "u+0041", "0x41", "0X41", " 0041 "] {
            assert_eq!(text.parse::<Codepoint>().unwrap(), cp(0x41), "{text}");
        }
        assert_eq!("1f600".parse::<Codepoint>().unwrap(), cp(0x1F600));
    }

    #[test]
    fn test_parse_rejects_non_scalars() {
        for text in ["", "U+", "zz", "D800", "110000", "-41", "123456789"] {
            assert!(
                matches!(text.parse::<Codepoint>(), Err(GlyphError::InvalidCodepoint(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(cp(0x41).to_string(), "0041");
        assert_eq!(cp(0xE000).to_string(), "E000");
        assert_eq!(cp(0x1F600).to_string(), "1F600");
    }

    #[test]
    fn test_used_set_normalises_case() {
        let used = UsedCodepoints::from_hex_strings(["e000", "E001", "not hex", "u+0041"]);
        assert_eq!(used.len(), 3);
        assert!(used.contains(cp(0xE000)));
        assert!(used.contains(cp(0x41)));
    }

    #[test]
    fn test_allocate_in_private_use_area() {
        let mut allocator = CodepointAllocator::seeded(7);
        let mut used = UsedCodepoints::new();
        for _ in 0..200 {
            let next = allocator.allocate(&used).unwrap();
            assert!(next.is_private_use());
            assert!(used.insert(next), "{next} allocated twice");
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let used = UsedCodepoints::new();
        let a = CodepointAllocator::seeded(42).allocate(&used).unwrap();
        let b = CodepointAllocator::seeded(42).allocate(&used).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_scan_after_random_attempts() {
        let mut used: UsedCodepoints = (PUA_START..PUA_END).map(cp).collect();
        let mut allocator = CodepointAllocator::seeded(1).with_max_random_attempts(0);
        assert_eq!(allocator.allocate(&used).unwrap(), cp(PUA_END));

        used.insert(cp(PUA_END));
        assert_eq!(
            allocator.allocate(&used),
            Err(GlyphError::CodepointRangeExhausted)
        );
    }

    #[test]
    fn test_resolve() {
        let used = UsedCodepoints::from_hex_strings(["0041"]);
        let mut allocator = CodepointAllocator::seeded(3);
        assert_eq!(
            allocator.resolve(Some("0041"), &used),
            Err(GlyphError::DuplicateCodepoint(cp(0x41)))
        );
        assert_eq!(allocator.resolve(Some("U+0042"), &used).unwrap(), cp(0x42));
        assert!(allocator.resolve(Some("  "), &used).unwrap().is_private_use());
        assert!(allocator.resolve(None, &used).unwrap().is_private_use());
    }
}
