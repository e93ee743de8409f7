//! Secret locator
//!
//! Rebuilds the recognized text from normalized character boxes, runs every
//! secret pattern over it and maps each match back to a padded rectangle.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::MaskError;
use crate::vision::{bounding_box, pad, CharBox, Rect};

/// Margin added around every match so glyph strokes outside the OCR box are covered
pub const DEFAULT_PADDING: u32 = 2;

/// A compiled regular expression identifying sensitive text
#[derive(Debug, Clone)]
pub struct SecretPattern {
    regex: Regex,
}

impl SecretPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// The pattern source text
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether this pattern can never produce a rectangle
    pub fn is_empty(&self) -> bool {
        self.regex.as_str().is_empty()
    }

    fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Parse secret patterns, one per line
///
/// Trailing whitespace on each line is stripped. Blank lines become empty
/// patterns that match nothing.
pub fn parse_secret_patterns(content: &str) -> Result<Vec<SecretPattern>, MaskError> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| {
            SecretPattern::new(line.trim_end()).map_err(|source| MaskError::InvalidPattern {
                line: index + 1,
                source,
            })
        })
        .collect()
}

/// Load secret patterns from a UTF-8 file
pub fn load_secret_patterns(path: &Path) -> Result<Vec<SecretPattern>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read secrets file {}", path.display()))?;
    let patterns = parse_secret_patterns(&content)
        .with_context(|| format!("failed to load secrets file {}", path.display()))?;

    let blank = patterns.iter().filter(|p| p.is_empty()).count();
    if blank > 0 {
        warn!("{} contains {} blank line(s); they match nothing", path.display(), blank);
    }

    Ok(patterns)
}

/// Finds the rectangles covering secret text in one image's character boxes
#[derive(Debug, Clone)]
pub struct SecretLocator {
    patterns: Vec<SecretPattern>,
    padding: u32,
}

impl SecretLocator {
    pub fn new(patterns: Vec<SecretPattern>, padding: u32) -> Self {
        Self { patterns, padding }
    }

    pub fn patterns(&self) -> &[SecretPattern] {
        &self.patterns
    }

    /// Locate every secret in `boxes`
    ///
    /// Rectangles are ordered by pattern, then by match position. Matches of
    /// the same pattern never overlap; matches of different patterns may.
    pub fn locate(&self, boxes: &[CharBox]) -> Vec<Rect> {
        let text: String = boxes.iter().map(|b| b.content).collect();

        // Byte offset of every character, plus the end of the string
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        // One char per box, so character indices are box indices
        debug_assert_eq!(offsets.len() - 1, boxes.len());

        let char_index = |byte: usize| offsets.partition_point(|&o| o < byte);

        let mut rects = Vec::new();
        for pattern in self.patterns.iter().filter(|p| !p.is_empty()) {
            for m in pattern.regex().find_iter(&text) {
                let (start, end) = (char_index(m.start()), char_index(m.end()));
                let Some(bounds) = bounding_box(boxes[start..end].iter().map(|b| b.rect)) else {
                    continue;
                };

                let rect = pad(bounds, self.padding);
                if rect.is_degenerate() {
                    debug!("Skipping degenerate match {:?} at {:?}", m.as_str(), rect);
                    continue;
                }

                debug!("Pattern {:?} matched {:?} at {:?}", pattern.as_str(), m.as_str(), rect);
                rects.push(rect);
            }
        }

        rects
    }
}
