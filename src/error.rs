//! Domain errors
//!
//! Failures that abort the processing of an image or of the whole run.
//! Application-level code wraps these in `anyhow` with extra context.

use thiserror::Error;

/// Errors raised by the OCR reconciliation pipeline
#[derive(Debug, Error)]
pub enum MaskError {
    /// The OCR engine reported a box with no characters
    #[error("OCR engine returned an empty character box at index {index}")]
    EmptyCharBox { index: usize },

    /// A line of OCR engine output could not be parsed
    #[error("malformed box line {line}: {content:?}")]
    MalformedBoxLine { line: usize, content: String },

    /// A user-supplied regular expression failed to compile
    #[error("invalid secret pattern on line {line}: {source}")]
    InvalidPattern {
        line: usize,
        #[source]
        source: regex::Error,
    },

    /// A color string was not understood
    #[error("invalid color {0:?} (expected #RRGGBB or R,G,B)")]
    InvalidColor(String),

    /// A crop region string was not understood
    #[error("invalid crop region {0:?} (expected X,Y,WIDTH,HEIGHT)")]
    InvalidRegion(String),

    /// The crop region does not fit inside the image
    #[error("crop region {region:?} lies outside the {width}x{height} image")]
    RegionOutOfBounds {
        region: (u32, u32, u32, u32),
        width: u32,
        height: u32,
    },
}
