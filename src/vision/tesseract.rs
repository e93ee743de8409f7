//! Tesseract OCR backend
//!
//! Runs the `tesseract` executable in box mode and parses its per-character
//! output. Coordinates are returned exactly as Tesseract reports them
//! (bottom-left origin); see [`super::char_box`] for the conversion.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::char_box::RawCharBox;
use super::geometry::Rect;
use crate::error::MaskError;

/// Engine options requesting character boxes only
///
/// Tesseract's stock box configuration also enables `batch.nochop`, which
/// causes misrecognition on screenshots, so it is left out.
pub const DEFAULT_TESSERACT_CONFIGS: &[&str] = &["makebox"];

/// Something that turns an image into per-character boxes
pub trait OcrEngine {
    /// Recognize characters in `image`
    ///
    /// `language` may join several models with `+` (e.g. `eng+jpn`).
    /// Boxes are returned in the engine's emission order.
    fn recognize(&self, image: &DynamicImage, language: &str, options: &[String]) -> Result<Vec<RawCharBox>>;
}

/// OCR engine backed by the `tesseract` command line tool
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
}

impl TesseractOcr {
    /// Use the given executable name or path
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn run(&self, path: &Path, language: &str, options: &[String]) -> Result<String> {
        let output = Command::new(&self.command)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .args(options)
            .output()
            .with_context(|| format!("failed to run {} (is it installed?)", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("{} failed: {}", self.command, stderr.trim()));
        }

        String::from_utf8(output.stdout).context("tesseract produced non UTF-8 output")
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage, language: &str, options: &[String]) -> Result<Vec<RawCharBox>> {
        let mut tmp = tempfile::Builder::new()
            .prefix("masecret-")
            .suffix(".png")
            .tempfile()
            .context("failed to create temp file for OCR")?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .context("failed to write temp image for OCR")?;
        tmp.flush().context("failed to flush temp image for OCR")?;

        debug!(
            "Running {} on {}x{} image (lang={}, options={:?})",
            self.command,
            image.width(),
            image.height(),
            language,
            options
        );

        let stdout = self.run(tmp.path(), language, options)?;
        let boxes = parse_box_output(&stdout)?;

        debug!("Tesseract returned {} boxes", boxes.len());
        Ok(boxes)
    }
}

/// Parse Tesseract box output
///
/// Each line reads `<symbol> <left> <bottom> <right> <top> <page>`. The symbol
/// is whatever precedes the last five fields, so it may itself contain several
/// characters. Blank lines are ignored.
pub fn parse_box_output(output: &str) -> Result<Vec<RawCharBox>, MaskError> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_box_line(line).ok_or_else(|| MaskError::MalformedBoxLine {
            line: index + 1,
            content: line.to_string(),
        }))
        .collect()
}

fn parse_box_line(line: &str) -> Option<RawCharBox> {
    let mut fields = line.rsplitn(6, ' ');
    let _page: u32 = fields.next()?.trim().parse().ok()?;
    let top: i32 = fields.next()?.parse().ok()?;
    let right: i32 = fields.next()?.parse().ok()?;
    let bottom: i32 = fields.next()?.parse().ok()?;
    let left: i32 = fields.next()?.parse().ok()?;
    let content = fields.next()?;

    if content.is_empty() {
        return None;
    }

    // Kept in the engine's (left, bottom) / (right, top) layout
    Some(RawCharBox::new(content, Rect::from_edges(left, bottom, right, top)))
}
