//! Application Configuration
//!
//! User settings stored in TOML format. Command line flags override the
//! values loaded here.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::DEFAULT_PADDING;
use crate::error::MaskError;
use crate::vision::DEFAULT_TESSERACT_CONFIGS;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OCR settings
    pub ocr: OcrSettings,
    /// Masking settings
    pub mask: MaskSettings,
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language models, joined with `+`
    pub language: String,
    /// Extra Tesseract configuration arguments
    pub tesseract_configs: Vec<String>,
    /// Tesseract executable name or path
    pub tesseract_cmd: String,
    /// Only run OCR on this region (x, y, width, height)
    pub crop: Option<(u32, u32, u32, u32)>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng+jpn".to_string(),
            tesseract_configs: DEFAULT_TESSERACT_CONFIGS.iter().map(|s| s.to_string()).collect(),
            tesseract_cmd: "tesseract".to_string(),
            crop: None,
        }
    }
}

/// Mask rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskSettings {
    /// Fill color as `#RRGGBB` or `R,G,B`
    pub color: String,
    /// Pixels added around each matched region
    pub padding: u32,
    /// File with one secret pattern per line
    pub secrets_file: PathBuf,
}

impl Default for MaskSettings {
    fn default() -> Self {
        Self {
            color: "#606060".to_string(),
            padding: DEFAULT_PADDING,
            secrets_file: PathBuf::from("SECRETS.txt"),
        }
    }
}

impl MaskSettings {
    /// The fill color as RGB components
    pub fn rgb(&self) -> Result<[u8; 3], MaskError> {
        parse_color(&self.color)
    }
}

/// Parse a color given as `#RRGGBB`, `RRGGBB` or `R,G,B`
pub fn parse_color(value: &str) -> Result<[u8; 3], MaskError> {
    let invalid = || MaskError::InvalidColor(value.to_string());
    let trimmed = value.trim();

    if trimmed.contains(',') {
        let parts = trimmed
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        return <[u8; 3]>::try_from(parts).map_err(|_| invalid());
    }

    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Parse a region given as `X,Y,WIDTH,HEIGHT`
pub fn parse_region(value: &str) -> Result<(u32, u32, u32, u32), MaskError> {
    let invalid = || MaskError::InvalidRegion(value.to_string());
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match parts.as_slice() {
        &[x, y, w, h] if w > 0 && h > 0 => Ok((x, y, w, h)),
        _ => Err(invalid()),
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
