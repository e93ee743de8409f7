//! Storage Layer
//!
//! Image loading and saving, output path resolution and the location of the
//! configuration file.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "orangain", "masecret")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Default path of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load an image from disk
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("failed to open image {}", path.display()))
}

/// Save an image, choosing the format from the file extension
///
/// Formats without an alpha channel receive an RGB copy.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unsupported output format for {}", path.display()))?;

    let result = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)
    } else {
        image.save_with_format(path, format)
    };

    result.with_context(|| format!("failed to save image {}", path.display()))
}

/// Where to write the masked version of `input`
///
/// When `output` is a directory the input's file name is kept.
pub fn resolve_output_path(input: &Path, output: &Path) -> Result<PathBuf> {
    if output.is_dir() {
        let name = input
            .file_name()
            .with_context(|| format!("input path {} has no file name", input.display()))?;
        Ok(output.join(name))
    } else {
        Ok(output.to_path_buf())
    }
}
