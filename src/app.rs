//! Per-image masking pipeline
//!
//! OCR, box normalization, secret location and masking for one image at a
//! time. Nothing here is shared between images.

use anyhow::{Context, Result};
use image::DynamicImage;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info};

use crate::analysis::SecretLocator;
use crate::config::OcrSettings;
use crate::error::MaskError;
use crate::mask;
use crate::storage;
use crate::vision::{group_by_line, normalize_boxes, translate, OcrEngine, Position, Rect};

/// Everything needed to mask a batch of images
pub struct MaskJob<'a> {
    pub engine: &'a dyn OcrEngine,
    pub locator: &'a SecretLocator,
    pub ocr: &'a OcrSettings,
    pub color: [u8; 3],
    /// Log every normalized character box and detected line
    pub debug: bool,
}

impl MaskJob<'_> {
    /// Mask secrets in `input_path` and write the result to `output_path`
    ///
    /// Returns the number of secrets found. Finding none is not an error; the
    /// image is saved unchanged.
    pub fn mask_secrets(&self, input_path: &Path, output_path: &Path) -> Result<usize> {
        info!("Processing {}...", input_path.display());

        let mut image = storage::load_image(input_path)?;
        let secret_rects = self
            .find_secret_rects(&image)
            .with_context(|| format!("failed to locate secrets in {}", input_path.display()))?;

        info!("Found {} secrets at {:?}", secret_rects.len(), secret_rects);
        mask::apply_masks(&mut image, &secret_rects, self.color);

        storage::save_image(&image, output_path)?;
        info!("Saved to {}", output_path.display());

        Ok(secret_rects.len())
    }

    /// Locate secrets in `image`, in the image's own coordinates
    pub fn find_secret_rects(&self, image: &DynamicImage) -> Result<Vec<Rect>> {
        let (region, offset) = match self.ocr.crop {
            Some(crop) => (
                Cow::Owned(crop_region(image, crop)?),
                Position::new(crop.0 as i32, crop.1 as i32),
            ),
            None => (Cow::Borrowed(image), Position::default()),
        };

        let raw = self
            .engine
            .recognize(&region, &self.ocr.language, &self.ocr.tesseract_configs)?;
        let boxes = normalize_boxes(raw, region.height())?;

        if self.debug {
            for b in &boxes {
                debug!("{} {:?}", b.content, b.rect);
            }
            for (i, line) in group_by_line(boxes.iter().map(|b| b.rect)).enumerate() {
                debug!("line {}: {:?}", i, translate(offset, line));
            }
        }

        let rects = self.locator.locate(&boxes);
        Ok(rects.into_iter().map(|r| translate(offset, r)).collect())
    }
}

/// Cut `(x, y, width, height)` out of `image`
fn crop_region(image: &DynamicImage, (x, y, width, height): (u32, u32, u32, u32)) -> Result<DynamicImage, MaskError> {
    let fits = x.checked_add(width).is_some_and(|r| r <= image.width())
        && y.checked_add(height).is_some_and(|b| b <= image.height());

    if !fits {
        return Err(MaskError::RegionOutOfBounds {
            region: (x, y, width, height),
            width: image.width(),
            height: image.height(),
        });
    }

    Ok(image.crop_imm(x, y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{SecretPattern, DEFAULT_PADDING};
    use crate::vision::char_box::RawCharBox;
    use image::{Rgb, RgbImage};
    use std::cell::RefCell;

    /// Engine that replays box-file style records and remembers what it was asked
    struct FakeOcr {
        boxes: Vec<RawCharBox>,
        calls: RefCell<Vec<(u32, u32, String, Vec<String>)>>,
    }

    impl FakeOcr {
        fn new(boxes: Vec<RawCharBox>) -> Self {
            Self {
                boxes,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl OcrEngine for FakeOcr {
        fn recognize(&self, image: &DynamicImage, language: &str, options: &[String]) -> Result<Vec<RawCharBox>> {
            self.calls.borrow_mut().push((
                image.width(),
                image.height(),
                language.to_string(),
                options.to_vec(),
            ));
            Ok(self.boxes.clone())
        }
    }

    /// Box-file records (bottom-left origin) spelling `text` in an image of `height`
    fn box_file(text: &str, height: i32, x: i32, top: i32) -> Vec<RawCharBox> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let left = x + i as i32 * 10;
                RawCharBox::new(c.to_string(), Rect::from_edges(left, height - top - 14, left + 8, height - top))
            })
            .collect()
    }

    fn locator(pattern: &str) -> SecretLocator {
        SecretLocator::new(vec![SecretPattern::new(pattern).unwrap()], DEFAULT_PADDING)
    }

    fn job<'a>(engine: &'a FakeOcr, locator: &'a SecretLocator, ocr: &'a OcrSettings) -> MaskJob<'a> {
        MaskJob {
            engine,
            locator,
            ocr,
            color: [96, 96, 96],
            debug: true,
        }
    }

    #[test]
    fn test_find_secret_rects_end_to_end() {
        let engine = FakeOcr::new(box_file("ID: 123-456-789-012 done", 200, 100, 50));
        let locator = locator(r"[-\d]{12,}");
        let ocr = OcrSettings::default();
        let image = DynamicImage::new_rgb8(400, 200);

        let rects = job(&engine, &locator, &ocr).find_secret_rects(&image).unwrap();

        assert_eq!(rects, vec![Rect::from_edges(138, 48, 290, 66)]);
        let calls = engine.calls.borrow();
        assert_eq!(calls[0], (400, 200, "eng+jpn".to_string(), vec!["makebox".to_string()]));
    }

    #[test]
    fn test_find_secret_rects_blank_image() {
        let engine = FakeOcr::new(Vec::new());
        let locator = locator(r"\d+");
        let ocr = OcrSettings::default();

        let rects = job(&engine, &locator, &ocr)
            .find_secret_rects(&DynamicImage::new_rgb8(10, 10))
            .unwrap();
        assert!(rects.is_empty());
    }

    #[test]
    fn test_find_secret_rects_with_crop_offset() {
        // OCR only sees the 300x60 strip at (20, 150)
        let engine = FakeOcr::new(box_file("pin 4321", 60, 0, 10));
        let locator = locator(r"\d{4}");
        let ocr = OcrSettings {
            crop: Some((20, 150, 300, 60)),
            ..OcrSettings::default()
        };

        let rects = job(&engine, &locator, &ocr)
            .find_secret_rects(&DynamicImage::new_rgb8(400, 300))
            .unwrap();

        // Digits at x 40..78, y 10..24 in the strip
        assert_eq!(rects, vec![Rect::from_edges(58, 158, 100, 176)]);
        assert_eq!(engine.calls.borrow()[0].0, 300);
        assert_eq!(engine.calls.borrow()[0].1, 60);
    }

    #[test]
    fn test_crop_outside_image_fails() {
        let engine = FakeOcr::new(Vec::new());
        let locator = locator("x");
        let ocr = OcrSettings {
            crop: Some((350, 0, 100, 10)),
            ..OcrSettings::default()
        };

        let err = job(&engine, &locator, &ocr)
            .find_secret_rects(&DynamicImage::new_rgb8(400, 300))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MaskError>(),
            Some(MaskError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_empty_box_from_engine_aborts_image() {
        let engine = FakeOcr::new(vec![RawCharBox::new("", Rect::default())]);
        let locator = locator("x");
        let ocr = OcrSettings::default();

        let err = job(&engine, &locator, &ocr)
            .find_secret_rects(&DynamicImage::new_rgb8(10, 10))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MaskError>(),
            Some(MaskError::EmptyCharBox { index: 0 })
        ));
    }

    #[test]
    fn test_mask_secrets_writes_masked_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])).save(&input).unwrap();

        let engine = FakeOcr::new(box_file("key abcd", 100, 10, 20));
        let locator = locator("abcd");
        let ocr = OcrSettings::default();

        let found = job(&engine, &locator, &ocr).mask_secrets(&input, &output).unwrap();
        assert_eq!(found, 1);

        let masked = storage::load_image(&output).unwrap().to_rgb8();
        // "abcd" spans x 50..88, y 20..34, padded by 2
        assert_eq!(masked.get_pixel(48, 18), &Rgb([96, 96, 96]));
        assert_eq!(masked.get_pixel(90, 36), &Rgb([96, 96, 96]));
        assert_eq!(masked.get_pixel(47, 18), &Rgb([255, 255, 255]));
        assert_eq!(masked.get_pixel(10, 20), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_mask_secrets_without_matches_saves_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])).save(&input).unwrap();

        let engine = FakeOcr::new(box_file("hello", 50, 0, 0));
        let locator = locator(r"\d+");
        let ocr = OcrSettings::default();

        let found = job(&engine, &locator, &ocr).mask_secrets(&input, &output).unwrap();
        assert_eq!(found, 0);
        assert_eq!(
            storage::load_image(&output).unwrap().to_rgb8(),
            RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]))
        );
    }

    #[test]
    fn test_mask_secrets_with_no_patterns_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        RgbImage::from_pixel(40, 30, Rgb([255, 255, 255])).save(&input).unwrap();

        let engine = FakeOcr::new(box_file("1234", 30, 0, 0));
        let locator = SecretLocator::new(Vec::new(), DEFAULT_PADDING);
        let ocr = OcrSettings::default();

        let found = job(&engine, &locator, &ocr).mask_secrets(&input, &output).unwrap();
        assert_eq!(found, 0);
        assert!(output.exists());
    }
}
