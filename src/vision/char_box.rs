//! Character boxes reported by the OCR engine
//!
//! Tesseract's box output places the vertical origin at the bottom of the
//! image and occasionally bundles several glyphs into one box. The raw and
//! normalized records are separate types; [`normalize_boxes`] is the only
//! conversion between them.

use super::geometry::{Position, Rect};
use crate::error::MaskError;

/// One record as emitted by the OCR engine
///
/// `content` may hold more than one character and `rect` is expressed with
/// the vertical origin at the bottom edge of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCharBox {
    pub content: String,
    pub rect: Rect,
}

impl RawCharBox {
    pub fn new(content: impl Into<String>, rect: Rect) -> Self {
        Self {
            content: content.into(),
            rect,
        }
    }
}

/// A single recognized character with its top-left-origin bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharBox {
    pub content: char,
    pub rect: Rect,
}

impl CharBox {
    pub fn new(content: char, rect: Rect) -> Self {
        Self { content, rect }
    }
}

/// Mirror a position across the horizontal axis of an image of `image_height`
pub fn reflect_position(pos: Position, image_height: u32) -> Position {
    Position::new(pos.x, image_height as i32 - pos.y)
}

/// Convert a rectangle between bottom-origin and top-origin coordinates
///
/// Both corners are reflected and the result is re-ordered per axis, so the
/// conversion is its own inverse.
pub fn reflect_vertically(rect: Rect, image_height: u32) -> Rect {
    Rect::from_corners(
        reflect_position(rect.top_left, image_height),
        reflect_position(rect.bottom_right, image_height),
    )
}

/// Turn raw OCR records into exactly one [`CharBox`] per character
///
/// Every output box is in top-left-origin coordinates. A raw record holding
/// several characters yields one box per character, all sharing the record's
/// rectangle. Emission order is preserved.
pub fn normalize_boxes(raw: Vec<RawCharBox>, image_height: u32) -> Result<Vec<CharBox>, MaskError> {
    let mut boxes = Vec::with_capacity(raw.len());

    for (index, record) in raw.into_iter().enumerate() {
        if record.content.is_empty() {
            return Err(MaskError::EmptyCharBox { index });
        }

        let rect = reflect_vertically(record.rect, image_height);
        boxes.extend(record.content.chars().map(|c| CharBox::new(c, rect)));
    }

    Ok(boxes)
}
