//! Vision/OCR Layer
//!
//! Runs OCR on an image and reconciles the engine's character boxes with the
//! pixel coordinate system used everywhere else:
//! - Tesseract box-mode backend
//! - Coordinate reflection and one-character-per-box normalization
//! - Rectangle geometry

pub mod char_box;
pub mod geometry;
pub mod tesseract;

pub use char_box::{normalize_boxes, CharBox};
pub use geometry::{bounding_box, group_by_line, pad, translate, Position, Rect};
pub use tesseract::{OcrEngine, TesseractOcr, DEFAULT_TESSERACT_CONFIGS};
