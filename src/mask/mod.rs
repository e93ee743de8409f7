//! Mask Applicator
//!
//! Paints opaque rectangles over located secrets.

use image::{DynamicImage, Rgb, Rgba};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;

use crate::vision::Rect;

/// Fill `rect` (both corners inclusive) with a solid color
///
/// The rectangle is clipped to the image; parts outside are ignored. Images
/// that are neither RGB8 nor RGBA8 are converted to RGBA8 first.
pub fn fill_rectangle(image: &mut DynamicImage, rect: Rect, color: [u8; 3]) {
    let Some(area) = clip(rect, image.width(), image.height()) else {
        return;
    };

    match image {
        DynamicImage::ImageRgb8(buffer) => draw_filled_rect_mut(buffer, area, Rgb(color)),
        DynamicImage::ImageRgba8(buffer) => {
            draw_filled_rect_mut(buffer, area, Rgba([color[0], color[1], color[2], 255]))
        }
        other => {
            let mut buffer = other.to_rgba8();
            draw_filled_rect_mut(&mut buffer, area, Rgba([color[0], color[1], color[2], 255]));
            *other = DynamicImage::ImageRgba8(buffer);
        }
    }
}

/// Fill every rectangle in `rects`
pub fn apply_masks(image: &mut DynamicImage, rects: &[Rect], color: [u8; 3]) {
    for rect in rects {
        fill_rectangle(image, *rect, color);
    }
}

/// Intersect `rect` with the image area
fn clip(rect: Rect, width: u32, height: u32) -> Option<PixelRect> {
    if width == 0 || height == 0 {
        return None;
    }

    let left = rect.left().max(0);
    let top = rect.top().max(0);
    let right = rect.right().min(width as i32 - 1);
    let bottom = rect.bottom().min(height as i32 - 1);

    if left > right || top > bottom {
        return None;
    }

    let clipped = Rect::from_edges(left, top, right, bottom);
    Some(PixelRect::at(left, top).of_size(clipped.width(), clipped.height()))
}
