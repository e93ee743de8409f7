//! Pixel-space geometry helpers
//!
//! Positions and axis-aligned rectangles in image coordinates with the origin
//! at the top-left corner.

use std::iter::Peekable;
use std::ops::Add;

/// A point `(x, y)` in image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The opposite offset, so that `translate(p.negate(), translate(p, r)) == r`
    pub const fn negate(self) -> Self {
        Self::new(-self.x, -self.y)
    }

    /// Componentwise addition clamped to the `i32` range
    pub fn saturating_add(self, other: Position) -> Position {
        Position::new(self.x.saturating_add(other.x), self.y.saturating_add(other.y))
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }
}

/// Axis-aligned rectangle given by its top-left and bottom-right corners
///
/// Both corners are inclusive pixel coordinates, so a rectangle whose corners
/// coincide covers a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub top_left: Position,
    pub bottom_right: Position,
}

impl Rect {
    pub const fn new(top_left: Position, bottom_right: Position) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Build a rectangle from `(left, top, right, bottom)` edges
    pub const fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(Position::new(left, top), Position::new(right, bottom))
    }

    /// Build a rectangle from any two opposite corners, ordering them per axis
    pub fn from_corners(a: Position, b: Position) -> Self {
        Self::from_edges(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn left(&self) -> i32 {
        self.top_left.x
    }

    pub fn top(&self) -> i32 {
        self.top_left.y
    }

    pub fn right(&self) -> i32 {
        self.bottom_right.x
    }

    pub fn bottom(&self) -> i32 {
        self.bottom_right.y
    }

    /// Number of pixel columns covered, counting both edges
    pub fn width(&self) -> u32 {
        self.right().abs_diff(self.left()).saturating_add(1)
    }

    /// Number of pixel rows covered, counting both edges
    pub fn height(&self) -> u32 {
        self.bottom().abs_diff(self.top()).saturating_add(1)
    }

    /// True when the rectangle has zero extent along either axis
    pub fn is_degenerate(&self) -> bool {
        self.left() == self.right() || self.top() == self.bottom()
    }
}

/// Translate both corners of `rect` by `offset`
pub fn translate(offset: Position, rect: Rect) -> Rect {
    Rect::new(offset + rect.top_left, offset + rect.bottom_right)
}

/// Smallest rectangle enclosing every rectangle in `rects`
///
/// Returns `None` for an empty input.
pub fn bounding_box<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().reduce(union)
}

fn union(a: Rect, b: Rect) -> Rect {
    Rect::from_edges(
        a.left().min(b.left()),
        a.top().min(b.top()),
        a.right().max(b.right()),
        a.bottom().max(b.bottom()),
    )
}

/// Grow `rect` outward by `amount` pixels on all four sides
///
/// Amounts beyond `i32::MAX` and edges beyond the `i32` range are clamped.
pub fn pad(rect: Rect, amount: u32) -> Rect {
    let amount = i32::try_from(amount).unwrap_or(i32::MAX);
    let margin = Position::new(amount, amount);
    Rect::new(
        rect.top_left.saturating_add(margin.negate()),
        rect.bottom_right.saturating_add(margin),
    )
}

/// Group consecutive rectangles into text lines
///
/// A run continues while the left edge is non-decreasing; a strictly smaller
/// left edge starts a new line. Only the order of the input is considered,
/// vertical positions are ignored.
pub fn group_by_line<I>(rects: I) -> LineGroups<I::IntoIter>
where
    I: IntoIterator<Item = Rect>,
{
    LineGroups {
        inner: rects.into_iter().peekable(),
    }
}

/// Iterator returned by [`group_by_line`], yielding one bounding box per line
pub struct LineGroups<I: Iterator<Item = Rect>> {
    inner: Peekable<I>,
}

impl<I: Iterator<Item = Rect>> Iterator for LineGroups<I> {
    type Item = Rect;

    fn next(&mut self) -> Option<Rect> {
        let mut line = self.inner.next()?;
        let mut last_left = line.left();

        while let Some(rect) = self.inner.next_if(|r| r.left() >= last_left) {
            last_left = rect.left();
            line = union(line, rect);
        }

        Some(line)
    }
}
