//! Decoded animations, and the sequences made from them
//!
//! An [`Animation`] owns its frames. A [`Sequence`] is what gets encoded: it may reuse frames
//! of the animation it was made from ([`FrameRef::Shared`]), or carry new ones ([`FrameRef::Owned`]).

use crate::palette::Palette;
use gif::{DisposalMethod, Repeat};
use imgref::ImgVec;
use rgb::RGB8;
use std::ops::Deref;

/// Half-open area of the canvas, in pixels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    #[inline]
    #[must_use]
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self { left, top, right, bottom }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// `None` if the rectangles don't share any pixel
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let r = Self {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if r.is_empty() { None } else { Some(r) }
    }
}

/// One image of the animation, with its own palette
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position on the canvas
    pub left: u16,
    pub top: u16,
    /// Palette indices
    pub pixels: ImgVec<u8>,
    pub palette: Palette,
    pub transparent: Option<u8>,
    /// In 1/100th of a second
    pub delay: u16,
    pub dispose: DisposalMethod,
}

impl Frame {
    /// The area of the canvas this frame covers
    #[must_use]
    pub fn rect(&self) -> Rect {
        let left = u32::from(self.left);
        let top = u32::from(self.top);
        Rect::new(left, top, left + self.pixels.width() as u32, top + self.pixels.height() as u32)
    }

    /// Palette index to use for `color`, adding it to the palette if it isn't there yet.
    ///
    /// When the palette is full the closest existing color is used instead.
    pub fn color_index(&mut self, color: RGB8) -> u8 {
        if let Some(i) = self.palette.position(color).filter(|&i| Some(i) != self.transparent) {
            return i;
        }
        if let Some(i) = self.palette.push(color) {
            return i;
        }
        self.palette.nearest(color).unwrap_or(0)
    }

    /// Sets pixels of `area` (in canvas coordinates) that lie within this frame.
    pub fn fill_canvas_rect(&mut self, area: &Rect, index: u8) {
        let Some(area) = self.rect().intersect(area) else {
            return;
        };
        let x0 = (area.left - u32::from(self.left)) as usize;
        let x1 = (area.right - u32::from(self.left)) as usize;
        let y0 = (area.top - u32::from(self.top)) as usize;
        let rows = area.height() as usize;
        for row in self.pixels.rows_mut().skip(y0).take(rows) {
            row[x0..x1].fill(index);
        }
    }

    /// Color of a pixel at canvas coordinates, unless it's outside the frame or transparent
    #[cfg(test)]
    #[must_use]
    pub fn canvas_color(&self, x: u32, y: u32) -> Option<RGB8> {
        let r = self.rect();
        if x < r.left || x >= r.right || y < r.top || y >= r.bottom {
            return None;
        }
        let index = self.pixels.buf()[(y - r.top) as usize * self.pixels.stride() + (x - r.left) as usize];
        if Some(index) == self.transparent {
            return None;
        }
        self.palette.get(index)
    }
}

/// Decoded animation
#[derive(Debug, Clone)]
pub struct Animation {
    /// Logical screen size
    pub width: u16,
    pub height: u16,
    pub repeat: Repeat,
    pub background: u8,
    pub frames: Vec<Frame>,
}

impl Animation {
    /// Sum of frame delays, in 1/100th of a second
    #[must_use]
    pub fn total_delay(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.delay)).sum()
    }

    /// All frames as they are, with their own delays
    #[must_use]
    pub fn as_sequence(&self) -> Sequence<'_> {
        let mut seq = Sequence::with_capacity(self, self.frames.len());
        seq.frames.extend(self.frames.iter().map(|f| SequenceFrame {
            image: FrameRef::Shared(f),
            delay: f.delay,
            dispose: f.dispose,
            kind: FrameKind::Content,
        }));
        seq
    }
}

/// A frame that is either reused as-is, or has been made for the output
#[derive(Debug)]
pub enum FrameRef<'a> {
    Shared(&'a Frame),
    Owned(Frame),
}

impl FrameRef<'_> {
    #[inline]
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

impl Deref for FrameRef<'_> {
    type Target = Frame;

    #[inline]
    fn deref(&self) -> &Frame {
        match self {
            Self::Shared(f) => f,
            Self::Owned(f) => f,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// Shows (a slice of) a frame of the source animation
    Content,
    /// Zero-delay frame with only the bar in it
    Filler,
}

#[derive(Debug)]
pub struct SequenceFrame<'a> {
    pub image: FrameRef<'a>,
    /// Replaces the delay of the image, in 1/100th of a second
    pub delay: u16,
    pub dispose: DisposalMethod,
    pub kind: FrameKind,
}

/// Frames ready to be encoded
#[derive(Debug)]
pub struct Sequence<'a> {
    pub width: u16,
    pub height: u16,
    pub repeat: Repeat,
    pub background: u8,
    pub frames: Vec<SequenceFrame<'a>>,
}

impl<'a> Sequence<'a> {
    /// Empty sequence with the same screen as the animation
    #[must_use]
    pub fn with_capacity(animation: &Animation, capacity: usize) -> Self {
        Self {
            width: animation.width,
            height: animation.height,
            repeat: animation.repeat,
            background: animation.background,
            frames: Vec::with_capacity(capacity),
        }
    }

    /// Sum of delays, in 1/100th of a second
    #[must_use]
    pub fn total_delay(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.delay)).sum()
    }

    #[cfg(test)]
    pub fn content_frames(&self) -> impl Iterator<Item = &SequenceFrame<'a>> {
        self.frames.iter().filter(|f| f.kind == FrameKind::Content)
    }
}
