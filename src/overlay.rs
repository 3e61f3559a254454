//! Drawing the progress bar into frames
//!
//! [`apply_plain_bar`] paints each existing frame in place, with progress tracking frame index.
//! [`apply_resampled_bar`] re-times the animation to a fixed frame rate, and builds a new
//! [`Sequence`] where progress tracks playback time.

use crate::error::CatResult;
use crate::frame::{Animation, Frame, FrameKind, FrameRef, Rect, Sequence, SequenceFrame};
use crate::palette::{inject_color, Palette};
use crate::timing::{progress_width, FrameInterval};
use crate::{BarConfig, BarPosition};
use imgref::ImgVec;
use rgb::RGB8;
use std::ops::Range;

/// Canvas rows covered by the bar: `0..bar_height` at the top,
/// `canvas_height - bar_height..canvas_height` at the bottom.
#[must_use]
pub fn bar_rows(canvas_height: u16, bar_height: u16, position: BarPosition) -> Range<u32> {
    let canvas_height = u32::from(canvas_height);
    let bar_height = u32::from(bar_height).min(canvas_height);
    match position {
        BarPosition::Top => 0..bar_height,
        BarPosition::Bottom => canvas_height - bar_height..canvas_height,
    }
}

/// The area of the bar when it's `width` columns long
fn bar_rect(rows: &Range<u32>, width: u16) -> Rect {
    Rect::new(0, rows.start, width.into(), rows.end)
}

/// Draws the bar on every frame, in place. Frame `i` of `n` gets `(i+1)/n` of the width,
/// regardless of frame delays.
///
/// The bar color is added to the frame's palette if there's room, otherwise
/// the closest existing color is used.
pub fn apply_plain_bar(animation: &mut Animation, bar: &BarConfig) {
    let rows = bar.rows(animation.height);
    let n = animation.frames.len() as u64;
    let width = animation.width;
    for (i, frame) in animation.frames.iter_mut().enumerate() {
        let area = bar_rect(&rows, progress_width(i as u64 + 1, n, width));
        if frame.rect().intersect(&area).is_none() {
            continue;
        }
        let index = frame.color_index(bar.color);
        frame.fill_canvas_rect(&area, index);
    }
}

/// Builds a new sequence with frames re-timed to `interval`, each showing the bar
/// at the width for the moment the frame ends.
///
/// Frames that don't overlap the bar are reused without copying. Every content frame
/// with a non-empty bar is followed by a zero-delay frame with just the bar in it.
#[must_use]
pub fn apply_resampled_bar<'a>(animation: &'a Animation, bar: &BarConfig, interval: FrameInterval) -> Sequence<'a> {
    let total = animation.total_delay();
    let estimated_slices = total / u64::from(interval.delay()) + animation.frames.len() as u64;
    let mut resampler = Resampler {
        rows: bar.rows(animation.height),
        color: bar.color,
        width: animation.width,
        total,
        elapsed: 0,
        out: Sequence::with_capacity(animation, (estimated_slices * 2) as usize),
    };

    for frame in &animation.frames {
        for slice in interval.slices(frame.delay) {
            resampler.insert_slice(frame, slice);
        }
    }

    let out = resampler.out;
    log::info!("re-timed {} frames into {} ({} newly built)",
        animation.frames.len(), out.frames.len(),
        out.frames.iter().filter(|f| !f.image.is_shared()).count());
    out
}

/// Plain mode when `fps` is 0, re-timed otherwise
pub fn apply_bar<'a>(animation: &'a mut Animation, bar: &BarConfig) -> CatResult<Sequence<'a>> {
    if bar.fps == 0 {
        apply_plain_bar(animation, bar);
        Ok(animation.as_sequence())
    } else {
        let interval = FrameInterval::from_fps(bar.fps)?;
        Ok(apply_resampled_bar(animation, bar, interval))
    }
}

struct Resampler<'a> {
    rows: Range<u32>,
    color: RGB8,
    width: u16,
    total: u64,
    /// Start of the next slice
    elapsed: u64,
    out: Sequence<'a>,
}

impl<'a> Resampler<'a> {
    fn insert_slice(&mut self, frame: &'a Frame, delay: u16) {
        self.elapsed += u64::from(delay);
        let w = progress_width(self.elapsed, self.total, self.width);
        let area = bar_rect(&self.rows, w);

        let image = match patched_frame(frame, &area, self.color) {
            Some(patched) => FrameRef::Owned(patched),
            None => FrameRef::Shared(frame),
        };
        self.out.frames.push(SequenceFrame {
            image,
            delay,
            dispose: frame.dispose,
            kind: FrameKind::Content,
        });

        if let Some(filler) = filler_frame(&area, self.color, frame) {
            self.out.frames.push(SequenceFrame {
                image: FrameRef::Owned(filler),
                delay: 0,
                dispose: frame.dispose,
                kind: FrameKind::Filler,
            });
        }
    }
}

/// Copy of the frame with the bar drawn over it, or `None` if the bar misses the frame
fn patched_frame(frame: &Frame, area: &Rect, color: RGB8) -> Option<Frame> {
    frame.rect().intersect(area)?;

    let injected = inject_color(&frame.palette, frame.transparent, color);
    let mut patched = frame.clone();
    patched.palette = injected.palette;
    if let Some(remap) = injected.remap {
        let n = remap.apply(patched.pixels.buf_mut());
        log::debug!("remapped {n} pixels from index {} to {}", remap.from, remap.to);
    }
    patched.fill_canvas_rect(area, injected.index);
    Some(patched)
}

/// Frame covering exactly the bar area, in a single color
fn filler_frame(area: &Rect, color: RGB8, source: &Frame) -> Option<Frame> {
    if area.is_empty() {
        return None;
    }
    let width = area.width() as usize;
    let height = area.height() as usize;
    Some(Frame {
        left: area.left as u16,
        top: area.top as u16,
        pixels: ImgVec::new(vec![0; width * height], width, height),
        palette: Palette::from_iter([color]),
        transparent: None,
        delay: 0,
        dispose: source.dispose,
    })
}
