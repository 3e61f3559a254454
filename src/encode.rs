//! Writing [`Sequence`]s out as GIF

use crate::error::{CatResult, Error};
use crate::frame::{Frame, Sequence, SequenceFrame};
use crate::progress::ProgressReporter;
use std::borrow::Cow;
use std::cell::Cell;
use std::io::Write;
use std::iter::repeat;
use std::rc::Rc;

struct CountingWriter<W> {
    writer: W,
    written: Rc<Cell<u64>>,
}

impl<W: Write> Write for CountingWriter<W> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize, std::io::Error> {
        let len = self.writer.write(buf)?;
        self.written.set(self.written.get() + len as u64);
        Ok(len)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), std::io::Error> {
        self.writer.flush()
    }
}

/// Encodes every frame of the sequence, each with its own local palette.
///
/// `ProgressReporter.increase()` is called each time a frame has been written.
pub fn write_sequence<W: Write>(writer: W, sequence: &Sequence<'_>, reporter: &mut dyn ProgressReporter) -> CatResult<()> {
    let written = Rc::new(Cell::new(0));
    let w = CountingWriter {
        writer,
        written: written.clone(),
    };
    let mut enc = gif::Encoder::new(w, sequence.width, sequence.height, &[])?;
    // without the extension the animation plays once, same as when it's decoded
    if sequence.repeat != gif::Repeat::Finite(0) {
        enc.write_extension(gif::ExtensionData::Repetitions(sequence.repeat))?;
    }

    for f in &sequence.frames {
        enc.write_frame(&gif_frame(f))?;
        reporter.written_bytes(written.get());
        if !reporter.increase() {
            return Err(Error::Aborted);
        }
    }

    let mut w = enc.into_inner()?;
    w.flush()?;
    reporter.written_bytes(written.get());
    log::debug!("wrote {} frames, {} bytes", sequence.frames.len(), written.get());
    Ok(())
}

fn gif_frame<'a>(f: &'a SequenceFrame<'_>) -> gif::Frame<'a> {
    let image: &'a Frame = &f.image;
    let mut pal_rgb = image.palette.to_rgb_bytes();
    // Palette should be power-of-two sized
    let needed_size = 3 * image.palette.len().max(2).next_power_of_two();
    pal_rgb.extend(repeat(0).take(needed_size - pal_rgb.len()));

    gif::Frame {
        delay: f.delay,
        dispose: f.dispose,
        transparent: image.transparent,
        top: image.top,
        left: image.left,
        width: image.pixels.width() as u16,
        height: image.pixels.height() as u16,
        palette: Some(pal_rgb),
        buffer: contiguous_pixels(image),
        ..gif::Frame::default()
    }
}

fn contiguous_pixels(image: &Frame) -> Cow<'_, [u8]> {
    let pixels = &image.pixels;
    let len = pixels.width() * pixels.height();
    if pixels.width() == pixels.stride() {
        if let Some(buf) = pixels.buf().get(..len) {
            return Cow::Borrowed(buf);
        }
    }
    Cow::Owned(pixels.rows().flatten().copied().collect())
}
