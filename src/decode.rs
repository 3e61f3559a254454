//! Reading GIFs into indexed [`Animation`]s

use crate::error::{CatResult, Error};
use crate::frame::{Animation, Frame};
use crate::palette::Palette;
use imgref::ImgVec;
use std::io::Read;

/// Decodes all frames, keeping them as palette indices.
///
/// Frames without a local palette get a copy of the global one.
pub fn read_animation<R: Read>(input: R) -> CatResult<Animation> {
    let mut gif_opts = gif::DecodeOptions::new();
    // Important:
    gif_opts.set_color_output(gif::ColorOutput::Indexed);

    let mut decoder = gif_opts.read_info(input)?;
    let global_palette = decoder.global_palette().map(Palette::from_rgb_bytes);
    let width = decoder.width();
    let height = decoder.height();
    let background = decoder.bg_color().map_or(0, |i| i as u8);

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame()? {
        let palette = match (&frame.palette, &global_palette) {
            (Some(local), _) => Palette::from_rgb_bytes(local),
            (None, Some(global)) => global.clone(),
            (None, None) => return Err(Error::NoPalette(frames.len())),
        };
        let (frame_width, frame_height) = (frame.width as usize, frame.height as usize);
        frames.try_reserve(1)?;
        frames.push(Frame {
            left: frame.left,
            top: frame.top,
            pixels: ImgVec::new(frame.buffer.to_vec(), frame_width, frame_height),
            palette,
            transparent: frame.transparent,
            delay: frame.delay,
            dispose: frame.dispose,
        });
    }

    if frames.is_empty() {
        return Err(Error::NoFrames);
    }

    // the loop count extension is only known after reading the frames
    let repeat = decoder.repeat();
    log::debug!("decoded {} frames, {}×{}, {:?}", frames.len(), width, height, repeat);

    Ok(Animation {
        width,
        height,
        repeat,
        background,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(frames: &[(u16, u16, u16, u16, u16)], global: bool) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let pal = if global { &[0, 0, 0, 255, 255, 255][..] } else { &[][..] };
            let mut enc = gif::Encoder::new(&mut out, 8, 8, pal).unwrap();
            enc.set_repeat(gif::Repeat::Finite(3)).unwrap();
            for &(left, top, width, height, delay) in frames {
                let mut f = gif::Frame {
                    left,
                    top,
                    width,
                    height,
                    delay,
                    buffer: vec![1; usize::from(width) * usize::from(height)].into(),
                    ..gif::Frame::default()
                };
                if !global {
                    f.palette = Some(vec![10, 20, 30, 40, 50, 60]);
                }
                enc.write_frame(&f).unwrap();
            }
        }
        out
    }

    #[test]
    fn reads_frames_with_global_palette() {
        let data = encode(&[(0, 0, 8, 8, 10), (2, 3, 4, 2, 25)], true);
        let anim = read_animation(&data[..]).unwrap();
        assert_eq!((anim.width, anim.height), (8, 8));
        assert_eq!(anim.repeat, gif::Repeat::Finite(3));
        assert_eq!(anim.frames.len(), 2);
        assert_eq!(anim.total_delay(), 35);

        let f = &anim.frames[1];
        assert_eq!((f.left, f.top, f.pixels.width(), f.pixels.height()), (2, 3, 4, 2));
        assert!(f.palette.len() >= 2);
        assert_eq!(f.palette.get(1), Some(rgb::RGB8::new(255, 255, 255)));
        assert!(f.pixels.buf().iter().all(|&p| p == 1));
    }

    #[test]
    fn reads_local_palettes() {
        let data = encode(&[(0, 0, 8, 8, 10)], false);
        let anim = read_animation(&data[..]).unwrap();
        assert_eq!(anim.frames[0].palette.get(1), Some(rgb::RGB8::new(40, 50, 60)));
    }

    #[test]
    fn rejects_empty_animation() {
        let data = encode(&[], true);
        assert!(matches!(read_animation(&data[..]), Err(Error::NoFrames)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(read_animation(&b"not a gif at all"[..]).is_err());
    }
}
