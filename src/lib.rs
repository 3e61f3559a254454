/*
 gif-progress: playback progress bars for animated GIFs
 © 2026 gif-progress contributors

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as
 published by the Free Software Foundation, either version 3 of the
 License, or (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

//! Burns a progress bar into every frame of an animated GIF.
//!
//! ```no_run
//! # fn main() -> gif_progress::CatResult<()> {
//! let input = std::fs::File::open("in.gif")?;
//! let mut anim = gif_progress::read_animation(input)?;
//! let bar = gif_progress::BarConfig { fps: 20, ..Default::default() };
//! let seq = gif_progress::apply_bar(&mut anim, &bar)?;
//! let out = std::fs::File::create("out.gif")?;
//! gif_progress::write_sequence(out, &seq, &mut gif_progress::progress::NoProgress {})?;
//! # Ok(()) }
//! ```

mod error;
pub use crate::error::*;
pub mod palette;
pub mod frame;
pub mod timing;
pub mod overlay;
mod decode;
mod encode;
pub mod progress;

pub use crate::decode::read_animation;
pub use crate::encode::write_sequence;
pub use crate::frame::{Animation, Frame, FrameKind, FrameRef, Rect, Sequence, SequenceFrame};
pub use crate::overlay::{apply_bar, apply_plain_bar, apply_resampled_bar, bar_rows};
pub use crate::timing::{progress_width, FrameInterval};
pub use rgb::RGB8;

use std::ops::Range;

/// Which edge of the canvas the bar sticks to
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum BarPosition {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BarConfig {
    pub position: BarPosition,
    /// In pixels
    pub height: u16,
    pub color: RGB8,
    /// Frame rate to re-time the animation to. 0 keeps the original frames.
    pub fps: u16,
}

impl BarConfig {
    /// Canvas rows covered by the bar
    #[must_use]
    pub fn rows(&self, canvas_height: u16) -> Range<u32> {
        bar_rows(canvas_height, self.height, self.position)
    }
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            position: BarPosition::Bottom,
            height: 5,
            color: RGB8::new(0xcc, 0xcc, 0xcc),
            fps: 0,
        }
    }
}
