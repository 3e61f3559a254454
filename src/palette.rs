//! Per-frame color tables and bar color injection
//!
//! GIF frames can't have more than 256 colors. [`inject_color`] finds room for one more
//! color by merging the two most similar entries when the table is already (nearly) full.

use rgb::RGB8;
use std::fmt;

/// The GIF format limit
pub const MAX_COLORS: usize = 256;

/// Palettes this long are treated as full, and get a pair of colors merged
/// instead of growing.
pub const MERGE_THRESHOLD: usize = 255;

/// Fixed-capacity color table
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [RGB8; MAX_COLORS],
    len: u16,
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: [RGB8::new(0, 0, 0); MAX_COLORS],
            len: 0,
        }
    }

    /// Reads packed `RGBRGB…` triplets, as stored in GIF color tables.
    /// Anything beyond 256 colors is ignored.
    #[must_use]
    pub fn from_rgb_bytes(bytes: &[u8]) -> Self {
        bytes.chunks_exact(3).map(|c| RGB8::new(c[0], c[1], c[2])).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == MAX_COLORS
    }

    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[RGB8] {
        &self.colors[..self.len()]
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: u8) -> Option<RGB8> {
        self.colors().get(index as usize).copied()
    }

    /// Appends the color, and returns its index. `None` if there are already 256 colors.
    pub fn push(&mut self, color: RGB8) -> Option<u8> {
        if self.is_full() {
            return None;
        }
        let len = self.len();
        self.colors[len] = color;
        self.len += 1;
        Some(len as u8)
    }

    /// Overwrites an existing entry. Indices past the end are ignored.
    pub fn set(&mut self, index: u8, color: RGB8) {
        let len = self.len();
        if let Some(slot) = self.colors[..len].get_mut(index as usize) {
            *slot = color;
        }
    }

    /// Index of an exact match
    #[must_use]
    pub fn position(&self, color: RGB8) -> Option<u8> {
        self.colors().iter().position(|&c| c == color).map(|i| i as u8)
    }

    /// Closest entry by plain RGB distance
    #[must_use]
    pub fn nearest(&self, color: RGB8) -> Option<u8> {
        self.colors().iter()
            .enumerate()
            .min_by_key(|&(_, &c)| rgb_distance_sq(c, color))
            .map(|(i, _)| i as u8)
    }

    /// Packed `RGBRGB…` bytes
    #[must_use]
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        rgb::bytemuck::cast_slice(self.colors()).to_vec()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.colors()).finish()
    }
}

impl FromIterator<RGB8> for Palette {
    fn from_iter<I: IntoIterator<Item = RGB8>>(iter: I) -> Self {
        let mut pal = Self::new();
        for color in iter.into_iter().take(MAX_COLORS) {
            pal.push(color);
        }
        pal
    }
}

/// Pixels that used index `from` should now use `to`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Remap {
    pub from: u8,
    pub to: u8,
}

impl Remap {
    /// Returns the number of pixels changed
    pub fn apply(&self, pixels: &mut [u8]) -> usize {
        let mut changed = 0;
        for px in pixels.iter_mut().filter(|px| **px == self.from) {
            *px = self.to;
            changed += 1;
        }
        changed
    }
}

/// Result of [`inject_color`]
#[derive(Debug, Clone)]
pub struct Injection {
    /// The palette containing the new color
    pub palette: Palette,
    /// Where the new color is
    pub index: u8,
    /// Has to be applied to the frame's pixels before the new color is used,
    /// otherwise pixels of the merged-away color would change to the new color
    pub remap: Option<Remap>,
}

/// Makes `color` available in a copy of `palette`.
///
/// The transparent index is left alone: it's never merged with another entry.
#[must_use]
pub fn inject_color(palette: &Palette, transparent: Option<u8>, color: RGB8) -> Injection {
    let mut palette = palette.clone();

    if let Some(index) = palette.position(color).filter(|&i| Some(i) != transparent) {
        return Injection { palette, index, remap: None };
    }

    if palette.len() < MERGE_THRESHOLD {
        if let Some(index) = palette.push(color) {
            return Injection { palette, index, remap: None };
        }
    }

    match closest_pair(&palette, transparent) {
        Some(remap) => {
            log::debug!("merging palette entry {} into {} to make room for the bar", remap.from, remap.to);
            palette.set(remap.from, color);
            Injection { palette, index: remap.from, remap: Some(remap) }
        },
        None => {
            // there's no pair to merge, so settle for whatever is closest
            let index = match palette.push(color) {
                Some(i) => i,
                None => palette.nearest(color).unwrap_or(0),
            };
            Injection { palette, index, remap: None }
        },
    }
}

/// The two most similar entries. The higher index is the one to free.
fn closest_pair(palette: &Palette, transparent: Option<u8>) -> Option<Remap> {
    let lch: Vec<_> = palette.colors().iter().map(|&c| Lch::from(c)).collect();
    let mut best = None;
    let mut best_distance = f64::INFINITY;
    for (i, a) in lch.iter().enumerate() {
        if Some(i as u8) == transparent {
            continue;
        }
        for (j, b) in lch.iter().enumerate().skip(i + 1) {
            if Some(j as u8) == transparent {
                continue;
            }
            let d = a.distance(b);
            if d < best_distance {
                best_distance = d;
                best = Some(Remap { from: j as u8, to: i as u8 });
            }
        }
    }
    best
}

#[inline]
fn rgb_distance_sq(a: RGB8, b: RGB8) -> u32 {
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    (dr * dr + dg * dg + db * db) as u32
}

/// CIE L*C*h(uv), D65
#[derive(Debug, Copy, Clone)]
struct Lch {
    l: f64,
    c: f64,
    h: f64,
}

const WHITE_X: f64 = 0.950_47;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.088_83;

impl From<RGB8> for Lch {
    fn from(px: RGB8) -> Self {
        let r = srgb_to_linear(px.r);
        let g = srgb_to_linear(px.g);
        let b = srgb_to_linear(px.b);

        let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
        let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
        let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;

        let yr = y / WHITE_Y;
        let l = if yr > (6. / 29.0_f64).powi(3) {
            116. * yr.cbrt() - 16.
        } else {
            (29. / 3.0_f64).powi(3) * yr
        };

        let (u, v) = {
            let d = x + 15. * y + 3. * z;
            let dn = WHITE_X + 15. * WHITE_Y + 3. * WHITE_Z;
            if d > 0. {
                let up = 4. * x / d - 4. * WHITE_X / dn;
                let vp = 9. * y / d - 9. * WHITE_Y / dn;
                (13. * l * up, 13. * l * vp)
            } else {
                (0., 0.)
            }
        };

        Self {
            l,
            c: u.hypot(v),
            h: v.atan2(u),
        }
    }
}

impl Lch {
    /// The hue difference is weighted by chroma, so hues of grays don't matter
    fn distance(&self, other: &Self) -> f64 {
        let dl = self.l - other.l;
        let dc = self.c - other.c;
        let dh = 2. * (self.c * other.c).sqrt() * ((self.h - other.h) / 2.).sin();
        (dl * dl + dc * dc + dh * dh).sqrt()
    }
}

#[inline]
fn srgb_to_linear(c: u8) -> f64 {
    let c = f64::from(c) / 255.;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS7: [u8; 7] = [0, 42, 85, 127, 170, 212, 255];
    const LEVELS6: [u8; 6] = [0, 51, 102, 153, 204, 255];

    /// 255 well-separated colors
    fn grid_palette() -> Palette {
        (0..MERGE_THRESHOLD)
            .map(|k| RGB8::new(LEVELS7[k % 7], LEVELS7[(k / 7) % 7], LEVELS6[k / 49]))
            .collect()
    }

    #[test]
    fn appends_when_there_is_room() {
        let pal: Palette = [RGB8::new(1, 2, 3), RGB8::new(4, 5, 6)].into_iter().collect();
        let inj = inject_color(&pal, None, RGB8::new(200, 200, 200));
        assert_eq!(inj.index, 2);
        assert_eq!(inj.palette.len(), 3);
        assert_eq!(inj.palette.get(2), Some(RGB8::new(200, 200, 200)));
        assert!(inj.remap.is_none());
        // the original is untouched
        assert_eq!(pal.len(), 2);
    }

    #[test]
    fn reuses_exact_match() {
        let pal = grid_palette();
        let existing = pal.get(17).unwrap();
        let inj = inject_color(&pal, None, existing);
        assert_eq!(inj.index, 17);
        assert_eq!(inj.palette, pal);
        assert!(inj.remap.is_none());
    }

    #[test]
    fn transparent_match_is_not_reused() {
        let pal: Palette = [RGB8::new(0, 0, 0), RGB8::new(9, 9, 9)].into_iter().collect();
        let inj = inject_color(&pal, Some(0), RGB8::new(0, 0, 0));
        assert_eq!(inj.index, 2);
    }

    #[test]
    fn full_palette_merges_most_similar_pair() {
        let mut pal = grid_palette();
        let dupe = pal.get(3).unwrap();
        pal.set(100, dupe);
        assert_eq!(pal.len(), 255);

        let mut pixels: Vec<u8> = (0..1000).map(|i| (i % 255) as u8).collect();
        let losers_before = pixels.iter().filter(|&&p| p == 100).count();
        let winners_before = pixels.iter().filter(|&&p| p == 3).count();

        let bar = RGB8::new(1, 2, 3);
        let inj = inject_color(&pal, None, bar);
        assert_eq!(inj.remap, Some(Remap { from: 100, to: 3 }));
        assert_eq!(inj.index, 100);
        assert_eq!(inj.palette.len(), 255);
        assert_eq!(inj.palette.get(100), Some(bar));

        let remapped = inj.remap.unwrap().apply(&mut pixels);
        assert_eq!(remapped, losers_before);
        assert!(pixels.iter().all(|&p| p != 100));
        assert_eq!(pixels.iter().filter(|&&p| p == 3).count(), winners_before + losers_before);

        // every other entry keeps its color
        for i in (0..255u8).filter(|&i| i != 100) {
            assert_eq!(inj.palette.get(i), pal.get(i));
        }
    }

    #[test]
    fn merge_can_free_the_last_slot() {
        let mut pal = grid_palette();
        let dupe = pal.get(10).unwrap();
        pal.set(254, dupe);

        let inj = inject_color(&pal, None, RGB8::new(1, 2, 3));
        assert_eq!(inj.remap, Some(Remap { from: 254, to: 10 }));
        assert_eq!(inj.palette.len(), 255);
        assert_eq!(inj.palette.get(254), Some(RGB8::new(1, 2, 3)));
    }

    #[test]
    fn merge_skips_transparent_index() {
        let mut pal = grid_palette();
        let dupe = pal.get(5).unwrap();
        pal.set(6, dupe);

        let inj = inject_color(&pal, Some(6), RGB8::new(1, 2, 3));
        let remap = inj.remap.unwrap();
        assert_ne!(remap.from, 6);
        assert_ne!(remap.to, 6);
        assert_eq!(inj.palette.get(6), Some(dupe));
    }

    #[test]
    fn full_256_palette_stays_at_256() {
        let mut pal = grid_palette();
        pal.push(RGB8::new(255, 255, 254)).unwrap();
        assert!(pal.is_full());
        let inj = inject_color(&pal, None, RGB8::new(1, 2, 3));
        assert_eq!(inj.palette.len(), MAX_COLORS);
        assert!(inj.remap.is_some());
        assert_eq!(inj.palette.get(inj.index), Some(RGB8::new(1, 2, 3)));
    }

    #[test]
    fn push_refuses_257th_color() {
        let mut pal: Palette = (0..=255u8).map(|i| RGB8::new(i, 0, 0)).collect();
        assert!(pal.is_full());
        assert_eq!(pal.push(RGB8::new(0, 1, 0)), None);
        assert_eq!(pal.len(), 256);
    }

    #[test]
    fn set_overwrites_only_existing_entries() {
        let mut pal = grid_palette();
        let last = (MERGE_THRESHOLD - 1) as u8;
        pal.set(last, RGB8::new(1, 2, 3));
        assert_eq!(pal.get(last), Some(RGB8::new(1, 2, 3)));
        pal.set(last + 1, RGB8::new(4, 5, 6));
        assert_eq!(pal.len(), MERGE_THRESHOLD);
        assert_eq!(pal.get(last + 1), None);
        assert_eq!(pal.push(RGB8::new(7, 8, 9)), Some(last + 1));
        assert_eq!(pal.get(last + 1), Some(RGB8::new(7, 8, 9)));
    }

    #[test]
    fn distance() {
        let white = Lch::from(RGB8::new(255, 255, 255));
        let black = Lch::from(RGB8::new(0, 0, 0));
        let red = Lch::from(RGB8::new(255, 0, 0));
        let dark_red = Lch::from(RGB8::new(250, 0, 0));

        assert!((white.l - 100.).abs() < 0.01);
        assert!(black.l.abs() < 0.01);
        assert!(white.distance(&white) < 1e-9);
        assert!((red.distance(&white) - white.distance(&red)).abs() < 1e-9);
        assert!(red.distance(&dark_red) < red.distance(&white));
        assert!(white.distance(&black) > 99.);
    }

    #[test]
    fn nearest_and_bytes() {
        let pal: Palette = [RGB8::new(0, 0, 0), RGB8::new(250, 250, 250)].into_iter().collect();
        assert_eq!(pal.nearest(RGB8::new(200, 200, 200)), Some(1));
        assert_eq!(pal.to_rgb_bytes(), [0, 0, 0, 250, 250, 250]);
        assert_eq!(Palette::from_rgb_bytes(&[1, 2, 3, 4, 5, 6, 7]).colors(), [RGB8::new(1, 2, 3), RGB8::new(4, 5, 6)]);
    }
}
