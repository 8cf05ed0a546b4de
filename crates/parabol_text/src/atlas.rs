//! Glyph atlas pages
//!
//! An [`AtlasPage`] covers one code-point-aligned range `[from, to)` of one
//! style variant and owns a single texture holding every glyph of that range.
//! Pages are generated lazily: nothing is measured, rasterized or uploaded
//! until the first glyph lookup into the page, and then the whole range is
//! packed and uploaded at once.
//!
//! Packing lays cells out in row-major order with a fixed column count of
//! `ceil(sqrt(range)) * 1.5`; a row is as tall as its tallest cell.

use crate::rasterizer::{GlyphRasterizer, RasterizedGlyph, StyledFace};
use crate::model::TextStyle;
use parabol_paint::{ClipRect, TextureBitmap, TextureId, TextureUploader, Upload};
use rustc_hash::FxHashMap;

/// Highest code point + 1
const CODE_POINT_LIMIT: u32 = 0x11_0000;

/// A glyph's cell within its atlas page
///
/// Immutable once produced; stays valid until its page is invalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub codepoint: char,
    /// Atlas-local position of the cell
    pub u: u32,
    pub v: u32,
    pub width: u32,
    pub height: u32,
    /// Texture of the owning page
    pub texture: TextureId,
    /// Pixel size of the owning page's atlas
    pub atlas_width: u32,
    pub atlas_height: u32,
}

impl Glyph {
    /// Normalized `[u_min, v_min, u_max, v_max]` within the owning page
    pub fn uv_bounds(&self) -> [f32; 4] {
        let w = self.atlas_width.max(1) as f32;
        let h = self.atlas_height.max(1) as f32;
        [
            self.u as f32 / w,
            self.v as f32 / h,
            (self.u + self.width) as f32 / w,
            (self.v + self.height) as f32 / h,
        ]
    }
}

/// First code point of the page containing `codepoint`
pub fn page_start(codepoint: u32, chars_per_page: u32) -> u32 {
    let size = chars_per_page.max(1);
    (codepoint / size) * size
}

/// Cell placements produced by [`pack_cells`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedLayout {
    /// Top-left corner of each cell, in input order
    pub positions: Vec<(u32, u32)>,
    /// Bitmap size covering every cell plus one padding unit, at least 1x1
    pub width: u32,
    pub height: u32,
}

/// Number of cells per row for a range of `range` code points
pub fn columns_for_range(range: u32) -> u32 {
    (((range as f64).sqrt().ceil() * 1.5) as u32).max(1)
}

/// Row-major shelf packing of `cells` (width, height)
pub fn pack_cells(cells: &[(u32, u32)], columns: u32, padding: u32) -> PackedLayout {
    let columns = columns.max(1);
    let mut positions = Vec::with_capacity(cells.len());

    let mut x = 0u32;
    let mut y = 0u32;
    let mut in_row = 0u32;
    let mut row_height = 0u32;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    for &(width, height) in cells {
        if in_row >= columns {
            x = 0;
            y += row_height + padding;
            in_row = 0;
            row_height = 0;
        }

        positions.push((x, y));
        max_x = max_x.max(x + width);
        max_y = max_y.max(y + height);
        row_height = row_height.max(height);

        x += width + padding;
        in_row += 1;
    }

    PackedLayout {
        positions,
        width: (max_x + padding).max(1),
        height: (max_y + padding).max(1),
    }
}

/// Draw `raster` into the cell at `(u, v)`, baseline `ascent` px below the top
///
/// Ink is clipped to the cell and its trailing padding, so slanted or
/// emboldened outlines never reach the next cell.
pub fn blit_glyph(
    bitmap: &mut TextureBitmap,
    raster: &RasterizedGlyph,
    (u, v): (u32, u32),
    (width, height): (u32, u32),
    padding: u32,
    ascent: i32,
) {
    if raster.width == 0 || raster.height == 0 {
        return;
    }
    let clip = ClipRect {
        x: u,
        y: v,
        width: width + padding,
        height: height + padding,
    };
    bitmap.blit_coverage(
        u as i32 + raster.left,
        v as i32 + ascent - raster.top,
        raster.width,
        raster.height,
        &raster.bitmap,
        clip,
    );
}

/// One lazily generated atlas texture for a code-point range of one style
#[derive(Debug)]
pub struct AtlasPage {
    style: TextStyle,
    from: u32,
    to: u32,
    texture: TextureId,
    padding: u32,
    generated: bool,
    /// Whether the backend accepted (or was scheduled to receive) the texture
    backed: bool,
    glyphs: FxHashMap<char, Glyph>,
    width: u32,
    height: u32,
}

impl AtlasPage {
    /// A page for `[from, to)`, clamped to the Unicode range
    pub fn new(style: TextStyle, from: u32, to: u32, texture: TextureId, padding: u32) -> Self {
        Self {
            style,
            from,
            to: to.min(CODE_POINT_LIMIT),
            texture,
            padding,
            generated: false,
            backed: false,
            glyphs: FxHashMap::default(),
            width: 0,
            height: 0,
        }
    }

    /// The page of `chars_per_page` code points that contains `c`
    pub fn for_char(
        style: TextStyle,
        c: char,
        chars_per_page: u32,
        texture: TextureId,
        padding: u32,
    ) -> Self {
        let from = page_start(c as u32, chars_per_page);
        Self::new(style, from, from.saturating_add(chars_per_page.max(1)), texture, padding)
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn range(&self) -> std::ops::Range<u32> {
        self.from..self.to
    }

    pub fn texture(&self) -> &TextureId {
        &self.texture
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Generated and holding a texture draws may bind
    pub fn is_backed(&self) -> bool {
        self.generated && self.backed
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn contains(&self, c: char) -> bool {
        (self.from..self.to).contains(&(c as u32))
    }

    /// Glyph for `c`, generating the page on first access
    pub fn glyph(
        &mut self,
        c: char,
        face: &StyledFace,
        rasterizer: &mut GlyphRasterizer,
        uploader: &TextureUploader,
    ) -> Option<&Glyph> {
        if !self.contains(c) {
            return None;
        }
        self.generate(face, rasterizer, uploader);
        self.glyphs.get(&c)
    }

    /// Measure, pack, rasterize and upload the whole range. No-op once generated.
    pub fn generate(
        &mut self,
        face: &StyledFace,
        rasterizer: &mut GlyphRasterizer,
        uploader: &TextureUploader,
    ) {
        if self.generated {
            return;
        }

        let chars: Vec<char> = (self.from..self.to).filter_map(char::from_u32).collect();
        let cells: Vec<(u32, u32)> = chars
            .iter()
            .map(|&c| {
                face.cell_size(c).unwrap_or_else(|e| {
                    tracing::warn!("No metrics for {:?} in {:?}: {}", c, self.style, e);
                    (0, 0)
                })
            })
            .collect();

        let layout = pack_cells(&cells, columns_for_range(self.to - self.from), self.padding);
        let mut bitmap = TextureBitmap::new(layout.width, layout.height);
        self.width = bitmap.width();
        self.height = bitmap.height();

        let ascent = face.ascent().round() as i32;
        self.glyphs.clear();
        self.glyphs.reserve(chars.len());
        for ((&c, &(width, height)), &(u, v)) in chars.iter().zip(&cells).zip(&layout.positions) {
            match rasterizer.rasterize(face, c) {
                Ok(raster) => blit_glyph(
                    &mut bitmap,
                    &raster,
                    (u, v),
                    (width, height),
                    self.padding,
                    ascent,
                ),
                Err(e) => tracing::warn!("Failed to rasterize {:?}: {}", c, e),
            }

            self.glyphs.insert(
                c,
                Glyph {
                    codepoint: c,
                    u,
                    v,
                    width,
                    height,
                    texture: self.texture.clone(),
                    atlas_width: self.width,
                    atlas_height: self.height,
                },
            );
        }

        self.backed = match uploader.upload(self.texture.clone(), bitmap) {
            Ok(Upload::Registered) => true,
            Ok(Upload::Scheduled) => {
                tracing::debug!("Upload of {} deferred to the render thread", self.texture);
                true
            }
            Err(e) => {
                tracing::error!("Failed to upload glyph atlas {}: {}", self.texture, e);
                false
            }
        };
        self.generated = true;

        tracing::debug!(
            "Generated {:?} atlas page U+{:04X}..U+{:04X} ({}x{}) as {}",
            self.style,
            self.from,
            self.to,
            self.width,
            self.height,
            self.texture
        );
    }

    /// Release the texture and forget every glyph
    ///
    /// The page returns to the ungenerated state; its texture id is never
    /// registered again.
    pub fn destroy(&mut self, uploader: &TextureUploader) {
        if self.generated && self.backed {
            uploader.release(self.texture.clone());
        }
        self.glyphs.clear();
        self.width = 0;
        self.height = 0;
        self.generated = false;
        self.backed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_start_alignment() {
        assert_eq!(page_start('A' as u32, 256), 0);
        assert_eq!(page_start(0x100, 256), 0x100);
        assert_eq!(page_start(0x1FF, 256), 0x100);
        assert_eq!(page_start(1000, 64), 960);
    }

    #[test]
    fn test_page_for_char_range() {
        let page = AtlasPage::for_char(
            TextStyle::Normal,
            'é',
            256,
            TextureId::new("parabol", "test"),
            5,
        );
        assert_eq!(page.range(), 0..256);
        assert!(page.contains('a'));
        assert!(!page.contains('Ā'));
        assert!(!page.is_generated());
    }

    #[test]
    fn test_final_page_is_partial() {
        let page = AtlasPage::for_char(
            TextStyle::Normal,
            '\u{10FFFF}',
            1000,
            TextureId::new("parabol", "test"),
            5,
        );
        assert_eq!(page.range(), 0x10_FF90..0x11_0000);
    }

    #[test]
    fn test_columns_for_range() {
        assert_eq!(columns_for_range(256), 24);
        assert_eq!(columns_for_range(1), 1);
        assert_eq!(columns_for_range(10), 6);
    }

    #[test]
    fn test_pack_wraps_rows() {
        let cells = [(10, 20), (5, 30), (8, 10)];
        let layout = pack_cells(&cells, 2, 2);

        assert_eq!(layout.positions, vec![(0, 0), (12, 0), (0, 32)]);
        assert_eq!(layout.width, 17 + 2);
        assert_eq!(layout.height, 42 + 2);
    }

    #[test]
    fn test_pack_cells_do_not_overlap() {
        let cells: Vec<(u32, u32)> = (0..50).map(|i| (3 + i % 7, 9 + i % 4)).collect();
        let layout = pack_cells(&cells, columns_for_range(50), 1);

        for (i, (&(ax, ay), &(aw, ah))) in layout.positions.iter().zip(&cells).enumerate() {
            assert!(ax + aw <= layout.width && ay + ah <= layout.height);
            for (&(bx, by), &(bw, bh)) in layout.positions[i + 1..].iter().zip(&cells[i + 1..]) {
                let disjoint = ax + aw <= bx || bx + bw <= ax || ay + ah <= by || by + bh <= ay;
                assert!(disjoint, "cells {:?} and {:?} overlap", (ax, ay), (bx, by));
            }
        }
    }

    #[test]
    fn test_pack_empty_is_one_pixel() {
        let layout = pack_cells(&[], 4, 0);
        assert_eq!((layout.width, layout.height), (1, 1));
    }

    /// Coverage of a right-leaning bar `width` px wide at the top, shifted
    /// right by one pixel every `rise` rows
    fn slanted_bar(width: u32, height: u32, rise: u32) -> RasterizedGlyph {
        let full_width = width + height / rise;
        let mut bitmap = vec![0u8; (full_width * height) as usize];
        for y in 0..height {
            let shift = (height - 1 - y) / rise;
            for x in shift..shift + width {
                bitmap[(y * full_width + x) as usize] = 255;
            }
        }
        RasterizedGlyph {
            bitmap,
            width: full_width,
            height,
            left: 0,
            top: height as i32,
        }
    }

    #[test]
    fn test_slanted_ink_stays_in_its_cell() {
        let padding = 2;
        // Ink reaches 12 px past an 8 px cell, well past the padding
        let cells = [(8, 20), (8, 20)];
        let layout = pack_cells(&cells, 2, padding);
        let mut bitmap = TextureBitmap::new(layout.width, layout.height);

        let raster = slanted_bar(8, 20, 1);
        for (&pos, &cell) in layout.positions.iter().zip(&cells) {
            blit_glyph(&mut bitmap, &raster, pos, cell, padding, 20);
        }

        let ink_columns = |from: u32, to: u32| -> Vec<u32> {
            (from..to)
                .filter(|&x| (0..layout.height).any(|y| bitmap.alpha_at(x, y) > 0))
                .collect()
        };
        let (first_u, _) = layout.positions[0];
        let (second_u, _) = layout.positions[1];
        let first = ink_columns(first_u, second_u);
        let second = ink_columns(second_u, layout.width);

        assert_eq!(first.first(), Some(&first_u));
        assert_eq!(first.last(), Some(&(first_u + 8 + padding - 1)));
        assert_eq!(second.first(), Some(&second_u));
        // Leftmost pixel of the second cell only has its own ink: the bottom row
        let own_column: Vec<u8> = (0..20).map(|y| bitmap.alpha_at(second_u, y)).collect();
        assert_eq!(own_column.iter().filter(|&&a| a > 0).count(), 1);
        assert_eq!(own_column[19], 255);
    }

    #[test]
    fn test_empty_raster_draws_nothing() {
        let mut bitmap = TextureBitmap::new(4, 4);
        let raster = RasterizedGlyph {
            bitmap: Vec::new(),
            width: 0,
            height: 0,
            left: 0,
            top: 0,
        };
        blit_glyph(&mut bitmap, &raster, (0, 0), (4, 4), 0, 4);
        assert!((0..4).all(|x| (0..4).all(|y| bitmap.alpha_at(x, y) == 0)));
    }

    #[test]
    fn test_uv_bounds_are_normalized() {
        let glyph = Glyph {
            codepoint: 'a',
            u: 10,
            v: 20,
            width: 10,
            height: 20,
            texture: TextureId::new("parabol", "test"),
            atlas_width: 40,
            atlas_height: 80,
        };
        assert_eq!(glyph.uv_bounds(), [0.25, 0.25, 0.5, 0.5]);
    }
}
