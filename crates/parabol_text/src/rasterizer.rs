//! Glyph rasterization using swash
//!
//! A [`StyledFace`] is one of the four style derivations of a font at a fixed
//! device pixel size. Bold and italic are synthesized from the single loaded
//! face: bold by emboldening the outline, italic by skewing it.

use crate::font::FontFace;
use crate::model::TextStyle;
use crate::{FontLoadError, Result};
use std::sync::Arc;
use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::{Angle, Format, Transform};

/// Slant of synthesized italics
const ITALIC_SKEW_DEGREES: f32 = 12.0;

/// Outline growth of synthesized bold, as a fraction of the pixel size
const BOLD_STRENGTH_PER_PX: f32 = 0.035;

/// Rasterized glyph coverage with placement
#[derive(Debug, Clone)]
pub struct RasterizedGlyph {
    /// 8-bit coverage, row-major
    pub bitmap: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the left edge
    pub left: i32,
    /// Offset from the baseline up to the top edge
    pub top: i32,
}

/// A font face derived for one style at one device pixel size
#[derive(Debug, Clone)]
pub struct StyledFace {
    font: Arc<FontFace>,
    style: TextStyle,
    size_px: f32,
    italic_padding: f32,
}

impl StyledFace {
    pub fn new(font: Arc<FontFace>, style: TextStyle, size_px: f32, italic_padding: f32) -> Self {
        Self {
            font,
            style,
            size_px,
            italic_padding,
        }
    }

    pub fn font(&self) -> &Arc<FontFace> {
        &self.font
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    fn swash_font(&self) -> Result<swash::FontRef<'_>> {
        swash::FontRef::from_index(self.font.data(), self.font.face_index() as usize).ok_or_else(
            || {
                FontLoadError::InvalidFormat(format!(
                    "'{}' rejected by swash",
                    self.font.family_name()
                ))
                .into()
            },
        )
    }

    fn embolden_strength(&self) -> f32 {
        if self.style.is_bold() {
            self.size_px * BOLD_STRENGTH_PER_PX
        } else {
            0.0
        }
    }

    /// Extra cell width on top of the advance
    fn extra_width(&self) -> f32 {
        let slant = if self.style.is_italic() {
            self.italic_padding
        } else {
            0.0
        };
        slant + self.embolden_strength()
    }

    /// Distance from the top of a cell to the baseline
    pub fn ascent(&self) -> f32 {
        self.font.metrics().ascender_px(self.size_px)
    }

    /// Logical line height: ascent + descent + line gap
    pub fn line_height(&self) -> f32 {
        self.font.metrics().line_height_px(self.size_px)
    }

    /// Advance of `c` in device pixels
    pub fn advance(&self, c: char) -> Result<f32> {
        let font = self.swash_font()?;
        let glyph_id = font.charmap().map(c);
        Ok(font
            .glyph_metrics(&[])
            .scale(self.size_px)
            .advance_width(glyph_id))
    }

    /// Atlas cell size of `c`: advance (plus slant/bold allowance) by line height
    pub fn cell_size(&self, c: char) -> Result<(u32, u32)> {
        let width = (self.advance(c)? + self.extra_width()).ceil().max(0.0) as u32;
        let height = self.line_height().ceil().max(0.0) as u32;
        Ok((width, height))
    }
}

/// Glyph rasterizer using swash
pub struct GlyphRasterizer {
    /// Swash scale context (caches scaling state)
    scale_context: ScaleContext,
}

impl GlyphRasterizer {
    pub fn new() -> Self {
        Self {
            scale_context: ScaleContext::new(),
        }
    }

    /// Rasterize `c` with the face's style applied
    pub fn rasterize(&mut self, face: &StyledFace, c: char) -> Result<RasterizedGlyph> {
        let font = face.swash_font()?;
        let glyph_id = font.charmap().map(c);

        let mut scaler = self
            .scale_context
            .builder(font)
            .size(face.size_px)
            .build();

        let mut render = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ]);
        render.format(Format::Alpha);
        if face.style.is_bold() {
            render.embolden(face.embolden_strength());
        }
        if face.style.is_italic() {
            render.transform(Some(Transform::skew(
                Angle::from_degrees(ITALIC_SKEW_DEGREES),
                Angle::from_degrees(0.0),
            )));
        }

        match render.render(&mut scaler, glyph_id) {
            Some(image) => {
                // Atlases store coverage only; keep the alpha of color glyphs
                let bitmap = match image.content {
                    Content::Mask => image.data,
                    Content::Color => image.data.chunks_exact(4).map(|px| px[3]).collect(),
                    Content::SubpixelMask => image
                        .data
                        .chunks_exact(4)
                        .map(|px| ((px[0] as u16 + px[1] as u16 + px[2] as u16) / 3) as u8)
                        .collect(),
                };
                Ok(RasterizedGlyph {
                    width: image.placement.width,
                    height: image.placement.height,
                    left: image.placement.left,
                    top: image.placement.top,
                    bitmap,
                })
            }
            // Empty glyph (like space) - no bitmap
            None => Ok(RasterizedGlyph {
                bitmap: Vec::new(),
                width: 0,
                height: 0,
                left: 0,
                top: 0,
            }),
        }
    }
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterizer_creation() {
        let _rasterizer = GlyphRasterizer::new();
    }
}
