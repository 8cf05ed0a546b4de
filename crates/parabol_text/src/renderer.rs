//! Font renderer
//!
//! A [`FontRenderer`] draws one logical font at one pixel size. It derives the
//! four style variants of the font at `pixel size * device scale factor`, owns
//! the atlas pages of each variant, resolves glyphs, measures text and batches
//! draws so that every atlas texture touched by a call is bound exactly once.
//!
//! Every public entry point first checks the device scale factor. When it
//! changed since the faces were derived, every atlas page is destroyed and the
//! faces are re-derived at the new density; pages regenerate lazily afterwards.

use crate::atlas::{AtlasPage, Glyph};
use crate::config::EngineConfig;
use crate::font::FontFace;
use crate::model::{Text, TextSpan, TextStyle};
use crate::rasterizer::{GlyphRasterizer, StyledFace};
use parabol_paint::{QuadBatch, QuadVertex, TextureId, TextureUploader, TransformStack};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Introduces a two-character formatting code that is never measured
const CONTROL_CODE_MARKER: char = '§';

/// Remove every marker together with the character following it
pub(crate) fn strip_control_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == CONTROL_CODE_MARKER {
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// Round to one decimal place
fn round_to_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// What a `draw_text` call submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Draw calls, one per distinct atlas texture
    pub batches: usize,
    pub quads: usize,
}

/// A glyph queued for drawing within one `draw_text` call
#[derive(Debug, Clone)]
struct DrawEntry {
    x: f32,
    y: f32,
    color: [f32; 4],
    glyph: Glyph,
}

/// One style variant: its derived face and the atlas pages generated for it
struct StyleVariant {
    face: StyledFace,
    pages: Vec<AtlasPage>,
}

/// The four variants, addressed by exhaustive match on [`TextStyle`]
struct StyleVariants {
    normal: StyleVariant,
    bold: StyleVariant,
    italic: StyleVariant,
    bold_italic: StyleVariant,
}

impl StyleVariants {
    fn derive(font: &Arc<FontFace>, size_px: f32, italic_padding: f32) -> Self {
        let variant = |style| StyleVariant {
            face: StyledFace::new(Arc::clone(font), style, size_px, italic_padding),
            pages: Vec::new(),
        };
        Self {
            normal: variant(TextStyle::Normal),
            bold: variant(TextStyle::Bold),
            italic: variant(TextStyle::Italic),
            bold_italic: variant(TextStyle::BoldItalic),
        }
    }

    fn get_mut(&mut self, style: TextStyle) -> &mut StyleVariant {
        match style {
            TextStyle::Normal => &mut self.normal,
            TextStyle::Bold => &mut self.bold,
            TextStyle::Italic => &mut self.italic,
            TextStyle::BoldItalic => &mut self.bold_italic,
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut StyleVariant> {
        [
            &mut self.normal,
            &mut self.bold,
            &mut self.italic,
            &mut self.bold_italic,
        ]
        .into_iter()
    }
}

/// One-shot initialization flag, cleared again by a release
#[derive(Debug, Default)]
struct InitFlag(bool);

impl InitFlag {
    /// # Panics
    ///
    /// When already set; initializing twice without a release is an engine bug.
    fn set(&mut self) {
        assert!(!self.0, "FontRenderer initialized twice");
        self.0 = true;
    }

    fn clear(&mut self) {
        self.0 = false;
    }
}

/// Mutable renderer state, guarded by the renderer's lock
struct RendererState {
    initialized: InitFlag,
    /// Scale factor the current faces were derived at
    scale: u32,
    variants: StyleVariants,
    rasterizer: GlyphRasterizer,
    /// Glyph entries of the in-flight draw call, by atlas texture
    batches: FxHashMap<TextureId, Vec<DrawEntry>>,
}

impl RendererState {
    /// Initialized state holding `variants` derived at `scale`
    fn new(scale: u32, variants: StyleVariants) -> Self {
        let mut initialized = InitFlag::default();
        initialized.set();
        Self {
            initialized,
            scale,
            variants,
            rasterizer: GlyphRasterizer::new(),
            batches: FxHashMap::default(),
        }
    }

    /// Destroy every atlas page of every style
    fn release(&mut self, uploader: &TextureUploader) {
        for variant in self.variants.iter_mut() {
            for page in &mut variant.pages {
                page.destroy(uploader);
            }
            variant.pages.clear();
        }
        self.batches.clear();
        self.initialized.clear();
    }
}

/// Renderer for one font at one pixel size
pub struct FontRenderer {
    font: Arc<FontFace>,
    size_px: f32,
    chars_per_page: u32,
    padding: u32,
    italic_padding: f32,
    draw_offset_y: f32,
    texture_namespace: String,
    uploader: TextureUploader,
    state: Mutex<RendererState>,
}

impl std::fmt::Debug for FontRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRenderer")
            .field("font", &self.font.family_name())
            .field("size_px", &self.size_px)
            .finish()
    }
}

impl FontRenderer {
    /// Create a renderer and derive its style faces at the current scale factor
    pub fn new(
        font: Arc<FontFace>,
        size_px: f32,
        config: &EngineConfig,
        uploader: TextureUploader,
    ) -> Self {
        let scale = uploader.backend().scale_factor().max(1);
        let variants = StyleVariants::derive(&font, size_px * scale as f32, config.italic_padding);
        Self {
            font,
            size_px,
            chars_per_page: config.chars_per_page.max(1),
            padding: config.padding,
            italic_padding: config.italic_padding,
            draw_offset_y: config.draw_offset_y,
            texture_namespace: config.texture_namespace.clone(),
            uploader,
            state: Mutex::new(RendererState::new(scale, variants)),
        }
    }

    pub fn font(&self) -> &Arc<FontFace> {
        &self.font
    }

    /// Requested (logical) pixel size
    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// Scale factor the current atlas pages are generated at
    pub fn scale_factor(&self) -> u32 {
        self.lock().scale
    }

    fn lock(&self) -> MutexGuard<'_, RendererState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_scale(&self) -> u32 {
        self.uploader.backend().scale_factor().max(1)
    }

    /// Re-derive the four style faces of a released state at the current
    /// scale factor
    fn init(&self, state: &mut RendererState) {
        state.initialized.set();
        state.scale = self.current_scale();
        state.variants = StyleVariants::derive(
            &self.font,
            self.size_px * state.scale as f32,
            self.italic_padding,
        );
    }

    /// Re-derive everything when the display density changed
    fn check_scale(&self, state: &mut RendererState) {
        let scale = self.current_scale();
        if scale != state.scale {
            tracing::debug!(
                "Scale factor changed {} -> {}, invalidating {} at {}px",
                state.scale,
                scale,
                self.font.family_name(),
                self.size_px
            );
            state.release(&self.uploader);
            self.init(state);
        }
    }

    /// Glyph for `c` in `style`, generating its atlas page if needed
    pub fn locate_glyph(&self, c: char, style: TextStyle) -> Glyph {
        let mut state = self.lock();
        self.check_scale(&mut state);
        self.locate(&mut state, c, style).0
    }

    /// Glyph for `c` and whether its page has a texture to bind
    fn locate(&self, state: &mut RendererState, c: char, style: TextStyle) -> (Glyph, bool) {
        let RendererState {
            variants,
            rasterizer,
            ..
        } = state;
        let variant = variants.get_mut(style);

        let index = match variant.pages.iter().position(|page| page.contains(c)) {
            Some(index) => index,
            None => {
                variant.pages.push(AtlasPage::for_char(
                    style,
                    c,
                    self.chars_per_page,
                    TextureId::random(&self.texture_namespace),
                    self.padding,
                ));
                variant.pages.len() - 1
            }
        };

        let page = &mut variant.pages[index];
        let glyph = page
            .glyph(c, &variant.face, rasterizer, &self.uploader)
            .cloned()
            .unwrap_or_else(|| Glyph {
                codepoint: c,
                u: 0,
                v: 0,
                width: 0,
                height: 0,
                texture: page.texture().clone(),
                atlas_width: page.dimensions().0,
                atlas_height: page.dimensions().1,
            });
        (glyph, page.is_backed())
    }

    fn scale_of(state: &RendererState) -> f32 {
        state.scale.max(1) as f32
    }

    /// Widest line of `span` in layout units
    fn span_width(&self, state: &mut RendererState, span: &TextSpan) -> f32 {
        let scale = Self::scale_of(state);
        let mut widest = 0.0f32;
        for line in strip_control_codes(&span.text).split('\n') {
            let mut width = 0.0f32;
            for c in line.chars() {
                width += self.locate(state, c, span.style).0.width as f32 / scale;
            }
            widest = widest.max(width);
        }
        widest
    }

    /// Tallest glyph of one line in device pixels; a space when the line is empty
    fn line_height_px(&self, state: &mut RendererState, line: &str, style: TextStyle) -> f32 {
        let mut height = 0u32;
        for c in line.chars() {
            height = height.max(self.locate(state, c, style).0.height);
        }
        if line.is_empty() {
            height = self.locate(state, ' ', style).0.height;
        }
        height as f32
    }

    /// Sum of line heights of `span` in layout units
    fn span_height(&self, state: &mut RendererState, span: &TextSpan) -> f32 {
        let scale = Self::scale_of(state);
        strip_control_codes(&span.text)
            .split('\n')
            .map(|line| self.line_height_px(state, line, span.style) / scale)
            .sum()
    }

    /// Widest span of `text`; spans are measured independently
    pub fn measure_width(&self, text: &Text) -> f32 {
        let mut state = self.lock();
        self.check_scale(&mut state);
        text.iter()
            .map(|span| self.span_width(&mut state, span))
            .fold(0.0, f32::max)
    }

    /// Tallest span of `text`
    pub fn measure_height(&self, text: &Text) -> f32 {
        let mut state = self.lock();
        self.check_scale(&mut state);
        text.iter()
            .map(|span| self.span_height(&mut state, span))
            .fold(0.0, f32::max)
    }

    pub fn string_width(&self, text: &str) -> f32 {
        self.measure_width(&Text::literal(text))
    }

    pub fn string_height(&self, text: &str) -> f32 {
        self.measure_height(&Text::literal(text))
    }

    /// Draw `text` with its top-left corner at `(x, y)` in `transform`'s space
    ///
    /// Glyphs are accumulated per atlas texture and each texture is submitted
    /// as one batch. Batches for different textures come in no particular
    /// order; quads within a batch keep span and character order.
    pub fn draw_text(
        &self,
        transform: &mut TransformStack,
        text: &Text,
        x: f32,
        y: f32,
    ) -> DrawStats {
        let mut state = self.lock();
        self.check_scale(&mut state);
        state.batches.clear();

        let scale = Self::scale_of(&state);
        let mut x_offset = 0.0f32;
        let mut y_offset = 0.0f32;

        for span in text {
            let color = span.color.to_array();
            let content = strip_control_codes(&span.text);
            let line_advance = content
                .split('\n')
                .map(|line| self.line_height_px(&mut state, line, span.style))
                .fold(0.0, f32::max);

            for c in content.chars() {
                if c == '\n' {
                    x_offset = 0.0;
                    y_offset += line_advance;
                    continue;
                }

                let (glyph, backed) = self.locate(&mut state, c, span.style);
                let advance = glyph.width as f32;
                if c != ' ' && backed {
                    state
                        .batches
                        .entry(glyph.texture.clone())
                        .or_default()
                        .push(DrawEntry {
                            x: x_offset,
                            y: y_offset,
                            color,
                            glyph,
                        });
                }
                x_offset += advance;
            }
        }

        transform.push();
        transform.translate(round_to_tenth(x), round_to_tenth(y - self.draw_offset_y));
        transform.scale(1.0 / scale, 1.0 / scale);
        let matrix = transform.current();
        transform.pop();

        let backend = self.uploader.backend();
        let mut stats = DrawStats::default();
        for (texture, entries) in state.batches.drain() {
            let mut batch = QuadBatch::with_capacity(texture, entries.len());
            for entry in &entries {
                let w = entry.glyph.width as f32;
                let h = entry.glyph.height as f32;
                let [u1, v1, u2, v2] = entry.glyph.uv_bounds();
                let vertex = |px: f32, py: f32, u: f32, v: f32| QuadVertex {
                    position: matrix.apply(entry.x + px, entry.y + py),
                    uv: [u, v],
                    color: entry.color,
                };
                batch.push_quad([
                    vertex(0.0, h, u1, v2),
                    vertex(w, h, u2, v2),
                    vertex(w, 0.0, u2, v1),
                    vertex(0.0, 0.0, u1, v1),
                ]);
            }
            stats.batches += 1;
            stats.quads += batch.quad_count();
            backend.draw_quads(&batch);
        }

        stats
    }

    /// Texture ids of every generated atlas page
    pub fn atlas_textures(&self) -> Vec<TextureId> {
        let mut state = self.lock();
        state
            .variants
            .iter_mut()
            .flat_map(|variant| variant.pages.iter())
            .filter(|page| page.is_generated())
            .map(|page| page.texture().clone())
            .collect()
    }

    /// Number of atlas pages across all styles
    pub fn page_count(&self) -> usize {
        let mut state = self.lock();
        state.variants.iter_mut().map(|v| v.pages.len()).sum()
    }
}

impl Drop for FontRenderer {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.release(&self.uploader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_control_codes() {
        assert_eq!(strip_control_codes("a§cb"), "ab");
        assert_eq!(strip_control_codes("§l§oBold"), "Bold");
        assert_eq!(strip_control_codes("trailing§"), "trailing");
        assert_eq!(strip_control_codes("plain"), "plain");
    }

    #[test]
    #[should_panic(expected = "initialized twice")]
    fn test_double_init_panics() {
        let mut flag = InitFlag::default();
        flag.set();
        flag.set();
    }

    #[test]
    fn test_init_after_release() {
        let mut flag = InitFlag::default();
        flag.set();
        flag.clear();
        flag.set();
        assert!(flag.0);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(1.26), 1.3);
        assert_eq!(round_to_tenth(-2.04), -2.0);
    }
}
