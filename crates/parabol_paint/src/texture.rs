//! Texture identifiers and CPU-side texture bitmaps

use image::{Rgba, RgbaImage};
use rand::Rng;
use std::fmt;
use std::sync::Arc;

/// Length of the random suffix of generated texture ids
const RANDOM_SUFFIX_LEN: usize = 32;

/// Opaque texture identifier, `namespace:path`
///
/// Cheap to clone; glyphs and draw entries carry it by value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(Arc<str>);

impl TextureId {
    pub fn new(namespace: &str, path: &str) -> Self {
        Self(Arc::from(format!("{}:{}", namespace, path)))
    }

    /// Generate a fresh id `namespace:temp/<32 random lowercase letters>`
    ///
    /// The suffix only has to be unique among live textures.
    pub fn random(namespace: &str) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..RANDOM_SUFFIX_LEN)
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect();
        Self::new(namespace, &format!("temp/{}", suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map_or("", |(ns, _)| ns)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map_or(&self.0, |(_, path)| path)
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pixel rectangle `[x, x + width) x [y, y + height)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// RGBA8 bitmap handed to the backend for upload
#[derive(Clone, Debug)]
pub struct TextureBitmap {
    image: RgbaImage,
}

impl TextureBitmap {
    /// Create a fully transparent bitmap, at least 1x1
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([255, 255, 255, 0])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Blend an 8-bit coverage mask in as white
    ///
    /// Only pixels inside both `clip` and the bitmap are written.
    pub fn blit_coverage(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        coverage: &[u8],
        clip: ClipRect,
    ) {
        let x_min = clip.x as i64;
        let y_min = clip.y as i64;
        let x_max = (clip.x as i64 + clip.width as i64).min(self.image.width() as i64);
        let y_max = (clip.y as i64 + clip.height as i64).min(self.image.height() as i64);

        for gy in 0..height as i64 {
            let dy = y as i64 + gy;
            if dy < y_min || dy >= y_max {
                continue;
            }
            for gx in 0..width as i64 {
                let dx = x as i64 + gx;
                if dx < x_min || dx >= x_max {
                    continue;
                }
                let Some(&alpha) = coverage.get((gy * width as i64 + gx) as usize) else {
                    continue;
                };
                let pixel = self.image.get_pixel_mut(dx as u32, dy as u32);
                pixel.0[3] = pixel.0[3].max(alpha);
            }
        }
    }

    /// The whole bitmap as a clip rectangle
    pub fn bounds(&self) -> ClipRect {
        ClipRect {
            x: 0,
            y: 0,
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel_checked(x, y).map_or(0, |p| p.0[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_shape() {
        let id = TextureId::random("parabol");
        assert_eq!(id.namespace(), "parabol");
        let suffix = id.path().strip_prefix("temp/").unwrap();
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(TextureId::random("parabol"), TextureId::random("parabol"));
    }

    #[test]
    fn test_blit_is_clipped_to_bitmap() {
        let mut bitmap = TextureBitmap::new(2, 2);
        let bounds = bitmap.bounds();
        bitmap.blit_coverage(1, 1, 2, 2, &[10, 20, 30, 40], bounds);
        assert_eq!(bitmap.alpha_at(1, 1), 10);
        assert_eq!(bitmap.alpha_at(0, 0), 0);
    }

    #[test]
    fn test_blit_is_clipped_to_rect() {
        let mut bitmap = TextureBitmap::new(4, 1);
        let clip = ClipRect {
            x: 1,
            y: 0,
            width: 2,
            height: 1,
        };
        bitmap.blit_coverage(0, 0, 4, 1, &[255; 4], clip);
        let row: Vec<u8> = (0..4).map(|x| bitmap.alpha_at(x, 0)).collect();
        assert_eq!(row, vec![0, 255, 255, 0]);
    }

    #[test]
    fn test_minimum_size() {
        assert_eq!(TextureBitmap::new(0, 0).dimensions(), (1, 1));
    }
}
