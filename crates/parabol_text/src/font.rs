//! Font faces
//!
//! A [`FontFace`] owns the raw bytes of one TrueType/OpenType face. The bytes
//! are validated with ttf-parser once, at construction; rasterizers borrow them
//! afterwards without re-validating.

use crate::FontLoadError;
use std::sync::Arc;
use ttf_parser::{name_id, Face};

/// Vertical font metrics in font units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

impl FontMetrics {
    /// Ascender in pixels at `font_size`
    pub fn ascender_px(&self, font_size: f32) -> f32 {
        self.ascender as f32 * font_size / self.units_per_em as f32
    }

    /// Descender in pixels at `font_size` (typically negative)
    pub fn descender_px(&self, font_size: f32) -> f32 {
        self.descender as f32 * font_size / self.units_per_em as f32
    }

    /// Ascent + descent + line gap in pixels at `font_size`
    pub fn line_height_px(&self, font_size: f32) -> f32 {
        (self.ascender as f32 - self.descender as f32 + self.line_gap as f32) * font_size
            / self.units_per_em as f32
    }
}

/// One parsed font face
pub struct FontFace {
    data: Arc<Vec<u8>>,
    face_index: u32,
    family_name: String,
    metrics: FontMetrics,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family_name", &self.family_name)
            .field("face_index", &self.face_index)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl FontFace {
    /// Parse the first face in `data`
    pub fn from_data(data: Vec<u8>) -> Result<Self, FontLoadError> {
        Self::from_data_with_index(data, 0)
    }

    /// Parse face `face_index` of a font file or collection
    pub fn from_data_with_index(data: Vec<u8>, face_index: u32) -> Result<Self, FontLoadError> {
        let (family_name, metrics) = {
            let face = Face::parse(&data, face_index)
                .map_err(|e| FontLoadError::InvalidFormat(e.to_string()))?;

            let family_name = face
                .names()
                .into_iter()
                .filter(|name| {
                    name.name_id == name_id::TYPOGRAPHIC_FAMILY || name.name_id == name_id::FAMILY
                })
                .find_map(|name| name.to_string())
                .unwrap_or_default();

            let metrics = FontMetrics {
                units_per_em: face.units_per_em(),
                ascender: face.ascender(),
                descender: face.descender(),
                line_gap: face.line_gap(),
            };
            (family_name, metrics)
        };

        if metrics.units_per_em == 0 {
            return Err(FontLoadError::InvalidFormat(
                "units per em is zero".to_string(),
            ));
        }

        Ok(Self {
            data: Arc::new(data),
            face_index,
            family_name,
            metrics,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_invalid_format() {
        let err = FontFace::from_data(vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, FontLoadError::InvalidFormat(_)));
    }

    #[test]
    fn test_empty_is_invalid_format() {
        assert!(FontFace::from_data(Vec::new()).is_err());
    }

    #[test]
    fn test_metrics_scale() {
        let metrics = FontMetrics {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            line_gap: 0,
        };
        assert_eq!(metrics.ascender_px(20.0), 16.0);
        assert_eq!(metrics.descender_px(20.0), -4.0);
        assert_eq!(metrics.line_height_px(20.0), 20.0);
    }
}
