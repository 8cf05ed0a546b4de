//! Font registry
//!
//! Holds fonts registered by name from byte streams, and resolves any other
//! name as a system font specification through fontdb. The system font
//! database is only scanned the first time a system font is requested.

use crate::font::FontFace;
use crate::{FontLoadError, Result, TextError};
use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A decoded system font specification: `family[-style[-size]]`
///
/// Fields may be separated by `-` or spaces. Style is one of `PLAIN`, `BOLD`,
/// `ITALIC`, `BOLDITALIC` (any case). A trailing size is accepted and ignored;
/// renderers always carry their own pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFontSpec {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl SystemFontSpec {
    pub fn decode(spec: &str) -> Self {
        let spec = spec.trim();
        let separator = if spec.contains('-') { '-' } else { ' ' };

        let mut rest = spec;
        let mut bold = false;
        let mut italic = false;

        // Peel "size" then "style" off the end, each optional
        if let Some((head, tail)) = rest.rsplit_once(separator) {
            if !head.is_empty() && tail.trim().parse::<u32>().is_ok() {
                rest = head;
            }
        }
        if let Some((head, tail)) = rest.rsplit_once(separator) {
            let parsed = match tail.trim().to_ascii_uppercase().as_str() {
                "PLAIN" => Some((false, false)),
                "BOLD" => Some((true, false)),
                "ITALIC" => Some((false, true)),
                "BOLDITALIC" => Some((true, true)),
                _ => None,
            };
            if let (false, Some((b, i))) = (head.is_empty(), parsed) {
                rest = head;
                bold = b;
                italic = i;
            }
        }

        Self {
            family: rest.trim().to_string(),
            bold,
            italic,
        }
    }

    fn query_style(&self) -> (Weight, Style) {
        (
            if self.bold { Weight::BOLD } else { Weight::NORMAL },
            if self.italic { Style::Italic } else { Style::Normal },
        )
    }
}

/// Registry of named fonts
pub struct FontRegistry {
    /// Fonts registered by name from byte streams
    custom: FxHashMap<String, Arc<FontFace>>,
    /// System font database, scanned on first use
    system: Option<Database>,
    /// Resolved system specs (Some = found, None = not found)
    system_faces: FxHashMap<String, Option<Arc<FontFace>>>,
}

impl FontRegistry {
    /// An empty registry; system fonts are scanned lazily
    pub fn new() -> Self {
        Self {
            custom: FxHashMap::default(),
            system: None,
            system_faces: FxHashMap::default(),
        }
    }

    /// A registry resolving system fonts against `db` instead of the system scan
    pub fn with_database(db: Database) -> Self {
        Self {
            system: Some(db),
            ..Self::new()
        }
    }

    /// Parse `bytes` and register the font under `name`
    ///
    /// A later registration under the same name replaces the earlier one for
    /// renderers created afterwards.
    pub fn register_font(&mut self, name: &str, bytes: Vec<u8>) -> Result<Arc<FontFace>> {
        if bytes.is_empty() {
            return Err(FontLoadError::MissingResource(name.to_string()).into());
        }
        let face = Arc::new(FontFace::from_data(bytes)?);
        self.custom.insert(name.to_string(), Arc::clone(&face));
        tracing::info!("Loaded font: {} ({})", name, face.family_name());
        Ok(face)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Resolve `name`: a registered font first, else a system font specification
    pub fn resolve(&mut self, name: &str) -> Result<Arc<FontFace>> {
        if let Some(face) = self.custom.get(name) {
            return Ok(Arc::clone(face));
        }
        self.resolve_system(name)
    }

    fn resolve_system(&mut self, spec: &str) -> Result<Arc<FontFace>> {
        if let Some(cached) = self.system_faces.get(spec) {
            return cached
                .clone()
                .ok_or_else(|| TextError::FontResolution(spec.to_string()));
        }

        let decoded = SystemFontSpec::decode(spec);
        let face = self.query_system(&decoded).map(Arc::new);
        match &face {
            Some(face) => tracing::debug!(
                "Resolved system font '{}' to {}",
                spec,
                face.family_name()
            ),
            None => tracing::warn!("System font '{}' not found", spec),
        }
        self.system_faces.insert(spec.to_string(), face.clone());
        face.ok_or_else(|| TextError::FontResolution(spec.to_string()))
    }

    fn system_db(&mut self) -> &Database {
        self.system.get_or_insert_with(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            tracing::debug!("Scanned {} system font faces", db.len());
            db
        })
    }

    fn query_system(&mut self, spec: &SystemFontSpec) -> Option<FontFace> {
        if spec.family.is_empty() {
            return None;
        }
        let (weight, style) = spec.query_style();
        let db = self.system_db();

        let query = Query {
            families: &[Family::Name(&spec.family)],
            weight,
            style,
            stretch: Stretch::Normal,
        };
        let id = db.query(&query)?;

        // fontdb falls back to the closest face of the family, never another family
        let (src, face_index) = db.face_source(id)?;
        let data = match src {
            Source::File(path) => match std::fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to read font file {:?}: {}", path, e);
                    return None;
                }
            },
            Source::Binary(arc) => arc.as_ref().as_ref().to_vec(),
            Source::SharedFile(_path, data) => data.as_ref().as_ref().to_vec(),
        };

        match FontFace::from_data_with_index(data, face_index) {
            Ok(face) => Some(face),
            Err(e) => {
                tracing::warn!("System font '{}' unreadable: {}", spec.family, e);
                None
            }
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_name() {
        assert_eq!(
            SystemFontSpec::decode("DejaVu Sans"),
            SystemFontSpec {
                family: "DejaVu Sans".to_string(),
                bold: false,
                italic: false,
            }
        );
    }

    #[test]
    fn test_decode_style_and_size() {
        let spec = SystemFontSpec::decode("Arial-BOLDITALIC-12");
        assert_eq!(spec.family, "Arial");
        assert!(spec.bold && spec.italic);

        let spec = SystemFontSpec::decode("Courier New-bold");
        assert_eq!(spec.family, "Courier New");
        assert!(spec.bold && !spec.italic);

        let spec = SystemFontSpec::decode("Serif italic 14");
        assert_eq!(spec.family, "Serif");
        assert!(!spec.bold && spec.italic);
    }

    #[test]
    fn test_decode_keeps_numeric_family() {
        assert_eq!(SystemFontSpec::decode("12").family, "12");
    }

    #[test]
    fn test_register_rejects_empty_bytes() {
        let mut registry = FontRegistry::with_database(Database::new());
        assert!(matches!(
            registry.register_font("Foo", Vec::new()),
            Err(TextError::FontLoad(FontLoadError::MissingResource(_)))
        ));
        assert!(!registry.is_registered("Foo"));
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut registry = FontRegistry::with_database(Database::new());
        assert!(matches!(
            registry.register_font("Foo", vec![1, 2, 3, 4]),
            Err(TextError::FontLoad(FontLoadError::InvalidFormat(_)))
        ));
        assert!(!registry.is_registered("Foo"));
    }

    #[test]
    fn test_unknown_name_fails_resolution() {
        let mut registry = FontRegistry::with_database(Database::new());
        assert!(matches!(
            registry.resolve("No Such Font-BOLD-12"),
            Err(TextError::FontResolution(_))
        ));
        // Failures are cached too
        assert!(matches!(
            registry.resolve("No Such Font-BOLD-12"),
            Err(TextError::FontResolution(_))
        ));
    }
}
