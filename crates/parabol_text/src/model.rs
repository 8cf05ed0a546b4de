//! Styled text model
//!
//! A [`Text`] is an ordered list of spans. Spans concatenate left to right;
//! line breaks are explicit `'\n'` characters inside a run.
//!
//! ```
//! use parabol_paint::Color;
//! use parabol_text::{Text, TextStyle};
//!
//! let text = Text::literal("Hello, ")
//!     .append("world")
//!     .styled(TextStyle::Bold)?
//!     .colored(Color::RED)?;
//!
//! assert_eq!(text.spans().len(), 2);
//! assert_eq!(text.plain_string(), "Hello, world");
//! # Ok::<(), parabol_text::TextError>(())
//! ```

use crate::{Result, TextError};
use parabol_paint::Color;

/// Style variant of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl TextStyle {
    pub const ALL: [TextStyle; 4] = [
        TextStyle::Normal,
        TextStyle::Bold,
        TextStyle::Italic,
        TextStyle::BoldItalic,
    ];

    pub fn is_bold(self) -> bool {
        matches!(self, TextStyle::Bold | TextStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, TextStyle::Italic | TextStyle::BoldItalic)
    }
}

/// One run of text with a single style and color
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub style: TextStyle,
    pub color: Color,
}

impl TextSpan {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::Normal,
            color: Color::WHITE,
        }
    }
}

/// Ordered sequence of styled spans
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Text {
    spans: Vec<TextSpan>,
}

impl Text {
    /// An empty model; `styled`/`colored` fail until something is appended
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a model with one normal, white span
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            spans: vec![TextSpan::new(text)],
        }
    }

    /// Add a trailing span with default style and color
    pub fn append(mut self, text: impl Into<String>) -> Self {
        self.spans.push(TextSpan::new(text));
        self
    }

    /// Set the style of the most recently appended span
    pub fn styled(mut self, style: TextStyle) -> Result<Self> {
        self.last_mut()?.style = style;
        Ok(self)
    }

    /// Set the color of the most recently appended span
    pub fn colored(mut self, color: Color) -> Result<Self> {
        self.last_mut()?.color = color;
        Ok(self)
    }

    fn last_mut(&mut self) -> Result<&mut TextSpan> {
        self.spans.last_mut().ok_or(TextError::EmptyModel)
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// Spans in insertion order; restartable, never consumes the model
    pub fn iter(&self) -> std::slice::Iter<'_, TextSpan> {
        self.spans.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// All runs concatenated, without styling
    pub fn plain_string(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Text {
    type Item = &'a TextSpan;
    type IntoIter = std::slice::Iter<'a, TextSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text::literal(text)
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text::literal(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styled_applies_to_last_span() {
        let text = Text::literal("a")
            .append("b")
            .styled(TextStyle::Italic)
            .unwrap()
            .colored(Color::BLUE)
            .unwrap();

        assert_eq!(text.spans()[0].style, TextStyle::Normal);
        assert_eq!(text.spans()[0].color, Color::WHITE);
        assert_eq!(text.spans()[1].style, TextStyle::Italic);
        assert_eq!(text.spans()[1].color, Color::BLUE);
    }

    #[test]
    fn test_append_does_not_inherit_style() {
        let text = Text::literal("a")
            .styled(TextStyle::Bold)
            .unwrap()
            .append("b");
        assert_eq!(text.spans()[1].style, TextStyle::Normal);
    }

    #[test]
    fn test_empty_model_rejects_styling() {
        assert!(matches!(
            Text::new().styled(TextStyle::Bold),
            Err(TextError::EmptyModel)
        ));
        assert!(matches!(
            Text::new().colored(Color::RED),
            Err(TextError::EmptyModel)
        ));
    }

    #[test]
    fn test_iteration_is_restartable() {
        let text = Text::literal("x").append("y").append("z");
        let first: Vec<_> = text.iter().map(|s| s.text.clone()).collect();
        let second: Vec<_> = (&text).into_iter().map(|s| s.text.clone()).collect();
        assert_eq!(first, vec!["x", "y", "z"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_style_flags() {
        let slanted: Vec<_> = TextStyle::ALL.into_iter().filter(|s| s.is_italic()).collect();
        assert_eq!(slanted, vec![TextStyle::Italic, TextStyle::BoldItalic]);
        assert!(TextStyle::BoldItalic.is_bold() && !TextStyle::Italic.is_bold());
    }
}
