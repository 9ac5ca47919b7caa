//! Type definitions for complaint rendering

use crate::error::{RenderError, RenderResult};
use crate::language::Language;

/// Rectangle with position and size (PDF user space, origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Grow the rectangle by `amount` on every side.
    pub fn outset(&self, amount: f64) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + amount * 2.0,
            height: self.height + amount * 2.0,
        }
    }
}

/// Size with width and height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// US Letter, 8.5 x 11 in.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }
}

/// Margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self { top, bottom, left, right }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }
}

/// Color representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0 }
    }

    /// Border color used around embedded photos (`#888`).
    pub fn border_gray() -> Self {
        Self::rgb(136.0 / 255.0, 136.0 / 255.0, 136.0 / 255.0)
    }
}

/// Page geometry and typography knobs for a render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub page_size: Size,
    pub margins: Margins,
    /// Photos wider than this are scaled down proportionally.
    pub max_image_width: f64,
    pub title: String,
    pub title_size: f64,
    pub subject_size: f64,
    pub body_size: f64,
    /// Line advance as a multiple of the font size.
    pub line_spacing: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_size: Size::letter(),
            margins: Margins::uniform(50.0),
            max_image_width: 400.0,
            title: "Formal Complaint Letter".to_string(),
            title_size: 20.0,
            subject_size: 14.0,
            body_size: 12.0,
            line_spacing: 1.2,
        }
    }
}

impl RenderOptions {
    /// Width available for text between the left and right margins.
    pub fn content_width(&self) -> f64 {
        (self.page_size.width - self.margins.left - self.margins.right).max(1.0)
    }

    /// Height available between the top and bottom margins.
    pub fn content_height(&self) -> f64 {
        (self.page_size.height - self.margins.top - self.margins.bottom).max(1.0)
    }
}

/// One complaint to render: the letter text, an optional photo and the
/// language that drives font selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintDocument {
    pub text: String,
    pub image: Option<Vec<u8>>,
    pub language: Language,
}

impl ComplaintDocument {
    pub fn new(text: impl Into<String>, image: Option<Vec<u8>>, language: Language) -> Self {
        Self {
            text: text.into(),
            image,
            language,
        }
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.text.trim().is_empty() {
            return Err(RenderError::Validation("complaint text is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_match_letter_layout() {
        let options = RenderOptions::default();
        assert_eq!(options.page_size, Size::letter());
        assert_eq!(options.content_width(), 512.0);
        assert_eq!(options.max_image_width, 400.0);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let blank = ComplaintDocument::new("   \n", None, Language::Telugu);
        assert!(blank.validate().unwrap_err().is_validation());

        let doc = ComplaintDocument::new("Pothole", None, Language::from_tag("xx"));
        assert!(doc.validate().is_ok());
        assert_eq!(doc.language, Language::English);
    }

    #[test]
    fn test_outset_grows_every_side() {
        let rect = Rect::new(106.0, 300.0, 400.0, 300.0).outset(2.0);
        assert_eq!(rect, Rect::new(104.0, 298.0, 404.0, 304.0));
    }
}
