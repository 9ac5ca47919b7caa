//! High-level Canvas-like API wrapper for pdf-writer
//!
//! Tracks graphics state alongside the raw content stream so the document
//! layer can draw text runs, rules and images without touching operators.
//! Stroke settings equal to the current state are not re-emitted.

use pdf_writer::{Content, Name, Str};

use crate::types::{Color, Rect};

/// Canvas state for graphics operations
#[derive(Debug, Clone)]
pub struct CanvasState {
    pub stroke_color: Color,
    pub line_width: f64,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            stroke_color: Color::black(),
            line_width: 1.0,
        }
    }
}

/// One element of a `TJ` array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    /// Encoded string (WinAnsi bytes or 2-byte CIDs).
    Show(Vec<u8>),
    /// Horizontal adjustment in thousandths of text space; positive values
    /// move the next glyph left.
    Adjust(f32),
}

/// Canvas for one page's content stream.
pub struct PdfCanvas {
    content: Content,
    state: CanvasState,
    state_stack: Vec<CanvasState>,
}

impl PdfCanvas {
    pub fn new() -> Self {
        Self {
            content: Content::new(),
            state: CanvasState::default(),
            state_stack: Vec::new(),
        }
    }

    /// Finish the content stream.
    pub fn finish(self) -> Vec<u8> {
        self.content.finish()
    }

    // ===== State Management =====

    pub fn save_state(&mut self) {
        self.state_stack.push(self.state.clone());
        self.content.save_state();
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
            self.content.restore_state();
        }
    }

    // ===== Colors =====

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.content
            .set_stroke_rgb(color.r as f32, color.g as f32, color.b as f32);
    }

    pub fn set_line_width(&mut self, width: f64) {
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.content.set_line_width(width as f32);
    }

    // ===== Drawing =====

    /// Outline `rect` with the current stroke color and width.
    pub fn stroke_rect(&mut self, rect: Rect) {
        self.content.rect(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
        );
        self.content.stroke();
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.content.move_to(x1 as f32, y1 as f32);
        self.content.line_to(x2 as f32, y2 as f32);
        self.content.stroke();
    }

    // ===== Text =====

    /// Draw one text run with its baseline starting at `(x, y)`.
    pub fn draw_text(&mut self, x: f64, y: f64, font_name: &str, size: f64, items: &[TextItem]) {
        if items.is_empty() {
            return;
        }
        self.content.begin_text();
        self.content.set_font(Name(font_name.as_bytes()), size as f32);
        self.content.next_line(x as f32, y as f32);
        match items {
            [TextItem::Show(bytes)] => {
                self.content.show(Str(bytes));
            }
            _ => {
                let mut positioned = self.content.show_positioned();
                let mut array = positioned.items();
                for item in items {
                    match item {
                        TextItem::Show(bytes) => {
                            array.show(Str(bytes));
                        }
                        TextItem::Adjust(amount) => {
                            array.adjust(*amount);
                        }
                    }
                }
            }
        }
        self.content.end_text();
    }

    // ===== Images =====

    /// Paint an image XObject into `rect` (bottom-left origin).
    pub fn draw_image(&mut self, image_name: &str, rect: Rect) {
        self.content.save_state();
        self.content.transform([
            rect.width as f32,
            0.0,
            0.0,
            rect.height as f32,
            rect.x as f32,
            rect.y as f32,
        ]);
        self.content.x_object(Name(image_name.as_bytes()));
        self.content.restore_state();
    }
}

impl Default for PdfCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(canvas: PdfCanvas) -> String {
        String::from_utf8_lossy(&canvas.finish()).into_owned()
    }

    #[test]
    fn test_single_string_uses_tj() {
        let mut canvas = PdfCanvas::new();
        canvas.draw_text(50.0, 700.0, "F1", 12.0, &[TextItem::Show(b"Hello".to_vec())]);
        let out = ops(canvas);
        assert!(out.contains("/F1 12 Tf"));
        assert!(out.contains("(Hello) Tj"));
        assert!(out.contains("BT") && out.contains("ET"));
    }

    #[test]
    fn test_adjusted_glyphs_use_tj_array() {
        let mut canvas = PdfCanvas::new();
        canvas.draw_text(
            0.0,
            0.0,
            "F2",
            14.0,
            &[
                TextItem::Show(vec![0, 36]),
                TextItem::Adjust(-120.0),
                TextItem::Show(vec![0, 37]),
            ],
        );
        let out = ops(canvas);
        assert!(out.contains("TJ"));
        assert!(out.contains("-120"));
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut canvas = PdfCanvas::new();
        canvas.draw_text(0.0, 0.0, "F1", 12.0, &[]);
        assert!(ops(canvas).is_empty());
    }

    #[test]
    fn test_state_stack() {
        let mut canvas = PdfCanvas::new();
        canvas.save_state();
        canvas.set_line_width(3.0);
        canvas.set_stroke_color(Color::border_gray());
        canvas.set_stroke_color(Color::border_gray());
        canvas.restore_state();
        // restored to the defaults, so these are no-ops
        canvas.set_line_width(1.0);
        canvas.set_stroke_color(Color::black());
        // unbalanced restore is ignored
        canvas.restore_state();
        let out = ops(canvas);
        assert_eq!(out.matches('q').count(), 1);
        assert_eq!(out.matches('Q').count(), 1);
        assert_eq!(out.matches(" RG").count(), 1);
        assert_eq!(out.matches(" w").count(), 1);
        assert!(out.contains("3 w"));
    }

    #[test]
    fn test_default_stroke_is_not_emitted() {
        let mut canvas = PdfCanvas::new();
        canvas.set_stroke_color(Color::black());
        canvas.set_line_width(1.0);
        canvas.line(0.0, 0.0, 10.0, 0.0);
        let out = ops(canvas);
        assert!(!out.contains("RG"));
        assert!(!out.contains(" w"));
        assert!(out.contains("10 0 l"));
    }

    #[test]
    fn test_image_is_placed_with_matrix() {
        let mut canvas = PdfCanvas::new();
        canvas.draw_image("Im1", Rect::new(106.0, 300.0, 400.0, 300.0));
        canvas.stroke_rect(Rect::new(104.0, 298.0, 404.0, 304.0));
        let out = ops(canvas);
        assert!(out.contains("400 0 0 300 106 300 cm"));
        assert!(out.contains("104 298 404 304 re"));
        assert!(out.contains("/Im1 Do"));
    }
}
