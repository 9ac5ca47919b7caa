//! Complaint letter renderer
//!
//! Lays out a complaint as a formal letter: a centered title, the labelled
//! sections in a fixed order (or the whole text as one paragraph when no
//! label is found) and an optional bordered photo. Everything except empty
//! input degrades instead of failing: a broken photo is skipped and missing
//! script fonts fall back to the baseline.

use std::sync::Arc;

use crate::document::PdfDocument;
use crate::error::{RenderError, RenderResult};
use crate::font_catalog::{FontCatalog, FontResolver, FontTriple};
use crate::image_utils::{decode_image, fit_image, DecodedImage};
use crate::language::Language;
use crate::sections::{parse_sections, ParsedComplaint, SectionLabel};
use crate::text_layout::{FontChain, LineBreaker};
use crate::types::{ComplaintDocument, RenderOptions};

/// Font chains for one render.
struct Typeface {
    title: FontChain,
    bold: FontChain,
    regular: FontChain,
}

impl Typeface {
    fn new(resolved: &FontTriple, baseline: &FontTriple) -> Self {
        Self {
            title: FontChain::new(&resolved.title, &baseline.title, true),
            bold: FontChain::new(&resolved.bold, &baseline.bold, true),
            regular: FontChain::new(&resolved.regular, &baseline.regular, false),
        }
    }
}

/// A photo decoded and sized for the page.
struct PlacedImage {
    image: DecodedImage,
    width: f64,
    height: f64,
}

/// Renders complaint letters to PDF.
///
/// Cheap to share: the font resolver is behind an `Arc` and every render
/// builds its own document, so one renderer can serve concurrent requests.
#[derive(Clone)]
pub struct ComplaintRenderer {
    fonts: Arc<dyn FontResolver>,
    options: RenderOptions,
}

impl ComplaintRenderer {
    pub fn new(fonts: Arc<dyn FontResolver>) -> Self {
        Self::with_options(fonts, RenderOptions::default())
    }

    pub fn with_options(fonts: Arc<dyn FontResolver>, options: RenderOptions) -> Self {
        Self { fonts, options }
    }

    /// Renderer using the process-wide font catalog.
    pub fn global() -> Self {
        Self::new(FontCatalog::global())
    }

    pub fn render_document(&self, document: &ComplaintDocument) -> RenderResult<Vec<u8>> {
        self.render(&document.text, document.image.as_deref(), document.language)
    }

    /// Render `text` (and `image`, if any) to PDF bytes.
    ///
    /// Only fails for empty or whitespace-only text
    /// ([`RenderError::Validation`]) or if the PDF writer itself breaks
    /// ([`RenderError::Fault`]).
    pub fn render(&self, text: &str, image: Option<&[u8]>, language: Language) -> RenderResult<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(RenderError::Validation("complaint text is required".into()));
        }

        let resolved = self.fonts.resolve_for_text(language, text);
        let baseline = self.fonts.baseline();
        if language != Language::English && resolved == baseline {
            log::warn!(
                "no {} fonts registered, rendering with {}",
                language.display_name(),
                baseline.regular.family
            );
        }
        let typeface = Typeface::new(&resolved, &baseline);

        let parsed = parse_sections(text);
        let image = image.and_then(|bytes| self.prepare_image(bytes));
        log::debug!(
            "rendering complaint: language={}, font={}, structured={}, image={}",
            language,
            resolved.regular.family,
            parsed.is_structured(),
            image.is_some()
        );

        let mut doc = PdfDocument::new(self.options.clone());
        self.draw_title(&mut doc, &typeface);

        if parsed.is_structured() {
            self.draw_sections(&mut doc, &typeface, &parsed, image.as_ref());
        } else {
            if let Some(image) = &image {
                self.draw_image(&mut doc, image);
            }
            self.draw_paragraph(&mut doc, &typeface.regular, text, self.options.body_size);
        }

        doc.finish().map_err(|e| match e {
            RenderError::Fault(_) => e,
            other => RenderError::Fault(other.to_string()),
        })
    }

    fn prepare_image(&self, bytes: &[u8]) -> Option<PlacedImage> {
        match decode_image(bytes) {
            Ok(image) => {
                let max_width = self.options.max_image_width.min(self.options.content_width());
                let (width, height) = fit_image(
                    image.width as f64,
                    image.height as f64,
                    max_width,
                    f64::INFINITY,
                );
                Some(PlacedImage { image, width, height })
            }
            Err(e) => {
                log::warn!("skipping complaint image: {}", e);
                None
            }
        }
    }

    fn draw_title(&self, doc: &mut PdfDocument, typeface: &Typeface) {
        let size = self.options.title_size;
        let runs = typeface.title.shape(&self.options.title, size);
        let width: f64 = runs.iter().map(|run| run.width).sum();
        let x = doc.left() + ((doc.content_width() - width) / 2.0).max(0.0);
        let baseline = doc.draw_line(x, &runs, size);
        doc.underline(x, baseline, width, size);
        doc.move_down(1.5, size);
    }

    fn draw_sections(
        &self,
        doc: &mut PdfDocument,
        typeface: &Typeface,
        parsed: &ParsedComplaint,
        image: Option<&PlacedImage>,
    ) {
        let body = self.options.body_size;

        if let Some(preamble) = parsed.preamble() {
            self.draw_paragraph(doc, &typeface.regular, preamble, body);
            doc.move_down(1.0, body);
        }

        let mut image = image;
        for section in parsed.sections() {
            if section.label > SectionLabel::Description {
                if let Some(image) = image.take() {
                    self.draw_image(doc, image);
                }
            }

            match section.label {
                SectionLabel::Subject => {
                    let size = self.options.subject_size;
                    self.draw_inline_header(doc, typeface, "Subject:", &section.content, size);
                    doc.move_down(1.0, size);
                }
                label => {
                    if let Some(header) = label.header() {
                        let runs = typeface.bold.shape(header, body);
                        let width: f64 = runs.iter().map(|run| run.width).sum();
                        let baseline = doc.draw_line(doc.left(), &runs, body);
                        doc.underline(doc.left(), baseline, width, body);
                    }
                    self.draw_paragraph(doc, &typeface.regular, &section.content, body);
                    doc.move_down(1.0, body);
                }
            }
        }

        // no section at or after the image slot
        if let Some(image) = image {
            self.draw_image(doc, image);
        }
    }

    /// `header` in bold followed on the same line by `content`.
    fn draw_inline_header(
        &self,
        doc: &mut PdfDocument,
        typeface: &Typeface,
        header: &str,
        content: &str,
        size: f64,
    ) {
        let mut header_runs = typeface.bold.shape(header, size);
        header_runs.extend(typeface.regular.shape(" ", size));
        let header_width: f64 = header_runs.iter().map(|run| run.width).sum();

        let width = doc.content_width();
        let mut lines = content.lines();
        let first = lines.next().unwrap_or_default();
        let breaker = LineBreaker::with_first_line(width - header_width, width);
        let wrapped = breaker.break_text(first, |s| typeface.regular.measure(s, size));

        let mut wrapped = wrapped.into_iter();
        let first_line = wrapped.next().map(|line| line.text).unwrap_or_default();
        header_runs.extend(typeface.regular.shape(&first_line, size));
        doc.draw_line(doc.left(), &header_runs, size);

        for line in wrapped {
            let runs = typeface.regular.shape(&line.text, size);
            doc.draw_line(doc.left(), &runs, size);
        }
        let rest: Vec<&str> = lines.collect();
        if !rest.is_empty() {
            self.draw_paragraph(doc, &typeface.regular, &rest.join("\n"), size);
        }
    }

    /// Wrap and draw `text`; blank lines become vertical space.
    fn draw_paragraph(&self, doc: &mut PdfDocument, chain: &FontChain, text: &str, size: f64) {
        let breaker = LineBreaker::new(doc.content_width());
        for source_line in text.lines() {
            if source_line.trim().is_empty() {
                doc.move_down(1.0, size);
                continue;
            }
            for line in breaker.break_text(source_line, |s| chain.measure(s, size)) {
                let runs = chain.shape(&line.text, size);
                doc.draw_line(doc.left(), &runs, size);
            }
        }
    }

    fn draw_image(&self, doc: &mut PdfDocument, image: &PlacedImage) {
        let body = self.options.body_size;
        doc.move_down(0.5, body);
        match doc.draw_image(&image.image, image.width, image.height) {
            Ok(()) => doc.move_down(1.5, body),
            Err(e) => log::warn!("could not embed complaint image: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> ComplaintRenderer {
        ComplaintRenderer::new(Arc::new(FontCatalog::builtin()))
    }

    #[test]
    fn test_blank_text_is_rejected() {
        for text in ["", "   ", "\n\t\n"] {
            let err = renderer().render(text, None, Language::English).unwrap_err();
            assert!(err.is_validation(), "{:?}", err);
        }
    }

    #[test]
    fn test_structured_and_unstructured_render() {
        let pdf = renderer()
            .render("Subject: Pothole\nDescription: Deep.", None, Language::English)
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-"));

        let pdf = renderer()
            .render("Please fix the road.", None, Language::Telugu)
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_corrupt_image_is_skipped() {
        let pdf = renderer()
            .render("Subject: Garbage", Some(b"not an image"), Language::English)
            .unwrap();
        let text = String::from_utf8_lossy(&pdf);
        assert!(!text.contains("/Subtype /Image"));
    }

    #[test]
    fn test_render_document() {
        let doc = ComplaintDocument::new("Closing: Thank you", None, Language::from_tag("kn"));
        assert!(renderer().render_document(&doc).is_ok());
    }

    #[test]
    fn test_long_text_spans_pages() {
        let text = "Description: ".to_string() + &"The drain is blocked. ".repeat(600);
        let pdf = renderer().render(&text, None, Language::English).unwrap();
        let text = String::from_utf8_lossy(&pdf);
        let count: usize = text
            .split("/Count ")
            .nth(1)
            .and_then(|rest| rest.split(|c: char| !c.is_ascii_digit()).next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(count >= 2, "expected several pages, got {}", count);
    }
}
