//! Paged PDF document with a top-down cursor
//!
//! Wraps `pdf_writer::Pdf` with the bookkeeping the renderer needs: object
//! ids, the current page's canvas, a vertical cursor that flows onto new
//! pages, and the font and image resources shared by all pages. Page
//! objects are written in [`PdfDocument::finish`] once the full resource
//! set is known.

use pdf_writer::{Name, Pdf, Rect as PdfRect, Ref, TextStr};

use crate::canvas::PdfCanvas;
use crate::error::{RenderError, RenderResult};
use crate::font_registry::FontRegistry;
use crate::image_utils::{add_image_to_pdf, DecodedImage};
use crate::text_layout::{RunGlyphs, ShapedRun};
use crate::types::{Color, Rect, RenderOptions};

/// Space between a photo and its border.
const IMAGE_BORDER_GAP: f64 = 2.0;

pub struct PdfDocument {
    pdf: Pdf,
    next_ref_id: i32,
    catalog_id: Ref,
    page_tree_id: Ref,
    info_id: Ref,
    options: RenderOptions,
    pages: Vec<Vec<u8>>,
    canvas: PdfCanvas,
    /// Top of the next line, in PDF user space.
    cursor_y: f64,
    fonts: FontRegistry,
    images: Vec<(String, Ref)>,
}

impl PdfDocument {
    pub fn new(options: RenderOptions) -> Self {
        let cursor_y = options.page_size.height - options.margins.top;
        Self {
            pdf: Pdf::new(),
            next_ref_id: 4,
            catalog_id: Ref::new(1),
            page_tree_id: Ref::new(2),
            info_id: Ref::new(3),
            options,
            pages: Vec::new(),
            canvas: PdfCanvas::new(),
            cursor_y,
            fonts: FontRegistry::new(),
            images: Vec::new(),
        }
    }

    fn next_ref(&mut self) -> Ref {
        let r = Ref::new(self.next_ref_id);
        self.next_ref_id += 1;
        r
    }

    pub fn left(&self) -> f64 {
        self.options.margins.left
    }

    pub fn content_width(&self) -> f64 {
        self.options.content_width()
    }

    fn top(&self) -> f64 {
        self.options.page_size.height - self.options.margins.top
    }

    fn bottom(&self) -> f64 {
        self.options.margins.bottom
    }

    /// Pages started so far, including the current one.
    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    pub fn line_height(&self, size: f64) -> f64 {
        size * self.options.line_spacing
    }

    /// Close the current page and start a new one.
    pub fn new_page(&mut self) {
        let canvas = std::mem::take(&mut self.canvas);
        self.pages.push(canvas.finish());
        self.cursor_y = self.top();
        log::debug!("started page {}", self.page_count());
    }

    /// Start a new page unless `height` fits above the bottom margin. A
    /// fresh page is never skipped, even if `height` is larger than it.
    pub fn ensure_space(&mut self, height: f64) {
        let at_page_top = (self.cursor_y - self.top()).abs() < f64::EPSILON;
        if self.cursor_y - height < self.bottom() && !at_page_top {
            self.new_page();
        }
    }

    /// Advance the cursor by `lines` line heights at `size`.
    pub fn move_down(&mut self, lines: f64, size: f64) {
        self.cursor_y -= lines * self.line_height(size);
        if self.cursor_y < self.bottom() {
            self.new_page();
        }
    }

    /// Draw one line of runs starting at `x` and advance the cursor.
    /// Returns the baseline the runs were drawn on.
    pub fn draw_line(&mut self, x: f64, runs: &[ShapedRun], size: f64) -> f64 {
        let line_height = self.line_height(size);
        self.ensure_space(line_height);

        let ascent = runs
            .iter()
            .map(|run| run.font.ascent())
            .fold(0.0_f64, f64::max)
            .clamp(700.0, 1100.0);
        let baseline = self.cursor_y - ascent * size / 1000.0;

        let mut pen_x = x;
        for run in runs {
            let name = self.fonts.resource_name(&run.font, &mut self.next_ref_id);
            if let RunGlyphs::Shaped(glyphs) = &run.glyphs {
                self.fonts.record_glyphs(&run.font, glyphs);
            }
            self.canvas
                .draw_text(pen_x, baseline, &name, size, &run.text_items());
            pen_x += run.width;
        }

        self.cursor_y -= line_height;
        baseline
    }

    /// Underline `width` points of text drawn on `baseline`.
    pub fn underline(&mut self, x: f64, baseline: f64, width: f64, size: f64) {
        if width <= 0.0 {
            return;
        }
        let thickness = if size < 10.0 { 0.5 } else { (size / 10.0).floor() };
        let y = baseline - thickness - 0.5;
        self.canvas.save_state();
        self.canvas.set_stroke_color(Color::black());
        self.canvas.set_line_width(thickness);
        self.canvas.line(x, y, x + width, y);
        self.canvas.restore_state();
    }

    /// Place a photo centred in the content area with a gray border, moving
    /// to a new page if it does not fit. Images taller than a page are
    /// scaled down further.
    pub fn draw_image(&mut self, image: &DecodedImage, width: f64, height: f64) -> RenderResult<()> {
        let max_height = self.options.content_height() - 2.0 * IMAGE_BORDER_GAP;
        let (width, height) = if height > max_height {
            (width * max_height / height, max_height)
        } else {
            (width, height)
        };

        self.ensure_space(height + 2.0 * IMAGE_BORDER_GAP);

        let image_id = self.next_ref();
        add_image_to_pdf(&mut self.pdf, image, image_id, &mut self.next_ref_id)?;
        let name = format!("Im{}", self.images.len() + 1);
        self.images.push((name.clone(), image_id));

        let x = self.left() + (self.content_width() - width) / 2.0;
        let top = self.cursor_y - IMAGE_BORDER_GAP;
        let rect = Rect::new(x, top - height, width, height);
        self.canvas.draw_image(&name, rect);

        self.canvas.save_state();
        self.canvas.set_stroke_color(Color::border_gray());
        self.canvas.set_line_width(1.0);
        self.canvas.stroke_rect(rect.outset(IMAGE_BORDER_GAP));
        self.canvas.restore_state();

        self.cursor_y = top - height - IMAGE_BORDER_GAP;
        Ok(())
    }

    /// Write fonts, pages and the catalog, and return the PDF bytes.
    pub fn finish(mut self) -> RenderResult<Vec<u8>> {
        let last = std::mem::take(&mut self.canvas);
        self.pages.push(last.finish());

        self.fonts.write_fonts(&mut self.pdf, &mut self.next_ref_id)?;

        let page_size = self.options.page_size;
        let pages = std::mem::take(&mut self.pages);
        let mut page_ids = Vec::with_capacity(pages.len());
        for content in pages {
            let page_id = self.next_ref();
            let content_id = self.next_ref();
            self.pdf.stream(content_id, &content);

            {
                let mut page = self.pdf.page(page_id);
                page.media_box(PdfRect::new(
                    0.0,
                    0.0,
                    page_size.width as f32,
                    page_size.height as f32,
                ))
                .parent(self.page_tree_id)
                .contents(content_id);
                let mut resources = page.resources();
                self.fonts.write_resources(&mut resources);
                if !self.images.is_empty() {
                    let mut x_objects = resources.x_objects();
                    for (name, id) in &self.images {
                        x_objects.pair(Name(name.as_bytes()), *id);
                    }
                }
            }
            page_ids.push(page_id);
        }

        let page_count = page_ids.len() as i32;
        self.pdf
            .pages(self.page_tree_id)
            .kids(page_ids)
            .count(page_count);
        self.pdf.catalog(self.catalog_id).pages(self.page_tree_id);
        self.pdf
            .document_info(self.info_id)
            .title(TextStr(&self.options.title))
            .producer(TextStr("InfraVision"));

        let bytes = self.pdf.finish();
        if !bytes.starts_with(b"%PDF-") {
            return Err(RenderError::Fault("writer produced no PDF header".into()));
        }
        log::debug!(
            "finished PDF: {} page(s), {} font(s), {} image(s), {} bytes",
            page_count,
            self.fonts.len(),
            self.images.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}
