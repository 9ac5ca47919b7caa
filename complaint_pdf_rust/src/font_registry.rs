//! Per-document font registry
//!
//! Assigns each font used by a document a resource name (`F1`, `F2`, ...)
//! and an object id, collects the glyphs drawn with embedded fonts, and
//! writes all font objects once the pages are done.

use pdf_writer::writers::Resources;
use pdf_writer::{Name, Pdf, Ref};
use std::sync::Arc;

use crate::builtin_fonts::BuiltinFont;
use crate::error::RenderResult;
use crate::font_catalog::FontSource;
use crate::font_utils::{add_truetype_font, EmbeddedFont, GlyphUsage, ShapedGlyph};

enum RegisteredKind {
    Builtin(BuiltinFont),
    Embedded {
        font: Arc<EmbeddedFont>,
        usage: GlyphUsage,
    },
}

struct RegisteredFont {
    id: Ref,
    name: String,
    source: FontSource,
    kind: RegisteredKind,
}

/// Fonts referenced by one document, in first-use order.
#[derive(Default)]
pub struct FontRegistry {
    fonts: Vec<RegisteredFont>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name for `source`, registering it on first use.
    pub fn resource_name(&mut self, source: &FontSource, next_ref_id: &mut i32) -> String {
        if let Some(font) = self.fonts.iter().find(|f| f.source == *source) {
            return font.name.clone();
        }

        let id = Ref::new(*next_ref_id);
        *next_ref_id += 1;
        let name = format!("F{}", self.fonts.len() + 1);
        let kind = match source {
            FontSource::Builtin(builtin) => RegisteredKind::Builtin(*builtin),
            FontSource::Embedded(font) => RegisteredKind::Embedded {
                font: font.clone(),
                usage: GlyphUsage::default(),
            },
        };
        log::debug!("registered font {} as /{}", source.family(), name);
        self.fonts.push(RegisteredFont {
            id,
            name: name.clone(),
            source: source.clone(),
            kind,
        });
        name
    }

    /// Remember glyphs drawn with an embedded font for its widths and
    /// ToUnicode map.
    pub fn record_glyphs(&mut self, source: &FontSource, glyphs: &[ShapedGlyph]) {
        let Some(font) = self.fonts.iter_mut().find(|f| f.source == *source) else {
            return;
        };
        if let RegisteredKind::Embedded { usage, .. } = &mut font.kind {
            for glyph in glyphs {
                usage.record(glyph);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Add every registered font to a page's resource dictionary.
    pub fn write_resources(&self, resources: &mut Resources) {
        if self.fonts.is_empty() {
            return;
        }
        let mut fonts = resources.fonts();
        for font in &self.fonts {
            fonts.pair(Name(font.name.as_bytes()), font.id);
        }
    }

    /// Write the font objects. Embedded fonts without any drawn glyph are
    /// still written so every page resource resolves.
    pub fn write_fonts(&self, pdf: &mut Pdf, next_ref_id: &mut i32) -> RenderResult<()> {
        for font in &self.fonts {
            match &font.kind {
                RegisteredKind::Builtin(builtin) => builtin.write(pdf, font.id),
                RegisteredKind::Embedded { font: embedded, usage } => {
                    add_truetype_font(pdf, embedded, font.id, next_ref_id, usage)?
                }
            }
        }
        Ok(())
    }
}
