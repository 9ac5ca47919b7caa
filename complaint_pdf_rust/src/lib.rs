//! Complaint letter PDF renderer for InfraVision
//!
//! Turns complaint text (optionally labelled with `Subject:`,
//! `Description:` ... lines), an optional photo and a language tag into a
//! formal-letter PDF using pdf-writer. Fonts for Indic scripts are loaded
//! once from TrueType files and shaped with rustybuzz; the DejaVu Sans
//! baseline is compiled in and needs no I/O at all.

mod builtin_fonts;
mod canvas;
mod document;
mod error;
mod font_catalog;
mod font_registry;
mod font_utils;
mod image_utils;
mod language;
pub mod renderer;
mod sections;
mod text_layout;
mod types;
mod unicode_utils;

pub use builtin_fonts::BuiltinFont;
pub use error::{RenderError, RenderResult};
pub use font_catalog::{FontCatalog, FontResolver, FontResource, FontSource, FontTriple};
pub use font_utils::{find_assets_font_dir, EmbeddedFont};
pub use language::Language;
pub use renderer::ComplaintRenderer;
pub use sections::{parse_sections, ParsedComplaint, Section, SectionLabel};
pub use types::{Color, ComplaintDocument, Margins, Rect, RenderOptions, Size};

/// Render with the process-wide font catalog (see [`FontCatalog::install`]).
pub fn render_complaint(text: &str, image: Option<&[u8]>, language: Language) -> RenderResult<Vec<u8>> {
    ComplaintRenderer::global().render(text, image, language)
}
