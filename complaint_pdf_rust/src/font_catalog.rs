//! Process-wide font catalog and the font resolution strategy
//!
//! The catalog is populated once at startup (from the bundled
//! `assets/fonts` directory) and then frozen: resolution is a pure,
//! synchronous lookup that never touches the filesystem or the network.
//! The baseline is DejaVu Sans, compiled into the library, so Latin text
//! and a broad Unicode subset render without any font files and
//! resolution can never fail.

use once_cell::sync::{Lazy, OnceCell};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::builtin_fonts::BuiltinFont;
use crate::error::{RenderError, RenderResult};
use crate::font_utils::EmbeddedFont;
use crate::language::Language;
use crate::unicode_utils::detect_scripts;

static GLOBAL_CATALOG: OnceCell<Arc<FontCatalog>> = OnceCell::new();

static BUNDLED_REGULAR: Lazy<Option<Arc<EmbeddedFont>>> = Lazy::new(|| {
    bundled_font(
        "DejaVuSans.ttf",
        include_bytes!("../../assets/fonts/DejaVuSans.ttf"),
    )
});

static BUNDLED_BOLD: Lazy<Option<Arc<EmbeddedFont>>> = Lazy::new(|| {
    bundled_font(
        "DejaVuSans-Bold.ttf",
        include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf"),
    )
});

fn bundled_font(name: &str, data: &'static [u8]) -> Option<Arc<EmbeddedFont>> {
    EmbeddedFont::from_bytes(data.to_vec())
        .map(Arc::new)
        .map_err(|e| log::error!("bundled font {} is unusable: {}", name, e))
        .ok()
}

/// Where a font's glyphs come from.
#[derive(Debug, Clone)]
pub enum FontSource {
    /// Standard Type1 font, never embedded.
    Builtin(BuiltinFont),
    /// TrueType font embedded into every document that uses it.
    Embedded(Arc<EmbeddedFont>),
}

impl PartialEq for FontSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FontSource::Builtin(a), FontSource::Builtin(b)) => a == b,
            (FontSource::Embedded(a), FontSource::Embedded(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl FontSource {
    /// Whether this font can draw `ch`. Built-in fonts accept everything;
    /// characters outside WinAnsi come out as `?`, so they only ever sit
    /// at the end of a fallback chain.
    pub fn covers(&self, ch: char) -> bool {
        match self {
            FontSource::Builtin(_) => true,
            FontSource::Embedded(font) => font.has_char(ch),
        }
    }

    pub fn family(&self) -> &str {
        match self {
            FontSource::Builtin(font) => font.family(),
            FontSource::Embedded(font) => font.family(),
        }
    }

    /// Width of `text` in points at `size`.
    pub fn measure(&self, text: &str, size: f64) -> f64 {
        match self {
            FontSource::Builtin(font) => font.measure(text, size),
            FontSource::Embedded(font) => font.measure(text, size),
        }
    }

    /// Ascent in 1000-unit em space.
    pub fn ascent(&self) -> f64 {
        match self {
            FontSource::Builtin(font) => font.ascent(),
            FontSource::Embedded(font) => font.ascent(),
        }
    }
}

/// A font bound to the language it was registered for (`None` for the
/// language-agnostic baseline).
#[derive(Debug, Clone, PartialEq)]
pub struct FontResource {
    pub language: Option<Language>,
    pub family: String,
    pub source: FontSource,
}

impl FontResource {
    pub fn builtin(font: BuiltinFont) -> Self {
        Self {
            language: None,
            family: font.family().to_string(),
            source: FontSource::Builtin(font),
        }
    }

    pub fn embedded(language: Option<Language>, font: Arc<EmbeddedFont>) -> Self {
        Self {
            language,
            family: font.family().to_string(),
            source: FontSource::Embedded(font),
        }
    }
}

/// Fonts used for one document: title, section headers, body text.
#[derive(Debug, Clone, PartialEq)]
pub struct FontTriple {
    pub title: FontResource,
    pub bold: FontResource,
    pub regular: FontResource,
}

impl FontTriple {
    /// The bundled DejaVu Sans pair. Falls back to Helvetica only if the
    /// compiled-in font data cannot be parsed.
    pub fn builtin() -> Self {
        match (BUNDLED_REGULAR.as_ref(), BUNDLED_BOLD.as_ref()) {
            (Some(regular), bold) => Self::embedded(None, regular.clone(), bold.cloned()),
            (None, _) => Self {
                title: FontResource::builtin(BuiltinFont::HelveticaBold),
                bold: FontResource::builtin(BuiltinFont::HelveticaBold),
                regular: FontResource::builtin(BuiltinFont::Helvetica),
            },
        }
    }

    /// Triple from a regular face and an optional bold face; the regular
    /// face stands in for a missing bold one.
    pub fn embedded(
        language: Option<Language>,
        regular: Arc<EmbeddedFont>,
        bold: Option<Arc<EmbeddedFont>>,
    ) -> Self {
        let bold = bold.unwrap_or_else(|| regular.clone());
        Self {
            title: FontResource::embedded(language, bold.clone()),
            bold: FontResource::embedded(language, bold),
            regular: FontResource::embedded(language, regular),
        }
    }
}

/// Resolves the fonts for a complaint. Implementations must be pure and
/// cheap: they are called once per render on the request path.
pub trait FontResolver: Send + Sync {
    /// The language-agnostic fallback triple.
    fn baseline(&self) -> FontTriple;

    /// Fonts for `language`, or the baseline when none are registered.
    fn resolve(&self, language: Language) -> FontTriple;

    /// Like [`FontResolver::resolve`], but when `language` only yields the
    /// baseline and `text` is written in a script with registered fonts,
    /// that script's fonts are used instead.
    fn resolve_for_text(&self, language: Language, text: &str) -> FontTriple {
        let resolved = self.resolve(language);
        let baseline = self.baseline();
        if resolved != baseline {
            return resolved;
        }
        detect_scripts(text)
            .into_iter()
            .map(|script| self.resolve(script))
            .find(|triple| *triple != baseline)
            .unwrap_or(resolved)
    }
}

/// Fonts registered ahead of time, frozen after startup.
#[derive(Debug, Clone)]
pub struct FontCatalog {
    baseline: FontTriple,
    scripts: BTreeMap<Language, FontTriple>,
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontCatalog {
    /// Catalog with only the bundled baseline.
    pub fn builtin() -> Self {
        Self {
            baseline: FontTriple::builtin(),
            scripts: BTreeMap::new(),
        }
    }

    /// Load every known font family found in `dir`.
    ///
    /// Looks for `<stem>-Regular.ttf` and `<stem>-Bold.ttf` per language
    /// (see [`Language::font_stem`]). Missing or broken files are logged and
    /// skipped; this never fails.
    pub fn from_dir(dir: &Path) -> Self {
        let mut catalog = Self::builtin();
        if !dir.is_dir() {
            log::warn!(
                "font directory {} not found, using the bundled baseline only",
                dir.display()
            );
            return catalog;
        }

        for language in Language::ALL {
            let stem = language.font_stem();
            let regular_path = dir.join(format!("{}-Regular.ttf", stem));
            if !regular_path.exists() {
                log::debug!("no {} font at {}", language.display_name(), regular_path.display());
                continue;
            }
            let regular = match EmbeddedFont::load(&regular_path) {
                Ok(font) => font,
                Err(e) => {
                    log::warn!("skipping {}: {}", regular_path.display(), e);
                    continue;
                }
            };

            let bold_path = dir.join(format!("{}-Bold.ttf", stem));
            let bold = if bold_path.exists() {
                EmbeddedFont::load(&bold_path)
                    .map_err(|e| log::warn!("skipping {}: {}", bold_path.display(), e))
                    .ok()
            } else {
                None
            };

            if let Err(e) = catalog.register(language, regular, bold) {
                log::warn!("{}", e);
            }
        }
        catalog
    }

    /// Register the fonts for `language`. English fonts replace the
    /// bundled baseline.
    ///
    /// Fails if a face does not contain the script's sample character.
    pub fn register(
        &mut self,
        language: Language,
        regular: EmbeddedFont,
        bold: Option<EmbeddedFont>,
    ) -> RenderResult<()> {
        let sample = language.sample_char();
        for font in std::iter::once(&regular).chain(bold.as_ref()) {
            if !font.has_char(sample) {
                return Err(RenderError::Font(format!(
                    "{} cannot render {} (missing U+{:04X})",
                    font.family(),
                    language.display_name(),
                    sample as u32
                )));
            }
        }

        let regular = Arc::new(regular);
        let bold = bold.map(Arc::new);
        if language.is_latin() {
            log::info!("baseline font: {}", regular.family());
            self.baseline = FontTriple::embedded(None, regular, bold);
        } else {
            log::info!("{} font: {}", language.display_name(), regular.family());
            self.scripts
                .insert(language, FontTriple::embedded(Some(language), regular, bold));
        }
        Ok(())
    }

    pub fn registered_languages(&self) -> Vec<Language> {
        self.scripts.keys().copied().collect()
    }

    /// Freeze this catalog as the process-wide one. The first call wins;
    /// later calls log a warning and return the already-installed catalog.
    pub fn install(self) -> Arc<FontCatalog> {
        let mut installed = false;
        let catalog = GLOBAL_CATALOG.get_or_init(|| {
            installed = true;
            Arc::new(self)
        });
        if !installed {
            log::warn!("font catalog already installed, keeping the existing one");
        }
        catalog.clone()
    }

    /// The process-wide catalog; the bundled baseline if none was installed.
    pub fn global() -> Arc<FontCatalog> {
        GLOBAL_CATALOG
            .get_or_init(|| Arc::new(FontCatalog::builtin()))
            .clone()
    }
}

impl FontResolver for FontCatalog {
    fn baseline(&self) -> FontTriple {
        self.baseline.clone()
    }

    fn resolve(&self, language: Language) -> FontTriple {
        self.scripts
            .get(&language)
            .cloned()
            .unwrap_or_else(|| self.baseline.clone())
    }
}
