//! Text layout and line breaking
//!
//! This module provides:
//! - Font runs: splitting text between the fonts of a fallback chain
//! - Shaping of each run into drawable glyphs
//! - Measurement and greedy word wrapping

use crate::builtin_fonts::BuiltinFont;
use crate::canvas::TextItem;
use crate::font_catalog::{FontResource, FontSource};
use crate::font_utils::ShapedGlyph;
use crate::unicode_utils::{is_cluster_continuation, is_run_neutral};

/// Ordered list of fonts tried for every character; the last entry is a
/// built-in font, so every character resolves.
#[derive(Debug, Clone)]
pub struct FontChain {
    fonts: Vec<FontSource>,
}

impl FontChain {
    /// Chain `primary`, then `baseline`, then the built-in font of the same
    /// weight. Duplicates are dropped.
    pub fn new(primary: &FontResource, baseline: &FontResource, bold: bool) -> Self {
        let builtin = if bold {
            BuiltinFont::HelveticaBold
        } else {
            BuiltinFont::Helvetica
        };
        let mut fonts: Vec<FontSource> = Vec::with_capacity(3);
        for source in [
            primary.source.clone(),
            baseline.source.clone(),
            FontSource::Builtin(builtin),
        ] {
            if !fonts.contains(&source) {
                fonts.push(source);
            }
        }
        Self { fonts }
    }

    fn font_index(&self, ch: char) -> usize {
        self.fonts
            .iter()
            .position(|font| font.covers(ch))
            .unwrap_or(self.fonts.len() - 1)
    }

    /// Split `text` into `(font index, slice)` runs. Whitespace and
    /// invisible characters stay in the run of the text around them.
    pub fn segment<'t>(&self, text: &'t str) -> Vec<(usize, &'t str)> {
        let mut runs = Vec::new();
        let mut current: Option<usize> = None;
        let mut start = 0;

        for (pos, ch) in text.char_indices() {
            if is_run_neutral(ch) {
                continue;
            }
            let index = self.font_index(ch);
            match current {
                None => current = Some(index),
                Some(cur) if cur != index => {
                    runs.push((cur, &text[start..pos]));
                    start = pos;
                    current = Some(index);
                }
                Some(_) => {}
            }
        }
        if start < text.len() {
            runs.push((current.unwrap_or(0), &text[start..]));
        }
        runs
    }

    /// Width of `text` in points at `size`.
    pub fn measure(&self, text: &str, size: f64) -> f64 {
        self.segment(text)
            .into_iter()
            .map(|(index, run)| self.fonts[index].measure(run, size))
            .sum()
    }

    /// Shape `text` into drawable runs.
    pub fn shape(&self, text: &str, size: f64) -> Vec<ShapedRun> {
        self.segment(text)
            .into_iter()
            .map(|(index, run)| ShapedRun::new(&self.fonts[index], run, size))
            .filter(|run| !run.is_empty())
            .collect()
    }
}

/// Glyphs of one run, in the form the run's font expects.
#[derive(Debug, Clone, PartialEq)]
pub enum RunGlyphs {
    /// WinAnsi bytes for a built-in font.
    Encoded(Vec<u8>),
    /// Shaped glyph ids for an embedded font.
    Shaped(Vec<ShapedGlyph>),
}

/// A piece of a line drawn with a single font.
#[derive(Debug, Clone)]
pub struct ShapedRun {
    pub font: FontSource,
    pub glyphs: RunGlyphs,
    /// Advance width in points.
    pub width: f64,
}

impl ShapedRun {
    fn new(font: &FontSource, text: &str, size: f64) -> Self {
        let (glyphs, width) = match font {
            FontSource::Builtin(builtin) => {
                let bytes = builtin.encode(text);
                let width = builtin.measure_bytes(&bytes, size);
                (RunGlyphs::Encoded(bytes), width)
            }
            FontSource::Embedded(embedded) => {
                let glyphs = embedded.shape(text);
                let units: f32 = glyphs.iter().map(|g| g.advance).sum();
                (RunGlyphs::Shaped(glyphs), units as f64 * size / 1000.0)
            }
        };
        Self {
            font: font.clone(),
            glyphs,
            width,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.glyphs {
            RunGlyphs::Encoded(bytes) => bytes.is_empty(),
            RunGlyphs::Shaped(glyphs) => glyphs.is_empty(),
        }
    }

    /// Operands for a `Tj`/`TJ` operator drawing this run.
    pub fn text_items(&self) -> Vec<TextItem> {
        match (&self.glyphs, &self.font) {
            (RunGlyphs::Encoded(bytes), _) => vec![TextItem::Show(bytes.clone())],
            (RunGlyphs::Shaped(glyphs), FontSource::Embedded(font)) => {
                positioned_items(glyphs, |gid| font.advance(gid))
            }
            (RunGlyphs::Shaped(glyphs), FontSource::Builtin(_)) => {
                positioned_items(glyphs, |_| 0.0)
            }
        }
    }
}

/// Turn shaped glyphs into `TJ` operands.
///
/// A viewer advances each glyph by its `/W` width (`font_width`); the
/// adjustments move every glyph to the position rustybuzz computed from
/// the shaped advances and x offsets. Y offsets are not applied.
pub fn positioned_items(glyphs: &[ShapedGlyph], font_width: impl Fn(u16) -> f32) -> Vec<TextItem> {
    fn adjust(items: &mut Vec<TextItem>, pending: &mut Vec<u8>, amount: f32) {
        if amount.abs() < 0.01 {
            return;
        }
        if !pending.is_empty() {
            items.push(TextItem::Show(std::mem::take(pending)));
        }
        items.push(TextItem::Adjust(amount));
    }

    let mut items = Vec::new();
    let mut pending: Vec<u8> = Vec::new();

    if let Some(first) = glyphs.first() {
        adjust(&mut items, &mut pending, -first.x_offset);
    }
    for (i, glyph) in glyphs.iter().enumerate() {
        pending.extend_from_slice(&glyph.gid.to_be_bytes());
        let next_offset = glyphs.get(i + 1).map(|g| g.x_offset).unwrap_or(0.0);
        let amount = font_width(glyph.gid) + glyph.x_offset - glyph.advance - next_offset;
        if i + 1 < glyphs.len() {
            adjust(&mut items, &mut pending, amount);
        }
    }
    if !pending.is_empty() {
        items.push(TextItem::Show(pending));
    }
    items
}

/// One wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub width: f64,
}

/// Greedy word wrapper.
///
/// The first line may have a different width than the rest (text that
/// follows an inline header). Words longer than a line are split between
/// clusters.
pub struct LineBreaker {
    first_line_width: f64,
    width: f64,
}

impl LineBreaker {
    pub fn new(width: f64) -> Self {
        Self {
            first_line_width: width,
            width,
        }
    }

    pub fn with_first_line(first_line_width: f64, width: f64) -> Self {
        Self {
            first_line_width,
            width,
        }
    }

    fn limit(&self, lines: &[Line]) -> f64 {
        if lines.is_empty() {
            self.first_line_width
        } else {
            self.width
        }
    }

    /// Wrap a single paragraph. Runs of whitespace collapse to one space.
    ///
    /// Every word is measured once and line widths are summed from word
    /// widths, so wrapping stays linear in the length of the text.
    ///
    /// If the first word does not fit on a shortened first line, the first
    /// line is left empty and the text starts on the next one.
    pub fn break_text(&self, text: &str, measure: impl Fn(&str) -> f64) -> Vec<Line> {
        let mut lines: Vec<Line> = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0;
        let mut space_width = None;

        for word in text.split_whitespace() {
            let word_width = measure(word);
            if !current.is_empty() {
                let space = *space_width.get_or_insert_with(|| measure(" "));
                let candidate_width = current_width + space + word_width;
                if candidate_width <= self.limit(&lines) {
                    current.push(' ');
                    current.push_str(word);
                    current_width = candidate_width;
                    continue;
                }
                lines.push(Line {
                    text: std::mem::take(&mut current),
                    width: current_width,
                });
            }

            if word_width <= self.limit(&lines) {
                current = word.to_string();
                current_width = word_width;
                continue;
            }
            if lines.is_empty() && self.first_line_width < self.width {
                lines.push(Line {
                    text: String::new(),
                    width: 0.0,
                });
                if word_width <= self.width {
                    current = word.to_string();
                    current_width = word_width;
                    continue;
                }
            }

            let mut pieces = self.split_word(word, &lines, &measure);
            if let Some(last) = pieces.pop() {
                lines.extend(pieces);
                current_width = last.width;
                current = last.text;
            }
        }

        if !current.is_empty() {
            lines.push(Line {
                text: current,
                width: current_width,
            });
        }
        lines
    }

    fn split_word(&self, word: &str, lines: &[Line], measure: &impl Fn(&str) -> f64) -> Vec<Line> {
        let mut pieces: Vec<Line> = Vec::new();
        let mut piece = String::new();
        let mut piece_width = 0.0;

        for cluster in clusters(word) {
            let limit = if lines.is_empty() && pieces.is_empty() {
                self.first_line_width
            } else {
                self.width
            };
            let cluster_width = measure(cluster);
            if piece_width + cluster_width <= limit || piece.is_empty() {
                piece.push_str(cluster);
                piece_width += cluster_width;
            } else {
                pieces.push(Line {
                    text: std::mem::replace(&mut piece, cluster.to_string()),
                    width: piece_width,
                });
                piece_width = cluster_width;
            }
        }
        if !piece.is_empty() {
            pieces.push(Line {
                text: piece,
                width: piece_width,
            });
        }
        pieces
    }
}

/// Split a word into pieces a line may break between.
fn clusters(word: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (pos, ch) in word.char_indices() {
        if let Some(p) = prev {
            if !is_cluster_continuation(p, ch) {
                result.push(&word[start..pos]);
                start = pos;
            }
        }
        prev = Some(ch);
    }
    if start < word.len() {
        result.push(&word[start..]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_chain() -> FontChain {
        let regular = FontResource::builtin(BuiltinFont::Helvetica);
        FontChain::new(&regular, &regular, false)
    }

    #[test]
    fn test_builtin_chain_is_deduplicated() {
        let chain = builtin_chain();
        assert_eq!(chain.fonts.len(), 1);
        assert_eq!(chain.fonts[0].family(), "Helvetica");

        let bold = FontResource::builtin(BuiltinFont::HelveticaBold);
        let regular = FontResource::builtin(BuiltinFont::Helvetica);
        let mixed = FontChain::new(&regular, &bold, false);
        assert_eq!(mixed.fonts.len(), 2);
    }

    #[test]
    fn test_builtin_chain_single_run() {
        let chain = builtin_chain();
        let runs = chain.segment("  Pothole రోడ్డు  ");
        assert_eq!(runs, vec![(0, "  Pothole రోడ్డు  ")]);
    }

    #[test]
    fn test_shape_builtin_run_replaces_unmapped() {
        let chain = builtin_chain();
        let runs = chain.shape("ab అ", 12.0);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].glyphs, RunGlyphs::Encoded(b"ab ?".to_vec()));
        assert!((runs[0].width - chain.measure("ab ?", 12.0)).abs() < 1e-9);
    }

    fn glyph(gid: u16, advance: f32, x_offset: f32) -> ShapedGlyph {
        ShapedGlyph {
            gid,
            text: String::new(),
            advance,
            x_offset,
        }
    }

    #[test]
    fn test_unadjusted_glyphs_form_one_string() {
        let glyphs = [glyph(36, 600.0, 0.0), glyph(37, 550.0, 0.0)];
        let items = positioned_items(&glyphs, |gid| if gid == 36 { 600.0 } else { 550.0 });
        assert_eq!(items, vec![TextItem::Show(vec![0, 36, 0, 37])]);
    }

    #[test]
    fn test_shaped_advances_become_adjustments() {
        // kerned pair: shaped advance 40 units narrower than the font width,
        // then a mark with a -300 offset and zero advance
        let glyphs = [
            glyph(1, 560.0, 0.0),
            glyph(2, 500.0, 0.0),
            glyph(3, 0.0, -300.0),
        ];
        let items = positioned_items(&glyphs, |gid| match gid {
            1 => 600.0,
            2 => 500.0,
            _ => 0.0,
        });
        assert_eq!(
            items,
            vec![
                TextItem::Show(vec![0, 1]),
                TextItem::Adjust(40.0),
                TextItem::Show(vec![0, 2]),
                TextItem::Adjust(300.0),
                TextItem::Show(vec![0, 3]),
            ]
        );
    }

    #[test]
    fn test_break_text_wraps_on_words() {
        let breaker = LineBreaker::new(10.0);
        let lines = breaker.break_text("aa bb cc dddd", |s| s.chars().count() as f64 * 2.0);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["aa bb", "cc", "dddd"]);
        assert_eq!(lines[0].width, 10.0);
    }

    #[test]
    fn test_break_text_collapses_whitespace() {
        let breaker = LineBreaker::new(100.0);
        let lines = breaker.break_text("  one   two\tthree ", |s| s.len() as f64);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "one two three");
        assert!(breaker.break_text("   ", |s| s.len() as f64).is_empty());
    }

    #[test]
    fn test_break_text_measures_each_word_once() {
        use std::cell::Cell;

        let text = "pothole ".repeat(400);
        let measured = Cell::new(0usize);
        let calls = Cell::new(0usize);
        let breaker = LineBreaker::new(80.0);
        let lines = breaker.break_text(&text, |s| {
            measured.set(measured.get() + s.len());
            calls.set(calls.get() + 1);
            s.len() as f64
        });
        // ten words of 7 plus nine spaces fill 79 of 80 points
        assert_eq!(lines.len(), 40);
        // 400 words plus one measurement of the space
        assert_eq!(calls.get(), 401);
        assert_eq!(measured.get(), 400 * "pothole".len() + 1);
    }

    #[test]
    fn test_long_word_is_split() {
        let breaker = LineBreaker::new(3.0);
        let lines = breaker.break_text("abcdefgh", |s| s.len() as f64);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_short_first_line_moves_text_down() {
        let breaker = LineBreaker::with_first_line(2.0, 10.0);
        let lines = breaker.break_text("hello world", |s| s.len() as f64);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["", "hello", "world"]);

        let breaker = LineBreaker::with_first_line(6.0, 10.0);
        let lines = breaker.break_text("hi there you", |s| s.len() as f64);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "there you"]);
    }

    #[test]
    fn test_clusters_keep_vowel_signs_and_conjuncts() {
        assert_eq!(clusters("abc"), vec!["a", "b", "c"]);
        // ro + ddu
        assert_eq!(clusters("రోడ్డు"), vec!["రో", "డ్డు"]);
    }

    #[test]
    fn test_every_character_survives_wrapping() {
        let chain = builtin_chain();
        let text = "Large pothole near the bus stop causing accidents every single evening";
        let breaker = LineBreaker::new(120.0);
        let lines = breaker.break_text(text, |s| chain.measure(s, 12.0));
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 120.0));
        let rejoined: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), text);
    }
}
