//! TrueType font loading, shaping and embedding
//!
//! Script fonts are parsed once (at catalog load) into an [`EmbeddedFont`]
//! holding the raw bytes plus the metrics needed for layout. Text is shaped
//! with rustybuzz so Indic conjuncts and vowel signs come out right; the
//! resulting glyph ids are written as CIDs of an Identity-H Type0 font.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use once_cell::sync::OnceCell;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::{Filter, Name, Pdf, Rect, Ref, Str};
use rustybuzz::UnicodeBuffer;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use ttf_parser::{name_id, Face, GlyphId};

use crate::error::{RenderError, RenderResult};

/// Default width (half of 1000 units) used when a glyph has no advance
const DEFAULT_WIDTH: f32 = 500.0;

/// Measured strings remembered per font
const WIDTH_CACHE_ENTRIES: usize = 20_000;

/// Shaped widths in 1000-unit em space, oldest entries evicted first.
#[derive(Debug)]
struct WidthCache {
    map: HashMap<String, f32>,
    order: VecDeque<String>,
    max_entries: usize,
}

impl WidthCache {
    fn new(max_entries: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    fn get(&self, text: &str) -> Option<f32> {
        self.map.get(text).copied()
    }

    fn insert(&mut self, text: &str, units: f32) {
        if self.map.contains_key(text) {
            return;
        }
        self.map.insert(text.to_string(), units);
        self.order.push_back(text.to_string());
        while self.map.len() > self.max_entries {
            match self.order.pop_front() {
                Some(old) => {
                    self.map.remove(&old);
                }
                None => break,
            }
        }
    }
}

/// A parsed TrueType/OpenType font ready for shaping and embedding.
pub struct EmbeddedFont {
    family: String,
    postscript_name: String,
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    bold: bool,
    // Unicode code point -> glyph id, BMP only
    cmap: HashMap<u32, u16>,
    advances: Vec<u16>,
    widths: Mutex<WidthCache>,
    // FlateDecode'd font program, built on first embed
    compressed: OnceCell<Vec<u8>>,
}

impl fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("family", &self.family)
            .field("postscript_name", &self.postscript_name)
            .field("bytes", &self.data.len())
            .field("glyphs", &self.advances.len())
            .finish()
    }
}

/// One shaped glyph, metrics in 1000-unit em space.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    pub gid: u16,
    /// Source text of the glyph's cluster; empty for the trailing glyphs
    /// of a multi-glyph cluster.
    pub text: String,
    pub advance: f32,
    pub x_offset: f32,
}

impl EmbeddedFont {
    /// Parse and validate font bytes.
    pub fn from_bytes(data: Vec<u8>) -> RenderResult<Self> {
        let face = Face::parse(&data, 0)?;

        let find_name = |id: u16| {
            face.names()
                .into_iter()
                .filter(|name| name.name_id == id)
                .find_map(|name| name.to_string())
        };
        let family = find_name(name_id::FAMILY).unwrap_or_else(|| "Unnamed".to_string());
        let postscript_name = find_name(name_id::POST_SCRIPT_NAME)
            .unwrap_or_else(|| family.clone())
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect::<String>();

        let mut cmap = HashMap::new();
        for code_point in 0x0020u32..=0xFFFFu32 {
            if let Some(ch) = char::from_u32(code_point) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    cmap.insert(code_point, glyph_id.0);
                }
            }
        }
        if cmap.is_empty() {
            return Err(RenderError::Font(format!(
                "{} does not provide any Unicode glyphs in BMP range",
                family
            )));
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0))
            .collect();

        let bbox = face.global_bounding_box();
        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let bold = face.is_bold();

        Ok(Self {
            family,
            postscript_name,
            data: Arc::new(data),
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            bold,
            cmap,
            advances,
            widths: Mutex::new(WidthCache::new(WIDTH_CACHE_ENTRIES)),
            compressed: OnceCell::new(),
        })
    }

    /// Load TTF/OTF font from file path
    pub fn load(path: &Path) -> RenderResult<Self> {
        let data = load_font_file(path)?;
        Self::from_bytes(data)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn compressed_data(&self) -> RenderResult<&[u8]> {
        self.compressed
            .get_or_try_init(|| compress(&self.data))
            .map(Vec::as_slice)
    }

    pub fn has_char(&self, ch: char) -> bool {
        self.cmap.contains_key(&(ch as u32))
    }

    fn scale(&self) -> f32 {
        1000.0 / self.units_per_em as f32
    }

    /// Horizontal advance of a glyph in 1000-unit em space.
    pub fn advance(&self, gid: u16) -> f32 {
        self.advances
            .get(gid as usize)
            .map(|adv| *adv as f32 * self.scale())
            .unwrap_or(DEFAULT_WIDTH)
    }

    pub fn ascent(&self) -> f64 {
        self.ascender as f64 * self.scale() as f64
    }

    /// Shape `text` into positioned glyphs.
    ///
    /// Falls back to a plain cmap lookup (no ligatures, no reordering) if
    /// rustybuzz cannot open the face.
    pub fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        let Some(face) = rustybuzz::Face::from_slice(&self.data, 0) else {
            log::warn!("rustybuzz could not open {}, using unshaped glyphs", self.family);
            return self.shape_unshaped(text);
        };

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let output = rustybuzz::shape(&face, &[], buffer);

        let infos = output.glyph_infos();
        let positions = output.glyph_positions();

        let mut boundaries: Vec<usize> = infos.iter().map(|g| g.cluster as usize).collect();
        boundaries.push(text.len());
        boundaries.sort_unstable();
        boundaries.dedup();

        let scale = self.scale();
        let mut seen_clusters = Vec::new();
        infos
            .iter()
            .zip(positions)
            .map(|(info, pos)| {
                let start = (info.cluster as usize).min(text.len());
                let cluster_text = if seen_clusters.contains(&start) {
                    String::new()
                } else {
                    seen_clusters.push(start);
                    let end = boundaries
                        .iter()
                        .copied()
                        .find(|b| *b > start)
                        .unwrap_or(text.len());
                    text.get(start..end).unwrap_or_default().to_string()
                };
                ShapedGlyph {
                    gid: u16::try_from(info.glyph_id).unwrap_or(0),
                    text: cluster_text,
                    advance: pos.x_advance as f32 * scale,
                    x_offset: pos.x_offset as f32 * scale,
                }
            })
            .collect()
    }

    fn shape_unshaped(&self, text: &str) -> Vec<ShapedGlyph> {
        text.chars()
            .map(|ch| {
                let gid = self.cmap.get(&(ch as u32)).copied().unwrap_or(0);
                ShapedGlyph {
                    gid,
                    text: ch.to_string(),
                    advance: self.advance(gid),
                    x_offset: 0.0,
                }
            })
            .collect()
    }

    /// Width of `text` in points at `size`.
    ///
    /// Shaping opens the face each time, so shaped widths are cached per
    /// string; layout measures the same words over and over.
    pub fn measure(&self, text: &str, size: f64) -> f64 {
        let cached = self.widths.lock().ok().and_then(|cache| cache.get(text));
        let units = match cached {
            Some(units) => units,
            None => {
                let units: f32 = self.shape(text).iter().map(|g| g.advance).sum();
                if let Ok(mut cache) = self.widths.lock() {
                    cache.insert(text, units);
                }
                units
            }
        };
        units as f64 * size / 1000.0
    }
}

/// Load TTF/OTF font bytes from file path, validating them with ttf-parser
pub fn load_font_file(path: &Path) -> RenderResult<Vec<u8>> {
    if !path.exists() {
        return Err(RenderError::Font(format!(
            "Font file not found: {}",
            path.display()
        )));
    }

    let font_data = std::fs::read(path)?;
    Face::parse(&font_data, 0).map_err(|e| {
        RenderError::Font(format!("Invalid font file {}: {}", path.display(), e))
    })?;

    Ok(font_data)
}

/// Find an `assets/fonts` directory, searching upwards (at most ten levels)
/// from the current working directory and from the executable's directory.
pub fn find_assets_font_dir() -> Option<PathBuf> {
    let roots = [
        std::env::current_dir().ok(),
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf)),
    ];

    for root in roots.into_iter().flatten() {
        for dir in root.ancestors().take(10) {
            let candidate = dir.join("assets").join("fonts");
            if candidate.is_dir() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Glyph usage collected while drawing, keyed by glyph id.
#[derive(Debug, Clone, Default)]
pub struct GlyphUsage {
    glyphs: BTreeMap<u16, String>,
}

impl GlyphUsage {
    pub fn record(&mut self, glyph: &ShapedGlyph) {
        let entry = self.glyphs.entry(glyph.gid).or_default();
        if entry.is_empty() && !glyph.text.is_empty() {
            *entry = glyph.text.clone();
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }
}

fn compress(data: &[u8]) -> RenderResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Add TrueType font to PDF as Type0 font (CIDFontType2)
///
/// Creates full Type0 font structure: FontDescriptor, CIDFont with `/W`
/// widths for the used glyphs, Type0 font, and a ToUnicode CMap. Glyph ids
/// are used directly as CIDs (Identity-H with an Identity CIDToGIDMap).
pub fn add_truetype_font(
    pdf: &mut Pdf,
    font: &EmbeddedFont,
    font_id: Ref,
    next_ref_id: &mut i32,
    usage: &GlyphUsage,
) -> RenderResult<()> {
    let mut next_ref = || {
        let r = Ref::new(*next_ref_id);
        *next_ref_id += 1;
        r
    };
    let font_descriptor_id = next_ref();
    let cid_font_id = next_ref();
    let font_file_id = next_ref();
    let to_unicode_id = next_ref();

    let scale = font.scale();
    let base_font_name = Name(font.postscript_name.as_bytes());

    let compressed = font.compressed_data()?;
    pdf.stream(font_file_id, compressed)
        .filter(Filter::FlateDecode)
        .pair(Name(b"Length1"), font.data().len() as i32);

    pdf.font_descriptor(font_descriptor_id)
        .name(base_font_name)
        .flags(FontFlags::SYMBOLIC)
        .bbox(Rect::new(
            font.bbox[0] as f32 * scale,
            font.bbox[1] as f32 * scale,
            font.bbox[2] as f32 * scale,
            font.bbox[3] as f32 * scale,
        ))
        .italic_angle(0.0)
        .ascent(font.ascender as f32 * scale)
        .descent(font.descender as f32 * scale)
        .cap_height(font.cap_height as f32 * scale)
        .stem_v(if font.bold { 120.0 } else { 80.0 })
        .font_file2(font_file_id);

    {
        let mut cid_font = pdf.cid_font(cid_font_id);
        cid_font
            .subtype(CidFontType::Type2)
            .base_font(base_font_name)
            .system_info(SystemInfo {
                registry: Str(b"Adobe"),
                ordering: Str(b"Identity"),
                supplement: 0,
            })
            .font_descriptor(font_descriptor_id)
            .default_width(DEFAULT_WIDTH)
            .cid_to_gid_map_predefined(Name(b"Identity"));

        let mut widths_writer = cid_font.widths();
        let mut gid_iter = usage.glyphs.keys().copied().peekable();
        while let Some(start) = gid_iter.next() {
            let mut widths = vec![font.advance(start)];
            let mut last = start;
            while let Some(next) = gid_iter.peek().copied() {
                if next != last + 1 {
                    break;
                }
                widths.push(font.advance(next));
                last = next;
                gid_iter.next();
            }
            widths_writer.consecutive(start, widths);
        }
    }

    pdf.type0_font(font_id)
        .base_font(base_font_name)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_id)
        .to_unicode(to_unicode_id);

    let cmap = to_unicode_cmap(usage);
    pdf.stream(to_unicode_id, cmap.as_bytes());

    log::debug!(
        "embedded {} ({} glyphs used) as font object {}",
        font.family,
        usage.len(),
        font_id.get()
    );
    Ok(())
}

/// Build the ToUnicode CMap mapping CIDs (glyph ids) back to text.
/// Uses beginbfchar blocks (max 100 entries per block).
fn to_unicode_cmap(usage: &GlyphUsage) -> String {
    let pairs: Vec<(u16, String)> = usage
        .glyphs
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(gid, text)| {
            let utf16: String = text.encode_utf16().map(|u| format!("{:04X}", u)).collect();
            (*gid, utf16)
        })
        .collect();

    let mut sections = String::new();
    for chunk in pairs.chunks(100) {
        sections.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, utf16) in chunk {
            sections.push_str(&format!("<{:04X}> <{}>\n", gid, utf16));
        }
        sections.push_str("endbfchar\n");
    }

    format!(
        "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
   /Ordering (UCS)
   /Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
{}endcmap
CMapName currentdict /CMap defineresource pop
end
end",
        sections
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_bytes_are_rejected() {
        let err = EmbeddedFont::from_bytes(b"definitely not a font".to_vec()).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn test_missing_font_file() {
        let err = load_font_file(Path::new("/nonexistent/NotoSansTelugu-Regular.ttf")).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn test_to_unicode_cmap_skips_unmapped_glyphs() {
        let mut usage = GlyphUsage::default();
        for (gid, text) in [(36, "A"), (37, ""), (512, "క్ష")] {
            usage.record(&ShapedGlyph {
                gid,
                text: text.to_string(),
                advance: 500.0,
                x_offset: 0.0,
            });
        }
        let cmap = to_unicode_cmap(&usage);
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<0200> <0C150C4D0C37>"));
        assert!(!cmap.contains("<0025>"));
    }

    #[test]
    fn test_width_cache_evicts_oldest() {
        let mut cache = WidthCache::new(2);
        cache.insert("road", 1900.0);
        cache.insert("pothole", 3300.0);
        cache.insert("road", 0.0);
        assert_eq!(cache.get("road"), Some(1900.0));
        cache.insert("drain", 2500.0);
        assert_eq!(cache.get("road"), None);
        assert_eq!(cache.get("pothole"), Some(3300.0));
        assert_eq!(cache.map.len(), cache.order.len());
    }

    #[test]
    fn test_bundled_font_measure_is_cached() {
        let font = EmbeddedFont::from_bytes(
            include_bytes!("../../assets/fonts/DejaVuSans.ttf").to_vec(),
        )
        .unwrap();
        let first = font.measure("Łódź road", 12.0);
        let again = font.measure("Łódź road", 12.0);
        assert!(first > 0.0);
        assert_eq!(first, again);
        assert_eq!(font.measure("Łódź road", 24.0), first * 2.0);
        assert_eq!(font.widths.lock().unwrap().map.len(), 1);
    }

    #[test]
    fn test_first_cluster_text_wins() {
        let mut usage = GlyphUsage::default();
        let glyph = |text: &str| ShapedGlyph {
            gid: 7,
            text: text.to_string(),
            advance: 0.0,
            x_offset: 0.0,
        };
        usage.record(&glyph(""));
        usage.record(&glyph("x"));
        usage.record(&glyph("y"));
        assert_eq!(usage.glyphs.get(&7).map(String::as_str), Some("x"));
    }
}
