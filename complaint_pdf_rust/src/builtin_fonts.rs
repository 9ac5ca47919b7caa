//! Standard Type1 fonts used as the zero-I/O baseline
//!
//! Every PDF viewer ships Helvetica, so these fonts are never embedded.
//! Text is written in WinAnsiEncoding and measured with the AFM advance
//! widths below.

use pdf_writer::{Name, Pdf, Ref};

use crate::unicode_utils::unicode_to_winansi;

/// AFM widths for WinAnsi 0x20..=0x7E, Helvetica.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // : ; < = > ? @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [ \ ] ^ _ `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // { | } ~
];

/// AFM widths for WinAnsi 0x20..=0x7E, Helvetica-Bold.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    333, 333, 584, 584, 584, 611, 975, // : ; < = > ? @
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [ \ ] ^ _ `
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // { | } ~
];

/// One of the standard-14 fonts this crate writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    pub fn family(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, BuiltinFont::HelveticaBold)
    }

    /// Ascent in 1000-unit em space.
    pub fn ascent(&self) -> f64 {
        718.0
    }

    /// Advance width of one encoded byte, in 1000-unit em space.
    pub fn byte_width(&self, byte: u8) -> u16 {
        let table = match self {
            BuiltinFont::Helvetica => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        match byte {
            0x20..=0x7E => table[(byte - 0x20) as usize],
            0xA0 => 278,
            0x95 => 350,
            0x96 => 556,
            0x97 => 1000,
            _ if self.is_bold() => 611,
            _ => 556,
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        unicode_to_winansi(text)
    }

    /// Width of encoded bytes in points at `size`.
    pub fn measure_bytes(&self, bytes: &[u8], size: f64) -> f64 {
        let units: u32 = bytes.iter().map(|b| self.byte_width(*b) as u32).sum();
        units as f64 * size / 1000.0
    }

    pub fn measure(&self, text: &str, size: f64) -> f64 {
        self.measure_bytes(&self.encode(text), size)
    }

    /// Write the font dictionary.
    pub fn write(&self, pdf: &mut Pdf, id: Ref) {
        pdf.type1_font(id)
            .base_font(Name(self.family().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }
}
