//! Unicode utilities for PDF text rendering
//!
//! Provides conversion from Unicode (UTF-8) to WinAnsiEncoding for the
//! built-in Type1 fonts, plus script detection used to pick a
//! script-specific font for text whose language tag says otherwise.

use crate::language::Language;

/// Map a character to its WinAnsiEncoding (CP1252) byte, if it has one.
pub fn winansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\t' => b' ',
        ch if (ch as u32) >= 0x20 && (ch as u32) <= 0x7E => ch as u8,
        // 0xA0..=0xFF is identical to Latin-1
        ch if (ch as u32) >= 0xA0 && (ch as u32) <= 0xFF => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Convert Unicode string to WinAnsiEncoding bytes for PDF text rendering
///
/// Characters not in WinAnsiEncoding are replaced with '?'. Zero-width
/// joiners and other format characters are dropped.
pub fn unicode_to_winansi(text: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match winansi_byte(ch) {
            Some(byte) => result.push(byte),
            None if is_invisible(ch) => {}
            None => result.push(b'?'),
        }
    }
    result
}

/// Characters that never produce a glyph on their own.
pub fn is_invisible(ch: char) -> bool {
    matches!(ch, '\u{200B}'..='\u{200F}' | '\u{FEFF}' | '\u{2060}') || ch.is_control()
}

/// Characters that should stay in the font run of their neighbours.
pub fn is_run_neutral(ch: char) -> bool {
    ch.is_whitespace() || is_invisible(ch)
}

/// True if a line must not be broken right before `ch` when it follows
/// `prev`: combining marks, Indic vowel signs and virama-joined consonants
/// belong to the preceding cluster.
pub fn is_cluster_continuation(prev: char, ch: char) -> bool {
    if matches!(ch, '\u{0300}'..='\u{036F}' | '\u{200C}' | '\u{200D}') {
        return true;
    }
    if Language::for_char(ch).is_none() {
        return false;
    }
    let offset = ch as u32 & 0x7F;
    let is_sign = matches!(offset, 0x00..=0x03 | 0x3C | 0x3E..=0x4D | 0x51..=0x57 | 0x62..=0x63);
    let after_virama = Language::for_char(prev).is_some() && (prev as u32 & 0x7F) == 0x4D;
    is_sign || after_virama || prev == '\u{200D}'
}

/// Languages (other than English) whose script appears in `text`, in
/// order of first appearance.
pub fn detect_scripts(text: &str) -> Vec<Language> {
    let mut found = Vec::new();
    for lang in text.chars().filter_map(Language::for_char) {
        if !found.contains(&lang) {
            found.push(lang);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        let text = "Hello World";
        assert_eq!(unicode_to_winansi(text), text.as_bytes());
    }

    #[test]
    fn test_latin1_and_cp1252_specials() {
        assert_eq!(unicode_to_winansi("café"), b"caf\xE9".to_vec());
        assert_eq!(unicode_to_winansi("\u{201C}x\u{201D} – €"), vec![0x93, b'x', 0x94, b' ', 0x96, b' ', 0x80]);
    }

    #[test]
    fn test_unmapped_characters_become_question_marks() {
        // Polish ą and Telugu అ are outside WinAnsi
        assert_eq!(unicode_to_winansi("ą అ"), b"? ?".to_vec());
    }

    #[test]
    fn test_invisible_characters_are_dropped() {
        assert_eq!(unicode_to_winansi("a\u{200D}b\u{FEFF}"), b"ab".to_vec());
    }

    #[test]
    fn test_cluster_continuation() {
        // Telugu ro = ra + vowel sign o
        assert!(is_cluster_continuation('ర', 'ో'));
        // ddu: da + virama + da + vowel sign u
        assert!(is_cluster_continuation('డ', '్'));
        assert!(is_cluster_continuation('్', 'డ'));
        assert!(!is_cluster_continuation('ో', 'డ'));
        assert!(!is_cluster_continuation('a', 'b'));
        assert!(is_cluster_continuation('e', '\u{0301}'));
    }

    #[test]
    fn test_detect_scripts() {
        assert!(detect_scripts("plain English").is_empty());
        assert_eq!(
            detect_scripts("Road రోడ్డు सड़क రో"),
            vec![Language::Telugu, Language::Hindi]
        );
    }
}
