//! Supported complaint languages and the scripts they are written in

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Target language of a complaint letter.
///
/// Parsing never fails: unknown or missing tags become [`Language::English`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Language {
    English,
    Telugu,
    Hindi,
    Tamil,
    Kannada,
    Malayalam,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Telugu,
        Language::Hindi,
        Language::Tamil,
        Language::Kannada,
        Language::Malayalam,
    ];

    /// Parse a BCP-47-ish tag (`te`, `TE`, `te-IN`, `hi_IN`).
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "te" => Language::Telugu,
            "hi" => Language::Hindi,
            "ta" => Language::Tamil,
            "kn" => Language::Kannada,
            "ml" => Language::Malayalam,
            _ => Language::English,
        }
    }

    pub fn from_tag_opt(tag: Option<&str>) -> Self {
        tag.map(Self::from_tag).unwrap_or_default()
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Telugu => "te",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
        }
    }

    /// English name, used in prompts sent to the generative service.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Telugu => "Telugu",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Kannada => "Kannada",
            Language::Malayalam => "Malayalam",
        }
    }

    pub fn is_latin(&self) -> bool {
        matches!(self, Language::English)
    }

    /// Unicode block of the language's script. `None` for Latin.
    pub fn script_range(&self) -> Option<RangeInclusive<u32>> {
        match self {
            Language::English => None,
            Language::Hindi => Some(0x0900..=0x097F),
            Language::Tamil => Some(0x0B80..=0x0BFF),
            Language::Telugu => Some(0x0C00..=0x0C7F),
            Language::Kannada => Some(0x0C80..=0x0CFF),
            Language::Malayalam => Some(0x0D00..=0x0D7F),
        }
    }

    /// A letter every font for this script must contain.
    pub fn sample_char(&self) -> char {
        match self {
            Language::English => 'A',
            Language::Telugu => '\u{0C05}',
            Language::Hindi => '\u{0915}',
            Language::Tamil => '\u{0BA4}',
            Language::Kannada => '\u{0C95}',
            Language::Malayalam => '\u{0D15}',
        }
    }

    /// File stem of the bundled font family (`<stem>-Regular.ttf`).
    pub fn font_stem(&self) -> &'static str {
        match self {
            Language::English => "NotoSans",
            Language::Telugu => "NotoSansTelugu",
            Language::Hindi => "NotoSansDevanagari",
            Language::Tamil => "NotoSansTamil",
            Language::Kannada => "NotoSansKannada",
            Language::Malayalam => "NotoSansMalayalam",
        }
    }

    /// Language whose script block contains `ch`, if any.
    pub fn for_char(ch: char) -> Option<Language> {
        let cp = ch as u32;
        Language::ALL
            .into_iter()
            .find(|lang| lang.script_range().is_some_and(|r| r.contains(&cp)))
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Language::from_tag(s))
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        Language::from_tag(&tag)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.tag().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_tag(lang.tag()), lang);
        }
    }

    #[test]
    fn test_unknown_tags_fall_back_to_english() {
        assert_eq!(Language::from_tag("fr"), Language::English);
        assert_eq!(Language::from_tag(""), Language::English);
        assert_eq!(Language::from_tag_opt(None), Language::English);
    }

    #[test]
    fn test_region_subtags_and_case() {
        assert_eq!(Language::from_tag("te-IN"), Language::Telugu);
        assert_eq!(Language::from_tag(" HI_in "), Language::Hindi);
    }

    #[test]
    fn test_script_lookup() {
        assert_eq!(Language::for_char('అ'), Some(Language::Telugu));
        assert_eq!(Language::for_char('क'), Some(Language::Hindi));
        assert_eq!(Language::for_char('ക'), Some(Language::Malayalam));
        assert_eq!(Language::for_char('a'), None);
        for lang in Language::ALL.into_iter().filter(|l| !l.is_latin()) {
            assert_eq!(Language::for_char(lang.sample_char()), Some(lang));
        }
    }

    #[test]
    fn test_serde_is_lenient() {
        let lang: Language = serde_json::from_str("\"kn\"").unwrap();
        assert_eq!(lang, Language::Kannada);
        let lang: Language = serde_json::from_str("\"klingon\"").unwrap();
        assert_eq!(lang, Language::English);
    }
}
