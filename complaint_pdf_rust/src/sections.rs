//! Section extraction from complaint text
//!
//! Complaint letters produced by the generative service usually carry
//! English labels (`Subject:`, `Description:` ...) at the start of a line.
//! Labels are matched case-insensitively and only at the very start of a
//! line; a trailing `:` or full-width `：` is optional. `Impact` may also be
//! written `Impact/Urgency`, the header it is printed under. The same English
//! labels are used whatever the letter's language, so translated letters
//! normally come back unstructured.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(subject|salutation|description|location|impact(?:[ \t]*/[ \t]*urgency)?|requested[ \t]+action|closing|signature)\b[ \t]*[:：]?",
    )
    .expect("section label pattern is valid")
});

/// Known section labels. The derived ordering is the canonical render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionLabel {
    Subject,
    Salutation,
    Description,
    Location,
    Impact,
    RequestedAction,
    Closing,
    Signature,
}

impl SectionLabel {
    pub const CANONICAL_ORDER: [SectionLabel; 8] = [
        SectionLabel::Subject,
        SectionLabel::Salutation,
        SectionLabel::Description,
        SectionLabel::Location,
        SectionLabel::Impact,
        SectionLabel::RequestedAction,
        SectionLabel::Closing,
        SectionLabel::Signature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SectionLabel::Subject => "Subject",
            SectionLabel::Salutation => "Salutation",
            SectionLabel::Description => "Description",
            SectionLabel::Location => "Location",
            SectionLabel::Impact => "Impact",
            SectionLabel::RequestedAction => "Requested Action",
            SectionLabel::Closing => "Closing",
            SectionLabel::Signature => "Signature",
        }
    }

    /// Header printed above the section, `None` for prose-only sections.
    pub fn header(&self) -> Option<&'static str> {
        match self {
            SectionLabel::Subject => Some("Subject:"),
            SectionLabel::Description => Some("Description:"),
            SectionLabel::Location => Some("Location:"),
            SectionLabel::Impact => Some("Impact/Urgency:"),
            SectionLabel::RequestedAction => Some("Requested Action:"),
            SectionLabel::Salutation | SectionLabel::Closing | SectionLabel::Signature => None,
        }
    }

    /// Label for a matched token. `Impact/Urgency` is keyed by its first half.
    fn from_token(token: &str) -> Option<Self> {
        let head = token.split('/').next().unwrap_or(token);
        let normalized = head.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        SectionLabel::CANONICAL_ORDER
            .into_iter()
            .find(|label| label.name().to_lowercase() == normalized)
    }
}

/// A `(label, content)` pair extracted from complaint text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: SectionLabel,
    pub content: String,
}

/// Result of [`parse_sections`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedComplaint {
    preamble: Option<String>,
    sections: BTreeMap<SectionLabel, String>,
}

impl ParsedComplaint {
    /// True when at least one label matched, even if its content is empty.
    pub fn is_structured(&self) -> bool {
        !self.sections.is_empty()
    }

    /// Text found before the first label.
    pub fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref()
    }

    pub fn get(&self, label: SectionLabel) -> Option<&str> {
        self.sections.get(&label).map(String::as_str)
    }

    /// Non-empty sections in canonical order.
    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.sections
            .iter()
            .filter(|(_, content)| !content.is_empty())
            .map(|(label, content)| Section {
                label: *label,
                content: content.clone(),
            })
    }
}

/// Split complaint text into labelled sections.
///
/// A label occurring several times keeps every occurrence: the contents
/// are joined with newlines in source order.
pub fn parse_sections(text: &str) -> ParsedComplaint {
    let mut preamble: Vec<&str> = Vec::new();
    let mut sections: BTreeMap<SectionLabel, String> = BTreeMap::new();
    let mut current: Option<(SectionLabel, Vec<String>)> = None;

    let flush = |current: Option<(SectionLabel, Vec<String>)>,
                 sections: &mut BTreeMap<SectionLabel, String>| {
        if let Some((label, lines)) = current {
            let content = lines.join("\n").trim().to_string();
            let entry = sections.entry(label).or_default();
            if !content.is_empty() {
                if !entry.is_empty() {
                    entry.push('\n');
                }
                entry.push_str(&content);
            }
        }
    };

    for line in text.lines() {
        let label = LABEL_RE
            .captures(line)
            .and_then(|caps| {
                let whole = caps.get(0)?;
                let label = SectionLabel::from_token(caps.get(1)?.as_str())?;
                Some((label, &line[whole.end()..]))
            });

        match label {
            Some((label, rest)) => {
                flush(current.take(), &mut sections);
                current = Some((label, vec![rest.trim().to_string()]));
            }
            None => match current.as_mut() {
                Some((_, lines)) => lines.push(line.trim().to_string()),
                None => preamble.push(line),
            },
        }
    }
    flush(current.take(), &mut sections);

    let preamble = preamble.join("\n").trim().to_string();
    ParsedComplaint {
        preamble: (!preamble.is_empty()).then_some(preamble),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sections() {
        let parsed = parse_sections(
            "Subject: Pothole on Main St\nDescription: Large pothole causing traffic hazard.",
        );
        assert!(parsed.is_structured());
        assert_eq!(parsed.get(SectionLabel::Subject), Some("Pothole on Main St"));
        assert_eq!(
            parsed.get(SectionLabel::Description),
            Some("Large pothole causing traffic hazard.")
        );
        assert_eq!(parsed.preamble(), None);
    }

    #[test]
    fn test_case_insensitive_and_fullwidth_colon() {
        let parsed = parse_sections("SUBJECT：Broken pole\nrequested action - replace it");
        assert_eq!(parsed.get(SectionLabel::Subject), Some("Broken pole"));
        assert_eq!(parsed.get(SectionLabel::RequestedAction), Some("- replace it"));
    }

    #[test]
    fn test_impact_urgency_label() {
        let parsed = parse_sections("Subject: Pothole\nImpact/Urgency: Two-wheelers have fallen");
        assert_eq!(parsed.get(SectionLabel::Impact), Some("Two-wheelers have fallen"));

        let spaced = parse_sections("impact / URGENCY： High\nImpact: Schools nearby");
        assert_eq!(spaced.get(SectionLabel::Impact), Some("High\nSchools nearby"));

        // not the urgency suffix, so only `Impact` is the label
        let other = parse_sections("Impact/Urgent: soon");
        assert_eq!(other.get(SectionLabel::Impact), Some("/Urgent: soon"));
    }

    #[test]
    fn test_continuation_lines_append_to_current_section() {
        let parsed = parse_sections("Description: Line one\n  line two  \nLocation: Ward 4");
        assert_eq!(parsed.get(SectionLabel::Description), Some("Line one\nline two"));
        assert_eq!(parsed.get(SectionLabel::Location), Some("Ward 4"));
    }

    #[test]
    fn test_mid_line_labels_do_not_split() {
        let parsed = parse_sections("Description: see the Subject: above\nThe Location: here");
        assert_eq!(
            parsed.get(SectionLabel::Description),
            Some("see the Subject: above\nThe Location: here")
        );
        assert_eq!(parsed.get(SectionLabel::Subject), None);
        assert_eq!(parsed.get(SectionLabel::Location), None);
    }

    #[test]
    fn test_label_needs_word_boundary() {
        let parsed = parse_sections("Subjects of concern are many.");
        assert!(!parsed.is_structured());
        assert_eq!(parsed.preamble(), Some("Subjects of concern are many."));
    }

    #[test]
    fn test_indented_label_is_not_a_label() {
        let parsed = parse_sections("  Subject: indented");
        assert!(!parsed.is_structured());
    }

    #[test]
    fn test_repeated_labels_concatenate_in_source_order() {
        let parsed = parse_sections(
            "Description: first part\nLocation: Main St\nDescription: second part",
        );
        assert_eq!(
            parsed.get(SectionLabel::Description),
            Some("first part\nsecond part")
        );
    }

    #[test]
    fn test_sections_iterate_in_canonical_order() {
        let parsed = parse_sections(
            "Signature: Ravi\nClosing: Regards\nImpact: Accidents\nSubject: Pothole",
        );
        let order: Vec<_> = parsed.sections().map(|s| s.label).collect();
        assert_eq!(
            order,
            vec![
                SectionLabel::Subject,
                SectionLabel::Impact,
                SectionLabel::Closing,
                SectionLabel::Signature
            ]
        );
    }

    #[test]
    fn test_empty_sections_are_structured_but_skipped() {
        let parsed = parse_sections("Closing:\nSubject: Garbage pile");
        assert!(parsed.is_structured());
        let labels: Vec<_> = parsed.sections().map(|s| s.label).collect();
        assert_eq!(labels, vec![SectionLabel::Subject]);
    }

    #[test]
    fn test_preamble_before_first_label() {
        let parsed = parse_sections("To the Commissioner,\n\nSubject: Streetlight out");
        assert_eq!(parsed.preamble(), Some("To the Commissioner,"));
        assert_eq!(parsed.get(SectionLabel::Subject), Some("Streetlight out"));
    }

    #[test]
    fn test_unstructured_text() {
        let parsed = parse_sections("Just a plain note with no labels.");
        assert!(!parsed.is_structured());
        assert_eq!(parsed.sections().count(), 0);
    }

    #[test]
    fn test_translated_text_stays_unstructured() {
        let parsed = parse_sections("విషయం: రోడ్డుపై గుంత\nవివరణ: ప్రమాదకరం");
        assert!(!parsed.is_structured());
    }
}
