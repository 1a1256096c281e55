use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::lexicon::Lexicon;
use crate::model::{Paragraph, StructuredDocument};
use crate::normalize::{normalize_heading, strip_enumeration, trim_markup, word_count};

/// Returned as the sole candidate when every detection path comes up empty.
pub const UNDETERMINED_SECTIONS: &str = "Sections could not be determined";

const STYLE_MARKERS: [&str; 3] = ["heading", "title", "header"];

const MIN_HEADING_CHARS: usize = 2;
const MAX_HEADING_CHARS: usize = 150;
const MIN_CASCADE_HEADINGS: usize = 3;
const FALLBACK_SCAN_PARAGRAPHS: usize = 20;
const FALLBACK_MAX_EXTRA: usize = 5;
const FALLBACK_MAX_WORDS: usize = 10;
const BOLD_MAX_WORDS: usize = 8;
const VERBATIM_PARAGRAPHS: usize = 10;

#[derive(Debug)]
pub struct HeadingExtractor<'a> {
    lexicon: &'a Lexicon,
    numbered: Regex,
    roman: Regex,
    sub_numbered: Regex,
}

impl<'a> HeadingExtractor<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Result<Self> {
        Ok(Self {
            lexicon,
            numbered: Regex::new(r"^\d+[.)]\s+\S")
                .context("failed to compile numbered heading regex")?,
            roman: Regex::new(r"^[IVX]+[.)]\s+\S")
                .context("failed to compile roman heading regex")?,
            sub_numbered: Regex::new(r"^\d+\.\d+(?:\.\d+)*\s+\S")
                .context("failed to compile sub-numbered heading regex")?,
        })
    }

    /// Deduplicated heading candidates in document order. Never returns an
    /// empty sequence: the fallback ladder ends in a sentinel entry.
    pub fn extract(&self, document: &StructuredDocument) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut headings = Vec::new();

        for paragraph in &document.paragraphs {
            let text = paragraph.text.trim();
            if text.is_empty() {
                continue;
            }

            let Some(signal) = self.classify(paragraph, text) else {
                continue;
            };

            let cleaned = clean_heading(text);
            let chars = cleaned.chars().count();
            if chars < MIN_HEADING_CHARS || chars > MAX_HEADING_CHARS {
                continue;
            }
            if !seen.insert(cleaned.clone()) {
                continue;
            }

            debug!(signal, heading = %cleaned, "heading candidate");
            headings.push(cleaned);
        }

        if headings.is_empty() {
            return self.verbatim_fallback(document);
        }
        if headings.len() < MIN_CASCADE_HEADINGS {
            self.append_short_paragraphs(document, &mut seen, &mut headings);
        }

        headings
    }

    /// Detection cascade; first signal wins.
    fn classify(&self, paragraph: &Paragraph, text: &str) -> Option<&'static str> {
        if style_signal(paragraph) {
            return Some("style");
        }
        if self.pattern_signal(text) {
            return Some("pattern");
        }
        if formatting_signal(paragraph, text) {
            return Some("formatting");
        }
        if self.keyword_signal(text) {
            return Some("keyword");
        }
        None
    }

    fn pattern_signal(&self, text: &str) -> bool {
        self.numbered.is_match(text)
            || self.roman.is_match(text)
            || self.sub_numbered.is_match(text)
            || is_all_caps(text)
    }

    fn keyword_signal(&self, text: &str) -> bool {
        self.lexicon
            .keyword_category(&normalize_heading(text))
            .is_some()
    }

    /// Short, non-sentence paragraphs near the top of the document stand in
    /// for headings when the cascade found too few.
    fn append_short_paragraphs(
        &self,
        document: &StructuredDocument,
        seen: &mut HashSet<String>,
        headings: &mut Vec<String>,
    ) {
        let mut appended = 0;

        for paragraph in document.paragraphs.iter().take(FALLBACK_SCAN_PARAGRAPHS) {
            if appended >= FALLBACK_MAX_EXTRA {
                break;
            }

            let text = paragraph.text.trim();
            if text.is_empty()
                || text.chars().count() >= MAX_HEADING_CHARS
                || text.ends_with('.')
                || word_count(text) > FALLBACK_MAX_WORDS
            {
                continue;
            }

            let cleaned = clean_heading(text);
            if cleaned.chars().count() < MIN_HEADING_CHARS || !seen.insert(cleaned.clone()) {
                continue;
            }

            debug!(heading = %cleaned, "short-paragraph fallback candidate");
            headings.push(cleaned);
            appended += 1;
        }
    }

    fn verbatim_fallback(&self, document: &StructuredDocument) -> Vec<String> {
        let verbatim: Vec<String> = document
            .paragraphs
            .iter()
            .map(|paragraph| paragraph.text.trim())
            .filter(|text| !text.is_empty())
            .take(VERBATIM_PARAGRAPHS)
            .map(ToOwned::to_owned)
            .collect();

        if verbatim.is_empty() {
            debug!("no usable paragraphs, returning sentinel");
            return vec![UNDETERMINED_SECTIONS.to_string()];
        }

        debug!(count = verbatim.len(), "verbatim paragraph fallback");
        verbatim
    }
}

fn style_signal(paragraph: &Paragraph) -> bool {
    let Some(style) = paragraph.style.as_deref() else {
        return false;
    };
    let lowered = style.to_lowercase();
    STYLE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn formatting_signal(paragraph: &Paragraph, text: &str) -> bool {
    paragraph.runs.first().is_some_and(|run| run.bold) && word_count(text) < BOLD_MAX_WORDS
}

fn is_all_caps(text: &str) -> bool {
    let mut letters = 0;
    for ch in text.chars().filter(|c| c.is_alphabetic()) {
        if ch.is_lowercase() {
            return false;
        }
        letters += 1;
    }
    letters >= 4
}

fn clean_heading(text: &str) -> String {
    trim_markup(strip_enumeration(trim_markup(text))).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormattedRun;

    fn para(text: &str) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            style: None,
            runs: Vec::new(),
        }
    }

    fn styled(text: &str, style: &str) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            style: Some(style.to_string()),
            runs: Vec::new(),
        }
    }

    fn bold(text: &str) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            style: None,
            runs: vec![FormattedRun {
                text: text.to_string(),
                bold: true,
            }],
        }
    }

    fn doc(paragraphs: Vec<Paragraph>) -> StructuredDocument {
        StructuredDocument { paragraphs }
    }

    fn extractor(lexicon: &Lexicon) -> HeadingExtractor<'_> {
        HeadingExtractor::new(lexicon).expect("extractor")
    }

    #[test]
    fn style_label_marks_a_heading() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![
            styled("Project Overview", "Heading 1"),
            styled("Front matter", "Title"),
            styled("Plain prose paragraph that runs on and on.", "Normal"),
        ]);

        let headings = extractor(&lexicon).extract(&document);
        assert_eq!(headings, vec!["Project Overview", "Front matter"]);
    }

    #[test]
    fn pattern_signals_cover_numbered_roman_subnumbered_and_caps() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![
            para("1. Device calibration"),
            para("IV) Error analysis"),
            para("2.3 Measurement series"),
            para("RELATED WORK"),
            para("IP networks at a glance were discussed at length previously."),
        ]);

        let headings = extractor(&lexicon).extract(&document);
        assert_eq!(
            headings,
            vec![
                "Device calibration",
                "Error analysis",
                "Measurement series",
                "RELATED WORK"
            ]
        );
    }

    #[test]
    fn bold_first_run_marks_short_paragraphs_only() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![
            bold("Device under test"),
            bold("This bold paragraph has far too many words to pass for a heading."),
            para("Plain filler line that trails off here."),
        ]);

        let headings = extractor(&lexicon).extract(&document);
        assert_eq!(headings, vec!["Device under test"]);
    }

    #[test]
    fn keyword_signal_catches_unstyled_section_names() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![
            para("Purpose of work"),
            para("List of sources used"),
            para("Nothing of note happened here today at all, really."),
        ]);

        let headings = extractor(&lexicon).extract(&document);
        assert_eq!(headings, vec!["Purpose of work", "List of sources used"]);
    }

    #[test]
    fn cleanup_strips_enumeration_and_markup_and_rejects_tiny_results() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![
            styled("**2) Theory**", "Heading 2"),
            styled("3.", "Heading 2"),
        ]);

        let headings = extractor(&lexicon).extract(&document);
        assert_eq!(headings.first().map(String::as_str), Some("Theory"));
        assert!(!headings.contains(&String::new()));
    }

    #[test]
    fn repeated_heading_text_is_collected_once() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![
            styled("Theory", "Heading 1"),
            styled("Theory", "Heading 1"),
            para("1. Theory"),
        ]);

        let headings = extractor(&lexicon).extract(&document);
        assert_eq!(headings.iter().filter(|h| h.as_str() == "Theory").count(), 1);
    }

    #[test]
    fn sparse_cascade_appends_short_paragraphs_from_document_head() {
        let lexicon = Lexicon::builtin();
        let mut paragraphs = vec![styled("Project Overview", "Heading 1")];
        for index in 0..10 {
            paragraphs.push(para(&format!(
                "This is filler sentence number {index} that keeps going on."
            )));
        }
        paragraphs.push(para("Lab notes"));
        paragraphs.push(para("Device setup"));
        paragraphs.push(styled("Closing Notes", "Heading 1"));
        for index in 10..20 {
            paragraphs.push(para(&format!(
                "This is filler sentence number {index} that keeps going on."
            )));
        }
        paragraphs.push(para("Stray line past the scan window"));

        let headings = extractor(&lexicon).extract(&doc(paragraphs));
        assert_eq!(
            headings,
            vec!["Project Overview", "Closing Notes", "Lab notes", "Device setup"]
        );
        assert!(headings.len() <= 7);
    }

    #[test]
    fn zero_cascade_headings_fall_back_to_first_ten_paragraphs_verbatim() {
        let lexicon = Lexicon::builtin();
        let paragraphs: Vec<Paragraph> = (0..15)
            .map(|index| {
                para(&format!(
                    "This is filler sentence number {index} that keeps going on."
                ))
            })
            .collect();

        let headings = extractor(&lexicon).extract(&doc(paragraphs));
        assert_eq!(headings.len(), 10);
        assert_eq!(
            headings[0],
            "This is filler sentence number 0 that keeps going on."
        );
    }

    #[test]
    fn empty_document_yields_the_sentinel() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![para("   "), para("")]);

        let headings = extractor(&lexicon).extract(&document);
        assert_eq!(headings, vec![UNDETERMINED_SECTIONS.to_string()]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let lexicon = Lexicon::builtin();
        let document = doc(vec![
            styled("Project Overview", "Heading 1"),
            para("1. Device calibration"),
            bold("Current readings"),
            para("A plain paragraph closing out the page as prose does."),
        ]);

        let once = extractor(&lexicon).extract(&document);
        let twice = extractor(&lexicon).extract(&document);
        assert_eq!(once, twice);
    }
}
