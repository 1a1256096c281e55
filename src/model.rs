use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub runs: Vec<FormattedRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Containment,
    Synonym,
    Model,
}

impl MatchMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Containment => "containment",
            Self::Synonym => "synonym",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStatus {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "satisfactory")]
    Satisfactory,
    #[serde(rename = "needs revision")]
    NeedsRevision,
}

impl MatchStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Satisfactory
        } else {
            Self::NeedsRevision
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Satisfactory => "satisfactory",
            Self::NeedsRevision => "needs revision",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionMatch {
    pub required: String,
    pub matched_text: String,
    pub method: MatchMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpellingCorrection {
    pub wrong: String,
    pub correct: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub matched: Vec<SectionMatch>,
    pub missing: Vec<String>,
    pub score: f64,
    pub status: MatchStatus,
    pub tally: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub synonym_notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spelling_corrections: Option<Vec<SpellingCorrection>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub path: String,
    pub sha256: String,
    pub paragraph_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub requested: bool,
    pub available: bool,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub report_version: u32,
    pub generated_at: String,
    pub document: DocumentInfo,
    pub template: TemplateInfo,
    pub candidates: Vec<String>,
    pub result: MatchResult,
    pub model_service: ServiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bucket_boundaries_are_inclusive_lower_bounds() {
        assert_eq!(MatchStatus::from_score(100.0), MatchStatus::Excellent);
        assert_eq!(MatchStatus::from_score(80.0), MatchStatus::Excellent);
        assert_eq!(MatchStatus::from_score(79.9), MatchStatus::Good);
        assert_eq!(MatchStatus::from_score(60.0), MatchStatus::Good);
        assert_eq!(MatchStatus::from_score(59.9), MatchStatus::Satisfactory);
        assert_eq!(MatchStatus::from_score(40.0), MatchStatus::Satisfactory);
        assert_eq!(MatchStatus::from_score(39.9), MatchStatus::NeedsRevision);
        assert_eq!(MatchStatus::from_score(0.0), MatchStatus::NeedsRevision);
    }

    #[test]
    fn status_serializes_with_spaces() {
        let rendered = serde_json::to_string(&MatchStatus::NeedsRevision).expect("serialize");
        assert_eq!(rendered, "\"needs revision\"");
    }

    #[test]
    fn paragraph_deserializes_without_style_or_runs() {
        let paragraph: Paragraph =
            serde_json::from_str(r#"{"text": "Introduction"}"#).expect("parse");
        assert_eq!(paragraph.text, "Introduction");
        assert!(paragraph.style.is_none());
        assert!(paragraph.runs.is_empty());
    }
}
