use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Canonical section category -> synonym phrases, lowercased. One merged
/// table; earlier drafts that disagreed were superseded. "results" is
/// listed under practice only, so a bare "Results" heading never
/// satisfies a required Conclusion section.
const SYNONYM_TABLE: &[(&str, &[&str])] = &[
    (
        "title page",
        &[
            "title page",
            "cover page",
            "title sheet",
            "ministry of education",
            "university",
            "department",
            "laboratory report",
        ],
    ),
    (
        "introduction",
        &[
            "introduction",
            "purpose of work",
            "purpose",
            "objective",
            "objectives",
            "aim of the work",
            "assignment",
            "problem statement",
        ],
    ),
    (
        "theory",
        &[
            "theory",
            "theoretical",
            "background",
            "methodology",
            "procedure",
            "calculation",
            "method",
        ],
    ),
    (
        "practice",
        &[
            "practice",
            "practical",
            "experiment",
            "experimental",
            "implementation",
            "results",
            "realization",
            "testing",
        ],
    ),
    (
        "conclusion",
        &[
            "conclusion",
            "conclusions",
            "summary",
            "final remarks",
            "closing remarks",
            "takeaways",
            "deductions",
        ],
    ),
    (
        "references",
        &[
            "references",
            "reference list",
            "bibliography",
            "sources",
            "works cited",
            "list of references",
            "literature",
        ],
    ),
    (
        "table of contents",
        &["table of contents", "contents", "outline", "index", "chapter overview"],
    ),
    (
        "bibliography",
        &[
            "bibliography",
            "references",
            "sources",
            "works cited",
            "reference list",
            "list of used sources",
        ],
    ),
    (
        "main body",
        &["main body", "main part", "body", "core chapters", "main content"],
    ),
];

/// Category keywords used by the extractor's weakest signal: a paragraph
/// whose normalized text contains one of these is taken as a heading.
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    ("introduction", &["introduction", "purpose of work", "objective", "assignment"]),
    ("theory", &["theory", "theoretical", "background", "methodology"]),
    ("practice", &["practice", "practical", "experiment", "implementation"]),
    ("conclusion", &["conclusion", "summary", "findings"]),
    ("references", &["references", "bibliography", "sources", "literature"]),
    ("table of contents", &["contents", "outline"]),
    ("title page", &["title page", "university", "department", "faculty"]),
];

/// Immutable matching configuration, built once at startup and shared by
/// reference across the extractor, comparator and matcher.
#[derive(Debug)]
pub struct Lexicon {
    synonyms: HashMap<&'static str, &'static [&'static str]>,
}

impl Lexicon {
    pub fn builtin() -> Self {
        Self {
            synonyms: SYNONYM_TABLE.iter().copied().collect(),
        }
    }

    /// Case-insensitive exact-key lookup; unknown labels get no synonyms.
    pub fn synonyms_for(&self, label: &str) -> &'static [&'static str] {
        let key = label.trim().to_lowercase();
        self.synonyms.get(key.as_str()).copied().unwrap_or(&[])
    }

    /// First keyword category whose keyword occurs in the normalized text.
    pub fn keyword_category(&self, normalized_text: &str) -> Option<&'static str> {
        if normalized_text.is_empty() {
            return None;
        }

        KEYWORD_TABLE
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| normalized_text.contains(keyword))
            })
            .map(|(category, _)| *category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSet {
    pub templates: Vec<Template>,
}

impl TemplateSet {
    pub fn builtin() -> Self {
        Self {
            templates: vec![
                Template {
                    name: "lab report".to_string(),
                    sections: vec![
                        "Title Page".to_string(),
                        "Introduction".to_string(),
                        "Theory".to_string(),
                        "Practice".to_string(),
                        "Conclusion".to_string(),
                        "References".to_string(),
                    ],
                },
                Template {
                    name: "term paper".to_string(),
                    sections: vec![
                        "Title Page".to_string(),
                        "Table of Contents".to_string(),
                        "Introduction".to_string(),
                        "Main Body".to_string(),
                        "Conclusion".to_string(),
                        "Bibliography".to_string(),
                    ],
                },
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let set: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(set)
    }

    /// Lookup folds case and hyphen/underscore separators, so
    /// `--template lab-report` resolves "lab report".
    pub fn find(&self, name: &str) -> Option<&Template> {
        let wanted = fold_template_name(name);
        self.templates
            .iter()
            .find(|template| fold_template_name(&template.name) == wanted)
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates
            .iter()
            .map(|template| template.name.as_str())
            .collect()
    }
}

fn fold_template_name(name: &str) -> String {
    name.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}
