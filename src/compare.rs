use std::collections::HashSet;

use tracing::debug;

use crate::lexicon::Lexicon;
use crate::llm::SemanticMatcher;
use crate::model::{MatchMethod, MatchResult, MatchStatus, SectionMatch};
use crate::normalize::{normalize_heading, strip_category_prefix, strip_enumeration, trim_markup};

const CLEANED_MIN_CHARS: usize = 3;
const CLEANED_MAX_CHARS: usize = 200;

#[derive(Debug, Clone)]
struct Prepared {
    raw: String,
    normalized: String,
}

type StageFn = fn(&Lexicon, &Prepared, &Prepared) -> bool;

/// Deterministic stages in precedence order; the model stage runs only
/// after all of these failed for every candidate.
const DETERMINISTIC_STAGES: [(MatchMethod, StageFn); 3] = [
    (MatchMethod::Exact, stage_exact),
    (MatchMethod::Containment, stage_containment),
    (MatchMethod::Synonym, stage_synonym),
];

/// Drives the match loop over required sections and assembles the result
/// record. Inputs are never mutated; a fresh result is produced per call.
#[derive(Debug)]
pub struct StructureComparator<'a> {
    lexicon: &'a Lexicon,
    matcher: &'a SemanticMatcher<'a>,
}

impl<'a> StructureComparator<'a> {
    pub fn new(lexicon: &'a Lexicon, matcher: &'a SemanticMatcher<'a>) -> Self {
        Self { lexicon, matcher }
    }

    pub fn compare(&self, candidates: &[String], required: &[String]) -> MatchResult {
        let prepared = prepare_candidates(candidates);
        let mut used: HashSet<usize> = HashSet::new();
        let mut matched = Vec::new();
        let mut missing = Vec::new();
        let mut synonym_notes = Vec::new();

        for label in required {
            let target = Prepared {
                raw: label.clone(),
                normalized: normalize_heading(label),
            };

            match self.find_match(&prepared, &target, &used) {
                Some((index, method, explanation)) => {
                    used.insert(index);
                    if method == MatchMethod::Model {
                        if let Some(explanation) = &explanation {
                            synonym_notes.push(format!(
                                "'{}' matched '{}': {}",
                                prepared[index].raw, label, explanation
                            ));
                        }
                    }
                    debug!(required = %label, candidate = %prepared[index].raw, method = method.as_str(), "section matched");
                    matched.push(SectionMatch {
                        required: label.clone(),
                        matched_text: prepared[index].raw.clone(),
                        method,
                        explanation,
                    });
                }
                None => missing.push(label.clone()),
            }
        }

        let total = required.len();
        let score = score_for(matched.len(), total);

        MatchResult {
            tally: format!("Found {} of {} required sections", matched.len(), total),
            status: MatchStatus::from_score(score),
            score,
            matched,
            missing,
            synonym_notes,
            spelling_corrections: None,
        }
    }

    fn find_match(
        &self,
        candidates: &[Prepared],
        target: &Prepared,
        used: &HashSet<usize>,
    ) -> Option<(usize, MatchMethod, Option<String>)> {
        for (method, stage) in DETERMINISTIC_STAGES {
            for (index, candidate) in candidates.iter().enumerate() {
                if stage(self.lexicon, candidate, target) {
                    return Some((index, method, None));
                }
            }
        }

        for (index, candidate) in candidates.iter().enumerate() {
            if used.contains(&index) {
                continue;
            }
            let judgment = self.matcher.judge(&candidate.raw, &target.raw);
            if judgment.is_match {
                return Some((index, MatchMethod::Model, Some(judgment.explanation)));
            }
        }

        None
    }
}

/// Cleans the candidate set and keeps the cleaned variant only when it
/// actually changed something and survived the length bounds.
fn prepare_candidates(candidates: &[String]) -> Vec<Prepared> {
    let cleaned: Vec<String> = candidates
        .iter()
        .map(|candidate| clean_candidate(candidate))
        .filter(|candidate| {
            let chars = candidate.chars().count();
            chars >= CLEANED_MIN_CHARS && chars < CLEANED_MAX_CHARS
        })
        .collect();

    let chosen = if !cleaned.is_empty() && cleaned.as_slice() != candidates {
        cleaned
    } else {
        candidates.to_vec()
    };

    chosen
        .into_iter()
        .map(|raw| {
            let normalized = normalize_heading(&raw);
            Prepared { raw, normalized }
        })
        .collect()
}

fn clean_candidate(candidate: &str) -> String {
    let stripped = trim_markup(candidate);
    let stripped = strip_category_prefix(stripped);
    let stripped = strip_enumeration(stripped);
    trim_markup(stripped).to_string()
}

fn stage_exact(_: &Lexicon, candidate: &Prepared, target: &Prepared) -> bool {
    (!target.normalized.is_empty() && candidate.normalized == target.normalized)
        || candidate.raw.trim().to_lowercase() == target.raw.trim().to_lowercase()
}

fn stage_containment(_: &Lexicon, candidate: &Prepared, target: &Prepared) -> bool {
    if candidate.normalized.is_empty() || target.normalized.is_empty() {
        return false;
    }
    candidate.normalized.contains(&target.normalized)
        || target.normalized.contains(&candidate.normalized)
}

fn stage_synonym(lexicon: &Lexicon, candidate: &Prepared, target: &Prepared) -> bool {
    if candidate.normalized.is_empty() {
        return false;
    }

    lexicon.synonyms_for(&target.raw).iter().copied().any(|synonym| {
        if phrase_overlaps(synonym, &candidate.normalized) {
            return true;
        }
        let normalized_synonym = normalize_heading(synonym);
        !normalized_synonym.is_empty() && phrase_overlaps(&normalized_synonym, &candidate.normalized)
    })
}

fn phrase_overlaps(phrase: &str, normalized_candidate: &str) -> bool {
    normalized_candidate.contains(phrase) || phrase.contains(normalized_candidate)
}

fn score_for(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((matched as f64 / total as f64) * 1000.0).round() / 10.0
}
