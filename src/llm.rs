use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::lexicon::Lexicon;
use crate::model::SpellingCorrection;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

/// The verdict token must appear near the start of the response; anything
/// past this window is explanation text.
const VERDICT_WINDOW_CHARS: usize = 50;
const SPELLING_SAMPLE_CHARS: usize = 300;
const STATIC_CORRECTIONS_MAX: usize = 5;
const MODEL_CORRECTIONS_MAX: usize = 3;
const CORRECTION_MAX_CHARS: usize = 30;
const NO_ERRORS_TOKEN: &str = "NO ERRORS";

const MISSPELLINGS: &[(&str, &str)] = &[
    ("recieve", "receive"),
    ("teh", "the"),
    ("occured", "occurred"),
    ("seperate", "separate"),
    ("definately", "definitely"),
    ("wich", "which"),
    ("untill", "until"),
    ("experiement", "experiment"),
];

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub is_match: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, Default)]
pub struct SpellingCheck {
    pub has_errors: bool,
    pub corrections: Vec<SpellingCorrection>,
}

#[derive(Debug, Error)]
enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug)]
enum ServiceState {
    Available(ModelHandle),
    Unavailable,
}

#[derive(Debug)]
struct ModelHandle {
    client: Client,
    generate_url: String,
    model: String,
}

impl ModelHandle {
    fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(&self.generate_url)
            .timeout(GENERATE_TIMEOUT)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: 0.1,
                    top_p: 0.3,
                },
            })
            .send()?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status()));
        }

        let body: GenerateResponse = response.json()?;
        Ok(body.response.trim().to_string())
    }
}

/// Adjudicates ambiguous heading pairs and flags spelling problems via a
/// local completion service. The service is probed once at construction;
/// an unreachable service leaves the matcher degraded for its lifetime,
/// and every request failure degrades to the deterministic path. Verdicts
/// are best-effort, never ground truth.
#[derive(Debug)]
pub struct SemanticMatcher<'a> {
    lexicon: &'a Lexicon,
    state: ServiceState,
}

impl<'a> SemanticMatcher<'a> {
    pub fn probe(config: &ServiceConfig, lexicon: &'a Lexicon) -> Self {
        let client = match Client::builder().build() {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "failed to build http client, matcher disabled");
                return Self::disabled(lexicon);
            }
        };

        let base = config.base_url.trim_end_matches('/');
        let tags_url = format!("{base}/api/tags");

        let state = match probe_models(&client, &tags_url, &config.model) {
            Some(model) => {
                info!(model = %model, "model service available");
                ServiceState::Available(ModelHandle {
                    client,
                    generate_url: format!("{base}/api/generate"),
                    model,
                })
            }
            None => ServiceState::Unavailable,
        };

        Self { lexicon, state }
    }

    pub fn disabled(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            state: ServiceState::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ServiceState::Available(_))
    }

    pub fn model_name(&self) -> Option<&str> {
        match &self.state {
            ServiceState::Available(handle) => Some(&handle.model),
            ServiceState::Unavailable => None,
        }
    }

    /// Judges whether `candidate` denotes the `required` section. The
    /// lexicon pre-check runs first and never touches the service.
    pub fn judge(&self, candidate: &str, required: &str) -> Judgment {
        if let Some(judgment) = self.lexicon_precheck(candidate, required) {
            return judgment;
        }

        let ServiceState::Available(handle) = &self.state else {
            return Judgment {
                is_match: false,
                explanation: "model service unavailable".to_string(),
            };
        };

        let prompt = judge_prompt(candidate, required);
        match handle.generate(&prompt) {
            Ok(raw) => parse_judgment(&raw, candidate, required),
            Err(err) => {
                warn!(candidate, required, error = %err, "synonym judgment request failed");
                Judgment {
                    is_match: false,
                    explanation: format!("model request failed: {err}"),
                }
            }
        }
    }

    /// Static dictionary first; the service only sees a short sample and
    /// only when the dictionary found nothing.
    pub fn check_spelling(&self, text: &str) -> SpellingCheck {
        let corrections = static_corrections(text);
        if !corrections.is_empty() {
            return SpellingCheck {
                has_errors: true,
                corrections,
            };
        }

        let ServiceState::Available(handle) = &self.state else {
            return SpellingCheck::default();
        };

        let sample: String = text.chars().take(SPELLING_SAMPLE_CHARS).collect();
        match handle.generate(&spelling_prompt(&sample)) {
            Ok(raw) => {
                let corrections = parse_spelling(&raw);
                SpellingCheck {
                    has_errors: !corrections.is_empty(),
                    corrections,
                }
            }
            Err(err) => {
                warn!(error = %err, "spelling check request failed");
                SpellingCheck::default()
            }
        }
    }

    fn lexicon_precheck(&self, candidate: &str, required: &str) -> Option<Judgment> {
        let candidate_lower = candidate.to_lowercase();
        for synonym in self.lexicon.synonyms_for(required) {
            if candidate_lower.contains(synonym) {
                return Some(Judgment {
                    is_match: true,
                    explanation: format!(
                        "'{candidate}' contains '{synonym}', which denotes the '{required}' section"
                    ),
                });
            }
        }
        None
    }
}

fn probe_models(client: &Client, tags_url: &str, requested: &str) -> Option<String> {
    let response = match client.get(tags_url).timeout(PROBE_TIMEOUT).send() {
        Ok(response) => response,
        Err(err) => {
            warn!(url = %tags_url, error = %err, "model service probe failed");
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(url = %tags_url, status = %response.status(), "model service probe rejected");
        return None;
    }

    let tags: TagsResponse = match response.json() {
        Ok(tags) => tags,
        Err(err) => {
            warn!(url = %tags_url, error = %err, "model listing did not parse");
            return None;
        }
    };

    let requested_lower = requested.to_lowercase();
    let model = tags
        .models
        .iter()
        .find(|model| model.name.to_lowercase().contains(&requested_lower))
        .or_else(|| tags.models.first())?;

    Some(model.name.clone())
}

fn judge_prompt(candidate: &str, required: &str) -> String {
    format!(
        "Decide whether two headings denote the same section of a student report.\n\
         \n\
         Student heading: \"{candidate}\"\n\
         Required section: \"{required}\"\n\
         \n\
         Rules:\n\
         1. Answer YES if both denote the same section.\n\
         2. Answer NO if they are different sections.\n\
         3. After the answer, give a one-sentence explanation.\n\
         \n\
         Examples:\n\
         \"Theoretical part\" and \"Theory\" -> YES\n\
         \"Practical implementation\" and \"Practice\" -> YES\n\
         \"List of references\" and \"References\" -> YES\n\
         \"CONTENTS\" and \"Table of Contents\" -> YES\n\
         \"Introduction\" and \"Conclusion\" -> NO\n\
         \n\
         Answer and short explanation only."
    )
}

fn spelling_prompt(sample: &str) -> String {
    format!(
        "Find spelling errors in the text below.\n\
         \n\
         Text: {sample}\n\
         \n\
         Answer format:\n\
         For each error write one line: wrong->right\n\
         Only words and arrows, nothing else.\n\
         If there are no errors write: {NO_ERRORS_TOKEN}"
    )
}

/// Maps a free-form model response to a judgment. An affirmative token
/// inside the leading window wins only when no negative token contradicts
/// it; anything ambiguous or unparsable is a non-match.
fn parse_judgment(raw: &str, candidate: &str, required: &str) -> Judgment {
    let window: String = raw.chars().take(VERDICT_WINDOW_CHARS).collect();
    let affirmative = has_verdict_token(&window, "yes");
    let negative = has_verdict_token(&window, "no");

    if !affirmative || negative {
        return Judgment {
            is_match: false,
            explanation: "headings do not denote the same section".to_string(),
        };
    }

    let explanation = raw
        .lines()
        .map(str::trim)
        .find(|line| line.chars().count() > 10 && !line_has_any_verdict(line))
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("'{candidate}' denotes the same section as '{required}'"));

    Judgment {
        is_match: true,
        explanation,
    }
}

fn has_verdict_token(text: &str, token: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case(token))
}

fn line_has_any_verdict(line: &str) -> bool {
    has_verdict_token(line, "yes") || has_verdict_token(line, "no")
}

/// Parses `wrong->right` lines, discarding malformed, identical or
/// oversized pairs and capping the total.
fn parse_spelling(raw: &str) -> Vec<SpellingCorrection> {
    if raw.to_uppercase().contains(NO_ERRORS_TOKEN) {
        return Vec::new();
    }

    let mut corrections = Vec::new();
    for line in raw.lines() {
        if corrections.len() >= MODEL_CORRECTIONS_MAX {
            break;
        }

        let Some((wrong, correct)) = line.split_once("->") else {
            continue;
        };
        let wrong = wrong.trim();
        let correct = correct.trim();
        if wrong.is_empty()
            || correct.is_empty()
            || wrong == correct
            || wrong.chars().count() >= CORRECTION_MAX_CHARS
            || correct.chars().count() >= CORRECTION_MAX_CHARS
        {
            continue;
        }

        corrections.push(SpellingCorrection {
            wrong: wrong.to_string(),
            correct: correct.to_string(),
        });
    }

    corrections
}

fn static_corrections(text: &str) -> Vec<SpellingCorrection> {
    let mut corrections = Vec::new();
    let mut seen = HashSet::new();

    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if corrections.len() >= STATIC_CORRECTIONS_MAX {
            break;
        }

        let lowered = word.to_lowercase();
        if lowered.is_empty() || !seen.insert(lowered.clone()) {
            continue;
        }

        if let Some((_, correct)) = MISSPELLINGS.iter().find(|(wrong, _)| *wrong == lowered) {
            corrections.push(SpellingCorrection {
                wrong: lowered,
                correct: (*correct).to_string(),
            });
        }
    }

    corrections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_response_with_explanation_line_parses_as_match() {
        let raw = "YES\nBoth headings describe the theoretical material of the report.";
        let judgment = parse_judgment(raw, "Theoretical part", "Theory");
        assert!(judgment.is_match);
        assert_eq!(
            judgment.explanation,
            "Both headings describe the theoretical material of the report."
        );
    }

    #[test]
    fn affirmative_response_without_explanation_gets_a_default_one() {
        let judgment = parse_judgment("YES.", "Results", "Practice");
        assert!(judgment.is_match);
        assert!(judgment.explanation.contains("Results"));
        assert!(judgment.explanation.contains("Practice"));
    }

    #[test]
    fn negative_and_ambiguous_responses_parse_as_non_match() {
        assert!(!parse_judgment("NO, these differ.", "a", "b").is_match);
        assert!(!parse_judgment("YES or NO, hard to say.", "a", "b").is_match);
        assert!(!parse_judgment("The headings look unrelated.", "a", "b").is_match);
        assert!(!parse_judgment("", "a", "b").is_match);
    }

    #[test]
    fn verdict_tokens_are_matched_as_whole_words() {
        // "denotes" and "nothing" contain "no" but are not verdicts.
        let judgment = parse_judgment("YES - denotes nothing unusual\nIt denotes the same section of the report.", "a", "b");
        assert!(judgment.is_match);
    }

    #[test]
    fn spelling_parse_collects_capped_well_formed_pairs() {
        let raw = "teh->the\nbroken line\nsame->same\nrecieve->receive\nocured->occurred\nextra->ignored";
        let corrections = parse_spelling(raw);
        assert_eq!(corrections.len(), MODEL_CORRECTIONS_MAX);
        assert_eq!(corrections[0].wrong, "teh");
        assert_eq!(corrections[0].correct, "the");
        assert!(corrections.iter().all(|c| c.wrong != c.correct));
    }

    #[test]
    fn spelling_parse_discards_oversized_pairs() {
        let long = "x".repeat(CORRECTION_MAX_CHARS);
        let corrections = parse_spelling(&format!("{long}->short\nteh->the"));
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].wrong, "teh");
    }

    #[test]
    fn no_errors_token_means_no_corrections() {
        assert!(parse_spelling("NO ERRORS").is_empty());
        assert!(parse_spelling("no errors found in this text").is_empty());
    }

    #[test]
    fn static_dictionary_catches_known_misspellings() {
        let corrections = static_corrections("We recieve teh samples and teh labels.");
        assert_eq!(corrections.len(), 2);
        assert_eq!(corrections[0].wrong, "recieve");
        assert_eq!(corrections[1].wrong, "teh");
    }

    #[test]
    fn disabled_matcher_still_answers_from_the_lexicon() {
        let lexicon = Lexicon::builtin();
        let matcher = SemanticMatcher::disabled(&lexicon);

        let judgment = matcher.judge("Theoretical part", "Theory");
        assert!(judgment.is_match);

        let judgment = matcher.judge("Weather report", "Theory");
        assert!(!judgment.is_match);
        assert_eq!(judgment.explanation, "model service unavailable");
    }

    #[test]
    fn disabled_matcher_spelling_degrades_to_the_static_dictionary() {
        let lexicon = Lexicon::builtin();
        let matcher = SemanticMatcher::disabled(&lexicon);

        let check = matcher.check_spelling("The seperate results were fine.");
        assert!(check.has_errors);
        assert_eq!(check.corrections[0].correct, "separate");

        let clean = matcher.check_spelling("All sections were present.");
        assert!(!clean.has_errors);
        assert!(clean.corrections.is_empty());
    }
}
