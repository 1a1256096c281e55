use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CheckArgs;
use crate::compare::StructureComparator;
use crate::extract::HeadingExtractor;
use crate::lexicon::{Lexicon, TemplateSet};
use crate::llm::{SemanticMatcher, ServiceConfig};
use crate::model::{
    CheckReport, DocumentInfo, ServiceStatus, StructuredDocument, TemplateInfo,
};
use crate::reader;
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: CheckArgs, lexicon: &Lexicon) -> Result<()> {
    let templates = match &args.templates_path {
        Some(path) => TemplateSet::load(path)?,
        None => TemplateSet::builtin(),
    };
    let template = templates.find(&args.template).with_context(|| {
        format!(
            "unknown template '{}' (available: {})",
            args.template,
            templates.names().join(", ")
        )
    })?;

    let document = reader::load_document(&args.document)
        .with_context(|| format!("failed to load document {}", args.document.display()))?;
    let sha256 = sha256_file(&args.document)?;

    let extractor = HeadingExtractor::new(lexicon)?;
    let candidates = extractor.extract(&document);
    info!(candidates = candidates.len(), "extracted heading candidates");

    let matcher = if args.no_llm {
        SemanticMatcher::disabled(lexicon)
    } else {
        let config = ServiceConfig {
            base_url: args.llm_url.clone(),
            model: args.llm_model.clone(),
        };
        SemanticMatcher::probe(&config, lexicon)
    };

    let comparator = StructureComparator::new(lexicon, &matcher);
    let mut result = comparator.compare(&candidates, &template.sections);

    if matcher.is_available() && !args.no_spelling {
        let spelling = matcher.check_spelling(&document_text(&document));
        if spelling.has_errors {
            result.spelling_corrections = Some(spelling.corrections);
        }
    }

    let report = CheckReport {
        report_version: 1,
        generated_at: now_utc_string(),
        document: DocumentInfo {
            path: args.document.display().to_string(),
            sha256,
            paragraph_count: document.paragraphs.len(),
        },
        template: TemplateInfo {
            name: template.name.clone(),
            sections: template.sections.clone(),
        },
        candidates,
        result,
        model_service: ServiceStatus {
            requested: !args.no_llm,
            available: matcher.is_available(),
            base_url: args.llm_url.clone(),
            model: matcher.model_name().map(ToOwned::to_owned),
        },
    };

    if let Some(path) = &args.report_path {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote check report");
    }

    if args.json {
        write_json_response(&report)?;
    } else {
        write_text_response(&report)?;
    }

    info!(
        score = report.result.score,
        status = report.result.status.as_str(),
        "check completed"
    );

    Ok(())
}

fn document_text(document: &StructuredDocument) -> String {
    document
        .paragraphs
        .iter()
        .map(|paragraph| paragraph.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

fn write_json_response(report: &CheckReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize check report")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(report: &CheckReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Document: {}", report.document.path)?;
    writeln!(
        output,
        "Template: {} ({} sections)",
        report.template.name,
        report.template.sections.len()
    )?;
    writeln!(
        output,
        "Score: {:.1} ({})",
        report.result.score,
        report.result.status.as_str()
    )?;
    writeln!(output, "{}", report.result.tally)?;

    if !report.result.matched.is_empty() {
        writeln!(output, "Matched:")?;
        for section in &report.result.matched {
            writeln!(
                output,
                "  {}\tfound as '{}'\t[{}]",
                section.required,
                section.matched_text,
                section.method.as_str()
            )?;
        }
    }

    if !report.result.missing.is_empty() {
        writeln!(output, "Missing:")?;
        for label in &report.result.missing {
            writeln!(output, "  {label}")?;
        }
    }

    for note in &report.result.synonym_notes {
        writeln!(output, "Note: {note}")?;
    }

    if let Some(corrections) = &report.result.spelling_corrections {
        writeln!(output, "Spelling:")?;
        for correction in corrections {
            writeln!(output, "  {} -> {}", correction.wrong, correction.correct)?;
        }
    }

    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    #[test]
    fn document_text_joins_non_empty_paragraphs() {
        let document = StructuredDocument {
            paragraphs: vec![
                Paragraph {
                    text: "  Introduction  ".to_string(),
                    style: None,
                    runs: Vec::new(),
                },
                Paragraph {
                    text: "   ".to_string(),
                    style: None,
                    runs: Vec::new(),
                },
                Paragraph {
                    text: "Body text.".to_string(),
                    style: None,
                    runs: Vec::new(),
                },
            ],
        };

        assert_eq!(document_text(&document), "Introduction\nBody text.");
    }
}
