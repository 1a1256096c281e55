use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::TemplatesArgs;
use crate::lexicon::TemplateSet;

pub fn run(args: TemplatesArgs) -> Result<()> {
    let templates = match &args.templates_path {
        Some(path) => TemplateSet::load(path)?,
        None => TemplateSet::builtin(),
    };

    let mut output = io::BufWriter::new(io::stdout().lock());

    if args.json {
        serde_json::to_writer_pretty(&mut output, &templates)
            .context("failed to serialize template list")?;
        writeln!(output)?;
    } else {
        for template in &templates.templates {
            writeln!(
                output,
                "{} ({} sections)",
                template.name,
                template.sections.len()
            )?;
            for section in &template.sections {
                writeln!(output, "  {section}")?;
            }
        }
    }

    output.flush()?;
    info!(count = templates.templates.len(), "listed templates");

    Ok(())
}
