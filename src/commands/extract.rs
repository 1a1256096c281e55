use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ExtractArgs;
use crate::extract::HeadingExtractor;
use crate::lexicon::Lexicon;
use crate::reader;

pub fn run(args: ExtractArgs, lexicon: &Lexicon) -> Result<()> {
    let document = reader::load_document(&args.document)
        .with_context(|| format!("failed to load document {}", args.document.display()))?;

    let extractor = HeadingExtractor::new(lexicon)?;
    let candidates = extractor.extract(&document);

    let mut output = io::BufWriter::new(io::stdout().lock());

    if args.json {
        serde_json::to_writer_pretty(&mut output, &candidates)
            .context("failed to serialize heading candidates")?;
        writeln!(output)?;
    } else {
        for candidate in &candidates {
            writeln!(output, "{candidate}")?;
        }
    }

    output.flush()?;
    info!(
        path = %args.document.display(),
        paragraphs = document.paragraphs.len(),
        candidates = candidates.len(),
        "extraction completed"
    );

    Ok(())
}
