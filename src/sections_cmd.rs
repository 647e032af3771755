//! `rnl sections`: PDF upload → sections → entity annotations → relational store.

use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::entities::{EntityTagger, HeuristicTagger};
use crate::extract::segment_sections;
use crate::ingest::{self, Upload};
use crate::store::sections::{AnnotatedSection, SectionStore};

/// Segment document text and annotate each section.
pub fn annotate(text: &str, tagger: &dyn EntityTagger) -> Vec<AnnotatedSection> {
    segment_sections(text)
        .into_iter()
        .map(|section| {
            let entities = tagger.tag(&section.content);
            AnnotatedSection { section, entities }
        })
        .collect()
}

pub async fn run_sections(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    let text = match ingest::load_upload(path)? {
        Upload::Document { text, .. } => text,
        Upload::Tabular(_) => bail!("{} is not a PDF document", path.display()),
    };

    let annotated = annotate(&text, &HeuristicTagger);
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    println!("sections {}", source);
    for item in &annotated {
        println!(
            "  {:<14} {:>6} chars  {:>3} entities",
            item.section.name,
            item.section.content.chars().count(),
            item.entities.len()
        );
    }

    if dry_run {
        println!("(dry-run: nothing stored)");
        return Ok(());
    }

    let store = SectionStore::new(db::connect(config.sections_url()?).await?);
    let written = store.insert_sections(&source, &annotated).await;
    store.close().await;
    let written = written?;

    info!(source = %source, written, "sections stored");
    println!("  stored: {} sections", written);
    println!("ok");
    Ok(())
}
