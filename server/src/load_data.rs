//! `foodgram-server load-data`: bulk import of ingredients and tags from CSV.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context};
use foodgram_core::reference_data::{parse_ingredients, parse_tags};

use crate::store::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

impl LoadReport {
    fn new(parsed: usize, inserted: usize) -> Self {
        Self {
            loaded: inserted,
            skipped: parsed.saturating_sub(inserted),
        }
    }
}

fn load_ingredients(store: &PgStore, path: &Path) -> anyhow::Result<LoadReport> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let rows = parse_ingredients(file).with_context(|| format!("failed to parse {}", path.display()))?;
    let inserted = store
        .insert_ingredients(&rows)
        .context("failed to insert ingredients")?;
    Ok(LoadReport::new(rows.len(), inserted))
}

fn load_tags(store: &PgStore, path: &Path) -> anyhow::Result<LoadReport> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let rows = parse_tags(file).with_context(|| format!("failed to parse {}", path.display()))?;
    let inserted = store.insert_tags(&rows).context("failed to insert tags")?;
    Ok(LoadReport::new(rows.len(), inserted))
}

/// Load both files. A failure in one file does not stop the other; the
/// command still fails at the end if either did.
pub fn run(store: &PgStore, ingredients: &Path, tags: &Path) -> anyhow::Result<()> {
    let jobs: [(&str, &Path, fn(&PgStore, &Path) -> anyhow::Result<LoadReport>); 2] = [
        ("ingredients", ingredients, load_ingredients),
        ("tags", tags, load_tags),
    ];

    let mut failed = Vec::new();
    for (kind, path, load) in jobs {
        match load(store, path) {
            Ok(report) => {
                tracing::info!(
                    kind,
                    path = %path.display(),
                    loaded = report.loaded,
                    skipped = report.skipped,
                    "reference data loaded"
                );
                println!(
                    "{kind}: loaded {}, skipped {} already present",
                    report.loaded, report.skipped
                );
            }
            Err(e) => {
                tracing::error!(kind, path = %path.display(), error = ?e, "failed to load reference data");
                eprintln!("{kind}: {e:#}");
                failed.push(kind);
            }
        }
    }

    if !failed.is_empty() {
        bail!("failed to load {}", failed.join(" and "));
    }
    Ok(())
}
