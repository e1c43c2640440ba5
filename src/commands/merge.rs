use crate::assembly::AssemblyOrder;
use crate::pdf::{DocumentEngine, LopdfEngine};
use crate::progress::{LogProgress, Pacing};
use crate::session::merge_documents;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub async fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    inputs: &[P],
    output: Q,
    pacing: Pacing,
) -> Result<()> {
    let output = output.as_ref();
    let files = collect_inputs(inputs)?;
    if files.is_empty() {
        bail!("No input files specified");
    }

    let engine = LopdfEngine;
    let mut assembly = AssemblyOrder::new();
    for file in &files {
        let bytes =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let page_count = engine
            .load(&bytes)
            .map(|doc| engine.page_count(&doc))
            .with_context(|| format!("Failed to load PDF: {}", file.display()))?;
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assembly.push(format!("1-{}", page_count), name, page_count, bytes);
    }

    let (bytes, total_pages) =
        merge_documents(&engine, assembly.merge_order(), &LogProgress, pacing).await?;
    std::fs::write(output, bytes)
        .with_context(|| format!("Failed to save merged PDF: {}", output.display()))?;

    println!(
        "Merged {} files ({} pages) into {}",
        files.len(),
        total_pages,
        output.display()
    );

    Ok(())
}

/// Expand directories into the PDF files below them, sorted by path.
fn collect_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if !input.is_dir() {
            files.push(input.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(false) {
            let entry =
                entry.with_context(|| format!("Failed to read directory {}", input.display()))?;
            let is_pdf = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if entry.file_type().is_file() && is_pdf {
                found.push(entry.into_path());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}
