use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write one subdomain per line to `output_file`, resolved against the
/// current working directory. Missing parent directories are created.
pub fn export_subdomains(output_file: &Path, subdomains: &[String]) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to determine current directory")?;
    export_subdomains_in(&current_dir, output_file, subdomains)
}

/// Like [`export_subdomains`], resolving relative paths against `base_dir`.
pub fn export_subdomains_in(base_dir: &Path, output_file: &Path, subdomains: &[String]) -> Result<PathBuf> {
    let output_path = base_dir.join(output_file);
    debug!("Exporting {} subdomains to {}", subdomains.len(), output_path.display());

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory '{}'", parent.display()))?;
    }

    let file = File::create(&output_path)
        .with_context(|| format!("Failed to create output file '{}'", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    for subdomain in subdomains {
        writeln!(writer, "{}", subdomain)?;
    }
    writer.flush()?;

    info!("Successfully exported {} subdomains to {}", subdomains.len(), output_path.display());
    Ok(output_path)
}

/// Order-preserving dedup over the merged list of all sources.
pub fn dedupe_subdomains(subdomains: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    subdomains
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
