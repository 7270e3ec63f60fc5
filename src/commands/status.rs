use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::SweepRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    info!(output_root = %args.output_root.display(), "status requested");

    if !args.output_root.exists() {
        warn!(path = %args.output_root.display(), "output root missing; no sweep has run here");
        return Ok(());
    }

    let (domain_dirs, artifact_files) = count_artifacts(&args.output_root)?;
    info!(domains = domain_dirs, artifacts = artifact_files, "persisted cell artifacts");

    let summary_path = args.output_root.join("summary.tsv");
    if summary_path.exists() {
        let rows = fs::read_to_string(&summary_path)
            .with_context(|| format!("failed to read {}", summary_path.display()))?
            .lines()
            .count();
        info!(path = %summary_path.display(), rows, "summary log present");
    } else {
        warn!(path = %summary_path.display(), "summary log missing");
    }

    match latest_manifest(&args.output_root.join("manifests"))? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: SweepRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                run_id = %manifest.run_id,
                generated_at = %manifest.generated_at,
                status = %manifest.status,
                domains = manifest.domains.len(),
                cells_completed = manifest.cells_completed,
                cells_skipped = manifest.cells_skipped,
                warnings = manifest.warnings.len(),
                duration_ms = manifest.duration_ms,
                "latest run manifest"
            );
        }
        None => warn!("no run manifest found"),
    }

    Ok(())
}

fn count_artifacts(output_root: &Path) -> Result<(usize, usize)> {
    let mut domain_dirs = 0_usize;
    let mut artifact_files = 0_usize;

    let entries = fs::read_dir(output_root)
        .with_context(|| format!("failed to read {}", output_root.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", output_root.display()))?;
        let path = entry.path();
        if !path.is_dir() || path.file_name().is_some_and(|name| name == "manifests") {
            continue;
        }

        domain_dirs += 1;
        let cell_files =
            fs::read_dir(&path).with_context(|| format!("failed to read {}", path.display()))?;
        for cell_file in cell_files {
            let cell_file =
                cell_file.with_context(|| format!("failed to read entry in {}", path.display()))?;
            if cell_file.path().extension().is_some_and(|ext| ext == "txt") {
                artifact_files += 1;
            }
        }
    }

    Ok((domain_dirs, artifact_files))
}

fn latest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut manifests = Vec::new();
    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("sweep_run_") && name.ends_with(".json"));
        if is_run_manifest {
            manifests.push(path);
        }
    }

    // Run ids embed a compact UTC timestamp, so lexical order is recency.
    manifests.sort();
    Ok(manifests.pop())
}
