use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::backend::{InferenceBackend, OllamaBackend};
use crate::cli::SweepArgs;
use crate::config::{self, SweepPlan};
use crate::corpus;
use crate::model::{Domain, DomainRecord, RecordSetHash, SweepRunManifest};
use crate::semantic::IndexCache;
use crate::util::{ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

use super::artifacts::{ArtifactWriter, SummaryLog};
use super::cell::{self, CellContext};
use super::stats::StatsAggregator;

pub fn run(args: SweepArgs) -> Result<()> {
    let plan = SweepPlan::from_static_tables();
    let mut backend =
        OllamaBackend::new(&args.backend_url, Duration::from_millis(args.timeout_ms))?;

    let manifest = run_sweep(
        &mut backend,
        &plan,
        &args.tests_root,
        &args.output_root,
        &args.backend_url,
    )?;

    info!(
        run_id = %manifest.run_id,
        cells_completed = manifest.cells_completed,
        cells_skipped = manifest.cells_skipped,
        warnings = manifest.warnings.len(),
        "sweep completed"
    );

    Ok(())
}

/// Drives the nested iteration domain → embedding model → generative model →
/// temperature, with fault isolation at cell granularity: one cell's failure
/// never prevents subsequent cells from running.
pub(super) fn run_sweep<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    plan: &SweepPlan,
    tests_root: &Path,
    output_root: &Path,
    backend_url: &str,
) -> Result<SweepRunManifest> {
    let started = Instant::now();
    let started_at = now_utc_string();
    let run_id = format!("sweep-{}", utc_compact_string(Utc::now()));

    ensure_directory(output_root)?;
    let artifacts = ArtifactWriter::new(output_root);
    let summary_log = SummaryLog::create(output_root)?;
    let mut stats = StatsAggregator::new();
    let mut cache = IndexCache::new();

    let mut domain_records = Vec::new();
    let mut cells = Vec::new();
    let mut warnings = Vec::new();
    let mut cells_completed = 0_usize;
    let mut cells_skipped = 0_usize;

    let domain_names = corpus::discover_domains(tests_root)?;
    if domain_names.is_empty() {
        warn!(root = %tests_root.display(), "no domains found under tests root");
        warnings.push("no domains found under tests root".to_string());
    }

    for name in &domain_names {
        let domain = match corpus::load_domain(tests_root, name) {
            Ok(domain) => domain,
            Err(fault) => {
                warn!(domain = %name, fault = %fault, "domain skipped");
                warnings.push(format!("domain {name} skipped: {fault}"));
                continue;
            }
        };

        domain_records.push(domain_record(tests_root, &domain)?);
        summary_log.write_domain_header(&domain.name)?;
        info!(
            domain = %domain.name,
            cases = domain.cases.len(),
            literals = domain.literals.len(),
            "domain sweep started"
        );

        for embedding_model in &plan.embedding_models {
            let index = match cache.get_or_build(backend, &domain, embedding_model) {
                Ok(index) => index,
                Err(fault) => {
                    warn!(
                        domain = %domain.name,
                        embedding_model = %embedding_model,
                        fault = %fault,
                        "embedding index unavailable; pair skipped"
                    );
                    warnings.push(format!(
                        "index for ({name}, {embedding_model}) skipped: {fault}"
                    ));
                    cells_skipped += plan.generative_models.len() * plan.temperatures.len();
                    continue;
                }
            };

            for generative_model in &plan.generative_models {
                for &temperature in &plan.temperatures {
                    let ctx = CellContext {
                        domain: &domain,
                        embedding_model,
                        generative_model,
                        temperature,
                        repetitions: plan.repetitions,
                    };

                    match cell::run_cell(backend, index, &ctx, &artifacts, &mut stats) {
                        Ok(summary) => {
                            summary_log.write_cell_row(&summary)?;
                            info!(
                                domain = %summary.domain,
                                embedding_model = %summary.embedding_model,
                                generative_model = %summary.generative_model,
                                temperature = %summary.temperature,
                                trials = summary.trials,
                                weak_pct = summary.weak_pct(),
                                strong_pct = summary.strong_pct(),
                                retrieval_pct = summary.retrieval_pct(),
                                "cell completed"
                            );
                            cells.push(summary);
                            cells_completed += 1;
                        }
                        Err(fault) => {
                            warn!(
                                domain = %domain.name,
                                embedding_model = %embedding_model,
                                generative_model = %generative_model,
                                temperature,
                                fault = %fault,
                                "cell skipped"
                            );
                            warnings.push(format!(
                                "cell ({name}, {embedding_model}, {generative_model}, {}) skipped: {fault}",
                                config::format_temperature(temperature)
                            ));
                            cells_skipped += 1;
                        }
                    }
                }
            }
        }
    }

    stats.log_rows();

    let manifest = SweepRunManifest {
        manifest_version: 1,
        run_id,
        generated_at: started_at,
        backend_url: backend_url.to_string(),
        tests_root: tests_root.display().to_string(),
        output_root: output_root.display().to_string(),
        embedding_models: plan.embedding_models.clone(),
        generative_models: plan.generative_models.clone(),
        temperatures: plan
            .temperatures
            .iter()
            .map(|&t| config::format_temperature(t))
            .collect(),
        repetitions: plan.repetitions,
        domains: domain_records,
        cells_completed,
        cells_skipped,
        duration_ms: started.elapsed().as_millis(),
        status: "completed".to_string(),
        warnings,
        cells,
    };

    let manifest_path = output_root
        .join("manifests")
        .join(format!("sweep_run_{}.json", utc_compact_string(Utc::now())));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "sweep manifest written");

    Ok(manifest)
}

fn domain_record(tests_root: &Path, domain: &Domain) -> Result<DomainRecord> {
    let mut record_set_hashes = Vec::new();
    for path in corpus::record_set_paths(tests_root, &domain.name) {
        let file = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid record-set filename: {}", path.display()))?;
        let sha256 = sha256_file(&path)?;
        record_set_hashes.push(RecordSetHash { file, sha256 });
    }

    Ok(DomainRecord {
        name: domain.name.clone(),
        cases: domain.cases.len(),
        literals: domain.literals.len(),
        has_retrieval_labels: domain
            .cases
            .first()
            .is_some_and(|case| case.expected_literal.is_some()),
        record_set_hashes,
    })
}
