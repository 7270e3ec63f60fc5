use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::format_temperature;
use crate::error::SweepFault;
use crate::model::{CellSummary, Trial};

/// Appends one block per trial to the per-cell artifact file
/// `<domain>/<embedding>_<generator>_<temperature>.txt`, in sentence order.
pub(super) struct ArtifactWriter {
    output_root: PathBuf,
}

impl ArtifactWriter {
    pub(super) fn new(output_root: &Path) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
        }
    }

    pub(super) fn append_trial(&self, trial: &Trial) -> Result<(), SweepFault> {
        let dir = self.output_root.join(&trial.domain);
        fs::create_dir_all(&dir).map_err(|source| SweepFault::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!(
            "{}_{}_{}.txt",
            trial.embedding_model,
            trial.generative_model,
            format_temperature(trial.temperature)
        ));

        let block = format!(
            "[USER] {}\n[EMBEDDING] {}\n[GENERATE] {}\n[SOLUTION] {}\n\n",
            trial.sentence.trim(),
            trial.retrieved_literal.trim(),
            trial.normalized_answer.trim(),
            trial.expected_solution.trim()
        );

        append(&path, &block)
    }
}

/// Run-wide summary log: one delimiter row per domain, then one tab-separated
/// row per completed cell.
pub(super) struct SummaryLog {
    path: PathBuf,
}

impl SummaryLog {
    pub(super) fn create(output_root: &Path) -> Result<Self, SweepFault> {
        fs::create_dir_all(output_root).map_err(|source| SweepFault::Io {
            path: output_root.to_path_buf(),
            source,
        })?;

        let path = output_root.join("summary.tsv");
        fs::write(&path, "").map_err(|source| SweepFault::Io {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path })
    }

    pub(super) fn write_domain_header(&self, domain: &str) -> Result<(), SweepFault> {
        append(&self.path, &format!("=== DOMAIN: {domain} ===\n"))
    }

    pub(super) fn write_cell_row(&self, summary: &CellSummary) -> Result<(), SweepFault> {
        let row = format!(
            "{}\t{}\t{}\t{:.2}%\t{:.2}%\t{:.2}%\t{:.2}\n",
            summary.temperature,
            summary.embedding_model,
            summary.generative_model,
            summary.weak_pct(),
            summary.strong_pct(),
            summary.retrieval_pct(),
            summary.mean_generation_ms
        );
        append(&self.path, &row)
    }
}

fn append(path: &Path, content: &str) -> Result<(), SweepFault> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SweepFault::Io {
            path: path.to_path_buf(),
            source,
        })?;

    file.write_all(content.as_bytes())
        .map_err(|source| SweepFault::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{ArtifactWriter, SummaryLog};
    use crate::model::{CellSummary, Trial};

    fn scratch_root(tag: &str) -> PathBuf {
        let root =
            std::env::temp_dir().join(format!("litsweep-artifacts-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).expect("scratch root should be creatable");
        root
    }

    fn trial() -> Trial {
        Trial {
            domain: "fruit".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            generative_model: "llama3.1".to_string(),
            temperature: 0.2,
            sentence_index: 0,
            sentence: "The apple is green.\n".to_string(),
            retrieved_literal: "hasColor(apple, red)\n".to_string(),
            similarity: 0.91,
            raw_answer: "`hasColor(apple, green)`".to_string(),
            normalized_answer: "hasColor(apple, green)".to_string(),
            expected_solution: "hasColor(apple, green)\n".to_string(),
            retrieval_correct: true,
            weak_correct: true,
            strong_correct: true,
            embedding_ms: 3,
            generation_ms: 17,
        }
    }

    #[test]
    fn trial_blocks_append_in_order() {
        let root = scratch_root("blocks");
        let writer = ArtifactWriter::new(&root);

        writer.append_trial(&trial()).expect("first block");
        writer.append_trial(&trial()).expect("second block");

        let path = root.join("fruit").join("nomic-embed-text_llama3.1_0.2.txt");
        let content = fs::read_to_string(&path).expect("artifact should exist");
        let expected_block = "[USER] The apple is green.\n[EMBEDDING] hasColor(apple, red)\n[GENERATE] hasColor(apple, green)\n[SOLUTION] hasColor(apple, green)\n\n";
        assert_eq!(content, format!("{expected_block}{expected_block}"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn summary_rows_follow_the_domain_header() {
        let root = scratch_root("summary");
        let log = SummaryLog::create(&root).expect("summary log");

        log.write_domain_header("fruit").expect("header");
        log.write_cell_row(&CellSummary {
            domain: "fruit".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            generative_model: "llama3.1".to_string(),
            temperature: "0.2".to_string(),
            trials: 4,
            weak_correct: 3,
            strong_correct: 2,
            retrieval_correct: 4,
            skipped_sentences: 0,
            mean_generation_ms: 21.5,
        })
        .expect("row");

        let content = fs::read_to_string(root.join("summary.tsv")).expect("summary should exist");
        assert_eq!(
            content,
            "=== DOMAIN: fruit ===\n0.2\tnomic-embed-text\tllama3.1\t75.00%\t50.00%\t100.00%\t21.50\n"
        );

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn create_truncates_a_previous_run() {
        let root = scratch_root("truncate");
        {
            let log = SummaryLog::create(&root).expect("summary log");
            log.write_domain_header("fruit").expect("header");
        }
        let log = SummaryLog::create(&root).expect("second run");
        drop(log);

        let content = fs::read_to_string(root.join("summary.tsv")).expect("summary should exist");
        assert!(content.is_empty());

        let _ = fs::remove_dir_all(&root);
    }
}
