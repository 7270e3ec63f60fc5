use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SweepFault;
use crate::model::{Domain, TestCase};

pub const SENTENCES_FILE: &str = "sentences.txt";
pub const SOLUTIONS_FILE: &str = "solutions.txt";
pub const LITERALS_FILE: &str = "literals.txt";
pub const RETRIEVAL_LABELS_FILE: &str = "embeddings.txt";

/// Sorted domain directory names under the tests root.
pub fn discover_domains(root: &Path) -> Result<Vec<String>, SweepFault> {
    let entries = fs::read_dir(root).map_err(|source| SweepFault::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut domains = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SweepFault::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            domains.push(name.to_string());
        }
    }

    domains.sort();
    Ok(domains)
}

/// Loads the four positionally-joined record sets of one domain and converts
/// them to in-memory records, so no later component re-derives the join.
pub fn load_domain(root: &Path, name: &str) -> Result<Domain, SweepFault> {
    let dir = root.join(name);

    let sentences = read_record_set(&dir.join(SENTENCES_FILE))?;
    let solutions = read_record_set(&dir.join(SOLUTIONS_FILE))?;
    let literals = read_record_set(&dir.join(LITERALS_FILE))?;
    let labels_path = dir.join(RETRIEVAL_LABELS_FILE);
    let labels = if labels_path.exists() {
        Some(read_record_set(&labels_path)?)
    } else {
        None
    };

    if sentences.is_empty() || solutions.is_empty() || literals.is_empty() {
        return Err(SweepFault::EmptyDomain(name.to_string()));
    }

    let mut counts = vec![
        (SENTENCES_FILE, sentences.len()),
        (SOLUTIONS_FILE, solutions.len()),
        (LITERALS_FILE, literals.len()),
    ];
    if let Some(labels) = &labels {
        counts.push((RETRIEVAL_LABELS_FILE, labels.len()));
    }
    if counts.iter().any(|(_, len)| *len != sentences.len()) {
        let detail = counts
            .iter()
            .map(|(file, len)| format!("{file}={len}"))
            .collect::<Vec<String>>()
            .join(", ");
        return Err(SweepFault::CorpusMismatch {
            domain: name.to_string(),
            detail,
        });
    }

    let cases = sentences
        .into_iter()
        .zip(solutions)
        .enumerate()
        .map(|(index, (sentence, solution))| TestCase {
            sentence,
            solution,
            expected_literal: labels.as_ref().map(|labels| labels[index].clone()),
        })
        .collect();

    Ok(Domain {
        name: name.to_string(),
        literals,
        cases,
    })
}

/// Paths of the record-set files present for a domain, for manifest hashing.
pub fn record_set_paths(root: &Path, name: &str) -> Vec<PathBuf> {
    let dir = root.join(name);
    [
        SENTENCES_FILE,
        SOLUTIONS_FILE,
        LITERALS_FILE,
        RETRIEVAL_LABELS_FILE,
    ]
    .iter()
    .map(|file| dir.join(file))
    .filter(|path| path.exists())
    .collect()
}

fn read_record_set(path: &Path) -> Result<Vec<String>, SweepFault> {
    let raw = fs::read_to_string(path).map_err(|source| SweepFault::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(raw.lines().map(|line| line.to_string()).collect())
}
