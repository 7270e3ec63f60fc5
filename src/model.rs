use serde::{Deserialize, Serialize};

/// One test case of a domain: the positional join of the sentence, solution,
/// and optional expected-retrieval record sets.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub sentence: String,
    pub solution: String,
    pub expected_literal: Option<String>,
}

/// A loaded domain corpus. `literals` preserves literal-file order; the
/// retriever's tie-break depends on it.
#[derive(Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub literals: Vec<String>,
    pub cases: Vec<TestCase>,
}

/// One scored test case. Immutable once produced; persisted to the cell
/// artifact and fed to the aggregator, never mutated after scoring.
#[derive(Debug, Clone)]
pub struct Trial {
    pub domain: String,
    pub embedding_model: String,
    pub generative_model: String,
    pub temperature: f64,
    pub sentence_index: usize,
    pub sentence: String,
    pub retrieved_literal: String,
    pub similarity: f64,
    pub raw_answer: String,
    pub normalized_answer: String,
    pub expected_solution: String,
    pub retrieval_correct: bool,
    pub weak_correct: bool,
    pub strong_correct: bool,
    pub embedding_ms: u128,
    pub generation_ms: u128,
}

/// Derived per-cell counters, serialized into the run manifest and rendered
/// as one summary row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellSummary {
    pub domain: String,
    pub embedding_model: String,
    pub generative_model: String,
    pub temperature: String,
    pub trials: usize,
    pub weak_correct: usize,
    pub strong_correct: usize,
    pub retrieval_correct: usize,
    pub skipped_sentences: usize,
    pub mean_generation_ms: f64,
}

impl CellSummary {
    pub fn weak_pct(&self) -> f64 {
        percentage(self.weak_correct, self.trials)
    }

    pub fn strong_pct(&self) -> f64 {
        percentage(self.strong_correct, self.trials)
    }

    pub fn retrieval_pct(&self) -> f64 {
        percentage(self.retrieval_correct, self.trials)
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRecord {
    pub name: String,
    pub cases: usize,
    pub literals: usize,
    pub has_retrieval_labels: bool,
    pub record_set_hashes: Vec<RecordSetHash>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSetHash {
    pub file: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub backend_url: String,
    pub tests_root: String,
    pub output_root: String,
    pub embedding_models: Vec<String>,
    pub generative_models: Vec<String>,
    pub temperatures: Vec<String>,
    pub repetitions: usize,
    pub domains: Vec<DomainRecord>,
    pub cells_completed: usize,
    pub cells_skipped: usize,
    pub duration_ms: u128,
    pub status: String,
    pub warnings: Vec<String>,
    pub cells: Vec<CellSummary>,
}

#[cfg(test)]
mod tests {
    use super::CellSummary;

    #[test]
    fn percentages_guard_against_zero_trials() {
        let summary = CellSummary {
            domain: "auction".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            generative_model: "llama3.1".to_string(),
            temperature: "0.0".to_string(),
            trials: 0,
            weak_correct: 0,
            strong_correct: 0,
            retrieval_correct: 0,
            skipped_sentences: 5,
            mean_generation_ms: 0.0,
        };

        assert_eq!(summary.weak_pct(), 0.0);
        assert_eq!(summary.strong_pct(), 0.0);
        assert_eq!(summary.retrieval_pct(), 0.0);
    }

    #[test]
    fn percentages_round_trip_counts() {
        let summary = CellSummary {
            domain: "auction".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            generative_model: "llama3.1".to_string(),
            temperature: "0.2".to_string(),
            trials: 4,
            weak_correct: 3,
            strong_correct: 1,
            retrieval_correct: 2,
            skipped_sentences: 0,
            mean_generation_ms: 12.5,
        };

        assert_eq!(summary.weak_pct(), 75.0);
        assert_eq!(summary.strong_pct(), 25.0);
        assert_eq!(summary.retrieval_pct(), 50.0);
    }
}
