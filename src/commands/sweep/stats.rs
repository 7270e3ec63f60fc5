use std::collections::BTreeMap;

use tracing::info;

/// Weak/strong counters for one (embedding, generative, temperature) key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct TierCounts {
    pub weak: usize,
    pub strong: usize,
}

pub(super) type StatsTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, TierCounts>>>;

/// Run-scoped accumulator, threaded through the orchestrator. Single writer;
/// read as a snapshot at run end and reported through the log, never
/// persisted mid-run.
#[derive(Debug, Default)]
pub(super) struct StatsAggregator {
    table: StatsTable,
}

impl StatsAggregator {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn record(
        &mut self,
        embedding_model: &str,
        generative_model: &str,
        temperature_key: &str,
        weak_correct: bool,
        strong_correct: bool,
    ) {
        let counts = self
            .table
            .entry(embedding_model.to_string())
            .or_default()
            .entry(generative_model.to_string())
            .or_default()
            .entry(temperature_key.to_string())
            .or_default();

        if weak_correct {
            counts.weak += 1;
        }
        if strong_correct {
            counts.strong += 1;
        }
    }

    pub(super) fn snapshot(&self) -> &StatsTable {
        &self.table
    }

    pub(super) fn log_rows(&self) {
        for (embedding_model, by_generator) in self.snapshot() {
            for (generative_model, by_temperature) in by_generator {
                for (temperature, counts) in by_temperature {
                    info!(
                        embedding_model = %embedding_model,
                        generative_model = %generative_model,
                        temperature = %temperature,
                        weak = counts.weak,
                        strong = counts.strong,
                        "run totals"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatsAggregator;

    #[test]
    fn intermediate_levels_initialize_on_first_use() {
        let mut stats = StatsAggregator::new();
        stats.record("nomic-embed-text", "llama3.1", "0.2", true, false);

        let counts = stats.snapshot()["nomic-embed-text"]["llama3.1"]["0.2"];
        assert_eq!(counts.weak, 1);
        assert_eq!(counts.strong, 0);
    }

    #[test]
    fn counters_accumulate_trial_by_trial() {
        let mut stats = StatsAggregator::new();
        stats.record("e", "g", "0.0", true, true);
        stats.record("e", "g", "0.0", true, false);
        stats.record("e", "g", "0.0", false, false);
        stats.record("e", "g", "0.4", true, true);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot["e"]["g"]["0.0"].weak, 2);
        assert_eq!(snapshot["e"]["g"]["0.0"].strong, 1);
        assert_eq!(snapshot["e"]["g"]["0.4"].weak, 1);
        assert_eq!(snapshot["e"]["g"].len(), 2);
    }
}
