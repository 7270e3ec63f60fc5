use std::path::PathBuf;

use thiserror::Error;

/// Faults surfaced by sweep components. The orchestrator is the only place
/// that decides which of these are fatal for a domain, an index pair, a cell,
/// or a single sentence.
#[derive(Debug, Error)]
pub enum SweepFault {
    /// The positional record sets of a domain disagree in length.
    #[error("corpus record sets disagree in domain {domain}: {detail}")]
    CorpusMismatch { domain: String, detail: String },

    /// A domain carries zero test cases or zero literals.
    #[error("domain {0} has an empty record set")]
    EmptyDomain(String),

    /// Retrieval was attempted against an index with no entries.
    #[error("embedding index for domain {domain} under model {model} has no entries")]
    EmptyIndex { domain: String, model: String },

    /// The backend rejected the requested model.
    #[error("model {0} is not provisioned on the inference backend")]
    ModelUnavailable(String),

    /// Transient backend fault: network error, timeout, or non-success status.
    #[error("inference backend unavailable: {0}")]
    ServiceUnavailable(String),

    /// The backend produced an empty or unusable answer. Never fatal: the
    /// evaluator scores the trial as incorrect on every tier.
    #[error("backend returned an empty or malformed answer")]
    MalformedAnswer,

    /// A corpus record set could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
