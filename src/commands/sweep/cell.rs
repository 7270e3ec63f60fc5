use std::time::Instant;

use tracing::{debug, warn};

use crate::backend::{InferenceBackend, SessionConfig, SessionHandle};
use crate::config;
use crate::error::SweepFault;
use crate::model::{CellSummary, Domain, TestCase, Trial};
use crate::semantic::{self, EmbeddingIndex};

use super::artifacts::ArtifactWriter;
use super::score;
use super::stats::StatsAggregator;

/// One unit of the sweep: a fixed (domain, embedding model, generative
/// model, temperature) combination evaluated over all sentences.
pub(super) struct CellContext<'a> {
    pub domain: &'a Domain,
    pub embedding_model: &'a str,
    pub generative_model: &'a str,
    pub temperature: f64,
    pub repetitions: usize,
}

/// Opens the cell's session, runs every sentence through retrieval and
/// adaptation, and closes the session exactly once — also on the abort path,
/// so backend resources never leak into the next cell.
pub(super) fn run_cell<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    index: &EmbeddingIndex,
    ctx: &CellContext<'_>,
    artifacts: &ArtifactWriter,
    stats: &mut StatsAggregator,
) -> Result<CellSummary, SweepFault> {
    let session_config = SessionConfig {
        base_model: ctx.generative_model.to_string(),
        temperature: ctx.temperature,
        system_instruction: config::SYSTEM_INSTRUCTION.to_string(),
    };

    let session = backend.open_session(&session_config)?;
    let outcome = run_cell_trials(backend, &session, index, ctx, artifacts, stats);

    if let Err(fault) = backend.close_session(session) {
        warn!(
            domain = %ctx.domain.name,
            generative_model = %ctx.generative_model,
            temperature = ctx.temperature,
            fault = %fault,
            "session close failed"
        );
    }

    outcome
}

fn run_cell_trials<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    session: &SessionHandle,
    index: &EmbeddingIndex,
    ctx: &CellContext<'_>,
    artifacts: &ArtifactWriter,
    stats: &mut StatsAggregator,
) -> Result<CellSummary, SweepFault> {
    let temperature_key = config::format_temperature(ctx.temperature);

    let mut trials = 0_usize;
    let mut weak_correct = 0_usize;
    let mut strong_correct = 0_usize;
    let mut retrieval_correct = 0_usize;
    let mut skipped_sentences = 0_usize;
    let mut total_generation_ms = 0_u128;

    for _ in 0..ctx.repetitions.max(1) {
        for (sentence_index, case) in ctx.domain.cases.iter().enumerate() {
            match produce_trial(backend, session, index, ctx, case, sentence_index) {
                Ok(trial) => {
                    debug!(
                        domain = %trial.domain,
                        sentence = trial.sentence_index,
                        similarity = trial.similarity,
                        embedding_ms = trial.embedding_ms,
                        generation_ms = trial.generation_ms,
                        raw = %trial.raw_answer,
                        weak = trial.weak_correct,
                        strong = trial.strong_correct,
                        "trial scored"
                    );
                    artifacts.append_trial(&trial)?;
                    stats.record(
                        ctx.embedding_model,
                        ctx.generative_model,
                        &temperature_key,
                        trial.weak_correct,
                        trial.strong_correct,
                    );

                    trials += 1;
                    weak_correct += usize::from(trial.weak_correct);
                    strong_correct += usize::from(trial.strong_correct);
                    retrieval_correct += usize::from(trial.retrieval_correct);
                    total_generation_ms += trial.generation_ms;
                }
                Err(SweepFault::ServiceUnavailable(detail)) => {
                    warn!(
                        domain = %ctx.domain.name,
                        embedding_model = %ctx.embedding_model,
                        generative_model = %ctx.generative_model,
                        temperature = ctx.temperature,
                        sentence = sentence_index,
                        detail = %detail,
                        "transient backend fault; sentence skipped"
                    );
                    skipped_sentences += 1;
                }
                Err(fault) => return Err(fault),
            }
        }
    }

    let mean_generation_ms = if trials == 0 {
        0.0
    } else {
        total_generation_ms as f64 / trials as f64
    };

    Ok(CellSummary {
        domain: ctx.domain.name.clone(),
        embedding_model: ctx.embedding_model.to_string(),
        generative_model: ctx.generative_model.to_string(),
        temperature: temperature_key,
        trials,
        weak_correct,
        strong_correct,
        retrieval_correct,
        skipped_sentences,
        mean_generation_ms,
    })
}

/// Retrieval, adaptation, and scoring for one sentence. A malformed or
/// empty generation is absorbed here as an all-false trial; transient and
/// fatal backend faults propagate to the caller.
fn produce_trial<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    session: &SessionHandle,
    index: &EmbeddingIndex,
    ctx: &CellContext<'_>,
    case: &TestCase,
    sentence_index: usize,
) -> Result<Trial, SweepFault> {
    let retrieval = semantic::retrieve_nearest(backend, index, &case.sentence)?;

    let prompt = config::adaptation_prompt(&retrieval.literal, &case.sentence);
    let generation_started = Instant::now();
    let raw_answer = match backend.generate(session, &prompt) {
        Ok(text) => text,
        Err(SweepFault::MalformedAnswer) => String::new(),
        Err(fault) => return Err(fault),
    };
    let generation_ms = generation_started.elapsed().as_millis();

    let normalized_answer = score::normalize_answer(&raw_answer);
    let correctness = score::score_answer(&normalized_answer, &case.solution);
    let retrieval_correct =
        score::retrieval_matches(&retrieval.literal, case.expected_literal.as_deref());

    Ok(Trial {
        domain: ctx.domain.name.clone(),
        embedding_model: ctx.embedding_model.to_string(),
        generative_model: ctx.generative_model.to_string(),
        temperature: ctx.temperature,
        sentence_index,
        sentence: case.sentence.clone(),
        retrieved_literal: retrieval.literal,
        similarity: retrieval.similarity,
        raw_answer,
        normalized_answer,
        expected_solution: case.solution.clone(),
        retrieval_correct,
        weak_correct: correctness.weak,
        strong_correct: correctness.strong,
        embedding_ms: retrieval.elapsed_ms,
        generation_ms,
    })
}
