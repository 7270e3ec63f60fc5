use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;

use tracing::debug;

use crate::backend::InferenceBackend;
use crate::error::SweepFault;
use crate::model::Domain;

/// Cosine similarity `dot(a,b) / (‖a‖·‖b‖)`, in [-1, 1]. Zero for
/// mismatched dimensionality or zero-norm input.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut left_sq = 0.0_f64;
    let mut right_sq = 0.0_f64;
    for (l, r) in left.iter().zip(right.iter()) {
        let (l, r) = (f64::from(*l), f64::from(*r));
        dot += l * r;
        left_sq += l * l;
        right_sq += r * r;
    }

    let norm_product = left_sq.sqrt() * right_sq.sqrt();
    if norm_product == 0.0 {
        return 0.0;
    }

    dot / norm_product
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub literal: String,
    pub vector: Vec<f32>,
}

/// Literal→vector index for one (domain, embedding model) pair. Entry order
/// is literal-file order; the retriever's tie-break depends on it.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    pub domain: String,
    pub model: String,
    pub entries: Vec<IndexEntry>,
    pub build_ms: u128,
}

impl EmbeddingIndex {
    /// Embeds every literal of the domain once, in literal order.
    pub fn build<B: InferenceBackend + ?Sized>(
        backend: &mut B,
        domain: &Domain,
        model: &str,
    ) -> Result<Self, SweepFault> {
        let started = Instant::now();

        let mut entries = Vec::with_capacity(domain.literals.len());
        for literal in &domain.literals {
            let vector = backend.embed(model, literal)?;
            entries.push(IndexEntry {
                literal: literal.clone(),
                vector,
            });
        }

        let build_ms = started.elapsed().as_millis();
        debug!(
            domain = %domain.name,
            model,
            literals = entries.len(),
            build_ms,
            "embedding index built"
        );

        Ok(Self {
            domain: domain.name.clone(),
            model: model.to_string(),
            entries,
            build_ms,
        })
    }
}

/// Memoizes indexes by (domain, embedding model) across the sweep, so an
/// index is built once and reused by every generative model and temperature.
#[derive(Debug, Default)]
pub struct IndexCache {
    indexes: HashMap<(String, String), EmbeddingIndex>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build<B: InferenceBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        domain: &Domain,
        model: &str,
    ) -> Result<&EmbeddingIndex, SweepFault> {
        let key = (domain.name.clone(), model.to_string());
        match self.indexes.entry(key) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let index = EmbeddingIndex::build(backend, domain, model)?;
                Ok(slot.insert(index))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Retrieval {
    pub literal: String,
    pub similarity: f64,
    pub elapsed_ms: u128,
}

/// Embeds the sentence once and selects the indexed literal with maximum
/// cosine similarity. Strict `>` against the running maximum: the first
/// literal in index order wins ties and near-ties.
pub fn retrieve_nearest<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    index: &EmbeddingIndex,
    sentence: &str,
) -> Result<Retrieval, SweepFault> {
    if index.entries.is_empty() {
        return Err(SweepFault::EmptyIndex {
            domain: index.domain.clone(),
            model: index.model.clone(),
        });
    }

    let started = Instant::now();
    let sentence_vector = backend.embed(&index.model, sentence)?;

    let mut best: Option<&IndexEntry> = None;
    let mut best_similarity = -1.0_f64;
    for entry in &index.entries {
        let similarity = cosine_similarity(&entry.vector, &sentence_vector);
        if similarity > best_similarity || best.is_none() {
            best_similarity = similarity;
            best = Some(entry);
        }
    }

    let entry = best.ok_or(SweepFault::EmptyIndex {
        domain: index.domain.clone(),
        model: index.model.clone(),
    })?;

    Ok(Retrieval {
        literal: entry.literal.clone(),
        similarity: best_similarity,
        elapsed_ms: started.elapsed().as_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::{EmbeddingIndex, IndexCache, cosine_similarity, retrieve_nearest};
    use crate::backend::testing::StubBackend;
    use crate::error::SweepFault;
    use crate::model::Domain;

    fn domain_with_literals(literals: &[&str]) -> Domain {
        Domain {
            name: "auction".to_string(),
            literals: literals.iter().map(|s| s.to_string()).collect(),
            cases: Vec::new(),
        }
    }

    #[test]
    fn cosine_of_vector_with_itself_is_one() {
        let v = [0.3_f32, -1.2, 0.05, 4.0];
        let similarity = cosine_similarity(&v, &v);
        assert!((similarity - 1.0).abs() < 1e-9, "got {similarity}");
    }

    #[test]
    fn cosine_guards_mismatched_and_zero_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn index_build_preserves_literal_order() {
        let mut backend = StubBackend::new()
            .with_embedding("bid(a)", &[1.0, 0.0])
            .with_embedding("bid(b)", &[0.0, 1.0]);
        let domain = domain_with_literals(&["bid(a)", "bid(b)"]);

        let index =
            EmbeddingIndex::build(&mut backend, &domain, "nomic-embed-text").expect("build");
        assert_eq!(index.entries[0].literal, "bid(a)");
        assert_eq!(index.entries[1].literal, "bid(b)");
        assert_eq!(backend.embed_calls, 2);
    }

    #[test]
    fn cache_reuses_a_built_index() {
        let mut backend = StubBackend::new().with_fallback_embedding(&[1.0, 0.0]);
        let domain = domain_with_literals(&["bid(a)", "bid(b)"]);
        let mut cache = IndexCache::new();

        cache
            .get_or_build(&mut backend, &domain, "nomic-embed-text")
            .expect("first build");
        cache
            .get_or_build(&mut backend, &domain, "nomic-embed-text")
            .expect("cached");

        assert_eq!(backend.embed_calls, 2, "literals embedded exactly once");
    }

    #[test]
    fn ties_resolve_to_the_first_literal_in_index_order() {
        // Both literals share one embedding, so every similarity ties.
        let mut backend = StubBackend::new().with_fallback_embedding(&[0.6, 0.8]);
        let domain = domain_with_literals(&["bid(a)", "bid(b)"]);
        let index =
            EmbeddingIndex::build(&mut backend, &domain, "nomic-embed-text").expect("build");

        for _ in 0..3 {
            let retrieval =
                retrieve_nearest(&mut backend, &index, "a bid arrives").expect("retrieve");
            assert_eq!(retrieval.literal, "bid(a)");
        }
    }

    #[test]
    fn single_entry_index_always_wins_with_bounded_similarity() {
        let mut backend = StubBackend::new()
            .with_embedding("hasColor(apple,red)", &[1.0, 0.0, 0.0])
            .with_fallback_embedding(&[-0.5, 0.5, 0.1]);
        let domain = domain_with_literals(&["hasColor(apple,red)"]);
        let index =
            EmbeddingIndex::build(&mut backend, &domain, "nomic-embed-text").expect("build");

        let retrieval = retrieve_nearest(&mut backend, &index, "anything at all").expect("retrieve");
        assert_eq!(retrieval.literal, "hasColor(apple,red)");
        assert!(retrieval.similarity >= -1.0 && retrieval.similarity <= 1.0);
    }

    #[test]
    fn empty_index_is_a_typed_fault() {
        let mut backend = StubBackend::new().with_fallback_embedding(&[1.0]);
        let index = super::EmbeddingIndex {
            domain: "auction".to_string(),
            model: "nomic-embed-text".to_string(),
            entries: Vec::new(),
            build_ms: 0,
        };

        let fault = retrieve_nearest(&mut backend, &index, "a bid arrives")
            .expect_err("empty index should fail");
        assert!(matches!(fault, SweepFault::EmptyIndex { .. }));
    }
}
