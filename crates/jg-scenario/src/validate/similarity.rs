//! String similarity used to correct near-miss identifiers.

/// Similarity in `[0, 1]`; 1 means identical.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Jaro-Winkler over lower-cased text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinklerScorer;

impl SimilarityScorer for JaroWinklerScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(&a.to_lowercase(), &b.to_lowercase())
    }
}

/// Best-scoring candidate at or above `threshold`. Earlier candidates win
/// ties.
pub fn best_match<'c, I>(
    scorer: &dyn SimilarityScorer,
    query: &str,
    candidates: I,
    threshold: f64,
) -> Option<(&'c str, f64)>
where
    I: IntoIterator<Item = &'c str>,
{
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = scorer.score(query, candidate);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.filter(|(_, s)| *s >= threshold)
}
