//! Retrieval-intent scoring
//!
//! Keyword and pattern heuristics over the user's query produce a confidence
//! in [0.0, 1.0]. Thresholds are configured; the defaults route ≥0.7 to
//! direct retrieve-and-generate, ≥0.4 to context augmentation, and skip KB
//! use below that.

use std::sync::OnceLock;

use regex::Regex;

/// Strong retrieval cues: 0.3 each, capped at 0.6
const STRONG_KEYWORDS: &[&str] = &[
    "search",
    "find",
    "lookup",
    "look up",
    "retrieve",
    "according to",
    "from the document",
    "from the docs",
    "in the documentation",
    "knowledge base",
];

/// Medium cues: 0.2 each, capped at 0.4
const MEDIUM_KEYWORDS: &[&str] = &[
    "what does",
    "based on",
    "reference",
    "cite",
    "source",
    "extract",
    "get information",
];

/// Weak cues: 0.1 each, capped at 0.2
const WEAK_KEYWORDS: &[&str] = &["get details", "find details", "what is mentioned", "what says"];

fn retrieval_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"what (?:does|do|is|are) .+ (?:say|mention|state|indicate)",
            r"(?:where|how|when|why|what) (?:can i find|is mentioned)",
            r"according to .+",
            r"based on .+",
            r"from (?:the |your )?(?:document|docs|documentation|knowledge base)",
            r"in (?:the |your )?(?:document|docs|documentation|knowledge base)",
            r"(?:search|find|lookup|retrieve) .+ (?:in|from)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("must be valid regex"))
        .collect()
    })
}

/// Score retrieval intent for a user query
pub fn retrieval_confidence(query: &str) -> f64 {
    let lowered = query.to_lowercase();
    let mut score = 0.0f64;

    let count = |keywords: &[&str]| keywords.iter().filter(|k| lowered.contains(**k)).count() as f64;

    score += (count(STRONG_KEYWORDS) * 0.3).min(0.6);
    score += (count(MEDIUM_KEYWORDS) * 0.2).min(0.4);
    score += (count(WEAK_KEYWORDS) * 0.1).min(0.2);

    if lowered.contains('?') {
        score += 0.1;
    }

    if retrieval_patterns().iter().any(|p| p.is_match(&lowered)) {
        score += 0.2;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_chat_scores_low() {
        assert!(retrieval_confidence("Hello, how are you today") < 0.4);
        assert!(retrieval_confidence("Write me a haiku about spring") < 0.4);
    }

    #[test]
    fn explicit_retrieval_scores_high() {
        let score = retrieval_confidence("Search the knowledge base and retrieve the refund policy from the docs");
        assert!(score >= 0.7, "score was {score}");
    }

    #[test]
    fn document_questions_score_mid() {
        let score = retrieval_confidence("What does the contract say about termination?");
        assert!((0.4..=1.0).contains(&score), "score was {score}");
    }

    #[test]
    fn scores_are_clamped_to_one() {
        let loaded = "search find lookup retrieve according to from the docs reference cite source \
                      extract what does based on get details find details what says?";
        assert!(retrieval_confidence(loaded) <= 1.0);
    }

    #[test]
    fn scoring_is_case_insensitive() {
        assert_eq!(
            retrieval_confidence("ACCORDING TO the documentation"),
            retrieval_confidence("according to the documentation")
        );
    }
}
