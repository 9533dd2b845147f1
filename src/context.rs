//! Context assembly for generation.
//!
//! Joins the text of retrieved chunks, in the order the store ranked them,
//! into one grounding string, and keeps a parallel citation list. There is
//! no deduplication and no length cap; `top_k` is the only bound.

use crate::models::{ScoredRecord, SourceRef};

/// Delimiter placed between consecutive chunk texts.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Grounding context for a single question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerContext {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

impl AnswerContext {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

pub fn assemble(results: &[ScoredRecord]) -> AnswerContext {
    let text = results
        .iter()
        .map(|r| r.metadata.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);
    let sources = results.iter().map(SourceRef::from).collect();
    AnswerContext { text, sources }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordMetadata;

    fn scored(id: &str, text: &str, chunk: usize, score: f32) -> ScoredRecord {
        ScoredRecord {
            id: id.to_string(),
            score,
            metadata: RecordMetadata {
                text: text.to_string(),
                source: "contract.pdf".to_string(),
                chunk,
            },
        }
    }

    #[test]
    fn empty_results_give_empty_context() {
        let ctx = assemble(&[]);
        assert_eq!(ctx.text, "");
        assert!(ctx.is_empty());
    }

    #[test]
    fn texts_joined_in_ranked_order() {
        let ctx = assemble(&[
            scored("b", "second clause", 4, 0.9),
            scored("a", "first clause", 1, 0.7),
        ]);
        assert_eq!(ctx.text, "second clause\n\n---\n\nfirst clause");
        assert_eq!(ctx.sources[0].id, "b");
        assert_eq!(ctx.sources[0].chunk, 4);
        assert_eq!(ctx.sources[1].id, "a");
    }

    #[test]
    fn duplicates_are_kept() {
        let ctx = assemble(&[scored("a", "same", 0, 0.8), scored("b", "same", 0, 0.8)]);
        assert_eq!(ctx.text, "same\n\n---\n\nsame");
        assert_eq!(ctx.sources.len(), 2);
    }

    #[test]
    fn provenance_keeps_scores() {
        let ctx = assemble(&[scored("a", "x", 2, 0.91)]);
        assert_eq!(ctx.text, "x");
        assert_eq!(ctx.sources[0].source, "contract.pdf");
        assert!((ctx.sources[0].score - 0.91).abs() < 1e-6);
    }
}
