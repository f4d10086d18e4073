//! Canonical stream utilities
//!
//! Contracts enforced here: a stable chunk id, one role-bearing first chunk
//! per choice, and exactly one terminal chunk per choice index. Provider
//! parsers already aim for this; normalization makes it hold even for
//! nonconforming upstream streams.

use std::collections::HashSet;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};

use crate::error::GatewayError;
use crate::types::{ChatChunk, ChatResponse, ChunkDelta, FinishReason};

/// Boxed canonical chunk stream
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, GatewayError>> + Send>>;

/// Per-stream normalization state
#[derive(Debug, Default)]
pub struct ChunkNormalizer {
    started: HashSet<u32>,
    finished: HashSet<u32>,
}

impl ChunkNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite identity fields and enforce the per-choice contract
    ///
    /// Returns `None` when every choice slice was dropped (e.g. a duplicate
    /// terminal chunk) and no usage rides on the chunk.
    pub fn normalize(&mut self, mut chunk: ChatChunk, id: &str, created: u64, model: &str) -> Option<ChatChunk> {
        chunk.id = id.to_owned();
        chunk.created = created;
        chunk.model = model.to_owned();

        chunk.choices.retain_mut(|choice| {
            if self.finished.contains(&choice.index) {
                // Nothing may follow the terminal chunk for an index
                return false;
            }

            if choice.finish_reason.is_some() {
                self.finished.insert(choice.index);
                // The terminal chunk carries no delta content
                choice.delta = ChunkDelta::default();
            } else if self.started.insert(choice.index) {
                choice.delta.role.get_or_insert_with(|| "assistant".to_owned());
            }

            true
        });

        if chunk.choices.is_empty() && chunk.usage.is_none() {
            None
        } else {
            Some(chunk)
        }
    }

    /// Choice indexes that streamed content but never finished
    pub fn unfinished(&self) -> Vec<u32> {
        self.started.difference(&self.finished).copied().collect()
    }
}

/// Wrap a provider stream, pinning chunk identity and enforcing contracts
///
/// If the upstream stream ends without a terminal chunk for some choice, a
/// synthesized `stop` chunk is appended so consumers always observe a
/// finish reason.
pub fn normalize_stream(
    stream: ChunkStream,
    id: String,
    created: u64,
    model: String,
) -> ChunkStream {
    #[derive(Clone, Copy)]
    enum Phase {
        Running,
        Draining,
        Done,
    }

    let normalized = futures_util::stream::unfold(
        (stream, ChunkNormalizer::new(), id, model, Phase::Running),
        move |(mut stream, mut state, id, model, mut phase)| async move {
            loop {
                match phase {
                    Phase::Running => match stream.next().await {
                        Some(Ok(chunk)) => {
                            if let Some(chunk) = state.normalize(chunk, &id, created, &model) {
                                return Some((Ok(chunk), (stream, state, id, model, phase)));
                            }
                            // Fully dropped chunk; keep pulling
                        }
                        Some(Err(err)) => {
                            // Mid-stream errors terminate; they are not retried
                            return Some((Err(err), (stream, state, id, model, Phase::Done)));
                        }
                        None => phase = Phase::Draining,
                    },
                    Phase::Draining => {
                        // Synthesize missing terminal chunks, one per call
                        let mut unfinished = state.unfinished();
                        unfinished.sort_unstable();
                        let Some(index) = unfinished.first().copied() else {
                            return None;
                        };
                        let chunk = ChatChunk::finish(&id, created, &model, index, FinishReason::Stop);
                        let _ = state.normalize(chunk.clone(), &id, created, &model);
                        return Some((Ok(chunk), (stream, state, id, model, Phase::Draining)));
                    }
                    Phase::Done => return None,
                }
            }
        },
    );

    Box::pin(normalized)
}

/// Render a finished response as a minimal canonical chunk sequence
///
/// Used when a non-streaming result (e.g. a direct RAG answer) must be
/// served over the streaming wire: one role+content chunk, one terminal
/// chunk per choice, then usage.
pub fn response_to_chunks(response: &ChatResponse) -> Vec<ChatChunk> {
    let mut chunks = Vec::new();

    for choice in &response.choices {
        chunks.push(ChatChunk::delta(
            &response.id,
            response.created,
            &response.model,
            choice.index,
            ChunkDelta {
                role: Some(choice.message.role.clone()),
                content: choice.message.content.clone(),
                tool_calls: None,
            },
        ));
        chunks.push(ChatChunk::finish(
            &response.id,
            response.created,
            &response.model,
            choice.index,
            choice.finish_reason.unwrap_or(FinishReason::Stop),
        ));
    }

    if let Some(usage) = response.usage {
        chunks.push(ChatChunk::usage(
            &response.id,
            response.created,
            &response.model,
            usage,
        ));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssistantMessage, Choice, ChunkChoice, Usage};

    fn chunk(content: Option<&str>, finish: Option<FinishReason>) -> ChatChunk {
        ChatChunk {
            id: "upstream".into(),
            created: 0,
            model: "upstream-model".into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: content.map(ToOwned::to_owned),
                    tool_calls: None,
                },
                finish_reason: finish,
            }],
            usage: None,
        }
    }

    #[tokio::test]
    async fn normalization_pins_identity_and_injects_role() {
        let upstream = futures_util::stream::iter(vec![
            Ok(chunk(Some("Hi"), None)),
            Ok(chunk(Some(" there"), None)),
            Ok(chunk(None, Some(FinishReason::Stop))),
        ]);
        let normalized: Vec<_> = normalize_stream(Box::pin(upstream), "stable".into(), 7, "m".into())
            .collect::<Vec<_>>()
            .await;

        let chunks: Vec<ChatChunk> = normalized.into_iter().map(Result::unwrap).collect();
        assert!(chunks.iter().all(|c| c.id == "stable" && c.created == 7 && c.model == "m"));
        assert_eq!(chunks[0].choices[0].delta.role.as_deref(), Some("assistant"));
        assert!(chunks[1].choices[0].delta.role.is_none());
        assert_eq!(chunks[2].choices[0].finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn duplicate_finish_chunks_are_dropped() {
        let upstream = futures_util::stream::iter(vec![
            Ok(chunk(Some("Hi"), None)),
            Ok(chunk(None, Some(FinishReason::Stop))),
            Ok(chunk(None, Some(FinishReason::Stop))),
            Ok(chunk(Some("late"), None)),
        ]);
        let chunks: Vec<ChatChunk> = normalize_stream(Box::pin(upstream), "s".into(), 1, "m".into())
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        let finishes = chunks
            .iter()
            .flat_map(|c| &c.choices)
            .filter(|c| c.finish_reason.is_some())
            .count();
        assert_eq!(finishes, 1);
        assert_eq!(chunks.len(), 2);
    }

    #[tokio::test]
    async fn missing_finish_is_synthesized_at_stream_end() {
        let upstream = futures_util::stream::iter(vec![Ok(chunk(Some("Hi"), None))]);
        let chunks: Vec<ChatChunk> = normalize_stream(Box::pin(upstream), "s".into(), 1, "m".into())
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        let last = chunks.last().unwrap();
        assert_eq!(last.choices[0].finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn response_renders_as_chunk_triplet() {
        let response = ChatResponse {
            id: "r1".into(),
            created: 1,
            model: "m".into(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".into(),
                    content: Some("answer".into()),
                    tool_calls: None,
                },
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: Some(Usage {
                prompt_tokens: 1,
                completion_tokens: 2,
                total_tokens: 3,
            }),
        };

        let chunks = response_to_chunks(&response);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].choices[0].delta.content.as_deref(), Some("answer"));
        assert_eq!(chunks[1].choices[0].finish_reason, Some(FinishReason::Stop));
        assert!(chunks[2].usage.is_some());
    }
}
