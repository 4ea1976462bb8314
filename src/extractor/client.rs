// file: src/extractor/client.rs
// description: schema-guided chunk extraction with retry, backoff, and rate limiting
// reference: see extractor::service for the transport boundary

use crate::config::RetryConfig;
use crate::error::PipelineError;
use crate::extractor::limiter::RateLimiter;
use crate::extractor::prompt::PromptBuilder;
use crate::extractor::response::parse_response;
use crate::extractor::service::{CompletionRequest, CompletionService};
use crate::models::{ChunkFailure, ChunkOutcome, ExtractionResult, FieldDraft, TextChunk};
use crate::schema::Schema;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

/// Drives one chunk through the completion service.
///
/// Retry policy:
/// - `RateLimited` / `TransientService`: exponential backoff with
///   deterministic jitter, total service calls capped at
///   `retry.max_attempts`.
/// - `SchemaViolation` / `InvalidResponse` and partially invalid responses:
///   at most `retry.corrective_attempts` re-prompts naming the problems,
///   then the valid field subset (if any) is surfaced as a degraded result.
///   The cause is content shape, not transience, so no backoff loop.
/// - Everything else fails the chunk immediately.
///
/// The limiter and semaphore are shared across every chunk of the run; both
/// are injected so tests control pacing.
pub struct ExtractionClient {
    service: Arc<dyn CompletionService>,
    limiter: Arc<RateLimiter>,
    permits: Arc<Semaphore>,
    retry: RetryConfig,
}

impl ExtractionClient {
    pub fn new(
        service: Arc<dyn CompletionService>,
        limiter: Arc<RateLimiter>,
        retry: RetryConfig,
        max_in_flight: usize,
    ) -> Self {
        Self {
            service,
            limiter,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            retry,
        }
    }

    /// Never returns an error: every failure mode degrades into the
    /// `ChunkOutcome` so one bad chunk cannot abort its document.
    pub async fn extract_chunk(&self, chunk: &TextChunk, schema: &Schema) -> ChunkOutcome {
        let system = PromptBuilder::system(schema);
        let mut user = PromptBuilder::user(chunk);

        let mut calls: u32 = 0;
        let mut corrective_used: u32 = 0;
        let mut merged: BTreeMap<String, FieldDraft> = BTreeMap::new();
        let mut last_raw = String::new();
        let mut failure: Option<PipelineError> = None;

        loop {
            self.limiter.acquire().await;
            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                failure = Some(PipelineError::Cancelled);
                break;
            };

            calls += 1;
            let request = CompletionRequest {
                system: system.clone(),
                user: user.clone(),
            };
            let outcome = self.service.complete(&request).await;
            drop(permit);

            match outcome {
                Ok(raw) => match parse_response(&raw, schema) {
                    Ok(parsed) => {
                        let problems = parsed.problems.clone();
                        // Later (corrected) attempts override earlier values
                        // per field.
                        merged.extend(parsed.fields);
                        last_raw = raw;

                        if problems.is_empty() {
                            failure = None;
                            break;
                        }

                        if corrective_used < self.retry.corrective_attempts {
                            corrective_used += 1;
                            warn!(
                                "Chunk {}: re-prompting over {} invalid field(s)",
                                chunk.index,
                                problems.len()
                            );
                            user = PromptBuilder::corrective(chunk, &last_raw, &problems);
                            continue;
                        }

                        failure = Some(PipelineError::SchemaViolation(problems.join("; ")));
                        break;
                    }
                    Err(err) => {
                        if err.is_content_shape() && corrective_used < self.retry.corrective_attempts
                        {
                            corrective_used += 1;
                            warn!(
                                "Chunk {}: unusable response ({}), re-prompting",
                                chunk.index,
                                err.kind()
                            );
                            user = PromptBuilder::corrective(chunk, &raw, &[err.to_string()]);
                            continue;
                        }
                        failure = Some(err);
                        break;
                    }
                },
                Err(err) if err.is_transient() => {
                    if calls >= self.retry.max_attempts {
                        failure = Some(err);
                        break;
                    }
                    let backoff = self.backoff_delay(chunk.index, calls, &err);
                    warn!(
                        "Chunk {}: attempt {} failed ({}), retrying in {:?}",
                        chunk.index,
                        calls,
                        err.kind(),
                        backoff
                    );
                    sleep(backoff).await;
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        debug!(
            "Chunk {}: {} call(s), {} valid field(s), failure: {:?}",
            chunk.index,
            calls,
            merged.len(),
            failure.as_ref().map(|f| f.kind())
        );

        let result = if merged.is_empty() {
            None
        } else {
            Some(ExtractionResult {
                chunk_index: chunk.index,
                complete: merged.len() == schema.fields.len() && failure.is_none(),
                fields: merged,
                raw_response: last_raw,
            })
        };

        ChunkOutcome {
            chunk_index: chunk.index,
            attempts: calls,
            result,
            failure: failure.as_ref().map(ChunkFailure::from),
        }
    }

    fn backoff_delay(&self, chunk_index: usize, attempt: u32, err: &PipelineError) -> Duration {
        let exp = self
            .retry
            .backoff_base_ms
            .saturating_mul(1u64 << (attempt.min(16) - 1))
            .min(self.retry.backoff_cap_ms);
        let jitter = deterministic_jitter(chunk_index, attempt, self.retry.backoff_base_ms / 2);
        let mut delay_ms = exp.saturating_add(jitter);

        if let PipelineError::RateLimited {
            retry_after_ms: Some(after),
        } = err
        {
            delay_ms = delay_ms.max(*after);
        }

        Duration::from_millis(delay_ms)
    }
}

/// Jitter in `[0, spread]`, derived from the chunk and attempt so concurrent
/// retries de-synchronize while tests stay reproducible.
fn deterministic_jitter(chunk_index: usize, attempt: u32, spread: u64) -> u64 {
    if spread == 0 {
        return 0;
    }
    let mix = (chunk_index as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(attempt as u64)
        .wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mix % (spread + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema() -> Schema {
        Schema::from_yaml_str(
            "fields:\n  - name: name\n    type: string\n  - name: age\n    type: number\n",
        )
        .unwrap()
    }

    fn chunk() -> TextChunk {
        TextChunk::new(0, "Bee is 3 years old.".to_string(), 0)
    }

    fn client(service: Arc<dyn CompletionService>, max_attempts: u32) -> ExtractionClient {
        ExtractionClient::new(
            service,
            Arc::new(RateLimiter::new(1000.0, 1000)),
            RetryConfig {
                max_attempts,
                corrective_attempts: 1,
                backoff_base_ms: 100,
                backoff_cap_ms: 1000,
            },
            4,
        )
    }

    /// Always fails with the same transient error, counting calls.
    struct AlwaysTransient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for AlwaysTransient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PipelineError::TransientService("503".to_string()))
        }
    }

    /// Pops scripted responses in order; panics if called once drained.
    struct Scripted {
        responses: Mutex<Vec<Result<String>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionService for Scripted {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .expect("scripted service exhausted")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_respect_retry_ceiling() {
        let service = Arc::new(AlwaysTransient {
            calls: AtomicUsize::new(0),
        });
        let client = client(service.clone(), 3);

        let outcome = client.extract_chunk(&chunk(), &schema()).await;

        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.result.is_none());
        assert_eq!(
            outcome.failure.as_ref().unwrap().kind,
            "TransientServiceError"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success() {
        let service = Arc::new(Scripted::new(vec![
            Err(PipelineError::RateLimited {
                retry_after_ms: Some(200),
            }),
            Ok(r#"{"name": "Bee", "age": 3}"#.to_string()),
        ]));
        let client = client(service.clone(), 4);

        let outcome = client.extract_chunk(&chunk(), &schema()).await;

        assert_eq!(outcome.attempts, 2);
        assert!(outcome.failure.is_none());
        let result = outcome.result.unwrap();
        assert!(result.complete);
        assert_eq!(result.fields.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quoted_number_fixed_by_corrective_reprompt() {
        let service = Arc::new(Scripted::new(vec![
            Ok(r#"{"name": "Bee", "age": "3"}"#.to_string()),
            Ok(r#"{"name": "Bee", "age": 3}"#.to_string()),
        ]));
        let client = client(service.clone(), 4);

        let outcome = client.extract_chunk(&chunk(), &schema()).await;

        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert!(outcome.failure.is_none());
        let result = outcome.result.unwrap();
        assert!(result.complete);
        assert_eq!(
            result.fields["age"].value,
            crate::models::FieldValue::Number(3.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_type_problem_degrades_to_valid_subset() {
        let service = Arc::new(Scripted::new(vec![
            Ok(r#"{"name": "Bee", "age": "3"}"#.to_string()),
            Ok(r#"{"name": "Bee", "age": "three"}"#.to_string()),
        ]));
        let client = client(service.clone(), 4);

        let outcome = client.extract_chunk(&chunk(), &schema()).await;

        // One corrective re-prompt only, then degrade; never an endless loop.
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.failure.as_ref().unwrap().kind, "SchemaViolation");
        let result = outcome.result.unwrap();
        assert!(!result.complete);
        assert!(result.fields.contains_key("name"));
        assert!(!result.fields.contains_key("age"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_garbage_response_retried_once_then_fails() {
        let service = Arc::new(Scripted::new(vec![
            Ok("not json at all".to_string()),
            Ok("still not json".to_string()),
        ]));
        let client = client(service.clone(), 4);

        let outcome = client.extract_chunk(&chunk(), &schema()).await;

        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert!(outcome.result.is_none());
        assert_eq!(outcome.failure.as_ref().unwrap().kind, "InvalidResponse");
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_fails_immediately() {
        let service = Arc::new(Scripted::new(vec![Err(PipelineError::Service {
            status: 400,
            detail: "bad request".to_string(),
        })]));
        let client = client(service.clone(), 4);

        let outcome = client.extract_chunk(&chunk(), &schema()).await;

        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.failure.as_ref().unwrap().kind, "ServiceError");
    }

    #[test]
    fn test_jitter_is_deterministic_and_bounded() {
        for attempt in 1..5 {
            let a = deterministic_jitter(7, attempt, 250);
            let b = deterministic_jitter(7, attempt, 250);
            assert_eq!(a, b);
            assert!(a <= 250);
        }
    }
}
