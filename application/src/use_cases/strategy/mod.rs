//! Debate strategies
//!
//! A strategy drives the rounds of a debate and produces the complete
//! [`DebateResult`]. Shared plumbing (prompt envelope, retrying provider
//! calls, concurrent or streamed dispatch) lives in [`StrategyContext`].

mod judge;
mod round_robin;

pub use judge::JudgeStrategy;
pub use round_robin::{RoundRobinStrategy, synthesis_order};

use super::retry::{RetryPolicy, retry_with_backoff};
use super::run_debate::RunDebateError;
use crate::ports::llm_provider::{GenerationRequest, LlmProvider, ProviderError};
use crate::ports::progress::DebateProgressNotifier;
use crate::ports::transcript::TranscriptWriter;
use async_trait::async_trait;
use futures::future::join_all;
use mars_domain::{
    DebateConfig, DebatePhase, DebatePrompt, DebateResult, LlmResponse, Message, StreamEvent,
    TokenUsage, redact_secrets,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A configured provider taking part in a debate under a participant id
#[derive(Clone)]
pub struct Participant {
    /// `provider` or `provider:model`
    pub id: String,
    pub provider: Arc<dyn LlmProvider>,
}

impl Participant {
    pub fn new(id: impl Into<String>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            id: id.into(),
            provider,
        }
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Orchestrates the rounds of one debate mode
#[async_trait]
pub trait DebateStrategy: Send + Sync {
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<DebateResult, RunDebateError>;
}

/// Everything a strategy needs for one run
pub struct StrategyContext<'a> {
    pub config: &'a DebateConfig,
    /// Participants in configuration order
    pub participants: &'a [Participant],
    pub progress: &'a dyn DebateProgressNotifier,
    pub transcript: &'a dyn TranscriptWriter,
    pub retry: RetryPolicy,
}

impl<'a> StrategyContext<'a> {
    pub fn prompt(&self) -> DebatePrompt<'a> {
        DebatePrompt::new(self.config.prompt(), self.config.context())
    }

    pub fn participant(&self, id: &str) -> Option<&'a Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_ids(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }

    fn is_verbose(&self) -> bool {
        self.config.verbosity().is_verbose()
    }

    /// One provider call with retry.
    ///
    /// Quiet mode retries `generate()`. Verbose mode retries opening the
    /// stream, then drains it chunk by chunk; a stream that breaks midway
    /// is not retried.
    pub async fn get_response(
        &self,
        participant: &Participant,
        messages: Vec<Message>,
        phase: &DebatePhase,
    ) -> Result<LlmResponse, ProviderError> {
        let provider = participant.provider.as_ref();
        let model_override = self.config.model_override(&participant.id);
        let model = model_override.unwrap_or_else(|| provider.default_model());
        let request = GenerationRequest::new(messages, self.config.max_tokens())
            .with_model(model_override.map(str::to_string))
            .with_temperature(self.config.temperature());

        debug!(participant = %participant.id, model, phase = %phase, "Dispatching request");

        let (content, usage) = if self.is_verbose() {
            let handle = retry_with_backoff(&self.retry, &participant.id, || {
                provider.stream(&request)
            })
            .await?;
            // Start and end are always paired once the stream is open
            self.progress.on_stream_start(&participant.id, phase);
            let drained = self.drain_stream(&participant.id, handle).await;
            self.progress.on_stream_end(&participant.id);
            let (content, usage) = drained?;
            (content, usage.unwrap_or_else(|| provider.last_usage()))
        } else {
            let generation = retry_with_backoff(&self.retry, &participant.id, || {
                provider.generate(&request)
            })
            .await?;
            self.progress
                .on_response(&participant.id, &generation.content);
            (generation.content, generation.usage)
        };

        Ok(LlmResponse::new(&participant.id, model, content, usage))
    }

    async fn drain_stream(
        &self,
        participant: &str,
        mut handle: crate::ports::llm_provider::StreamHandle,
    ) -> Result<(String, Option<TokenUsage>), ProviderError> {
        let mut content = String::new();
        let mut usage = None;
        while let Some(event) = handle.next_event().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    self.progress.on_stream_chunk(participant, &chunk);
                    content.push_str(&chunk);
                }
                StreamEvent::Usage(reported) => usage = Some(reported),
                StreamEvent::Done => break,
                StreamEvent::Error(e) => return Err(ProviderError::Stream(e)),
            }
        }
        Ok((content, usage))
    }

    /// A single participant's call, framed as its own phase
    pub async fn single_response(
        &self,
        participant: &Participant,
        messages: Vec<Message>,
        phase: DebatePhase,
    ) -> Result<LlmResponse, ProviderError> {
        if self.is_verbose() {
            return self.get_response(participant, messages, &phase).await;
        }
        self.progress
            .on_phase_start(&phase, std::slice::from_ref(&participant.id));
        let result = self.get_response(participant, messages, &phase).await;
        self.progress.on_phase_complete(&phase);
        result
    }

    /// Dispatch one request per participant and collect the successes.
    ///
    /// Quiet mode runs every call concurrently and waits for all of them;
    /// verbose mode streams them one after another. Failures are reported
    /// per participant and left out of the result.
    pub async fn gather_responses(
        &self,
        requests: Vec<(&Participant, Vec<Message>)>,
        phase: DebatePhase,
    ) -> Vec<LlmResponse> {
        let mut responses = Vec::with_capacity(requests.len());

        if self.is_verbose() {
            for (participant, messages) in requests {
                match self.get_response(participant, messages, &phase).await {
                    Ok(response) => responses.push(response),
                    Err(e) => self.report_failure(&participant.id, &e.to_string()),
                }
            }
            return responses;
        }

        let ids: Vec<String> = requests.iter().map(|(p, _)| p.id.clone()).collect();
        self.progress.on_phase_start(&phase, &ids);

        let outcomes = join_all(
            requests
                .into_iter()
                .map(|(participant, messages)| self.get_response(participant, messages, &phase)),
        )
        .await;
        self.progress.on_phase_complete(&phase);

        for (id, outcome) in ids.iter().zip(outcomes) {
            match outcome {
                Ok(response) => responses.push(response),
                Err(e) => self.report_failure(id, &e.to_string()),
            }
        }
        responses
    }

    /// Log and surface a participant failure with secrets masked
    pub fn report_failure(&self, participant: &str, error: &str) {
        let error = redact_secrets(error);
        warn!(participant = %participant, "Participant failed: {}", error);
        self.progress.on_participant_error(participant, &error);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted providers and recording doubles shared by strategy tests

    use super::*;
    use crate::ports::llm_provider::Generation;
    use crate::ports::transcript::TranscriptError;
    use mars_domain::{AttributionReport, CostReport, DebateRound};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays scripted results in order
    pub struct ScriptedProvider {
        name: String,
        model: String,
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        pub requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(name: &str, script: Vec<Result<&str, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                model: format!("{name}-model"),
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_user_message(&self) -> String {
            self.requests
                .lock()
                .unwrap()
                .last()
                .and_then(|r| r.messages.last())
                .map(|m| m.content.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn default_model(&self) -> &str {
            &self.model
        }

        fn last_usage(&self) -> TokenUsage {
            TokenUsage::new(10, 20)
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<Generation, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("(no more responses)".to_string()));
            next.map(|content| Generation::new(content, TokenUsage::new(10, 20)))
        }
    }

    /// Progress notifier that records every event as a string
    #[derive(Default)]
    pub struct RecordingProgress {
        pub events: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter(|e| e.starts_with("error:"))
                .collect()
        }
    }

    impl DebateProgressNotifier for RecordingProgress {
        fn on_round_start(&self, round: u32) {
            self.record(format!("round:{round}"));
        }

        fn on_phase_start(&self, phase: &DebatePhase, participants: &[String]) {
            self.record(format!("start:{phase}:{}", participants.join(",")));
        }

        fn on_phase_complete(&self, phase: &DebatePhase) {
            self.record(format!("complete:{phase}"));
        }

        fn on_participant_error(&self, participant: &str, error: &str) {
            self.record(format!("error:{participant}:{error}"));
        }

        fn on_convergence(&self, reason: &str) {
            self.record(format!("reason:{reason}"));
        }

        fn on_stream_start(&self, participant: &str, _phase: &DebatePhase) {
            self.record(format!("stream_start:{participant}"));
        }

        fn on_stream_chunk(&self, participant: &str, chunk: &str) {
            self.record(format!("chunk:{participant}:{chunk}"));
        }

        fn on_stream_end(&self, participant: &str) {
            self.record(format!("stream_end:{participant}"));
        }
    }

    /// Transcript writer that records which artifacts were written
    #[derive(Default)]
    pub struct RecordingTranscript {
        pub writes: Mutex<Vec<String>>,
    }

    impl RecordingTranscript {
        fn record(&self, entry: String) -> Result<(), TranscriptError> {
            self.writes.lock().unwrap().push(entry);
            Ok(())
        }

        pub fn writes(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl TranscriptWriter for RecordingTranscript {
        fn write_prompt(&self, _prompt: &str, _context: &[String]) -> Result<(), TranscriptError> {
            self.record("prompt".into())
        }

        fn write_round(&self, round: &DebateRound) -> Result<(), TranscriptError> {
            self.record(format!("round-{}", round.round_number))
        }

        fn write_convergence(&self, _reason: &str) -> Result<(), TranscriptError> {
            self.record("convergence".into())
        }

        fn write_resolution(&self, _resolution: &str) -> Result<(), TranscriptError> {
            self.record("resolution".into())
        }

        fn write_final(&self, _answer: &str) -> Result<(), TranscriptError> {
            self.record("final".into())
        }

        fn write_attribution(&self, _report: &AttributionReport) -> Result<(), TranscriptError> {
            self.record("attribution".into())
        }

        fn write_costs(&self, _report: &CostReport) -> Result<(), TranscriptError> {
            self.record("costs".into())
        }
    }

    pub fn participant(provider: &Arc<ScriptedProvider>) -> Participant {
        Participant::new(provider.name(), provider.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::ports::llm_provider::{Generation, StreamHandle};
    use crate::ports::progress::NoProgress;
    use crate::ports::transcript::NoTranscript;
    use mars_domain::Verbosity;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;

    /// Answers after a fixed delay and logs when it finished
    struct DelayedProvider {
        name: String,
        delay: Duration,
        finished: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LlmProvider for DelayedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn default_model(&self) -> &str {
            "delayed-1"
        }

        fn last_usage(&self) -> TokenUsage {
            TokenUsage::default()
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Generation, ProviderError> {
            tokio::time::sleep(self.delay).await;
            self.finished.lock().unwrap().push(self.name.clone());
            Ok(Generation::new(
                format!("{} answer", self.name),
                TokenUsage::new(1, 1),
            ))
        }
    }

    /// Replays fixed stream events, or fails to open the stream
    struct StreamingProvider {
        events: Vec<StreamEvent>,
        open_error: Option<ProviderError>,
        opens: AtomicUsize,
    }

    impl StreamingProvider {
        fn new(events: Vec<StreamEvent>, open_error: Option<ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                events,
                open_error,
                opens: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for StreamingProvider {
        fn name(&self) -> &str {
            "openai"
        }

        fn default_model(&self) -> &str {
            "gpt-4.1"
        }

        fn last_usage(&self) -> TokenUsage {
            TokenUsage::default()
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Generation, ProviderError> {
            Err(ProviderError::Other("generate is not used in verbose mode".into()))
        }

        async fn stream(
            &self,
            _request: &GenerationRequest,
        ) -> Result<StreamHandle, ProviderError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.open_error {
                return Err(err.clone());
            }
            let (tx, rx) = mpsc::channel(self.events.len().max(1));
            for event in &self.events {
                tx.send(event.clone()).await.unwrap();
            }
            Ok(StreamHandle::new(rx))
        }
    }

    fn context<'a>(
        config: &'a DebateConfig,
        participants: &'a [Participant],
        progress: &'a dyn DebateProgressNotifier,
    ) -> StrategyContext<'a> {
        StrategyContext {
            config,
            participants,
            progress,
            transcript: &NoTranscript,
            retry: RetryPolicy::new(2, Duration::ZERO),
        }
    }

    fn verbose_config() -> DebateConfig {
        DebateConfig::builder("q", ["openai", "anthropic"])
            .verbosity(Verbosity::Verbose)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_quiet_round_dispatches_all_participants_at_once() {
        let finished = Arc::new(Mutex::new(Vec::new()));
        let delayed = |name: &str, millis: u64| {
            Participant::new(
                name,
                Arc::new(DelayedProvider {
                    name: name.to_string(),
                    delay: Duration::from_millis(millis),
                    finished: finished.clone(),
                }),
            )
        };
        let participants = vec![delayed("slow", 400), delayed("fast", 250)];
        let config = DebateConfig::builder("q", ["slow", "fast"])
            .build()
            .unwrap();
        let ctx = context(&config, &participants, &NoProgress);

        let started = Instant::now();
        let responses = ctx
            .gather_responses(
                participants
                    .iter()
                    .map(|p| (p, vec![Message::user("q")]))
                    .collect(),
                DebatePhase::Round(1),
            )
            .await;
        let elapsed = started.elapsed();

        // Sequential dispatch would take at least 650ms
        assert!(elapsed < Duration::from_millis(600), "took {elapsed:?}");
        assert_eq!(*finished.lock().unwrap(), vec!["fast", "slow"]);

        let pairs: Vec<(&str, &str)> = responses
            .iter()
            .map(|r| (r.participant_id.as_str(), r.content.as_str()))
            .collect();
        assert_eq!(pairs, vec![("slow", "slow answer"), ("fast", "fast answer")]);
    }

    #[tokio::test]
    async fn test_broken_stream_is_a_participant_failure_and_not_retried() {
        let openai = StreamingProvider::new(
            vec![
                StreamEvent::Delta("partial".into()),
                StreamEvent::Error("connection reset".into()),
            ],
            None,
        );
        let anthropic = ScriptedProvider::new("anthropic", vec![Ok("anthropic answer")]);
        let participants = vec![Participant::new("openai", openai.clone()), participant(&anthropic)];
        let config = verbose_config();
        let progress = RecordingProgress::default();
        let ctx = context(&config, &participants, &progress);

        let responses = ctx
            .gather_responses(
                participants
                    .iter()
                    .map(|p| (p, vec![Message::user("q")]))
                    .collect(),
                DebatePhase::Round(1),
            )
            .await;

        let ids: Vec<&str> = responses.iter().map(|r| r.participant_id.as_str()).collect();
        assert_eq!(ids, vec!["anthropic"]);
        // "connection" is a transient marker, yet a broken stream is never reopened
        assert_eq!(openai.opens.load(Ordering::SeqCst), 1);
        assert_eq!(
            progress.errors(),
            vec!["error:openai:Stream error: connection reset".to_string()]
        );

        let events = progress.events();
        assert!(events.contains(&"chunk:openai:partial".to_string()));
        assert!(events.contains(&"stream_start:openai".to_string()));
        assert!(events.contains(&"stream_end:openai".to_string()));
    }

    #[tokio::test]
    async fn test_failed_stream_open_leaves_no_stream_header() {
        let openai = StreamingProvider::new(
            Vec::new(),
            Some(ProviderError::Auth("invalid key".into())),
        );
        let participants = vec![Participant::new("openai", openai.clone())];
        let config = DebateConfig::builder("q", ["openai"])
            .verbosity(Verbosity::Verbose)
            .build()
            .unwrap();
        let progress = RecordingProgress::default();
        let ctx = context(&config, &participants, &progress);

        let responses = ctx
            .gather_responses(
                vec![(&participants[0], vec![Message::user("q")])],
                DebatePhase::Round(1),
            )
            .await;

        assert!(responses.is_empty());
        assert_eq!(openai.opens.load(Ordering::SeqCst), 1);
        assert_eq!(progress.errors().len(), 1);
        assert!(
            !progress
                .events()
                .iter()
                .any(|e| e.starts_with("stream_start:") || e.starts_with("stream_end:"))
        );
    }
}
