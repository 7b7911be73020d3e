mod classify;

#[cfg(test)]
mod tests;

pub use classify::{
    CANCELLED_MESSAGE, EMPTY_INPUT_MESSAGE, RunErrorKind, TIMEOUT_MESSAGE, classify_error,
};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{Generation, GenerationStatus, JobClient, RunMetadata};

/// How many terminal results the controller remembers for the
/// recent-results cache.
const RECENT_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Preparing,
    Submitting,
    Processing,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// Legal moves of the run state machine. Transitions are monotonic
/// forward; terminal states admit nothing.
pub fn can_transition(from: RunState, to: RunState) -> bool {
    if from == to {
        return !from.is_terminal();
    }
    match from {
        RunState::Idle => matches!(to, RunState::Preparing),
        RunState::Preparing => matches!(to, RunState::Submitting),
        RunState::Submitting => matches!(
            to,
            RunState::Processing | RunState::Completed | RunState::Failed
        ),
        RunState::Processing => matches!(to, RunState::Completed | RunState::Failed),
        RunState::Completed | RunState::Failed => false,
    }
}

/// Injected delay source so tests can drive the poll loop without
/// wall-clock waiting.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, interval: Duration);
}

pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 60,
        }
    }
}

/// Owns one run lifecycle at a time: submission, the bounded poll
/// loop, terminal-state detection, and retry/regenerate. Dropping the
/// controller (or its in-flight future) stops polling without
/// notifying the server and without forcing a failed state.
pub struct ExecutionController {
    client: Arc<dyn JobClient>,
    scheduler: Arc<dyn Scheduler>,
    poll: PollConfig,
    state: RunState,
    current: Option<Generation>,
    recent: Vec<Generation>,
}

impl ExecutionController {
    pub fn new(client: Arc<dyn JobClient>, scheduler: Arc<dyn Scheduler>, poll: PollConfig) -> Self {
        Self {
            client,
            scheduler,
            poll,
            state: RunState::Idle,
            current: None,
            recent: Vec::new(),
        }
    }

    pub fn with_defaults(client: Arc<dyn JobClient>) -> Self {
        Self::new(client, Arc::new(TokioScheduler), PollConfig::default())
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn current(&self) -> Option<&Generation> {
        self.current.as_ref()
    }

    pub fn recent(&self) -> &[Generation] {
        &self.recent
    }

    fn advance(&mut self, to: RunState) {
        if can_transition(self.state, to) {
            self.state = to;
        } else {
            // Superseded or late event; never downgrade.
            warn!(from = ?self.state, to = ?to, "ignoring illegal run state transition");
        }
    }

    /// Submit a validated payload and drive it to a terminal outcome.
    /// An empty payload fails locally without touching the network and
    /// leaves the machine in `Idle`.
    pub async fn submit(
        &mut self,
        model_id: &str,
        input: serde_json::Value,
        metadata: RunMetadata,
    ) -> Result<Generation> {
        // Rejecting an empty payload must not disturb the prior
        // attempt's record; the reset happens only once the payload
        // is known to be submittable.
        if input.as_object().is_none_or(|o| o.is_empty()) {
            bail!(EMPTY_INPUT_MESSAGE);
        }

        // A new submission discards whatever the prior attempt left
        // behind; its poll future is already dropped by exclusivity.
        self.state = RunState::Idle;
        self.current = None;

        self.advance(RunState::Preparing);
        self.advance(RunState::Submitting);
        info!(%model_id, "submitting generation");

        match self.client.submit(model_id, &input, &metadata).await {
            Ok(r#gen) => {
                let r#gen = normalize_submission(r#gen, model_id, &input, &metadata);
                if r#gen.status.is_terminal() {
                    self.apply_terminal(r#gen);
                } else {
                    self.current = Some(r#gen);
                    self.advance(RunState::Processing);
                    self.poll_until_terminal().await;
                }
            }
            Err(err) => {
                let (kind, message) = classify_error(&err);
                warn!(%model_id, ?kind, "submission failed: {message}");
                let failed = local_failed_generation(model_id, &input, &metadata, message);
                self.current = Some(failed);
                self.advance(RunState::Failed);
            }
        }

        self.finish()
    }

    /// Re-issue a submission from a prior terminal generation, reusing
    /// its stored input payload and metadata exactly. Never re-derived
    /// from live form state.
    pub async fn regenerate(&mut self) -> Result<Generation> {
        let prior = self
            .current
            .clone()
            .ok_or_else(|| anyhow!("no generation to regenerate"))?;
        if !prior.status.is_terminal() {
            bail!("generation is still running");
        }
        let metadata = RunMetadata {
            title: prior.title.clone(),
            tags: prior.tags.clone(),
        };
        self.submit(&prior.model_id, prior.input.clone(), metadata)
            .await
    }

    /// Idempotent favorite flip on the current result, mirrored into
    /// the recent-results cache. Never touches status, input, or
    /// output.
    pub fn toggle_favorite(&mut self) -> Option<bool> {
        let current = self.current.as_mut()?;
        current.is_favorite = !current.is_favorite;
        let (id, fav) = (current.id.clone(), current.is_favorite);
        if let Some(cached) = self.recent.iter_mut().find(|g| g.id == id) {
            cached.is_favorite = fav;
        }
        Some(fav)
    }

    async fn poll_until_terminal(&mut self) {
        let mut attempts: u32 = 0;
        loop {
            if self.state != RunState::Processing {
                return;
            }
            if attempts >= self.poll.max_attempts {
                let mut timed_out = match self.current.take() {
                    Some(r#gen) => r#gen,
                    None => return,
                };
                warn!(id = %timed_out.id, attempts, "poll budget exhausted");
                timed_out.status = GenerationStatus::Failed;
                timed_out.error_message = Some(TIMEOUT_MESSAGE.to_string());
                self.current = Some(timed_out);
                self.advance(RunState::Failed);
                return;
            }

            self.scheduler.sleep(self.poll.interval).await;
            attempts += 1;

            let Some(id) = self.current.as_ref().map(|g| g.id.clone()) else {
                return;
            };
            match self.client.fetch_status(&id).await {
                Ok(update) => {
                    // Stale guard: apply only while still processing.
                    if self.state != RunState::Processing {
                        return;
                    }
                    let update = self.with_input_fallback(update);
                    if update.status.is_terminal() {
                        self.apply_terminal(update);
                        return;
                    }
                    self.current = Some(update);
                }
                Err(err) => {
                    // Transient failures consume an attempt but never
                    // abort the loop.
                    debug!(%id, attempt = attempts, "poll fetch failed: {err:#}");
                }
            }
        }
    }

    fn apply_terminal(&mut self, mut r#gen: Generation) {
        match r#gen.status {
            GenerationStatus::Completed => {
                info!(id = %r#gen.id, credits = r#gen.credits_used, "generation completed");
                self.current = Some(r#gen.clone());
                self.advance(RunState::Completed);
                self.push_recent(r#gen);
            }
            GenerationStatus::Failed => {
                if r#gen.error_message.is_none() {
                    r#gen.error_message = Some("Generation failed".to_string());
                }
                warn!(id = %r#gen.id, "generation failed: {}", r#gen.error_message.as_deref().unwrap_or_default());
                self.current = Some(r#gen);
                self.advance(RunState::Failed);
            }
            GenerationStatus::Cancelled => {
                r#gen.error_message = Some(CANCELLED_MESSAGE.to_string());
                self.current = Some(r#gen);
                self.advance(RunState::Failed);
            }
            GenerationStatus::Pending | GenerationStatus::Processing => {
                warn!(id = %r#gen.id, "apply_terminal called with non-terminal status");
                self.current = Some(r#gen);
            }
        }
    }

    /// Servers echo the submitted payload back; if one omits it, keep
    /// the copy we already hold so regenerate stays reproducible.
    fn with_input_fallback(&self, mut update: Generation) -> Generation {
        if update.input.is_null()
            && let Some(prior) = self.current.as_ref()
        {
            update.input = prior.input.clone();
        }
        update
    }

    fn push_recent(&mut self, r#gen: Generation) {
        self.recent.retain(|g| g.id != r#gen.id);
        self.recent.insert(0, r#gen);
        self.recent.truncate(RECENT_CAP);
    }

    fn finish(&mut self) -> Result<Generation> {
        self.current
            .clone()
            .ok_or_else(|| anyhow!("submission produced no generation record"))
    }
}

fn local_failed_generation(
    model_id: &str,
    input: &serde_json::Value,
    metadata: &RunMetadata,
    message: String,
) -> Generation {
    Generation {
        id: Uuid::new_v4().to_string(),
        model_id: model_id.to_string(),
        status: GenerationStatus::Failed,
        input: input.clone(),
        output: None,
        output_url: None,
        output_urls: None,
        error_message: Some(message),
        credits_used: 0,
        execution_time_ms: None,
        title: metadata.title.clone(),
        tags: metadata.tags.clone(),
        is_favorite: false,
        created_at: None,
    }
}

/// Fill fields a minimal backend response may omit so the stored
/// record is self-contained.
fn normalize_submission(
    mut r#gen: Generation,
    model_id: &str,
    input: &serde_json::Value,
    metadata: &RunMetadata,
) -> Generation {
    if r#gen.model_id.is_empty() {
        r#gen.model_id = model_id.to_string();
    }
    if r#gen.input.is_null() {
        r#gen.input = input.clone();
    }
    if r#gen.title.is_none() {
        r#gen.title = metadata.title.clone();
    }
    if r#gen.tags.is_empty() {
        r#gen.tags = metadata.tags.clone();
    }
    r#gen
}
