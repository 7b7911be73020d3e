
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::client::{CreditBalance, Generation, GenerationStatus, JobClient, RunMetadata};
use crate::execution::Scheduler;

/// Scripted backend: submit and status responses are consumed in
/// order; once the status script runs dry, `fallback_status` repeats.
pub(crate) struct FakeClient {
    pub submit_script: Mutex<VecDeque<Result<Generation>>>,
    pub status_script: Mutex<VecDeque<Result<Generation>>>,
    pub fallback_status: Mutex<Option<Generation>>,
    pub submit_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub last_submit: Mutex<Option<(String, serde_json::Value, RunMetadata)>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            submit_script: Mutex::new(VecDeque::new()),
            status_script: Mutex::new(VecDeque::new()),
            fallback_status: Mutex::new(None),
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            last_submit: Mutex::new(None),
        }
    }

    pub fn script_submit(&self, result: Result<Generation>) {
        self.submit_script.lock().unwrap().push_back(result);
    }

    pub fn script_status(&self, result: Result<Generation>) {
        self.status_script.lock().unwrap().push_back(result);
    }

    pub fn set_fallback_status(&self, r#gen: Generation) {
        *self.fallback_status.lock().unwrap() = Some(r#gen);
    }

    pub fn submits(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobClient for FakeClient {
    async fn submit(
        &self,
        model_id: &str,
        input: &serde_json::Value,
        metadata: &RunMetadata,
    ) -> Result<Generation> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_submit.lock().unwrap() =
            Some((model_id.to_string(), input.clone(), metadata.clone()));
        self.submit_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted submit response")))
    }

    async fn fetch_status(&self, _generation_id: &str) -> Result<Generation> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.status_script.lock().unwrap().pop_front() {
            return result;
        }
        self.fallback_status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no scripted status response"))
    }

    async fn fetch_balance(&self) -> Result<CreditBalance> {
        Ok(CreditBalance::default())
    }
}

/// Resolves every delay immediately while counting them, so the
/// 60-attempt budget is verifiable without wall-clock waiting.
pub(crate) struct InstantScheduler {
    pub sleeps: AtomicU32,
}

impl InstantScheduler {
    pub fn new() -> Self {
        Self {
            sleeps: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Scheduler for InstantScheduler {
    async fn sleep(&self, _interval: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}

pub(crate) fn generation(id: &str, status: GenerationStatus) -> Generation {
    Generation {
        id: id.to_string(),
        model_id: "sdxl".to_string(),
        status,
        input: serde_json::json!({ "prompt": "a cat" }),
        output: None,
        output_url: None,
        output_urls: None,
        error_message: None,
        credits_used: 4,
        execution_time_ms: None,
        title: None,
        tags: Vec::new(),
        is_favorite: false,
        created_at: None,
    }
}
