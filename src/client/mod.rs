pub mod rest;

use anyhow::Result;
use async_trait::async_trait;

pub use rest::{RestClientConfig, RestJobClient};

/// Lifecycle status of a generation as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl GenerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Processing => "processing",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
            GenerationStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(GenerationStatus::Pending),
            "processing" => Some(GenerationStatus::Processing),
            "completed" => Some(GenerationStatus::Completed),
            "failed" => Some(GenerationStatus::Failed),
            "cancelled" => Some(GenerationStatus::Cancelled),
            _ => None,
        }
    }

    /// Completed, failed, and cancelled admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationStatus::Completed | GenerationStatus::Failed | GenerationStatus::Cancelled
        )
    }
}

/// Canonical record of one execution attempt. `input` always holds the
/// normalized payload that was actually submitted, never raw form
/// state, so a regenerate can replay it verbatim.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub id: String,
    #[serde(default)]
    pub model_id: String,
    pub status: GenerationStatus,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub credits_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// User-supplied metadata attached to a submission.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The account's credit position as the server reports it.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    #[serde(default)]
    pub total_credits: u32,
    #[serde(default)]
    pub subscription_credits: u32,
    #[serde(default)]
    pub purchased_credits: u32,
    #[serde(default)]
    pub promotional_credits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<String>,
}

/// The three operations the engine needs from the execution backend.
/// The REST layer implements this; tests substitute scripted fakes.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submit a run. May return an already-terminal Generation when
    /// the backend completes synchronously.
    async fn submit(
        &self,
        model_id: &str,
        input: &serde_json::Value,
        metadata: &RunMetadata,
    ) -> Result<Generation>;

    /// Fetch a generation's current state by id.
    async fn fetch_status(&self, generation_id: &str) -> Result<Generation>;

    /// Fetch the authoritative credit balance.
    async fn fetch_balance(&self) -> Result<CreditBalance>;
}
