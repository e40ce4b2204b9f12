//! Urgency scoring for email content.

use std::sync::Arc;

use super::prompts::{build_urgency_prompt, clip, URGENCY_BODY_CHARS, URGENCY_SYSTEM_PROMPT};
use super::PipelineError;
use crate::llm::{ChatMessage, LlmClient};

/// Collapse a free-text model response to one of the three levels.
/// Containment check, not equality: "Urgency: HIGH priority" is high.
/// Anything without "high" or "medium" is low.
pub fn normalize_urgency(response: &str) -> &'static str {
    let lower = response.trim().to_lowercase();
    if lower.contains("high") {
        "high"
    } else if lower.contains("medium") {
        "medium"
    } else {
        "low"
    }
}

pub struct UrgencyScorer {
    llm: Arc<dyn LlmClient>,
}

impl UrgencyScorer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Score an email body. The model sees at most the first
    /// [`URGENCY_BODY_CHARS`] characters plus the intent.
    pub async fn score(&self, body: &str, intent: &str) -> Result<&'static str, PipelineError> {
        let window = clip(body, URGENCY_BODY_CHARS);
        let messages = [
            ChatMessage::system(URGENCY_SYSTEM_PROMPT),
            ChatMessage::user(build_urgency_prompt(window, intent)),
        ];
        let response = self.llm.chat(&messages, 0.7).await?;
        Ok(normalize_urgency(&response))
    }
}
