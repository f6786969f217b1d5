use std::time::Duration;

/// Council roster and timing configuration, threaded explicitly into
/// [`crate::Council::new`] rather than living in process-wide state.
#[derive(Debug, Clone)]
pub struct CouncilConfig {
    /// Models queried in Stage 1 and Stage 2, in fan-out order.
    pub council_models: Vec<String>,
    /// Model performing the Stage-3 synthesis; may also sit on the council.
    pub chairman_model: String,
    /// Fast model used for conversation title generation.
    pub title_model: String,
    /// Per-model timeout for Stage 1/2/3 invocations.
    pub model_query_timeout: Duration,
    /// Timeout for title generation.
    pub title_timeout: Duration,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            council_models: vec![
                "openai/gpt-5.1".to_string(),
                "google/gemini-3-pro-preview".to_string(),
                "anthropic/claude-sonnet-4.5".to_string(),
                "x-ai/grok-4".to_string(),
            ],
            chairman_model: "google/gemini-3-pro-preview".to_string(),
            title_model: "google/gemini-2.5-flash".to_string(),
            model_query_timeout: Duration::from_secs(120),
            title_timeout: Duration::from_secs(30),
        }
    }
}
