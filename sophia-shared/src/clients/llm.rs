/// Stubbed LLM client. `complete` logs the prompt and returns a canned
/// completion so the agent endpoints work without a model key; a real
/// provider call slots in behind this method without touching callers.
#[derive(Clone)]
pub struct LlmClient {
    model: String,
}

impl LlmClient {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, String> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "llm completion requested");

        Ok(r#"{"analysis":"stubbed completion","confidence":0.0}"#.to_string())
    }
}
