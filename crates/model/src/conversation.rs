use std::sync::Arc;

use crate::error::ModelResult;
use crate::provider::GenerativeModel;
use crate::types::{Content, GenerateRequest, GenerationConfig, ModelResponse, Part, Tool};

/// Multi-turn exchange that replays its history on every call.
///
/// A turn is only committed to the history once the model has answered, so a
/// failed send can simply be retried.
pub struct Conversation {
    model: Arc<dyn GenerativeModel>,
    config: GenerationConfig,
    tools: Vec<Tool>,
    history: Vec<Content>,
}

impl Conversation {
    pub fn new(model: Arc<dyn GenerativeModel>, config: GenerationConfig) -> Self {
        Self {
            model,
            config,
            tools: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    /// Seed prior turns, e.g. a synthetic context exchange.
    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub async fn send(&mut self, parts: Vec<Part>) -> ModelResult<ModelResponse> {
        let turn = Content::user(parts);
        let mut contents = self.history.clone();
        contents.push(turn.clone());

        let request = GenerateRequest {
            contents,
            config: self.config.clone(),
            tools: self.tools.clone(),
        };
        let response = self.model.generate_content(request).await?;

        self.history.push(turn);
        self.history.push(response.content.clone());
        Ok(response)
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> ModelResult<ModelResponse> {
        self.send(vec![Part::text(text)]).await
    }
}
