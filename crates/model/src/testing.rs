//! In-process model doubles that never touch the network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{ModelError, ModelResult};
use crate::provider::GenerativeModel;
use crate::types::{GenerateRequest, ModelResponse};

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<ModelResult<ModelResponse>>>,
    fallback: Mutex<Option<ModelResponse>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: ModelResponse) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(response));
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(ModelResponse::from_text(text));
    }

    pub fn push_error(&self, error: ModelError) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Answer with `response` once the script runs out.
    pub fn repeat(&self, response: ModelResponse) {
        *self.fallback.lock().unwrap_or_else(|e| e.into_inner()) = Some(response);
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_content(&self, request: GenerateRequest) -> ModelResult<ModelResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(result) => result,
            None => self
                .fallback
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
                .ok_or_else(|| ModelError::malformed("script exhausted")),
        }
    }
}

type Handler = dyn Fn(&GenerateRequest) -> ModelResult<ModelResponse> + Send + Sync;

/// Routes each request through a closure, for callers issuing concurrent calls.
pub struct FnModel {
    handler: Box<Handler>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl FnModel {
    pub fn new(
        handler: impl Fn(&GenerateRequest) -> ModelResult<ModelResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl GenerativeModel for FnModel {
    fn name(&self) -> &str {
        "fn"
    }

    async fn generate_content(&self, request: GenerateRequest) -> ModelResult<ModelResponse> {
        let result = (self.handler)(&request);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        result
    }
}
