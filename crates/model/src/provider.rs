use async_trait::async_trait;

use crate::error::ModelResult;
use crate::types::{GenerateRequest, ModelResponse};

/// The endpoint contract every AI call in the workspace depends on.
///
/// Implementations must support multimodal input, schema-constrained JSON
/// output, function calling across turns and search grounding. Multi-turn
/// chat is layered on top by [`crate::Conversation`].
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier, for logging.
    fn name(&self) -> &str;

    async fn generate_content(&self, request: GenerateRequest) -> ModelResult<ModelResponse>;
}
