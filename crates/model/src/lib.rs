pub mod config;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod gemini;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::ModelConfig;
pub use conversation::Conversation;
pub use credential::{
    API_KEY_SETTING, Credential, CredentialResolver, CredentialSource, FileSettingsStore,
    MemorySettingsStore, SettingsStore,
};
pub use error::{ModelError, ModelResult, ServiceErrorKind, classify_service_error};
pub use gemini::GeminiClient;
pub use provider::GenerativeModel;
pub use types::{
    Blob, Content, FunctionCall, FunctionDeclaration, FunctionResponse, GenerateRequest,
    GenerationConfig, ModelResponse, Part, Role, Tool, WebSource,
};
