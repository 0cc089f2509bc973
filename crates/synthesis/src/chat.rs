use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::prompt::{build_chat_acknowledgement, build_chat_context};
use extract::AnalysisResult;
use model::{Content, Conversation, GenerationConfig, GenerativeModel, ModelError, Part};

pub const CHAT_TEMPERATURE: f32 = 0.8;

pub const CHAT_APOLOGY: &str = "I'm sorry, I encountered an error processing your question. \
Please try again or rephrase your question.";

/// Keyword to source-tag table for assistant replies.
const SOURCE_TAGS: [(&str, &str); 4] = [
    ("market", "Market Analysis"),
    ("team", "Team Assessment"),
    ("risk", "Risk Factors"),
    ("competitor", "Competitive Landscape"),
];

#[derive(Error, Debug)]
pub enum ChatSendError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Chat turn failed: {0}")]
    Model(#[from] ModelError),

    #[error("Model returned an empty reply")]
    EmptyReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content.into(), Vec::new())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        let content = content.into();
        let sources = extract_sources(&content);
        Self::new(ChatRole::Assistant, content, sources)
    }

    fn new(role: ChatRole, content: String, sources: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
            sources,
        }
    }
}

/// Outcome of one visible chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: ChatMessage,
    pub answer: ChatMessage,
    /// Set when the answer is the apology standing in for a failed turn
    pub error: Option<String>,
}

impl ChatTurn {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Multi-turn Q&A grounded in one analysis.
pub struct ChatSession {
    conversation: Conversation,
    company_name: String,
    transcript: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(model: Arc<dyn GenerativeModel>, analysis: &AnalysisResult) -> Self {
        let history = vec![
            Content::user(vec![Part::text(build_chat_context(analysis))]),
            Content::model(vec![Part::text(build_chat_acknowledgement(analysis))]),
        ];
        let conversation =
            Conversation::new(model, GenerationConfig::with_temperature(CHAT_TEMPERATURE))
                .with_history(history);

        let welcome = ChatMessage {
            sources: Vec::new(),
            ..ChatMessage::assistant(format!(
                "Hi! I've analyzed the pitch deck for {}. I can answer questions about the team, \
                 market, risks, or any other aspect of the analysis. What would you like to know?",
                analysis.company_name
            ))
        };

        Self {
            conversation,
            company_name: analysis.company_name.clone(),
            transcript: vec![welcome],
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Model-side history, including the seeded context turns.
    pub fn history(&self) -> &[Content] {
        self.conversation.history()
    }

    /// Send one message. The model-side history only grows when this succeeds.
    pub async fn send(&mut self, text: &str) -> Result<String, ChatSendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatSendError::EmptyMessage);
        }

        let response = self.conversation.send_text(text).await?;
        let reply = response.text().trim().to_string();
        if reply.is_empty() {
            return Err(ChatSendError::EmptyReply);
        }
        Ok(reply)
    }

    /// Send one message and record both sides in the visible transcript.
    /// A failed turn is answered with an apology so the session stays usable.
    pub async fn ask(&mut self, text: &str) -> ChatTurn {
        let question = ChatMessage::user(text.trim());
        self.transcript.push(question.clone());

        let (answer, error) = match self.send(text).await {
            Ok(reply) => (ChatMessage::assistant(reply), None),
            Err(e) => {
                tracing::warn!(company = %self.company_name, error = %e, "Chat turn failed");
                let apology = ChatMessage {
                    sources: Vec::new(),
                    ..ChatMessage::assistant(CHAT_APOLOGY)
                };
                (apology, Some(e.to_string()))
            }
        };
        self.transcript.push(answer.clone());

        ChatTurn {
            question,
            answer,
            error,
        }
    }
}

/// Source tags for a reply, in table order.
pub fn extract_sources(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    SOURCE_TAGS
        .iter()
        .filter(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, tag)| tag.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::testing::ScriptedModel;
    use model::Role;
    use serde_json::json;

    fn analysis() -> AnalysisResult {
        serde_json::from_value(json!({
            "companyName": "Acme",
            "sector": "FinTech",
            "investmentScore": 82,
            "recommendation": "Buy"
        }))
        .unwrap()
    }

    #[test]
    fn test_new_session_is_seeded() {
        let session = ChatSession::new(Arc::new(ScriptedModel::new()), &analysis());

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert!(history[0].text().contains("Company: Acme"));
        assert_eq!(history[1].role, Role::Model);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, ChatRole::Assistant);
        assert!(transcript[0].content.contains("Acme"));
        assert!(transcript[0].sources.is_empty());
    }

    #[tokio::test]
    async fn test_ask_records_reply_with_sources() {
        let model = Arc::new(ScriptedModel::new());
        model.push_text("The team is strong but market risk is high.");
        let mut session = ChatSession::new(model.clone(), &analysis());

        let turn = session.ask("What about the team?").await;
        assert!(!turn.failed());
        assert_eq!(
            turn.answer.sources,
            vec!["Market Analysis", "Team Assessment", "Risk Factors"]
        );
        assert_eq!(session.transcript().len(), 3);

        // Seeded context is replayed ahead of the question
        let request = &model.requests()[0];
        assert_eq!(request.contents.len(), 3);
        assert_eq!(request.config.temperature, Some(CHAT_TEMPERATURE));
    }

    #[tokio::test]
    async fn test_failed_turn_then_recovers() {
        let model = Arc::new(ScriptedModel::new());
        model.push_error(ModelError::service(Some(503), "backend unavailable"));
        model.push_text("Acme sells payments software.");
        let mut session = ChatSession::new(model.clone(), &analysis());

        let failed = session.ask("What does the company do?").await;
        assert!(failed.failed());
        assert_eq!(failed.answer.content, CHAT_APOLOGY);
        assert!(failed.answer.sources.is_empty());

        let turn = session.ask("What does the company do?").await;
        assert!(!turn.failed());
        assert!(turn.answer.content.contains("Acme"));

        // The failed turn left no trace in the model-side history
        let second = &model.requests()[1];
        assert_eq!(second.contents.len(), 3);
        assert!(second.contents[0].text().contains("Company: Acme"));
        assert_eq!(session.transcript().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let model = Arc::new(ScriptedModel::new());
        let mut session = ChatSession::new(model.clone(), &analysis());

        let err = session.send("   ").await.unwrap_err();
        assert!(matches!(err, ChatSendError::EmptyMessage));
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn test_extract_sources() {
        assert!(extract_sources("Nothing relevant").is_empty());
        assert_eq!(
            extract_sources("Competitors include Stripe"),
            vec!["Competitive Landscape"]
        );
    }
}
