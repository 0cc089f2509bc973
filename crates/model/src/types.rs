use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Model,
}

/// Binary payload sent inline with a request (base64 encoded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// One element of a turn. Matches the wire shape where exactly one key is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    /// Any part kind not modelled above (code execution, bare thought
    /// signatures). Kept verbatim so replayed history matches the wire.
    Other(Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Part::FunctionResponse {
            function_response: FunctionResponse {
                name: name.into(),
                response,
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// All text parts joined in order.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl GenerationConfig {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_declarations: Option<Vec<FunctionDeclaration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl Tool {
    pub fn functions(declarations: Vec<FunctionDeclaration>) -> Self {
        Self {
            function_declarations: Some(declarations),
            google_search: None,
        }
    }

    /// Search-grounded generation.
    pub fn google_search() -> Self {
        Self {
            function_declarations: None,
            google_search: Some(GoogleSearch {}),
        }
    }

    pub fn is_google_search(&self) -> bool {
        self.google_search.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub config: GenerationConfig,
    pub tools: Vec<Tool>,
}

impl GenerateRequest {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content::user(parts)],
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn has_inline_data(&self) -> bool {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .any(|p| matches!(p, Part::InlineData { .. }))
    }

    pub fn uses_google_search(&self) -> bool {
        self.tools.iter().any(Tool::is_google_search)
    }

    pub fn declares_function(&self, name: &str) -> bool {
        self.tools
            .iter()
            .filter_map(|t| t.function_declarations.as_ref())
            .flatten()
            .any(|d| d.name == name)
    }

    /// Text of every part in every turn, for assertions and routing.
    pub fn all_text(&self) -> String {
        self.contents
            .iter()
            .map(Content::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A single candidate returned by the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: Content,
    pub finish_reason: Option<String>,
    pub grounding_sources: Vec<WebSource>,
}

impl ModelResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: Content::model(vec![Part::text(text)]),
            finish_reason: Some("STOP".to_string()),
            grounding_sources: Vec::new(),
        }
    }

    pub fn from_function_calls(calls: Vec<FunctionCall>) -> Self {
        let parts = calls
            .into_iter()
            .map(|function_call| Part::FunctionCall { function_call })
            .collect();
        Self {
            content: Content::model(parts),
            finish_reason: Some("STOP".to_string()),
            grounding_sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<WebSource>) -> Self {
        self.grounding_sources = sources;
        self
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall { function_call } => Some(function_call),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parts_use_wire_keys() {
        let parts = vec![
            Part::text("hello"),
            Part::inline_data("application/pdf", "JVBERi0="),
            Part::function_response("verify_company_claim", json!({"verified": true})),
        ];
        let value = serde_json::to_value(&parts).unwrap();

        assert_eq!(value[0], json!({"text": "hello"}));
        assert_eq!(value[1]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(value[2]["functionResponse"]["name"], "verify_company_claim");
    }

    #[test]
    fn test_response_parts_with_extra_fields() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"text": "thinking done", "thought": false},
                {"functionCall": {"name": "verify_company_claim", "args": {"claim": "x"}}, "thoughtSignature": "abc"}
            ]
        }))
        .unwrap();

        let response = ModelResponse {
            content,
            finish_reason: None,
            grounding_sources: Vec::new(),
        };
        assert_eq!(response.text(), "thinking done");
        assert_eq!(response.function_calls().len(), 1);
        assert_eq!(response.function_calls()[0].args["claim"], "x");
    }

    #[test]
    fn test_unmodelled_parts_are_tolerated() {
        let raw = json!([
            {"thought": true, "thoughtSignature": "sig"},
            {"executableCode": {"language": "PYTHON", "code": "print(1)"}},
            {"text": "Acme has three competitors."}
        ]);
        let parts: Vec<Part> = serde_json::from_value(raw.clone()).unwrap();
        assert!(matches!(parts[0], Part::Other(_)));
        assert!(matches!(parts[1], Part::Other(_)));

        let response = ModelResponse {
            content: Content::model(parts.clone()),
            finish_reason: None,
            grounding_sources: Vec::new(),
        };
        assert_eq!(response.text(), "Acme has three competitors.");
        assert!(response.function_calls().is_empty());

        // Replayed history keeps the original shape
        assert_eq!(serde_json::to_value(&parts).unwrap(), raw);
    }

    #[test]
    fn test_google_search_tool_shape() {
        let value = serde_json::to_value(Tool::google_search()).unwrap();
        assert_eq!(value, json!({"googleSearch": {}}));
    }

    #[test]
    fn test_request_inspection() {
        let request = GenerateRequest::new(vec![Part::inline_data("application/pdf", "AA==")])
            .with_tools(vec![Tool::google_search()]);
        assert!(request.has_inline_data());
        assert!(request.uses_google_search());
        assert!(!request.declares_function("verify_company_claim"));
    }
}
