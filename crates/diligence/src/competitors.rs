use std::sync::Arc;

use crate::prompt::build_competitor_prompt;
use model::{GenerateRequest, GenerationConfig, GenerativeModel, ModelResult, Part, Tool, WebSource};

#[derive(Clone)]
pub struct CompetitorResearcher {
    model: Arc<dyn GenerativeModel>,
}

impl CompetitorResearcher {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Search-grounded competitive landscape, as prose with citations.
    ///
    /// Errors are returned as-is; callers treat this enrichment as best effort.
    pub async fn research(&self, company_name: &str, sector: &str) -> ModelResult<String> {
        let request = GenerateRequest::new(vec![Part::text(build_competitor_prompt(
            company_name,
            sector,
        ))])
        .with_config(GenerationConfig::default())
        .with_tools(vec![Tool::google_search()]);

        let response = self.model.generate_content(request).await?;
        let text = response.text();

        tracing::info!(
            company = company_name,
            sources = response.grounding_sources.len(),
            "Competitor intelligence retrieved"
        );

        Ok(with_sources(text.trim(), &response.grounding_sources))
    }
}

/// Append grounding citations as a markdown list, skipping ones already linked.
fn with_sources(text: &str, sources: &[WebSource]) -> String {
    let mut seen = Vec::new();
    let mut listing = String::new();

    for source in sources {
        if text.contains(&source.uri) || seen.contains(&source.uri) {
            continue;
        }
        seen.push(source.uri.clone());
        let title = source.title.as_deref().unwrap_or(&source.uri);
        listing.push_str(&format!("{}. [{}]({})\n", seen.len(), title, source.uri));
    }

    if listing.is_empty() {
        return text.to_string();
    }
    format!("{}\n\n**Sources:**\n{}", text, listing.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::testing::ScriptedModel;
    use model::{ModelError, ModelResponse};

    #[tokio::test]
    async fn test_research_enables_search_and_cites() {
        let model = Arc::new(ScriptedModel::new());
        model.push(
            ModelResponse::from_text("Stripe and Adyen lead the market.").with_sources(vec![
                WebSource {
                    uri: "https://news.example/stripe".to_string(),
                    title: Some("Stripe raises".to_string()),
                },
                WebSource {
                    uri: "https://news.example/stripe".to_string(),
                    title: Some("duplicate".to_string()),
                },
            ]),
        );

        let text = CompetitorResearcher::new(model.clone())
            .research("Acme", "FinTech")
            .await
            .unwrap();

        assert!(text.starts_with("Stripe and Adyen lead the market."));
        assert!(text.contains("1. [Stripe raises](https://news.example/stripe)"));
        assert!(!text.contains("duplicate"));
        assert!(model.requests()[0].uses_google_search());
    }

    #[tokio::test]
    async fn test_research_error_propagates() {
        let model = Arc::new(ScriptedModel::new());
        model.push_error(ModelError::service(None, "connection reset"));

        let result = CompetitorResearcher::new(model).research("Acme", "FinTech").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_no_sources_leaves_text() {
        assert_eq!(with_sources("plain", &[]), "plain");
    }
}
