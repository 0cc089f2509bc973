pub mod error;
pub mod normalizer;
pub mod prompt;
pub mod schema;

pub use error::AnalysisError;
pub use normalizer::{parse_analysis, strip_code_fences};
pub use schema::{
    AnalysisResult, KeyPerson, MarketAnalysis, Recommendation, RiskFactor, Severity, TeamAnalysis,
};

use ingest::PitchDeck;
use model::{GenerateRequest, GenerationConfig, GenerativeModel, Part};
use std::sync::Arc;

/// Low temperature keeps the structured output stable between runs.
pub const ANALYSIS_TEMPERATURE: f32 = 0.2;

pub struct Analyzer {
    model: Arc<dyn GenerativeModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Run the structured analysis of a deck. No retry is attempted.
    pub async fn analyze(&self, deck: &PitchDeck) -> Result<AnalysisResult, AnalysisError> {
        let config = GenerationConfig {
            temperature: Some(ANALYSIS_TEMPERATURE),
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(prompt::analysis_schema()),
            ..GenerationConfig::default()
        };
        let request = GenerateRequest::new(vec![
            deck.inline_part(),
            Part::text(prompt::build_analysis_prompt()),
        ])
        .with_config(config);

        tracing::info!(
            doc_id = %deck.doc_id,
            file = %deck.file_name,
            model = self.model.name(),
            "Analyzing pitch deck"
        );

        let response = self.model.generate_content(request).await.map_err(|e| {
            tracing::warn!(doc_id = %deck.doc_id, error = %e, "Pitch deck analysis failed");
            AnalysisError::from(e)
        })?;

        let result = parse_analysis(&response.text())?;
        tracing::info!(
            company = %result.company_name,
            score = result.investment_score,
            recommendation = result.recommendation.as_str(),
            "Pitch deck analysis complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::testing::ScriptedModel;
    use model::{ModelError, ServiceErrorKind};

    fn two_page_deck() -> PitchDeck {
        PitchDeck::from_bytes(
            "acme.pdf",
            b"%PDF-1.7\n1 0 obj << /Type /Pages /Count 2 >> endobj\n%%EOF".to_vec(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_acme() {
        let model = Arc::new(ScriptedModel::new());
        model.push_text(
            r#"{"companyName":"Acme","sector":"FinTech","investmentScore":82,"recommendation":"Buy"}"#,
        );

        let analyzer = Analyzer::new(model.clone());
        let result = analyzer.analyze(&two_page_deck()).await.unwrap();

        assert_eq!(result.company_name, "Acme");
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert!(result.investment_score <= 100);
        assert!(Recommendation::ALL.contains(&result.recommendation));

        let request = &model.requests()[0];
        assert!(request.has_inline_data());
        assert_eq!(request.config.temperature, Some(ANALYSIS_TEMPERATURE));
        assert_eq!(
            request.config.response_mime_type.as_deref(),
            Some("application/json")
        );
        assert!(request.config.response_schema.is_some());
    }

    #[tokio::test]
    async fn test_non_json_response() {
        let model = Arc::new(ScriptedModel::new());
        model.push_text("This deck looks great!");

        let err = Analyzer::new(model).analyze(&two_page_deck()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let model = Arc::new(ScriptedModel::new());
        model.push_error(ModelError::MissingCredential);

        let err = Analyzer::new(model).analyze(&two_page_deck()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));
    }

    #[tokio::test]
    async fn test_service_error_keeps_kind() {
        let model = Arc::new(ScriptedModel::new());
        model.push_error(ModelError::service(Some(403), "forbidden"));

        let err = Analyzer::new(model).analyze(&two_page_deck()).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Service {
                kind: ServiceErrorKind::PermissionDenied,
                ..
            }
        ));
    }
}
