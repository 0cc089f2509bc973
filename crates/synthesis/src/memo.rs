use std::sync::Arc;

use crate::prompt::{MEMO_SECTIONS, build_memo_prompt};
use diligence::RedFlagReport;
use extract::AnalysisResult;
use model::{GenerateRequest, GenerationConfig, GenerativeModel, ModelError, ModelResult, Part};

pub const MEMO_TEMPERATURE: f32 = 0.4;
pub const MEMO_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Drafts the investment committee memo from whatever results are available.
#[derive(Clone)]
pub struct MemoSynthesizer {
    model: Arc<dyn GenerativeModel>,
}

impl MemoSynthesizer {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Generate a fresh memo. Nothing is cached; regenerating calls this again.
    pub async fn generate(
        &self,
        analysis: &AnalysisResult,
        competitors: Option<&str>,
        red_flags: Option<&RedFlagReport>,
    ) -> ModelResult<String> {
        let request = GenerateRequest::new(vec![Part::text(build_memo_prompt(
            analysis,
            competitors,
            red_flags,
        ))])
        .with_config(GenerationConfig {
            temperature: Some(MEMO_TEMPERATURE),
            max_output_tokens: Some(MEMO_MAX_OUTPUT_TOKENS),
            ..Default::default()
        });

        let response = self.model.generate_content(request).await?;
        let memo = response.text().trim().to_string();
        if memo.is_empty() {
            return Err(ModelError::malformed("memo response contained no text"));
        }

        let missing = missing_sections(&memo);
        if !missing.is_empty() {
            tracing::warn!(
                company = %analysis.company_name,
                missing = ?missing,
                "Memo is missing template sections"
            );
        }

        tracing::info!(
            company = %analysis.company_name,
            chars = memo.len(),
            has_competitors = competitors.is_some(),
            has_red_flags = red_flags.is_some(),
            "Investment memo generated"
        );

        Ok(memo)
    }
}

/// Template headers with no matching `##` line in the memo.
pub fn missing_sections(memo: &str) -> Vec<&'static str> {
    let headers: Vec<String> = memo
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("##"))
        .map(|h| h.trim_start_matches('#').trim().to_lowercase())
        .collect();

    MEMO_SECTIONS
        .iter()
        .copied()
        .filter(|section| {
            let wanted = section.to_lowercase();
            !headers.iter().any(|h| h.contains(&wanted))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diligence::{RedFlag, VerificationOutcome};
    use model::testing::ScriptedModel;
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

    fn full_memo() -> String {
        let mut memo = String::from("# Investment Memo: Acme\n");
        for (i, section) in MEMO_SECTIONS.iter().enumerate() {
            memo.push_str(&format!("\n## {}. {}\nBody.\n", i + 1, section));
        }
        memo
    }

    #[tokio::test]
    async fn test_generate_uses_memo_config() {
        let model = Arc::new(ScriptedModel::new());
        model.push_text(full_memo());

        let memo = MemoSynthesizer::new(model.clone())
            .generate(&analysis(), Some("Stripe leads."), None)
            .await
            .unwrap();

        for section in MEMO_SECTIONS {
            assert!(memo.contains(section));
        }

        let request = &model.requests()[0];
        let config = &request.config;
        assert_eq!(config.temperature, Some(MEMO_TEMPERATURE));
        assert_eq!(config.max_output_tokens, Some(MEMO_MAX_OUTPUT_TOKENS));
        assert!(request.all_text().contains("Stripe leads."));
    }

    #[tokio::test]
    async fn test_generate_includes_red_flags() {
        let model = Arc::new(ScriptedModel::new());
        model.push_text(full_memo());
        let report = RedFlagReport {
            red_flags: vec![RedFlag {
                claim: "$50B TAM".to_string(),
                verification: VerificationOutcome {
                    verified: false,
                    evidence: "none".to_string(),
                    confidence: 80,
                },
            }],
            summary: "TAM looks inflated.".to_string(),
        };

        MemoSynthesizer::new(model.clone())
            .generate(&analysis(), None, Some(&report))
            .await
            .unwrap();

        let prompt = model.requests()[0].all_text();
        assert!(prompt.contains("$50B TAM"));
        assert!(prompt.contains("TAM looks inflated."));
    }

    #[tokio::test]
    async fn test_regenerate_calls_model_again() {
        let model = Arc::new(ScriptedModel::new());
        model.push_text("## Executive Summary\nfirst");
        model.push_text("## Executive Summary\nsecond");
        let synth = MemoSynthesizer::new(model.clone());

        let first = synth.generate(&analysis(), None, None).await.unwrap();
        let second = synth.generate(&analysis(), None, None).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_memo_is_error() {
        let model = Arc::new(ScriptedModel::new());
        model.push_text("   ");

        let err = MemoSynthesizer::new(model)
            .generate(&analysis(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_sections() {
        assert!(missing_sections(&full_memo()).is_empty());

        let partial = "## Executive Summary\n## Risk Analysis\n";
        let missing = missing_sections(partial);
        assert_eq!(missing.len(), 7);
        assert!(missing.contains(&"Team Assessment"));
        assert!(!missing.contains(&"Risk Analysis"));
    }
}
