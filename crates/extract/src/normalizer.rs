use crate::error::AnalysisError;
use crate::schema::AnalysisResult;

/// Remove a surrounding markdown code fence (```` ```json ```` or ```` ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") up to the first newline
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches("json"),
    };

    body.trim_end().trim_end_matches("```").trim()
}

/// Parse raw model text into an [`AnalysisResult`].
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err(AnalysisError::Parse("model returned an empty response".to_string()));
    }

    let result: AnalysisResult = serde_json::from_str(cleaned)
        .map_err(|e| AnalysisError::Parse(format!("invalid analysis JSON: {}", e)))?;

    if result.company_name.trim().is_empty() {
        return Err(AnalysisError::Parse("companyName is empty".to_string()));
    }
    if result.sector.trim().is_empty() {
        return Err(AnalysisError::Parse("sector is empty".to_string()));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Recommendation;

    #[test]
    fn test_strip_json_fence() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_bare_fence_and_whitespace() {
        assert_eq!(strip_code_fences("  ```\n{}\n```  \n"), "{}");
        assert_eq!(strip_code_fences("{\"plain\": true}"), "{\"plain\": true}");
    }

    #[test]
    fn test_parse_fenced_analysis() {
        let text = "```json\n{\"companyName\":\"X\",\"investmentScore\":10,\"recommendation\":\"Pass\",\"sector\":\"AI\"}\n```";
        let result = parse_analysis(text).unwrap();

        assert_eq!(result.company_name, "X");
        assert_eq!(result.investment_score, 10);
        assert_eq!(result.recommendation, Recommendation::Pass);
    }

    #[test]
    fn test_non_json_is_parse_error() {
        let err = parse_analysis("I'm sorry, I can't read this deck.").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let err = parse_analysis(r#"{"companyName":"Acme","sector":"FinTech","investmentScore":50}"#)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(ref m) if m.contains("recommendation")));
    }

    #[test]
    fn test_unknown_recommendation_is_parse_error() {
        let err = parse_analysis(
            r#"{"companyName":"Acme","sector":"FinTech","investmentScore":50,"recommendation":"Maybe"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn test_blank_company_is_parse_error() {
        let err = parse_analysis(
            r#"{"companyName":" ","sector":"FinTech","investmentScore":50,"recommendation":"Hold"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }
}
