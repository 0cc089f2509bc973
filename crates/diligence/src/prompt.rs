use extract::AnalysisResult;
use model::FunctionDeclaration;
use serde_json::json;

pub const VERIFY_CLAIM_FUNCTION: &str = "verify_company_claim";

pub fn verify_claim_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: VERIFY_CLAIM_FUNCTION.to_string(),
        description: "Verify a company's claim by searching the web for evidence".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "claim": {
                    "type": "STRING",
                    "description": "The specific claim to verify (e.g., 'CEO previously sold company to Google')"
                },
                "searchQuery": {
                    "type": "STRING",
                    "description": "Search query that would surface evidence for the claim"
                },
                "expectedEvidence": {
                    "type": "STRING",
                    "description": "What evidence would confirm this claim"
                }
            },
            "required": ["claim", "searchQuery"]
        }),
    }
}

pub fn build_red_flag_prompt(analysis: &AnalysisResult) -> String {
    let analysis_json = serde_json::to_string_pretty(analysis).unwrap_or_default();
    format!(
        r#"Based on this pitch deck analysis, identify potential red flags that need verification.

ANALYSIS:
{}

LOOK FOR:
- Unverifiable claims about team backgrounds
- Suspicious market size numbers
- Competitor comparisons that seem too favorable
- Traction metrics that don't add up
- Regulatory or legal concerns

For each red flag worth checking, call {} with the claim and a search query.
When you have no more claims to verify, reply with a concise due-diligence summary of the red flags and their verification status."#,
        analysis_json, VERIFY_CLAIM_FUNCTION
    )
}

pub fn build_competitor_prompt(company_name: &str, sector: &str) -> String {
    format!(
        r#"Research and analyze the competitive landscape for "{}" in the {} sector.

PROVIDE:
1. Top 5-7 direct competitors with:
   - Company name
   - Latest funding round and total raised
   - Key differentiators
   - Market position
   - Recent news or developments

2. Market dynamics:
   - Market leaders
   - Emerging players
   - Recent M&A activity
   - Market trends

Use current, real-time data from web search. Include citations for funding and news."#,
        company_name, sector
    )
}
