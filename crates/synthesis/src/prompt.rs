use diligence::RedFlagReport;
use extract::AnalysisResult;

/// Section headers every memo is expected to carry, in order.
pub const MEMO_SECTIONS: [&str; 9] = [
    "Executive Summary",
    "Company Overview",
    "Market Opportunity",
    "Team Assessment",
    "Business Model & Traction",
    "Competitive Analysis",
    "Risk Analysis",
    "Financial Considerations",
    "Investment Recommendation",
];

const SECTION_GUIDE: [&str; 9] = [
    "- Investment thesis in 3-4 sentences\n- Key highlights\n- Recommendation and proposed terms",
    "- What they do\n- Problem they solve\n- Solution/Product",
    "- TAM/SAM/SOM analysis\n- Market trends and drivers\n- Competitive positioning",
    "- Founders and key executives\n- Relevant experience\n- Track record",
    "- Revenue model\n- Key metrics and growth\n- Customer acquisition",
    "- Direct competitors\n- Competitive advantages\n- Market positioning",
    "- Key risks identified\n- Mitigation strategies\n- Red flags from due diligence",
    "- Use of funds\n- Valuation assessment\n- Expected returns (best/base/worst case)",
    "- Final recommendation (Pass/Hold/Invest)\n- Proposed terms (if applicable)\n- Next steps",
];

pub fn build_memo_prompt(
    analysis: &AnalysisResult,
    competitors: Option<&str>,
    red_flags: Option<&RedFlagReport>,
) -> String {
    let analysis_json = serde_json::to_string_pretty(analysis).unwrap_or_default();
    let competitors = competitors.unwrap_or("Not available.");
    let red_flags = red_flags
        .and_then(|r| serde_json::to_string_pretty(r).ok())
        .unwrap_or_else(|| "Not available.".to_string());

    let mut template = format!("# Investment Memo: {}\n", analysis.company_name);
    for (header, guide) in MEMO_SECTIONS.iter().zip(SECTION_GUIDE.iter()) {
        template.push_str(&format!("\n## {}\n{}\n", header, guide));
    }

    format!(
        r#"Generate a professional investment committee memo based on the following data.

PITCH DECK ANALYSIS:
{}

COMPETITIVE LANDSCAPE:
{}

DUE DILIGENCE RED FLAGS:
{}

Format it as a formal markdown memo using exactly these section headers:

{}
Use professional, clear language appropriate for an investment committee."#,
        analysis_json, competitors, red_flags, template
    )
}

/// Synthetic first user turn carrying the whole analysis.
pub fn build_chat_context(analysis: &AnalysisResult) -> String {
    let analysis_json = serde_json::to_string_pretty(analysis).unwrap_or_default();
    format!(
        r#"You are analyzing a pitch deck with the following information:

Company: {}
Sector: {}
Stage: {}
Ask Amount: {}
Investment Score: {}/100
Recommendation: {}

Key Insights:
{}"#,
        analysis.company_name,
        analysis.sector,
        analysis.stage.as_deref().unwrap_or("Unknown"),
        analysis.ask_amount.as_deref().unwrap_or("Unknown"),
        analysis.investment_score,
        analysis.recommendation.as_str(),
        analysis_json
    )
}

pub fn build_chat_acknowledgement(analysis: &AnalysisResult) -> String {
    format!(
        r#"I've thoroughly reviewed this pitch deck for {}. I can answer questions about:

- The team and their backgrounds
- Market opportunity and sizing
- Competitive landscape
- Risk factors and concerns
- Financial projections
- Investment recommendation rationale

What would you like to know?"#,
        analysis.company_name
    )
}
