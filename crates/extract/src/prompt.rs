use serde_json::{Value, json};

pub fn build_analysis_prompt() -> String {
    r#"You are an expert venture capital analyst with 15+ years of experience.

Analyze this pitch deck comprehensively and provide a detailed investment recommendation.

EVALUATE:
1. Team: backgrounds, experience, domain expertise, previous exits
2. Market Opportunity: TAM/SAM/SOM, growth rates, market trends, competitive landscape
3. Product/Technology: innovation level, IP/moats, technical feasibility
4. Business Model: revenue streams, unit economics, go-to-market strategy
5. Traction: customer acquisition, revenue growth, key metrics
6. Financials: burn rate, runway, use of funds
7. Risks: market, execution, competitive and regulatory risks

RULES:
- Cite specific examples and data points from the deck
- Be critical but fair
- investmentScore and teamAnalysis.score are integers from 0 to 100
- recommendation must be one of: Strong Buy, Buy, Hold, Pass, Strong Pass
- risk severity must be one of: Low, Medium, High, Critical
- Output ONLY the JSON object described by the response schema, no markdown, no explanations"#
        .to_string()
}

/// Response schema sent with the analysis request.
pub fn analysis_schema() -> Value {
    let string_list = json!({"type": "ARRAY", "items": {"type": "STRING"}});

    json!({
        "type": "OBJECT",
        "properties": {
            "companyName": {"type": "STRING"},
            "sector": {"type": "STRING"},
            "stage": {"type": "STRING"},
            "askAmount": {"type": "STRING"},
            "executiveSummary": {"type": "STRING"},
            "teamAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "score": {"type": "INTEGER", "minimum": 0, "maximum": 100},
                    "highlights": string_list,
                    "concerns": string_list,
                    "keyPeople": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "name": {"type": "STRING"},
                                "role": {"type": "STRING"},
                                "background": {"type": "STRING"}
                            }
                        }
                    }
                }
            },
            "marketAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "tam": {"type": "STRING"},
                    "growth": {"type": "STRING"},
                    "competitiveAdvantage": {"type": "STRING"},
                    "marketTrends": string_list
                }
            },
            "riskFactors": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "risk": {"type": "STRING"},
                        "severity": {
                            "type": "STRING",
                            "enum": ["Low", "Medium", "High", "Critical"]
                        },
                        "mitigation": {"type": "STRING"}
                    }
                }
            },
            "investmentScore": {"type": "INTEGER", "minimum": 0, "maximum": 100},
            "recommendation": {
                "type": "STRING",
                "enum": ["Strong Buy", "Buy", "Hold", "Pass", "Strong Pass"]
            }
        },
        "required": ["companyName", "sector", "investmentScore", "recommendation"]
    })
}
