use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Pass,
    #[serde(rename = "Strong Pass")]
    StrongPass,
}

impl Recommendation {
    pub const ALL: [Recommendation; 5] = [
        Recommendation::StrongBuy,
        Recommendation::Buy,
        Recommendation::Hold,
        Recommendation::Pass,
        Recommendation::StrongPass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Pass => "Pass",
            Recommendation::StrongPass => "Strong Pass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPerson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAnalysis {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<u8>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub key_people: Vec<KeyPerson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    #[serde(default)]
    pub tam: Option<String>,
    #[serde(default)]
    pub growth: Option<String>,
    #[serde(default)]
    pub competitive_advantage: Option<String>,
    #[serde(default)]
    pub market_trends: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    #[serde(default)]
    pub risk: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub mitigation: Option<String>,
}

/// Structured result of the primary deck analysis. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub company_name: String,
    pub sector: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub ask_amount: Option<String>,
    #[serde(default)]
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub team_analysis: Option<TeamAnalysis>,
    #[serde(default)]
    pub market_analysis: Option<MarketAnalysis>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(deserialize_with = "strict_score")]
    pub investment_score: u8,
    pub recommendation: Recommendation,
}

fn strict_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
        return Err(serde::de::Error::custom(format!(
            "investmentScore must be within 0-100, got {}",
            raw
        )));
    }
    Ok(raw.round() as u8)
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 100.0).round() as u8))
}
