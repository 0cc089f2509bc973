use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::DiligenceError;
use crate::prompt::{VERIFY_CLAIM_FUNCTION, build_red_flag_prompt, verify_claim_declaration};
use crate::verifier::{ClaimVerifier, VerificationOutcome};
use extract::AnalysisResult;
use model::{Conversation, FunctionCall, GenerationConfig, GenerativeModel, Part, Tool};

/// Default cap on tool-call rounds before the loop is abandoned.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedFlag {
    pub claim: String,
    pub verification: VerificationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedFlagReport {
    pub red_flags: Vec<RedFlag>,
    pub summary: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyClaimArgs {
    claim: String,
    #[serde(default)]
    search_query: Option<String>,
}

pub struct RedFlagDetector {
    model: Arc<dyn GenerativeModel>,
    verifier: Arc<dyn ClaimVerifier>,
    max_rounds: usize,
}

impl RedFlagDetector {
    pub fn new(model: Arc<dyn GenerativeModel>, verifier: Arc<dyn ClaimVerifier>) -> Self {
        Self {
            model,
            verifier,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Ask the model for red flags, answering its claim-verification calls
    /// until it replies without any.
    pub async fn detect(&self, analysis: &AnalysisResult) -> Result<RedFlagReport, DiligenceError> {
        let mut conversation = Conversation::new(self.model.clone(), GenerationConfig::default())
            .with_tools(vec![Tool::functions(vec![verify_claim_declaration()])]);

        let mut response = conversation
            .send_text(build_red_flag_prompt(analysis))
            .await?;
        let mut red_flags = Vec::new();
        let mut rounds = 0;

        loop {
            let calls: Vec<FunctionCall> = response.function_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                break;
            }
            if rounds == self.max_rounds {
                tracing::warn!(
                    company = %analysis.company_name,
                    rounds,
                    "Red-flag verification loop exceeded round cap"
                );
                return Err(DiligenceError::VerificationLoopExceeded { rounds });
            }
            rounds += 1;

            let mut replies = Vec::with_capacity(calls.len());
            for call in &calls {
                let reply = self.answer_call(call, &mut red_flags).await?;
                replies.push(Part::function_response(call.name.clone(), reply));
            }

            tracing::debug!(round = rounds, calls = calls.len(), "Sent claim verification results");
            response = conversation.send(replies).await?;
        }

        tracing::info!(
            company = %analysis.company_name,
            red_flags = red_flags.len(),
            rounds,
            "Red-flag detection complete"
        );

        Ok(RedFlagReport {
            red_flags,
            summary: response.text().trim().to_string(),
        })
    }

    async fn answer_call(
        &self,
        call: &FunctionCall,
        red_flags: &mut Vec<RedFlag>,
    ) -> Result<Value, DiligenceError> {
        if call.name != VERIFY_CLAIM_FUNCTION {
            tracing::warn!(function = %call.name, "Model requested an unknown function");
            return Ok(json!({"error": format!("Unknown function: {}", call.name)}));
        }

        let args: VerifyClaimArgs = match serde_json::from_value(call.args.clone()) {
            Ok(args) => args,
            Err(e) => {
                return Ok(json!({"error": format!("Invalid arguments: {}", e)}));
            }
        };
        let query = args.search_query.unwrap_or_else(|| args.claim.clone());

        let outcome = self
            .verifier
            .verify_claim(&args.claim, &query)
            .await
            .map_err(|e| DiligenceError::Verifier(e.to_string()))?;

        let reply = serde_json::to_value(&outcome).unwrap_or_else(|_| json!({}));
        red_flags.push(RedFlag {
            claim: args.claim,
            verification: outcome,
        });
        Ok(reply)
    }
}
