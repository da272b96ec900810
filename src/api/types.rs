use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiError;

/// Inbound body of a proxy call: `{ "action": "...", "data": { ... } }`.
/// `data` stays untyped here; `Action::parse` gives it a shape.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

/// The five request kinds the proxy understands, each with its own payload.
/// Adding a kind means adding a variant; the prompt match is exhaustive, so
/// the compiler points at every place that needs updating.
#[derive(Debug)]
pub enum Action {
    GenerateFactors(FactorsPayload),
    GetPairwise(PairwisePayload),
    GenerateStrategies(StrategiesPayload),
    EvaluateStrategies(EvaluatePayload),
    GetExplanation(ExplanationPayload),
}

#[derive(Debug, Deserialize)]
pub struct FactorsPayload {
    #[serde(default)]
    pub industry: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairwisePayload {
    pub factors: Vec<String>,
    pub linguistic_options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StrategiesPayload {
    pub factors: SwotFactors,
}

#[derive(Debug, Deserialize)]
pub struct SwotFactors {
    pub s: Vec<String>,
    pub w: Vec<String>,
    pub o: Vec<String>,
    pub t: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluatePayload {
    pub strategies: Vec<StrategyRef>,
    pub factors: Vec<String>,
}

/// A strategy as the frontend sends it back, text only.
#[derive(Debug, Deserialize)]
pub struct StrategyRef {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationPayload {
    pub top_strategy: StrategyRef,
}

impl Action {
    /// Dispatch on the action string and give `data` its per-action shape.
    /// Unknown actions and payloads that don't fit are rejected here, before
    /// any prompt is rendered or any downstream call is made.
    pub fn parse(action: &str, data: Value) -> Result<Self, ApiError> {
        match action {
            "generateFactors" => Ok(Action::GenerateFactors(payload("generateFactors", data)?)),
            "getPairwise" => Ok(Action::GetPairwise(payload("getPairwise", data)?)),
            "generateStrategies" => Ok(Action::GenerateStrategies(payload(
                "generateStrategies",
                data,
            )?)),
            "evaluateStrategies" => Ok(Action::EvaluateStrategies(payload(
                "evaluateStrategies",
                data,
            )?)),
            "getExplanation" => Ok(Action::GetExplanation(payload("getExplanation", data)?)),
            _ => Err(ApiError::InvalidAction),
        }
    }
}

fn payload<T: DeserializeOwned>(action: &'static str, data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|e| ApiError::MalformedPayload {
        action,
        detail: e.to_string(),
    })
}
