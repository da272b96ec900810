use serde_json::{json, Value};

use crate::api::types::Action;

/// What gets sent downstream for one action: the rendered instruction text
/// and the structured-output schema Gemini is asked to conform to.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub prompt: String,
    pub schema: Value,
}

/// Render the prompt/schema pair for an action. Pure string templating over
/// the already-validated payload; the match is exhaustive over `Action`.
pub fn prompt_for(action: &Action) -> PromptSpec {
    match action {
        Action::GenerateFactors(p) => {
            let industry = p
                .industry
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("business in general");
            PromptSpec {
                prompt: format!(
                    "You are an expert business consultant. For the \"{industry}\" industry, \
                     identify 3-4 key factors for each SWOT category \
                     (Strengths, Weaknesses, Opportunities, Threats)."
                ),
                schema: string_list_schema(&["strengths", "weaknesses", "opportunities", "threats"]),
            }
        }
        Action::GetPairwise(p) => {
            let labels = p
                .factors
                .iter()
                .enumerate()
                .map(|(i, f)| format!("F{} ({})", i + 1, f))
                .collect::<Vec<_>>()
                .join(", ");
            let scale = p.linguistic_options.join(", ");
            PromptSpec {
                prompt: format!(
                    "You are a business analyst. Perform pairwise comparisons for the following \
                     {} factors: {labels}. For each pair (e.g. F1 vs F2), decide which factor is \
                     more influential and how strongly, using this scale: [{scale}].",
                    p.factors.len()
                ),
                schema: json!({
                    "type": "OBJECT",
                    "properties": {
                        "comparisons": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "factor1": { "type": "STRING" },
                                    "factor2": { "type": "STRING" },
                                    "dominant_factor": { "type": "STRING" },
                                    "linguistic_value": { "type": "STRING" }
                                },
                                "required": ["factor1", "factor2", "dominant_factor", "linguistic_value"]
                            }
                        }
                    },
                    "required": ["comparisons"]
                }),
            }
        }
        Action::GenerateStrategies(p) => {
            let f = &p.factors;
            PromptSpec {
                prompt: format!(
                    "You are a business strategist. Given the following SWOT factors:\n\
                     Strengths: {}\nWeaknesses: {}\nOpportunities: {}\nThreats: {}\n\n\
                     Formulate actionable promotion strategies (aim for 2-3 per type where \
                     possible) for each combination: SO, ST, WO, and WT. Make sure there is at \
                     least one of each type.",
                    f.s.join("; "),
                    f.w.join("; "),
                    f.o.join("; "),
                    f.t.join("; ")
                ),
                schema: json!({
                    "type": "OBJECT",
                    "properties": {
                        "strategies": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "type": { "type": "STRING" },
                                    "description": { "type": "STRING" }
                                },
                                "required": ["type", "description"]
                            }
                        }
                    },
                    "required": ["strategies"]
                }),
            }
        }
        Action::EvaluateStrategies(p) => {
            let strategies = p
                .strategies
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            PromptSpec {
                prompt: format!(
                    "You are a risk and opportunity analyst. For each of the following \
                     strategies:\n{strategies}\n\nEvaluate how strongly each strategy relates to \
                     each of the following SWOT factors:\n{}\n\nGive a rating from 1 (not related \
                     at all) to 5 (strongly related).",
                    p.factors.join("\n")
                ),
                schema: json!({
                    "type": "OBJECT",
                    "properties": {
                        "evaluations": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "strategy": { "type": "STRING" },
                                    "ratings": {
                                        "type": "ARRAY",
                                        "items": {
                                            "type": "OBJECT",
                                            "properties": {
                                                "factor": { "type": "STRING" },
                                                "rating": { "type": "NUMBER", "minimum": 1, "maximum": 5 }
                                            },
                                            "required": ["factor", "rating"]
                                        }
                                    }
                                },
                                "required": ["strategy", "ratings"]
                            }
                        }
                    },
                    "required": ["evaluations"]
                }),
            }
        }
        Action::GetExplanation(p) => PromptSpec {
            prompt: format!(
                "The following promotion strategy was selected as the top priority: \"{}\". Give \
                 a short, convincing explanation (2-3 sentences) of why this is the best \
                 strategic move, ideally referring to the most relevant combination of SWOT \
                 factors.",
                p.top_strategy.text
            ),
            schema: json!({
                "type": "OBJECT",
                "properties": { "explanation": { "type": "STRING" } },
                "required": ["explanation"]
            }),
        },
    }
}

fn string_list_schema(fields: &[&str]) -> Value {
    let mut properties = serde_json::Map::new();
    for field in fields {
        properties.insert(
            field.to_string(),
            json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
        );
    }
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": fields
    })
}
