use serde::Deserialize;

/// Default completion model
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";

/// Maximum tokens any single call may request
const MODEL_MAX_TOKENS: u32 = 4096;

/// Completion model identifier, as understood by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model(String);

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Model(DEFAULT_MODEL.to_string())
        } else {
            Model(id)
        }
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn max_tokens(&self) -> u32 {
        MODEL_MAX_TOKENS
    }
}

impl Default for Model {
    fn default() -> Self {
        Model(DEFAULT_MODEL.to_string())
    }
}

/// API usage information from OpenRouter
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
    /// Cost in USD as reported by the endpoint (`total_cost`).
    #[serde(default, alias = "total_cost")]
    pub cost: Option<f64>,
}

impl Usage {
    /// Reported cost, or 0.0 when the endpoint does not report one.
    pub fn cost(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_model_falls_back_to_default() {
        assert_eq!(Model::new("  ").id(), DEFAULT_MODEL);
        assert_eq!(Model::new("anthropic/claude-sonnet-4.5").id(), "anthropic/claude-sonnet-4.5");
    }

    #[test]
    fn test_usage_deserialize_with_total_cost() {
        let json = r#"{"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150, "total_cost": 0.0025}"#;
        let usage: Usage = serde_json::from_str(json).unwrap();
        assert_eq!(usage.prompt_tokens, 100);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.cost(), 0.0025);
    }

    #[test]
    fn test_usage_without_cost_is_zero() {
        let usage: Usage = serde_json::from_str("{}").unwrap();
        assert_eq!(usage.cost(), 0.0);
    }
}
