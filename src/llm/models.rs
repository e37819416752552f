//! Model definitions for both upstream providers
//!
//! The catalog is injected configuration: a built-in table is used unless a
//! JSON file replaces it at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Upstream provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Primary provider hosting the own-model tiers
    Native,
    /// Secondary provider hosting third-party models
    Partner,
}

impl Provider {
    /// Get the display name for this provider
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Native => "Native",
            Provider::Partner => "Partner",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::Native => "NATIVE_API_KEY",
            Provider::Partner => "PARTNER_API_KEY",
        }
    }

    /// Get the environment variable that overrides the endpoint URL
    pub fn base_url_env_var(self) -> &'static str {
        match self {
            Provider::Native => "NATIVE_BASE_URL",
            Provider::Partner => "PARTNER_BASE_URL",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Native => "https://api.groq.com/openai/v1/chat/completions",
            Provider::Partner => "https://openrouter.ai/api/v1/chat/completions",
        }
    }

    /// Whether requests carry temperature / `top_p` / `max_tokens`
    pub fn sends_sampling_params(self) -> bool {
        matches!(self, Provider::Native)
    }
}

/// Descriptive figures shown in the partner model picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetails {
    pub context_tokens: u64,
    pub parameters: u64,
    pub comparable_model: String,
}

/// Model definition with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDef {
    /// Client-facing model ID (e.g., "qiwi-medium")
    pub id: String,
    pub provider: Provider,
    /// Model name sent upstream (e.g., "qwen-2.5-32b")
    pub api_name: String,
    /// Human-readable name
    pub name: String,
    pub description: String,
    /// Model-specific sentence appended to the system prompt
    #[serde(default)]
    pub persona: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
}

impl ModelDef {
    pub fn is_partner(&self) -> bool {
        self.provider == Provider::Partner
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read model catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse model catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid model catalog: {0}")]
    Invalid(String),
}

/// The full model table plus the fallback for unknown identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCatalog {
    pub default_model: String,
    pub models: Vec<ModelDef>,
}

impl ModelCatalog {
    /// Built-in table used when no catalog file is configured
    pub fn builtin() -> Self {
        Self {
            default_model: "qiwi-small".to_string(),
            models: vec![
                native(
                    "qiwi-small",
                    "llama-3.1-8b-instant",
                    "Qiwi-Small",
                    "Fast responses for everyday questions",
                    "You are quick and concise, providing instant answers while maintaining accuracy.",
                ),
                native(
                    "qiwi-medium",
                    "qwen-2.5-32b",
                    "Qiwi-Medium",
                    "Balanced speed and depth",
                    "You balance speed with intelligence, providing comprehensive yet efficient responses.",
                ),
                native(
                    "qiwi-reasoning",
                    "deepseek-r1-distill-llama-70b",
                    "Qiwi-Reasoning",
                    "Step-by-step reasoning for complex problems",
                    "You excel at complex problem-solving. Format your response with reasoning in \
                     <think>your step-by-step reasoning process</think> followed by your final \
                     response. Use markdown formatting for better readability.",
                ),
                partner(
                    "deepseek/deepseek-chat:free",
                    "DeepSeek-v3",
                    "DeepSeek",
                    "Leading AI from China comparable to Claude 3.5 Sonnet",
                    ModelDetails {
                        context_tokens: 300_000,
                        parameters: 13_000_000_000,
                        comparable_model: "Claude 3.5 Sonnet".to_string(),
                    },
                ),
                partner(
                    "amazon/nova-lite-v1",
                    "Nova-Lite",
                    "Amazon",
                    "300K Context token LLM from Amazon",
                    ModelDetails {
                        context_tokens: 300_000,
                        parameters: 10_000_000_000,
                        comparable_model: "Llama 2".to_string(),
                    },
                ),
                partner(
                    "qwen/qwen-plus",
                    "Qwen-Plus",
                    "Alibaba",
                    "Alibaba's fast 72b parameter model",
                    ModelDetails {
                        context_tokens: 2_048_000,
                        parameters: 72_000_000_000,
                        comparable_model: "Llama 3".to_string(),
                    },
                ),
            ],
        }
    }

    /// Load and validate a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog: Self = serde_json::from_str(&raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.models.is_empty() {
            return Err(CatalogError::Invalid("no models defined".to_string()));
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if model.id.trim().is_empty() || model.api_name.trim().is_empty() {
                return Err(CatalogError::Invalid(
                    "model id and apiName must be non-empty".to_string(),
                ));
            }
            if !seen.insert(model.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate model id: {}",
                    model.id
                )));
            }
        }

        // Unknown ids fall back here, so it has to be a native model
        match self.models.iter().find(|m| m.id == self.default_model) {
            Some(m) if m.provider == Provider::Native => Ok(()),
            Some(_) => Err(CatalogError::Invalid(format!(
                "default model {} is not a native model",
                self.default_model
            ))),
            None => Err(CatalogError::Invalid(format!(
                "default model {} is not defined",
                self.default_model
            ))),
        }
    }
}

fn native(id: &str, api_name: &str, name: &str, description: &str, persona: &str) -> ModelDef {
    ModelDef {
        id: id.to_string(),
        provider: Provider::Native,
        api_name: api_name.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        persona: persona.to_string(),
        vendor: None,
        details: None,
    }
}

fn partner(id: &str, name: &str, vendor: &str, description: &str, details: ModelDetails) -> ModelDef {
    ModelDef {
        id: id.to_string(),
        provider: Provider::Partner,
        api_name: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        persona: String::new(),
        vendor: Some(vendor.to_string()),
        details: Some(details),
    }
}
