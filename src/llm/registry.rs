//! Model registry resolving client model ids to provider endpoints

use super::{CatalogError, LlmError, ModelCatalog, ModelDef, Provider};
use std::collections::HashMap;
use std::fmt;

/// Configuration for upstream providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub native_api_key: Option<String>,
    pub native_base_url: Option<String>,
    pub partner_api_key: Option<String>,
    pub partner_base_url: Option<String>,
    /// Overrides the catalog's default model
    pub default_model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            native_api_key: get(Provider::Native.api_key_env_var()),
            native_base_url: get(Provider::Native.base_url_env_var()),
            partner_api_key: get(Provider::Partner.api_key_env_var()),
            partner_base_url: get(Provider::Partner.base_url_env_var()),
            default_model: get("DEFAULT_MODEL"),
        }
    }
}

/// Where and how to reach one provider
#[derive(Clone)]
pub struct ProviderEndpoint {
    pub provider: Provider,
    pub url: String,
    pub api_key: Option<String>,
}

impl ProviderEndpoint {
    /// Value for the Authorization header
    pub fn bearer(&self) -> Result<String, LlmError> {
        match &self.api_key {
            Some(key) => Ok(format!("Bearer {key}")),
            None => Err(LlmError::auth(format!(
                "{} provider has no credential; set {}",
                self.provider.display_name(),
                self.provider.api_key_env_var()
            ))),
        }
    }
}

impl fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Registry of available models
#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<ModelDef>,
    by_id: HashMap<String, usize>,
    default_index: usize,
    native: ProviderEndpoint,
    partner: ProviderEndpoint,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig, catalog: ModelCatalog) -> Result<Self, CatalogError> {
        let mut catalog = catalog;
        if let Some(default_model) = &config.default_model {
            catalog.default_model.clone_from(default_model);
        }
        catalog.validate()?;

        let by_id: HashMap<String, usize> = catalog
            .models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        let default_index = by_id
            .get(&catalog.default_model)
            .copied()
            .ok_or_else(|| CatalogError::Invalid("default model missing".to_string()))?;

        let native = ProviderEndpoint {
            provider: Provider::Native,
            url: config
                .native_base_url
                .clone()
                .unwrap_or_else(|| Provider::Native.default_base_url().to_string()),
            api_key: config.native_api_key.clone(),
        };
        let partner = ProviderEndpoint {
            provider: Provider::Partner,
            url: config
                .partner_base_url
                .clone()
                .unwrap_or_else(|| Provider::Partner.default_base_url().to_string()),
            api_key: config.partner_api_key.clone(),
        };

        if native.api_key.is_none() {
            tracing::warn!(var = Provider::Native.api_key_env_var(), "No native credential configured");
        }
        if partner.api_key.is_none() {
            tracing::warn!(var = Provider::Partner.api_key_env_var(), "No partner credential configured");
        }

        Ok(Self {
            models: catalog.models,
            by_id,
            default_index,
            native,
            partner,
        })
    }

    /// Get a model by ID
    pub fn get(&self, model_id: &str) -> Option<&ModelDef> {
        self.by_id.get(model_id).map(|&i| &self.models[i])
    }

    /// Resolve a requested id, falling back to the default native model
    pub fn resolve(&self, model_id: &str) -> &ModelDef {
        self.get(model_id)
            .unwrap_or(&self.models[self.default_index])
    }

    #[cfg(test)]
    pub fn is_partner(&self, model_id: &str) -> bool {
        self.get(model_id).is_some_and(ModelDef::is_partner)
    }

    pub fn endpoint(&self, provider: Provider) -> &ProviderEndpoint {
        match provider {
            Provider::Native => &self.native,
            Provider::Partner => &self.partner,
        }
    }

    pub fn has_credential(&self, provider: Provider) -> bool {
        self.endpoint(provider).api_key.is_some()
    }

    /// Get the default model ID
    pub fn default_model_id(&self) -> &str {
        &self.models[self.default_index].id
    }

    pub fn models(&self) -> &[ModelDef] {
        &self.models
    }

    /// Get detailed information about every model, in catalog order
    pub fn available_model_info(&self) -> Vec<crate::api::ModelInfo> {
        self.models
            .iter()
            .map(|m| crate::api::ModelInfo {
                id: m.id.clone(),
                name: m.name.clone(),
                provider: m.provider,
                description: m.description.clone(),
                partner: m.is_partner(),
                vendor: m.vendor.clone(),
                details: m.details.clone(),
                available: self.has_credential(m.provider),
            })
            .collect()
    }
}
