//! Server configuration from environment variables

use crate::llm::{CatalogError, LlmConfig, ModelCatalog};
use crate::relay::ForwardPolicy;
use crate::system_prompt::DEFAULT_ASSISTANT_NAME;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub forward_policy: ForwardPolicy,
    /// JSON catalog replacing the built-in model table
    pub models_path: Option<PathBuf>,
    /// Brand named in system prompts
    pub assistant_name: String,
    pub llm: LlmConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = match get("LEEMER_BIND") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "LEEMER_BIND",
                message: format!("{raw:?}: {e}"),
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match get("LEEMER_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "LEEMER_PORT",
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let forward_policy = match get("LEEMER_FORWARD_POLICY") {
            Some(raw) => ForwardPolicy::from_name(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "LEEMER_FORWARD_POLICY",
                message: format!("{raw:?}: expected \"filtered\" or \"verbatim\""),
            })?,
            None => ForwardPolicy::default(),
        };

        Ok(Self {
            bind,
            port,
            forward_policy,
            models_path: get("LEEMER_MODELS_PATH").map(PathBuf::from),
            assistant_name: get("LEEMER_ASSISTANT_NAME")
                .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string()),
            llm: LlmConfig::from_lookup(&lookup),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// The configured catalog file, or the built-in table
    pub fn load_catalog(&self) -> Result<ModelCatalog, ConfigError> {
        match &self.models_path {
            Some(path) => Ok(ModelCatalog::load(path)?),
            None => Ok(ModelCatalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.forward_policy, ForwardPolicy::Filtered);
        assert_eq!(config.assistant_name, "OrionAI");
        assert!(config.models_path.is_none());
        assert!(config.llm.native_api_key.is_none());
        assert_eq!(config.load_catalog().unwrap(), ModelCatalog::builtin());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("LEEMER_BIND", "127.0.0.1"),
            ("LEEMER_PORT", "9090"),
            ("LEEMER_FORWARD_POLICY", "verbatim"),
            ("LEEMER_ASSISTANT_NAME", "Acme"),
            ("NATIVE_API_KEY", "gsk"),
            ("DEFAULT_MODEL", "qiwi-medium"),
        ]))
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.forward_policy, ForwardPolicy::Verbatim);
        assert_eq!(config.assistant_name, "Acme");
        assert_eq!(config.llm.native_api_key.as_deref(), Some("gsk"));
        assert_eq!(config.llm.default_model.as_deref(), Some("qiwi-medium"));
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_lookup(lookup(&[("LEEMER_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LEEMER_PORT", .. }));

        let err =
            ServerConfig::from_lookup(lookup(&[("LEEMER_FORWARD_POLICY", "raw")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LEEMER_FORWARD_POLICY", .. }));

        let err = ServerConfig::from_lookup(lookup(&[("LEEMER_BIND", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LEEMER_BIND", .. }));
    }

    #[test]
    fn test_missing_catalog_file() {
        let config =
            ServerConfig::from_lookup(lookup(&[("LEEMER_MODELS_PATH", "/nonexistent.json")]))
                .unwrap();
        assert!(matches!(config.load_catalog(), Err(ConfigError::Catalog(_))));
    }
}
