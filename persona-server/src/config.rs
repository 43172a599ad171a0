//! Startup configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use persona_rag::RagConfig;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error(transparent)]
    Rag(#[from] persona_rag::RagError),
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Everything needed to build the pipeline and serve it.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// PDF describing the persona.
    pub document_path: PathBuf,
    pub rag: RagConfig,
    pub groq_api_key: String,
    pub chat_model: String,
    pub hf_token: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var).filter(|v| !v.trim().is_empty()).ok_or(ConfigError::Missing(var))
        };
        let optional = |var: &'static str, default: &str| {
            lookup(var).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
        };

        let defaults = RagConfig::default();
        let rag = RagConfig::builder()
            .chunk_size(parse(&lookup, "PERSONA_CHUNK_SIZE", defaults.chunk_size)?)
            .chunk_overlap(parse(&lookup, "PERSONA_CHUNK_OVERLAP", defaults.chunk_overlap)?)
            .top_k(parse(&lookup, "PERSONA_TOP_K", defaults.top_k)?)
            .build()?;

        let server_defaults = ServerConfig::default();
        Ok(Self {
            server: ServerConfig {
                host: optional("PERSONA_HOST", &server_defaults.host),
                port: parse(&lookup, "PERSONA_PORT", server_defaults.port)?,
            },
            document_path: PathBuf::from(required("PERSONA_DOCUMENT_PATH")?),
            rag,
            groq_api_key: required("GROQ_API_KEY")?,
            chat_model: optional("PERSONA_CHAT_MODEL", persona_rag::groq::DEFAULT_MODEL),
            hf_token: required("HF_TOKEN")?,
            embedding_model: optional(
                "PERSONA_EMBEDDING_MODEL",
                persona_rag::huggingface::DEFAULT_MODEL,
            ),
            embedding_dimensions: parse(
                &lookup,
                "PERSONA_EMBEDDING_DIMENSIONS",
                persona_rag::huggingface::DEFAULT_DIMENSIONS,
            )?,
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        _ => Ok(default),
    }
}
