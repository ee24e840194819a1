//! Credential resolution for the Gemini backends
//!
//! Either `GOOGLE_GENAI_USE_VERTEXAI=TRUE` (managed Vertex AI) or a
//! `GOOGLE_API_KEY` must be present before an agent can be served.

use thiserror::Error;
use tracing::warn;

pub const USE_VERTEXAI_VAR: &str = "GOOGLE_GENAI_USE_VERTEXAI";
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";
pub const LOCATION_VAR: &str = "GOOGLE_CLOUD_LOCATION";
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_CLOUD_ACCESS_TOKEN";

const DEFAULT_LOCATION: &str = "us-central1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("GOOGLE_API_KEY environment variable not set and GOOGLE_GENAI_USE_VERTEXAI is not TRUE.")]
    MissingApiKey,
}

/// How requests to Gemini are authenticated
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    VertexAi {
        project: String,
        location: String,
        access_token: Option<String>,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.debug_tuple("ApiKey").field(&"[REDACTED]").finish(),
            Self::VertexAi {
                project, location, ..
            } => f
                .debug_struct("VertexAi")
                .field("project", project)
                .field("location", location)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    /// Resolve credentials from the process environment
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if lookup(USE_VERTEXAI_VAR).as_deref() == Some("TRUE") {
            let credentials = Self::VertexAi {
                project: present(PROJECT_VAR).unwrap_or_default(),
                location: present(LOCATION_VAR).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
                access_token: present(ACCESS_TOKEN_VAR),
            };
            for var in credentials.missing_vertex_settings() {
                warn!("Vertex AI selected but {} is not set", var);
            }
            return Ok(credentials);
        }

        present(API_KEY_VAR)
            .map(Self::ApiKey)
            .ok_or(CredentialsError::MissingApiKey)
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self, Self::VertexAi { .. })
    }

    /// Vertex AI variables that were left unset, empty for API-key credentials
    pub fn missing_vertex_settings(&self) -> Vec<&'static str> {
        match self {
            Self::ApiKey(_) => Vec::new(),
            Self::VertexAi {
                project,
                access_token,
                ..
            } => {
                let mut missing = Vec::new();
                if project.is_empty() {
                    missing.push(PROJECT_VAR);
                }
                if access_token.is_none() {
                    missing.push(ACCESS_TOKEN_VAR);
                }
                missing
            }
        }
    }
}
