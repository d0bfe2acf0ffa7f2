//! Configuration for the Stride client

use std::time::Duration;
use url::Url;

use crate::error::ClientError;

/// Configuration for the composed client
///
/// Load the values from environment variables or another secure source;
/// the anon key is not a secret but should still not be hard-coded.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the hosted backend project
    pub url: Url,
    /// The anonymous API key for the project
    pub anon_key: String,
    /// Request timeout applied to the shared HTTP client
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a new configuration, validating the URL
    pub fn new(url_str: &str, anon_key: &str) -> Result<Self, ClientError> {
        let url = Url::parse(url_str)?;
        if anon_key.is_empty() {
            return Err(ClientError::Config("anon_key cannot be empty".to_string()));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
        })
    }

    /// Read the configuration from environment variables
    pub fn from_env() -> Result<Self, ClientError> {
        let url_str = std::env::var("STRIDE_SUPABASE_URL").map_err(|_| {
            ClientError::Config("STRIDE_SUPABASE_URL environment variable not found".to_string())
        })?;
        let anon_key = std::env::var("STRIDE_SUPABASE_ANON_KEY").map_err(|_| {
            ClientError::Config(
                "STRIDE_SUPABASE_ANON_KEY environment variable not found".to_string(),
            )
        })?;
        Self::new(&url_str, &anon_key)
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
