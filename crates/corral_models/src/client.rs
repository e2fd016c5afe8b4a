//! Pre-configured HTTP client for one model deployment.

use core::time::Duration;
use corral_pool::FactoryError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

/// Request timeout when the deployment does not set `timeout_secs`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature when the deployment does not set `temperature`.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Retry budget when the deployment does not set `max_retries`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Wire dialect spoken by a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    /// `POST {base_url}/chat/completions` with bearer auth.
    OpenAi,
    /// `POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
    /// with `api-key` auth.
    AzureOpenAi {
        /// Value of the `api-version` query parameter.
        api_version: String,
    },
}

/// Long-lived client bound to one model deployment.
///
/// Holds a `reqwest::Client` with auth headers and timeout already applied,
/// so callers only add a request body.
#[derive(Clone)]
pub struct ModelClient {
    http: reqwest::Client,
    dialect: Dialect,
    base_url: String,
    model: String,
    temperature: f64,
    max_retries: u32,
}

impl core::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModelClient")
            .field("dialect", &self.dialect)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for [`ModelClient`].
#[derive(Debug)]
pub struct ModelClientBuilder {
    dialect: Dialect,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    temperature: f64,
    max_retries: u32,
}

impl ModelClientBuilder {
    /// Starts a builder for `model` served at `base_url`.
    pub fn new(dialect: Dialect, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            dialect,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the API key sent with every request.
    #[must_use]
    pub fn api_key(mut self, api_key: Option<&str>) -> Self {
        self.api_key = api_key.map(str::to_string);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - [`FactoryError::InvalidConfig`] if the API key is not a valid header value.
    /// - [`FactoryError::Backend`] if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ModelClient, FactoryError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.api_key {
            let (name, value) = match self.dialect {
                Dialect::OpenAi => (AUTHORIZATION, format!("Bearer {api_key}")),
                Dialect::AzureOpenAi { .. } => (HeaderName::from_static("api-key"), api_key.clone()),
            };
            let mut value = HeaderValue::from_str(&value).map_err(|err| {
                FactoryError::invalid_config(format!("invalid API key header: {err}"))
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|err| FactoryError::backend("failed to build HTTP client", err))?;

        Ok(ModelClient {
            http,
            dialect: self.dialect,
            base_url: self.base_url,
            model: self.model,
            temperature: self.temperature,
            max_retries: self.max_retries,
        })
    }
}

impl ModelClient {
    /// The underlying HTTP client, auth headers included.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Wire dialect.
    #[must_use]
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Provider-side model or deployment name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sampling temperature.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Retry budget.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Chat completions endpoint for this deployment.
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        match &self.dialect {
            Dialect::OpenAi => format!("{}/chat/completions", self.base_url),
            Dialect::AzureOpenAi { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={api_version}",
                self.base_url, self.model
            ),
        }
    }
}
