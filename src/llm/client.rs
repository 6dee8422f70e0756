use crate::config::{ExtractorConfig, GEMINI_BASE_URL};
use crate::error::{Result, StatementExtractorError};
use crate::llm::types::*;
use log::{debug, warn};
use reqwest::Client;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.api_key.clone()).with_base_url(config.base_url.clone())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one `generateContent` call and returns the answer text.
    ///
    /// Fails with `Configuration` before touching the network when no key is set.
    pub(crate) async fn generate_content(
        &self,
        model: &str,
        payload: &GenerateContentRequest,
    ) -> Result<String> {
        if !crate::config::is_usable_key(&self.api_key) {
            return Err(StatementExtractorError::Configuration(
                "API key is missing; select a key before extracting".to_string(),
            ));
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let res = self.client.post(&url).json(payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(provider_error(status.as_u16(), &err_text));
        }

        let raw_body = res.text().await?;
        let body: GenerateContentResponse = serde_json::from_str(&raw_body).map_err(|e| {
            warn!("Unreadable generateContent envelope: {}", raw_body);
            StatementExtractorError::MalformedResponse(format!("invalid response envelope: {}", e))
        })?;

        if let Some(reason) = body
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            debug!("Prompt blocked by provider: {}", reason);
        }
        if let Some(reason) = body
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!("Candidate finish reason: {}", reason);
        }

        body.text().ok_or(StatementExtractorError::EmptyResponse)
    }
}

impl From<reqwest::Error> for StatementExtractorError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the key as a query parameter
        let status = e.status().map(|s| s.as_u16());
        StatementExtractorError::Provider {
            status,
            code: None,
            message: e.without_url().to_string(),
        }
    }
}

fn provider_error(status: u16, body: &str) -> StatementExtractorError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => StatementExtractorError::Provider {
            status: Some(envelope.error.code.unwrap_or(status)),
            code: envelope.error.status,
            message: envelope.error.message,
        },
        Err(_) => StatementExtractorError::Provider {
            status: Some(status),
            code: None,
            message: format!("Gemini API Error (status {}): {}", status, body),
        },
    }
}
