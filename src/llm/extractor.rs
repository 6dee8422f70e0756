use crate::config::{ExtractorConfig, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::document::SourceDocument;
use crate::error::{Result, StatementExtractorError};
use crate::llm::prompts::extraction_instruction;
use crate::llm::{client::GeminiClient, types::*};
use crate::schema::{ExtractionResult, ReportingBasis};
use crate::session::ExtractionBackend;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{info, warn};
use tokio::sync::mpsc::Sender;

pub struct StatementExtractor {
    client: GeminiClient,
    model: String,
    temperature: f32,
    response_schema: serde_json::Value,
}

impl StatementExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            response_schema: ExtractionResult::response_schema(),
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(GeminiClient::from_config(config), config.model.clone())
            .with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The exact payload sent for `document`; only the instruction text depends on `basis`.
    pub fn build_request(
        &self,
        document: &SourceDocument,
        basis: ReportingBasis,
    ) -> GenerateContentRequest {
        let encoded = STANDARD.encode(&document.bytes);

        GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline_data(document.mime_type.clone(), encoded),
                Part::text(extraction_instruction(basis)),
            ])],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Some(self.response_schema.clone()),
                temperature: Some(self.temperature),
            },
        }
    }

    /// One request, no retries. Progress goes to `progress` when a channel is given.
    pub async fn extract_with_progress(
        &self,
        document: &SourceDocument,
        basis: ReportingBasis,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<ExtractionResult> {
        self.send_event(&progress, ExtractionEvent::Starting).await;

        let outcome = self.run(document, basis, &progress).await;

        match &outcome {
            Ok(result) => {
                info!(
                    "Extracted {} statements for '{}' ({})",
                    basis, result.company_name, result.reporting_period
                );
                self.send_event(&progress, ExtractionEvent::Success).await;
            }
            Err(e) => {
                self.send_event(
                    &progress,
                    ExtractionEvent::Failed {
                        reason: e.to_string(),
                    },
                )
                .await;
            }
        }

        outcome
    }

    async fn run(
        &self,
        document: &SourceDocument,
        basis: ReportingBasis,
        progress: &Option<Sender<ExtractionEvent>>,
    ) -> Result<ExtractionResult> {
        self.send_event(
            progress,
            ExtractionEvent::Encoding {
                filename: document.file_name.clone(),
                bytes: document.len(),
            },
        )
        .await;
        let payload = self.build_request(document, basis);

        self.send_event(
            progress,
            ExtractionEvent::Requesting {
                model: self.model.clone(),
            },
        )
        .await;
        info!(
            "Requesting {} extraction of {} from {}",
            basis, document.file_name, self.model
        );
        let raw_json = self.client.generate_content(&self.model, &payload).await?;

        self.send_event(progress, ExtractionEvent::ProcessingResponse)
            .await;
        decode_extraction(&raw_json)
    }

    async fn send_event(&self, sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}

#[async_trait::async_trait]
impl ExtractionBackend for StatementExtractor {
    async fn extract(
        &self,
        document: &SourceDocument,
        basis: ReportingBasis,
    ) -> Result<ExtractionResult> {
        self.extract_with_progress(document, basis, None).await
    }
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::new(GeminiClient::new(String::new()), DEFAULT_MODEL)
    }
}

/// Decodes the model's answer text into a typed result.
///
/// Anything that is not JSON of the expected shape becomes `MalformedResponse`;
/// the raw text is logged first.
pub fn decode_extraction(raw: &str) -> Result<ExtractionResult> {
    if raw.trim().is_empty() {
        return Err(StatementExtractorError::EmptyResponse);
    }

    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        warn!("Malformed extraction response ({}): {}", e, raw);
        StatementExtractorError::MalformedResponse(e.to_string())
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}
