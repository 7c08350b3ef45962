//! AnalysisClient — one encoded image in, one typed analysis (or failure) out.

use std::sync::Arc;

use shezhen_core::config::InferenceConfig;
use shezhen_core::{EncodedImage, TcmAnalysis};
use tracing::{debug, error, info, warn};

use crate::credential::{CredentialSource, EnvCredential};
use crate::error::{AnalysisFailure, TransportError};
use crate::prompt::AnalysisPrompt;
use crate::schema;
use crate::transport::{HttpTransport, InferenceTransport};
use crate::types::{Content, GenerateContentRequest, GenerationConfig, InlineData, Part, ThinkingConfig};

/// Response MIME type requested from the service.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Stateless analysis client. Clones share the transport and credential
/// source; concurrent calls are independent.
#[derive(Clone)]
pub struct AnalysisClient {
    transport: Arc<dyn InferenceTransport>,
    credentials: Arc<dyn CredentialSource>,
    model: String,
    prompt: AnalysisPrompt,
    thinking_budget: u32,
}

impl AnalysisClient {
    /// Create a client with the built-in prompt and the default thinking budget.
    #[must_use]
    pub fn new(
        transport: Arc<dyn InferenceTransport>,
        credentials: Arc<dyn CredentialSource>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            model: model.into(),
            prompt: AnalysisPrompt::builtin(),
            thinking_budget: InferenceConfig::default().thinking_budget,
        }
    }

    /// Build an HTTP client from configuration. The key is read from
    /// `api_key_env` on every call, not here.
    ///
    /// # Errors
    /// Returns an error if a configured prompt override cannot be loaded.
    pub fn from_config(config: &InferenceConfig) -> shezhen_core::error::Result<Self> {
        let prompt = match &config.prompt_file {
            Some(path) => AnalysisPrompt::from_file(path)?,
            None => AnalysisPrompt::builtin(),
        };
        Ok(Self::new(
            Arc::new(HttpTransport::new(config.base_url.clone())),
            Arc::new(EnvCredential::new(config.api_key_env.clone())),
            config.model.clone(),
        )
        .with_prompt(prompt)
        .with_thinking_budget(config.thinking_budget))
    }

    /// Replace the instruction prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: AnalysisPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set the reasoning budget; `0` omits it from the request.
    #[must_use]
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = budget;
        self
    }

    /// Model identifier sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Assemble the request for `image`: inline image first, instruction
    /// second, JSON output constrained by the schema.
    #[must_use]
    pub fn build_request(&self, image: &EncodedImage) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.media_type().to_string(),
                            data: image.data().to_string(),
                        },
                    },
                    Part::Text {
                        text: self.prompt.render(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE.into(),
                response_schema: schema::response_schema(),
                thinking_config: (self.thinking_budget > 0).then_some(ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                }),
            },
        }
    }

    /// Analyse one image.
    ///
    /// Issues exactly one inference request. Nothing is retried or cached.
    ///
    /// # Errors
    /// - `ServiceFailure` — no credential, transport error, non-success status
    /// - `EmptyResponse` — the service answered without text
    /// - `MalformedResponse` — the text is not a valid analysis
    pub async fn analyze(&self, image: &EncodedImage) -> Result<TcmAnalysis, AnalysisFailure> {
        let Some(api_key) = self.credentials.api_key() else {
            warn!("No API credential available, not calling the inference service");
            return Err(AnalysisFailure::ServiceFailure(TransportError::MissingCredential));
        };

        let request = self.build_request(image);
        info!(
            model = %self.model,
            media_type = image.media_type(),
            image_bytes = image.decoded_len(),
            prompt_version = %self.prompt.version,
            "requesting tongue analysis"
        );

        let envelope = self
            .transport
            .generate_content(&self.model, &api_key, &request)
            .await
            .map_err(|e| {
                error!("Tongue analysis request failed: {e}");
                AnalysisFailure::ServiceFailure(e)
            })?;

        let Some(text) = envelope.text() else {
            let block_reason = envelope
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref());
            let finish_reason = envelope
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref());
            warn!(?block_reason, ?finish_reason, "Inference service returned no text");
            return Err(AnalysisFailure::EmptyResponse);
        };

        let analysis = schema::decode_analysis(&text)?;
        debug!(syndrome = %analysis.diagnosis.main_syndrome, "analysis decoded");
        Ok(analysis)
    }
}

impl std::fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("model", &self.model)
            .field("prompt_version", &self.prompt.version)
            .field("thinking_budget", &self.thinking_budget)
            .finish_non_exhaustive()
    }
}
