use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use super::VisionService;
use crate::config::Config;
use crate::models::FoodImage;

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Google Gemini `generateContent` client
pub struct GeminiService {
    api_key: String,
    model: String,
    api_base: String,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_key: config.api_key.get().unwrap_or_default().to_string(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            client: builder.build().context("Failed to build HTTP client")?,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    fn build_request(prompt: &str, jpeg: &[u8]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: general_purpose::STANDARD.encode(jpeg),
                        },
                    },
                ],
            }],
        }
    }

    /// Join the text parts of the first candidate, like the SDKs' `.text`.
    fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            match response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => anyhow::bail!("Gemini blocked the prompt: {}", reason),
                None => anyhow::bail!("Gemini returned no candidates"),
            }
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            anyhow::bail!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl VisionService for GeminiService {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, image: &FoodImage) -> Result<String> {
        log::debug!("📸 Encoding {}x{} image for Gemini", image.width(), image.height());

        let jpeg = image.encode_jpeg().await?;
        log::debug!("📊 JPEG payload size: {} bytes", jpeg.len());

        let request = Self::build_request(prompt, &jpeg);

        log::info!("🤖 Sending request to Gemini with model: {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Gemini response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::error!("❌ Gemini API error response: {}", error_text);
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let response_text = response.text().await?;
        log::debug!("📄 Raw Gemini response size: {} bytes", response_text.len());

        let parsed: GenerateContentResponse =
            serde_json::from_str(&response_text).context("Malformed Gemini response")?;
        let text = Self::extract_text(parsed)?;

        log::info!("💬 Gemini response: {} chars", text.len());
        Ok(text)
    }
}
