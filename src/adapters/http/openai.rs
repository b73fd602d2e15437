use crate::config::toml_config::ServiceConfig;
use crate::core::codec;
use crate::domain::ports::GenerationService;
use crate::utils::error::{DamageLabError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_EDIT_MODEL: &str = "gpt-image-1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1";

const EDIT_SERVICE: &str = "OpenAI image edits";
const CHAT_SERVICE: &str = "OpenAI chat completions";

/// OpenAI 相容 API：圖片編輯與多圖比較
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    api_base: String,
    api_key: Option<String>,
    edit_model: String,
    vision_model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: Some(api_key.into()),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.0,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            http: builder.build()?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            edit_model: config.edit_model.clone(),
            vision_model: config.vision_model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| DamageLabError::MissingConfigError {
                field: "service.api_key (OPENAI_API_KEY)".to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatRequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} error {}: {}", service, status, body);
    Err(DamageLabError::ServiceError {
        service: service.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl GenerationService for OpenAiClient {
    async fn edit(&self, image: &[u8], instruction: &str) -> Result<Vec<u8>> {
        let endpoint = format!("{}/images/edits", self.api_base);
        let file_name = format!("image.{}", codec::extension(image));

        tracing::debug!(
            "Image edit request to {} (model {}, {} bytes, prompt {} chars)",
            endpoint,
            self.edit_model,
            image.len(),
            instruction.len()
        );

        let part = Part::bytes(image.to_vec())
            .file_name(file_name)
            .mime_str(codec::mime_type(image))?;
        let form = Form::new()
            .text("model", self.edit_model.clone())
            .text("prompt", instruction.to_string())
            .part("image[]", part);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(self.api_key()?)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(EDIT_SERVICE, response).await?;

        let body = response.text().await?;
        let parsed: ImagesResponse = serde_json::from_str(&body)?;
        let encoded = parsed
            .data
            .into_iter()
            .find_map(|datum| datum.b64_json)
            .ok_or_else(|| DamageLabError::MissingOutputError {
                service: EDIT_SERVICE.to_string(),
                field: "data[0].b64_json".to_string(),
            })?;

        let bytes = codec::decode_base64(&encoded)?;
        tracing::debug!("Image edit returned {} bytes", bytes.len());
        Ok(bytes)
    }

    async fn compare(&self, image_a: &[u8], image_b: &[u8], instruction: &str) -> Result<String> {
        let endpoint = format!("{}/chat/completions", self.api_base);

        let request = ChatRequest {
            model: &self.vision_model,
            temperature: self.temperature,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: instruction.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: codec::data_url(image_a),
                        },
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: codec::data_url(image_b),
                        },
                    },
                ],
            }],
        };

        tracing::debug!(
            "Vision request to {} (model {}, images {} + {} bytes)",
            endpoint,
            self.vision_model,
            image_a.len(),
            image_b.len()
        );

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(self.api_key()?)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(CHAT_SERVICE, response).await?;

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DamageLabError::MissingOutputError {
                service: CHAT_SERVICE.to_string(),
                field: "choices[0].message.content".to_string(),
            })?;

        tracing::debug!("Vision response: {} chars", content.len());
        Ok(content.trim().to_string())
    }
}
