use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    error::{PipelineError, Result},
    image::{ImageFetcher, InlineImage},
    log::LogSink,
    provider::{Provider, ProviderError},
    types::{AnalysisResult, MAX_PROMPT_CHARS, VIRAL_FACTOR_COUNT, VideoRecord},
};

static SYSTEM_INSTRUCTION: &str = r#"
You are an expert viral video consultant and AI prompt engineer.
Your goal is to analyze TikTok video metadata (and visual thumbnails if provided) to create highly effective image/video generation prompts.
These prompts will be used in tools like Runway Gen-3, Pika, or Sora to recreate the *style*, *composition*, and *vibe* of the original viral video.

Output must be JSON.
"#;

/// Theme the model invents a scenario around when there is no real video.
pub const DEMO_THEME: &str = "a futuristic AI workflow demo";

/// JSON schema the model's reply must satisfy.
pub static ANALYSIS_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "description": "The optimized prompt for video generation tools."
            },
            "technicalDetails": {
                "type": "string",
                "description": "Camera settings, lighting, and style notes."
            },
            "viralFactors": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": VIRAL_FACTOR_COUNT,
                "maxItems": VIRAL_FACTOR_COUNT,
                "description": "Three reasons why this style is viral."
            }
        },
        "required": ["prompt", "technicalDetails", "viralFactors"],
        "additionalProperties": false
    })
});

#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Image(InlineImage),
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub parts: Vec<ContentPart>,
    pub schema: Value,
}

impl GenerationRequest {
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image(&self) -> Option<&InlineImage> {
        self.parts.iter().find_map(|p| match p {
            ContentPart::Image(image) => Some(image),
            ContentPart::Text(_) => None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid API response: {0}")]
    InvalidResponse(Value),
}

/// A structured-output capable text generation backend.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the raw reply text, `None` when the model sent nothing back.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<Option<String>, ModelError>;
}

/// OpenAI-compatible `/chat/completions` client, used for every [`Provider`].
pub struct ChatCompletionsModel {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
    label: String,
}

impl ChatCompletionsModel {
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            label: label.into(),
        }
    }

    pub fn for_provider(
        provider: &Provider,
        model: Option<String>,
    ) -> std::result::Result<Self, ModelError> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;
        let model = model.unwrap_or_else(|| config.model.to_string());
        let label = format!("{} ({})", provider.name(), model);

        Ok(Self::new(config.api_url, model, api_key, label))
    }

    pub fn request_body(&self, request: &GenerationRequest) -> Value {
        let content: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => json!({ "type": "text", "text": text }),
                ContentPart::Image(image) => json!({
                    "type": "image_url",
                    "image_url": { "url": image.data_url() },
                }),
            })
            .collect();

        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": request.system_instruction,
                },
                {
                    "role": "user",
                    "content": content,
                },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "video_analysis",
                    "strict": true,
                    "schema": request.schema,
                },
            },
        })
    }
}

#[async_trait]
impl GenerativeModel for ChatCompletionsModel {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<Option<String>, ModelError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let response = response.json::<Value>().await?;
        let Some(choice) = response["choices"].get(0) else {
            return Err(ModelError::InvalidResponse(response));
        };

        Ok(choice["message"]["content"].as_str().map(str::to_string))
    }
}

/// Instruction text sent alongside the (optional) thumbnail.
pub fn build_instruction(record: &VideoRecord) -> String {
    let likes = record
        .like_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let mut text = format!(
        "Analyze this TikTok video to create a generation prompt.

Metadata:
- Author: {author}
- Description/Caption: {description}
- Duration: {duration}s
- Engagement: {likes} likes

Task:
1. Identify the core visual aesthetics (lighting, camera angle, color palette).
2. Identify the subject and action.
3. Create a highly detailed prompt (max {max_chars} chars) for an AI video generator.
4. List exactly {factors} key factors that likely made this video viral, most important first.
",
        author = record.author,
        description = record.description.as_deref().unwrap_or("None"),
        duration = record.duration_seconds,
        max_chars = MAX_PROMPT_CHARS,
        factors = VIRAL_FACTOR_COUNT,
    );

    if record.is_demo {
        text.push_str(&format!(
            "\nNOTE: This is a demo placeholder with no real footage. Invent a plausible viral video scenario based on the theme '{DEMO_THEME}'.\n"
        ));
    }

    text
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// Parse the model's reply. Anything short of all three fields is a failure.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    if raw.trim().is_empty() {
        return Err(PipelineError::analysis("empty response"));
    }

    let mut result: AnalysisResult = serde_json::from_str(raw)
        .map_err(|e| PipelineError::analysis(format!("malformed model response: {e}")))?;

    if result.prompt.trim().is_empty() {
        return Err(PipelineError::analysis("model returned an empty prompt"));
    }

    if result.viral_factors.len() != VIRAL_FACTOR_COUNT {
        return Err(PipelineError::analysis(format!(
            "expected {} viral factors, got {}",
            VIRAL_FACTOR_COUNT,
            result.viral_factors.len()
        )));
    }

    result.prompt = truncate_chars(result.prompt.trim(), MAX_PROMPT_CHARS);
    Ok(result)
}

pub struct Analyzer {
    model: Arc<dyn GenerativeModel>,
    images: ImageFetcher,
}

impl Analyzer {
    pub fn new(model: Arc<dyn GenerativeModel>, images: ImageFetcher) -> Self {
        Self { model, images }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Assemble the request for `record`, attaching the thumbnail when it can be fetched.
    pub async fn build_request(
        &self,
        record: &VideoRecord,
        log: &dyn LogSink,
    ) -> GenerationRequest {
        let mut parts = vec![ContentPart::Text(build_instruction(record))];

        if !record.is_demo && !record.thumbnail_url.is_empty() {
            log.info("Fetching thumbnail for multimodal analysis...");
            match self
                .images
                .fetch_image_as_base64(&record.thumbnail_url)
                .await
            {
                Some(image) => {
                    parts.push(ContentPart::Image(image));
                    log.success("Thumbnail attached successfully.");
                }
                None => log.info("Could not fetch thumbnail. Proceeding with text-only analysis."),
            }
        }

        GenerationRequest {
            system_instruction: SYSTEM_INSTRUCTION.trim().to_string(),
            parts,
            schema: ANALYSIS_SCHEMA.clone(),
        }
    }

    pub async fn analyze(&self, record: &VideoRecord, log: &dyn LogSink) -> Result<AnalysisResult> {
        log.info(&format!("Initializing {}...", self.model.name()));

        let request = self.build_request(record, log).await;

        log.info(&format!("Sending data to {}...", self.model.name()));
        debug!(
            demo = record.is_demo,
            with_image = request.image().is_some(),
            "sending analysis request"
        );

        let reply = self
            .model
            .generate(&request)
            .await
            .map_err(|e| PipelineError::analysis(e.to_string()))?;

        let Some(raw) = reply else {
            return Err(PipelineError::analysis("empty response"));
        };

        let result = parse_analysis(&raw)?;
        log.success("Analysis received!");
        Ok(result)
    }
}
