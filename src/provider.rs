use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{EngineError, Result};

const MAX_TOKENS: u16 = 4096;
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Sampling parameters for a single provider call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f64,
    pub top_p: f64,
}

impl Sampling {
    pub const fn new(temperature: f64, top_p: f64) -> Self {
        Self { temperature, top_p }
    }
}

/// Uniform capability: generate a value conforming to `T`'s JSON schema.
///
/// This is the schema-fidelity boundary. A successful return is guaranteed
/// to be a fully parsed `T`; every implementation tries a native
/// structured-output mode first and falls back to instructing the model via
/// prompt, and a failure of both paths surfaces as
/// [`EngineError::SchemaFidelity`] carrying both error contexts.
#[allow(async_fn_in_trait)]
pub trait LlmProvider {
    fn model_name(&self) -> &str;

    async fn generate<T>(&self, system_prompt: &str, user_prompt: &str, sampling: Sampling) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema;
}

/// JSON Schema for `T`, as the JSON value handed to providers.
fn schema_value<T: JsonSchema>() -> Result<Value> {
    let schema = schemars::r#gen::SchemaGenerator::default().into_root_schema_for::<T>();
    Ok(serde_json::to_value(schema)?)
}

/// Appended to the user prompt on the fallback path.
fn schema_instruction(schema: &Value) -> String {
    format!(
        "\n\nOutput valid JSON matching this schema:\n{}",
        serde_json::to_string_pretty(schema).unwrap_or_default()
    )
}

/// Strip an optional markdown code fence wrapper from model output.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.split_once("```json").map(|(_, rest)| rest) {
        rest.split("```").next().unwrap_or(rest).trim()
    } else if let Some(rest) = trimmed.split_once("```").map(|(_, rest)| rest) {
        rest.split("```").next().unwrap_or(rest).trim()
    } else {
        trimmed
    }
}

/// Decode model text into `T`, tolerating fences and surrounding prose.
fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T> {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str(cleaned) {
        Ok(value) => Ok(value),
        Err(_) => {
            // The model may have wrapped the object in prose; take the
            // outermost brace span and retry.
            let start = cleaned.find('{').ok_or(EngineError::NoJsonInResponse)?;
            let end = cleaned.rfind('}').ok_or(EngineError::NoJsonInResponse)?;
            if end < start {
                return Err(EngineError::NoJsonInResponse);
            }
            Ok(serde_json::from_str(&cleaned[start..=end])?)
        }
    }
}

fn resolve_api_key(
    explicit: Option<String>,
    env_var: &'static str,
    provider: &'static str,
) -> Result<String> {
    explicit
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.is_empty())
        .ok_or(EngineError::MissingApiKey { provider, env_var })
}

/// OpenAI family (`gpt-*`, `o1-*`), backed by `async-openai`.
#[derive(Debug)]
pub struct OpenAiProvider {
    model_name: String,
    api_key: String,
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(model_name: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(api_key, "OPENAI_API_KEY", "OpenAI")?;
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key.clone()));
        Ok(Self {
            model_name: model_name.into(),
            api_key,
            client,
        })
    }

    /// Point the provider at a different API base (tests, proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(self.api_key.clone())
                .with_api_base(api_base),
        );
        self
    }

    async fn generate_structured<T>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        sampling: Sampling,
    ) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = schema_value::<T>()?;
        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt.to_string())
            .build()?
            .into();
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(user_prompt.to_string())
            .build()?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages([system_message, user_message])
            .temperature(sampling.temperature as f32)
            .top_p(sampling.top_p as f32)
            .max_tokens(MAX_TOKENS)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name: "structured_output".to_string(),
                    description: None,
                    schema: Some(schema),
                    strict: Some(false),
                },
            })
            .build()?;

        let response = self.client.chat().create(request).await?;
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(EngineError::EmptyResponse)?;

        parse_structured(&content)
    }

    async fn generate_with_schema_prompt<T>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        sampling: Sampling,
    ) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = schema_value::<T>()?;
        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt.to_string())
            .build()?
            .into();
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(format!("{user_prompt}{}", schema_instruction(&schema)))
            .build()?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages([system_message, user_message])
            .temperature(sampling.temperature as f32)
            .top_p(sampling.top_p as f32)
            .max_tokens(MAX_TOKENS)
            .build()?;

        let response = self.client.chat().create(request).await?;
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(EngineError::EmptyResponse)?;

        parse_structured(&content)
    }
}

impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate<T>(&self, system_prompt: &str, user_prompt: &str, sampling: Sampling) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        match self.generate_structured(system_prompt, user_prompt, sampling).await {
            Ok(value) => Ok(value),
            Err(primary) => {
                debug!(model = %self.model_name, %primary, "structured output failed, trying schema prompt");
                self.generate_with_schema_prompt(system_prompt, user_prompt, sampling)
                    .await
                    .map_err(|fallback| EngineError::SchemaFidelity {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    })
            }
        }
    }
}

/// Anthropic family (`claude-*`), spoken to over raw HTTP.
///
/// The native structured path forces a tool call carrying the output schema
/// as its input schema.
#[derive(Debug)]
pub struct AnthropicProvider {
    model_name: String,
    api_key: String,
    api_base: String,
    http: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(model_name: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(api_key, "ANTHROPIC_API_KEY", "Anthropic")?;
        Ok(Self {
            model_name: model_name.into(),
            api_key,
            api_base: ANTHROPIC_API_BASE.to_string(),
            http: reqwest::Client::new(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn post_messages(&self, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/v1/messages", self.api_base.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn generate_structured<T>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        sampling: Sampling,
    ) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = schema_value::<T>()?;
        let body = json!({
            "model": self.model_name,
            "max_tokens": MAX_TOKENS,
            "temperature": sampling.temperature,
            "top_p": sampling.top_p,
            "system": system_prompt,
            "messages": [{ "role": "user", "content": user_prompt }],
            "tools": [{
                "name": "emit_structured_output",
                "description": "Emit the requested structured output",
                "input_schema": schema,
            }],
            "tool_choice": { "type": "tool", "name": "emit_structured_output" },
        });

        let response = self.post_messages(body).await?;
        let block = response["content"]
            .get(0)
            .ok_or(EngineError::EmptyResponse)?;

        if let Some(input) = block.get("input") {
            Ok(serde_json::from_value(input.clone())?)
        } else if let Some(text) = block.get("text").and_then(Value::as_str) {
            parse_structured(text)
        } else {
            Err(EngineError::EmptyResponse)
        }
    }

    async fn generate_with_schema_prompt<T>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        sampling: Sampling,
    ) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = schema_value::<T>()?;
        let body = json!({
            "model": self.model_name,
            "max_tokens": MAX_TOKENS,
            "temperature": sampling.temperature,
            "top_p": sampling.top_p,
            "system": system_prompt,
            "messages": [{
                "role": "user",
                "content": format!("{user_prompt}{}", schema_instruction(&schema)),
            }],
        });

        let response = self.post_messages(body).await?;
        let text = response["content"]
            .get(0)
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str)
            .ok_or(EngineError::EmptyResponse)?;

        parse_structured(text)
    }
}

impl LlmProvider for AnthropicProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate<T>(&self, system_prompt: &str, user_prompt: &str, sampling: Sampling) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        match self.generate_structured(system_prompt, user_prompt, sampling).await {
            Ok(value) => Ok(value),
            Err(primary) => {
                debug!(model = %self.model_name, %primary, "tool-use output failed, trying schema prompt");
                self.generate_with_schema_prompt(system_prompt, user_prompt, sampling)
                    .await
                    .map_err(|fallback| EngineError::SchemaFidelity {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    })
            }
        }
    }
}

/// Google Gemini family (`gemini-*`), spoken to over raw HTTP.
///
/// Gemini has no separate system role here, so the system prompt is
/// prepended to the user prompt.
#[derive(Debug)]
pub struct GeminiProvider {
    model_name: String,
    api_key: String,
    api_base: String,
    http: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(model_name: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(api_key, "GOOGLE_API_KEY", "Google")?;
        Ok(Self {
            model_name: model_name.into(),
            api_key,
            api_base: GEMINI_API_BASE.to_string(),
            http: reqwest::Client::new(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn generate_content(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        sampling: Sampling,
        json_mime: bool,
    ) -> Result<String> {
        let mut generation_config = json!({
            "temperature": sampling.temperature,
            "topP": sampling.top_p,
        });
        if json_mime {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let body = json!({
            "contents": [{
                "parts": [{ "text": format!("{system_prompt}\n\n{user_prompt}") }],
            }],
            "generationConfig": generation_config,
        });

        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base.trim_end_matches('/'),
                self.model_name
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let value: Value = response.json().await?;
        value["candidates"]
            .get(0)
            .and_then(|candidate| candidate["content"]["parts"].get(0))
            .and_then(|part| part["text"].as_str())
            .map(str::to_string)
            .ok_or(EngineError::EmptyResponse)
    }
}

impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate<T>(&self, system_prompt: &str, user_prompt: &str, sampling: Sampling) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = schema_value::<T>()?;
        let prompt = format!("{user_prompt}{}", schema_instruction(&schema));

        let primary = match self
            .generate_content(system_prompt, &prompt, sampling, true)
            .await
            .and_then(|text| parse_structured(&text))
        {
            Ok(value) => return Ok(value),
            Err(primary) => primary,
        };

        debug!(model = %self.model_name, %primary, "JSON mode failed, retrying without it");
        self.generate_content(system_prompt, &prompt, sampling, false)
            .await
            .and_then(|text| parse_structured(&text))
            .map_err(|fallback| EngineError::SchemaFidelity {
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            })
    }
}

/// Provider selected by model-name prefix.
#[derive(Debug)]
pub enum ModelProvider {
    OpenAi(OpenAiProvider),
    Anthropic(AnthropicProvider),
    Gemini(GeminiProvider),
}

impl ModelProvider {
    /// Create the appropriate provider for a model name.
    ///
    /// `gpt-*` and `o1-*` map to OpenAI, `claude-*` to Anthropic,
    /// `gemini-*` to Google; anything else is an unknown-model error.
    pub fn for_model(model: &str, api_key: Option<String>) -> Result<Self> {
        let lower = model.to_lowercase();
        if lower.starts_with("gpt-") || lower.starts_with("o1-") {
            Ok(ModelProvider::OpenAi(OpenAiProvider::new(model, api_key)?))
        } else if lower.starts_with("claude-") {
            Ok(ModelProvider::Anthropic(AnthropicProvider::new(model, api_key)?))
        } else if lower.starts_with("gemini-") {
            Ok(ModelProvider::Gemini(GeminiProvider::new(model, api_key)?))
        } else {
            Err(EngineError::UnknownModel(model.to_string()))
        }
    }
}

impl LlmProvider for ModelProvider {
    fn model_name(&self) -> &str {
        match self {
            ModelProvider::OpenAi(provider) => provider.model_name(),
            ModelProvider::Anthropic(provider) => provider.model_name(),
            ModelProvider::Gemini(provider) => provider.model_name(),
        }
    }

    async fn generate<T>(&self, system_prompt: &str, user_prompt: &str, sampling: Sampling) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        match self {
            ModelProvider::OpenAi(provider) => {
                provider.generate(system_prompt, user_prompt, sampling).await
            }
            ModelProvider::Anthropic(provider) => {
                provider.generate(system_prompt, user_prompt, sampling).await
            }
            ModelProvider::Gemini(provider) => {
                provider.generate(system_prompt, user_prompt, sampling).await
            }
        }
    }
}
