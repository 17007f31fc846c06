use crate::registry::ContentType;

/// Library-wide error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Creativity level outside the accepted range at construction.
    #[error("creativity_level must be between 0.0 and 1.0, got {0}")]
    InvalidCreativityLevel(f64),

    /// Quality threshold outside the accepted range at construction.
    #[error("quality_threshold must be between 0.0 and 1.0, got {0}")]
    InvalidQualityThreshold(f64),

    /// Model name did not match any known provider family prefix.
    #[error(
        "unknown model '{0}': supported prefixes are 'gpt-', 'o1-' (OpenAI), \
         'claude-' (Anthropic), 'gemini-' (Google)"
    )]
    UnknownModel(String),

    /// No API key supplied and the provider's environment variable is unset.
    #[error("{provider} API key is required: set {env_var} or pass an explicit key")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    /// Content type has no registered prompt templates or output schema.
    #[error("content type '{0}' is not registered")]
    UnregisteredContentType(ContentType),

    /// Reference style name not found in the built-in example sets.
    #[error("unknown reference style '{0}': expected 'varun', 'austin' or 'mixed'")]
    UnknownReferenceStyle(String),

    /// Both the native structured-output path and the schema-in-prompt
    /// fallback failed to produce a schema-conforming value.
    #[error("structured generation failed: {primary}; fallback also failed: {fallback}")]
    SchemaFidelity { primary: String, fallback: String },

    /// Provider returned a response with no usable content.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// A judge score fell outside its documented range.
    #[error("score {value} outside expected range [{min}, {max}]")]
    ScoreOutOfRange { value: f64, min: f64, max: f64 },

    /// Provider response could not be interpreted as JSON at all.
    #[error("no JSON object found in provider response")]
    NoJsonInResponse,

    /// Ideation produced zero concepts.
    #[error("ideation returned no concepts")]
    EmptyIdeation,

    /// Every concept-judge call failed, leaving nothing to select from.
    #[error("no scored concepts available for selection")]
    NoScoredConcepts,

    #[error(transparent)]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
