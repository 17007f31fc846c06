//! Shared test doubles.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::provider::{LlmProvider, Sampling};

type Handler =
    Box<dyn Fn(&str, &str, Sampling) -> std::result::Result<Value, String> + Send + Sync>;

/// Deterministic provider stub.
///
/// Responses are computed from the prompts and sampling parameters of each
/// call rather than from call order, so batches dispatched concurrently stay
/// deterministic.
pub(crate) struct MockProvider {
    handler: Handler,
}

impl MockProvider {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &str, Sampling) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    /// A provider whose every call fails with the given message.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_, _, _| Err(message.clone()))
    }
}

impl LlmProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn generate<T>(&self, system_prompt: &str, user_prompt: &str, sampling: Sampling) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        match (self.handler)(system_prompt, user_prompt, sampling) {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(message) => Err(EngineError::SchemaFidelity {
                primary: message,
                fallback: "stubbed call".to_string(),
            }),
        }
    }
}
