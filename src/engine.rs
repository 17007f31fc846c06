use tracing::{error, info, warn};

use crate::config::CreativityConfig;
use crate::error::Result;
use crate::evaluator::{CreativityAssessmentResult, CreativityEvaluator};
use crate::generator::ContentGenerator;
use crate::models::{GenerationResult, ProductContext};
use crate::provider::{LlmProvider, ModelProvider};
use crate::registry::ContentType;

/// Result of a complete engine run: generation plus optional evaluation.
#[derive(Debug, Clone)]
pub struct EngineResult {
    pub generation: GenerationResult,
    pub evaluation: Option<CreativityAssessmentResult>,
}

impl EngineResult {
    /// Join key linking generation and evaluation artifacts.
    pub fn generation_id(&self) -> &str {
        &self.generation.generation_id
    }
}

/// Orchestrates the full pipeline: ideation, judging, selection, drafting,
/// then an optional creativity assessment.
///
/// Evaluation is best-effort relative to generation: it is only defined for
/// the video-script content type, and any failure during it is demoted to
/// "no evaluation" rather than failing the request.
pub struct CreativeEngine<P> {
    provider: P,
    config: CreativityConfig,
}

impl CreativeEngine<ModelProvider> {
    /// Build an engine with the provider selected from a model name prefix.
    pub fn from_model(
        config: CreativityConfig,
        model: &str,
        api_key: Option<String>,
    ) -> Result<Self> {
        Ok(Self::new(config, ModelProvider::for_model(model, api_key)?))
    }
}

impl<P: LlmProvider> CreativeEngine<P> {
    pub fn new(config: CreativityConfig, provider: P) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one generation request, optionally followed by evaluation.
    pub async fn generate(
        &self,
        product_context: &ProductContext,
        content_type: ContentType,
        reference_examples: Option<&[String]>,
        evaluate_creativity: bool,
    ) -> Result<EngineResult> {
        let generator = ContentGenerator::new(self.config, &self.provider);
        let generation = generator
            .generate(product_context, content_type, reference_examples)
            .await?;

        let evaluation = if evaluate_creativity {
            self.evaluate(&generation, product_context, content_type).await
        } else {
            None
        };

        Ok(EngineResult {
            generation,
            evaluation,
        })
    }

    async fn evaluate(
        &self,
        generation: &GenerationResult,
        product_context: &ProductContext,
        content_type: ContentType,
    ) -> Option<CreativityAssessmentResult> {
        if content_type != ContentType::VideoScript {
            warn!(
                "creativity evaluation only supported for video_script, got {content_type}; skipping"
            );
            return None;
        }
        let script = generation.content.as_video_script()?;

        info!("phase 3 - creativity evaluation: starting LLM-as-judge assessment");
        let evaluator = CreativityEvaluator::new(&self.provider);
        match evaluator.score_script(script, product_context).await {
            Ok(assessment) => {
                info!(
                    "phase 3 - creativity evaluation: complete, overall score {:.2}",
                    assessment.aggregate.overall.mean
                );
                Some(assessment)
            }
            Err(err) => {
                // generation still succeeds without an assessment
                error!("phase 3 - creativity evaluation failed: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testing::MockProvider;
    use serde_json::json;

    fn test_context() -> ProductContext {
        ProductContext {
            name: "Acme".to_string(),
            target_audience: "devs".to_string(),
            pain_point: "slow CI".to_string(),
            key_benefit: "faster builds".to_string(),
            offer: None,
            platform: None,
        }
    }

    fn test_config() -> CreativityConfig {
        CreativityConfig::new(0.5, 0.7).unwrap()
    }

    fn judge_json(score: f64) -> serde_json::Value {
        let criterion = || json!({ "score": score, "reason": "stub" });
        json!({
            "hook_originality": criterion(),
            "visual_creativity": criterion(),
            "narrative_originality": criterion(),
            "entertainment_value": criterion(),
            "brand_integration": criterion(),
            "platform_fit": criterion(),
            "overall_creativity": criterion(),
            "persona": "any",
        })
    }

    /// Full-pipeline stub: ideation, judging, drafting and (optionally
    /// failing) creativity judging.
    fn full_provider(evaluation_fails: bool) -> MockProvider {
        MockProvider::new(move |system, _, _| {
            if system.contains("Viral Content Strategist") {
                Ok(json!({
                    "concepts": [
                        { "title": "c1", "description": "d", "hook_idea": "h" },
                        { "title": "c2", "description": "d", "hook_idea": "h" },
                    ]
                }))
            } else if system.contains("expert content evaluator") {
                Ok(json!({ "quality_score": 0.9, "reason": "stub" }))
            } else if system.contains("professional video scriptwriter") {
                Ok(json!({
                    "video_meta": { "duration_seconds": 30, "platform": "tiktok" },
                    "scenes": [{
                        "id": 1, "start_sec": 0.0, "end_sec": 30.0, "role": "hook",
                        "visual": "v", "camera": "c", "action": "a", "dialogue": "d",
                        "audio": {}
                    }]
                }))
            } else if evaluation_fails {
                Err("judge offline".to_string())
            } else {
                Ok(judge_json(2.0))
            }
        })
    }

    #[tokio::test]
    async fn test_generate_without_evaluation() {
        let engine = CreativeEngine::new(test_config(), full_provider(false));
        let result = engine
            .generate(&test_context(), ContentType::VideoScript, None, false)
            .await
            .unwrap();

        assert!(result.evaluation.is_none());
        assert_eq!(result.generation.selected_concept.title, "c1");
        assert_eq!(result.generation_id(), result.generation.generation_id);
    }

    #[tokio::test]
    async fn test_generate_with_evaluation() {
        let engine = CreativeEngine::new(test_config(), full_provider(false));
        let result = engine
            .generate(&test_context(), ContentType::VideoScript, None, true)
            .await
            .unwrap();

        let assessment = result.evaluation.unwrap();
        assert!(assessment.temperature_block.is_some());
        assert!(assessment.persona_block.is_some());
        assert!((assessment.aggregate.overall.mean - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_evaluation_degradation_never_fails_generation() {
        // every evaluation call fails: both blocks miss quorum and the
        // aggregate degrades to zero, but the request still succeeds
        let engine = CreativeEngine::new(test_config(), full_provider(true));
        let result = engine
            .generate(&test_context(), ContentType::VideoScript, None, true)
            .await
            .unwrap();

        let assessment = result.evaluation.unwrap();
        assert!(assessment.temperature_block.is_none());
        assert!(assessment.persona_block.is_none());
        assert_eq!(assessment.aggregate.overall.mean, 0.0);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let engine = CreativeEngine::new(test_config(), MockProvider::failing("down"));
        let result = engine
            .generate(&test_context(), ContentType::VideoScript, None, true)
            .await;
        assert!(matches!(result, Err(EngineError::SchemaFidelity { .. })));
    }

    #[test]
    fn test_from_model_rejects_unknown_prefix() {
        let result = CreativeEngine::from_model(test_config(), "mistral-large", Some("k".into()));
        assert!(matches!(result, Err(EngineError::UnknownModel(_))));
    }
}
