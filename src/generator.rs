use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::{CreativityConfig, EngineParameters, map_creativity};
use crate::error::{EngineError, Result};
use crate::models::{
    Concept, DraftedContent, GenerationResult, IdeationOutput, ProductContext, ScoredConcept,
    VideoScript, new_generation_id,
};
use crate::provider::{LlmProvider, Sampling};
use crate::registry::{ContentDefinition, ContentType, get_content_definition, render};

/// Fixed low-variance sampling for concept judging.
const JUDGE_SAMPLING: Sampling = Sampling::new(0.3, 0.9);

/// Upper bound on concurrent judge calls, keeping batch fan-out within
/// upstream rate limits.
const JUDGE_CONCURRENCY: usize = 4;

/// Content Generator implementing the Phase 1-2 pipeline:
/// ideate (divergence), judge, select, draft (convergence).
pub struct ContentGenerator<'a, P> {
    provider: &'a P,
    config: CreativityConfig,
}

impl<'a, P: LlmProvider> ContentGenerator<'a, P> {
    pub fn new(config: CreativityConfig, provider: &'a P) -> Self {
        Self { provider, config }
    }

    /// Run the full divergence-convergence pipeline for one request.
    pub async fn generate(
        &self,
        product_context: &ProductContext,
        content_type: ContentType,
        reference_examples: Option<&[String]>,
    ) -> Result<GenerationResult> {
        // Parameters are derived once per request and threaded through.
        let params = map_creativity(self.config.creativity_level, self.config.quality_threshold);
        let definition = get_content_definition(content_type)?;

        let concepts = self
            .ideate(&params, definition, product_context, content_type, reference_examples)
            .await?;
        if concepts.is_empty() {
            return Err(EngineError::EmptyIdeation);
        }

        let scored_concepts = self
            .judge_all_concepts(definition, &concepts, product_context)
            .await;
        let best = select_best_concept(&scored_concepts, params.quality_threshold)?;

        let content = self
            .draft_content(&params, definition, &best, product_context, content_type)
            .await?;

        info!(
            "generation complete: selected '{}' (score={:.3}), drafted {}",
            best.concept.title,
            best.quality_score(),
            content_type
        );

        Ok(GenerationResult {
            generation_id: new_generation_id(),
            content_type,
            content,
            selected_concept: best.concept.clone(),
            concept_score: best.quality_score(),
            concepts,
            scored_concepts,
            product_context: product_context.clone(),
            reference_examples: reference_examples.map(<[String]>::to_vec),
        })
    }

    /// Phase 1: generate multiple creative concepts.
    async fn ideate(
        &self,
        params: &EngineParameters,
        definition: &ContentDefinition,
        product_context: &ProductContext,
        content_type: ContentType,
        reference_examples: Option<&[String]>,
    ) -> Result<Vec<Concept>> {
        let num_branches = params.num_branches.to_string();
        let system_prompt = render(
            definition.ideation_system_prompt,
            &[("num_branches", &num_branches)],
        );
        let mut user_prompt = render(
            definition.ideation_user_prompt_template,
            &[
                ("num_branches", &num_branches),
                ("product_name", &product_context.name),
                ("target_audience", &product_context.target_audience),
                ("pain_point", &product_context.pain_point),
                ("key_benefit", &product_context.key_benefit),
                ("offer", product_context.offer()),
            ],
        );

        if let Some(examples) = reference_examples.filter(|examples| !examples.is_empty()) {
            user_prompt.push_str("\n\nReference Examples (transcend these, don't remix):\n");
            for (i, example) in examples.iter().enumerate() {
                user_prompt.push_str(&format!("{}. {example}\n", i + 1));
            }
        }

        info!(
            "phase 1 - ideation: content_type={}, num_branches={}, temperature={:.2}, top_p={:.2}",
            content_type, params.num_branches, params.temperature, params.top_p
        );

        let output: IdeationOutput = self
            .provider
            .generate(
                &system_prompt,
                &user_prompt,
                Sampling::new(params.temperature, params.top_p),
            )
            .await?;

        info!("phase 1 - ideation: generated {} concepts", output.concepts.len());
        for (i, concept) in output.concepts.iter().enumerate() {
            debug!("  concept {}: {}", i + 1, concept.title);
        }

        Ok(output.concepts)
    }

    /// Judge a single concept for quality.
    async fn judge_concept(
        &self,
        definition: &ContentDefinition,
        concept: &Concept,
        product_context: &ProductContext,
    ) -> Result<ScoredConcept> {
        let user_prompt = render(
            definition.judge_user_prompt_template,
            &[
                ("product_name", &product_context.name),
                ("target_audience", &product_context.target_audience),
                ("pain_point", &product_context.pain_point),
                ("key_benefit", &product_context.key_benefit),
                ("concept_title", &concept.title),
                ("concept_description", &concept.description),
                ("concept_hook", &concept.hook_idea),
            ],
        );

        let score: crate::models::ConceptScore = self
            .provider
            .generate(definition.judge_system_prompt, &user_prompt, JUDGE_SAMPLING)
            .await?;
        score.validate()?;

        Ok(ScoredConcept {
            concept: concept.clone(),
            score,
        })
    }

    /// Phase 1b: judge all concepts as a bounded concurrent batch.
    ///
    /// A single failing judge call only drops that concept from the
    /// candidate pool; selection fails downstream when nothing survives.
    async fn judge_all_concepts(
        &self,
        definition: &ContentDefinition,
        concepts: &[Concept],
        product_context: &ProductContext,
    ) -> Vec<ScoredConcept> {
        info!("phase 1b - judge: evaluating {} concepts", concepts.len());

        let mut judged: Vec<(usize, ScoredConcept)> = futures::stream::iter(
            concepts.iter().enumerate().map(|(index, concept)| async move {
                match self.judge_concept(definition, concept, product_context).await {
                    Ok(scored) => {
                        info!(
                            "  judged '{}': score={:.3}, reason={}",
                            scored.concept.title,
                            scored.quality_score(),
                            truncate(&scored.score.reason, 100),
                        );
                        Some((index, scored))
                    }
                    Err(error) => {
                        warn!("  judge call failed for '{}': {error}", concept.title);
                        None
                    }
                }
            }),
        )
        .buffer_unordered(JUDGE_CONCURRENCY)
        .filter_map(std::future::ready)
        .collect()
        .await;

        // restore 1:1 pairing with the ideation order
        judged.sort_by_key(|(index, _)| *index);
        judged.into_iter().map(|(_, scored)| scored).collect()
    }

    /// Phase 2: convert the selected concept into structured content.
    async fn draft_content(
        &self,
        params: &EngineParameters,
        definition: &ContentDefinition,
        selected: &ScoredConcept,
        product_context: &ProductContext,
        content_type: ContentType,
    ) -> Result<DraftedContent> {
        let user_prompt = render(
            definition.writing_user_prompt_template,
            &[
                ("product_name", &product_context.name),
                ("target_audience", &product_context.target_audience),
                ("pain_point", &product_context.pain_point),
                ("key_benefit", &product_context.key_benefit),
                ("offer", product_context.offer()),
                ("concept_title", &selected.concept.title),
                ("concept_description", &selected.concept.description),
                ("concept_hook", &selected.concept.hook_idea),
                ("platform", product_context.platform()),
            ],
        );

        info!(
            "phase 2 - writing: converting concept '{}' to {}",
            selected.concept.title, content_type
        );

        let sampling = Sampling::new(params.temperature, params.top_p);
        let content = match content_type {
            ContentType::VideoScript => {
                let script: VideoScript = self
                    .provider
                    .generate(definition.writing_system_prompt, &user_prompt, sampling)
                    .await?;
                DraftedContent::VideoScript(script)
            }
            other => return Err(EngineError::UnregisteredContentType(other)),
        };

        info!("phase 2 - writing: content generated successfully");
        Ok(content)
    }
}

/// Select the best concept above the quality threshold.
///
/// Falls back to the highest-scoring concept overall when nothing clears the
/// threshold; the threshold narrows the pool, it never causes total failure.
fn select_best_concept(
    scored_concepts: &[ScoredConcept],
    quality_threshold: f64,
) -> Result<ScoredConcept> {
    if scored_concepts.is_empty() {
        return Err(EngineError::NoScoredConcepts);
    }

    let valid: Vec<&ScoredConcept> = scored_concepts
        .iter()
        .filter(|sc| sc.quality_score() >= quality_threshold)
        .collect();

    info!(
        "phase 1b - selection: {}/{} concepts above threshold ({:.2})",
        valid.len(),
        scored_concepts.len(),
        quality_threshold
    );

    let candidates = if valid.is_empty() {
        warn!(
            "phase 1b - selection: no concepts above quality_threshold={:.2}, falling back to best overall",
            quality_threshold
        );
        scored_concepts.iter().collect()
    } else {
        valid
    };

    let best = candidates
        .into_iter()
        .max_by(|a, b| {
            a.quality_score()
                .partial_cmp(&b.quality_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("candidate list is non-empty");

    info!(
        "phase 1b - selection: selected '{}' with score={:.3}",
        best.concept.title,
        best.quality_score()
    );
    Ok(best.clone())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max_chars).collect();
        format!("{prefix}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConceptScore;
    use crate::testing::MockProvider;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    fn test_context() -> ProductContext {
        ProductContext {
            name: "Acme".to_string(),
            target_audience: "devs".to_string(),
            pain_point: "slow CI".to_string(),
            key_benefit: "faster builds".to_string(),
            offer: Some("free trial".to_string()),
            platform: None,
        }
    }

    fn test_config() -> CreativityConfig {
        CreativityConfig::new(0.7, 0.75).unwrap()
    }

    fn concepts_value(titles: &[&str]) -> Value {
        json!({
            "concepts": titles.iter().map(|title| json!({
                "title": title,
                "description": format!("{title} description"),
                "hook_idea": format!("{title} hook"),
            })).collect::<Vec<_>>()
        })
    }

    fn script_value() -> Value {
        json!({
            "video_meta": { "duration_seconds": 30, "platform": "tiktok" },
            "scenes": [{
                "id": 1,
                "start_sec": 0.0,
                "end_sec": 30.0,
                "role": "hook",
                "visual": "v",
                "camera": "c",
                "action": "a",
                "dialogue": "d",
                "audio": {}
            }]
        })
    }

    fn scored(title: &str, score: f64) -> ScoredConcept {
        ScoredConcept {
            concept: Concept {
                title: title.to_string(),
                description: String::new(),
                hook_idea: String::new(),
            },
            score: ConceptScore {
                quality_score: score,
                reason: "r".to_string(),
            },
        }
    }

    /// Stub provider routing on prompt content: ideation returns the given
    /// titles, judging scores each title from the table, drafting returns a
    /// fixed script. Judge calls for titles in `failing_judges` fail.
    fn pipeline_provider(titles_scores: Vec<(&'static str, f64)>, failing_judges: Vec<&'static str>) -> MockProvider {
        MockProvider::new(move |system, user, _| {
            if system.contains("Viral Content Strategist") {
                let titles: Vec<&str> = titles_scores.iter().map(|(t, _)| *t).collect();
                Ok(concepts_value(&titles))
            } else if system.contains("expert content evaluator") {
                for title in &failing_judges {
                    if user.contains(&format!("Title: {title}")) {
                        return Err(format!("judge exploded for {title}"));
                    }
                }
                let (_, score) = titles_scores
                    .iter()
                    .find(|(title, _)| user.contains(&format!("Title: {title}")))
                    .expect("judge prompt names a known concept");
                Ok(json!({ "quality_score": score, "reason": "stub" }))
            } else if system.contains("professional video scriptwriter") {
                Ok(script_value())
            } else {
                Err(format!("unexpected system prompt: {system}"))
            }
        })
    }

    #[tokio::test]
    async fn test_generate_selects_highest_above_threshold() {
        // creativity 0.7 -> 6 branches; threshold 0.75 leaves c3, c4, c5
        let provider = pipeline_provider(
            vec![
                ("c1", 0.3),
                ("c2", 0.5),
                ("c3", 0.75),
                ("c4", 0.8),
                ("c5", 0.9),
                ("c6", 0.6),
            ],
            vec![],
        );
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await
            .unwrap();

        assert_eq!(result.selected_concept.title, "c5");
        assert_eq!(result.concept_score, 0.9);
        assert_eq!(result.concepts.len(), 6);
        assert_eq!(result.scored_concepts.len(), 6);
        assert!(result.content.as_video_script().is_some());
        assert_eq!(result.content_type, ContentType::VideoScript);
    }

    #[tokio::test]
    async fn test_generate_falls_back_when_all_below_threshold() {
        let provider = pipeline_provider(
            vec![("c1", 0.1), ("c2", 0.4), ("c3", 0.3)],
            vec![],
        );
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await
            .unwrap();
        assert_eq!(result.selected_concept.title, "c2");
    }

    #[tokio::test]
    async fn test_generate_propagates_ideation_failure() {
        let provider = MockProvider::failing("provider down");
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await;
        assert!(matches!(result, Err(EngineError::SchemaFidelity { .. })));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_ideation() {
        let provider = MockProvider::new(|_, _, _| Ok(json!({ "concepts": [] })));
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await;
        assert!(matches!(result, Err(EngineError::EmptyIdeation)));
    }

    #[tokio::test]
    async fn test_single_judge_failure_only_drops_that_concept() {
        let provider = pipeline_provider(
            vec![("c1", 0.8), ("c2", 0.9), ("c3", 0.85)],
            vec!["c2"],
        );
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await
            .unwrap();
        assert_eq!(result.scored_concepts.len(), 2);
        assert_eq!(result.selected_concept.title, "c3");
    }

    #[tokio::test]
    async fn test_out_of_range_judge_score_drops_concept() {
        // c1's judge reports 1.4, outside [0.0, 1.0]: the concept is dropped
        let provider = pipeline_provider(vec![("c1", 1.4), ("c2", 0.8)], vec![]);
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await
            .unwrap();
        assert_eq!(result.scored_concepts.len(), 1);
        assert_eq!(result.selected_concept.title, "c2");
    }

    #[tokio::test]
    async fn test_all_judges_failing_aborts_request() {
        let provider = pipeline_provider(
            vec![("c1", 0.8), ("c2", 0.9)],
            vec!["c1", "c2"],
        );
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await;
        assert!(matches!(result, Err(EngineError::NoScoredConcepts)));
    }

    #[tokio::test]
    async fn test_judge_uses_fixed_low_temperature_and_draft_uses_ideation_sampling() {
        let samplings: Arc<Mutex<Vec<(String, Sampling)>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = samplings.clone();

        let provider = MockProvider::new(move |system, _, sampling| {
            let kind = if system.contains("Viral Content Strategist") {
                "ideate"
            } else if system.contains("expert content evaluator") {
                "judge"
            } else {
                "draft"
            };
            recorded.lock().unwrap().push((kind.to_string(), sampling));
            match kind {
                "ideate" => Ok(concepts_value(&["c1", "c2"])),
                "judge" => Ok(json!({ "quality_score": 0.9, "reason": "stub" })),
                _ => Ok(script_value()),
            }
        });

        let generator = ContentGenerator::new(test_config(), &provider);
        generator
            .generate(&test_context(), ContentType::VideoScript, None)
            .await
            .unwrap();

        let samplings = samplings.lock().unwrap();
        for (kind, sampling) in samplings.iter() {
            match kind.as_str() {
                "judge" => assert_eq!(*sampling, Sampling::new(0.3, 0.9)),
                // creativity 0.7 maps to temperature 0.96, top_p 0.88
                _ => assert_eq!(*sampling, Sampling::new(0.96, 0.88)),
            }
        }
    }

    #[tokio::test]
    async fn test_reference_examples_are_appended_to_ideation_prompt() {
        let saw_examples = Arc::new(Mutex::new(false));
        let flag = saw_examples.clone();

        let provider = MockProvider::new(move |system, user, _| {
            if system.contains("Viral Content Strategist") {
                if user.contains("transcend these, don't remix") && user.contains("1. deadpan stare") {
                    *flag.lock().unwrap() = true;
                }
                Ok(concepts_value(&["c1", "c2"]))
            } else if system.contains("expert content evaluator") {
                Ok(json!({ "quality_score": 0.9, "reason": "stub" }))
            } else {
                Ok(script_value())
            }
        });

        let generator = ContentGenerator::new(test_config(), &provider);
        let examples = vec!["deadpan stare".to_string()];
        let result = generator
            .generate(&test_context(), ContentType::VideoScript, Some(&examples))
            .await
            .unwrap();

        assert!(*saw_examples.lock().unwrap());
        assert_eq!(result.reference_examples.as_deref(), Some(&examples[..]));
    }

    #[tokio::test]
    async fn test_unregistered_content_type_fails_before_any_call() {
        let provider = MockProvider::failing("should never be called");
        let generator = ContentGenerator::new(test_config(), &provider);

        let result = generator
            .generate(&test_context(), ContentType::AdCopy, None)
            .await;
        assert!(matches!(
            result,
            Err(EngineError::UnregisteredContentType(ContentType::AdCopy))
        ));
    }

    #[test]
    fn test_select_best_concept_threshold_and_fallback() {
        let pool = vec![
            scored("a", 0.3),
            scored("b", 0.76),
            scored("c", 0.9),
            scored("d", 0.8),
            scored("e", 0.5),
        ];
        let best = select_best_concept(&pool, 0.75).unwrap();
        assert_eq!(best.concept.title, "c");

        // nothing clears the bar: overall maximum wins instead
        let best = select_best_concept(&pool, 0.95).unwrap();
        assert_eq!(best.concept.title, "c");
    }

    #[test]
    fn test_select_best_concept_empty_list() {
        let result = select_best_concept(&[], 0.5);
        assert!(matches!(result, Err(EngineError::NoScoredConcepts)));
    }
}
