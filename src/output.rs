use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::EngineResult;
use crate::evaluator::CreativityAssessmentResult;

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print an engine result in the chosen format.
pub fn print_result(result: &EngineResult, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_plain(result),
        OutputFormat::Json => print_json(result),
    }
}

fn print_plain(result: &EngineResult) {
    let generation = &result.generation;

    println!("=== Generation {} ===", generation.generation_id);
    println!();
    println!("Selected Concept: {}", generation.selected_concept.title);
    println!("Quality Score: {:.2}", generation.concept_score);
    println!("Hook: {}", generation.selected_concept.hook_idea);
    println!();

    println!("CONCEPT SCORES");
    println!("{:<40} {:<8}", "Concept", "Score");
    println!("{}", "-".repeat(48));
    for scored in &generation.scored_concepts {
        println!(
            "{:<40} {:<8.3}",
            scored.concept.title,
            scored.quality_score()
        );
    }

    if let Some(assessment) = &result.evaluation {
        println!();
        print_assessment_plain(assessment);
    }
}

fn print_assessment_plain(assessment: &CreativityAssessmentResult) {
    println!("{}", "=".repeat(60));
    println!("CREATIVITY ASSESSMENT RESULTS");
    println!("{}", "=".repeat(60));

    if let Some(block) = &assessment.temperature_block {
        println!(
            "1) Temperature Sweep Score: {:.2} +/- {:.2}",
            block.overall.mean, block.overall.std
        );
    }
    if let Some(block) = &assessment.persona_block {
        println!(
            "2) Persona Sweep Score:     {:.2} +/- {:.2}",
            block.overall.mean, block.overall.std
        );
    }
    println!("{}", "-".repeat(60));
    println!(
        "3) FINAL CREATIVITY SCORE:  {:.2} +/- {:.2}",
        assessment.aggregate.overall.mean, assessment.aggregate.overall.std
    );
    println!();
    println!("Criteria Breakdown (Aggregate):");
    for (criterion, stats) in &assessment.aggregate.criteria {
        println!("  {:<24} {:.2} +/- {:.2}", criterion, stats.mean, stats.std);
    }
    println!("{}", "=".repeat(60));
}

fn print_json(result: &EngineResult) {
    let value = json!({
        "generation": result.generation.to_artifact(),
        "evaluation": result.evaluation,
    });
    match serde_json::to_string_pretty(&value) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("Error serializing result to JSON: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::aggregate_results;
    use crate::models::{
        Audio, Concept, ConceptScore, DraftedContent, Platform, ProductContext, Scene, SceneRole,
        ScoredConcept, VideoMeta, VideoScript, new_generation_id,
    };
    use crate::models::GenerationResult;
    use crate::registry::ContentType;

    fn sample_engine_result(with_evaluation: bool) -> EngineResult {
        let concept = Concept {
            title: "c1".to_string(),
            description: "d".to_string(),
            hook_idea: "h".to_string(),
        };
        EngineResult {
            generation: GenerationResult {
                generation_id: new_generation_id(),
                content_type: ContentType::VideoScript,
                content: DraftedContent::VideoScript(VideoScript {
                    video_meta: VideoMeta {
                        duration_seconds: 20,
                        platform: Platform::Tiktok,
                    },
                    scenes: vec![Scene {
                        id: 1,
                        start_sec: 0.0,
                        end_sec: 20.0,
                        role: SceneRole::Hook,
                        visual: "v".to_string(),
                        camera: "c".to_string(),
                        action: "a".to_string(),
                        dialogue: "d".to_string(),
                        on_screen_text: None,
                        audio: Audio {
                            music: None,
                            sfx: None,
                        },
                        notes_for_model: None,
                    }],
                }),
                selected_concept: concept.clone(),
                concept_score: 0.8,
                concepts: vec![concept.clone()],
                scored_concepts: vec![ScoredConcept {
                    concept,
                    score: ConceptScore {
                        quality_score: 0.8,
                        reason: "r".to_string(),
                    },
                }],
                product_context: ProductContext {
                    name: "Acme".to_string(),
                    target_audience: "devs".to_string(),
                    pain_point: "slow CI".to_string(),
                    key_benefit: "faster builds".to_string(),
                    offer: None,
                    platform: None,
                },
                reference_examples: None,
            },
            evaluation: with_evaluation.then(|| CreativityAssessmentResult {
                temperature_block: None,
                persona_block: None,
                aggregate: aggregate_results(None, None),
            }),
        }
    }

    #[test]
    fn test_plain_output_without_evaluation() {
        print_result(&sample_engine_result(false), OutputFormat::Plain);
    }

    #[test]
    fn test_plain_output_with_evaluation() {
        print_result(&sample_engine_result(true), OutputFormat::Plain);
    }

    #[test]
    fn test_json_output_serializes() {
        print_result(&sample_engine_result(true), OutputFormat::Json);
    }
}
