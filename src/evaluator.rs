use std::collections::BTreeMap;

use futures::StreamExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::models::{ProductContext, VideoScript};
use crate::personas::{ALL_PERSONAS, Persona};
use crate::provider::{LlmProvider, Sampling};
use crate::registry::render;

/// Minimum successful judge calls for a sweep's statistics to be trusted.
pub const EVALUATION_QUORUM: usize = 4;

const SWEEP_TOP_P: f64 = 0.9;
const SWEEP_CONCURRENCY: usize = 4;
const DEFAULT_TEMPERATURE_GRID: [f64; 8] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
const DEFAULT_PERSONA_TEMPERATURE: f64 = 0.3;

/// The six fixed creativity criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    HookOriginality,
    VisualCreativity,
    NarrativeOriginality,
    EntertainmentValue,
    BrandIntegration,
    PlatformFit,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::HookOriginality,
        Criterion::VisualCreativity,
        Criterion::NarrativeOriginality,
        Criterion::EntertainmentValue,
        Criterion::BrandIntegration,
        Criterion::PlatformFit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::HookOriginality => "hook_originality",
            Criterion::VisualCreativity => "visual_creativity",
            Criterion::NarrativeOriginality => "narrative_originality",
            Criterion::EntertainmentValue => "entertainment_value",
            Criterion::BrandIntegration => "brand_integration",
            Criterion::PlatformFit => "platform_fit",
        }
    }
}

/// Score and reason for a single creativity criterion, 1.0 to 3.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CriterionScore {
    pub score: f64,
    /// Short explanation for the score
    pub reason: String,
}

/// One judge's scores across all six criteria.
///
/// The judge is instructed to set `overall_creativity` to the mean of the
/// six criterion scores, but that is a prompt-level contract only;
/// [`JudgeScores::computed_overall`] recomputes it and all statistics use
/// the recomputed value, treating the model-reported one as advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JudgeScores {
    pub hook_originality: CriterionScore,
    pub visual_creativity: CriterionScore,
    pub narrative_originality: CriterionScore,
    pub entertainment_value: CriterionScore,
    pub brand_integration: CriterionScore,
    pub platform_fit: CriterionScore,
    pub overall_creativity: CriterionScore,
}

impl JudgeScores {
    pub fn criterion(&self, criterion: Criterion) -> &CriterionScore {
        match criterion {
            Criterion::HookOriginality => &self.hook_originality,
            Criterion::VisualCreativity => &self.visual_creativity,
            Criterion::NarrativeOriginality => &self.narrative_originality,
            Criterion::EntertainmentValue => &self.entertainment_value,
            Criterion::BrandIntegration => &self.brand_integration,
            Criterion::PlatformFit => &self.platform_fit,
        }
    }

    /// Arithmetic mean of the six criterion scores.
    pub fn computed_overall(&self) -> f64 {
        let sum: f64 = Criterion::ALL
            .iter()
            .map(|&criterion| self.criterion(criterion).score)
            .sum();
        sum / Criterion::ALL.len() as f64
    }

    /// Range check applied after the provider call; a judge emitting any
    /// score outside [1.0, 3.0] counts as a failed run.
    pub fn validate(&self) -> Result<()> {
        let scores = Criterion::ALL
            .iter()
            .map(|&criterion| self.criterion(criterion).score)
            .chain(std::iter::once(self.overall_creativity.score));
        for score in scores {
            if !(1.0..=3.0).contains(&score) {
                return Err(crate::error::EngineError::ScoreOutOfRange {
                    value: score,
                    min: 1.0,
                    max: 3.0,
                });
            }
        }
        Ok(())
    }
}

/// Persona-tagged judge output for the persona sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonaJudgeOutput {
    /// Name of the persona used for evaluation
    pub persona: String,
    #[serde(flatten)]
    pub scores: JudgeScores,
}

/// Mean and standard deviation over a set of independent judge runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub mean: f64,
    pub std: f64,
}

/// Statistics for a single criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionStats {
    pub mean: f64,
    pub std: f64,
}

/// One successful run of the temperature sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureRun {
    pub temperature: f64,
    pub overall_creativity: f64,
    pub judge_output: JudgeScores,
}

/// One successful run of the persona sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaRun {
    pub persona: String,
    pub overall_creativity: f64,
    pub judge_output: JudgeScores,
}

/// Results from the temperature sweep (Block A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureBlock {
    pub overall: EvaluationStats,
    pub criteria: BTreeMap<String, CriterionStats>,
    pub by_temperature: Vec<TemperatureRun>,
}

/// Results from the persona sweep (Block B).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaBlock {
    pub overall: EvaluationStats,
    pub criteria: BTreeMap<String, CriterionStats>,
    pub by_persona: Vec<PersonaRun>,
}

/// Aggregated results combining both blocks (Block C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResults {
    pub overall: EvaluationStats,
    pub criteria: BTreeMap<String, CriterionStats>,
}

/// Final creativity assessment for one evaluated script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativityAssessmentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_block: Option<TemperatureBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_block: Option<PersonaBlock>,
    pub aggregate: AggregateResults,
}

const GENERIC_JUDGE_SYSTEM: &str = "\
You are an expert creativity assessor for short-form video ad scripts (TikTok, Reels, Shorts).

You will evaluate the CREATIVITY of ONE video ad script using SIX criteria, each scored from 1 to 3.

CRITERIA DEFINITIONS

1) hook_originality - Hook Originality & Stopping Power: how surprising, attention-grabbing, and scroll-stopping the first 1-3 seconds are; novelty of the hook and presence of a clear pattern interrupt.
   1 = generic or predictable opening, no pattern interrupt. 2 = somewhat interesting or curious hook with at least one engaging element. 3 = highly original and surprising hook that immediately commands attention in a feed.

2) visual_creativity - Visual Creativity & Scene Dynamism: creativity of visuals, camera moves, and transitions; how dynamic and varied the scenes feel.
   1 = static, generic visuals with minimal camera movement. 2 = some interesting visuals or transitions, moderate variety. 3 = highly dynamic, TikTok-native visual ideas (POV shots, punch-ins, quick cuts) with consistently engaging flow.

3) narrative_originality - Narrative Originality & Idea Novelty: creativity and novelty of the underlying story or concept; twists, metaphors, unusual structures.
   1 = predictable storyline or cliche ad trope. 2 = at least one interesting angle or twist, partially fresh. 3 = clearly distinctive and memorable idea with a fresh angle or clever twist.

4) entertainment_value - Entertainment Value & Emotional Impact: how engaging, funny, relatable, emotional, or surprising the script is, independent of the product.
   1 = emotionally flat, feels like a plain informational ad. 2 = some moments of humor, relatability, or emotional spark. 3 = highly entertaining, emotionally punchy, with high replay value.

5) brand_integration - Creative Brand & Message Integration: how creatively and naturally the product, benefit, or offer is embedded in the story instead of bolted on.
   1 = forced, boring, or generic delivery that breaks immersion. 2 = functional integration that makes sense but is not highly creative. 3 = clever, seamless, story-driven integration that enhances the entertainment.

6) platform_fit - Platform Fit & Trend Awareness: how well the script fits TikTok-style content: pacing, UGC feel, trend fluency, meme grammar, authenticity.
   1 = feels like a traditional TV/corporate ad, slow and non-native. 2 = reasonably adapted with some UGC elements or platform-appropriate tone. 3 = strongly TikTok-native feel aligned with trends, meme formats, and POV styles.

SCORING RULES

- For EACH of the six criteria, assign an integer score of 1, 2, or 3 and provide a short, concrete reason based on the script.
- Then compute overall_creativity.score as the arithmetic mean of the six criterion scores (may be a decimal between 1.0 and 3.0).

Output ONLY a valid JSON object with the keys hook_originality, visual_creativity, narrative_originality, entertainment_value, brand_integration, platform_fit, overall_creativity, each holding {\"score\": <number>, \"reason\": \"<short explanation>\"}.
Do NOT include any text before or after the JSON. Do NOT add or remove keys. Do NOT use markdown.";

const GENERIC_JUDGE_USER_TEMPLATE: &str = "\
You will now evaluate the creativity of a generated TikTok video ad script.

PRODUCT CONTEXT:
- Product name: {product_name}
- Target audience: {target_audience}
- Main pain point: {pain_point}
- Key benefit: {key_benefit}
- Platform: {platform}

SCRIPT (JSON FORMAT):
{script_json}

Evaluate this script STRICTLY according to the six creativity criteria and the 1-3 scoring rubric defined in the system prompt.
Base your reasoning ONLY on the content of this script and the product context.
Return ONLY the JSON object as specified.";

const PERSONA_JUDGE_SYSTEM_TEMPLATE: &str = "\
You are evaluating the creativity of TikTok-style video ad scripts in the role of a specific expert persona.

Your persona for this evaluation is:

- Persona name: {persona_name}
- Persona description: {persona_description}

You must THINK and JUDGE like this persona would: focus on what this persona cares about the most, keep the same six creativity criteria (hook_originality, visual_creativity, narrative_originality, entertainment_value, brand_integration, platform_fit) and the same 1-3 scoring scale, and let your explanations reflect this persona's priorities and biases.

For EACH of the six criteria, assign an integer score of 1, 2, or 3 with a short explanation that reflects how {persona_name} would think. Then compute overall_creativity.score as the mean of the six criterion scores (may be a decimal between 1.0 and 3.0).

Output ONLY a valid JSON object with a \"persona\" field set exactly to \"{persona_name}\" as the first field, followed by hook_originality, visual_creativity, narrative_originality, entertainment_value, brand_integration, platform_fit and overall_creativity, each holding {\"score\": <number>, \"reason\": \"<short explanation from this persona's viewpoint>\"}.
Do NOT include any text before or after the JSON. Do NOT add or remove keys. Do NOT use markdown.";

const PERSONA_JUDGE_USER_TEMPLATE: &str = "\
You will now evaluate the creativity of a generated TikTok video ad script,
acting in the role of the persona defined in the system prompt.

PRODUCT CONTEXT:
- Product name: {product_name}
- Target audience: {target_audience}
- Main pain point: {pain_point}
- Key benefit: {key_benefit}
- Platform: {platform}

SCRIPT (JSON FORMAT):
{script_json}

Evaluate this script strictly according to the SIX creativity criteria and the 1-3 scoring rubric provided in the system prompt.
Your explanations must reflect the perspective and priorities of the persona.
Return ONLY the JSON object as specified. Remember to include the \"persona\" field as the first field.";

/// LLM-based creativity evaluator for drafted video scripts.
///
/// Runs two independent sweeps over the same script (a temperature sweep
/// with a generic judge and a persona sweep at constant temperature), then
/// aggregates their statistics.
pub struct CreativityEvaluator<'a, P> {
    provider: &'a P,
    temperature_grid: Vec<f64>,
    persona_temperature: f64,
    personas: &'static [Persona],
}

impl<'a, P: LlmProvider> CreativityEvaluator<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            temperature_grid: DEFAULT_TEMPERATURE_GRID.to_vec(),
            persona_temperature: DEFAULT_PERSONA_TEMPERATURE,
            personas: &ALL_PERSONAS,
        }
    }

    /// Replace the temperature grid.
    ///
    /// The quorum stays at [`EVALUATION_QUORUM`] regardless of grid length;
    /// a grid shorter than the quorum can never produce a valid block.
    pub fn with_temperature_grid(mut self, grid: Vec<f64>) -> Self {
        self.temperature_grid = grid;
        self
    }

    pub fn with_persona_temperature(mut self, temperature: f64) -> Self {
        self.persona_temperature = temperature;
        self
    }

    /// Evaluate a drafted video script for creativity.
    pub async fn score_script(
        &self,
        script: &VideoScript,
        product_context: &ProductContext,
    ) -> Result<CreativityAssessmentResult> {
        info!("starting creativity evaluation");
        let script_json = serde_json::to_string_pretty(script)?;

        info!("block A: temperature sweep");
        let temperature_block = self.temperature_sweep(&script_json, product_context).await;

        info!("block B: persona sweep");
        let persona_block = self.persona_sweep(&script_json, product_context).await;

        info!("block C: aggregation");
        let aggregate = aggregate_results(temperature_block.as_ref(), persona_block.as_ref());

        info!(
            "evaluation complete: overall creativity {:.2} +/- {:.2}",
            aggregate.overall.mean, aggregate.overall.std
        );

        Ok(CreativityAssessmentResult {
            temperature_block,
            persona_block,
            aggregate,
        })
    }

    /// Block A: judge the script once per grid temperature.
    async fn temperature_sweep(
        &self,
        script_json: &str,
        product_context: &ProductContext,
    ) -> Option<TemperatureBlock> {
        let user_prompt = generic_user_prompt(product_context, script_json);
        let total = self.temperature_grid.len();

        let mut runs: Vec<(usize, TemperatureRun)> = futures::stream::iter(
            self.temperature_grid
                .iter()
                .copied()
                .enumerate()
                .map(|(index, temperature)| {
                    let user_prompt = &user_prompt;
                    async move {
                        let result: Result<JudgeScores> = self
                            .provider
                            .generate(
                                GENERIC_JUDGE_SYSTEM,
                                user_prompt,
                                Sampling::new(temperature, SWEEP_TOP_P),
                            )
                            .await
                            .and_then(|judge: JudgeScores| {
                                judge.validate()?;
                                Ok(judge)
                            });
                        match result {
                            Ok(judge_output) => Some((
                                index,
                                TemperatureRun {
                                    temperature,
                                    overall_creativity: judge_output.computed_overall(),
                                    judge_output,
                                },
                            )),
                            Err(err) => {
                                warn!("  failed evaluation at temperature {temperature}: {err}");
                                None
                            }
                        }
                    }
                }),
        )
        .buffer_unordered(SWEEP_CONCURRENCY)
        .filter_map(std::future::ready)
        .collect()
        .await;

        if runs.len() < EVALUATION_QUORUM {
            error!(
                "temperature sweep failed: only {}/{} successful evaluations",
                runs.len(),
                total
            );
            return None;
        }
        runs.sort_by_key(|(index, _)| *index);
        let by_temperature: Vec<TemperatureRun> =
            runs.into_iter().map(|(_, run)| run).collect();

        let judges: Vec<&JudgeScores> =
            by_temperature.iter().map(|run| &run.judge_output).collect();
        let (overall, criteria) = block_stats(&judges);

        Some(TemperatureBlock {
            overall,
            criteria,
            by_temperature,
        })
    }

    /// Block B: judge the script once per persona at constant temperature.
    async fn persona_sweep(
        &self,
        script_json: &str,
        product_context: &ProductContext,
    ) -> Option<PersonaBlock> {
        let user_prompt = render(
            PERSONA_JUDGE_USER_TEMPLATE,
            &[
                ("product_name", product_context.name.as_str()),
                ("target_audience", product_context.target_audience.as_str()),
                ("pain_point", product_context.pain_point.as_str()),
                ("key_benefit", product_context.key_benefit.as_str()),
                ("platform", product_context.platform()),
                ("script_json", script_json),
            ],
        );
        let total = self.personas.len();

        let mut runs: Vec<(usize, PersonaRun)> = futures::stream::iter(
            self.personas.iter().enumerate().map(|(index, persona)| {
                let user_prompt = &user_prompt;
                async move {
                    let system_prompt = render(
                        PERSONA_JUDGE_SYSTEM_TEMPLATE,
                        &[
                            ("persona_name", persona.name),
                            ("persona_description", persona.description),
                        ],
                    );
                    let result: Result<PersonaJudgeOutput> = self
                        .provider
                        .generate(
                            &system_prompt,
                            user_prompt,
                            Sampling::new(self.persona_temperature, SWEEP_TOP_P),
                        )
                        .await
                        .and_then(|output: PersonaJudgeOutput| {
                            output.scores.validate()?;
                            Ok(output)
                        });
                    match result {
                        Ok(output) => Some((
                            index,
                            PersonaRun {
                                persona: persona.name.to_string(),
                                overall_creativity: output.scores.computed_overall(),
                                judge_output: output.scores,
                            },
                        )),
                        Err(err) => {
                            warn!("  failed evaluation for persona {}: {err}", persona.name);
                            None
                        }
                    }
                }
            }),
        )
        .buffer_unordered(SWEEP_CONCURRENCY)
        .filter_map(std::future::ready)
        .collect()
        .await;

        if runs.len() < EVALUATION_QUORUM {
            error!(
                "persona sweep failed: only {}/{} successful evaluations",
                runs.len(),
                total
            );
            return None;
        }
        runs.sort_by_key(|(index, _)| *index);
        let by_persona: Vec<PersonaRun> = runs.into_iter().map(|(_, run)| run).collect();

        let judges: Vec<&JudgeScores> = by_persona.iter().map(|run| &run.judge_output).collect();
        let (overall, criteria) = block_stats(&judges);

        Some(PersonaBlock {
            overall,
            criteria,
            by_persona,
        })
    }
}

fn generic_user_prompt(product_context: &ProductContext, script_json: &str) -> String {
    render(
        GENERIC_JUDGE_USER_TEMPLATE,
        &[
            ("product_name", product_context.name.as_str()),
            ("target_audience", product_context.target_audience.as_str()),
            ("pain_point", product_context.pain_point.as_str()),
            ("key_benefit", product_context.key_benefit.as_str()),
            ("platform", product_context.platform()),
            ("script_json", script_json),
        ],
    )
}

/// Per-block statistics over the successful runs.
fn block_stats(judges: &[&JudgeScores]) -> (EvaluationStats, BTreeMap<String, CriterionStats>) {
    let overall_scores: Vec<f64> = judges.iter().map(|judge| judge.computed_overall()).collect();
    let overall = EvaluationStats {
        mean: mean(&overall_scores),
        std: sample_std(&overall_scores),
    };

    let mut criteria = BTreeMap::new();
    for criterion in Criterion::ALL {
        let scores: Vec<f64> = judges
            .iter()
            .map(|judge| judge.criterion(criterion).score)
            .collect();
        criteria.insert(
            criterion.as_str().to_string(),
            CriterionStats {
                mean: mean(&scores),
                std: sample_std(&scores),
            },
        );
    }

    (overall, criteria)
}

/// Block C: combine the two blocks.
///
/// Means are averaged; the combined std is the maximum of the two blocks'
/// stds, a conservative rather than statistically rigorous rule. With one
/// block absent its counterpart passes through; with both absent every
/// statistic degrades to zero.
pub fn aggregate_results(
    temperature_block: Option<&TemperatureBlock>,
    persona_block: Option<&PersonaBlock>,
) -> AggregateResults {
    match (temperature_block, persona_block) {
        (Some(temperature), Some(persona)) => {
            let overall = EvaluationStats {
                mean: (temperature.overall.mean + persona.overall.mean) / 2.0,
                std: temperature.overall.std.max(persona.overall.std),
            };
            let mut criteria = BTreeMap::new();
            for criterion in Criterion::ALL {
                let name = criterion.as_str();
                let temperature_stats = &temperature.criteria[name];
                let persona_stats = &persona.criteria[name];
                criteria.insert(
                    name.to_string(),
                    CriterionStats {
                        mean: (temperature_stats.mean + persona_stats.mean) / 2.0,
                        std: temperature_stats.std.max(persona_stats.std),
                    },
                );
            }
            AggregateResults { overall, criteria }
        }
        (Some(temperature), None) => AggregateResults {
            overall: EvaluationStats {
                mean: temperature.overall.mean,
                std: temperature.overall.std,
            },
            criteria: temperature.criteria.clone(),
        },
        (None, Some(persona)) => AggregateResults {
            overall: EvaluationStats {
                mean: persona.overall.mean,
                std: persona.overall.std,
            },
            criteria: persona.criteria.clone(),
        },
        (None, None) => {
            error!("both evaluation blocks failed, aggregate degrades to zero");
            AggregateResults {
                overall: EvaluationStats { mean: 0.0, std: 0.0 },
                criteria: Criterion::ALL
                    .iter()
                    .map(|criterion| {
                        (
                            criterion.as_str().to_string(),
                            CriterionStats { mean: 0.0, std: 0.0 },
                        )
                    })
                    .collect(),
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than 2 values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
