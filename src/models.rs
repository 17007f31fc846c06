use chrono::{Local, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::registry::ContentType;

/// Structured product context extracted from a landing page.
///
/// Produced by an external extraction collaborator and treated as immutable
/// for the lifetime of a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductContext {
    /// Product or company name
    pub name: String,
    /// Target audience description
    pub target_audience: String,
    /// Main customer pain point addressed
    pub pain_point: String,
    /// Primary benefit or value proposition
    pub key_benefit: String,
    /// Offer or call to action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    /// Target platform for video scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ProductContext {
    pub fn offer(&self) -> &str {
        self.offer.as_deref().unwrap_or("")
    }

    pub fn platform(&self) -> &str {
        self.platform.as_deref().unwrap_or("tiktok")
    }
}

/// A high-level creative concept generated during ideation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Concept {
    /// A short, catchy title for the concept
    pub title: String,
    /// High-level summary of the idea
    pub description: String,
    /// The specific visual or audio hook to grab attention
    pub hook_idea: String,
}

/// Output from the ideation phase containing multiple concepts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdeationOutput {
    pub concepts: Vec<Concept>,
}

/// Quality score and reasoning for a concept.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConceptScore {
    /// Score between 0.0 and 1.0
    pub quality_score: f64,
    /// Short justification for the score
    pub reason: String,
}

impl ConceptScore {
    /// Range check applied after the provider call; a judge returning an
    /// out-of-range score counts as a failed call.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.quality_score) {
            return Err(crate::error::EngineError::ScoreOutOfRange {
                value: self.quality_score,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

/// A concept paired with its quality score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredConcept {
    pub concept: Concept,
    pub score: ConceptScore,
}

impl ScoredConcept {
    pub fn quality_score(&self) -> f64 {
        self.score.quality_score
    }
}

/// Metadata for a video script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMeta {
    /// Total estimated duration in seconds
    pub duration_seconds: u32,
    /// Target platform for the video
    pub platform: Platform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    YoutubeShorts,
    Linkedin,
}

/// Narrative role of a scene within the hook -> problem -> solution -> cta arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SceneRole {
    Hook,
    Problem,
    Solution,
    Cta,
    Other,
}

/// Audio specification for a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Audio {
    /// Mood or genre of background music
    #[serde(default)]
    pub music: Option<String>,
    /// Specific sound effects (e.g. "whoosh", "notification sound")
    #[serde(default)]
    pub sfx: Option<String>,
}

/// A single scene in a video script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Scene identifier
    pub id: u32,
    /// Start time in seconds
    pub start_sec: f64,
    /// End time in seconds
    pub end_sec: f64,
    pub role: SceneRole,
    /// Detailed visual description for video generation
    pub visual: String,
    /// Camera movement or angle (e.g. "Zoom in", "Static shot")
    pub camera: String,
    /// What happens in the scene
    pub action: String,
    /// Spoken words by the actor or voiceover; empty string if none
    pub dialogue: String,
    /// Text overlays
    #[serde(default)]
    pub on_screen_text: Option<String>,
    pub audio: Audio,
    /// Technical notes for the video generation model
    #[serde(default)]
    pub notes_for_model: Option<String>,
}

/// Complete video script in structured form.
///
/// Scenes are expected to be ordered by id with non-decreasing start times,
/// and `duration_seconds` should match the final scene's end time. Neither
/// is enforced here; the drafting prompt is responsible for producing a
/// consistent script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoScript {
    pub video_meta: VideoMeta,
    pub scenes: Vec<Scene>,
}

/// Drafted content for any registered content type.
///
/// Serialized untagged so artifacts carry the bare schema object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftedContent {
    VideoScript(VideoScript),
}

impl DraftedContent {
    pub fn as_video_script(&self) -> Option<&VideoScript> {
        match self {
            DraftedContent::VideoScript(script) => Some(script),
        }
    }
}

/// Result of one generation request (Phases 1-2 only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Join key between generation and evaluation artifacts
    pub generation_id: String,
    pub content_type: ContentType,
    pub content: DraftedContent,
    pub selected_concept: Concept,
    pub concept_score: f64,
    /// All concepts produced by ideation
    pub concepts: Vec<Concept>,
    /// All concepts that were successfully judged
    pub scored_concepts: Vec<ScoredConcept>,
    pub product_context: ProductContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_examples: Option<Vec<String>>,
}

/// Time-based identifier with a random suffix, e.g. `1754000000_3fa9c1d2`.
pub fn new_generation_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().timestamp(), &suffix[..8])
}

impl GenerationResult {
    /// Complete nested mapping of the result, the shape persisted by the
    /// artifact writer.
    pub fn to_artifact(&self) -> serde_json::Value {
        let scores: Vec<f64> = self
            .scored_concepts
            .iter()
            .map(ScoredConcept::quality_score)
            .collect();
        let (min, max, avg) = if scores.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                scores.iter().copied().fold(f64::INFINITY, f64::min),
                scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                scores.iter().sum::<f64>() / scores.len() as f64,
            )
        };

        json!({
            "timestamp": Utc::now().timestamp(),
            "iso_timestamp": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "generation_id": self.generation_id,
            "content_type": self.content_type,
            "product_context": self.product_context,
            "reference_examples": self.reference_examples,
            "selected_concept": self.selected_concept,
            "concept_score": self.concept_score,
            "generated_content": self.content,
            "all_concepts": self.scored_concepts.iter().map(|sc| {
                json!({
                    "concept": sc.concept,
                    "score": sc.score.quality_score,
                    "reason": sc.score.reason,
                })
            }).collect::<Vec<_>>(),
            "total_concepts_generated": self.concepts.len(),
            "total_concepts_scored": self.scored_concepts.len(),
            "score_distribution": { "min": min, "max": max, "avg": avg },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_script() -> VideoScript {
        VideoScript {
            video_meta: VideoMeta {
                duration_seconds: 30,
                platform: Platform::Tiktok,
            },
            scenes: vec![
                Scene {
                    id: 1,
                    start_sec: 0.0,
                    end_sec: 3.0,
                    role: SceneRole::Hook,
                    visual: "Developer slams laptop shut".to_string(),
                    camera: "Punch-in".to_string(),
                    action: "Freezes mid-slam, stares at camera".to_string(),
                    dialogue: "Not again.".to_string(),
                    on_screen_text: Some("POV: CI is red".to_string()),
                    audio: Audio {
                        music: Some("lofi tension".to_string()),
                        sfx: Some("record scratch".to_string()),
                    },
                    notes_for_model: None,
                },
                Scene {
                    id: 2,
                    start_sec: 3.0,
                    end_sec: 30.0,
                    role: SceneRole::Cta,
                    visual: "Terminal with green checkmarks".to_string(),
                    camera: "Static shot".to_string(),
                    action: "Scrolls through passing pipeline".to_string(),
                    dialogue: String::new(),
                    on_screen_text: None,
                    audio: Audio {
                        music: None,
                        sfx: None,
                    },
                    notes_for_model: Some("keep terminal font legible".to_string()),
                },
            ],
        }
    }

    fn sample_result() -> GenerationResult {
        let concept = Concept {
            title: "The Red Pipeline".to_string(),
            description: "A developer's CI keeps failing at the worst moments".to_string(),
            hook_idea: "Laptop slam freeze-frame".to_string(),
        };
        GenerationResult {
            generation_id: new_generation_id(),
            content_type: ContentType::VideoScript,
            content: DraftedContent::VideoScript(sample_script()),
            selected_concept: concept.clone(),
            concept_score: 0.85,
            concepts: vec![concept.clone()],
            scored_concepts: vec![ScoredConcept {
                concept,
                score: ConceptScore {
                    quality_score: 0.85,
                    reason: "novel hook".to_string(),
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
        }
    }

    #[test]
    fn test_generation_id_format() {
        let id = new_generation_id();
        let (seconds, suffix) = id.split_once('_').unwrap();
        assert!(seconds.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_concept_score_validation() {
        let score = |value| ConceptScore {
            quality_score: value,
            reason: "r".to_string(),
        };
        assert!(score(0.0).validate().is_ok());
        assert!(score(1.0).validate().is_ok());
        assert!(score(1.4).validate().is_err());
        assert!(score(-0.1).validate().is_err());
    }

    #[test]
    fn test_product_context_defaults() {
        let context = ProductContext {
            name: "Acme".to_string(),
            target_audience: "devs".to_string(),
            pain_point: "slow CI".to_string(),
            key_benefit: "faster builds".to_string(),
            offer: None,
            platform: None,
        };
        assert_eq!(context.offer(), "");
        assert_eq!(context.platform(), "tiktok");
    }

    #[test]
    fn test_artifact_contains_score_distribution() {
        let artifact = sample_result().to_artifact();
        assert_eq!(artifact["score_distribution"]["min"], 0.85);
        assert_eq!(artifact["score_distribution"]["max"], 0.85);
        assert_eq!(artifact["total_concepts_generated"], 1);
        assert_eq!(artifact["content_type"], "video_script");
    }

    #[test]
    fn test_drafted_content_serializes_untagged() {
        let content = DraftedContent::VideoScript(sample_script());
        let value = serde_json::to_value(&content).unwrap();
        // bare schema object, no enum tag wrapper
        assert!(value.get("video_meta").is_some());
        assert!(value.get("scenes").is_some());
    }

    #[test]
    fn test_artifact_content_round_trip() {
        let result = sample_result();
        let artifact = result.to_artifact();
        let rehydrated: VideoScript =
            serde_json::from_value(artifact["generated_content"].clone()).unwrap();
        assert_eq!(&rehydrated, result.content.as_video_script().unwrap());
    }

    #[test]
    fn test_scene_optional_fields_deserialize_when_absent() {
        let raw = serde_json::json!({
            "id": 1,
            "start_sec": 0.0,
            "end_sec": 4.5,
            "role": "hook",
            "visual": "v",
            "camera": "c",
            "action": "a",
            "dialogue": "",
            "audio": {}
        });
        let scene: Scene = serde_json::from_value(raw).unwrap();
        assert_eq!(scene.role, SceneRole::Hook);
        assert!(scene.on_screen_text.is_none());
        assert!(scene.audio.music.is_none());
    }
}
