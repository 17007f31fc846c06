use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Supported content types for generation.
///
/// Only [`ContentType::VideoScript`] currently has a registered definition;
/// requesting any other type fails at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    VideoScript,
    LinkedinPost,
    TwitterThread,
    EmailCopy,
    RedditPost,
    AdCopy,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::VideoScript => "video_script",
            ContentType::LinkedinPost => "linkedin_post",
            ContentType::TwitterThread => "twitter_thread",
            ContentType::EmailCopy => "email_copy",
            ContentType::RedditPost => "reddit_post",
            ContentType::AdCopy => "ad_copy",
        };
        f.write_str(name)
    }
}

/// Prompt templates for one content type.
///
/// Templates use `{placeholder}` markers substituted by [`render`].
#[derive(Debug, Clone, Copy)]
pub struct ContentDefinition {
    pub ideation_system_prompt: &'static str,
    pub ideation_user_prompt_template: &'static str,
    pub judge_system_prompt: &'static str,
    pub judge_user_prompt_template: &'static str,
    pub writing_system_prompt: &'static str,
    pub writing_user_prompt_template: &'static str,
}

const VIDEO_IDEATION_SYSTEM: &str = "\
You are a Viral Content Strategist specializing in short-form video content.

Your role is IDEATION ONLY - generate high-level creative concepts, NOT scripts, dialogue, or scene details.

Generate exactly {num_branches} radically different concepts. Each concept should be:
- Novel and surprising (not a remix of common templates)
- Clear and actionable
- Optimized for viral potential on short-form platforms

Output format: JSON with a \"concepts\" array. Each concept must have:
- title: A catchy, memorable title
- description: High-level summary of the video idea
- hook_idea: The specific visual or audio hook for the first 3 seconds

Be creative. Think outside the box. Avoid generic formulas.";

const VIDEO_IDEATION_USER_TEMPLATE: &str = "\
Product: {product_name}
Target Audience: {target_audience}
Pain Point: {pain_point}
Key Benefit: {key_benefit}
Offer: {offer}

Generate {num_branches} radically different high-level concepts for a viral video script.
Focus on unique angles that haven't been overused.";

const VIDEO_JUDGE_SYSTEM: &str = "\
You are an expert content evaluator specializing in viral video concepts.

Evaluate concepts on:
1. Originality (0.0-1.0): How novel and surprising is this? Does it avoid cliches?
2. Clarity (0.0-1.0): Is the concept clear and easy to understand?
3. Marketing Viability (0.0-1.0): Will this effectively communicate the product benefit?

Your overall quality_score should be a weighted average, with originality weighted highest (40%),
clarity (30%), and marketing viability (30%).

Output format: JSON with \"quality_score\" (0.0-1.0) and \"reason\" (brief explanation).

Be strict but fair. Reward novelty and creativity.";

const VIDEO_JUDGE_USER_TEMPLATE: &str = "\
Product: {product_name}
Target Audience: {target_audience}
Pain Point: {pain_point}
Key Benefit: {key_benefit}

Concept to evaluate:
Title: {concept_title}
Description: {concept_description}
Hook Idea: {concept_hook}

Rate this concept's quality (0.0-1.0) and provide reasoning.";

const VIDEO_WRITING_SYSTEM: &str = "\
You are a professional video scriptwriter specializing in short-form viral content.

Your task: Convert the selected concept into a production-ready JSON script suitable for AI video generation (Veo3, Sora, Runway, Kling).

CRITICAL RULES:
1. Output STRICT JSON ONLY - no markdown, no explanations, no extra text
2. Follow the exact JSON schema provided
3. Narrative structure: Hook -> Problem -> Solution -> CTA
4. Each scene must have: id, start_sec, end_sec, role, visual, camera, action, dialogue, on_screen_text, audio, notes_for_model
5. Dialogue should be natural and conversational
6. Visual descriptions should be detailed enough for video generation
7. Total duration should be 15-60 seconds for short-form platforms

The script must align with the selected concept while being production-ready.";

const VIDEO_WRITING_USER_TEMPLATE: &str = "\
Product: {product_name}
Target Audience: {target_audience}
Pain Point: {pain_point}
Key Benefit: {key_benefit}
Offer: {offer}

Selected Concept:
Title: {concept_title}
Description: {concept_description}
Hook Idea: {concept_hook}

Platform: {platform}

Generate a complete video script following the narrative structure: Hook -> Problem -> Solution -> CTA.
Output STRICT JSON matching the VideoScript schema.";

const VIDEO_SCRIPT_DEFINITION: ContentDefinition = ContentDefinition {
    ideation_system_prompt: VIDEO_IDEATION_SYSTEM,
    ideation_user_prompt_template: VIDEO_IDEATION_USER_TEMPLATE,
    judge_system_prompt: VIDEO_JUDGE_SYSTEM,
    judge_user_prompt_template: VIDEO_JUDGE_USER_TEMPLATE,
    writing_system_prompt: VIDEO_WRITING_SYSTEM,
    writing_user_prompt_template: VIDEO_WRITING_USER_TEMPLATE,
};

/// Look up the definition for a content type.
pub fn get_content_definition(content_type: ContentType) -> Result<&'static ContentDefinition> {
    match content_type {
        ContentType::VideoScript => Ok(&VIDEO_SCRIPT_DEFINITION),
        other => Err(EngineError::UnregisteredContentType(other)),
    }
}

/// Substitute `{name}` placeholders in a prompt template.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in vars {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_script_is_registered() {
        let definition = get_content_definition(ContentType::VideoScript).unwrap();
        assert!(definition.ideation_system_prompt.contains("{num_branches}"));
        assert!(definition.judge_user_prompt_template.contains("{concept_title}"));
        assert!(definition.writing_user_prompt_template.contains("{platform}"));
    }

    #[test]
    fn test_unregistered_content_type_fails() {
        let err = get_content_definition(ContentType::LinkedinPost).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnregisteredContentType(ContentType::LinkedinPost)
        ));
        assert!(err.to_string().contains("linkedin_post"));
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let rendered = render(
            "Product: {product_name} for {target_audience}",
            &[("product_name", "Acme"), ("target_audience", "devs")],
        );
        assert_eq!(rendered, "Product: Acme for devs");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let rendered = render(
            "Generate {num_branches} ideas. Exactly {num_branches}.",
            &[("num_branches", "6")],
        );
        assert_eq!(rendered, "Generate 6 ideas. Exactly 6.");
    }

    #[test]
    fn test_content_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&ContentType::VideoScript).unwrap(),
            "\"video_script\""
        );
        assert_eq!(ContentType::AdCopy.to_string(), "ad_copy");
    }
}
