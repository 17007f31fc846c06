//! Built-in reference examples for steering ideation.
//!
//! Extracted from two successful short-form video styles. Ideation is asked
//! to transcend these patterns rather than remix them.

use crate::error::{EngineError, Result};

pub const VARUN_STYLE_EXAMPLES: &[&str] = &[
    "Deadpan fourth-wall break: exhausted developer stares directly into camera after discovering absurd tech situation",
    "Voiceover character skit: visible person talks to unseen roommate/colleague, creating dialogue-driven narrative",
    "Tech slang humor: uses 'cooked', 'locked in', 'wifey', 'bro' to create Gen-Z/tech worker authenticity",
    "Relatable exhaustion: low-energy delivery showing developer fatigue with corporate/tech life",
    "Multi-character single scene: one actor plays multiple roles through voiceover and visual context",
    "Real-world tech scenarios: code reviews, AI tools, dating apps - situations developers actually face",
    "Mood lighting contrast: switches between dark RGB monitor glow and bright natural apartment lighting",
    "Handheld camera intimacy: 'The Office' style direct-to-camera moments create personal connection",
    "Parental pressure humor: jokes about marriage expectations and cultural family dynamics",
    "Product discovery through frustration: tool introduced as solution to relatable developer pain point",
];

pub const AUSTIN_STYLE_EXAMPLES: &[&str] = &[
    "Costume-based character switching: distinct outfits (beanie, polo, turtleneck) differentiate characters in rapid cuts",
    "Corporate hierarchy satire: 10x engineer vs junior dev, CEO demands, showing workplace power dynamics",
    "Fast-paced jump cuts: rapid editing between characters creates comedic rhythm and energy",
    "Dark twist ending: reveals uncomfortable truth (fired employee, hired VA) that subverts initial premise",
    "Character archetypes: Tech Bro (chaotic but praised), Senior Dev (biased), CEO (demanding), Junior Dev (desperate)",
    "Absurd approval logic: shows how corporate systems reward chaos while blocking simple fixes",
    "Visual character differentiation: relies on costume changes (grey beanie, blue polo, black turtleneck) for multi-character skits",
    "High energy vs low energy contrast: confident/arrogant characters vs desperate/panicked characters",
    "Impossible feature demands: CEO asks for unrealistic features, creating comedic tension",
    "Product as last resort: tool suggested when all other options fail, creating natural integration",
];

/// Look up reference examples by style name.
///
/// `"mixed"` returns the union of both built-in styles.
pub fn reference_examples_for_style(style: &str) -> Result<Vec<String>> {
    let examples: Vec<&str> = match style {
        "varun" => VARUN_STYLE_EXAMPLES.to_vec(),
        "austin" => AUSTIN_STYLE_EXAMPLES.to_vec(),
        "mixed" => VARUN_STYLE_EXAMPLES
            .iter()
            .chain(AUSTIN_STYLE_EXAMPLES)
            .copied()
            .collect(),
        other => return Err(EngineError::UnknownReferenceStyle(other.to_string())),
    };
    Ok(examples.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_lookup() {
        assert_eq!(reference_examples_for_style("varun").unwrap().len(), 10);
        assert_eq!(reference_examples_for_style("austin").unwrap().len(), 10);
        assert_eq!(reference_examples_for_style("mixed").unwrap().len(), 20);
    }

    #[test]
    fn test_unknown_style_fails() {
        let err = reference_examples_for_style("noir").unwrap_err();
        assert!(matches!(err, EngineError::UnknownReferenceStyle(_)));
    }
}
