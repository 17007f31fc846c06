use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::evaluator::CreativityAssessmentResult;
use crate::models::GenerationResult;

/// Reduce a concept title to a filesystem-friendly slug: alphanumerics,
/// spaces, hyphens and underscores survive; spaces become underscores; the
/// result is lowercased and capped at 50 characters.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
        .to_lowercase()
        .chars()
        .take(50)
        .collect()
}

fn write_pretty_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Persist a generation artifact as
/// `<dir>/<generation_id>_generation_<sanitized_title>.json`.
pub fn save_generation(result: &GenerationResult, directory: &Path) -> Result<PathBuf> {
    let filename = format!(
        "{}_generation_{}.json",
        result.generation_id,
        sanitize_title(&result.selected_concept.title)
    );
    let path = directory.join(filename);
    write_pretty_json(&path, &result.to_artifact())?;
    info!("generation artifact saved to: {}", path.display());
    Ok(path)
}

/// Persist an evaluation artifact as
/// `<dir>/<generation_id>_evaluation_<sanitized_title>.json`.
pub fn save_assessment(
    assessment: &CreativityAssessmentResult,
    generation_id: &str,
    concept_title: &str,
    directory: &Path,
) -> Result<PathBuf> {
    let filename = format!(
        "{}_evaluation_{}.json",
        generation_id,
        sanitize_title(concept_title)
    );
    let path = directory.join(filename);
    write_pretty_json(&path, &serde_json::to_value(assessment)?)?;
    info!("evaluation artifact saved to: {}", path.display());
    Ok(path)
}
