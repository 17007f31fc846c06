use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// User-facing configuration for creativity control.
///
/// Validation is strict at this boundary: both values must already be in
/// [0.0, 1.0]. The mapper below is permissive and clamps instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreativityConfig {
    /// 0.0 = conventional, 1.0 = maximum divergence.
    pub creativity_level: f64,
    /// Concepts scoring below this are filtered out during selection.
    pub quality_threshold: f64,
}

impl CreativityConfig {
    pub fn new(creativity_level: f64, quality_threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&creativity_level) {
            return Err(EngineError::InvalidCreativityLevel(creativity_level));
        }
        if !(0.0..=1.0).contains(&quality_threshold) {
            return Err(EngineError::InvalidQualityThreshold(quality_threshold));
        }
        Ok(Self {
            creativity_level,
            quality_threshold,
        })
    }
}

/// Internal sampling parameters derived from a creativity level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    pub temperature: f64,
    pub top_p: f64,
    pub num_branches: usize,
    pub quality_threshold: f64,
}

/// Maps a user-facing creativity level to internal LLM parameters.
///
/// Low creativity means conservative sampling and fewer branches (cheaper);
/// high creativity means high variance and maximum exploration. The level is
/// clamped to [0.0, 1.0] here rather than rejected; strict validation
/// happens in [`CreativityConfig::new`].
pub fn map_creativity(creativity_level: f64, quality_threshold: f64) -> EngineParameters {
    let level = creativity_level.clamp(0.0, 1.0);

    EngineParameters {
        // 0.4 (safe) -> 1.2 (creative), capped to keep output coherent
        temperature: round2(0.4 + 0.8 * level),
        // 0.6 (focused) -> 1.0 (broad vocabulary)
        top_p: round2(0.6 + 0.4 * level),
        // 2 (minimum) -> 8 (maximum exploration)
        num_branches: (2 + (6.0 * level) as usize).max(2),
        quality_threshold,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
