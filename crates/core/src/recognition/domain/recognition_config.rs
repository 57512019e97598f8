use crate::shared::constants::DEFAULT_CONFIDENCE;
use crate::shared::error::ConfigurationError;

use super::face_matcher::DEFAULT_DISTANCE_THRESHOLD;
use super::multi_face_policy::MultiFacePolicy;

/// Run-level recognition settings gathered from the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecognitionConfig {
    /// Maximum Euclidean distance for a match.
    pub threshold: f64,
    /// Minimum detector confidence.
    pub confidence: f64,
    pub multi_face: MultiFacePolicy,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DISTANCE_THRESHOLD,
            confidence: DEFAULT_CONFIDENCE,
            multi_face: MultiFacePolicy::default(),
        }
    }
}

impl RecognitionConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigurationError::InvalidThreshold(self.threshold));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigurationError::InvalidConfidence(self.confidence));
        }
        Ok(())
    }
}
