//! Nearest-neighbour matching of probe embeddings against the gallery.
//!
//! A probe is compared with every reference embedding of every identity by
//! Euclidean distance. The identity owning the closest embedding wins if
//! that distance is at or below the threshold; otherwise the probe is
//! `Unknown`. On an exact tie between identities the lexicographically
//! smallest label wins and the result is flagged ambiguous.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::gallery::Gallery;
use crate::shared::constants::UNKNOWN_LABEL;
use crate::shared::error::ConfigurationError;

/// Distance between unit-length ArcFace embeddings with cosine similarity
/// of about 0.4 (`sqrt(2 - 2 * 0.395)`).
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 1.1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Label {
    Known(String),
    Unknown,
}

impl Label {
    pub fn is_known(&self) -> bool {
        matches!(self, Label::Known(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Known(name) => name,
            Label::Unknown => UNKNOWN_LABEL,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub label: Label,
    /// Distance to the nearest gallery embedding, whether or not it matched.
    pub distance: f64,
    /// Identity owning the nearest embedding.
    pub nearest: String,
    /// Another identity was exactly as close as `nearest`.
    pub ambiguous: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("probe embedding has dimension {found}, gallery uses {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("embedding has non-finite components")]
    NonFiniteEmbedding,
}

pub struct FaceMatcher {
    gallery: Arc<Gallery>,
    threshold: f64,
}

impl FaceMatcher {
    pub fn new(gallery: Arc<Gallery>, threshold: f64) -> Result<Self, ConfigurationError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigurationError::InvalidThreshold(threshold));
        }
        Ok(Self { gallery, threshold })
    }

    pub fn identify(&self, probe: &Embedding) -> Result<MatchResult, MatchError> {
        let expected = self.gallery.dimension();
        if probe.dimension() != expected {
            return Err(MatchError::DimensionMismatch {
                expected,
                found: probe.dimension(),
            });
        }
        if !probe.is_finite() {
            return Err(MatchError::NonFiniteEmbedding);
        }

        let mut best: Option<(&str, f64)> = None;
        let mut ambiguous = false;

        // Identities are sorted, so keeping the incumbent on equal distance
        // yields the smallest label.
        for identity in self.gallery.identities() {
            let Some(distance) = identity
                .embeddings()
                .iter()
                .map(|e| probe.euclidean_distance(e))
                .filter(|d| d.is_finite())
                .min_by(f64::total_cmp)
            else {
                continue;
            };

            match best {
                Some((_, best_distance)) if distance > best_distance => {}
                Some((_, best_distance)) if distance == best_distance => ambiguous = true,
                _ => {
                    best = Some((identity.label(), distance));
                    ambiguous = false;
                }
            }
        }

        // A built gallery always holds at least one embedding.
        let (nearest, distance) = best.unwrap_or((UNKNOWN_LABEL, f64::INFINITY));
        let label = if distance <= self.threshold {
            Label::Known(nearest.to_string())
        } else {
            Label::Unknown
        };

        Ok(MatchResult {
            label,
            distance,
            nearest: nearest.to_string(),
            ambiguous,
        })
    }
}
