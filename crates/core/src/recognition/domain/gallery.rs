//! The known-face gallery: identity labels mapped to reference embeddings.
//!
//! Built once while loading reference images, then frozen and shared as an
//! `Arc<Gallery>`. A built gallery is never empty and all of its embeddings
//! have the same dimension.

use std::collections::BTreeMap;

use crate::recognition::domain::embedding::Embedding;
use crate::shared::error::ConfigurationError;

/// One known person and their reference embeddings (at least one).
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    label: String,
    embeddings: Vec<Embedding>,
}

impl Identity {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Gallery {
    /// Sorted by label.
    identities: Vec<Identity>,
    dimension: usize,
}

impl Gallery {
    pub fn builder() -> GalleryBuilder {
        GalleryBuilder::default()
    }

    /// Identities in ascending label order.
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn get(&self, label: &str) -> Option<&Identity> {
        self.identities
            .binary_search_by(|i| i.label.as_str().cmp(label))
            .ok()
            .map(|idx| &self.identities[idx])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(|i| i.label.as_str())
    }

    /// Number of identities.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Always false for a built gallery; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn embedding_count(&self) -> usize {
        self.identities.iter().map(|i| i.embeddings.len()).sum()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Accumulates reference embeddings while the gallery directory is read.
#[derive(Debug, Default)]
pub struct GalleryBuilder {
    identities: BTreeMap<String, Vec<Embedding>>,
    dimension: Option<usize>,
}

impl GalleryBuilder {
    /// Adds a reference embedding under `label`. The first embedding fixes
    /// the gallery's dimension; later ones must match it.
    pub fn add(
        &mut self,
        label: impl Into<String>,
        embedding: Embedding,
    ) -> Result<(), ConfigurationError> {
        let label = label.into();
        let label = label.trim();
        if label.is_empty() {
            return Err(ConfigurationError::EmptyLabel);
        }
        if !embedding.is_finite() {
            return Err(ConfigurationError::NonFiniteEmbedding {
                label: label.to_string(),
            });
        }

        match self.dimension {
            Some(expected) if expected != embedding.dimension() => {
                return Err(ConfigurationError::EmbeddingDimensionMismatch {
                    label: label.to_string(),
                    expected,
                    found: embedding.dimension(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(embedding.dimension()),
        }

        self.identities
            .entry(label.to_string())
            .or_default()
            .push(embedding);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Freezes the gallery. Returns `None` when nothing was added.
    pub fn build(self) -> Option<Gallery> {
        let dimension = self.dimension?;
        let identities = self
            .identities
            .into_iter()
            .map(|(label, embeddings)| Identity { label, embeddings })
            .collect();
        Some(Gallery {
            identities,
            dimension,
        })
    }
}
