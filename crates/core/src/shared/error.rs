//! Error taxonomy shared across the pipeline.
//!
//! `ConfigurationError` aborts a run before any frame is processed.
//! `FrameDecodeError` is per frame: it is recorded and the run continues.
//! A frame with no faces is not an error at all.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("known faces directory does not exist: {0}")]
    GalleryDirMissing(PathBuf),
    #[error("known faces path is not a directory: {0}")]
    GalleryNotADirectory(PathBuf),
    #[error("failed to read known faces directory {path}: {reason}")]
    GalleryDirUnreadable { path: PathBuf, reason: String },
    #[error("no usable face images found in {0}")]
    EmptyGallery(PathBuf),
    #[error("embedding for '{label}' has dimension {found}, gallery uses {expected}")]
    EmbeddingDimensionMismatch {
        label: String,
        expected: usize,
        found: usize,
    },
    #[error("identity label must not be empty")]
    EmptyLabel,
    #[error("embedding for '{label}' has non-finite components")]
    NonFiniteEmbedding { label: String },
    #[error("input video does not exist: {0}")]
    InputMissing(PathBuf),
    #[error("distance threshold must be a finite non-negative number, got {0}")]
    InvalidThreshold(f64),
    #[error("detector confidence must be within 0.0..=1.0, got {0}")]
    InvalidConfidence(f64),
    #[error("failed to load font {path}: {reason}")]
    FontUnreadable { path: PathBuf, reason: String },
}

/// A frame the reader could not decode. `index` is its position among all
/// reader items, the same numbering as [`Frame::index`](crate::shared::frame::Frame::index).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to decode frame {index}: {reason}")]
pub struct FrameDecodeError {
    pub index: usize,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_messages_name_the_path() {
        let err = ConfigurationError::EmptyGallery(PathBuf::from("/data/known"));
        assert_eq!(err.to_string(), "no usable face images found in /data/known");

        let err = ConfigurationError::GalleryDirMissing(PathBuf::from("missing"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = ConfigurationError::EmbeddingDimensionMismatch {
            label: "alice".into(),
            expected: 512,
            found: 128,
        };
        assert_eq!(
            err.to_string(),
            "embedding for 'alice' has dimension 128, gallery uses 512"
        );
    }

    #[test]
    fn test_frame_decode_error_message() {
        let err = FrameDecodeError {
            index: 42,
            reason: "corrupt packet".into(),
        };
        assert_eq!(err.to_string(), "failed to decode frame 42: corrupt packet");
    }

    #[test]
    fn test_errors_box_into_dyn_error() {
        let boxed: Box<dyn std::error::Error> = ConfigurationError::EmptyLabel.into();
        assert_eq!(boxed.to_string(), "identity label must not be empty");
    }
}
