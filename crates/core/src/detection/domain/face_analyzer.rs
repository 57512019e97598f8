use crate::shared::frame::Frame;

use super::detection::Detection;
use super::face_detector::FaceDetector;
use super::face_embedder::FaceEmbedder;

/// The face collaborator: given an image, returns zero or more
/// (region, embedding) pairs.
///
/// Composes a detector and an embedder so either can be swapped without
/// touching the gallery loader or the annotation pipeline.
pub struct FaceAnalyzer {
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
}

impl FaceAnalyzer {
    pub fn new(detector: Box<dyn FaceDetector>, embedder: Box<dyn FaceEmbedder>) -> Self {
        Self { detector, embedder }
    }

    /// Detects every face in `frame` and embeds each one, preserving the
    /// detector's order. Empty regions are dropped.
    pub fn analyze(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let regions = self.detector.detect(frame)?;
        let mut detections = Vec::with_capacity(regions.len());
        for region in regions {
            if region.is_empty() {
                continue;
            }
            let embedding = self.embedder.embed(frame, &region)?;
            detections.push(Detection { region, embedding });
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::embedding::Embedding;
    use crate::shared::region::Region;

    struct FixedDetector(Vec<Region>);

    impl FaceDetector for FixedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(self.0.clone())
        }
    }

    /// Embeds a region as its (x, y) position.
    struct PositionEmbedder;

    impl FaceEmbedder for PositionEmbedder {
        fn embed(
            &mut self,
            _frame: &Frame,
            region: &Region,
        ) -> Result<Embedding, Box<dyn std::error::Error>> {
            Ok(Embedding::new(vec![region.x as f32, region.y as f32]))
        }
    }

    struct FailingEmbedder;

    impl FaceEmbedder for FailingEmbedder {
        fn embed(
            &mut self,
            _frame: &Frame,
            _region: &Region,
        ) -> Result<Embedding, Box<dyn std::error::Error>> {
            Err("embedder error".into())
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 10 * 10 * 3], 10, 10, 3, 0)
    }

    #[test]
    fn test_analyze_pairs_regions_with_embeddings_in_order() {
        let regions = vec![Region::new(1, 2, 3, 3), Region::new(5, 6, 2, 2)];
        let mut analyzer =
            FaceAnalyzer::new(Box::new(FixedDetector(regions.clone())), Box::new(PositionEmbedder));

        let detections = analyzer.analyze(&frame()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].region, regions[0]);
        assert_eq!(detections[0].embedding.values(), &[1.0, 2.0]);
        assert_eq!(detections[1].embedding.values(), &[5.0, 6.0]);
    }

    #[test]
    fn test_analyze_no_faces_is_empty_not_error() {
        let mut analyzer =
            FaceAnalyzer::new(Box::new(FixedDetector(vec![])), Box::new(FailingEmbedder));
        assert!(analyzer.analyze(&frame()).unwrap().is_empty());
    }

    #[test]
    fn test_analyze_skips_empty_regions() {
        let regions = vec![Region::new(1, 1, 0, 5), Region::new(2, 2, 4, 4)];
        let mut analyzer =
            FaceAnalyzer::new(Box::new(FixedDetector(regions)), Box::new(PositionEmbedder));
        let detections = analyzer.analyze(&frame()).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].region.x, 2);
    }

    #[test]
    fn test_analyze_propagates_embedder_failure() {
        let mut analyzer = FaceAnalyzer::new(
            Box::new(FixedDetector(vec![Region::new(0, 0, 4, 4)])),
            Box::new(FailingEmbedder),
        );
        assert!(analyzer.analyze(&frame()).is_err());
    }
}
