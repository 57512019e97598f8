use crate::recognition::domain::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for turning a located face into an embedding vector.
///
/// All embeddings from one implementation share a dimension and are
/// comparable by Euclidean distance.
pub trait FaceEmbedder: Send {
    fn embed(
        &mut self,
        frame: &Frame,
        region: &Region,
    ) -> Result<Embedding, Box<dyn std::error::Error>>;
}
