use crate::recognition::domain::embedding::Embedding;
use crate::shared::region::Region;

/// A face located in one frame together with its embedding.
///
/// Lives only while that frame is being processed.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub region: Region,
    pub embedding: Embedding,
}
